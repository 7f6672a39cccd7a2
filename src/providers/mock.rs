/*!
 * Mock provider implementation for testing.
 *
 * This module provides a mock provider that simulates different behaviors:
 * - `MockProvider::working()` - Always succeeds with a chat-shaped payload
 * - `MockProvider::failing(kind)` - Always fails with the given error class
 * - `MockProvider::unreachable()` - Fails the probe and every call with a connection error
 *
 * Every request is recorded so tests can count and inspect generation calls.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::ProviderError;
use crate::providers::{ChatPrompt, Provider};

/// Failure class a mock can simulate
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockFailure {
    Timeout,
    Connection,
    Api,
    Parse,
    Request,
}

impl MockFailure {
    fn to_error(self, count: usize) -> ProviderError {
        match self {
            Self::Timeout => ProviderError::Timeout(format!("Simulated timeout (request #{})", count)),
            Self::Connection => ProviderError::ConnectionError("Simulated connection refused".to_string()),
            Self::Api => ProviderError::ApiError {
                status_code: 404,
                message: "model 'missing' not found".to_string(),
            },
            Self::Parse => ProviderError::ParseError("Simulated invalid JSON".to_string()),
            Self::Request => ProviderError::RequestFailed("Simulated request failure".to_string()),
        }
    }
}

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Answers with a chat-shaped object: `{"message": {"content": ...}}`
    Working,
    /// Answers with a bare JSON string instead of an object
    PlainText,
    /// Answers with an object that carries no generated text
    Malformed,
    /// Fails every Nth request
    Intermittent { fail_every: usize, failure: MockFailure },
    /// Always fails with the given class
    Failing(MockFailure),
    /// Probe and every call fail with a connection error
    Unreachable,
    /// Succeeds after a delay
    Slow { delay_ms: u64 },
}

/// Mock provider for testing pipeline behavior
#[derive(Debug, Clone)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Every chat prompt received, in order
    requests: Arc<Mutex<Vec<ChatPrompt>>>,
    /// Number of probe calls
    probe_count: Arc<AtomicUsize>,
    /// Custom response generator (optional)
    custom_response: Option<fn(&ChatPrompt) -> String>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            requests: Arc::new(Mutex::new(Vec::new())),
            probe_count: Arc::new(AtomicUsize::new(0)),
            custom_response: None,
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a failing mock provider
    pub fn failing(failure: MockFailure) -> Self {
        Self::new(MockBehavior::Failing(failure))
    }

    /// Create a provider whose service cannot be reached
    pub fn unreachable() -> Self {
        Self::new(MockBehavior::Unreachable)
    }

    /// Create an intermittently failing mock provider
    pub fn intermittent(fail_every: usize, failure: MockFailure) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every, failure })
    }

    /// Set a custom response generator
    pub fn with_custom_response(mut self, generator: fn(&ChatPrompt) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// All prompts received so far
    pub fn requests(&self) -> Vec<ChatPrompt> {
        self.requests.lock().clone()
    }

    /// Number of chat calls received so far
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Number of probe calls received so far
    pub fn probe_count(&self) -> usize {
        self.probe_count.load(Ordering::SeqCst)
    }

    fn response_text(&self, prompt: &ChatPrompt) -> String {
        match self.custom_response {
            Some(generator) => generator(prompt),
            None => format!("[PROCESSED] {}", prompt.user),
        }
    }

    fn chat_payload(text: String) -> Value {
        json!({
            "model": "mock",
            "message": { "role": "assistant", "content": text },
            "done": true,
        })
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn chat(&self, prompt: &ChatPrompt) -> Result<Value, ProviderError> {
        let count = {
            let mut requests = self.requests.lock();
            requests.push(prompt.clone());
            requests.len()
        };

        match self.behavior {
            MockBehavior::Working => Ok(Self::chat_payload(self.response_text(prompt))),
            MockBehavior::PlainText => Ok(Value::String(self.response_text(prompt))),
            MockBehavior::Malformed => Ok(json!({ "model": "mock", "done": true })),
            MockBehavior::Intermittent { fail_every, failure } => {
                if fail_every > 0 && count % fail_every == 0 {
                    Err(failure.to_error(count))
                } else {
                    Ok(Self::chat_payload(self.response_text(prompt)))
                }
            }
            MockBehavior::Failing(failure) => Err(failure.to_error(count)),
            MockBehavior::Unreachable => Err(MockFailure::Connection.to_error(count)),
            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                Ok(Self::chat_payload(self.response_text(prompt)))
            }
        }
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        self.probe_count.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            MockBehavior::Unreachable => Err(MockFailure::Connection.to_error(0)),
            _ => Ok(vec!["mistral:latest".to_string(), "llama3.2:latest".to_string()]),
        }
    }

    fn name(&self) -> &str {
        "Mock"
    }
}
