use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use url::Url;

use crate::errors::ProviderError;
use crate::providers::{ChatPrompt, Provider};

/// Ollama client for interacting with Ollama API
#[derive(Debug, Clone)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
}

/// Generation options for the Ollama API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationOptions {
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Top-p sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Maximum number of tokens to generate, -1 for unlimited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<i32>,
}

/// Chat message object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant, or tool)
    pub role: String,
    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

/// Chat request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model name to use for generation
    pub model: String,
    /// Messages of the conversation
    pub messages: Vec<ChatMessage>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<GenerationOptions>,
    /// Whether to stream the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl ChatRequest {
    /// Create a new chat request
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: None,
            stream: Some(false),
        }
    }

    /// Set the sampling options
    pub fn options(mut self, options: GenerationOptions) -> Self {
        self.options = Some(options);
        self
    }
}

impl From<&ChatPrompt> for ChatRequest {
    fn from(prompt: &ChatPrompt) -> Self {
        ChatRequest::new(
            prompt.model.clone(),
            vec![ChatMessage::system(&prompt.system), ChatMessage::user(&prompt.user)],
        )
        .options(GenerationOptions {
            temperature: Some(prompt.temperature),
            top_p: Some(prompt.top_p),
            num_predict: Some(-1),
        })
    }
}

/// Normalize an endpoint into a base URL with scheme and no trailing slash
pub fn normalize_endpoint(endpoint: &str) -> Result<String, ProviderError> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Err(ProviderError::RequestFailed("Endpoint cannot be empty".to_string()));
    }

    let with_scheme = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("http://{}", endpoint)
    };

    let url = Url::parse(&with_scheme)
        .map_err(|e| ProviderError::RequestFailed(format!("Invalid endpoint '{}': {}", endpoint, e)))?;
    if url.host_str().is_none() {
        return Err(ProviderError::RequestFailed(format!("Invalid host in endpoint: {}", endpoint)));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Truncate a body for logging
fn log_excerpt(text: &str) -> String {
    if text.chars().count() > 500 {
        text.chars().take(500).collect::<String>()
    } else {
        text.to_string()
    }
}

/// Extract the `error` message Ollama puts in failed responses
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

impl Ollama {
    /// Create a new Ollama client from an endpoint and a request timeout
    ///
    /// A timeout of zero disables the client timeout entirely.
    pub fn new_with_config(endpoint: &str, timeout_secs: u64) -> Result<Self, ProviderError> {
        let base_url = normalize_endpoint(endpoint)?;

        let mut builder = Client::builder()
            // Ollama uses HTTP/1.1
            .http1_only()
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60));
        if timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(timeout_secs));
        }

        Ok(Self {
            base_url,
            client: builder.build().unwrap_or_default(),
        })
    }

    /// Base URL this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Chat with the Ollama API and return the raw JSON payload
    pub async fn chat_raw(&self, request: &ChatRequest) -> Result<Value, ProviderError> {
        let url = format!("{}/api/chat", self.base_url);

        let response = self.client.post(&url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Ollama API error ({}): {}", status, error_text);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: error_message(&error_text),
            });
        }

        let response_text = response.text().await?;

        match serde_json::from_str::<Value>(&response_text) {
            Ok(value) => Ok(value),
            Err(e) => {
                debug!(
                    "Ollama chat response is not a single JSON object: {}. Raw response (first 500 chars): {}",
                    e,
                    log_excerpt(&response_text)
                );

                // The response might be in JSONL format (streaming response):
                // concatenate the message content pieces of every line.
                let mut full_content = String::new();
                let mut parsed_lines = 0;
                for line in response_text.lines().filter(|l| !l.trim().is_empty()) {
                    if let Ok(obj) = serde_json::from_str::<Value>(line) {
                        parsed_lines += 1;
                        if let Some(part) = obj
                            .get("message")
                            .and_then(|m| m.get("content"))
                            .and_then(|c| c.as_str())
                        {
                            full_content.push_str(part);
                        }
                    }
                }

                if parsed_lines > 0 {
                    return Ok(json!({
                        "message": { "role": "assistant", "content": full_content },
                        "done": true,
                    }));
                }

                error!("Failed to parse Ollama API chat response: {}", e);
                Err(ProviderError::ParseError(format!(
                    "Response contains invalid JSON: {}",
                    e
                )))
            }
        }
    }

    /// List locally available models via `/api/tags`
    pub async fn tags(&self) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: error_message(&error_text),
            });
        }

        let value: Value = response.json().await?;
        let models = value
            .get("models")
            .and_then(|m| m.as_array())
            .ok_or_else(|| ProviderError::ParseError("Missing 'models' array in /api/tags response".to_string()))?
            .iter()
            .filter_map(|m| m.get("name").and_then(|n| n.as_str()).map(str::to_string))
            .collect();

        Ok(models)
    }

    /// Get the Ollama API version
    pub async fn version(&self) -> Result<String, ProviderError> {
        let url = format!("{}/api/version", self.base_url);
        let response: Value = self.client.get(&url).send().await?.json().await?;

        response["version"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::ParseError("Invalid version format in response".to_string()))
    }
}

#[async_trait]
impl Provider for Ollama {
    async fn chat(&self, prompt: &ChatPrompt) -> Result<Value, ProviderError> {
        let request = ChatRequest::from(prompt);
        self.chat_raw(&request).await
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        self.tags().await
    }

    fn name(&self) -> &str {
        "Ollama"
    }
}
