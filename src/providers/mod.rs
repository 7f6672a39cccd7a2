/*!
 * Provider implementations for text-generation services.
 *
 * This module contains the client implementations the pipeline can drive:
 * - Ollama: Local LLM server
 * - Mock: In-process scripted provider for tests
 */

use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Nucleus sampling value sent with every generation request
pub const DEFAULT_TOP_P: f32 = 0.9;

/// A single system + user exchange sent to a provider
#[derive(Debug, Clone, PartialEq)]
pub struct ChatPrompt {
    /// Model name to use for generation
    pub model: String,
    /// System message content
    pub system: String,
    /// User message content
    pub user: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling
    pub top_p: f32,
}

impl ChatPrompt {
    pub fn new(
        model: impl Into<String>,
        system: impl Into<String>,
        user: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            model: model.into(),
            system: system.into(),
            user: user.into(),
            temperature,
            top_p: DEFAULT_TOP_P,
        }
    }
}

/// Common trait for all LLM providers
///
/// A provider sends exactly one request per call and never retries; callers
/// decide what to do with a failure.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Send one chat request and return the raw response payload
    ///
    /// The payload is returned uninterpreted so the caller can normalize the
    /// different shapes a service may answer with.
    async fn chat(&self, prompt: &ChatPrompt) -> Result<Value, ProviderError>;

    /// List the models available on the service
    ///
    /// Used as a lightweight reachability probe before a run starts.
    async fn list_models(&self) -> Result<Vec<String>, ProviderError>;

    /// Human readable provider name, used in logs
    fn name(&self) -> &str;
}

pub mod mock;
pub mod ollama;
