/*!
 * Generation gateway.
 *
 * Wraps a `Provider` with the rules every stage relies on: one request per
 * call, normalization of the response shapes a service may answer with,
 * stripping of introductory boilerplate, and classification of failures.
 * Failed chunks can be replaced by a placeholder so a run keeps going.
 */

use log::{debug, trace, warn};
use serde_json::Value;

use crate::errors::GenerationError;
use crate::pipeline::events::EventSink;
use crate::providers::{ChatPrompt, Provider};

/// Introductory phrases some models put before the actual answer
pub const BOILERPLATE_PREFIXES: &[&str] = &[
    "here is the translation:",
    "translation:",
    "here's the translation:",
    "translated text:",
    "here is the complete translation:",
    "complete translation:",
    "here is the processed text:",
    "processed text:",
];

/// Characters of the input quoted in a failure placeholder
const PLACEHOLDER_EXCERPT_CHARS: usize = 100;

/// Pull the generated text out of a provider payload
///
/// Accepts a chat object (`message.content`), a completion object
/// (`response`) or a bare string.
pub fn extract_text(payload: &Value) -> Result<String, GenerationError> {
    match payload {
        Value::String(text) => Ok(text.clone()),
        Value::Object(map) => {
            if let Some(content) = map
                .get("message")
                .and_then(|m| m.get("content"))
                .and_then(|c| c.as_str())
            {
                return Ok(content.to_string());
            }
            if let Some(response) = map.get("response").and_then(|r| r.as_str()) {
                return Ok(response.to_string());
            }
            if let Some(error) = map.get("error").and_then(|e| e.as_str()) {
                return Err(GenerationError::ServiceError(error.to_string()));
            }

            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            Err(GenerationError::ResponseShapeError(format!(
                "no generated text in response (keys: {})",
                keys.join(", ")
            )))
        }
        other => Err(GenerationError::ResponseShapeError(format!(
            "unexpected response type: {}",
            other
        ))),
    }
}

/// Trim the text and remove one leading boilerplate phrase, ignoring case
pub fn strip_boilerplate(text: &str) -> String {
    let trimmed = text.trim();

    for prefix in BOILERPLATE_PREFIXES {
        let matches = trimmed
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix));
        if matches {
            return trimmed[prefix.len()..].trim().to_string();
        }
    }

    trimmed.to_string()
}

/// Text that replaces a chunk whose generation failed
pub fn placeholder(error: &GenerationError, input_text: &str) -> String {
    let excerpt: String = input_text.chars().take(PLACEHOLDER_EXCERPT_CHARS).collect();
    format!("[{}: {}...]", error.placeholder_tag(), excerpt)
}

/// Single entry point for generation calls
#[derive(Debug)]
pub struct GenerationGateway<P: Provider> {
    provider: P,
}

impl<P: Provider> GenerationGateway<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Check that the service is reachable by listing its models
    pub async fn probe(&self) -> Result<Vec<String>, GenerationError> {
        let models = self.provider.list_models().await?;
        debug!("{} reports {} models", self.provider.name(), models.len());
        Ok(models)
    }

    /// Send exactly one request and return the cleaned generated text
    pub async fn generate(
        &self,
        system: &str,
        user: &str,
        model: &str,
        temperature: f32,
    ) -> Result<String, GenerationError> {
        debug!(
            "Sending request to {} (model: {}, system: {} chars, user: {} chars, temperature: {})",
            self.provider.name(),
            model,
            system.chars().count(),
            user.chars().count(),
            temperature
        );
        let prompt = ChatPrompt::new(model, system, user, temperature);
        let payload = self.provider.chat(&prompt).await?;
        let text = strip_boilerplate(&extract_text(&payload)?);
        trace!("Received {} chars from {}", text.chars().count(), model);
        Ok(text)
    }

    /// Like `generate`, but a failure becomes a placeholder plus an error event
    pub async fn generate_or_placeholder(
        &self,
        input_text: &str,
        system: &str,
        user: &str,
        model: &str,
        temperature: f32,
        events: &EventSink,
    ) -> String {
        match self.generate(system, user, model, temperature).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Generation with model '{}' failed: {}", model, e);
                events.error(format!("{} (model: {})", e, model));
                placeholder(&e, input_text)
            }
        }
    }
}
