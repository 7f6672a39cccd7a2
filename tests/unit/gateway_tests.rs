/*!
 * Tests for the generation gateway
 */

use textpipe::errors::GenerationError;
use textpipe::pipeline::gateway::{GenerationGateway, placeholder, strip_boilerplate};
use textpipe::pipeline::{EventSink, ProcessingEvent};
use textpipe::providers::mock::{MockBehavior, MockFailure, MockProvider};

use crate::common;

/// Boilerplate prefixes are removed regardless of case
#[test]
fn test_stripBoilerplate_allPrefixes_shouldBeRemoved() {
    let prefixes = [
        "Here is the translation:",
        "Translation:",
        "Here's the translation:",
        "Translated text:",
        "Here is the complete translation:",
        "Complete translation:",
        "Here is the processed text:",
        "Processed text:",
    ];
    for prefix in prefixes {
        assert_eq!(strip_boilerplate(&format!("{}\n\nDobrý den.", prefix)), "Dobrý den.");
        assert_eq!(strip_boilerplate(&format!("{} Dobrý den.", prefix.to_uppercase())), "Dobrý den.");
    }
}

/// Text that merely mentions a prefix later is untouched
#[test]
fn test_stripBoilerplate_prefixInsideText_shouldStay() {
    let text = "The word translation: appears later.";

    assert_eq!(strip_boilerplate(text), text);
}

/// Placeholders quote at most one hundred characters of the input
#[test]
fn test_placeholder_multibyteInput_shouldCountChars() {
    let input = "č".repeat(120);
    let text = placeholder(&GenerationError::ConnectionFailure("refused".to_string()), &input);

    assert_eq!(text, format!("[CONNECTION ERROR: {}...]", "č".repeat(100)));
}

/// The probe reports the models of a reachable service
#[tokio::test]
async fn test_probe_reachable_shouldListModels() {
    let provider = MockProvider::working();
    let gateway = GenerationGateway::new(provider.clone());

    let models = gateway.probe().await.unwrap();

    assert_eq!(models, vec!["mistral:latest", "llama3.2:latest"]);
    assert_eq!(provider.probe_count(), 1);
    assert_eq!(provider.call_count(), 0);
}

/// An unreachable service fails the probe with a connection failure
#[tokio::test]
async fn test_probe_unreachable_shouldFailWithConnectionFailure() {
    let gateway = GenerationGateway::new(MockProvider::unreachable());

    let result = gateway.probe().await;

    assert!(matches!(result, Err(GenerationError::ConnectionFailure(_))));
}

/// Each failure yields exactly one error event and the matching placeholder
#[tokio::test]
async fn test_generateOrPlaceholder_eachFailure_shouldEmitOneError() {
    common::init_logging();
    let cases = [
        (MockFailure::Timeout, "[TIMEOUT ERROR: input...]"),
        (MockFailure::Connection, "[CONNECTION ERROR: input...]"),
        (MockFailure::Api, "[PROCESSING FAILED: input...]"),
        (MockFailure::Request, "[ERROR: input...]"),
    ];

    for (failure, expected) in cases {
        let provider = MockProvider::failing(failure);
        let gateway = GenerationGateway::new(provider.clone());
        let (events, mut rx) = EventSink::channel();

        let text = gateway
            .generate_or_placeholder("input", "system", "user", "mistral:latest", 0.3, &events)
            .await;

        assert_eq!(text, expected);
        assert_eq!(provider.call_count(), 1, "no retries expected");
        let emitted = common::drain_events(&mut rx);
        assert_eq!(common::error_count(&emitted), 1);
    }
}

/// Successful calls forward prompt, model and temperature unchanged
#[tokio::test]
async fn test_generate_shouldForwardPromptParameters() {
    let provider = MockProvider::new(MockBehavior::Working);
    let gateway = GenerationGateway::new(provider.clone());
    let (events, mut rx) = EventSink::channel();

    let text = gateway
        .generate_or_placeholder("input", "be concise", "Hello", "llama3.2:latest", 0.5, &events)
        .await;

    assert_eq!(text, "[PROCESSED] Hello");
    let request = &provider.requests()[0];
    assert_eq!(request.system, "be concise");
    assert_eq!(request.model, "llama3.2:latest");
    assert!((request.temperature - 0.5).abs() < f32::EPSILON);
    assert!(!common::drain_events(&mut rx).iter().any(|e| matches!(e, ProcessingEvent::Error(_))));
}
