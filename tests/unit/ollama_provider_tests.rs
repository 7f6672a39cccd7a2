/*!
 * Tests for the Ollama client against a mock HTTP server
 */

use serde_json::json;
use std::net::TcpListener;
use std::time::Duration;
use textpipe::errors::{GenerationError, ProviderError};
use textpipe::pipeline::GenerationGateway;
use textpipe::providers::ollama::Ollama;
use textpipe::providers::{ChatPrompt, Provider};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> Ollama {
    Ollama::new_with_config(&server.uri(), 30).unwrap()
}

/// Chat requests carry both messages and the sampling options
#[tokio::test]
async fn test_chat_shouldPostMessagesAndOptions() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "mistral:latest",
            "stream": false,
            "messages": [
                { "role": "system", "content": "Translate English to Czech." },
                { "role": "user", "content": "Good morning." }
            ],
            "options": { "num_predict": -1 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "mistral:latest",
            "message": { "role": "assistant", "content": "Dobré ráno." },
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let prompt = ChatPrompt::new("mistral:latest", "Translate English to Czech.", "Good morning.", 0.3);
    let payload = client(&server).chat(&prompt).await.unwrap();

    assert_eq!(payload["message"]["content"], "Dobré ráno.");
}

/// Streaming-style JSONL bodies are stitched into one message
#[tokio::test]
async fn test_chat_jsonlBody_shouldConcatenateContent() {
    let server = MockServer::start().await;
    let body = concat!(
        r#"{"message":{"role":"assistant","content":"Dobré "},"done":false}"#,
        "\n",
        r#"{"message":{"role":"assistant","content":"ráno."},"done":false}"#,
        "\n",
        r#"{"done":true}"#,
        "\n"
    );
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let gateway = GenerationGateway::new(client(&server));
    let text = gateway.generate("s", "u", "mistral:latest", 0.3).await.unwrap();

    assert_eq!(text, "Dobré ráno.");
}

/// Unknown models come back as a service error with Ollama's message
#[tokio::test]
async fn test_chat_unknownModel_shouldBeServiceError() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "model 'nope' not found" })))
        .mount(&server)
        .await;

    let gateway = GenerationGateway::new(client(&server));
    let err = gateway.generate("s", "u", "nope", 0.3).await.unwrap_err();

    assert_eq!(err, GenerationError::ServiceError("404 - model 'nope' not found".to_string()));
}

/// Bodies that are not JSON at all are a response shape problem
#[tokio::test]
async fn test_chat_garbageBody_shouldBeResponseShapeError() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&server)
        .await;

    let gateway = GenerationGateway::new(client(&server));
    let err = gateway.generate("s", "u", "m", 0.3).await.unwrap_err();

    assert!(matches!(err, GenerationError::ResponseShapeError(_)));
}

/// Slow responses beyond the client timeout are classified as timeouts
#[tokio::test]
async fn test_chat_slowServer_shouldTimeOut() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "message": { "content": "late" } }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let ollama = Ollama::new_with_config(&server.uri(), 1).unwrap();
    let err = ollama
        .chat(&ChatPrompt::new("m", "s", "u", 0.3))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Timeout(_)));
}

/// The model listing doubles as the reachability probe
#[tokio::test]
async fn test_listModels_shouldReturnTagNames() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [ { "name": "mistral:latest" }, { "name": "llama3.2:latest" } ]
        })))
        .mount(&server)
        .await;

    let models = client(&server).list_models().await.unwrap();

    assert_eq!(models, vec!["mistral:latest", "llama3.2:latest"]);
}

/// Nothing listening on the port means a connection error
#[tokio::test]
async fn test_listModels_noServer_shouldBeConnectionError() {
    // Reserve a free port, then release it so nothing listens there
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let ollama = Ollama::new_with_config(&format!("http://{}", address), 5).unwrap();
    let err = ollama.list_models().await.unwrap_err();

    assert!(matches!(err, ProviderError::ConnectionError(_)));
}

/// The server version is read from `/api/version`
#[tokio::test]
async fn test_version_shouldReturnServerVersion() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/version"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "version": "0.5.7" })))
        .mount(&server)
        .await;

    assert_eq!(client(&server).version().await.unwrap(), "0.5.7");
}
