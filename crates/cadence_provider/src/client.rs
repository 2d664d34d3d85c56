use anyhow::Result;
use cadence_domain::{DialogueRequest, DialogueService, DialogueTurn, Descriptors, ModelId};
use cadence_prompt::PromptBuilder;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::dto::{GenerateRequest, reply_content};
use crate::{Error, ProviderConfig};

const UNREACHABLE_CONTENT: &str = "Error: Could not connect to Ollama. Is the service running?";

/// How a single exchange with the inference service ended.
#[derive(Debug)]
enum Outcome {
    /// 2xx with the raw response body.
    Succeeded(Vec<u8>),
    /// 404: the model (or the route) is not available on the service.
    ModelNotFound,
    /// Any other non-2xx status.
    Failed { status: StatusCode, body: String },
    /// No HTTP response could be obtained (connect, DNS, timeout, broken body).
    Unreachable(reqwest::Error),
}

/// Client of an Ollama-compatible `/api/generate` endpoint.
///
/// Each call builds the prompt, performs exactly one request and converts the
/// outcome into a [`DialogueTurn`]. Idle connections are not pooled, so no
/// connection outlives the call that opened it. The client holds no mutable
/// state and can be shared between concurrent callers.
#[derive(Clone, Debug)]
pub struct OllamaClient {
    client: Client,
    config: ProviderConfig,
    prompt: PromptBuilder,
}

impl OllamaClient {
    pub fn new(config: ProviderConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(config.timeout())
            .pool_max_idle_per_host(0)
            .build()
            .map_err(Error::Client)?;

        Ok(Self { client, config, prompt: PromptBuilder::default() })
    }

    /// Replaces the prompt builder, e.g. to enable the legacy key line.
    pub fn with_prompt_builder(mut self, prompt: PromptBuilder) -> Self {
        self.prompt = prompt;
        self
    }

    /// The builder every prompt of this client is rendered with.
    pub fn prompt_builder(&self) -> &PromptBuilder {
        &self.prompt
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn model(&self) -> &ModelId {
        self.config.model()
    }

    pub fn endpoint(&self) -> String {
        self.config.endpoint()
    }

    /// Generates the next assistant turn for the given musical features.
    ///
    /// # Errors
    /// Fails when the service answers with a status other than 2xx or 404,
    /// or when a 2xx body is not JSON. A missing model and an unreachable
    /// service are reported as assistant turns instead.
    pub async fn generate_with(
        &self,
        emotion: &str,
        chord: &str,
        key: Option<&str>,
        descriptors: Option<&Descriptors>,
        history: Option<&[DialogueTurn]>,
    ) -> Result<DialogueTurn> {
        let prompt = self.prompt.build(emotion, chord, key, descriptors, history);
        let outcome = self.exchange(&prompt).await;
        self.interpret(outcome)
    }

    async fn exchange(&self, prompt: &str) -> Outcome {
        let url = self.endpoint();
        let body = GenerateRequest { model: self.model().as_str(), prompt, stream: false };

        debug!(url = %url, model = %self.model(), prompt_len = prompt.len(), "Sending generate request");

        let response = match self.client.post(&url).json(&body).send().await {
            Ok(response) => response,
            Err(error) => return Outcome::Unreachable(error),
        };

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Outcome::ModelNotFound;
        }

        match response.bytes().await {
            Ok(bytes) if status.is_success() => Outcome::Succeeded(bytes.to_vec()),
            Ok(bytes) => Outcome::Failed {
                status,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            },
            Err(error) => Outcome::Unreachable(error),
        }
    }

    fn interpret(&self, outcome: Outcome) -> Result<DialogueTurn> {
        match outcome {
            Outcome::Succeeded(bytes) => {
                let body: serde_json::Value =
                    serde_json::from_slice(&bytes).map_err(Error::InvalidResponse)?;
                Ok(DialogueTurn::assistant(reply_content(&body)))
            }
            Outcome::ModelNotFound => {
                warn!(model = %self.model(), url = %self.endpoint(), "Model not found on inference service");
                Ok(DialogueTurn::assistant(model_not_found_content(self.model())))
            }
            Outcome::Unreachable(error) => {
                warn!(url = %self.endpoint(), error = %error, "Inference service unreachable");
                Ok(DialogueTurn::assistant(UNREACHABLE_CONTENT))
            }
            Outcome::Failed { status, body } => Err(Error::UnexpectedStatus { status, body }.into()),
        }
    }
}

fn model_not_found_content(model: &ModelId) -> String {
    format!(
        "Error: Model '{model}' not found. Please ensure it is pulled in Ollama (e.g., `ollama pull {model}`)."
    )
}

#[async_trait::async_trait]
impl DialogueService for OllamaClient {
    async fn generate(&self, request: &DialogueRequest) -> Result<DialogueTurn> {
        self.generate_with(
            &request.emotion,
            &request.chord,
            request.key.as_deref(),
            request.descriptors.as_ref(),
            Some(&request.history),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use cadence_prompt::build_prompt;
    use mockito::Matcher;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::dto::FALLBACK_CONTENT;

    async fn setup() -> (mockito::ServerGuard, OllamaClient) {
        let server = mockito::Server::new_async().await;
        let config = ProviderConfig::new(server.url(), "llama3", Duration::from_secs(5));
        let client = OllamaClient::new(config).unwrap();
        (server, client)
    }

    fn request_fixture() -> DialogueRequest {
        DialogueRequest::new("joy", "C").key("C major")
    }

    #[tokio::test]
    async fn test_generate_returns_trimmed_response() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"response": "  Hello there.\n", "done": true}"#)
            .create_async()
            .await;

        let actual = client.generate(&request_fixture()).await.unwrap();
        let expected = DialogueTurn::assistant("Hello there.");

        assert_eq!(actual, expected);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_sends_model_prompt_and_no_stream() {
        let (mut server, client) = setup().await;
        let request = request_fixture().history(vec![DialogueTurn::user("Another chord!")]);
        let prompt = build_prompt("joy", "C", Some("C major"), None, Some(&request.history));
        let mock = server
            .mock("POST", "/api/generate")
            .match_body(Matcher::Json(json!({
                "model": "llama3",
                "prompt": prompt,
                "stream": false
            })))
            .with_status(200)
            .with_body(r#"{"response": "Lovely."}"#)
            .expect(1)
            .create_async()
            .await;

        let actual = client.generate(&request).await.unwrap();

        assert_eq!(actual.content(), "Lovely.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_uses_text_field_fallback() {
        let (mut server, client) = setup().await;
        server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_body(r#"{"text": "From the text field."}"#)
            .create_async()
            .await;

        let actual = client.generate(&request_fixture()).await.unwrap();

        assert_eq!(actual.content(), "From the text field.");
    }

    #[tokio::test]
    async fn test_generate_without_content_fields_yields_fallback() {
        let (mut server, client) = setup().await;
        server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_body(r#"{"done": true}"#)
            .create_async()
            .await;

        let actual = client.generate(&request_fixture()).await.unwrap();
        let expected = DialogueTurn::assistant(FALLBACK_CONTENT);

        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn test_generate_not_found_names_model() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("POST", "/api/generate")
            .with_status(404)
            .with_body(r#"{"error": "model 'llama3' not found"}"#)
            .expect(1)
            .create_async()
            .await;

        let actual = client.generate(&request_fixture()).await.unwrap();
        let expected = DialogueTurn::assistant(
            "Error: Model 'llama3' not found. Please ensure it is pulled in Ollama (e.g., `ollama pull llama3`).",
        );

        assert_eq!(actual, expected);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_server_error_is_propagated() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("POST", "/api/generate")
            .with_status(500)
            .with_body("boom")
            .expect(1)
            .create_async()
            .await;

        let actual = client.generate(&request_fixture()).await.unwrap_err();

        match actual.downcast_ref::<Error>() {
            Some(Error::UnexpectedStatus { status, body }) => {
                assert_eq!(*status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body, "boom");
            }
            other => panic!("expected UnexpectedStatus, got {other:?}"),
        }
        // Exactly one attempt, no retry.
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_invalid_json_is_propagated() {
        let (mut server, client) = setup().await;
        server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let actual = client.generate(&request_fixture()).await.unwrap_err();

        assert!(matches!(actual.downcast_ref::<Error>(), Some(Error::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_generate_unreachable_service() {
        // Reserve a free port, then release it so nothing listens there.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let config = ProviderConfig::new(
            format!("http://127.0.0.1:{port}"),
            "llama3",
            Duration::from_secs(5),
        );
        let client = OllamaClient::new(config).unwrap();

        let actual = client.generate(&request_fixture()).await.unwrap();
        let expected = DialogueTurn::assistant(UNREACHABLE_CONTENT);

        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn test_generate_timeout_reports_unreachable_service() {
        // Accepts connections but never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let silent = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        let config = ProviderConfig::new(
            format!("http://{addr}"),
            "llama3",
            Duration::from_millis(300),
        );
        let client = OllamaClient::new(config).unwrap();

        let actual = tokio::time::timeout(Duration::from_secs(5), client.generate(&request_fixture()))
            .await
            .expect("client timeout should fire first")
            .unwrap();
        let expected = DialogueTurn::assistant(UNREACHABLE_CONTENT);

        assert_eq!(actual, expected);
        silent.abort();
    }

    #[test]
    fn test_prompt_builder_is_exposed() {
        let config = ProviderConfig::new("http://localhost:11434", "llama3", Duration::from_secs(5));
        let client = OllamaClient::new(config)
            .unwrap()
            .with_prompt_builder(PromptBuilder::default().legacy_key_line(true));

        let actual = client.prompt_builder().build("joy", "C", None, None, None);

        assert!(actual.contains("Detected key: None."));
    }

    #[tokio::test]
    async fn test_trailing_separator_hits_same_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_body(r#"{"response": "ok"}"#)
            .expect(2)
            .create_async()
            .await;
        let with_slash = OllamaClient::new(ProviderConfig::new(
            format!("{}/", server.url()),
            "llama3",
            Duration::from_secs(5),
        ))
        .unwrap();
        let without_slash = OllamaClient::new(ProviderConfig::new(
            server.url(),
            "llama3",
            Duration::from_secs(5),
        ))
        .unwrap();

        assert_eq!(with_slash.endpoint(), without_slash.endpoint());
        with_slash.generate(&request_fixture()).await.unwrap();
        without_slash.generate(&request_fixture()).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_with_legacy_prompt_builder() {
        let (mut server, client) = setup().await;
        let client = client.with_prompt_builder(PromptBuilder::default().legacy_key_line(true));
        let mock = server
            .mock("POST", "/api/generate")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(json!({"model": "llama3"})),
                Matcher::Regex("Detected key: None\\.".to_string()),
            ]))
            .with_status(200)
            .with_body(r#"{"response": "ok"}"#)
            .create_async()
            .await;

        let actual = client
            .generate_with("joy", "C", None, None, None)
            .await
            .unwrap();

        assert_eq!(actual.content(), "ok");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_concurrent_calls_are_independent() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_body(r#"{"response": "Together."}"#)
            .expect(2)
            .create_async()
            .await;
        let first = request_fixture();
        let second = DialogueRequest::new("fear", "Bdim");

        let (a, b) = tokio::join!(client.generate(&first), client.generate(&second));

        assert_eq!(a.unwrap().content(), "Together.");
        assert_eq!(b.unwrap().content(), "Together.");
        mock.assert_async().await;
    }
}
