//! Text-generation backends.
//!
//! The translator only needs one thing from a model: turn a prompt into
//! text. [`Backend`] is that capability; the two implementations here adapt
//! the OpenAI chat completions API and the Gemini `generateContent` API to
//! it.

use crate::config::{ApiConfig, Provider};
use crate::error::BackendError;
use crate::utils::{check_response_status, snippet};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Length of the prompt excerpt carried in no-output errors.
const PROMPT_EXCERPT_CHARS: usize = 80;

/// A service that turns a prompt into text.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Human-readable backend name.
    fn name(&self) -> &'static str;

    /// Generates a completion for `prompt`.
    ///
    /// Fails with [`BackendError::NoOutput`] when the service answers
    /// without usable text.
    async fn generate(&self, prompt: &str) -> Result<String, BackendError>;
}

/// Builds the backend selected by `api_config`.
pub fn create_backend(
    api_config: &ApiConfig,
    timeout: Duration,
) -> Result<Arc<dyn Backend>, BackendError> {
    if !api_config.is_configured() {
        return Err(BackendError::InvalidConfig(format!(
            "no API key configured for {}",
            api_config.provider
        )));
    }

    let client = Client::builder().timeout(timeout).build()?;
    let backend: Arc<dyn Backend> = match api_config.provider {
        Provider::OpenAi => Arc::new(OpenAiBackend::with_client(client, api_config.clone())),
        Provider::Gemini => Arc::new(GeminiBackend::with_client(client, api_config.clone())),
    };
    Ok(backend)
}

fn no_output(prompt: &str) -> BackendError {
    BackendError::NoOutput(snippet(prompt, PROMPT_EXCERPT_CHARS))
}

/// Request body for the chat completions API.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
}

/// A message in the conversation.
#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

/// Response from the chat completions API.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

/// A single choice in the response.
#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

/// Message content in a response.
#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Backend for OpenAI-compatible chat completion endpoints.
pub struct OpenAiBackend {
    /// HTTP client for API requests.
    client: Client,
    /// API configuration.
    api_config: ApiConfig,
}

impl OpenAiBackend {
    pub fn with_client(client: Client, api_config: ApiConfig) -> Self {
        Self { client, api_config }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_config.effective_base_url())
    }

    /// Pulls the first choice's text out of a raw response body.
    fn parse_response(body: &str) -> Result<Option<String>, BackendError> {
        let response: ChatResponse = serde_json::from_str(body)
            .map_err(|e| BackendError::ParseError(e.to_string()))?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty()))
    }
}

#[async_trait]
impl Backend for OpenAiBackend {
    fn name(&self) -> &'static str {
        "OpenAI"
    }

    async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        let request = ChatRequest {
            model: &self.api_config.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_config.key)
            .json(&request)
            .send()
            .await?;
        let body = check_response_status(response).await?.text().await?;

        Self::parse_response(&body)?.ok_or_else(|| no_output(prompt))
    }
}

/// Request body for `generateContent`.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

/// Response from `generateContent`.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Backend for the Gemini API.
pub struct GeminiBackend {
    client: Client,
    api_config: ApiConfig,
}

impl GeminiBackend {
    pub fn with_client(client: Client, api_config: ApiConfig) -> Self {
        Self { client, api_config }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_config.effective_base_url(),
            self.api_config.model
        )
    }

    /// Joins the text parts of the first candidate.
    fn parse_response(body: &str) -> Result<Option<String>, BackendError> {
        let response: GenerateResponse = serde_json::from_str(body)
            .map_err(|e| BackendError::ParseError(e.to_string()))?;

        let text: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
            .unwrap_or_default();

        let text = text.trim();
        Ok((!text.is_empty()).then(|| text.to_string()))
    }
}

#[async_trait]
impl Backend for GeminiBackend {
    fn name(&self) -> &'static str {
        "Gemini"
    }

    async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_config.key)
            .json(&request)
            .send()
            .await?;
        let body = check_response_status(response).await?.text().await?;

        Self::parse_response(&body)?.ok_or_else(|| no_output(prompt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(provider: Provider) -> ApiConfig {
        let mut api = ApiConfig::default();
        api.set_provider(provider);
        api.key = "test-key".to_string();
        api
    }

    #[test]
    fn test_openai_endpoint() {
        let mut config = api(Provider::OpenAi);
        config.base_url = Some("https://openrouter.ai/api/v1/".to_string());
        let backend = OpenAiBackend::with_client(Client::new(), config);
        assert_eq!(backend.endpoint(), "https://openrouter.ai/api/v1/chat/completions");
    }

    #[test]
    fn test_gemini_endpoint() {
        let backend = GeminiBackend::with_client(Client::new(), api(Provider::Gemini));
        assert_eq!(
            backend.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_openai_parse_first_choice() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"  你好  "}},
                      {"index":1,"message":{"role":"assistant","content":"second"}}]}"#;
        let text = OpenAiBackend::parse_response(body).unwrap();
        assert_eq!(text.as_deref(), Some("你好"));
    }

    #[test]
    fn test_openai_parse_no_output() {
        let empty = r#"{"choices":[]}"#;
        assert_eq!(OpenAiBackend::parse_response(empty).unwrap(), None);

        let null_content = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        assert_eq!(OpenAiBackend::parse_response(null_content).unwrap(), None);

        let blank = r#"{"choices":[{"message":{"role":"assistant","content":"   "}}]}"#;
        assert_eq!(OpenAiBackend::parse_response(blank).unwrap(), None);
    }

    #[test]
    fn test_openai_parse_invalid_json() {
        let result = OpenAiBackend::parse_response("<html>Bad Gateway</html>");
        assert!(matches!(result, Err(BackendError::ParseError(_))));
    }

    #[test]
    fn test_gemini_parse_joins_parts() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello, "},{"text":"{{user}}."}]},"finishReason":"STOP"}]}"#;
        let text = GeminiBackend::parse_response(body).unwrap();
        assert_eq!(text.as_deref(), Some("Hello, {{user}}."));
    }

    #[test]
    fn test_gemini_parse_blocked_prompt() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        assert_eq!(GeminiBackend::parse_response(body).unwrap(), None);

        let body = r#"{"candidates":[{"finishReason":"SAFETY"}]}"#;
        assert_eq!(GeminiBackend::parse_response(body).unwrap(), None);
    }

    #[test]
    fn test_create_backend_requires_key() {
        let result = create_backend(&ApiConfig::default(), Duration::from_secs(5));
        assert!(matches!(result, Err(BackendError::InvalidConfig(_))));

        let backend = create_backend(&api(Provider::Gemini), Duration::from_secs(5)).unwrap();
        assert_eq!(backend.name(), "Gemini");
    }

    #[test]
    fn test_request_shapes() {
        let chat = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![Message {
                role: "user",
                content: "hi",
            }],
        };
        assert_eq!(
            serde_json::to_value(&chat).unwrap(),
            serde_json::json!({"model": "gpt-4o-mini", "messages": [{"role": "user", "content": "hi"}]})
        );

        let generate = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: "hi" }],
            }],
        };
        assert_eq!(
            serde_json::to_value(&generate).unwrap(),
            serde_json::json!({"contents": [{"role": "user", "parts": [{"text": "hi"}]}]})
        );
    }
}
