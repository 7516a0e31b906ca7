//! Testimony summarization through an OpenRouter chat completion.

use async_trait::async_trait;
use folio_core::SummarizerError;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const PROVIDER: &str = "openrouter";

pub const DEFAULT_OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_OPENROUTER_MODEL: &str = "mistralai/mistral-7b-instruct:free";

/// Produces a one-sentence summary of a testimonial.
#[async_trait]
pub trait TestimonySummarizer: Send + Sync {
    async fn summarize(&self, description: &str) -> Result<String, SummarizerError>;

    fn provider_name(&self) -> &'static str;
}

/// Build the prompt sent for a testimonial description.
pub fn build_prompt(description: &str) -> String {
    format!(
        "You are an assistant summarizing a professional testimonial for a portfolio website. \
         Keep it under 25 words, professional and positive in tone. Emphasize strengths like \
         reliability, problem-solving, or collaboration. Do not quote the original, repeat minor \
         details, or mention names. Return a single sentence with no prefix. Input:'{}'",
        description
    )
}

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Clone)]
pub struct SummarizerConfig {
    pub api_key: Option<SecretString>,
    pub model: String,
    pub url: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for SummarizerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummarizerConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("url", &self.url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_OPENROUTER_MODEL.to_string(),
            url: DEFAULT_OPENROUTER_URL.to_string(),
            timeout: Duration::from_secs(20),
        }
    }
}

impl SummarizerConfig {
    /// Load from `OPENROUTER_APIKEY`, `OPENROUTER_MODEL` and `OPENROUTER_URL`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("OPENROUTER_APIKEY")
                .ok()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .map(SecretString::from),
            model: std::env::var("OPENROUTER_MODEL").unwrap_or(defaults.model),
            url: std::env::var("OPENROUTER_URL").unwrap_or(defaults.url),
            timeout: defaults.timeout,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

// ============================================================================
// OPENROUTER PROVIDER
// ============================================================================

pub struct OpenRouterSummarizer {
    client: Client,
    api_key: SecretString,
    model: String,
    url: String,
}

impl std::fmt::Debug for OpenRouterSummarizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterSummarizer")
            .field("url", &self.url)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl OpenRouterSummarizer {
    /// Build a provider, or `None` when no API key is configured.
    pub fn from_config(config: &SummarizerConfig) -> Result<Option<Self>, SummarizerError> {
        let Some(api_key) = config.api_key.clone() else {
            return Ok(None);
        };
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SummarizerError::Transport {
                provider: PROVIDER,
                reason: e.to_string(),
            })?;
        Ok(Some(Self {
            client,
            api_key,
            model: config.model.clone(),
            url: config.url.clone(),
        }))
    }
}

#[async_trait]
impl TestimonySummarizer for OpenRouterSummarizer {
    async fn summarize(&self, description: &str) -> Result<String, SummarizerError> {
        let request = CompletionRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user".to_string(),
                content: build_prompt(description),
            }],
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| SummarizerError::Transport {
                provider: PROVIDER,
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = serde_json::from_str::<ErrorResponse>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);
            return Err(SummarizerError::RequestFailed {
                provider: PROVIDER,
                status: status.as_u16(),
                message,
            });
        }

        let body: CompletionResponse =
            response
                .json()
                .await
                .map_err(|e| SummarizerError::InvalidResponse {
                    provider: PROVIDER,
                    reason: format!("Failed to parse response: {}", e),
                })?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| SummarizerError::InvalidResponse {
                provider: PROVIDER,
                reason: "No choices in response".to_string(),
            })
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{}/chat", addr)
    }

    fn config(url: String) -> SummarizerConfig {
        SummarizerConfig {
            api_key: Some(SecretString::from("test-key".to_string())),
            url,
            ..SummarizerConfig::default()
        }
    }

    #[test]
    fn test_prompt_embeds_description() {
        let prompt = build_prompt("Solved every problem");
        assert!(prompt.starts_with("You are an assistant summarizing a professional testimonial"));
        assert!(prompt.contains("under 25 words"));
        assert!(prompt.ends_with("Input:'Solved every problem'"));
    }

    #[test]
    fn test_unconfigured_builds_no_provider() {
        let provider = OpenRouterSummarizer::from_config(&SummarizerConfig::default())
            .expect("config");
        assert!(provider.is_none());
    }

    #[test]
    fn test_debug_redacts_key() {
        let rendered = format!("{:?}", config("http://x".to_string()));
        assert!(!rendered.contains("test-key"));
    }

    #[tokio::test]
    async fn test_summary_is_first_choice_trimmed() {
        let seen: Arc<Mutex<Option<(String, Value)>>> = Arc::new(Mutex::new(None));
        let captured = seen.clone();
        let app = Router::new().route(
            "/chat",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let captured = captured.clone();
                async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    *captured.lock().expect("lock") = Some((auth, body));
                    Json(json!({
                        "choices": [
                            {"message": {"role": "assistant", "content": "  A reliable engineer.\n"}},
                            {"message": {"role": "assistant", "content": "ignored"}}
                        ]
                    }))
                }
            }),
        );
        let url = serve(app).await;
        let provider = OpenRouterSummarizer::from_config(&config(url))
            .expect("config")
            .expect("configured");

        let summary = provider.summarize("Great teammate").await.expect("summary");
        assert_eq!(summary, "A reliable engineer.");

        let (auth, body) = seen.lock().expect("lock").clone().expect("request seen");
        assert_eq!(auth, "Bearer test-key");
        assert_eq!(body["model"], DEFAULT_OPENROUTER_MODEL);
        assert_eq!(body["messages"][0]["role"], "user");
        assert!(body["messages"][0]["content"]
            .as_str()
            .unwrap_or_default()
            .ends_with("Input:'Great teammate'"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_reported() {
        let app = Router::new().route(
            "/chat",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"error": {"message": "bad key"}})),
                )
            }),
        );
        let url = serve(app).await;
        let provider = OpenRouterSummarizer::from_config(&config(url))
            .expect("config")
            .expect("configured");

        let err = provider.summarize("x").await.expect_err("should fail");
        assert_eq!(
            err,
            SummarizerError::RequestFailed {
                provider: PROVIDER,
                status: 401,
                message: "bad key".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_empty_choices_is_invalid_response() {
        let app = Router::new().route("/chat", post(|| async { Json(json!({"choices": []})) }));
        let url = serve(app).await;
        let provider = OpenRouterSummarizer::from_config(&config(url))
            .expect("config")
            .expect("configured");

        let err = provider.summarize("x").await.expect_err("should fail");
        assert!(matches!(err, SummarizerError::InvalidResponse { .. }));
    }
}
