use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use grantline_application::{IntentOracle, OraclePrompt};
use grantline_core::{AppError, AppResult};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Connection settings for the Gemini `generateContent` API.
#[derive(Debug, Clone)]
pub struct GeminiOracleConfig {
    /// Base URL, e.g. `https://generativelanguage.googleapis.com`.
    pub endpoint: String,
    /// API credential sent in the `x-goog-api-key` header.
    pub api_key: String,
    /// Model identifier, e.g. `gemini-1.5-flash`.
    pub model: String,
}

/// Intent oracle backed by Google Gemini.
pub struct GeminiIntentOracle {
    http_client: reqwest::Client,
    config: GeminiOracleConfig,
}

impl GeminiIntentOracle {
    /// Creates an oracle client sharing the given HTTP connection pool.
    #[must_use]
    pub fn new(http_client: reqwest::Client, config: GeminiOracleConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    fn generate_content_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
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

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenates the text parts of the first candidate.
    fn completion_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect();

        (!text.trim().is_empty()).then_some(text)
    }
}

fn build_request(prompt: &OraclePrompt) -> GenerateContentRequest<'_> {
    GenerateContentRequest {
        contents: vec![RequestContent {
            role: "user",
            parts: vec![RequestPart {
                text: prompt.as_str(),
            }],
        }],
        generation_config: GenerationConfig {
            temperature: 0.0,
            response_mime_type: "application/json",
        },
    }
}

fn classify_status(status: reqwest::StatusCode) -> Option<AppError> {
    if status.is_success() {
        return None;
    }

    let detail = format!("oracle responded with status {status}");
    Some(
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            AppError::OracleRateLimited(detail)
        } else if status.is_server_error() || status == reqwest::StatusCode::REQUEST_TIMEOUT {
            AppError::OracleUnavailable(detail)
        } else {
            AppError::OracleRejected(detail)
        },
    )
}

fn transport_error(error: reqwest::Error) -> AppError {
    let error = error.without_url();
    if error.is_timeout() {
        AppError::OracleUnavailable(format!("oracle call timed out: {error}"))
    } else {
        AppError::OracleUnavailable(format!("oracle transport error: {error}"))
    }
}

#[async_trait]
impl IntentOracle for GeminiIntentOracle {
    async fn complete(&self, prompt: &OraclePrompt, timeout: Duration) -> AppResult<String> {
        let response = self
            .http_client
            .post(self.generate_content_url())
            .header(API_KEY_HEADER, self.config.api_key.as_str())
            .timeout(timeout)
            .json(&build_request(prompt))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        debug!(status = %status, model = %self.config.model, "oracle responded");
        if let Some(error) = classify_status(status) {
            return Err(error);
        }

        let body = response.text().await.map_err(transport_error)?;
        let envelope: GenerateContentResponse = serde_json::from_str(body.as_str()).map_err(|error| {
            AppError::OracleResponseUnparseable(format!("invalid oracle envelope: {error}"))
        })?;

        envelope.completion_text().ok_or_else(|| {
            AppError::OracleResponseUnparseable("oracle returned no candidate text".to_owned())
        })
    }
}

#[cfg(test)]
mod tests {
    use grantline_application::CommandBuilder;
    use grantline_core::AppError;
    use reqwest::StatusCode;
    use serde_json::json;

    use super::{
        GeminiIntentOracle, GeminiOracleConfig, GenerateContentResponse, build_request,
        classify_status,
    };

    #[test]
    fn throttling_and_outages_are_transient() {
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS),
            Some(AppError::OracleRateLimited(_))
        ));
        assert!(matches!(
            classify_status(StatusCode::SERVICE_UNAVAILABLE),
            Some(AppError::OracleUnavailable(_))
        ));
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED),
            Some(AppError::OracleRejected(_))
        ));
        assert!(classify_status(StatusCode::OK).is_none());
    }

    #[test]
    fn completion_text_joins_first_candidate_parts() {
        let envelope: Result<GenerateContentResponse, _> = serde_json::from_value(json!({
            "candidates": [
                {"content": {"parts": [{"text": "```json\n{\"action\":"}, {"text": "\"x\"}\n```"}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }));

        let text = envelope.ok().and_then(GenerateContentResponse::completion_text);
        assert_eq!(text.as_deref(), Some("```json\n{\"action\":\"x\"}\n```"));
    }

    #[test]
    fn blocked_or_empty_candidates_yield_no_text() {
        let blocked: Result<GenerateContentResponse, _> =
            serde_json::from_value(json!({"promptFeedback": {"blockReason": "SAFETY"}}));
        assert_eq!(
            blocked.ok().and_then(GenerateContentResponse::completion_text),
            None
        );

        let empty: Result<GenerateContentResponse, _> =
            serde_json::from_value(json!({"candidates": [{"content": {"parts": [{"text": "  "}]}}]}));
        assert_eq!(
            empty.ok().and_then(GenerateContentResponse::completion_text),
            None
        );
    }

    #[test]
    fn request_body_carries_prompt_and_json_mime_type() {
        let Ok(prompt) = CommandBuilder::render("assign publish:blog to editor") else {
            panic!("prompt should render");
        };

        let body = serde_json::to_value(build_request(&prompt));
        let Ok(body) = body else {
            panic!("request should serialize");
        };
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], prompt.as_str());
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn url_is_built_without_credentials() {
        let oracle = GeminiIntentOracle::new(
            reqwest::Client::new(),
            GeminiOracleConfig {
                endpoint: "https://generativelanguage.googleapis.com/".to_owned(),
                api_key: "secret".to_owned(),
                model: "gemini-1.5-flash".to_owned(),
            },
        );

        let url = oracle.generate_content_url();
        assert_eq!(
            url,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
        assert!(!url.contains("secret"));
    }
}
