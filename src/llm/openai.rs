//! OpenAI-compatible chat completions client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ChatMessage, Credential, LlmClient};
use crate::config::LlmConfig;
use crate::error::ResearchError;

/// Chat completions client bound to one credential.
pub struct OpenAiClient {
    client: reqwest::Client,
    credential: Credential,
    config: LlmConfig,
}

impl OpenAiClient {
    /// Build a client for `credential`.
    ///
    /// No request is sent here; a bad key surfaces on the first completion.
    pub fn new(credential: Credential, config: LlmConfig) -> Result<Self, ResearchError> {
        if credential.is_blank() {
            return Err(ResearchError::MissingCredential);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| ResearchError::Construction(format!("model client: {}", e)))?;

        Ok(Self {
            client,
            credential,
            config,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

#[async_trait]
impl LlmClient for OpenAiClient {
    fn config(&self) -> &LlmConfig {
        &self.config
    }

    async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        stop: &[String],
    ) -> Result<String, ResearchError> {
        let request = CompletionRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stop: (!stop.is_empty()).then_some(stop),
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(self.credential.expose())
            .json(&request)
            .send()
            .await
            .map_err(|e| ResearchError::Llm(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = describe_api_error(status, &text)
                .replace(self.credential.expose(), "[REDACTED]");
            return Err(ResearchError::Llm(message));
        }

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ResearchError::Llm(format!("invalid response body: {}", e)))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or_else(|| ResearchError::Llm("response contained no choices".to_string()))
    }
}

/// Render an upstream error body, preferring OpenAI's structured format.
fn describe_api_error(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiError>(body) {
        Ok(err) => format!(
            "API error ({}): {}",
            err.error.error_type.unwrap_or_else(|| status.to_string()),
            err.error.message
        ),
        Err(_) => format!("API error ({}): {}", status, body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_credential_is_rejected_at_construction() {
        let result = OpenAiClient::new(Credential::new(""), LlmConfig::default());
        assert!(matches!(result, Err(ResearchError::MissingCredential)));
    }

    #[test]
    fn completions_url_tolerates_trailing_slash() {
        let config = LlmConfig {
            base_url: "http://localhost:8080/v1/".to_string(),
            ..LlmConfig::default()
        };
        let client = OpenAiClient::new(Credential::new("sk-test"), config).unwrap();
        assert_eq!(
            client.completions_url(),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn api_errors_prefer_structured_message() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        let text = describe_api_error(reqwest::StatusCode::UNAUTHORIZED, body);
        assert_eq!(text, "API error (invalid_request_error): Incorrect API key provided");

        let text = describe_api_error(reqwest::StatusCode::BAD_GATEWAY, "upstream down");
        assert!(text.contains("502"));
        assert!(text.contains("upstream down"));
    }

    #[test]
    fn request_omits_missing_stop_list() {
        let messages = vec![ChatMessage::user("hi")];
        let request = CompletionRequest {
            model: "gpt-4o-mini",
            messages: &messages,
            temperature: 0.3,
            max_tokens: 1000,
            stop: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("stop").is_none());
        assert_eq!(json["messages"][0]["role"], "user");
    }
}
