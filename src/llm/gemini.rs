//! Google Gemini backend over the public `generateContent` REST endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};

use super::provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider, Role,
};
use crate::error::LlmError;

const PROVIDER: &str = "gemini";
const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Gemini text completion client.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
}

impl GeminiProvider {
    pub fn new(api_key: SecretString, model: impl Into<String>) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| request_failed(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model: model.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{BASE_URL}/models/{}:generateContent", self.model)
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = build_request_body(&request);

        tracing::debug!(
            model = %self.model,
            messages = request.messages.len(),
            "Sending Gemini completion request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| request_failed(e.without_url().to_string()))?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(LlmError::RateLimited {
                provider: PROVIDER.to_string(),
                retry_after,
            });
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(LlmError::AuthFailed {
                provider: PROVIDER.to_string(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| request_failed(e.without_url().to_string()))?;

        if !status.is_success() {
            let snippet: String = text.chars().take(500).collect();
            return Err(request_failed(format!("HTTP {status}: {snippet}")));
        }

        let json: Value = serde_json::from_str(&text)?;
        parse_response(&json)
    }
}

fn request_failed(reason: String) -> LlmError {
    LlmError::RequestFailed {
        provider: PROVIDER.to_string(),
        reason,
    }
}

fn invalid_response(reason: &str) -> LlmError {
    LlmError::InvalidResponse {
        provider: PROVIDER.to_string(),
        reason: reason.to_string(),
    }
}

/// Build the `generateContent` request body.
///
/// System messages become `systemInstruction`; assistant turns use Gemini's
/// `model` role.
pub(crate) fn build_request_body(request: &CompletionRequest) -> Value {
    let system: Vec<&str> = request
        .messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect();

    let contents: Vec<Value> = request
        .messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(content_entry)
        .collect();

    let mut generation_config = serde_json::Map::new();
    if let Some(temperature) = request.temperature {
        generation_config.insert("temperature".to_string(), json!(temperature));
    }
    if let Some(max_tokens) = request.max_tokens {
        generation_config.insert("maxOutputTokens".to_string(), json!(max_tokens));
    }

    let mut body = json!({
        "contents": contents,
        "generationConfig": generation_config,
    });

    if !system.is_empty() {
        body["systemInstruction"] = json!({
            "parts": [{ "text": system.join("\n\n") }]
        });
    }

    body
}

fn content_entry(message: &ChatMessage) -> Value {
    let role = match message.role {
        Role::Assistant => "model",
        _ => "user",
    };
    json!({
        "role": role,
        "parts": [{ "text": message.content }]
    })
}

/// Extract text, usage, and finish reason from a `generateContent` response.
pub(crate) fn parse_response(response: &Value) -> Result<CompletionResponse, LlmError> {
    if let Some(error) = response.get("error") {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown Gemini API error");
        return Err(request_failed(message.to_string()));
    }

    let candidate = response
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .ok_or_else(|| invalid_response("No candidates in Gemini response"))?;

    let content: String = candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
                .collect()
        })
        .unwrap_or_default();

    let finish_reason = match candidate.get("finishReason").and_then(|r| r.as_str()) {
        Some("STOP") => FinishReason::Stop,
        Some("MAX_TOKENS") => FinishReason::Length,
        Some("SAFETY") | Some("RECITATION") | Some("BLOCKLIST") => FinishReason::ContentFilter,
        _ => FinishReason::Unknown,
    };

    let usage = response.get("usageMetadata");
    let token_count = |field: &str| {
        usage
            .and_then(|u| u.get(field))
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32
    };

    Ok(CompletionResponse {
        content,
        input_tokens: token_count("promptTokenCount"),
        output_tokens: token_count("candidatesTokenCount"),
        finish_reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_carries_generation_config_and_roles() {
        let request = CompletionRequest::new(vec![
            ChatMessage {
                role: Role::System,
                content: "Be brief.".to_string(),
            },
            ChatMessage::user("Give a hint."),
            ChatMessage {
                role: Role::Assistant,
                content: "Sure.".to_string(),
            },
        ])
        .with_temperature(0.7)
        .with_max_tokens(200);

        let body = build_request_body(&request);

        assert_eq!(body["generationConfig"]["maxOutputTokens"], 200);
        assert!((body["generationConfig"]["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Be brief.");
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
    }

    #[test]
    fn body_without_system_has_no_instruction() {
        let body = build_request_body(&CompletionRequest::new(vec![ChatMessage::user("x")]));
        assert!(body.get("systemInstruction").is_none());
        assert!(body["generationConfig"].as_object().unwrap().is_empty());
    }

    #[test]
    fn parses_text_parts_and_usage() {
        let response = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Think of " }, { "text": "Netflix." }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 4 }
        });

        let parsed = parse_response(&response).unwrap();
        assert_eq!(parsed.content, "Think of Netflix.");
        assert_eq!(parsed.input_tokens, 12);
        assert_eq!(parsed.output_tokens, 4);
        assert_eq!(parsed.finish_reason, FinishReason::Stop);
    }

    #[test]
    fn missing_parts_yield_empty_content() {
        let response = json!({ "candidates": [{ "finishReason": "MAX_TOKENS" }] });
        let parsed = parse_response(&response).unwrap();
        assert!(parsed.content.is_empty());
        assert_eq!(parsed.finish_reason, FinishReason::Length);
    }

    #[test]
    fn error_payload_becomes_request_failure() {
        let response = json!({ "error": { "code": 400, "message": "API key not valid" } });
        let err = parse_response(&response).unwrap_err();
        assert!(err.to_string().contains("API key not valid"));
    }

    #[test]
    fn no_candidates_is_invalid() {
        let err = parse_response(&json!({})).unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse { .. }));
    }

    #[test]
    fn endpoint_uses_model() {
        let provider =
            GeminiProvider::new(SecretString::from("k"), "gemini-1.5-flash").unwrap();
        assert_eq!(
            provider.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }
}
