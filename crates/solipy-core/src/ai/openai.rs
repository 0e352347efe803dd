use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::ai::message::ChatMessage;
use crate::ai::provider::{AiProvider, CompletionRequest, TokenUsage};
use crate::config::Settings;
use crate::error::AppError;

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";
const REFERER: &str = "https://solipy.app";

pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
            base_url,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.api_key.clone(),
            settings.model.clone(),
            settings.base_url.clone(),
        )
    }

    /// Accepts both a full `.../chat/completions` URL and an API root like `.../v1`.
    pub fn chat_endpoint(&self) -> String {
        let base = self.base_url.trim().trim_end_matches('/');
        if base.ends_with(CHAT_COMPLETIONS_PATH) {
            base.to_string()
        } else {
            format!("{}{}", base, CHAT_COMPLETIONS_PATH)
        }
    }

    /// POST the request and fail on any non-2xx status.
    pub(crate) async fn send(
        &self,
        messages: &[ChatMessage],
        request: &CompletionRequest,
    ) -> Result<reqwest::Response, AppError> {
        let body = OpenAiRequest {
            model: &self.model,
            messages: messages.iter().map(OpenAiMessage::from).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let mut builder = self
            .client
            .post(self.chat_endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", REFERER)
            .json(&body);
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        log::info!(
            "Sending request to {} (model {})",
            self.chat_endpoint(),
            self.model
        );
        let response = builder
            .send()
            .await
            .map_err(|e| map_transport_error(e, request.timeout))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "could not read body".into());
            log::error!("API returned {}: {}", status, text);
            return Err(AppError::ApiStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(response)
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn map_transport_error(e: reqwest::Error, timeout: Option<Duration>) -> AppError {
    if e.is_timeout() {
        AppError::Timeout(timeout.map(|t| t.as_secs()).unwrap_or_default())
    } else if e.is_connect() {
        AppError::ConnectionError(e.to_string())
    } else {
        AppError::AiProviderError(format!("HTTP request failed: {}", e))
    }
}

// --- Request / Response types for the Chat Completions API ---

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct OpenAiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

impl<'a> From<&'a ChatMessage> for OpenAiMessage<'a> {
    fn from(msg: &'a ChatMessage) -> Self {
        Self {
            role: &msg.role,
            content: &msg.content,
        }
    }
}

#[derive(Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: Option<OpenAiMessageContent>,
}

#[derive(Deserialize)]
struct OpenAiMessageContent {
    content: Option<String>,
    /// Reasoning models put their output here when `content` is empty.
    reasoning_content: Option<String>,
}

/// Pull the first choice's text (trimmed) and usage out of a response body.
pub fn parse_completion(body: &str) -> Result<(String, Option<TokenUsage>), AppError> {
    let resp: OpenAiResponse = serde_json::from_str(body)
        .map_err(|e| AppError::AiProviderError(format!("Failed to parse response: {}", e)))?;

    let message = resp.choices.first().and_then(|c| c.message.as_ref());
    let text = message
        .and_then(|m| {
            m.content
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .or(m.reasoning_content.as_deref())
        })
        .unwrap_or_default()
        .trim()
        .to_string();

    if text.is_empty() {
        log::warn!(
            "API returned empty text ({} choices)",
            resp.choices.len()
        );
    }

    let usage = resp.usage.map(|u| TokenUsage {
        input_tokens: u.prompt_tokens,
        output_tokens: u.completion_tokens,
    });

    Ok((text, usage))
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        request: &CompletionRequest,
    ) -> Result<(String, Option<TokenUsage>), AppError> {
        let response = self.send(messages, request).await?;
        let body = response
            .text()
            .await
            .map_err(|e| map_transport_error(e, request.timeout))?;
        parse_completion(&body)
    }
}


#[cfg(test)]
mod tests {
    use super::test_server::serve_once;
    use super::*;

    fn provider(base_url: &str) -> OpenAiProvider {
        OpenAiProvider::new("sk-test".into(), "gpt-4o-mini".into(), base_url.into())
    }

    #[test]
    fn test_chat_endpoint_keeps_full_url() {
        let p = provider("https://api.openai.com/v1/chat/completions");
        assert_eq!(p.chat_endpoint(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn test_chat_endpoint_appends_path() {
        let p = provider("https://openrouter.ai/api/v1/");
        assert_eq!(
            p.chat_endpoint(),
            "https://openrouter.ai/api/v1/chat/completions"
        );
    }

    #[test]
    fn test_parse_completion_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"  Option Explicit\n"}}],"usage":{"prompt_tokens":12,"completion_tokens":3}}"#;
        let (text, usage) = parse_completion(body).unwrap();
        assert_eq!(text, "Option Explicit");
        assert_eq!(usage.unwrap().total(), 15);
    }

    #[test]
    fn test_parse_completion_reasoning_fallback() {
        let body = r#"{"choices":[{"message":{"content":"","reasoning_content":"Dim swApp"}}]}"#;
        let (text, usage) = parse_completion(body).unwrap();
        assert_eq!(text, "Dim swApp");
        assert!(usage.is_none());
    }

    #[test]
    fn test_parse_completion_no_choices_is_empty() {
        let (text, _) = parse_completion(r#"{"choices":[]}"#).unwrap();
        assert!(text.is_empty());
    }

    #[test]
    fn test_parse_completion_invalid_json() {
        assert!(matches!(
            parse_completion("<html>bad gateway</html>"),
            Err(AppError::AiProviderError(_))
        ));
    }

    #[tokio::test]
    async fn test_complete_posts_chat_request() {
        let (base_url, server) = serve_once(
            200,
            r#"{"choices":[{"message":{"content":"WScript.Echo \"ok\""}}]}"#,
        )
        .await;
        let p = provider(&base_url);
        let messages = vec![ChatMessage::system("sys"), ChatMessage::user("draw a circle")];

        let (text, _) = p
            .complete(&messages, &CompletionRequest::new(0.2, 2000))
            .await
            .unwrap();
        assert_eq!(text, "WScript.Echo \"ok\"");

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /v1/chat/completions"));
        let lower = raw.to_lowercase();
        assert!(lower.contains("authorization: bearer sk-test"));
        assert!(lower.contains("http-referer: https://solipy.app"));
        let body = &raw[raw.find("\r\n\r\n").unwrap() + 4..];
        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["max_tokens"], 2000);
        assert_eq!(json["messages"][1]["content"], "draw a circle");
        assert_eq!(json["messages"][0]["role"], "system");
    }

    #[tokio::test]
    async fn test_complete_reports_status() {
        let (base_url, _server) = serve_once(401, r#"{"error":"bad key"}"#).await;
        let err = provider(&base_url)
            .complete(&[ChatMessage::user("hi")], &CompletionRequest::new(0.2, 20))
            .await
            .unwrap_err();
        match err {
            AppError::ApiStatus { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("bad key"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
