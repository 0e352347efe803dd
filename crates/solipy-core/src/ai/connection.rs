use std::time::Duration;

use serde::Serialize;

use crate::ai::message::ChatMessage;
use crate::ai::openai::{parse_completion, OpenAiProvider};
use crate::ai::provider::CompletionRequest;
use crate::config::Settings;
use crate::error::AppError;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of the "Test API" button.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub ok: bool,
    pub message: String,
}

impl ConnectionStatus {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

fn probe_messages() -> Vec<ChatMessage> {
    vec![
        ChatMessage::system("You are a helpful assistant."),
        ChatMessage::user("Say 'Test connection successful' if you can read this."),
    ]
}

/// Send a tiny prompt and classify the result. Never returns an error; every
/// failure becomes a `ConnectionStatus` with `ok == false`.
pub async fn probe_connection(settings: &Settings) -> ConnectionStatus {
    probe_with_timeout(settings, PROBE_TIMEOUT).await
}

async fn probe_with_timeout(settings: &Settings, timeout: Duration) -> ConnectionStatus {
    let settings = settings.normalized();
    if !settings.is_complete() {
        return ConnectionStatus::failed("Please fill in API key, base URL and model");
    }

    let provider = OpenAiProvider::from_settings(&settings);
    let request = CompletionRequest::new(0.2, 20).with_timeout(timeout);
    log::info!("Testing API connection: {}", provider.chat_endpoint());

    let response = match provider.send(&probe_messages(), &request).await {
        Ok(response) => response,
        Err(e) => return classify(e),
    };

    let parsed = match response.text().await {
        Ok(body) => parse_completion(&body),
        Err(e) => Err(AppError::AiProviderError(e.to_string())),
    };
    match parsed {
        Ok((text, _)) => {
            let preview: String = text.chars().take(50).collect();
            log::info!("API connection test succeeded: {}", preview);
            ConnectionStatus::ok("Connection successful")
        }
        Err(e) => {
            log::warn!("API reachable but reply could not be parsed: {}", e);
            ConnectionStatus::ok("Connected, but the reply could not be parsed")
        }
    }
}

fn classify(err: AppError) -> ConnectionStatus {
    log::error!("API connection test failed: {}", err);
    match err {
        AppError::Timeout(_) => ConnectionStatus::failed("Error: the API did not respond in time"),
        AppError::ConnectionError(_) => {
            ConnectionStatus::failed("Error: could not connect to the server")
        }
        AppError::ApiStatus { status, .. } => ConnectionStatus::failed(format!("Error: {}", status)),
        other => {
            let text: String = other.to_string().chars().take(40).collect();
            ConnectionStatus::failed(format!("Error: {}", text))
        }
    }
}
