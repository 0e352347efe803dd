use std::time::Duration;

use serde::Serialize;

use crate::agent::diff::{compute_diff, DiffLine};
use crate::agent::{extract, prompts};
use crate::ai::message::ChatMessage;
use crate::ai::provider::{AiProvider, CompletionRequest};
use crate::error::AppError;

const DEBUG_TEMPERATURE: f32 = 0.3;
const DEBUG_MAX_TOKENS: u32 = 2500;
const GUIDANCE_MAX_TOKENS: u32 = 2000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A corrected script proposed by the model, not yet applied.
#[derive(Debug, Clone, Serialize)]
pub struct DebugOutcome {
    pub fixed_script: String,
    pub explanation: String,
    pub diff: Vec<DiffLine>,
}

/// LLM-assisted fixing of failing scripts, plus free-form Q&A.
pub struct ScriptDebugger<'a> {
    provider: &'a dyn AiProvider,
}

impl<'a> ScriptDebugger<'a> {
    pub fn new(provider: &'a dyn AiProvider) -> Self {
        Self { provider }
    }

    /// Send the script and its error output; return the fixed script and the
    /// model's explanation. A reply without recognisable code is an
    /// `ExtractionError` carrying the whole reply so the user can still read it.
    pub async fn debug(&self, script: &str, error_message: &str) -> Result<DebugOutcome, AppError> {
        let messages = vec![
            ChatMessage::system(prompts::DEBUG_SYSTEM_PROMPT),
            ChatMessage::user(prompts::build_debug_message(script, error_message)),
        ];
        let request =
            CompletionRequest::new(DEBUG_TEMPERATURE, DEBUG_MAX_TOKENS).with_timeout(REQUEST_TIMEOUT);

        log::info!("Sending debug request");
        let (reply, _) = self.provider.complete(&messages, &request).await?;

        let outcome = extract::extract_script(&reply)
            .filter(|o| !o.code.trim().is_empty())
            .ok_or_else(|| AppError::ExtractionError(reply.clone()))?;

        Ok(DebugOutcome {
            diff: compute_diff(script, &outcome.code),
            fixed_script: outcome.code,
            explanation: outcome.explanation,
        })
    }

    /// Answer a question about writing or debugging SolidWorks scripts.
    pub async fn guidance(&self, question: &str) -> Result<String, AppError> {
        let question = question.trim();
        if question.is_empty() || question == prompts::GUIDANCE_PLACEHOLDER {
            return Err(AppError::InvalidRequest("Please enter your question".into()));
        }

        let messages = vec![
            ChatMessage::system(prompts::GUIDANCE_SYSTEM_PROMPT),
            ChatMessage::user(question),
        ];
        let request = CompletionRequest::new(DEBUG_TEMPERATURE, GUIDANCE_MAX_TOKENS)
            .with_timeout(REQUEST_TIMEOUT);

        log::info!("Sending guidance request");
        let (reply, _) = self.provider.complete(&messages, &request).await?;
        Ok(reply)
    }
}
