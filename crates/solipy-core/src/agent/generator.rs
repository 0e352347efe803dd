use std::time::Duration;

use serde::Serialize;

use crate::agent::{extract, prompts};
use crate::ai::message::ChatMessage;
use crate::ai::provider::{AiProvider, CompletionRequest};
use crate::error::AppError;
use crate::history::{HistoryEntry, HistoryStore, ScriptWorkspace};

const GENERATION_TEMPERATURE: f32 = 0.2;
const GENERATION_MAX_TOKENS: u32 = 2000;

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedScript {
    pub entry: HistoryEntry,
    pub script: String,
}

/// Turns a natural-language request into a saved VBScript.
pub struct ScriptGenerator<'a> {
    provider: &'a dyn AiProvider,
    history: &'a HistoryStore,
    workspace: &'a ScriptWorkspace,
    timeout: Option<Duration>,
}

impl<'a> ScriptGenerator<'a> {
    pub fn new(
        provider: &'a dyn AiProvider,
        history: &'a HistoryStore,
        workspace: &'a ScriptWorkspace,
    ) -> Self {
        Self {
            provider,
            history,
            workspace,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn messages(query: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(prompts::build_generation_system_prompt()),
            ChatMessage::user(prompts::build_generation_message(query)),
        ]
    }

    /// Ask the model for a script, save it to history and make it current.
    pub async fn generate(&self, query: &str) -> Result<GeneratedScript, AppError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::InvalidRequest("Please describe the operation first".into()));
        }
        log::info!("New request: {}", query);

        let mut request = CompletionRequest::new(GENERATION_TEMPERATURE, GENERATION_MAX_TOKENS);
        if let Some(timeout) = self.timeout {
            request = request.with_timeout(timeout);
        }

        let (reply, usage) = self.provider.complete(&Self::messages(query), &request).await?;
        if let Some(usage) = usage {
            log::debug!("Generation used {} tokens", usage.total());
        }

        let script = extract::script_from_reply(&reply);
        if script.is_empty() {
            return Err(AppError::AiProviderError("The model returned an empty reply".into()));
        }

        let entry = self.history.save(&script)?;
        self.workspace.promote(&entry.path)?;
        log::info!("Script created: {}", entry.path.display());

        Ok(GeneratedScript { entry, script })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::mock::MockProvider;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, HistoryStore, ScriptWorkspace) {
        let dir = TempDir::new().unwrap();
        let history = HistoryStore::new(dir.path().join("scripts/history"), 20);
        let workspace = ScriptWorkspace::new(dir.path().join("scripts"));
        (dir, history, workspace)
    }

    #[tokio::test]
    async fn test_generate_saves_and_promotes() {
        let (_dir, history, workspace) = fixture();
        let provider = MockProvider::replying(
            "Sure!\n```vbs\nOption Explicit\nDim swApp\n```\nRun it with cscript.",
        );

        let generated = ScriptGenerator::new(&provider, &history, &workspace)
            .generate("draw a circle")
            .await
            .unwrap();

        assert_eq!(generated.script, "Option Explicit\nDim swApp");
        assert_eq!(
            std::fs::read_to_string(&generated.entry.path).unwrap(),
            generated.script
        );
        assert_eq!(workspace.read_current().unwrap(), generated.script);
        assert_eq!(history.list().unwrap().len(), 1);

        let (messages, request) = provider.last_call();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert!(messages[1].content.contains("draw a circle"));
        assert_eq!(request.max_tokens, 2000);
        assert_eq!(request.temperature, 0.2);
    }

    #[tokio::test]
    async fn test_bare_reply_used_verbatim() {
        let (_dir, history, workspace) = fixture();
        let provider = MockProvider::replying("  Option Explicit\nWScript.Echo \"done\"  ");

        let generated = ScriptGenerator::new(&provider, &history, &workspace)
            .generate("save the part")
            .await
            .unwrap();
        assert_eq!(generated.script, "Option Explicit\nWScript.Echo \"done\"");
    }

    #[tokio::test]
    async fn test_truncated_reply_saved_without_fence() {
        let (_dir, history, workspace) = fixture();
        let provider =
            MockProvider::replying("```vbs\nOption Explicit\nDim swApp\nSet swApp = Nothing");

        let generated = ScriptGenerator::new(&provider, &history, &workspace)
            .generate("x")
            .await
            .unwrap();
        assert_eq!(generated.script, "Option Explicit\nDim swApp\nSet swApp = Nothing");
        assert_eq!(
            std::fs::read_to_string(&generated.entry.path).unwrap(),
            generated.script
        );
    }

    #[tokio::test]
    async fn test_empty_query_makes_no_request() {
        let (_dir, history, workspace) = fixture();
        let provider = MockProvider::replying("unused");

        let err = ScriptGenerator::new(&provider, &history, &workspace)
            .generate("   ")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_provider_error_saves_nothing() {
        let (_dir, history, workspace) = fixture();
        let provider = MockProvider::new(vec![Err(AppError::ApiStatus {
            status: 500,
            body: "oops".into(),
        })]);

        let err = ScriptGenerator::new(&provider, &history, &workspace)
            .generate("draw a line")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ApiStatus { status: 500, .. }));
        assert!(history.list().unwrap().is_empty());
        assert!(!workspace.has_current());
    }

    #[tokio::test]
    async fn test_timeout_forwarded() {
        let (_dir, history, workspace) = fixture();
        let provider = MockProvider::replying("Dim a");

        ScriptGenerator::new(&provider, &history, &workspace)
            .with_timeout(Duration::from_secs(45))
            .generate("x")
            .await
            .unwrap();
        assert_eq!(provider.last_call().1.timeout, Some(Duration::from_secs(45)));
    }
}
