use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::agent::debugger::{DebugOutcome, ScriptDebugger};
use crate::agent::generator::{GeneratedScript, ScriptGenerator};
use crate::ai::connection::{probe_connection, ConnectionStatus};
use crate::ai::openai::OpenAiProvider;
use crate::ai::provider::AiProvider;
use crate::config::{AppPaths, Settings, StudioConfig};
use crate::error::AppError;
use crate::history::{HistoryEntry, HistoryStore, ScriptWorkspace};
use crate::host::detector::{self, HostStatus};
use crate::host::{ExecutionResult, ScriptHost};

/// Builds the provider for the current settings; swapped out in tests.
pub type ProviderFactory = Arc<dyn Fn(&Settings) -> Arc<dyn AiProvider> + Send + Sync>;

pub fn openai_factory() -> ProviderFactory {
    Arc::new(|settings: &Settings| {
        Arc::new(OpenAiProvider::from_settings(settings)) as Arc<dyn AiProvider>
    })
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Generate,
    Execute,
    Debug,
    Guidance,
    ConnectionTest,
}

/// Progress reported while a long-running operation is in flight.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkbenchEvent {
    Progress { task: TaskKind, message: String },
    Finished { task: TaskKind, success: bool, message: String },
}

impl WorkbenchEvent {
    fn progress(task: TaskKind, message: impl Into<String>) -> Self {
        Self::Progress {
            task,
            message: message.into(),
        }
    }

    fn finished(task: TaskKind, success: bool, message: impl Into<String>) -> Self {
        Self::Finished {
            task,
            success,
            message: message.into(),
        }
    }
}

pub type EventSink<'a> = &'a (dyn Fn(WorkbenchEvent) + Send + Sync);

/// Result of the debug flow: the run that exposed the error and, when it
/// failed, the model's proposed fix.
#[derive(Debug, Clone, Serialize)]
pub struct DebugReport {
    pub execution: ExecutionResult,
    pub fix: Option<DebugOutcome>,
}

/// Everything the panel does apart from drawing it. Cloning is cheap; a clone
/// shares the provider factory and sees the same files on disk.
#[derive(Clone)]
pub struct Workbench {
    paths: AppPaths,
    config: StudioConfig,
    settings: Settings,
    workspace: ScriptWorkspace,
    history: HistoryStore,
    host: ScriptHost,
    provider_factory: ProviderFactory,
}

impl Workbench {
    /// Create the script directories, install the sample, seed the current script from it
    /// and load API settings.
    pub fn open(
        paths: AppPaths,
        config: StudioConfig,
        provider_factory: ProviderFactory,
    ) -> Result<Self, AppError> {
        paths.ensure_dirs()?;
        let workspace = ScriptWorkspace::new(&paths.scripts_dir);
        workspace.install_bundled_sample()?;
        workspace.seed_current_from_sample()?;
        let history = HistoryStore::new(&paths.history_dir, config.max_history);
        let host = ScriptHost::new(config.script_host.clone(), config.script_host_args.clone());
        let settings = Settings::load(&paths);
        if settings.api_key.is_empty() {
            log::warn!("No API key configured; set OPENAI_API_KEY in .env");
        }

        Ok(Self {
            paths,
            config,
            settings,
            workspace,
            history,
            host,
            provider_factory,
        })
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    /// Persist new API settings to `.env` and use them from now on.
    pub fn update_settings(&mut self, settings: Settings) -> Result<(), AppError> {
        let settings = settings.normalized();
        settings.save_env(&self.paths.env_file)?;
        self.settings = settings;
        Ok(())
    }

    pub fn host_status(&self) -> HostStatus {
        detector::detect(&self.host)
    }

    fn provider(&self) -> Arc<dyn AiProvider> {
        (self.provider_factory)(&self.settings)
    }

    fn require_api_key(&self) -> Result<(), AppError> {
        if self.settings.api_key.trim().is_empty() {
            return Err(AppError::ConfigError(
                "API key is not set. Add OPENAI_API_KEY to .env or doc.txt, or open API settings."
                    .into(),
            ));
        }
        Ok(())
    }

    fn execution_timeout(&self) -> Duration {
        Duration::from_secs(self.config.execution_timeout_secs)
    }

    pub async fn generate(
        &self,
        query: &str,
        on_event: EventSink<'_>,
    ) -> Result<GeneratedScript, AppError> {
        self.require_api_key()?;
        on_event(WorkbenchEvent::progress(TaskKind::Generate, "Generating script..."));

        let provider = self.provider();
        let result = ScriptGenerator::new(provider.as_ref(), &self.history, &self.workspace)
            .with_timeout(self.config.generation_timeout())
            .generate(query)
            .await;

        match &result {
            Ok(generated) => on_event(WorkbenchEvent::finished(
                TaskKind::Generate,
                true,
                format!("Script created: {}", generated.entry.file_name),
            )),
            Err(e) => {
                log::error!("Script generation failed: {}", e);
                on_event(WorkbenchEvent::finished(
                    TaskKind::Generate,
                    false,
                    format!("Script generation failed: {}", e),
                ))
            }
        }
        result
    }

    async fn execute(&self, script: &Path, on_event: EventSink<'_>) -> Result<ExecutionResult, AppError> {
        on_event(WorkbenchEvent::progress(TaskKind::Execute, "Running script..."));
        let result = self.host.run(script, self.execution_timeout()).await;
        match &result {
            Ok(execution) => on_event(WorkbenchEvent::finished(
                TaskKind::Execute,
                execution.success,
                execution.message.clone(),
            )),
            Err(e) => on_event(WorkbenchEvent::finished(
                TaskKind::Execute,
                false,
                format!("Script run failed: {}", e),
            )),
        }
        result
    }

    pub async fn run_current(&self, on_event: EventSink<'_>) -> Result<ExecutionResult, AppError> {
        if !self.workspace.has_current() {
            return Err(AppError::HistoryError("There is no script to run".into()));
        }
        self.execute(&self.workspace.current_path(), on_event).await
    }

    pub async fn run_history(
        &self,
        path: &Path,
        on_event: EventSink<'_>,
    ) -> Result<ExecutionResult, AppError> {
        let path = self.history.contain(path)?;
        self.execute(&path, on_event).await
    }

    /// Run the current script; if it fails, send the script and its error
    /// output to the model for a fix. The fix is returned, not applied.
    pub async fn debug_current(&self, on_event: EventSink<'_>) -> Result<DebugReport, AppError> {
        if !self.workspace.has_current() {
            return Err(AppError::HistoryError("There is no script to debug".into()));
        }
        self.require_api_key()?;

        on_event(WorkbenchEvent::progress(
            TaskKind::Debug,
            "Running the script to find the error...",
        ));
        let script = self.workspace.read_current()?;
        let execution = self.execute(&self.workspace.current_path(), on_event).await?;

        if execution.success {
            on_event(WorkbenchEvent::finished(
                TaskKind::Debug,
                true,
                "The script ran without errors; nothing to fix.",
            ));
            return Ok(DebugReport {
                execution,
                fix: None,
            });
        }

        on_event(WorkbenchEvent::progress(TaskKind::Debug, "Asking the model for a fix..."));
        let error_text = match execution.failure_output().trim() {
            "" => execution.message.clone(),
            output => output.to_string(),
        };
        let provider = self.provider();
        match ScriptDebugger::new(provider.as_ref()).debug(&script, &error_text).await {
            Ok(fix) => {
                on_event(WorkbenchEvent::finished(TaskKind::Debug, true, "Script debugged."));
                Ok(DebugReport {
                    execution,
                    fix: Some(fix),
                })
            }
            Err(e) => {
                log::error!("Debugging failed: {}", e);
                on_event(WorkbenchEvent::finished(TaskKind::Debug, false, "Debugging failed."));
                Err(e)
            }
        }
    }

    /// Overwrite the current script with an accepted fix.
    pub fn apply_fix(&self, fixed_script: &str) -> Result<String, AppError> {
        let path = self.workspace.write_current(fixed_script)?;
        log::info!("Script fixed: {}", path.display());
        Ok(fixed_script.to_string())
    }

    pub async fn guidance(&self, question: &str, on_event: EventSink<'_>) -> Result<String, AppError> {
        self.require_api_key()?;
        on_event(WorkbenchEvent::progress(TaskKind::Guidance, "Waiting for an answer..."));
        let provider = self.provider();
        let result = ScriptDebugger::new(provider.as_ref()).guidance(question).await;
        let (success, message) = match &result {
            Ok(_) => (true, "Answer received".to_string()),
            Err(e) => (false, format!("Failed to get an answer: {}", e)),
        };
        on_event(WorkbenchEvent::finished(TaskKind::Guidance, success, message));
        result
    }

    /// Probe `candidate` settings (e.g. unsaved form values), or the active ones.
    pub async fn test_connection(
        &self,
        candidate: Option<&Settings>,
        on_event: EventSink<'_>,
    ) -> ConnectionStatus {
        on_event(WorkbenchEvent::progress(
            TaskKind::ConnectionTest,
            "Testing API connection...",
        ));
        let status = probe_connection(candidate.unwrap_or(&self.settings)).await;
        on_event(WorkbenchEvent::finished(
            TaskKind::ConnectionTest,
            status.ok,
            status.message.clone(),
        ));
        status
    }

    pub fn history(&self) -> Result<Vec<HistoryEntry>, AppError> {
        self.history.list()
    }

    /// Show a history script and make it the current one.
    pub fn load_history(&self, path: &Path) -> Result<String, AppError> {
        let path = self.history.contain(path)?;
        self.workspace.promote(&path)
    }

    pub fn load_sample(&self) -> Result<String, AppError> {
        self.workspace.load_sample()
    }

    pub fn current_script(&self) -> Option<String> {
        self.workspace.read_current().ok()
    }
}
