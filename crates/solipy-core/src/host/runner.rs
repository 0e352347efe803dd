use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::process::Command;

use crate::error::AppError;

pub const MIN_TIMEOUT: Duration = Duration::from_secs(1);
pub const MAX_TIMEOUT: Duration = Duration::from_secs(600);

/// Captured result of one script run.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub message: String,
    pub duration_ms: u64,
}

impl ExecutionResult {
    /// What to show (and hand to the debugger) when the run failed:
    /// stderr, or stdout when stderr is empty.
    pub fn failure_output(&self) -> &str {
        if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }

    /// Text for the output pane.
    pub fn display_output(&self) -> &str {
        let output = if self.success {
            &self.stdout
        } else {
            self.failure_output()
        };
        if output.trim().is_empty() {
            &self.message
        } else {
            output
        }
    }
}

/// The external interpreter scripts are handed to, e.g. `cscript //NoLogo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptHost {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for ScriptHost {
    fn default() -> Self {
        Self {
            program: "cscript".to_string(),
            args: vec!["//NoLogo".to_string()],
        }
    }
}

pub fn clamp_timeout(timeout: Duration) -> Duration {
    timeout.clamp(MIN_TIMEOUT, MAX_TIMEOUT)
}

impl ScriptHost {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Run `script` and capture its output. A non-zero exit is reported in the
    /// result, not as an error; errors are reserved for a missing script, a
    /// host that cannot be spawned, and timeouts (the child is killed).
    pub async fn run(&self, script: &Path, timeout: Duration) -> Result<ExecutionResult, AppError> {
        if !script.is_file() {
            return Err(AppError::ScriptHostError(format!(
                "Script file does not exist: {}",
                script.display()
            )));
        }
        let timeout = clamp_timeout(timeout);
        let start = Instant::now();

        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                AppError::ScriptHostError(format!("Failed to start {}: {}", self.program, e))
            })?;

        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                log::error!(
                    "Script {} timed out after {:?}",
                    script.display(),
                    timeout
                );
                return Err(AppError::Timeout(timeout.as_secs()));
            }
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let exit_code = output.status.code();
        let success = output.status.success();

        let message = if success {
            log::info!("Script ran successfully: {}", script.display());
            "Script ran successfully.".to_string()
        } else {
            let code = exit_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "terminated by signal".to_string());
            let message = format!("Script failed (exit code: {})", code);
            let detail = if stderr.trim().is_empty() { &stdout } else { &stderr };
            log::error!("{} for {}: {}", message, script.display(), detail.trim());
            message
        };

        Ok(ExecutionResult {
            success,
            exit_code,
            stdout,
            stderr,
            message,
            duration_ms,
        })
    }
}
