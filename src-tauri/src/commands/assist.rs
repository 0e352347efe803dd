use tauri::ipc::Channel;
use tauri::State;

use solipy_core::agent::prompts;
use solipy_core::workbench::DebugReport;
use solipy_core::{AppError, WorkbenchEvent};

use super::forward;
use crate::state::AppState;

/// Run the current script and, if it fails, ask the model for a fix.
/// The fix is only written once the user accepts it through `apply_fix`.
#[tauri::command]
pub async fn debug_current_script(
    on_event: Channel<WorkbenchEvent>,
    state: State<'_, AppState>,
) -> Result<DebugReport, AppError> {
    let sink = forward(&on_event);
    let workbench = state.snapshot().await;
    workbench.debug_current(&sink).await
}

#[tauri::command]
pub async fn apply_fix(fixed_script: String, state: State<'_, AppState>) -> Result<String, AppError> {
    state.workbench.read().await.apply_fix(&fixed_script)
}

#[tauri::command]
pub async fn ask_guidance(
    question: String,
    on_event: Channel<WorkbenchEvent>,
    state: State<'_, AppState>,
) -> Result<String, AppError> {
    let sink = forward(&on_event);
    let workbench = state.snapshot().await;
    workbench.guidance(&question, &sink).await
}

#[derive(serde::Serialize)]
pub struct GuidancePrompts {
    pub placeholder: &'static str,
    pub suggestions: &'static [&'static str],
}

#[tauri::command]
pub fn guidance_prompts() -> GuidancePrompts {
    GuidancePrompts {
        placeholder: prompts::GUIDANCE_PLACEHOLDER,
        suggestions: prompts::GUIDANCE_SUGGESTIONS,
    }
}
