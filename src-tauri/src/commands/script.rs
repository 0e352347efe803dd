use tauri::ipc::Channel;
use tauri::State;

use solipy_core::agent::generator::GeneratedScript;
use solipy_core::host::detector::HostStatus;
use solipy_core::host::ExecutionResult;
use solipy_core::{AppError, WorkbenchEvent};

use super::forward;
use crate::state::AppState;

#[tauri::command]
pub async fn generate_script(
    query: String,
    on_event: Channel<WorkbenchEvent>,
    state: State<'_, AppState>,
) -> Result<GeneratedScript, AppError> {
    let sink = forward(&on_event);
    let workbench = state.snapshot().await;
    workbench.generate(&query, &sink).await
}

#[tauri::command]
pub async fn run_current_script(
    on_event: Channel<WorkbenchEvent>,
    state: State<'_, AppState>,
) -> Result<ExecutionResult, AppError> {
    let sink = forward(&on_event);
    let workbench = state.snapshot().await;
    workbench.run_current(&sink).await
}

#[tauri::command]
pub async fn current_script(state: State<'_, AppState>) -> Result<Option<String>, AppError> {
    Ok(state.workbench.read().await.current_script())
}

#[tauri::command]
pub async fn load_sample_script(state: State<'_, AppState>) -> Result<String, AppError> {
    state.workbench.read().await.load_sample()
}

#[tauri::command]
pub async fn host_status(state: State<'_, AppState>) -> Result<HostStatus, AppError> {
    Ok(state.workbench.read().await.host_status())
}
