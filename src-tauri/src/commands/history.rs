use std::path::PathBuf;

use tauri::ipc::Channel;
use tauri::{AppHandle, State};
use tauri_plugin_opener::OpenerExt;

use solipy_core::history::HistoryEntry;
use solipy_core::host::ExecutionResult;
use solipy_core::{AppError, WorkbenchEvent};

use super::forward;
use crate::state::AppState;

#[tauri::command]
pub async fn list_history(state: State<'_, AppState>) -> Result<Vec<HistoryEntry>, AppError> {
    state.workbench.read().await.history()
}

/// Make a history script the current one and return its text.
#[tauri::command]
pub async fn load_history_script(
    path: PathBuf,
    state: State<'_, AppState>,
) -> Result<String, AppError> {
    state.workbench.read().await.load_history(&path)
}

#[tauri::command]
pub async fn run_history_script(
    path: PathBuf,
    on_event: Channel<WorkbenchEvent>,
    state: State<'_, AppState>,
) -> Result<ExecutionResult, AppError> {
    let sink = forward(&on_event);
    let workbench = state.snapshot().await;
    workbench.run_history(&path, &sink).await
}

#[tauri::command]
pub async fn open_scripts_folder(
    app: AppHandle,
    state: State<'_, AppState>,
) -> Result<(), AppError> {
    let dir = state.workbench.read().await.paths().scripts_dir.clone();
    app.opener()
        .open_path(dir.to_string_lossy(), None::<&str>)
        .map_err(|e| AppError::ConfigError(format!("Cannot open {}: {}", dir.display(), e)))
}
