use serde::Serialize;
use tauri::ipc::Channel;
use tauri::State;

use solipy_core::ai::connection::ConnectionStatus;
use solipy_core::ai::registry::{self, ProviderPreset};
use solipy_core::workbench::openai_factory;
use solipy_core::{AppError, Settings, StudioConfig, Workbench, WorkbenchEvent};

use super::forward;
use crate::state::AppState;

#[derive(Serialize)]
pub struct SettingsView {
    pub settings: Settings,
    /// Preset matching the configured base URL, if any.
    pub provider: Option<String>,
}

#[tauri::command]
pub fn get_provider_registry() -> Vec<ProviderPreset> {
    registry::presets()
}

#[tauri::command]
pub async fn get_settings(state: State<'_, AppState>) -> Result<SettingsView, AppError> {
    let workbench = state.snapshot().await;
    let settings = workbench.settings().clone();
    let provider = registry::find_by_base_url(&settings.base_url).map(|p| p.id);
    Ok(SettingsView { settings, provider })
}

#[tauri::command]
pub async fn update_settings(
    settings: Settings,
    state: State<'_, AppState>,
) -> Result<(), AppError> {
    settings.normalized().validate()?;
    state.workbench.write().await.update_settings(settings)
}

/// Probe the form's values before they are saved; falls back to the active settings.
#[tauri::command]
pub async fn test_connection(
    settings: Option<Settings>,
    on_event: Channel<WorkbenchEvent>,
    state: State<'_, AppState>,
) -> Result<ConnectionStatus, AppError> {
    let sink = forward(&on_event);
    let workbench = state.snapshot().await;
    Ok(workbench
        .test_connection(settings.as_ref(), &sink)
        .await)
}

#[tauri::command]
pub async fn get_studio_config(state: State<'_, AppState>) -> Result<StudioConfig, AppError> {
    Ok(state.workbench.read().await.config().clone())
}

/// Persist studio preferences and reopen the workspace with them.
#[tauri::command]
pub async fn update_studio_config(
    config: StudioConfig,
    state: State<'_, AppState>,
) -> Result<(), AppError> {
    config.validate()?;
    config.save()?;

    let mut workbench = state.workbench.write().await;
    let paths = workbench.paths().clone();
    *workbench = Workbench::open(paths, config, openai_factory())?;
    log::info!("Studio config updated");
    Ok(())
}
