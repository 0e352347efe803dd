mod commands;
mod logging;
mod state;

use solipy_core::workbench::openai_factory;
use solipy_core::{AppPaths, StudioConfig, Workbench};

use state::AppState;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let paths = AppPaths::resolve();
    if let Err(e) = paths.ensure_dirs() {
        eprintln!("Cannot create {}: {}", paths.scripts_dir.display(), e);
    }
    logging::init(&paths.log_file);
    log::info!("SoliPy Studio starting in {}", paths.root.display());

    let config = StudioConfig::load().unwrap_or_else(|e| {
        log::warn!("Using default studio config: {}", e);
        StudioConfig::default()
    });
    let workbench = match Workbench::open(paths, config, openai_factory()) {
        Ok(workbench) => workbench,
        Err(e) => {
            log::error!("Cannot open the script workspace: {}", e);
            std::process::exit(1);
        }
    };

    let host = workbench.host_status();
    if !host.available {
        log::warn!(
            "{}",
            host.reason.as_deref().unwrap_or("Script host unavailable")
        );
    }

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .manage(AppState::new(workbench))
        .invoke_handler(tauri::generate_handler![
            commands::script::generate_script,
            commands::script::run_current_script,
            commands::script::current_script,
            commands::script::load_sample_script,
            commands::script::host_status,
            commands::history::list_history,
            commands::history::load_history_script,
            commands::history::run_history_script,
            commands::history::open_scripts_folder,
            commands::assist::debug_current_script,
            commands::assist::apply_fix,
            commands::assist::ask_guidance,
            commands::assist::guidance_prompts,
            commands::settings::get_provider_registry,
            commands::settings::get_settings,
            commands::settings::update_settings,
            commands::settings::test_connection,
            commands::settings::get_studio_config,
            commands::settings::update_studio_config,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
