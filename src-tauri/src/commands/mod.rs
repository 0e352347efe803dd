pub mod assist;
pub mod history;
pub mod script;
pub mod settings;

use tauri::ipc::Channel;

use solipy_core::WorkbenchEvent;

/// Adapts a frontend channel to the workbench's progress callback.
pub(crate) fn forward(channel: &Channel<WorkbenchEvent>) -> impl Fn(WorkbenchEvent) + Send + Sync + '_ {
    move |event| {
        if let Err(e) = channel.send(event) {
            log::debug!("Dropped status event: {}", e);
        }
    }
}
