use tokio::sync::RwLock;

use solipy_core::Workbench;

pub struct AppState {
    /// Settings and studio-config changes replace parts of it under the write lock.
    pub workbench: RwLock<Workbench>,
}

impl AppState {
    pub fn new(workbench: Workbench) -> Self {
        Self {
            workbench: RwLock::new(workbench),
        }
    }

    /// Clone the workbench and release the lock, for operations that await
    /// the model or the script host.
    pub async fn snapshot(&self) -> Workbench {
        self.workbench.read().await.clone()
    }
}
