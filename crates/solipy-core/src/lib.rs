//! Core of SoliPy Studio: prompting an OpenAI-compatible endpoint for
//! SolidWorks VBScript, pulling the code out of the reply, keeping a bounded
//! history of generated scripts and running them through the Windows script
//! host.

pub mod agent;
pub mod ai;
pub mod config;
pub mod error;
pub mod history;
pub mod host;
pub mod workbench;

pub use config::{AppPaths, Settings, StudioConfig};
pub use error::AppError;
pub use workbench::{Workbench, WorkbenchEvent};
