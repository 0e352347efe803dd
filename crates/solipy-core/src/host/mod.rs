pub mod detector;
pub mod runner;

pub use runner::{ExecutionResult, ScriptHost};
