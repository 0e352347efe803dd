pub mod debugger;
pub mod diff;
pub mod extract;
pub mod generator;
pub mod prompts;
