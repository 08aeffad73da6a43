pub mod commands;
pub mod scan;
pub mod triage;
pub mod progress;

pub use commands::{Cli, Commands};
