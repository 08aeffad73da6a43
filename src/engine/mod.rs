pub mod provider;
pub mod process;
pub mod codeql;

pub use provider::{AnalysisEngine, EngineOutput};
pub use codeql::CodeqlCli;
