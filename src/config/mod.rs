pub mod parser;
pub mod schema;
pub mod types;
pub mod security;
pub mod settings;

pub use types::*;
pub use parser::parse_config;
pub use settings::ScanSettings;
