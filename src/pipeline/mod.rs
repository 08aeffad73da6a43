pub mod orchestrator;
pub mod stage;
pub mod events;
pub mod lock;

pub use orchestrator::ScanOrchestrator;
pub use events::ScanEvent;
