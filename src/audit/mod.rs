pub mod session;
pub mod workflow_logger;
pub mod metrics_tracker;
pub mod utils;

pub use session::AuditSession;
pub use utils::atomic_write;
