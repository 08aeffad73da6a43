pub mod target;
pub mod finding;
pub mod scan_result;
pub mod report;

pub use target::*;
pub use finding::*;
pub use scan_result::*;
pub use report::*;
