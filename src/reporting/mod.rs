pub mod formatter;
pub mod assembler;

pub use formatter::{present, Presentation};
pub use assembler::{write_report, ReportPaths};
