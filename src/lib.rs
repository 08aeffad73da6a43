pub mod audit;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod models;
pub mod pipeline;
pub mod reporting;
pub mod triage;
pub mod utils;
