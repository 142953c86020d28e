pub mod config;
pub mod database;
pub mod engine;
pub mod extractor;
pub mod model;
pub mod output;

pub use config::Config;
pub use database::VulnerabilityDatabase;
pub use engine::ScanEngine;
pub use model::{ScanConfig, ScanResult, ScanSummary, Vulnerability};
