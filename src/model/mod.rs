//! Core data types for scan configuration, findings, and summaries.
//!
//! This module contains the fundamental types used throughout lockscan:
//!
//! - [`Vulnerability`] - A compromised package version
//! - [`ScanConfig`] - Settings for a scan run
//! - [`ScanResult`] - Findings for one project directory
//! - [`ScanSummary`] - Aggregate counts over a whole scan
//!
//! # Example
//!
//! ```
//! use lockscan::{ScanResult, Vulnerability};
//! use lockscan::model::ScanSummary;
//!
//! let mut result = ScanResult::new("./frontend");
//! result.lockfiles.push("yarn.lock".to_string());
//! result.infected_packages.push(Vulnerability::new("flatmap-stream", "0.1.1"));
//!
//! let summary = ScanSummary::from_results(std::slice::from_ref(&result));
//! assert_eq!(summary.infected_projects, 1);
//! ```

mod scan;
mod vulnerability;

pub use scan::*;
pub use vulnerability::*;
