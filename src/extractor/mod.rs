//! Lockfile parsers for the supported package manager formats.
//!
//! Each extractor understands one lockfile format and reports every
//! package in it whose exact name and version appear in the
//! vulnerability database:
//!
//! | Lockfile           | Format        | Strategy                          |
//! |--------------------|---------------|-----------------------------------|
//! | `package-lock.json`| npm           | JSON `dependencies` + `packages`  |
//! | `yarn.lock`        | yarn classic  | Blank-line separated entry blocks |
//! | `pnpm-lock.yaml`   | pnpm          | Line pattern over package keys    |
//!
//! Extractors are intentionally tolerant: a lockfile that fails to
//! parse yields an error the engine logs and moves past, never a
//! scan-wide failure.
//!
//! # Example
//!
//! ```
//! use lockscan::database::VulnerabilityDatabase;
//! use lockscan::extractor::extractor_for;
//!
//! let db = VulnerabilityDatabase::from_entries([("left-pad", "1.3.0")]);
//! let extractor = extractor_for("package-lock.json").unwrap();
//!
//! let matches = extractor
//!     .extract(r#"{"dependencies": {"left-pad": {"version": "1.3.0"}}}"#, &db)
//!     .unwrap();
//! assert_eq!(matches.len(), 1);
//! assert_eq!(matches[0].to_string(), "left-pad@1.3.0");
//! ```

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::database::VulnerabilityDatabase;
use crate::model::Vulnerability;

mod npm;
mod pnpm;
mod yarn;

pub use npm::NpmExtractor;
pub use pnpm::PnpmExtractor;
pub use yarn::YarnExtractor;

/// File names recognized as lockfiles.
pub const LOCKFILE_NAMES: [&str; 3] = ["package-lock.json", "yarn.lock", "pnpm-lock.yaml"];

/// Errors raised while reading or parsing a lockfile.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The lockfile could not be read from disk.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The lockfile is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A parser for one lockfile format.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// The lockfile name this extractor handles.
    fn lockfile_name(&self) -> &'static str;

    /// Parses lockfile content and returns every package whose exact
    /// name and version appear in `database`.
    fn extract(
        &self,
        content: &str,
        database: &VulnerabilityDatabase,
    ) -> Result<Vec<Vulnerability>, ExtractError>;

    /// Reads the lockfile at `path` and extracts matches from it.
    async fn extract_file(
        &self,
        path: &Path,
        database: &VulnerabilityDatabase,
    ) -> Result<Vec<Vulnerability>, ExtractError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ExtractError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        self.extract(&content, database)
    }
}

/// Returns the extractor for a lockfile name, or `None` for files the
/// scanner does not recognize.
pub fn extractor_for(file_name: &str) -> Option<Box<dyn Extractor>> {
    match file_name {
        "package-lock.json" => Some(Box::new(NpmExtractor)),
        "yarn.lock" => Some(Box::new(YarnExtractor::new())),
        "pnpm-lock.yaml" => Some(Box::new(PnpmExtractor::new())),
        _ => None,
    }
}

/// Whether `file_name` is one of the recognized lockfile names.
pub fn is_lockfile(file_name: &str) -> bool {
    LOCKFILE_NAMES.contains(&file_name)
}
