//! Infected package database.
//!
//! The database is a plain text file with one `name:version` entry per
//! line. Blank lines and lines starting with `#` are ignored, so the
//! file can carry comments and section headers:
//!
//! ```text
//! # npm supply chain incidents
//! event-stream:3.3.6
//! @ctrl/tinycolor:4.1.1
//! ```
//!
//! Lookups are exact string matches on both name and version. No range
//! or semver interpretation is applied, which keeps the database format
//! trivially auditable.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Errors raised while loading the database file.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The database file does not exist.
    #[error("infected database not found at: {}", path.display())]
    NotFound { path: PathBuf },

    /// The database file exists but could not be read.
    #[error("failed to read database at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// In-memory index of known-compromised package versions.
///
/// Stored as a map from package name to the set of bad versions, so a
/// lookup is two hash probes regardless of database size.
///
/// # Example
///
/// ```
/// use lockscan::database::VulnerabilityDatabase;
///
/// let db = VulnerabilityDatabase::from_entries([
///     ("event-stream", "3.3.6"),
///     ("event-stream", "4.0.0"),
///     ("left-pad", "1.3.0"),
/// ]);
///
/// assert!(db.is_infected("event-stream", "3.3.6"));
/// assert!(!db.is_infected("event-stream", "3.3.5"));
/// assert_eq!(db.entry_count(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct VulnerabilityDatabase {
    entries: HashMap<String, HashSet<String>>,
    entry_count: usize,
}

impl VulnerabilityDatabase {
    /// Loads the database from a `name:version`-per-line text file.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::NotFound`] if the file does not exist,
    /// or [`DatabaseError::Io`] for any other read failure.
    pub fn load(path: &Path) -> Result<Self, DatabaseError> {
        let content = fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                DatabaseError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                DatabaseError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let mut db = Self::default();
        for raw in content.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            // Only the first colon separates name from version, so
            // versions containing colons survive intact.
            let Some((name, version)) = line.split_once(':') else {
                continue;
            };
            let version = version.trim();
            if name.is_empty() || version.is_empty() {
                continue;
            }
            db.insert(name, version);
        }

        debug!(
            path = %path.display(),
            entries = db.entry_count,
            "loaded vulnerability database"
        );

        Ok(db)
    }

    /// Builds a database directly from `(name, version)` pairs.
    ///
    /// Mostly useful in tests and for embedders that source their
    /// denylist from somewhere other than a file.
    pub fn from_entries<N, V, I>(entries: I) -> Self
    where
        N: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (N, V)>,
    {
        let mut db = Self::default();
        for (name, version) in entries {
            db.insert(&name.into(), &version.into());
        }
        db
    }

    fn insert(&mut self, name: &str, version: &str) {
        if self
            .entries
            .entry(name.to_string())
            .or_default()
            .insert(version.to_string())
        {
            self.entry_count += 1;
        }
    }

    /// Whether this exact `name`/`version` pair is known compromised.
    pub fn is_infected(&self, name: &str, version: &str) -> bool {
        self.entries
            .get(name)
            .is_some_and(|versions| versions.contains(version))
    }

    /// Number of unique `name:version` entries loaded.
    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    /// Default database location: `database.txt` next to the executable.
    pub fn default_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join("database.txt")))
            .unwrap_or_else(|| PathBuf::from("database.txt"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_db(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("database.txt");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_basic_entries() {
        let (_dir, path) = write_db("lodash:4.17.20\n@ctrl/tinycolor:4.1.1\n");
        let db = VulnerabilityDatabase::load(&path).unwrap();

        assert_eq!(db.entry_count(), 2);
        assert!(db.is_infected("lodash", "4.17.20"));
        assert!(db.is_infected("@ctrl/tinycolor", "4.1.1"));
        assert!(!db.is_infected("lodash", "4.17.21"));
        assert!(!db.is_infected("underscore", "4.17.20"));
    }

    #[test]
    fn test_load_skips_comments_and_blanks() {
        let (_dir, path) = write_db("# header\n\n  \nlodash:4.17.20\n# trailing comment\n");
        let db = VulnerabilityDatabase::load(&path).unwrap();

        assert_eq!(db.entry_count(), 1);
        assert!(db.is_infected("lodash", "4.17.20"));
    }

    #[test]
    fn test_load_splits_on_first_colon_only() {
        let (_dir, path) = write_db("weird:1.0.0:beta\n");
        let db = VulnerabilityDatabase::load(&path).unwrap();

        assert!(db.is_infected("weird", "1.0.0:beta"));
    }

    #[test]
    fn test_load_trims_version_whitespace() {
        let (_dir, path) = write_db("lodash: 4.17.20 \n");
        let db = VulnerabilityDatabase::load(&path).unwrap();

        assert!(db.is_infected("lodash", "4.17.20"));
    }

    #[test]
    fn test_load_skips_lines_without_colon_or_empty_parts() {
        let (_dir, path) = write_db("not-an-entry\n:1.0.0\nlodash:\nlodash:4.17.20\n");
        let db = VulnerabilityDatabase::load(&path).unwrap();

        assert_eq!(db.entry_count(), 1);
        assert!(db.is_infected("lodash", "4.17.20"));
    }

    #[test]
    fn test_load_counts_unique_entries() {
        let (_dir, path) = write_db("lodash:4.17.20\nlodash:4.17.20\nlodash:4.17.21\n");
        let db = VulnerabilityDatabase::load(&path).unwrap();

        assert_eq!(db.entry_count(), 2);
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.txt");

        match VulnerabilityDatabase::load(&path) {
            Err(DatabaseError::NotFound { path: reported }) => assert_eq!(reported, path),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_from_entries_deduplicates() {
        let db = VulnerabilityDatabase::from_entries([
            ("a", "1.0.0"),
            ("a", "1.0.0"),
            ("b", "2.0.0"),
        ]);

        assert_eq!(db.entry_count(), 2);
        assert!(db.is_infected("a", "1.0.0"));
        assert!(db.is_infected("b", "2.0.0"));
    }
}
