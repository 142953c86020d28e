use serde::{Deserialize, Serialize};
use std::fmt;

/// A compromised package version found in a lockfile.
///
/// Identity is the exact `name`/`version` pair. Two findings with the
/// same coordinates are the same vulnerability regardless of which
/// lockfile they came from, which is what lets results be deduplicated
/// per project.
///
/// # Example
///
/// ```
/// use lockscan::Vulnerability;
///
/// let vuln = Vulnerability::new("event-stream", "3.3.6");
/// assert_eq!(vuln.to_string(), "event-stream@3.3.6");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vulnerability {
    /// Package name, including any scope prefix (e.g. `@scope/pkg`).
    pub name: String,

    /// Exact version string as written in the lockfile.
    pub version: String,
}

impl Vulnerability {
    /// Creates a vulnerability for the given package coordinates.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for Vulnerability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}
