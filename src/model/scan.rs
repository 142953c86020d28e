use regex::Regex;
use serde::Serialize;
use std::path::PathBuf;

use crate::model::Vulnerability;

/// Settings for a single scan run.
///
/// Built by the CLI from flags and the optional config file, then handed
/// to [`ScanEngine`](crate::engine::ScanEngine) unchanged.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Files or directories to scan. Directories are searched for
    /// lockfiles; files are scanned directly when they are lockfiles.
    pub paths: Vec<PathBuf>,

    /// Descend into subdirectories instead of only the top level.
    pub recursive: bool,

    /// Walk into `.git` directories (skipped by default).
    pub include_git: bool,

    /// Walk into `node_modules` directories (skipped by default).
    pub include_node_modules: bool,

    /// Directories whose path matches this pattern are pruned entirely.
    pub exclude: Option<Regex>,

    /// Path the vulnerability database was loaded from.
    pub database: PathBuf,
}

/// Findings for one project directory.
///
/// A project is any directory in which at least one lockfile was found.
/// Multiple lockfiles in the same directory (e.g. `package-lock.json`
/// next to `yarn.lock`) are folded into a single result.
///
/// # Example
///
/// ```
/// use lockscan::model::{ScanResult, Vulnerability};
///
/// let mut result = ScanResult::new("./api");
/// result.lockfiles.push("package-lock.json".to_string());
/// result.infected_packages.push(Vulnerability::new("left-pad", "1.3.0"));
///
/// assert!(result.is_infected());
/// assert_eq!(result.infected_count(), 1);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    /// Project directory, as given on the command line or discovered.
    pub project: String,

    /// Lockfile names found in this directory.
    pub lockfiles: Vec<String>,

    /// Compromised packages found across all of this project's lockfiles.
    pub infected_packages: Vec<Vulnerability>,
}

impl ScanResult {
    /// Creates an empty result for the given project directory.
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            lockfiles: Vec::new(),
            infected_packages: Vec::new(),
        }
    }

    /// Number of compromised packages found in this project.
    pub fn infected_count(&self) -> usize {
        self.infected_packages.len()
    }

    /// Whether any compromised package was found in this project.
    pub fn is_infected(&self) -> bool {
        !self.infected_packages.is_empty()
    }
}

/// Aggregate counts over a whole scan.
///
/// Always computed from the full result set, before any display
/// filtering, so the totals stay accurate even when clean projects are
/// hidden from the report.
#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    /// Directories in which at least one lockfile was found.
    pub total_projects: usize,

    /// Projects with one or more compromised packages.
    pub infected_projects: usize,

    /// Compromised packages across all projects, after per-project
    /// deduplication.
    pub total_infected_packages: usize,
}

impl ScanSummary {
    /// Computes summary counts from a set of project results.
    pub fn from_results(results: &[ScanResult]) -> Self {
        let infected_projects = results.iter().filter(|r| r.is_infected()).count();
        let total_infected_packages = results.iter().map(|r| r.infected_count()).sum();

        Self {
            total_projects: results.len(),
            infected_projects,
            total_infected_packages,
        }
    }

    /// Projects in which no compromised package was found.
    pub fn clean_projects(&self) -> usize {
        self.total_projects - self.infected_projects
    }
}
