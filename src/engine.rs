//! Scan orchestration.
//!
//! The engine walks every configured target, spawns one task per
//! discovered lockfile, and throttles spawning with an adaptive
//! concurrency ceiling: quick completions raise the ceiling, slow ones
//! lower it back toward the floor. Results are keyed by submission
//! index, so report order follows discovery order no matter how task
//! completions interleave.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::database::VulnerabilityDatabase;
use crate::extractor::{extractor_for, is_lockfile};
use crate::model::{ScanConfig, ScanResult, Vulnerability};

/// Tasks completing faster than this raise the concurrency ceiling.
const FAST_TASK: Duration = Duration::from_millis(50);

/// Tasks slower than this lower the ceiling back toward the floor.
const SLOW_TASK: Duration = Duration::from_millis(250);

/// Concurrency ceiling that adapts to observed task latency.
///
/// The ceiling starts at the floor, doubles after each fast task up to
/// `8 * floor`, and halves after each slow task down to the floor.
/// Durations in between leave it unchanged.
pub struct AdaptiveLimit {
    floor: usize,
    max: usize,
    ceiling: AtomicUsize,
}

impl AdaptiveLimit {
    pub fn new(floor: usize) -> Self {
        Self {
            floor,
            max: floor * 8,
            ceiling: AtomicUsize::new(floor),
        }
    }

    /// Builds a limit floored at `max(4, available parallelism)`.
    pub fn with_detected_parallelism() -> Self {
        let parallelism = std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(4);
        Self::new(parallelism.max(4))
    }

    /// The current ceiling on in-flight tasks.
    pub fn current(&self) -> usize {
        self.ceiling.load(Ordering::Relaxed)
    }

    /// Feeds one observed task duration into the ceiling.
    pub fn record(&self, duration: Duration) {
        let current = self.ceiling.load(Ordering::Relaxed);
        if duration < FAST_TASK {
            self.ceiling.store((current * 2).min(self.max), Ordering::Relaxed);
        } else if duration > SLOW_TASK {
            self.ceiling.store((current / 2).max(self.floor), Ordering::Relaxed);
        }
    }
}

/// One lockfile queued for scanning.
struct Submission {
    directory: PathBuf,
    lockfile: String,
    submitted_at: Instant,
}

/// Mutable bookkeeping for one `execute` run.
///
/// `completed` is indexed by submission id; a slot left `None` means
/// the task never reported back (it panicked) and contributes nothing.
#[derive(Default)]
struct ScanState {
    submissions: Vec<Submission>,
    completed: Vec<Option<Vec<Vulnerability>>>,
    in_flight: FuturesUnordered<JoinHandle<(usize, Vec<Vulnerability>)>>,
}

/// Walks targets, scans lockfiles concurrently, and aggregates findings
/// per project directory.
pub struct ScanEngine {
    config: ScanConfig,
    database: Arc<VulnerabilityDatabase>,
    limit: AdaptiveLimit,
}

impl ScanEngine {
    pub fn new(config: ScanConfig, database: Arc<VulnerabilityDatabase>) -> Self {
        Self {
            config,
            database,
            limit: AdaptiveLimit::with_detected_parallelism(),
        }
    }

    /// Runs the full scan and returns one result per project directory,
    /// in discovery order.
    pub async fn execute(&self) -> Vec<ScanResult> {
        let mut state = ScanState::default();

        for target in &self.config.paths {
            let target = match std::path::absolute(target) {
                Ok(path) => path,
                Err(error) => {
                    debug!(target = %target.display(), %error, "cannot resolve target");
                    continue;
                }
            };
            if !target.exists() {
                debug!(target = %target.display(), "target does not exist");
                continue;
            }

            if target.is_file() {
                if let Some(name) = file_name_of(&target) {
                    if is_lockfile(&name) {
                        let directory = target
                            .parent()
                            .map(Path::to_path_buf)
                            .unwrap_or_else(|| PathBuf::from("."));
                        self.submit(&mut state, directory, name).await;
                    }
                }
                continue;
            }

            self.walk_directory(&target, &mut state).await;
        }

        self.drain_all(&mut state).await;
        self.collect_results(state)
    }

    async fn walk_directory(&self, root: &Path, state: &mut ScanState) {
        let mut walker = WalkDir::new(root).sort_by_file_name();
        if !self.config.recursive {
            walker = walker.max_depth(1);
        }

        for entry in walker.into_iter().filter_entry(|entry| self.keep_entry(entry)) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    warn!(%error, "skipping unreadable path");
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if is_lockfile(&name) {
                let directory = entry
                    .path()
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."));
                self.submit(state, directory, name.into_owned()).await;
            }
        }
    }

    /// Directory filter applied while walking.
    ///
    /// Exclusion applies to every directory including the walk root;
    /// the name-based `node_modules` and `.git` pruning never applies
    /// to the root, so an explicitly targeted `node_modules` checkout
    /// still gets scanned. Files are never filtered here.
    fn keep_entry(&self, entry: &DirEntry) -> bool {
        if !entry.file_type().is_dir() {
            return true;
        }

        if let Some(exclude) = &self.config.exclude {
            if exclude.is_match(&entry.path().to_string_lossy()) {
                return false;
            }
        }

        if entry.depth() == 0 {
            return true;
        }

        let name = entry.file_name().to_string_lossy();
        if !self.config.include_node_modules && name.eq_ignore_ascii_case("node_modules") {
            return false;
        }
        if !self.config.include_git && name.eq_ignore_ascii_case(".git") {
            return false;
        }

        true
    }

    async fn submit(&self, state: &mut ScanState, directory: PathBuf, lockfile: String) {
        let task_id = state.submissions.len();
        let path = directory.join(&lockfile);
        let database = Arc::clone(&self.database);

        let handle =
            tokio::spawn(async move { (task_id, scan_lockfile(&path, &database).await) });

        state.submissions.push(Submission {
            directory,
            lockfile,
            submitted_at: Instant::now(),
        });
        state.completed.push(None);
        state.in_flight.push(handle);

        while state.in_flight.len() >= self.limit.current() {
            if !self.drain_one(state).await {
                break;
            }
        }
    }

    /// Waits for one task and files its outcome. Returns `false` once
    /// nothing is in flight.
    async fn drain_one(&self, state: &mut ScanState) -> bool {
        match state.in_flight.next().await {
            Some(Ok((task_id, matches))) => {
                self.limit
                    .record(state.submissions[task_id].submitted_at.elapsed());
                state.completed[task_id] = Some(matches);
                true
            }
            Some(Err(error)) => {
                warn!(%error, "lockfile scan task failed");
                true
            }
            None => false,
        }
    }

    async fn drain_all(&self, state: &mut ScanState) {
        while self.drain_one(state).await {}
    }

    /// Folds per-task outcomes into one result per project directory,
    /// in submission order, deduplicating findings within each project.
    fn collect_results(&self, state: ScanState) -> Vec<ScanResult> {
        let mut index_by_directory: HashMap<String, usize> = HashMap::new();
        let mut results: Vec<ScanResult> = Vec::new();

        for (submission, outcome) in state.submissions.into_iter().zip(state.completed) {
            let Some(matches) = outcome else {
                continue;
            };

            let directory = submission.directory.display().to_string();
            let index = *index_by_directory
                .entry(directory.clone())
                .or_insert_with(|| {
                    results.push(ScanResult::new(directory.clone()));
                    results.len() - 1
                });

            let result = &mut results[index];
            if !result.lockfiles.contains(&submission.lockfile) {
                result.lockfiles.push(submission.lockfile);
            }
            result.infected_packages.extend(matches);
        }

        for result in &mut results {
            dedup_vulnerabilities(&mut result.infected_packages);
        }

        results
    }
}

/// Scans a single lockfile, returning its database matches.
///
/// Unreadable or unparseable lockfiles are logged and yield no matches;
/// only the process-level concerns in `main` can fail a scan.
async fn scan_lockfile(path: &Path, database: &VulnerabilityDatabase) -> Vec<Vulnerability> {
    let Some(name) = file_name_of(path) else {
        return Vec::new();
    };
    let Some(extractor) = extractor_for(&name) else {
        return Vec::new();
    };

    match extractor.extract_file(path, database).await {
        Ok(matches) => matches,
        Err(error) => {
            warn!(path = %path.display(), %error, "failed to scan lockfile, skipping");
            Vec::new()
        }
    }
}

fn file_name_of(path: &Path) -> Option<String> {
    path.file_name().map(|name| name.to_string_lossy().into_owned())
}

/// Removes repeated findings while preserving first-seen order.
fn dedup_vulnerabilities(vulnerabilities: &mut Vec<Vulnerability>) {
    let mut seen = HashSet::new();
    vulnerabilities.retain(|vulnerability| seen.insert(vulnerability.clone()));
}
