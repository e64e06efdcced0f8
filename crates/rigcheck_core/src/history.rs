//! Run history persistence and trend comparison.
//!
//! Each completed run appends one JSON line to `history.jsonl`. The file is
//! append-only during normal operation; rewriting only happens through
//! [`HistoryStore::rotate`], which goes through a temp file and rename. A
//! sibling lock file keeps concurrent runs from interleaving writes, and a
//! stale lock left by a crashed run is broken after a grace period.
//!
//! Loading tolerates damage: corrupt or truncated lines are skipped with a
//! warning, as are entries written by a newer schema.

use crate::error::DiagError;
use crate::rules::Issue;
use crate::scoring::HealthScore;
use crate::snapshot::Snapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

pub const SCHEMA_VERSION: u8 = 1;
pub const HISTORY_FILENAME: &str = "history.jsonl";
const LOCK_FILENAME: &str = "history.lock";
const DEFAULT_STALE_LOCK: Duration = Duration::from_secs(300);

/// Issue tally by severity, stored per history entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityCounts {
    pub fn from_issues(issues: &[Issue]) -> Self {
        use crate::rules::Severity;
        let mut counts = Self::default();
        for issue in issues {
            match issue.severity {
                Severity::Critical => counts.critical += 1,
                Severity::High => counts.high += 1,
                Severity::Medium => counts.medium += 1,
                Severity::Low => counts.low += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low
    }
}

/// One line of history.jsonl.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub schema_version: u8,
    pub recorded_at: DateTime<Utc>,
    pub run_id: Uuid,
    pub score: u8,
    pub issues_by_severity: SeverityCounts,
    pub issue_ids: Vec<String>,
    pub snapshot_digest: String,
}

impl HistoryEntry {
    pub fn from_run(run_id: Uuid, health: &HealthScore, issues: &[Issue], digest: String) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            recorded_at: Utc::now(),
            run_id,
            score: health.value,
            issues_by_severity: SeverityCounts::from_issues(issues),
            issue_ids: issues.iter().map(|i| i.rule_id.clone()).collect(),
            snapshot_digest: digest,
        }
    }
}

/// How this run compares to the previous recorded one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub score_delta: i16,
    pub previous_score: u8,
    pub previous_recorded_at: DateTime<Utc>,
    /// Rule ids firing now that did not fire last time, sorted.
    pub new_issue_ids: Vec<String>,
    /// Rule ids that fired last time but not now, sorted.
    pub resolved_issue_ids: Vec<String>,
}

/// Handle on one history directory.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    dir: PathBuf,
    path: PathBuf,
    stale_after: Duration,
}

impl HistoryStore {
    pub fn new(dir: PathBuf) -> Result<Self, DiagError> {
        std::fs::create_dir_all(&dir).map_err(|e| {
            DiagError::Persistence(format!(
                "cannot create history directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        let path = dir.join(HISTORY_FILENAME);
        Ok(Self {
            dir,
            path,
            stale_after: DEFAULT_STALE_LOCK,
        })
    }

    /// Per-user default location, e.g. `%LOCALAPPDATA%\rigcheck` on Windows.
    pub fn default_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rigcheck")
    }

    pub fn open_default() -> Result<Self, DiagError> {
        Self::new(Self::default_dir())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Shrink the stale-lock grace for tests.
    pub fn set_stale_after(&mut self, stale_after: Duration) {
        self.stale_after = stale_after;
    }

    /// Append one entry. Holds the lock only for the duration of the write.
    pub fn record(&self, entry: &HistoryEntry) -> Result<(), DiagError> {
        let _lock = self.acquire_lock()?;

        let line = serde_json::to_string(entry)
            .map_err(|e| DiagError::Persistence(format!("cannot encode history entry: {}", e)))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                DiagError::Persistence(format!("cannot open {}: {}", self.path.display(), e))
            })?;
        file.write_all(line.as_bytes())
            .and_then(|_| file.write_all(b"\n"))
            .and_then(|_| file.sync_all())
            .map_err(|e| {
                DiagError::Persistence(format!("cannot append to {}: {}", self.path.display(), e))
            })?;

        debug!("recorded run {} (score {})", entry.run_id, entry.score);
        Ok(())
    }

    /// All readable entries, oldest first. Damaged lines are skipped.
    pub fn load_all(&self) -> Result<Vec<HistoryEntry>, DiagError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            DiagError::Persistence(format!("cannot read {}: {}", self.path.display(), e))
        })?;

        let mut entries = Vec::new();
        for (number, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<HistoryEntry>(line) {
                Ok(entry) if entry.schema_version > SCHEMA_VERSION => {
                    warn!(
                        "history line {} uses schema v{}, skipping (this build reads v{})",
                        number + 1,
                        entry.schema_version,
                        SCHEMA_VERSION
                    );
                }
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    warn!("skipping corrupt history line {}: {}", number + 1, e);
                }
            }
        }
        Ok(entries)
    }

    pub fn latest(&self) -> Result<Option<HistoryEntry>, DiagError> {
        Ok(self.load_all()?.pop())
    }

    /// Compare a fresh result against the most recent entry, before that
    /// result is itself recorded. Returns `None` on first run.
    pub fn trend_against_latest(
        &self,
        score: u8,
        issue_ids: &[String],
    ) -> Result<Option<TrendSummary>, DiagError> {
        let Some(previous) = self.latest()? else {
            return Ok(None);
        };

        let current: BTreeSet<&str> = issue_ids.iter().map(String::as_str).collect();
        let before: BTreeSet<&str> = previous.issue_ids.iter().map(String::as_str).collect();

        Ok(Some(TrendSummary {
            score_delta: i16::from(score) - i16::from(previous.score),
            previous_score: previous.score,
            previous_recorded_at: previous.recorded_at,
            new_issue_ids: current
                .difference(&before)
                .map(|s| s.to_string())
                .collect(),
            resolved_issue_ids: before
                .difference(&current)
                .map(|s| s.to_string())
                .collect(),
        }))
    }

    /// Keep only the newest `keep` entries, rewriting through a temp file.
    /// Returns how many entries were dropped. Never called automatically.
    pub fn rotate(&self, keep: usize) -> Result<usize, DiagError> {
        let _lock = self.acquire_lock()?;

        let entries = self.load_all()?;
        if entries.len() <= keep {
            return Ok(0);
        }
        let dropped = entries.len() - keep;
        let tail = &entries[dropped..];

        let tmp = self.path.with_extension("jsonl.tmp");
        let mut body = String::new();
        for entry in tail {
            let line = serde_json::to_string(entry).map_err(|e| {
                DiagError::Persistence(format!("cannot encode history entry: {}", e))
            })?;
            body.push_str(&line);
            body.push('\n');
        }
        std::fs::write(&tmp, body)
            .and_then(|_| std::fs::rename(&tmp, &self.path))
            .map_err(|e| {
                DiagError::Persistence(format!("cannot rotate {}: {}", self.path.display(), e))
            })?;

        debug!("rotated history, dropped {} oldest entries", dropped);
        Ok(dropped)
    }

    fn acquire_lock(&self) -> Result<LockGuard, DiagError> {
        let lock_path = self.dir.join(LOCK_FILENAME);
        for attempt in 0..2 {
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&lock_path)
            {
                Ok(_) => {
                    return Ok(LockGuard {
                        path: lock_path,
                    })
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if attempt == 0 && lock_is_stale(&lock_path, self.stale_after) {
                        warn!("breaking stale history lock at {}", lock_path.display());
                        let _ = std::fs::remove_file(&lock_path);
                        continue;
                    }
                    return Err(DiagError::Persistence(format!(
                        "history is locked by another run ({})",
                        lock_path.display()
                    )));
                }
                Err(e) => {
                    return Err(DiagError::Persistence(format!(
                        "cannot create history lock: {}",
                        e
                    )))
                }
            }
        }
        Err(DiagError::Persistence("history lock contention".to_string()))
    }
}

struct LockGuard {
    path: PathBuf,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn lock_is_stale(path: &Path, stale_after: Duration) -> bool {
    // Unreadable metadata means the holder vanished mid-release.
    let Ok(meta) = std::fs::metadata(path) else {
        return true;
    };
    match meta.modified().ok().and_then(|m| m.elapsed().ok()) {
        Some(age) => age > stale_after,
        None => false,
    }
}

/// Content digest of a snapshot, for spotting identical machines across runs.
pub fn snapshot_digest(snapshot: &Snapshot) -> String {
    let bytes = serde_json::to_vec(snapshot).unwrap_or_default();
    let digest = Sha256::digest(&bytes);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
