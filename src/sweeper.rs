//! Retention sweep over the upload directory.
//!
//! Every regular file whose modification time is older than the retention
//! window is deleted, processed or not. There is no exclusion list: a file a
//! request is about to serve can disappear underneath it.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Counts from one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub removed: usize,
    pub failed: usize,
}

/// Delete entries of `dir` older than `max_age`.
///
/// Failures on individual entries are logged and counted; the sweep always
/// continues with the remaining entries. A missing directory is an empty
/// sweep.
pub fn sweep(dir: &Path, max_age: Duration) -> SweepReport {
    let mut report = SweepReport::default();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return report,
        Err(e) => {
            tracing::error!(error = %e, dir = %dir.display(), "Cannot list upload directory");
            return report;
        }
    };

    let now = SystemTime::now();

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::error!(error = %e, "Cannot read directory entry");
                report.failed += 1;
                continue;
            }
        };
        report.scanned += 1;

        let path = entry.path();
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::error!(error = %e, path = %path.display(), "Cannot stat file");
                report.failed += 1;
                continue;
            }
        };
        if !metadata.is_file() {
            continue;
        }

        // A modification time in the future counts as age zero.
        let age = metadata
            .modified()
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .unwrap_or_default();
        if age <= max_age {
            continue;
        }

        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), age_secs = age.as_secs(), "Deleted expired file");
                report.removed += 1;
            }
            Err(e) => {
                tracing::error!(error = %e, path = %path.display(), "Error removing file");
                report.failed += 1;
            }
        }
    }

    report
}

/// Runs [`sweep`] over one directory on a fixed period.
#[derive(Debug, Clone)]
pub struct Sweeper {
    dir: PathBuf,
    max_age: Duration,
    period: Duration,
}

impl Sweeper {
    pub fn new(dir: impl Into<PathBuf>, max_age: Duration, period: Duration) -> Self {
        Self {
            dir: dir.into(),
            max_age,
            period,
        }
    }

    /// Run one sweep now.
    pub fn run_once(&self) -> SweepReport {
        sweep(&self.dir, self.max_age)
    }

    /// Start the background loop. The first sweep runs immediately.
    /// Returns the JoinHandle so the caller can abort it on shutdown.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let dir = self.dir.clone();
                let max_age = self.max_age;
                match tokio::task::spawn_blocking(move || sweep(&dir, max_age)).await {
                    Ok(report) => tracing::info!(
                        scanned = report.scanned,
                        removed = report.removed,
                        failed = report.failed,
                        "Cleanup completed"
                    ),
                    Err(e) => tracing::error!(error = %e, "Cleanup task failed"),
                }
            }
        })
    }
}
