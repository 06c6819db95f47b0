// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Background expiry of staged files.
//
// Compressed outputs are normally removed by their one download. Outputs that
// are never fetched, and uploads orphaned by a crash, are removed here once
// they are older than the download TTL.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::staging::StagingArea;

/// Periodic sweep task. Stop it with [`Sweeper::stop`].
pub struct Sweeper {
    shutdown_signal: Arc<Notify>,
    task_handle: JoinHandle<()>,
}

impl Sweeper {
    /// Spawn the sweep loop on the current runtime.
    pub fn start(staging: Arc<StagingArea>, ttl: Duration, every: Duration) -> Self {
        let shutdown_signal = Arc::new(Notify::new());
        let shutdown = Arc::clone(&shutdown_signal);

        let task_handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            info!(ttl_secs = ttl.as_secs(), every_secs = every.as_secs(), "expiry sweeper started");
            loop {
                tokio::select! {
                    _ = shutdown.notified() => {
                        debug!("sweeper received shutdown signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        let staging = Arc::clone(&staging);
                        let swept = tokio::task::spawn_blocking(move || {
                            sweep_once(&staging, ttl, Utc::now())
                        })
                        .await;
                        match swept {
                            Ok(0) => {}
                            Ok(removed) => info!(removed, "expired staged files removed"),
                            Err(err) => warn!(%err, "sweep task failed"),
                        }
                    }
                }
            }
        });

        Self {
            shutdown_signal,
            task_handle,
        }
    }

    /// Signal the loop to exit and wait for it.
    pub async fn stop(self) {
        self.shutdown_signal.notify_one();
        if let Err(err) = self.task_handle.await {
            warn!(%err, "sweeper task join failed");
        }
    }
}

/// Remove staged files last modified more than `ttl` before `now`. Returns
/// how many were removed.
pub fn sweep_once(staging: &StagingArea, ttl: Duration, now: DateTime<Utc>) -> usize {
    let Ok(ttl) = chrono::Duration::from_std(ttl) else {
        return 0;
    };
    let cutoff = now - ttl;
    sweep_dir(staging.compressed_dir(), cutoff) + sweep_dir(staging.uploads_dir(), cutoff)
}

fn sweep_dir(dir: &Path, cutoff: DateTime<Utc>) -> usize {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(dir = %dir.display(), %err, "cannot list staging directory");
            return 0;
        }
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let modified = match entry.metadata().and_then(|meta| meta.modified()) {
            Ok(time) => DateTime::<Utc>::from(time),
            Err(err) => {
                debug!(path = %path.display(), %err, "no modification time");
                continue;
            }
        };
        if modified >= cutoff || !path.is_file() {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), %modified, "expired");
                removed += 1;
            }
            Err(err) => warn!(path = %path.display(), %err, "failed to remove expired file"),
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use pdfpress_core::DownloadId;

    use super::*;

    fn area() -> (tempfile::TempDir, StagingArea) {
        let dir = tempfile::tempdir().expect("tempdir");
        let area = StagingArea::create(dir.path()).expect("staging");
        (dir, area)
    }

    #[test]
    fn fresh_files_survive() {
        let (_dir, area) = area();
        let output = area.stage_output(DownloadId::new(), "a_compressed.pdf");
        std::fs::write(output.path(), b"x").expect("write");
        let path = output.keep();

        assert_eq!(sweep_once(&area, Duration::from_secs(3600), Utc::now()), 0);
        assert!(path.exists());
    }

    #[test]
    fn expired_files_are_removed() {
        let (_dir, area) = area();
        let output = area.stage_output(DownloadId::new(), "a_compressed.pdf");
        std::fs::write(output.path(), b"x").expect("write");
        let path = output.keep();

        let later = Utc::now() + chrono::Duration::hours(2);
        assert_eq!(sweep_once(&area, Duration::from_secs(3600), later), 1);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn sweeper_stops_on_signal() {
        let (_dir, area) = area();
        let sweeper = Sweeper::start(Arc::new(area), Duration::from_secs(3600), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(30)).await;
        sweeper.stop().await;
    }
}
