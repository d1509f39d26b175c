//! Session statistics: counters for what the pipeline did this run.
//!
//! Counters are atomics so the source threads and the run loop can share one
//! instance behind an `Arc`. Nothing here feeds back into the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for the current session.
#[derive(Debug)]
pub struct SessionStats {
    samples_ingested: AtomicU64,
    messages_sent: AtomicU64,
    ticks_skipped: AtomicU64,
    windows_recorded: AtomicU64,
    session_start: DateTime<Utc>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self {
            samples_ingested: AtomicU64::new(0),
            messages_sent: AtomicU64::new(0),
            ticks_skipped: AtomicU64::new(0),
            windows_recorded: AtomicU64::new(0),
            session_start: Utc::now(),
        }
    }

    pub fn record_sample(&self) {
        self.samples_ingested.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_messages_sent(&self, count: u64) {
        self.messages_sent.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_ticks_skipped(&self, count: u64) {
        self.ticks_skipped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_window(&self) {
        self.windows_recorded.fetch_add(1, Ordering::Relaxed);
    }

    /// Current counter values.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            samples_ingested: self.samples_ingested.load(Ordering::Relaxed),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            ticks_skipped: self.ticks_skipped.load(Ordering::Relaxed),
            windows_recorded: self.windows_recorded.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Summary string for display at shutdown.
    pub fn summary(&self) -> String {
        let snap = self.snapshot();
        format!(
            "Session Statistics:\n\
             - Samples ingested: {}\n\
             - Messages sent: {}\n\
             - Ticks skipped (channel closed): {}\n\
             - Windows recorded: {}\n\
             - Session duration: {} seconds",
            snap.samples_ingested,
            snap.messages_sent,
            snap.ticks_skipped,
            snap.windows_recorded,
            snap.session_duration_secs
        )
    }

    /// Write the snapshot as JSON for post-run inspection.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json =
            serde_json::to_string_pretty(&self.snapshot()).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of the counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub samples_ingested: u64,
    pub messages_sent: u64,
    pub ticks_skipped: u64,
    pub windows_recorded: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Thread-safe shared stats handle.
pub type SharedSessionStats = Arc<SessionStats>;

pub fn create_shared_stats() -> SharedSessionStats {
    Arc::new(SessionStats::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting() {
        let stats = SessionStats::new();
        stats.record_sample();
        stats.record_sample();
        stats.record_messages_sent(3);
        stats.record_window();

        let snap = stats.snapshot();
        assert_eq!(snap.samples_ingested, 2);
        assert_eq!(snap.messages_sent, 3);
        assert_eq!(snap.windows_recorded, 1);
        assert_eq!(snap.ticks_skipped, 0);
    }

    #[test]
    fn test_summary_format() {
        let stats = SessionStats::new();
        stats.record_ticks_skipped(5);
        let summary = stats.summary();

        assert!(summary.contains("Ticks skipped"));
        assert!(summary.contains('5'));
    }
}
