//! Replay of a captured event trace from a JSONL file.
//!
//! Each line is one record: a `t_ms` offset from trace start plus the raw
//! event fields. Events are re-emitted with the original pacing, so a trace
//! captured at 60 Hz replays at 60 Hz. Malformed lines are skipped with a
//! warning; replay never aborts mid-trace.

use crate::sensors::SourceEvent;
use crate::sources::SourceError;
use crossbeam_channel::{bounded, Receiver, Sender};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// One line of a trace file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayRecord {
    /// Offset from trace start, milliseconds.
    pub t_ms: f64,
    #[serde(flatten)]
    pub event: SourceEvent,
}

/// Threaded trace replayer.
pub struct ReplaySource {
    path: PathBuf,
    sender: Sender<SourceEvent>,
    receiver: Receiver<SourceEvent>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ReplaySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let (sender, receiver) = bounded(10_000);
        Self {
            path: path.into(),
            sender,
            receiver,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Start replaying the trace. Fails fast if the file cannot be read.
    pub fn start(&mut self) -> Result<(), SourceError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(SourceError::AlreadyRunning);
        }

        let content =
            std::fs::read_to_string(&self.path).map_err(|e| SourceError::Io(e.to_string()))?;

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        let sender = self.sender.clone();
        let path = self.path.clone();

        self.handle = Some(thread::spawn(move || {
            let origin = Instant::now();
            let mut replayed = 0usize;

            for (lineno, line) in content.lines().enumerate() {
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                if line.trim().is_empty() {
                    continue;
                }

                let record: ReplayRecord = match serde_json::from_str(line) {
                    Ok(r) => r,
                    Err(e) => {
                        warn!("skipping malformed trace line {}: {e}", lineno + 1);
                        continue;
                    }
                };

                // Pace against the trace's own timeline.
                let due = Duration::from_secs_f64(record.t_ms.max(0.0) / 1000.0);
                let elapsed = origin.elapsed();
                if due > elapsed {
                    thread::sleep(due - elapsed);
                }

                let _ = sender.try_send(record.event);
                replayed += 1;
            }

            running.store(false, Ordering::SeqCst);
            info!("replayed {replayed} events from {path:?}");
        }));

        Ok(())
    }

    /// Stop replaying and wait for the thread to exit.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Whether the trace is still being replayed.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get the receiver for replayed events.
    pub fn receiver(&self) -> &Receiver<SourceEvent> {
        &self.receiver
    }
}

impl Drop for ReplaySource {
    fn drop(&mut self) {
        self.stop();
    }
}
