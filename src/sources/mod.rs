//! Sensor sources feeding the ingest hub.
//!
//! Each source runs on its own thread and emits raw [`SourceEvent`]s over a
//! bounded channel; the run loop drains the channel and drives the hub. A
//! source that is unavailable simply never emits, and the rest of the
//! pipeline is unaffected.
//!
//! [`SourceEvent`]: crate::sensors::SourceEvent

pub mod replay;
pub mod synthetic;

pub use replay::ReplaySource;
pub use synthetic::SyntheticSource;

/// Errors that can occur when starting a source.
#[derive(Debug)]
pub enum SourceError {
    AlreadyRunning,
    Io(String),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::AlreadyRunning => write!(f, "Source is already running"),
            SourceError::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for SourceError {}
