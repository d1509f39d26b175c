//! Sample ingest hub: the single point where raw source events enter the
//! pipeline.
//!
//! Every event is normalized to canonical channel readings, written into the
//! latest-reading snapshot, and forwarded unchanged to the window recorder.
//! Ingestion is synchronous, infallible, and allocation-free in the steady
//! state, since sources may fire far more often than the send interval.

use crate::dataset::Dataset;
use crate::recorder::WindowRecorder;
use crate::sensors::{ChannelReading, SensorState, SourceEvent};
use chrono::{DateTime, Utc};
use log::info;

/// Owns the snapshot, the recorder, and the dataset, and keeps them
/// consistent: a reading is never visible in one and missing from the other.
#[derive(Debug)]
pub struct SampleIngestHub {
    device_id: String,
    state: SensorState,
    recorder: WindowRecorder,
    dataset: Dataset,
    /// Reused per-ingest scratch; a motion event yields two readings.
    scratch: Vec<ChannelReading>,
}

impl SampleIngestHub {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            state: SensorState::new(),
            recorder: WindowRecorder::new(),
            dataset: Dataset::new(),
            scratch: Vec::with_capacity(2),
        }
    }

    /// Ingest one raw source event at monotonic time `now_ms`.
    pub fn ingest(&mut self, event: &SourceEvent, now_ms: f64) {
        self.scratch.clear();
        event.normalize_into(&mut self.scratch);
        for reading in &self.scratch {
            self.recorder.ingest(reading, now_ms);
            self.state.apply(*reading);
        }
    }

    /// Arm a recording window. Returns `true` when the recorder armed;
    /// a request arriving while a window is still capturing is dropped.
    /// A due window must be finished via [`poll`](SampleIngestHub::poll)
    /// before a later request can arm.
    pub fn start_window(&mut self, label: &str, duration_ms: f64, now_ms: f64) -> bool {
        self.recorder.start(label, duration_ms, now_ms)
    }

    /// Drive the deferred window finish.
    ///
    /// Returns `true` when a window completed and its row was appended to
    /// the dataset.
    pub fn poll(&mut self, now_ms: f64, wall: DateTime<Utc>) -> bool {
        match self.recorder.poll(now_ms, &self.device_id, wall) {
            Some(row) => {
                info!("window \"{}\" recorded", row.label);
                self.dataset.append_row(&row);
                true
            }
            None => false,
        }
    }

    /// Current latest-reading snapshot, for the sender or any renderer.
    pub fn snapshot(&self) -> &SensorState {
        &self.state
    }

    pub fn is_capturing(&self) -> bool {
        self.recorder.is_capturing()
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn dataset_mut(&mut self) -> &mut Dataset {
        &mut self.dataset
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }
}
