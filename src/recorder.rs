//! Fixed-duration labeled recording windows.
//!
//! A [`WindowRecorder`] is a single-slot state machine: `Idle` until armed
//! with a label and duration, then `Capturing` until the duration elapses.
//! While capturing, every ingested reading is appended to its channel's
//! buffer with a window-relative timestamp. Completion is driven by the
//! event loop calling [`WindowRecorder::poll`] with the current monotonic
//! time, which emits exactly one dataset row per started window.

use crate::dataset::DatasetRow;
use crate::sensors::{ChannelReading, EulerAngles, Vec3};
use chrono::{DateTime, SecondsFormat, Utc};
use log::debug;
use serde::Serialize;

/// Accelerometer sample with window-relative timestamp (ms).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccelSample {
    pub t: f64,
    pub ax: f64,
    pub ay: f64,
    pub az: f64,
}

/// Gyroscope sample with window-relative timestamp (ms).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GyroSample {
    pub t: f64,
    pub gx: f64,
    pub gy: f64,
    pub gz: f64,
}

/// Orientation sample with window-relative timestamp (ms).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrientationSample {
    pub t: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

/// Magnetometer sample with window-relative timestamp (ms).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MagSample {
    pub t: f64,
    pub mx: f64,
    pub my: f64,
    pub mz: f64,
}

/// Gravity sample with window-relative timestamp (ms).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GravitySample {
    pub t: f64,
    pub gx: f64,
    pub gy: f64,
    pub gz: f64,
}

/// Per-channel sample buffers for one window.
#[derive(Debug, Default)]
pub struct WindowBuffers {
    pub accel: Vec<AccelSample>,
    pub gyro: Vec<GyroSample>,
    pub orientation: Vec<OrientationSample>,
    pub mag: Vec<MagSample>,
    pub gravity: Vec<GravitySample>,
}

impl WindowBuffers {
    fn push(&mut self, t: f64, reading: &ChannelReading) {
        match reading {
            ChannelReading::Accel(Vec3 { x, y, z }) => self.accel.push(AccelSample {
                t,
                ax: *x,
                ay: *y,
                az: *z,
            }),
            ChannelReading::Gyro(Vec3 { x, y, z }) => self.gyro.push(GyroSample {
                t,
                gx: *x,
                gy: *y,
                gz: *z,
            }),
            ChannelReading::Orientation(EulerAngles { alpha, beta, gamma }) => {
                self.orientation.push(OrientationSample {
                    t,
                    alpha: *alpha,
                    beta: *beta,
                    gamma: *gamma,
                })
            }
            ChannelReading::Magnetometer(Vec3 { x, y, z }) => self.mag.push(MagSample {
                t,
                mx: *x,
                my: *y,
                mz: *z,
            }),
            ChannelReading::Gravity(Vec3 { x, y, z }) => self.gravity.push(GravitySample {
                t,
                gx: *x,
                gy: *y,
                gz: *z,
            }),
            // Quaternion readings update the live snapshot only; the dataset
            // row has no quaternion column.
            ChannelReading::Rotation(_) => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        self.accel.is_empty()
            && self.gyro.is_empty()
            && self.orientation.is_empty()
            && self.mag.is_empty()
            && self.gravity.is_empty()
    }

    pub fn sample_count(&self) -> usize {
        self.accel.len()
            + self.gyro.len()
            + self.orientation.len()
            + self.mag.len()
            + self.gravity.len()
    }
}

/// The window currently being captured.
#[derive(Debug)]
struct ActiveWindow {
    label: String,
    /// Monotonic start time, ms.
    t0: f64,
    duration_ms: f64,
    buffers: WindowBuffers,
}

/// Single-slot recorder for fixed-duration labeled windows.
#[derive(Debug, Default)]
pub struct WindowRecorder {
    active: Option<ActiveWindow>,
}

fn encode_buffer<T: Serialize>(samples: &[T]) -> String {
    serde_json::to_string(samples).unwrap_or_else(|_| "[]".to_string())
}

impl WindowRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a window is currently being captured.
    pub fn is_capturing(&self) -> bool {
        self.active.is_some()
    }

    /// Arm a new window. Returns `true` when the recorder armed.
    ///
    /// No-op while a window is already capturing: an in-flight window is
    /// never interrupted or extended, and the late request is dropped. A
    /// window whose duration has elapsed stays capturing until the next
    /// [`poll`](WindowRecorder::poll), so callers drive any due finish
    /// before arming.
    pub fn start(&mut self, label: &str, duration_ms: f64, now_ms: f64) -> bool {
        if let Some(ref active) = self.active {
            debug!(
                "recorder busy with \"{}\", dropping start request \"{label}\"",
                active.label
            );
            return false;
        }

        debug!("recorder start \"{label}\" for {duration_ms}ms");
        self.active = Some(ActiveWindow {
            label: label.to_string(),
            t0: now_ms,
            duration_ms,
            buffers: WindowBuffers::default(),
        });
        true
    }

    /// Append a reading to the active window's buffer. No-op while idle.
    pub fn ingest(&mut self, reading: &ChannelReading, now_ms: f64) {
        if let Some(ref mut active) = self.active {
            let t = now_ms - active.t0;
            active.buffers.push(t, reading);
        }
    }

    /// Finish the window if its duration has elapsed.
    ///
    /// Emits at most one row per started window and returns the recorder to
    /// idle. `finished_at` becomes the row's `start_time_iso`, matching the
    /// wall-clock stamp the export consumers expect.
    pub fn poll(
        &mut self,
        now_ms: f64,
        device_id: &str,
        finished_at: DateTime<Utc>,
    ) -> Option<DatasetRow> {
        let due = match self.active {
            Some(ref active) => now_ms - active.t0 >= active.duration_ms,
            None => false,
        };
        if !due {
            return None;
        }

        let active = self.active.take()?;
        debug!(
            "recorder finish \"{}\" with {} samples",
            active.label,
            active.buffers.sample_count()
        );

        Some(DatasetRow {
            label: active.label,
            device_id: device_id.to_string(),
            start_time_iso: finished_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            duration_ms: active.duration_ms.round() as u64,
            accel: encode_buffer(&active.buffers.accel),
            gyro: encode_buffer(&active.buffers.gyro),
            orientation: encode_buffer(&active.buffers.orientation),
            mag: encode_buffer(&active.buffers.mag),
            gravity: encode_buffer(&active.buffers.gravity),
        })
    }
}
