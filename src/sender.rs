//! Periodic best-effort transmission of sensor snapshots.
//!
//! The sender samples the *latest* snapshot on a fixed interval rather than
//! queuing every ingested reading, so memory and network volume stay bounded
//! no matter how fast the sensor sources fire. A tick that finds the send
//! channel closed is skipped silently and consumes no sequence number.

use crate::sensors::SensorState;
use chrono::{DateTime, Utc};
use log::warn;
use serde::Serialize;

/// The transport as the pipeline sees it: open or closed, and a way to
/// hand off bytes. Transport lifecycle and errors live outside the core.
pub trait SendChannel {
    fn is_open(&self) -> bool;
    fn send(&mut self, bytes: &[u8]);
}

/// One outbound message: the snapshot plus session bookkeeping.
#[derive(Debug, Serialize)]
pub struct OutboundSample<'a> {
    #[serde(rename = "deviceId")]
    pub device_id: &'a str,
    pub seq: u64,
    /// Wall-clock transmit time, ms since epoch.
    pub timestamp: i64,
    pub sensors: &'a SensorState,
}

/// Deadline-driven periodic sender.
///
/// Armed with [`start`](PeriodicSender::start), it fires on every elapsed
/// interval boundary when [`poll`](PeriodicSender::poll) is called with the
/// current monotonic time. `seq` is contiguous within one send session.
#[derive(Debug)]
pub struct PeriodicSender {
    device_id: String,
    interval_ms: f64,
    next_tick_at: Option<f64>,
    seq: u64,
    sent_count: u64,
    skipped_ticks: u64,
    last_sent_at: Option<DateTime<Utc>>,
}

impl PeriodicSender {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            interval_ms: 0.0,
            next_tick_at: None,
            seq: 0,
            sent_count: 0,
            skipped_ticks: 0,
            last_sent_at: None,
        }
    }

    /// Begin a new send session.
    ///
    /// Any existing schedule is cancelled first, so repeated starts never
    /// produce duplicate ticks. `seq` and the session counters reset.
    pub fn start(&mut self, interval_ms: u64, now_ms: f64) {
        self.interval_ms = interval_ms.max(1) as f64;
        self.next_tick_at = Some(now_ms + self.interval_ms);
        self.seq = 0;
        self.sent_count = 0;
        self.skipped_ticks = 0;
        self.last_sent_at = None;
    }

    /// Cancel the schedule. Safe to call repeatedly and from any state.
    pub fn stop(&mut self) {
        self.next_tick_at = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_tick_at.is_some()
    }

    /// Fire every tick whose deadline `now_ms` has reached.
    ///
    /// Returns the number of messages transmitted by this call. Ticks that
    /// find the channel closed are skipped without consuming a `seq` value.
    pub fn poll(
        &mut self,
        now_ms: f64,
        wall: DateTime<Utc>,
        snapshot: &SensorState,
        channel: &mut dyn SendChannel,
    ) -> u64 {
        let mut sent = 0;
        while let Some(deadline) = self.next_tick_at {
            if now_ms < deadline {
                break;
            }

            if channel.is_open() {
                let sample = OutboundSample {
                    device_id: &self.device_id,
                    seq: self.seq,
                    timestamp: wall.timestamp_millis(),
                    sensors: snapshot,
                };
                match serde_json::to_vec(&sample) {
                    Ok(bytes) => {
                        channel.send(&bytes);
                        self.seq += 1;
                        self.sent_count += 1;
                        self.last_sent_at = Some(wall);
                        sent += 1;
                    }
                    Err(e) => warn!("failed to serialize outbound sample: {e}"),
                }
            } else {
                self.skipped_ticks += 1;
            }

            self.next_tick_at = Some(deadline + self.interval_ms);
        }
        sent
    }

    /// Next `seq` value to be transmitted.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Messages transmitted this session.
    pub fn sent_count(&self) -> u64 {
        self.sent_count
    }

    /// Ticks skipped because the channel was closed.
    pub fn skipped_ticks(&self) -> u64 {
        self.skipped_ticks
    }

    /// Wall-clock time of the most recent transmission.
    pub fn last_sent_at(&self) -> Option<DateTime<Utc>> {
        self.last_sent_at
    }
}
