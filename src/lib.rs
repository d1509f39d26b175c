//! Mocap Stream Agent - motion-sensor streaming and window recording.
//!
//! This library reconciles multiple asynchronous sensor sources into a
//! single consistent snapshot, streams that snapshot to a remote endpoint on
//! a fixed interval, and can record fixed-duration labeled windows of the
//! raw samples into a CSV dataset for later export.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Mocap Stream Agent                       │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌──────────────┐   ┌─────────────┐       │
//! │  │   Sources   │──▶│  Ingest Hub  │──▶│ SensorState │       │
//! │  │ (synthetic, │   │ (normalize,  │   │  (latest    │       │
//! │  │   replay)   │   │  fan out)    │   │  snapshot)  │       │
//! │  └─────────────┘   └──────┬───────┘   └──────┬──────┘       │
//! │                           │                  │               │
//! │                           ▼                  ▼               │
//! │                    ┌─────────────┐    ┌─────────────┐       │
//! │                    │   Window    │    │  Periodic   │──▶ tcp│
//! │                    │  Recorder   │    │   Sender    │       │
//! │                    └──────┬──────┘    └─────────────┘       │
//! │                           ▼                                  │
//! │                    ┌─────────────┐                           │
//! │                    │   Dataset   │──▶ CSV export / upload    │
//! │                    └─────────────┘                           │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Delivery is best-effort by design: the sender samples the latest state
//! rather than queuing every reading, and ticks that find the transport
//! closed are skipped silently.
//!
//! # Example
//!
//! ```
//! use mocap_stream_agent::{hub::SampleIngestHub, sensors::SourceEvent, sensors::Vec3};
//! use chrono::Utc;
//!
//! let mut hub = SampleIngestHub::new("device-1");
//! hub.start_window("move_1", 1000.0, 0.0);
//! hub.ingest(&SourceEvent::Accelerometer(Vec3::new(1.0, 2.0, 3.0)), 200.0);
//! hub.poll(1000.0, Utc::now());
//! assert_eq!(hub.dataset().row_count(), 1);
//! ```

pub mod config;
pub mod dataset;
pub mod hub;
pub mod recorder;
pub mod sender;
pub mod sensors;
pub mod sources;
pub mod stats;
pub mod transport;

#[cfg(feature = "upload")]
pub mod uploader;

// Re-export key types at crate root for convenience
pub use config::{generate_device_id, Config, ConfigError};
pub use dataset::{Dataset, DatasetRow};
pub use hub::SampleIngestHub;
pub use recorder::WindowRecorder;
pub use sender::{OutboundSample, PeriodicSender, SendChannel};
pub use sensors::{Channel, ChannelReading, SensorState, SourceEvent};
pub use sources::{ReplaySource, SourceError, SyntheticSource};
pub use stats::{create_shared_stats, SessionStats, SharedSessionStats};
pub use transport::{TcpSendChannel, TransportError};

// Upload re-exports (when enabled)
#[cfg(feature = "upload")]
pub use uploader::{BlockingDatasetUploader, DatasetUploader, UploadError, UploadResponse};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
