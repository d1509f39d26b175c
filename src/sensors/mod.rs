//! Sensor channel model: raw source event shapes and their canonical forms.

pub mod raw;
pub mod types;

// Re-export commonly used types
pub use raw::{MotionEvent, OrientationEvent, RawAxes, RawRotationRate, SourceEvent};
pub use types::{Channel, ChannelReading, EulerAngles, RotationReading, SensorState, Vec3};
