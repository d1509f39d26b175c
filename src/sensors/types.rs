//! Canonical sensor channel types.
//!
//! Raw source events (see [`crate::sensors::raw`]) are normalized into the
//! closed set of channel readings defined here before anything downstream
//! sees them. Missing axis values are defaulted to 0.0 at normalization,
//! so every field in these types is always a concrete number.

use serde::{Deserialize, Serialize};

/// A three-axis vector reading (accelerometer, gyroscope, magnetometer, gravity).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Device orientation as Euler angles, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EulerAngles {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl EulerAngles {
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self { alpha, beta, gamma }
    }
}

/// Absolute orientation as a unit quaternion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotationReading {
    pub quaternion: [f64; 4],
}

/// The fixed set of sensor channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Accelerometer,
    Gyroscope,
    Orientation,
    Rotation,
    Magnetometer,
    Gravity,
}

impl Channel {
    /// All channels, in snapshot serialization order.
    pub const ALL: [Channel; 6] = [
        Channel::Accelerometer,
        Channel::Gyroscope,
        Channel::Orientation,
        Channel::Rotation,
        Channel::Magnetometer,
        Channel::Gravity,
    ];

    /// The channel's wire name.
    pub fn name(&self) -> &'static str {
        match self {
            Channel::Accelerometer => "accelerometer",
            Channel::Gyroscope => "gyroscope",
            Channel::Orientation => "orientation",
            Channel::Rotation => "rotation",
            Channel::Magnetometer => "magnetometer",
            Channel::Gravity => "gravity",
        }
    }
}

/// A normalized reading on one channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ChannelReading {
    Accel(Vec3),
    Gyro(Vec3),
    Orientation(EulerAngles),
    Rotation(RotationReading),
    Magnetometer(Vec3),
    Gravity(Vec3),
}

impl ChannelReading {
    /// The channel this reading belongs to.
    pub fn channel(&self) -> Channel {
        match self {
            ChannelReading::Accel(_) => Channel::Accelerometer,
            ChannelReading::Gyro(_) => Channel::Gyroscope,
            ChannelReading::Orientation(_) => Channel::Orientation,
            ChannelReading::Rotation(_) => Channel::Rotation,
            ChannelReading::Magnetometer(_) => Channel::Magnetometer,
            ChannelReading::Gravity(_) => Channel::Gravity,
        }
    }
}

/// Latest known reading per channel.
///
/// One slot per channel, `None` only until the first reading arrives.
/// Overwritten in place; no history is kept outside an active recording
/// window. Serializes to the wire `sensors` object with `null` for
/// channels that have not reported yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorState {
    pub accelerometer: Option<Vec3>,
    pub gyroscope: Option<Vec3>,
    pub orientation: Option<EulerAngles>,
    pub rotation: Option<RotationReading>,
    pub magnetometer: Option<Vec3>,
    pub gravity: Option<Vec3>,
}

impl SensorState {
    /// An all-null snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the slot for the reading's channel.
    pub fn apply(&mut self, reading: ChannelReading) {
        match reading {
            ChannelReading::Accel(v) => self.accelerometer = Some(v),
            ChannelReading::Gyro(v) => self.gyroscope = Some(v),
            ChannelReading::Orientation(a) => self.orientation = Some(a),
            ChannelReading::Rotation(r) => self.rotation = Some(r),
            ChannelReading::Magnetometer(v) => self.magnetometer = Some(v),
            ChannelReading::Gravity(v) => self.gravity = Some(v),
        }
    }

    /// Whether a channel has reported at least once.
    pub fn has_reading(&self, channel: Channel) -> bool {
        match channel {
            Channel::Accelerometer => self.accelerometer.is_some(),
            Channel::Gyroscope => self.gyroscope.is_some(),
            Channel::Orientation => self.orientation.is_some(),
            Channel::Rotation => self.rotation.is_some(),
            Channel::Magnetometer => self.magnetometer.is_some(),
            Channel::Gravity => self.gravity.is_some(),
        }
    }

    /// Whether no channel has reported yet.
    pub fn is_empty(&self) -> bool {
        Channel::ALL.iter().all(|c| !self.has_reading(*c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_starts_all_null() {
        let state = SensorState::new();
        assert!(state.is_empty());
        for channel in Channel::ALL {
            assert!(!state.has_reading(channel));
        }
    }

    #[test]
    fn test_apply_overwrites_in_place() {
        let mut state = SensorState::new();
        state.apply(ChannelReading::Accel(Vec3::new(1.0, 2.0, 3.0)));
        state.apply(ChannelReading::Accel(Vec3::new(4.0, 5.0, 6.0)));

        assert_eq!(state.accelerometer, Some(Vec3::new(4.0, 5.0, 6.0)));
        assert!(state.gyroscope.is_none());
    }

    #[test]
    fn test_snapshot_serializes_nulls() {
        let state = SensorState::new();
        let json = serde_json::to_value(&state).unwrap();

        for channel in Channel::ALL {
            assert_eq!(json[channel.name()], serde_json::Value::Null);
        }
    }

    #[test]
    fn test_snapshot_wire_shape() {
        let mut state = SensorState::new();
        state.apply(ChannelReading::Gyro(Vec3::new(0.1, 0.2, 0.3)));
        state.apply(ChannelReading::Rotation(RotationReading {
            quaternion: [0.0, 0.0, 0.0, 1.0],
        }));

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["gyroscope"]["x"], 0.1);
        assert_eq!(json["rotation"]["quaternion"][3], 1.0);
    }
}
