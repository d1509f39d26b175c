//! Raw source event shapes and their normalization into channel readings.
//!
//! Sources deliver readings in two families of shapes: device-motion style
//! events (acceleration vectors plus a rotation rate in alpha/beta/gamma)
//! and generic-sensor style readings already expressed on x/y/z axes. The
//! adapters here collapse both onto the canonical [`ChannelReading`] set.
//!
//! Axis-mapping policy: rotation-rate (alpha, beta, gamma) maps onto the
//! gyroscope's (x, y, z) in that order, and acceleration uses the
//! gravity-including vector only when the gravity-excluded one is absent.
//! Absent fields become 0.0; normalization never fails.

use crate::sensors::types::{ChannelReading, EulerAngles, RotationReading, Vec3};
use serde::{Deserialize, Serialize};

/// A possibly-incomplete three-axis vector as delivered by a motion source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAxes {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

impl RawAxes {
    fn to_vec3(self) -> Vec3 {
        Vec3::new(
            self.x.unwrap_or(0.0),
            self.y.unwrap_or(0.0),
            self.z.unwrap_or(0.0),
        )
    }
}

/// A possibly-incomplete rotation rate in Euler-angle axes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRotationRate {
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub gamma: Option<f64>,
}

/// A device-motion style event: acceleration plus rotation rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionEvent {
    /// Acceleration with gravity excluded, when the device provides it.
    pub acceleration: Option<RawAxes>,
    /// Acceleration with gravity included; fallback only.
    pub acceleration_including_gravity: Option<RawAxes>,
    /// Rotation rate in alpha/beta/gamma.
    pub rotation_rate: Option<RawRotationRate>,
}

impl MotionEvent {
    /// Acceleration vector, preferring the gravity-excluded reading.
    pub fn accel_vector(&self) -> Vec3 {
        self.acceleration
            .or(self.acceleration_including_gravity)
            .map(RawAxes::to_vec3)
            .unwrap_or(Vec3::ZERO)
    }

    /// Rotation rate remapped onto gyroscope x/y/z.
    pub fn gyro_vector(&self) -> Vec3 {
        let rate = self.rotation_rate.unwrap_or_default();
        Vec3::new(
            rate.alpha.unwrap_or(0.0),
            rate.beta.unwrap_or(0.0),
            rate.gamma.unwrap_or(0.0),
        )
    }
}

/// A device-orientation style event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OrientationEvent {
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub gamma: Option<f64>,
}

impl OrientationEvent {
    pub fn angles(&self) -> EulerAngles {
        EulerAngles::new(
            self.alpha.unwrap_or(0.0),
            self.beta.unwrap_or(0.0),
            self.gamma.unwrap_or(0.0),
        )
    }
}

/// A raw reading from any source, before normalization.
///
/// Generic-sensor variants carry complete x/y/z vectors and are not
/// remapped; motion and orientation events go through the adapters above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceEvent {
    Motion(MotionEvent),
    Orientation(OrientationEvent),
    Accelerometer(Vec3),
    Gyroscope(Vec3),
    Magnetometer(Vec3),
    Gravity(Vec3),
    Rotation { quaternion: [f64; 4] },
}

impl SourceEvent {
    /// Normalize into channel readings, appending to `out`.
    ///
    /// A motion event yields both an accelerometer and a gyroscope reading
    /// (zero vectors when the source omitted them); every other event yields
    /// exactly one reading for its channel.
    pub fn normalize_into(&self, out: &mut Vec<ChannelReading>) {
        match self {
            SourceEvent::Motion(m) => {
                out.push(ChannelReading::Accel(m.accel_vector()));
                out.push(ChannelReading::Gyro(m.gyro_vector()));
            }
            SourceEvent::Orientation(o) => {
                out.push(ChannelReading::Orientation(o.angles()));
            }
            SourceEvent::Accelerometer(v) => out.push(ChannelReading::Accel(*v)),
            SourceEvent::Gyroscope(v) => out.push(ChannelReading::Gyro(*v)),
            SourceEvent::Magnetometer(v) => out.push(ChannelReading::Magnetometer(*v)),
            SourceEvent::Gravity(v) => out.push(ChannelReading::Gravity(*v)),
            SourceEvent::Rotation { quaternion } => {
                out.push(ChannelReading::Rotation(RotationReading {
                    quaternion: *quaternion,
                }));
            }
        }
    }
}
