//! Core types and conventions for the compass HUD library

use std::time::Duration;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::horizon::DEFAULT_HORIZON_THRESHOLD;

/// Heading computation strategy
///
/// Selected once at configuration time. Both strategies share the same
/// wrap correction and smoothing stage.
///
/// # Example
/// ```
/// use compass_hud::{EstimatorSettings, HeadingStrategy};
///
/// let settings = EstimatorSettings {
///     strategy: HeadingStrategy::TiltCompensatedMagnetic,
///     ..Default::default()
/// };
/// assert_eq!(settings.heading_smoothing, 0.2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingStrategy {
    /// Heading taken from the device-motion alpha angle
    #[default]
    RotationAngle,
    /// Heading derived from the magnetometer, rotated into the horizontal
    /// plane using roll and pitch from the latest accelerometer vector
    TiltCompensatedMagnetic,
}

/// Device rotation angles reported by the device-motion feed, in radians
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rotation {
    /// Rotation about the vertical axis (azimuth)
    pub alpha: f32,
    /// Front-to-back tilt
    pub beta: f32,
}

impl Rotation {
    pub fn new(alpha: f32, beta: f32) -> Self {
        Self { alpha, beta }
    }

    fn is_finite(&self) -> bool {
        self.alpha.is_finite() && self.beta.is_finite()
    }
}

/// A single sensor reading
///
/// Each feed fills only the field it measures. Samples are transient:
/// they are consumed by the estimator and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OrientationSample {
    /// Linear acceleration including gravity, in g
    pub acceleration: Option<Vector3<f32>>,
    /// Magnetic field, arbitrary units
    pub magnetic_field: Option<Vector3<f32>>,
    /// Device rotation angles
    pub rotation: Option<Rotation>,
}

impl OrientationSample {
    pub fn from_acceleration(acceleration: Vector3<f32>) -> Self {
        Self {
            acceleration: Some(acceleration),
            ..Default::default()
        }
    }

    pub fn from_magnetic_field(magnetic_field: Vector3<f32>) -> Self {
        Self {
            magnetic_field: Some(magnetic_field),
            ..Default::default()
        }
    }

    pub fn from_rotation(rotation: Rotation) -> Self {
        Self {
            rotation: Some(rotation),
            ..Default::default()
        }
    }

    /// Acceleration, if present and finite
    pub fn valid_acceleration(&self) -> Option<Vector3<f32>> {
        self.acceleration.filter(|a| a.iter().all(|v| v.is_finite()))
    }

    /// Magnetic field, if present and finite
    pub fn valid_magnetic_field(&self) -> Option<Vector3<f32>> {
        self.magnetic_field.filter(|m| m.iter().all(|v| v.is_finite()))
    }

    /// Rotation, if present and finite
    pub fn valid_rotation(&self) -> Option<Rotation> {
        self.rotation.filter(Rotation::is_finite)
    }
}

/// Smoothed heading and pitch published by the estimator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedOrientation {
    /// Compass bearing in degrees, `[0, 360)`, 0 = north
    pub heading: f32,
    /// Forward/backward tilt in degrees, 90 = held vertically
    pub pitch: f32,
}

impl Default for SmoothedOrientation {
    fn default() -> Self {
        Self {
            heading: 0.0,
            pitch: VERTICAL_PITCH,
        }
    }
}

/// Pitch reported when the device is held vertically
pub const VERTICAL_PITCH: f32 = 90.0;

/// Which side of the horizon the camera is looking at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HorizonState {
    #[default]
    Above,
    Below,
}

impl HorizonState {
    pub fn is_below(self) -> bool {
        self == HorizonState::Below
    }
}

impl core::fmt::Display for HorizonState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            HorizonState::Above => f.write_str("Above horizon"),
            HorizonState::Below => f.write_str("Below horizon"),
        }
    }
}

/// A labelled bearing drawn on the overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub label: String,
    /// Bearing in degrees, 0 = north
    pub angle: f32,
}

impl Waypoint {
    pub fn new(label: impl Into<String>, angle: f32) -> Self {
        Self {
            label: label.into(),
            angle,
        }
    }

    /// N, E, S and W at 0, 90, 180 and 270 degrees
    pub fn cardinal_points() -> Vec<Waypoint> {
        vec![
            Waypoint::new("N", 0.0),
            Waypoint::new("E", 90.0),
            Waypoint::new("S", 180.0),
            Waypoint::new("W", 270.0),
        ]
    }
}

/// Screen size in pixels, read once from the display
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportGeometry {
    pub width: f32,
    pub height: f32,
}

impl ViewportGeometry {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Visible angular window of the camera, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldOfView {
    /// Horizontal field of view (typical phone camera ~90°)
    pub horizontal: f32,
    /// Vertical field of view (portrait mode ~55°)
    pub vertical: f32,
}

impl Default for FieldOfView {
    fn default() -> Self {
        Self {
            horizontal: 90.0,
            vertical: 55.0,
        }
    }
}

/// Orientation estimator settings
///
/// # Example
/// ```
/// use compass_hud::{EstimatorSettings, HeadingStrategy};
///
/// let settings = EstimatorSettings {
///     heading_smoothing: 0.1,   // smoother, slower compass
///     pitch_smoothing: 0.3,     // snappier horizon
///     ..Default::default()
/// };
/// assert_eq!(settings.strategy, HeadingStrategy::RotationAngle);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorSettings {
    /// How heading is derived from raw samples
    pub strategy: HeadingStrategy,
    /// EMA factor for heading, in `(0, 1]`
    ///
    /// Lower values smooth more but respond more slowly.
    pub heading_smoothing: f32,
    /// EMA factor for pitch, in `(0, 1]`
    pub pitch_smoothing: f32,
    /// Dead band half-width on the accelerometer vertical axis, in g
    pub horizon_threshold: f32,
    /// Take the first heading and pitch samples as-is instead of blending
    /// them with the initial 0° heading and 90° pitch
    pub seed_from_first_sample: bool,
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        Self {
            strategy: HeadingStrategy::default(),
            heading_smoothing: 0.2,
            pitch_smoothing: 0.2,
            horizon_threshold: DEFAULT_HORIZON_THRESHOLD,
            seed_from_first_sample: true,
        }
    }
}

/// Update intervals requested from each sensor feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorSettings {
    pub accelerometer_interval_ms: u64,
    pub magnetometer_interval_ms: u64,
    pub device_motion_interval_ms: u64,
}

impl SensorSettings {
    pub fn accelerometer_interval(&self) -> Duration {
        Duration::from_millis(self.accelerometer_interval_ms)
    }

    pub fn magnetometer_interval(&self) -> Duration {
        Duration::from_millis(self.magnetometer_interval_ms)
    }

    pub fn device_motion_interval(&self) -> Duration {
        Duration::from_millis(self.device_motion_interval_ms)
    }
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            accelerometer_interval_ms: 100,
            magnetometer_interval_ms: 100,
            device_motion_interval_ms: 50,
        }
    }
}
