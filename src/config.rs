//! Overlay settings and their TOML representation
//!
//! ```toml
//! [estimator]
//! strategy = "tilt_compensated_magnetic"
//! heading_smoothing = 0.2
//! pitch_smoothing = 0.2
//! horizon_threshold = 0.1
//!
//! [field_of_view]
//! horizontal = 90.0
//! vertical = 55.0
//!
//! [sensors]
//! accelerometer_interval_ms = 100
//! magnetometer_interval_ms = 100
//! device_motion_interval_ms = 50
//!
//! [[waypoints]]
//! label = "N"
//! angle = 0.0
//! ```
//!
//! Every section and field is optional; missing values take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{HudError, Result};
use crate::math::FULL_TURN;
use crate::types::{
    EstimatorSettings, FieldOfView, SensorSettings, ViewportGeometry, Waypoint,
};

/// Complete overlay configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HudSettings {
    pub estimator: EstimatorSettings,
    pub field_of_view: FieldOfView,
    pub sensors: SensorSettings,
    /// Labels drawn on the overlay
    pub waypoints: Vec<Waypoint>,
}

impl Default for HudSettings {
    fn default() -> Self {
        Self {
            estimator: EstimatorSettings::default(),
            field_of_view: FieldOfView::default(),
            sensors: SensorSettings::default(),
            waypoints: Waypoint::cardinal_points(),
        }
    }
}

impl HudSettings {
    /// Parse and validate settings from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let settings: HudSettings = toml::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load settings from a TOML file
    ///
    /// A missing file yields the defaults; any other I/O error is returned.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!(?path, "No settings found, using defaults");
            return Ok(HudSettings::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let settings = Self::from_toml_str(&contents)?;
        info!(?path, "Loaded settings");
        Ok(settings)
    }

    /// Write settings to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_toml_string()?)?;
        info!(?path, "Saved settings");
        Ok(())
    }

    /// Check every section
    pub fn validate(&self) -> Result<()> {
        self.estimator.validate()?;
        self.field_of_view.validate()?;
        self.sensors.validate()?;
        for waypoint in &self.waypoints {
            waypoint.validate()?;
        }
        Ok(())
    }
}

impl EstimatorSettings {
    /// Smoothing factors must lie in `(0, 1]` and the horizon threshold
    /// must be a non-negative number
    pub fn validate(&self) -> Result<()> {
        check_smoothing("heading_smoothing", self.heading_smoothing)?;
        check_smoothing("pitch_smoothing", self.pitch_smoothing)?;
        if !(self.horizon_threshold.is_finite() && self.horizon_threshold >= 0.0) {
            return Err(HudError::invalid_config(format!(
                "horizon_threshold must be a non-negative number, got {}",
                self.horizon_threshold
            )));
        }
        Ok(())
    }
}

impl FieldOfView {
    /// Both angles must lie in `(0, 360)`
    pub fn validate(&self) -> Result<()> {
        check_angle_span("field_of_view.horizontal", self.horizontal)?;
        check_angle_span("field_of_view.vertical", self.vertical)
    }
}

impl SensorSettings {
    pub fn validate(&self) -> Result<()> {
        let intervals = [
            ("accelerometer_interval_ms", self.accelerometer_interval_ms),
            ("magnetometer_interval_ms", self.magnetometer_interval_ms),
            ("device_motion_interval_ms", self.device_motion_interval_ms),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return Err(HudError::invalid_config(format!("{name} must be non-zero")));
            }
        }
        Ok(())
    }
}

impl ViewportGeometry {
    /// Width must be positive and height non-negative, both finite
    pub fn validate(&self) -> Result<()> {
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(HudError::invalid_config(format!(
                "viewport width must be a positive number, got {}",
                self.width
            )));
        }
        if !(self.height.is_finite() && self.height >= 0.0) {
            return Err(HudError::invalid_config(format!(
                "viewport height must be a non-negative number, got {}",
                self.height
            )));
        }
        Ok(())
    }
}

impl Waypoint {
    pub fn validate(&self) -> Result<()> {
        if self.label.trim().is_empty() {
            return Err(HudError::invalid_config("waypoint label must not be empty"));
        }
        if !self.angle.is_finite() {
            return Err(HudError::invalid_config(format!(
                "waypoint '{}' has a non-finite angle",
                self.label
            )));
        }
        Ok(())
    }
}

fn check_smoothing(name: &str, value: f32) -> Result<()> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(HudError::invalid_config(format!(
            "{name} must be in (0, 1], got {value}"
        )))
    }
}

fn check_angle_span(name: &str, value: f32) -> Result<()> {
    if value > 0.0 && value < FULL_TURN {
        Ok(())
    } else {
        Err(HudError::invalid_config(format!(
            "{name} must be in (0, 360), got {value}"
        )))
    }
}
