//! [![github]](https://github.com/wboayue/compass-hud)&ensp;[![crates-io]](https://crates.io/crates/compass-hud)&ensp;[![license]](https://opensource.org/licenses/MIT)
//!
//! [github]: https://img.shields.io/badge/github-8da0cb?style=for-the-badge&labelColor=555555&logo=github
//! [crates-io]: https://img.shields.io/badge/crates.io-fc8d62?style=for-the-badge&labelColor=555555&logo=rust
//! [license]: https://img.shields.io/badge/License-MIT-blue.svg?style=for-the-badge&labelColor=555555
//!
//! Compass HUD - orientation estimation and screen mapping for camera overlays
//!
//! This library drives a heads-up display drawn over a live phone camera feed:
//! a horizon line that follows the device tilt and compass labels that slide
//! across the screen as the device turns. Accelerometer, magnetometer and
//! device-motion samples are fused into a smoothed heading and pitch, which are
//! then projected into pixel offsets within the camera's field of view.
//!
//! # Features
//!
//! - Heading from device-motion rotation or from a tilt-compensated magnetometer
//! - Exponential smoothing with wrap correction across north
//! - Above/below horizon detection with hysteresis
//! - Field-of-view projection of waypoints and the horizon line
//! - Cancellable sensor subscriptions and TOML configuration
//!
//! # Quick Start
//!
//! ```rust
//! use compass_hud::{
//!     Estimator, EstimatorState, FieldOfView, OrientationSample, Rotation, ScreenMapper,
//!     ViewportGeometry, Waypoint,
//! };
//!
//! let estimator = Estimator::new();
//! let mut state = EstimatorState::default();
//!
//! // Device-motion reading: facing 10° east of north, held upright
//! let sample = OrientationSample::from_rotation(Rotation::new(
//!     10f32.to_radians(),
//!     90f32.to_radians(),
//! ));
//! state = estimator.update(state, &sample);
//!
//! // Project onto a 400x800 screen
//! let mapper = ScreenMapper::new(ViewportGeometry::new(400.0, 800.0), FieldOfView::default());
//! let frame = mapper.map(state.orientation(), state.horizon(), &Waypoint::cardinal_points());
//!
//! assert_eq!(frame.labels[0].label, "N");
//! assert!(frame.labels[0].offset_x < 0.0); // north is slightly to the left
//! ```
//!
//! For more documentation and examples, see: <https://github.com/wboayue/compass-hud>

pub mod compass;
pub mod config;
pub mod display;
mod error;
mod estimator;
mod horizon;
mod mapper;
mod math;
pub mod sensors;
pub mod session;
mod types;

// Re-export all public types and functions
pub use compass::calculate_heading;
pub use config::HudSettings;
pub use display::{CameraAccess, CameraPermission, DisplaySurface, PermissionPrompt, View};
pub use error::{HudError, Result};
pub use estimator::{Estimator, EstimatorState};
pub use horizon::DEFAULT_HORIZON_THRESHOLD;
pub use mapper::{LabelPlacement, OverlayFrame, ScreenMapper};
pub use math::{DEG_TO_RAD, RAD_TO_DEG, ema, normalize_heading, signed_offset, wrap_correct};
pub use sensors::{DeviceMotion, SensorFeed, SensorSuite, Subscription};
pub use session::OverlaySession;
pub use types::*;
