//! Heading computation for the compass HUD library
//!
//! Two interchangeable strategies turn raw samples into an unsmoothed
//! heading in `[0, 360)`. Smoothing happens later in the estimator.

use nalgebra::Vector3;

use crate::math::{RAD_TO_DEG, normalize_heading};
use crate::types::{HeadingStrategy, OrientationSample, Rotation};

/// Heading from the device-motion alpha angle
///
/// # Arguments
/// * `rotation` - Device rotation angles in radians
///
/// # Returns
/// Heading in degrees, `[0, 360)`
///
/// # Example
/// ```
/// use compass_hud::{Rotation, compass::rotation_heading};
///
/// let heading = rotation_heading(Rotation::new(-core::f32::consts::FRAC_PI_2, 0.0));
/// assert!((heading - 270.0).abs() < 1e-3);
/// ```
pub fn rotation_heading(rotation: Rotation) -> f32 {
    normalize_heading(rotation.alpha * RAD_TO_DEG)
}

/// Tilt-compensated magnetic heading
///
/// Derives roll and pitch from the accelerometer (gravity) vector, rotates
/// the magnetometer vector into the horizontal plane and takes the bearing
/// of the result.
///
/// # Arguments
/// * `accelerometer` - Latest accelerometer reading in g
/// * `magnetometer` - Magnetometer reading, any units
///
/// # Returns
/// Heading in degrees, `[0, 360)`
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use compass_hud::compass::tilt_compensated_heading;
///
/// let level = Vector3::new(0.0, 0.0, 1.0);
/// let heading = tilt_compensated_heading(level, Vector3::new(0.0, 1.0, 0.0));
/// assert!((heading - 90.0).abs() < 1e-3);
/// ```
pub fn tilt_compensated_heading(accelerometer: Vector3<f32>, magnetometer: Vector3<f32>) -> f32 {
    let (ax, ay, az) = (accelerometer.x, accelerometer.y, accelerometer.z);
    let (mx, my, mz) = (magnetometer.x, magnetometer.y, magnetometer.z);

    let roll = ay.atan2(az);
    let pitch = (-ax).atan2((ay * ay + az * az).sqrt());

    let (sin_roll, cos_roll) = roll.sin_cos();
    let (sin_pitch, cos_pitch) = pitch.sin_cos();

    // Magnetometer projected onto the horizontal plane
    let xh = mx * cos_pitch + mz * sin_pitch;
    let yh = mx * sin_roll * sin_pitch + my * cos_roll - mz * sin_roll * cos_pitch;

    normalize_heading(yh.atan2(xh) * RAD_TO_DEG)
}

/// Calculate a raw heading for the given strategy
///
/// Returns `None` when the sample does not carry what the strategy needs:
/// a rotation for [`HeadingStrategy::RotationAngle`], or a magnetometer
/// reading plus a previously received accelerometer vector for
/// [`HeadingStrategy::TiltCompensatedMagnetic`].
///
/// # Arguments
/// * `strategy` - Heading strategy selected at configuration time
/// * `sample` - Incoming sensor sample
/// * `last_acceleration` - Most recent accelerometer vector, possibly from an earlier tick
pub fn calculate_heading(
    strategy: HeadingStrategy,
    sample: &OrientationSample,
    last_acceleration: Option<Vector3<f32>>,
) -> Option<f32> {
    match strategy {
        HeadingStrategy::RotationAngle => sample.valid_rotation().map(rotation_heading),
        HeadingStrategy::TiltCompensatedMagnetic => {
            let magnetometer = sample.valid_magnetic_field()?;
            let accelerometer = last_acceleration?;
            Some(tilt_compensated_heading(accelerometer, magnetometer))
        }
    }
}
