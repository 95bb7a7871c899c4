//! Angle utilities shared by the estimator and the screen mapper

/// Mathematical constants
pub const DEG_TO_RAD: f32 = core::f32::consts::PI / 180.0;
pub const RAD_TO_DEG: f32 = 180.0 / core::f32::consts::PI;

/// Full turn in degrees
pub const FULL_TURN: f32 = 360.0;
/// Half turn in degrees
pub const HALF_TURN: f32 = 180.0;

/// Normalize an angle in degrees into `[0, 360)`
///
/// Equivalent to `((h mod 360) + 360) mod 360` for any finite input.
///
/// # Example
/// ```
/// use compass_hud::normalize_heading;
///
/// assert_eq!(normalize_heading(-10.0), 350.0);
/// assert_eq!(normalize_heading(725.0), 5.0);
/// ```
pub fn normalize_heading(heading: f32) -> f32 {
    let wrapped = heading.rem_euclid(FULL_TURN);
    // rem_euclid rounds tiny negative inputs up to exactly 360
    if wrapped >= FULL_TURN { 0.0 } else { wrapped }
}

/// Move `new` by a full turn when it lies more than half a turn from `previous`
///
/// The returned value differs from `previous` by the shortest signed delta,
/// provided both inputs are within one turn of each other. Feeding it to a
/// moving average keeps the average from sweeping across the 0/360 seam.
///
/// # Example
/// ```
/// use compass_hud::wrap_correct;
///
/// // 350 -> 5 is a 15 degree clockwise step, not 345 degrees back
/// assert_eq!(wrap_correct(5.0, 350.0), 365.0);
/// assert_eq!(wrap_correct(350.0, 10.0), -10.0);
/// ```
pub fn wrap_correct(new: f32, previous: f32) -> f32 {
    if (new - previous).abs() > HALF_TURN {
        if new < previous {
            new + FULL_TURN
        } else {
            new - FULL_TURN
        }
    } else {
        new
    }
}

/// Signed offset of `target` relative to `reference`, in `[-180, 180)`
pub fn signed_offset(target: f32, reference: f32) -> f32 {
    normalize_heading(target - reference + HALF_TURN) - HALF_TURN
}

/// One exponential moving average step
///
/// Evaluated as `current + factor * (sample - current)`, which equals
/// `current * (1 - factor) + sample * factor` and returns `current` exactly
/// when the sample matches it.
#[inline]
pub fn ema(current: f32, sample: f32, factor: f32) -> f32 {
    current + factor * (sample - current)
}
