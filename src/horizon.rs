//! Above/below horizon detection with hysteresis

use crate::types::HorizonState;

/// Default dead band half-width on the accelerometer vertical axis, in g
pub const DEFAULT_HORIZON_THRESHOLD: f32 = 0.1;

impl HorizonState {
    /// Next horizon state for a vertical acceleration reading
    ///
    /// The state only flips once the reading crosses the threshold on the
    /// opposite side. Readings inside `[-threshold, threshold]` never change
    /// the state, so jitter around the crossing point cannot toggle it.
    ///
    /// # Arguments
    /// * `vertical_acceleration` - Accelerometer z axis in g
    /// * `threshold` - Dead band half-width in g
    ///
    /// # Example
    /// ```
    /// use compass_hud::HorizonState;
    ///
    /// let state = HorizonState::Above.next(-0.15, 0.1);
    /// assert_eq!(state, HorizonState::Below);
    /// assert_eq!(state.next(0.05, 0.1), HorizonState::Below);
    /// ```
    pub fn next(self, vertical_acceleration: f32, threshold: f32) -> HorizonState {
        match self {
            HorizonState::Above if vertical_acceleration < -threshold => HorizonState::Below,
            HorizonState::Below if vertical_acceleration > threshold => HorizonState::Above,
            current => current,
        }
    }
}
