//! Orientation estimator for the compass HUD library

use nalgebra::Vector3;
use tracing::{debug, trace};

use crate::compass::calculate_heading;
use crate::math::{RAD_TO_DEG, ema, normalize_heading, wrap_correct};
use crate::types::{
    EstimatorSettings, HorizonState, OrientationSample, SmoothedOrientation, VERTICAL_PITCH,
};

/// Per-tick smoothing state
///
/// Holds the heading and pitch accumulators, the horizon side and the most
/// recent accelerometer vector. The estimator takes it by value and hands
/// back the updated copy, so no state is hidden inside the estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorState {
    /// Smoothed heading, kept in `[0, 360)`
    heading: f32,
    /// Smoothed pitch in degrees
    pitch: f32,
    horizon: HorizonState,
    /// Latest accelerometer reading, used for tilt compensation
    last_acceleration: Option<Vector3<f32>>,
    heading_initialised: bool,
    pitch_initialised: bool,
}

impl EstimatorState {
    /// Published heading and pitch
    pub fn orientation(&self) -> SmoothedOrientation {
        SmoothedOrientation {
            heading: normalize_heading(self.heading),
            pitch: self.pitch,
        }
    }

    pub fn horizon(&self) -> HorizonState {
        self.horizon
    }

    pub fn last_acceleration(&self) -> Option<Vector3<f32>> {
        self.last_acceleration
    }

    /// Whether any heading sample has been accepted yet
    pub fn has_heading(&self) -> bool {
        self.heading_initialised
    }

    fn apply_heading(&mut self, raw: f32, factor: f32, seed: bool) {
        if seed && !self.heading_initialised {
            self.heading = raw;
        } else {
            let corrected = wrap_correct(raw, self.heading);
            self.heading = normalize_heading(ema(self.heading, corrected, factor));
        }
        self.heading_initialised = true;
    }

    fn apply_pitch(&mut self, raw: f32, factor: f32, seed: bool) {
        if seed && !self.pitch_initialised {
            self.pitch = raw;
        } else {
            self.pitch = ema(self.pitch, raw, factor);
        }
        self.pitch_initialised = true;
    }
}

impl Default for EstimatorState {
    fn default() -> Self {
        Self {
            heading: 0.0,
            pitch: VERTICAL_PITCH,
            horizon: HorizonState::Above,
            last_acceleration: None,
            heading_initialised: false,
            pitch_initialised: false,
        }
    }
}

/// Orientation estimator
///
/// Turns accelerometer, magnetometer and device-motion samples into a smoothed
/// heading and pitch plus an above/below horizon flag. Heading and pitch are
/// passed through an exponential moving average; heading is wrap-corrected
/// first so the average never sweeps across the 0/360 seam.
///
/// # Example
/// ```
/// use compass_hud::{Estimator, EstimatorState, OrientationSample, Rotation};
///
/// let estimator = Estimator::new();
/// let mut state = EstimatorState::default();
///
/// let sample = OrientationSample::from_rotation(Rotation::new(0.1, 1.5));
/// state = estimator.update(state, &sample);
///
/// let orientation = state.orientation();
/// assert!((orientation.heading - 0.1f32.to_degrees()).abs() < 1e-3);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Estimator {
    settings: EstimatorSettings,
}

impl Estimator {
    /// Create an estimator with default settings
    pub fn new() -> Self {
        Self::with_settings(EstimatorSettings::default())
    }

    /// Create an estimator with the given settings
    ///
    /// Settings are used as-is; run them through
    /// [`EstimatorSettings::validate`] when they come from user input.
    pub fn with_settings(settings: EstimatorSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> EstimatorSettings {
        self.settings
    }

    /// Fold one sample into the state
    ///
    /// Each field present in the sample is applied independently:
    /// acceleration drives the horizon flag and is remembered for tilt
    /// compensation, the strategy's heading source updates the heading, and
    /// rotation beta updates the pitch. A sample with no usable field leaves
    /// the state untouched.
    ///
    /// # Arguments
    /// * `state` - Current smoothing state
    /// * `sample` - Incoming sensor sample
    ///
    /// # Returns
    /// The updated state
    pub fn update(&self, mut state: EstimatorState, sample: &OrientationSample) -> EstimatorState {
        let mut accepted = false;

        if let Some(acceleration) = sample.valid_acceleration() {
            let next = state
                .horizon
                .next(acceleration.z, self.settings.horizon_threshold);
            if next != state.horizon {
                debug!(z = acceleration.z, horizon = %next, "horizon state changed");
            }
            state.horizon = next;
            state.last_acceleration = Some(acceleration);
            accepted = true;
        }

        if let Some(heading) =
            calculate_heading(self.settings.strategy, sample, state.last_acceleration)
        {
            state.apply_heading(
                heading,
                self.settings.heading_smoothing,
                self.settings.seed_from_first_sample,
            );
            accepted = true;
        }

        if let Some(rotation) = sample.valid_rotation() {
            state.apply_pitch(
                rotation.beta * RAD_TO_DEG,
                self.settings.pitch_smoothing,
                self.settings.seed_from_first_sample,
            );
            accepted = true;
        }

        if !accepted {
            trace!(?sample, strategy = ?self.settings.strategy, "skipping sample");
        }

        state
    }

    /// Fold a sequence of samples into the state
    pub fn update_all<'a, I>(&self, state: EstimatorState, samples: I) -> EstimatorState
    where
        I: IntoIterator<Item = &'a OrientationSample>,
    {
        samples
            .into_iter()
            .fold(state, |state, sample| self.update(state, sample))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HeadingStrategy, Rotation};

    fn motion(heading_deg: f32, pitch_deg: f32) -> OrientationSample {
        OrientationSample::from_rotation(Rotation::new(
            heading_deg.to_radians(),
            pitch_deg.to_radians(),
        ))
    }

    fn unseeded() -> Estimator {
        Estimator::with_settings(EstimatorSettings {
            seed_from_first_sample: false,
            ..Default::default()
        })
    }

    #[test]
    fn test_initial_state() {
        let state = EstimatorState::default();
        assert_eq!(state.orientation(), SmoothedOrientation::default());
        assert_eq!(state.horizon(), HorizonState::Above);
        assert!(state.last_acceleration().is_none());
        assert!(!state.has_heading());
    }

    #[test]
    fn test_first_sample_seeds_heading_and_pitch() {
        let estimator = Estimator::new();
        let state = estimator.update(EstimatorState::default(), &motion(120.0, 70.0));

        let orientation = state.orientation();
        assert!((orientation.heading - 120.0).abs() < 1e-3);
        assert!((orientation.pitch - 70.0).abs() < 1e-3);
        assert!(state.has_heading());
    }

    #[test]
    fn test_unseeded_first_sample_blends_with_initial_values() {
        let estimator = unseeded();
        let state = estimator.update(EstimatorState::default(), &motion(10.0, 80.0));

        let orientation = state.orientation();
        assert!((orientation.heading - 2.0).abs() < 1e-3); // 0 * 0.8 + 10 * 0.2
        assert!((orientation.pitch - 88.0).abs() < 1e-3); // 90 * 0.8 + 80 * 0.2
    }

    #[test]
    fn test_heading_wrap_correction_across_north() {
        let estimator = Estimator::new();
        let state = estimator.update_all(
            EstimatorState::default(),
            &[motion(10.0, 90.0), motion(350.0, 90.0)],
        );

        // 10 + 0.2 * (-20)
        let heading = state.orientation().heading;
        assert!((heading - 6.0).abs() < 1e-3, "got {heading}");
    }

    #[test]
    fn test_heading_wrap_correction_clockwise() {
        let estimator = Estimator::new();
        let state = estimator.update_all(
            EstimatorState::default(),
            &[motion(350.0, 90.0), motion(5.0, 90.0)],
        );

        // 350 + 0.2 * 15 = 353
        let heading = state.orientation().heading;
        assert!((heading - 353.0).abs() < 1e-3, "got {heading}");
    }

    #[test]
    fn test_heading_tracks_many_full_turns() {
        let estimator = Estimator::new();
        let mut state = EstimatorState::default();

        // Rotate clockwise 10° per tick for five full turns
        for step in 0..180 {
            let raw = (step * 10 % 360) as f32;
            state = estimator.update(state, &motion(raw, 90.0));
        }

        // A ramp of 10°/tick settles 40° behind the raw heading (350°)
        let heading = state.orientation().heading;
        assert!((305.0..315.0).contains(&heading), "got {heading}");
    }

    #[test]
    fn test_pitch_steady_state_is_exact() {
        let estimator = Estimator::new();
        let samples = [motion(0.0, 90.0), motion(0.0, 90.0), motion(0.0, 90.0)];
        let state = estimator.update_all(EstimatorState::default(), &samples);
        let pitch = state.orientation().pitch;
        assert!((pitch - 90.0).abs() < 1e-4, "got {pitch}");
    }

    #[test]
    fn test_pitch_has_no_wrap_correction() {
        let estimator = Estimator::new();
        let state = estimator.update_all(
            EstimatorState::default(),
            &[motion(0.0, 170.0), motion(0.0, -170.0)],
        );
        // 170 + 0.2 * (-340)
        let pitch = state.orientation().pitch;
        assert!((pitch - 102.0).abs() < 1e-3, "got {pitch}");
    }

    #[test]
    fn test_independent_smoothing_factors() {
        let estimator = Estimator::with_settings(EstimatorSettings {
            heading_smoothing: 0.5,
            pitch_smoothing: 0.1,
            ..Default::default()
        });
        let state = estimator.update_all(
            EstimatorState::default(),
            &[motion(0.0, 90.0), motion(20.0, 100.0)],
        );
        let orientation = state.orientation();
        assert!((orientation.heading - 10.0).abs() < 1e-3);
        assert!((orientation.pitch - 91.0).abs() < 1e-3);
    }

    #[test]
    fn test_acceleration_drives_horizon() {
        let estimator = Estimator::new();
        let mut state = EstimatorState::default();

        let z = |value: f32| OrientationSample::from_acceleration(Vector3::new(0.0, 0.0, value));

        state = estimator.update(state, &z(-0.05));
        assert_eq!(state.horizon(), HorizonState::Above);
        state = estimator.update(state, &z(-0.15));
        assert_eq!(state.horizon(), HorizonState::Below);
        state = estimator.update(state, &z(0.05));
        assert_eq!(state.horizon(), HorizonState::Below);
        state = estimator.update(state, &z(0.2));
        assert_eq!(state.horizon(), HorizonState::Above);

        // Acceleration never moves heading or pitch
        assert_eq!(state.orientation(), SmoothedOrientation::default());
    }

    #[test]
    fn test_empty_and_malformed_samples_are_skipped() {
        let estimator = Estimator::new();
        let state = estimator.update(EstimatorState::default(), &motion(45.0, 80.0));

        let empty = OrientationSample::default();
        assert_eq!(estimator.update(state, &empty), state);

        let nan_rotation = OrientationSample::from_rotation(Rotation::new(f32::NAN, 1.0));
        assert_eq!(estimator.update(state, &nan_rotation), state);

        let nan_accel = OrientationSample::from_acceleration(Vector3::new(0.0, 0.0, f32::NAN));
        assert_eq!(estimator.update(state, &nan_accel), state);
    }

    #[test]
    fn test_magnetometer_ignored_by_rotation_strategy() {
        let estimator = Estimator::new();
        let state = EstimatorState::default();
        let mag = OrientationSample::from_magnetic_field(Vector3::new(0.0, 1.0, 0.0));
        assert_eq!(estimator.update(state, &mag), state);
    }

    #[test]
    fn test_tilt_compensated_strategy_uses_latest_acceleration() {
        let estimator = Estimator::with_settings(EstimatorSettings {
            strategy: HeadingStrategy::TiltCompensatedMagnetic,
            ..Default::default()
        });
        let mag = OrientationSample::from_magnetic_field(Vector3::new(0.0, 1.0, 0.0));

        // No accelerometer reading yet: magnetometer sample is skipped
        let state = estimator.update(EstimatorState::default(), &mag);
        assert!(!state.has_heading());

        let level = OrientationSample::from_acceleration(Vector3::new(0.0, 0.0, 1.0));
        let state = estimator.update_all(state, &[level, mag]);
        assert!(state.has_heading());
        assert!((state.orientation().heading - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_tilt_compensated_strategy_keeps_pitch_from_rotation() {
        let estimator = Estimator::with_settings(EstimatorSettings {
            strategy: HeadingStrategy::TiltCompensatedMagnetic,
            ..Default::default()
        });
        let state = estimator.update(EstimatorState::default(), &motion(200.0, 60.0));

        // Rotation alpha is not a heading source for this strategy
        assert!(!state.has_heading());
        assert!((state.orientation().pitch - 60.0).abs() < 1e-3);
    }

    #[test]
    fn test_unseeded_sequence_crossing_north() {
        let estimator = unseeded();
        let state = estimator.update_all(
            EstimatorState::default(),
            &[motion(10.0, 90.0), motion(350.0, 90.0)],
        );
        // 0 -> 2, then 2 + 0.2 * (-12) = -0.4 -> 359.6
        let heading = state.orientation().heading;
        assert!((heading - 359.6).abs() < 1e-3, "got {heading}");
    }
}
