//! Live overlay session
//!
//! Binds the sensor feeds to an estimator for as long as the overlay is on
//! screen. Dropping the session (or calling [`OverlaySession::stop`]) releases
//! every subscription, after which no sample reaches the estimator.

use std::cell::RefCell;
use std::rc::Rc;

use nalgebra::Vector3;
use tracing::info;

use crate::config::HudSettings;
use crate::display::{CameraAccess, CameraPermission, DisplaySurface, View};
use crate::error::Result;
use crate::estimator::{Estimator, EstimatorState};
use crate::mapper::{OverlayFrame, ScreenMapper};
use crate::sensors::{DeviceMotion, SensorSuite, Subscription};
use crate::types::{
    HeadingStrategy, HorizonState, OrientationSample, SmoothedOrientation, ViewportGeometry,
    Waypoint,
};

/// A running overlay: estimator state fed by sensor subscriptions
///
/// # Example
/// ```
/// use std::time::Duration;
/// use compass_hud::{
///     CameraPermission, DeviceMotion, HudSettings, OverlaySession, Rotation, SensorSuite,
///     View, ViewportGeometry,
/// };
///
/// let sensors = SensorSuite::new();
/// let session = OverlaySession::start(
///     &HudSettings::default(),
///     ViewportGeometry::new(400.0, 800.0),
///     &sensors,
/// )?;
///
/// let motion = DeviceMotion { rotation: Some(Rotation::new(0.0, 90f32.to_radians())) };
/// sensors.device_motion.publish(Duration::ZERO, &motion);
///
/// match session.view(CameraPermission::Granted) {
///     View::Overlay(frame) => assert_eq!(frame.labels[0].label, "N"),
///     other => panic!("unexpected view {other:?}"),
/// }
/// # Ok::<(), compass_hud::HudError>(())
/// ```
pub struct OverlaySession {
    estimator: Estimator,
    state: Rc<RefCell<EstimatorState>>,
    mapper: ScreenMapper,
    waypoints: Vec<Waypoint>,
    subscriptions: Vec<Subscription>,
}

impl OverlaySession {
    /// Validate `settings` and `viewport`, configure the feeds and start listening
    ///
    /// The accelerometer and device-motion feeds are always subscribed; the
    /// magnetometer only when the heading comes from it.
    pub fn start(
        settings: &HudSettings,
        viewport: ViewportGeometry,
        sensors: &SensorSuite,
    ) -> Result<Self> {
        settings.validate()?;
        viewport.validate()?;
        sensors.configure(&settings.sensors)?;

        let estimator = Estimator::with_settings(settings.estimator);
        let state = Rc::new(RefCell::new(EstimatorState::default()));

        let mut subscriptions = vec![
            sensors
                .accelerometer
                .add_listener(route(estimator, &state, |acceleration: &Vector3<f32>| {
                    OrientationSample::from_acceleration(*acceleration)
                })),
            sensors
                .device_motion
                .add_listener(route(estimator, &state, |motion: &DeviceMotion| {
                    OrientationSample::from(*motion)
                })),
        ];
        if settings.estimator.strategy == HeadingStrategy::TiltCompensatedMagnetic {
            subscriptions.push(sensors.magnetometer.add_listener(route(
                estimator,
                &state,
                |field: &Vector3<f32>| OrientationSample::from_magnetic_field(*field),
            )));
        }

        info!(
            strategy = ?settings.estimator.strategy,
            subscriptions = subscriptions.len(),
            width = viewport.width,
            height = viewport.height,
            "overlay session started"
        );

        Ok(Self {
            estimator,
            state,
            mapper: ScreenMapper::new(viewport, settings.field_of_view),
            waypoints: settings.waypoints.clone(),
            subscriptions,
        })
    }

    pub fn estimator(&self) -> Estimator {
        self.estimator
    }

    /// Snapshot of the current estimator state
    pub fn state(&self) -> EstimatorState {
        *self.state.borrow()
    }

    pub fn orientation(&self) -> SmoothedOrientation {
        self.state().orientation()
    }

    pub fn horizon(&self) -> HorizonState {
        self.state().horizon()
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn mapper(&self) -> ScreenMapper {
        self.mapper
    }

    /// Overlay geometry for the current state
    pub fn frame(&self) -> OverlayFrame {
        let state = self.state();
        self.mapper
            .map(state.orientation(), state.horizon(), &self.waypoints)
    }

    /// View to present for a camera permission state
    pub fn view(&self, permission: CameraPermission) -> View {
        View::select(permission, || self.frame())
    }

    /// Present the current view on `surface`
    pub fn render<C, S>(&self, camera: &C, surface: &mut S)
    where
        C: CameraAccess + ?Sized,
        S: DisplaySurface + ?Sized,
    {
        surface.present(&self.view(camera.permission()));
    }

    /// Action behind the permission prompt
    pub fn request_camera_permission<C>(&self, camera: &mut C)
    where
        C: CameraAccess + ?Sized,
    {
        info!(permission = ?camera.permission(), "requesting camera permission");
        camera.request_permission();
    }

    /// Number of feeds this session listens to
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Release every subscription
    pub fn stop(self) {
        info!(subscriptions = self.subscriptions.len(), "overlay session stopped");
        drop(self);
    }
}

/// Listener that converts a feed reading into a sample and folds it into `state`
fn route<T, F>(
    estimator: Estimator,
    state: &Rc<RefCell<EstimatorState>>,
    to_sample: F,
) -> impl FnMut(&T) + 'static
where
    T: 'static,
    F: Fn(&T) -> OrientationSample + 'static,
{
    let state = Rc::clone(state);
    move |reading: &T| {
        let sample = to_sample(reading);
        state.replace_with(|current| estimator.update(*current, &sample));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EstimatorSettings, Rotation};
    use std::time::Duration;

    fn viewport() -> ViewportGeometry {
        ViewportGeometry::new(400.0, 800.0)
    }

    fn motion(heading_deg: f32, pitch_deg: f32) -> DeviceMotion {
        DeviceMotion {
            rotation: Some(Rotation::new(heading_deg.to_radians(), pitch_deg.to_radians())),
        }
    }

    fn magnetic_settings() -> HudSettings {
        HudSettings {
            estimator: EstimatorSettings {
                strategy: HeadingStrategy::TiltCompensatedMagnetic,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_rotation_strategy_subscribes_two_feeds() {
        let sensors = SensorSuite::new();
        let session = OverlaySession::start(&HudSettings::default(), viewport(), &sensors).unwrap();
        assert_eq!(session.subscription_count(), 2);
        assert_eq!(sensors.accelerometer.listener_count(), 1);
        assert_eq!(sensors.device_motion.listener_count(), 1);
        assert_eq!(sensors.magnetometer.listener_count(), 0);
    }

    #[test]
    fn test_magnetic_strategy_subscribes_three_feeds() {
        let sensors = SensorSuite::new();
        let session = OverlaySession::start(&magnetic_settings(), viewport(), &sensors).unwrap();
        assert_eq!(session.subscription_count(), 3);
        assert_eq!(sensors.magnetometer.listener_count(), 1);
    }

    #[test]
    fn test_feeds_drive_estimator() {
        let sensors = SensorSuite::new();
        let session = OverlaySession::start(&HudSettings::default(), viewport(), &sensors).unwrap();

        sensors.device_motion.publish(Duration::ZERO, &motion(30.0, 95.0));
        sensors
            .accelerometer
            .publish(Duration::ZERO, &Vector3::new(0.0, 0.0, -0.5));

        let orientation = session.orientation();
        assert!((orientation.heading - 30.0).abs() < 1e-3);
        assert!((orientation.pitch - 95.0).abs() < 1e-3);
        assert_eq!(session.horizon(), HorizonState::Below);
    }

    #[test]
    fn test_magnetic_session_uses_accelerometer_for_tilt() {
        let sensors = SensorSuite::new();
        let session = OverlaySession::start(&magnetic_settings(), viewport(), &sensors).unwrap();

        // Magnetometer before any accelerometer reading is skipped
        sensors
            .magnetometer
            .publish(Duration::ZERO, &Vector3::new(0.0, 1.0, 0.0));
        assert!(!session.state().has_heading());

        sensors
            .accelerometer
            .publish(Duration::ZERO, &Vector3::new(0.0, 0.0, 1.0));
        sensors
            .magnetometer
            .publish(Duration::from_millis(100), &Vector3::new(0.0, 1.0, 0.0));
        assert!((session.orientation().heading - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_stop_releases_subscriptions() {
        let sensors = SensorSuite::new();
        let session = OverlaySession::start(&magnetic_settings(), viewport(), &sensors).unwrap();
        let state = Rc::clone(&session.state);
        session.stop();

        assert_eq!(sensors.accelerometer.listener_count(), 0);
        assert_eq!(sensors.magnetometer.listener_count(), 0);
        assert_eq!(sensors.device_motion.listener_count(), 0);

        sensors.device_motion.publish(Duration::ZERO, &motion(30.0, 95.0));
        assert_eq!(*state.borrow(), EstimatorState::default());
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let sensors = SensorSuite::new();
        let mut settings = HudSettings::default();
        settings.estimator.heading_smoothing = 0.0;
        assert!(OverlaySession::start(&settings, viewport(), &sensors).is_err());
        assert_eq!(sensors.device_motion.listener_count(), 0);
    }

    #[test]
    fn test_invalid_viewport_is_rejected() {
        let sensors = SensorSuite::new();
        for viewport in [
            ViewportGeometry::new(400.0, -800.0),
            ViewportGeometry::new(400.0, f32::NAN),
            ViewportGeometry::new(0.0, 800.0),
            ViewportGeometry::new(f32::INFINITY, 800.0),
        ] {
            let result = OverlaySession::start(&HudSettings::default(), viewport, &sensors);
            assert!(result.is_err(), "{viewport:?} should be rejected");
        }
        assert_eq!(sensors.device_motion.listener_count(), 0);

        // Zero height before layout is accepted and maps without panicking
        let session = OverlaySession::start(
            &HudSettings::default(),
            ViewportGeometry::new(400.0, 0.0),
            &sensors,
        )
        .unwrap();
        assert_eq!(session.frame().horizon_offset, 0.0);
    }

    #[test]
    fn test_start_applies_sensor_intervals() {
        let sensors = SensorSuite::new();
        let mut settings = HudSettings::default();
        settings.sensors.device_motion_interval_ms = 20;
        let _session = OverlaySession::start(&settings, viewport(), &sensors).unwrap();
        assert_eq!(
            sensors.device_motion.update_interval(),
            Duration::from_millis(20)
        );
    }

    struct FakeCamera {
        permission: CameraPermission,
        requests: usize,
    }

    impl CameraAccess for FakeCamera {
        fn permission(&self) -> CameraPermission {
            self.permission
        }

        fn request_permission(&mut self) {
            self.requests += 1;
            self.permission = CameraPermission::Granted;
        }
    }

    #[derive(Default)]
    struct RecordingSurface {
        views: Vec<View>,
    }

    impl DisplaySurface for RecordingSurface {
        fn present(&mut self, view: &View) {
            self.views.push(view.clone());
        }
    }

    #[test]
    fn test_render_follows_permission() {
        let sensors = SensorSuite::new();
        let session = OverlaySession::start(&HudSettings::default(), viewport(), &sensors).unwrap();
        let mut camera = FakeCamera {
            permission: CameraPermission::Unknown,
            requests: 0,
        };
        let mut surface = RecordingSurface::default();

        session.render(&camera, &mut surface);
        camera.permission = CameraPermission::Denied;
        session.render(&camera, &mut surface);
        session.request_camera_permission(&mut camera);
        session.render(&camera, &mut surface);

        assert_eq!(camera.requests, 1);
        assert_eq!(surface.views[0], View::Empty);
        assert!(matches!(surface.views[1], View::PermissionPrompt(_)));
        assert_eq!(surface.views[2], View::Overlay(session.frame()));
    }
}
