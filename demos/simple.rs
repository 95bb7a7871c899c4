use std::time::Duration;

use compass_hud::{
    CameraAccess, CameraPermission, DeviceMotion, DisplaySurface, HudSettings, OverlaySession,
    Rotation, SensorSuite, View, ViewportGeometry,
};
use nalgebra::Vector3;

const SAMPLE_PERIOD: Duration = Duration::from_millis(50); // 20 Hz device motion

struct AlwaysGranted;

impl CameraAccess for AlwaysGranted {
    fn permission(&self) -> CameraPermission {
        CameraPermission::Granted
    }

    fn request_permission(&mut self) {}
}

/// Prints each frame instead of drawing it
struct Console;

impl DisplaySurface for Console {
    fn present(&mut self, view: &View) {
        match view {
            View::Empty => println!("(waiting for camera)"),
            View::PermissionPrompt(prompt) => println!("{}", prompt.message),
            View::Overlay(frame) => {
                let labels: Vec<String> = frame
                    .labels
                    .iter()
                    .map(|l| format!("{}@{:+.0}px", l.label, l.offset_x))
                    .collect();
                println!(
                    "{} | horizon {:+.0}px | {}",
                    frame.status_line(),
                    frame.horizon_offset,
                    labels.join(" ")
                );
            }
        }
    }
}

fn main() -> compass_hud::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let sensors = SensorSuite::new();
    let session = OverlaySession::start(
        &HudSettings::default(),
        ViewportGeometry::new(400.0, 800.0),
        &sensors,
    )?;

    for i in 0..20u32 {
        // this loop should run each time the platform delivers a reading
        let timestamp = SAMPLE_PERIOD * i;
        let heading = (350.0 + 2.0 * i as f32).to_radians(); // replace with device alpha
        let pitch = (90.0 + 0.5 * i as f32).to_radians(); // replace with device beta
        let accelerometer = Vector3::new(0.0, 0.98, -0.01 * i as f32); // replace with accelerometer data in g

        sensors.accelerometer.publish(timestamp, &accelerometer);
        sensors.device_motion.publish(
            timestamp,
            &DeviceMotion {
                rotation: Some(Rotation::new(heading, pitch)),
            },
        );

        session.render(&AlwaysGranted, &mut Console);
    }

    session.stop();
    Ok(())
}
