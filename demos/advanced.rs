//! Advanced compass HUD demonstration
//!
//! Replays a recorded sensor log through both heading strategies and plots
//! the raw readings against the smoothed output.
//!
//! Features demonstrated:
//! - Loading settings from a TOML file
//! - Tilt-compensated magnetometer heading
//! - Sensor feeds throttled to their configured intervals
//! - Horizon state and screen offsets over time
//!
//! Run with: `cargo run --example advanced [settings.toml]`

use std::error::Error;
use std::time::Duration;

use compass_hud::{
    DeviceMotion, HeadingStrategy, HudSettings, OverlayFrame, OverlaySession, Rotation,
    SensorSuite, ViewportGeometry, signed_offset,
};
use nalgebra::Vector3;
use plotters::prelude::*;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
struct SensorData {
    #[serde(rename = "Time (ms)")]
    time_ms: u64,
    #[serde(rename = "Accelerometer X (g)")]
    accel_x: f32,
    #[serde(rename = "Accelerometer Y (g)")]
    accel_y: f32,
    #[serde(rename = "Accelerometer Z (g)")]
    accel_z: f32,
    #[serde(rename = "Magnetometer X (uT)")]
    mag_x: f32,
    #[serde(rename = "Magnetometer Y (uT)")]
    mag_y: f32,
    #[serde(rename = "Magnetometer Z (uT)")]
    mag_z: f32,
    #[serde(rename = "Alpha (rad)")]
    alpha: f32,
    #[serde(rename = "Beta (rad)")]
    beta: f32,
}

impl SensorData {
    fn time(&self) -> f32 {
        self.time_ms as f32 / 1000.0
    }
}

/// Output of one replay, one entry per log row
struct Trace {
    strategy: HeadingStrategy,
    frames: Vec<OverlayFrame>,
}

const PLOT_PATH: &str = "testdata/hud_plots.png";

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let settings = match std::env::args().nth(1) {
        Some(path) => HudSettings::load(path)?,
        None => HudSettings::default(),
    };

    let mut reader = csv::Reader::from_path("testdata/sensor_log.csv")?;
    let mut sensor_data = Vec::new();
    for result in reader.deserialize() {
        let record: SensorData = result?;
        sensor_data.push(record);
    }
    info!(samples = sensor_data.len(), "loaded sensor log");

    let traces = [
        replay(&settings, HeadingStrategy::RotationAngle, &sensor_data)?,
        replay(&settings, HeadingStrategy::TiltCompensatedMagnetic, &sensor_data)?,
    ];

    for trace in &traces {
        if let Some(frame) = trace.frames.last() {
            println!("{:?}: {}", trace.strategy, frame.status_line());
        }
    }

    create_plots(&sensor_data, &traces)?;
    println!("✓ Plots saved to {PLOT_PATH}");
    Ok(())
}

fn replay(
    settings: &HudSettings,
    strategy: HeadingStrategy,
    sensor_data: &[SensorData],
) -> Result<Trace, Box<dyn Error>> {
    let mut settings = settings.clone();
    settings.estimator.strategy = strategy;

    let sensors = SensorSuite::new();
    let session = OverlaySession::start(&settings, ViewportGeometry::new(400.0, 800.0), &sensors)?;

    let mut frames = Vec::with_capacity(sensor_data.len());
    for data in sensor_data {
        let timestamp = Duration::from_millis(data.time_ms);
        sensors.accelerometer.publish(
            timestamp,
            &Vector3::new(data.accel_x, data.accel_y, data.accel_z),
        );
        sensors
            .magnetometer
            .publish(timestamp, &Vector3::new(data.mag_x, data.mag_y, data.mag_z));
        sensors.device_motion.publish(
            timestamp,
            &DeviceMotion {
                rotation: Some(Rotation::new(data.alpha, data.beta)),
            },
        );
        frames.push(session.frame());
    }

    session.stop();
    Ok(Trace { strategy, frames })
}

/// Three panels: heading around north, pitch, horizon offset in pixels
fn create_plots(sensor_data: &[SensorData], traces: &[Trace]) -> Result<(), Box<dyn Error>> {
    let (Some(first), Some(last)) = (sensor_data.first(), sensor_data.last()) else {
        return Ok(());
    };
    let time_range = first.time()..last.time();
    let colors = [BLUE, RED];

    let root = BitMapBackend::new(PLOT_PATH, (1000, 900)).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((3, 1));

    // Headings are plotted relative to north so the sweep does not jump at 360°
    let mut heading_chart = ChartBuilder::on(&panels[0])
        .caption("Heading, Pitch and Horizon Offset", ("sans-serif", 20))
        .margin(5)
        .x_label_area_size(0)
        .y_label_area_size(50)
        .build_cartesian_2d(time_range.clone(), -30f32..30f32)?;
    heading_chart
        .configure_mesh()
        .y_desc("Heading from north (°)")
        .draw()?;

    heading_chart
        .draw_series(LineSeries::new(
            sensor_data
                .iter()
                .map(|d| (d.time(), signed_offset(d.alpha.to_degrees(), 0.0))),
            &BLACK,
        ))?
        .label("Raw alpha")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], BLACK));

    for (trace, color) in traces.iter().zip(colors) {
        heading_chart
            .draw_series(LineSeries::new(
                sensor_data
                    .iter()
                    .zip(&trace.frames)
                    .map(|(d, f)| (d.time(), signed_offset(f.orientation.heading, 0.0))),
                &color,
            ))?
            .label(format!("{:?}", trace.strategy))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], color));
    }
    heading_chart.configure_series_labels().draw()?;

    let mut pitch_chart = ChartBuilder::on(&panels[1])
        .margin(5)
        .x_label_area_size(0)
        .y_label_area_size(50)
        .build_cartesian_2d(time_range.clone(), 85f32..105f32)?;
    pitch_chart.configure_mesh().y_desc("Pitch (°)").draw()?;

    pitch_chart
        .draw_series(LineSeries::new(
            sensor_data.iter().map(|d| (d.time(), d.beta.to_degrees())),
            &BLACK,
        ))?
        .label("Raw beta")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], BLACK));

    if let Some(trace) = traces.first() {
        pitch_chart
            .draw_series(LineSeries::new(
                sensor_data
                    .iter()
                    .zip(&trace.frames)
                    .map(|(d, f)| (d.time(), f.orientation.pitch)),
                &GREEN,
            ))?
            .label("Smoothed")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], GREEN));
    }
    pitch_chart.configure_series_labels().draw()?;

    let mut offset_chart = ChartBuilder::on(&panels[2])
        .margin(5)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(time_range, -400f32..400f32)?;
    offset_chart
        .configure_mesh()
        .x_desc("Time (s)")
        .y_desc("Horizon offset (px)")
        .draw()?;

    if let Some(trace) = traces.first() {
        offset_chart
            .draw_series(LineSeries::new(
                sensor_data
                    .iter()
                    .zip(&trace.frames)
                    .map(|(d, f)| (d.time(), f.horizon_offset)),
                &RGBColor(255, 165, 0), // orange
            ))?
            .label("Horizon offset")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], RGBColor(255, 165, 0)));
    }
    offset_chart.configure_series_labels().draw()?;

    root.present()?;
    Ok(())
}
