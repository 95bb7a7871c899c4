//! Screen-space mapping of the estimated orientation

use core::fmt;

use crate::math::signed_offset;
use crate::types::{
    FieldOfView, HorizonState, SmoothedOrientation, VERTICAL_PITCH, ViewportGeometry, Waypoint,
};

/// A direction label that falls inside the horizontal field of view
#[derive(Debug, Clone, PartialEq)]
pub struct LabelPlacement {
    pub label: String,
    /// Signed angle from the heading, degrees
    pub angular_offset: f32,
    /// Horizontal pixel offset from the screen centre, right positive
    pub offset_x: f32,
}

/// Everything the display needs to draw one overlay frame
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayFrame {
    /// Vertical translation applied to the container holding the horizon
    /// line and every label, in pixels, down positive
    pub horizon_offset: f32,
    /// Labels visible this frame
    pub labels: Vec<LabelPlacement>,
    pub orientation: SmoothedOrientation,
    pub horizon: HorizonState,
}

impl OverlayFrame {
    /// Text readout shown along the bottom of the overlay
    pub fn status_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for OverlayFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Heading: {}° | Pitch: {}° | {}",
            self.orientation.heading.round(),
            self.orientation.pitch.round(),
            self.horizon
        )
    }
}

/// Stateless projection from orientation to screen coordinates
///
/// # Example
/// ```
/// use compass_hud::{
///     FieldOfView, HorizonState, ScreenMapper, SmoothedOrientation, ViewportGeometry, Waypoint,
/// };
///
/// let mapper = ScreenMapper::new(ViewportGeometry::new(400.0, 800.0), FieldOfView::default());
/// let orientation = SmoothedOrientation { heading: 10.0, pitch: 90.0 };
/// let frame = mapper.map(orientation, HorizonState::Above, &Waypoint::cardinal_points());
///
/// assert_eq!(frame.horizon_offset, 0.0);
/// assert_eq!(frame.labels.len(), 1);
/// assert_eq!(frame.labels[0].label, "N");
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenMapper {
    viewport: ViewportGeometry,
    fov: FieldOfView,
}

impl ScreenMapper {
    pub fn new(viewport: ViewportGeometry, fov: FieldOfView) -> Self {
        Self { viewport, fov }
    }

    pub fn viewport(&self) -> ViewportGeometry {
        self.viewport
    }

    pub fn field_of_view(&self) -> FieldOfView {
        self.fov
    }

    /// Vertical pixel offset of the horizon container
    ///
    /// The magnitude comes from the absolute tilt away from vertical hold,
    /// the direction from the horizon side: up when below, down when above.
    /// The result is clamped to half the viewport height.
    pub fn horizon_offset(&self, pitch: f32, horizon: HorizonState) -> f32 {
        let half_height = self.viewport.height / 2.0;
        let effective_pitch = pitch - VERTICAL_PITCH;
        let pixels_per_degree = self.viewport.height / self.fov.vertical;
        let magnitude = effective_pitch.abs() * pixels_per_degree;

        let offset = match horizon {
            HorizonState::Below => -magnitude,
            HorizonState::Above => magnitude,
        };
        offset.clamp(-half_height, half_height)
    }

    /// Horizontal placement of a waypoint, or `None` when it is out of view
    pub fn place(&self, heading: f32, waypoint: &Waypoint) -> Option<LabelPlacement> {
        let half_fov = self.fov.horizontal / 2.0;
        let angular_offset = signed_offset(waypoint.angle, heading);
        if angular_offset.abs() > half_fov {
            return None;
        }

        Some(LabelPlacement {
            label: waypoint.label.clone(),
            angular_offset,
            offset_x: (angular_offset / half_fov) * (self.viewport.width / 2.0),
        })
    }

    /// Build the overlay frame for the current orientation
    pub fn map(
        &self,
        orientation: SmoothedOrientation,
        horizon: HorizonState,
        waypoints: &[Waypoint],
    ) -> OverlayFrame {
        OverlayFrame {
            horizon_offset: self.horizon_offset(orientation.pitch, horizon),
            labels: waypoints
                .iter()
                .filter_map(|waypoint| self.place(orientation.heading, waypoint))
                .collect(),
            orientation,
            horizon,
        }
    }
}
