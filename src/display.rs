//! Display surface and camera permission seams
//!
//! The overlay library does not draw anything itself. A platform layer
//! implements [`CameraAccess`] and [`DisplaySurface`]; the library decides
//! which [`View`] to present.

use crate::mapper::OverlayFrame;

/// Camera permission as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraPermission {
    /// Not yet known (still being queried)
    #[default]
    Unknown,
    Denied,
    Granted,
}

/// Blocking prompt shown while camera access is denied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionPrompt {
    pub message: &'static str,
    /// Label of the single action that requests access again
    pub action_label: &'static str,
}

impl Default for PermissionPrompt {
    fn default() -> Self {
        Self {
            message: "No access to camera. Please grant permission.",
            action_label: "Grant Camera Permission",
        }
    }
}

/// What the display should show this frame
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    /// Nothing, while permission is unknown
    Empty,
    PermissionPrompt(PermissionPrompt),
    /// Camera passthrough with the overlay on top
    Overlay(OverlayFrame),
}

impl View {
    /// Pick the view for a permission state
    ///
    /// `frame` is only evaluated when the camera is granted.
    pub fn select(permission: CameraPermission, frame: impl FnOnce() -> OverlayFrame) -> View {
        match permission {
            CameraPermission::Unknown => View::Empty,
            CameraPermission::Denied => View::PermissionPrompt(PermissionPrompt::default()),
            CameraPermission::Granted => View::Overlay(frame()),
        }
    }
}

/// Platform camera permission
pub trait CameraAccess {
    fn permission(&self) -> CameraPermission;

    /// Ask the user for camera access; the result shows up in a later
    /// [`CameraAccess::permission`] call
    fn request_permission(&mut self);
}

/// Platform rendering surface
pub trait DisplaySurface {
    fn present(&mut self, view: &View);
}
