//! Pose and device-description types shared by the cache, selector and backends
//!
//! Tracking space is a standing origin with +X to the right, +Y up and +Z
//! forward. Poses are rigid transforms (rotation + translation, no scale).

use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Device-to-tracking-space transform
pub type RigidTransform = Isometry3<f32>;

/// Kind of tracked device occupying a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    /// Nothing is assigned to the slot
    #[default]
    Invalid,
    /// Head-mounted display
    Hmd,
    /// Hand controller
    Controller,
    /// Generic tracker (pucks, body trackers)
    GenericTracker,
    /// Base station / camera
    TrackingReference,
    /// Accessory that redirects display output
    DisplayRedirect,
}

impl std::fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceClass::Invalid => write!(f, "invalid"),
            DeviceClass::Hmd => write!(f, "hmd"),
            DeviceClass::Controller => write!(f, "controller"),
            DeviceClass::GenericTracker => write!(f, "generic_tracker"),
            DeviceClass::TrackingReference => write!(f, "tracking_reference"),
            DeviceClass::DisplayRedirect => write!(f, "display_redirect"),
        }
    }
}

/// Tracking result reported alongside a pose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingQuality {
    /// Running and inside the tracked volume
    Normal,
    /// Running but outside the tracked volume
    OutOfRange,
    /// Calibration in progress
    Calibrating,
    /// No tracking data yet
    #[default]
    Uninitialized,
}

/// One poll of a device as returned by a [`TrackingBackend`](super::TrackingBackend)
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerState {
    /// Pressed buttons, one bit per [`ButtonId`](super::ButtonId)
    pub buttons_pressed: u64,
    /// Touched buttons, one bit per [`ButtonId`](super::ButtonId)
    pub buttons_touched: u64,
    pub pose: RigidTransform,
    pub connected: bool,
    pub pose_valid: bool,
    pub tracking_quality: TrackingQuality,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            buttons_pressed: 0,
            buttons_touched: 0,
            pose: RigidTransform::identity(),
            connected: false,
            pose_valid: false,
            tracking_quality: TrackingQuality::Uninitialized,
        }
    }
}

/// Build a rigid transform from a position and rotations about X, Y and Z in degrees
///
/// Rotations are applied roll (X), then pitch (Y), then yaw (Z), matching
/// [`UnitQuaternion::from_euler_angles`]. A rotation of +90 about Y turns a
/// device facing +Z to face +X.
pub fn rigid_transform(position: [f32; 3], rotation_deg: [f32; 3]) -> RigidTransform {
    let [rx, ry, rz] = rotation_deg;
    Isometry3::from_parts(
        Translation3::new(position[0], position[1], position[2]),
        UnitQuaternion::from_euler_angles(rx.to_radians(), ry.to_radians(), rz.to_radians()),
    )
}

/// Position of a pose in the space of `reference_inverse`
pub fn position_in(reference_inverse: &RigidTransform, pose: &RigidTransform) -> Vector3<f32> {
    (reference_inverse * Point3::from(pose.translation.vector)).coords
}
