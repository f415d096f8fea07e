//! Relational device selection ("which controller is on my left?")
//!
//! Scans the [`DeviceStateCache`] for connected devices of one class and picks
//! the best candidate relative to a reference device, usually the HMD. Slot
//! indices can change as devices are added or removed, or when controllers
//! are swapped between hands. Re-select rather than caching a slot.
//!
//! # Angular scoring
//!
//! For `Leftmost`/`Rightmost` the candidate position is flattened onto the
//! reference's horizontal plane and compared with the reference forward (+Z):
//!
//! ```text
//! dir   = normalize(x, 0, z)
//! dot   = dir · forward
//! cross = dir × forward
//! Leftmost  = cross.y > 0 ? 2 - dot : dot
//! Rightmost = cross.y < 0 ? 2 - dot : dot
//! ```
//!
//! The cross sign separates the two half-planes so the fold stays monotonic
//! through the ±180° boundary behind the reference.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::device_cache::{DeviceStateCache, HMD_SLOT};
use super::pose::{position_in, DeviceClass, RigidTransform};

/// How candidates are ranked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceRelation {
    /// Lowest-index matching device, no scoring
    First,
    /// Largest counter-clockwise angle from reference forward
    Leftmost,
    /// Largest clockwise angle from reference forward
    Rightmost,
    /// Smallest x in reference space
    FarthestLeft,
    /// Largest x in reference space
    FarthestRight,
}

impl std::fmt::Display for DeviceRelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DeviceRelation::First => "first",
            DeviceRelation::Leftmost => "leftmost",
            DeviceRelation::Rightmost => "rightmost",
            DeviceRelation::FarthestLeft => "farthest_left",
            DeviceRelation::FarthestRight => "farthest_right",
        };
        write!(f, "{}", name)
    }
}

/// Frame that candidate positions are expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceFrame {
    /// Standing tracking origin
    Absolute,
    /// Current pose of the device in this slot
    Device(usize),
}

impl Default for ReferenceFrame {
    fn default() -> Self {
        ReferenceFrame::Device(HMD_SLOT)
    }
}

impl From<Option<usize>> for ReferenceFrame {
    fn from(slot: Option<usize>) -> Self {
        slot.map_or(ReferenceFrame::Absolute, ReferenceFrame::Device)
    }
}

/// Pick the slot that best satisfies `relation`
///
/// Candidates are connected slots of `class`, excluding the reference slot,
/// scanned in ascending order. Ties keep the earlier slot. A reference slot
/// outside the cache is treated as the absolute frame. Candidates scoring NaN
/// never win.
///
/// # Returns
/// `None` when no connected device matches or tracking is unavailable.
pub fn select(
    cache: &DeviceStateCache,
    relation: DeviceRelation,
    class: DeviceClass,
    reference: ReferenceFrame,
) -> Option<usize> {
    if !cache.is_tracking_available() {
        return None;
    }

    let reference_slot = match reference {
        ReferenceFrame::Device(slot) if slot < cache.len() => Some(slot),
        _ => None,
    };

    let reference_inverse = reference_slot
        .map(|slot| cache.device(slot).pose.inverse())
        .unwrap_or_else(RigidTransform::identity);

    let mut best = None;
    let mut best_score = f32::MIN;

    for device in cache.iter() {
        if Some(device.slot) == reference_slot || device.class != class || !device.connected {
            continue;
        }

        if relation == DeviceRelation::First {
            debug!("Found device with relation {} at slot {}", relation, device.slot);
            return Some(device.slot);
        }

        let position = position_in(&reference_inverse, &device.pose);
        let candidate = score(relation, &position);

        if candidate > best_score {
            best = Some(device.slot);
            best_score = candidate;
        }
    }

    if let Some(slot) = best {
        debug!("Found device with relation {} at slot {}", relation, slot);
    }
    best
}

/// Scalar rank of a reference-space position; higher wins
fn score(relation: DeviceRelation, position: &Vector3<f32>) -> f32 {
    match relation {
        DeviceRelation::First => 0.0,
        DeviceRelation::FarthestRight => position.x,
        DeviceRelation::FarthestLeft => -position.x,
        DeviceRelation::Leftmost | DeviceRelation::Rightmost => {
            let forward = Vector3::z();
            let dir = Vector3::new(position.x, 0.0, position.z)
                .try_normalize(f32::EPSILON)
                .unwrap_or_else(Vector3::zeros);
            let dot = dir.dot(&forward);
            let cross = dir.cross(&forward);

            let folded = if relation == DeviceRelation::Leftmost {
                cross.y > 0.0
            } else {
                cross.y < 0.0
            };
            if folded {
                2.0 - dot
            } else {
                dot
            }
        },
    }
}
