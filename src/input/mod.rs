//! Tracked-device input
//!
//! Polls tracked devices (HMD, controllers, trackers) once per frame into a
//! [`DeviceStateCache`], picks devices by spatial relation with [`select`],
//! and tracks start/end edges of runtime-bound digital actions with an
//! [`ActionTracker`]. [`InputContext`] ties the three to a backend.

pub mod actions;
pub mod backend;
pub mod buttons;
pub mod context;
pub mod device_cache;
pub mod diagnostics;
pub mod pose;
pub mod scripted;
pub mod selector;

#[cfg(test)]
mod testing;
#[cfg(test)]
mod tests;

pub use actions::{
    ActionChange, ActionState, ActionTracker, StandardAction, DEFAULT_ACTION_SET, UNKNOWN_ORIGIN,
};
pub use backend::{
    ActionBackend, ActionHandle, ActionSetHandle, DigitalActionData, OriginHandle, TrackingBackend,
};
pub use buttons::{button_mask, ButtonId};
pub use context::{ContextSettings, FrameReport, InputContext};
pub use device_cache::{DeviceSnapshot, DeviceStateCache, HMD_SLOT, MAX_TRACKED_DEVICES};
pub use diagnostics::print_device_diagnostics;
pub use pose::{ControllerState, DeviceClass, RigidTransform, TrackingQuality};
pub use scripted::{Scenario, ScriptedBackend};
pub use selector::{select, DeviceRelation, ReferenceFrame};
