//! Capability interfaces consumed from the host tracking runtime
//!
//! The core never talks to a VR runtime directly. The frame driver hands it a
//! [`TrackingBackend`] for device polling and an [`ActionBackend`] for the
//! action system; both are `Send` so a context can live on a dedicated frame
//! thread.

use super::pose::{ControllerState, DeviceClass};
use crate::error::BackendError;

/// Opaque handle to a registered action set
pub type ActionSetHandle = u64;

/// Opaque handle to a registered digital action
pub type ActionHandle = u64;

/// Opaque handle to the physical control that drove an action
pub type OriginHandle = u64;

/// Value of a digital action after the last batched poll
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DigitalActionData {
    pub active: bool,
    /// Backend's own change flag relative to its previous poll
    pub changed: bool,
    /// Seconds relative to the poll at which the value last changed
    pub update_time: f32,
    pub origin: OriginHandle,
}

/// Device polling interface
pub trait TrackingBackend: Send {
    /// Whether the tracking system is initialized
    fn is_available(&self) -> bool;

    /// Class of the device currently in `slot`
    fn device_class(&self, slot: usize) -> DeviceClass;

    /// Latest button state and pose for `slot`
    ///
    /// `None` means the backend could not be queried this frame; callers keep
    /// their previous values.
    fn controller_state(&self, slot: usize) -> Option<ControllerState>;
}

/// Action system interface
pub trait ActionBackend: Send {
    /// Whether the action system is initialized
    fn is_available(&self) -> bool;

    fn register_action_set(&mut self, path: &str) -> Result<ActionSetHandle, BackendError>;

    fn register_digital_action(&mut self, path: &str) -> Result<ActionHandle, BackendError>;

    /// Refresh every action in the given sets in one call
    fn poll_action_states(&mut self, active_sets: &[ActionSetHandle]) -> Result<(), BackendError>;

    fn digital_action_value(&self, handle: ActionHandle) -> Result<DigitalActionData, BackendError>;

    /// Localized, human-readable name of a physical control
    fn resolve_origin_name(&self, origin: OriginHandle) -> Result<String, BackendError>;
}
