//! In-memory backends for unit tests

use std::collections::HashMap;

use super::backend::{
    ActionBackend, ActionHandle, ActionSetHandle, DigitalActionData, OriginHandle, TrackingBackend,
};
use super::pose::{rigid_transform, ControllerState, DeviceClass, TrackingQuality};
use crate::error::BackendError;

pub(crate) struct FakeTracking {
    pub available: bool,
    pub classes: Vec<DeviceClass>,
    pub states: Vec<Option<ControllerState>>,
}

impl FakeTracking {
    pub fn new(slots: usize) -> Self {
        Self {
            available: true,
            classes: vec![DeviceClass::Invalid; slots],
            states: vec![Some(ControllerState::default()); slots],
        }
    }

    pub fn connect(&mut self, slot: usize, class: DeviceClass, position: [f32; 3]) {
        self.classes[slot] = class;
        self.states[slot] = Some(ControllerState {
            pose: rigid_transform(position, [0.0; 3]),
            connected: true,
            pose_valid: true,
            tracking_quality: TrackingQuality::Normal,
            ..ControllerState::default()
        });
    }

    pub fn place(&mut self, slot: usize, position: [f32; 3], rotation_deg: [f32; 3]) {
        if let Some(state) = self.states[slot].as_mut() {
            state.pose = rigid_transform(position, rotation_deg);
        }
    }

    pub fn disconnect(&mut self, slot: usize) {
        if let Some(state) = self.states[slot].as_mut() {
            state.connected = false;
            state.pose_valid = false;
        }
    }

    pub fn set_pressed(&mut self, slot: usize, bits: u64) {
        if let Some(state) = self.states[slot].as_mut() {
            state.buttons_pressed = bits;
        }
    }

    pub fn set_touched(&mut self, slot: usize, bits: u64) {
        if let Some(state) = self.states[slot].as_mut() {
            state.buttons_touched = bits;
        }
    }

    pub fn set_quality(&mut self, slot: usize, quality: TrackingQuality) {
        if let Some(state) = self.states[slot].as_mut() {
            state.tracking_quality = quality;
        }
    }
}

impl TrackingBackend for FakeTracking {
    fn is_available(&self) -> bool {
        self.available
    }

    fn device_class(&self, slot: usize) -> DeviceClass {
        self.classes.get(slot).copied().unwrap_or_default()
    }

    fn controller_state(&self, slot: usize) -> Option<ControllerState> {
        self.states.get(slot).cloned().flatten()
    }
}

#[derive(Default)]
pub(crate) struct FakeActions {
    pub unavailable: bool,
    pub sets: HashMap<String, ActionSetHandle>,
    pub actions: HashMap<String, ActionHandle>,
    pub values: HashMap<ActionHandle, bool>,
    pub origins: HashMap<OriginHandle, String>,
    pub polls: usize,
    pub registrations: usize,
}

impl FakeActions {
    pub fn set_active(&mut self, path: &str, active: bool) {
        if let Some(handle) = self.actions.get(path) {
            self.values.insert(*handle, active);
        }
    }
}

impl ActionBackend for FakeActions {
    fn is_available(&self) -> bool {
        !self.unavailable
    }

    fn register_action_set(&mut self, path: &str) -> Result<ActionSetHandle, BackendError> {
        let next = self.sets.len() as u64 + 100;
        Ok(*self.sets.entry(path.to_string()).or_insert(next))
    }

    fn register_digital_action(&mut self, path: &str) -> Result<ActionHandle, BackendError> {
        if path.is_empty() {
            return Err(BackendError::UnknownPath(path.to_string()));
        }
        self.registrations += 1;
        let next = self.actions.len() as u64 + 1;
        Ok(*self.actions.entry(path.to_string()).or_insert(next))
    }

    fn poll_action_states(&mut self, _active_sets: &[ActionSetHandle]) -> Result<(), BackendError> {
        self.polls += 1;
        Ok(())
    }

    fn digital_action_value(&self, handle: ActionHandle) -> Result<DigitalActionData, BackendError> {
        Ok(DigitalActionData {
            active: self.values.get(&handle).copied().unwrap_or(false),
            changed: false,
            update_time: 0.0,
            origin: handle,
        })
    }

    fn resolve_origin_name(&self, origin: OriginHandle) -> Result<String, BackendError> {
        self.origins
            .get(&origin)
            .cloned()
            .ok_or(BackendError::NameResolutionFailed(origin))
    }
}
