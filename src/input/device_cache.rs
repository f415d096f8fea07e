//! Per-slot device state cache with press/touch edge detection
//!
//! The cache owns one [`DeviceSnapshot`] per tracked-device slot, allocated
//! once for the configured maximum device count. The frame driver calls
//! [`DeviceStateCache::refresh`] once per frame; every query afterwards is a
//! pure read of the current/previous pair.
//!
//! # Mask semantics
//!
//! Level queries (`is_pressed`, `is_touched`) are true when **any** bit of the
//! mask is set. Edge queries treat the whole mask as one unit: a press edge
//! fires only when no mask bit was set at the previous refresh and at least one
//! is set now. Pass single-button masks for per-button edges.

use tracing::{debug, trace, warn};

use super::backend::TrackingBackend;
use super::pose::{DeviceClass, RigidTransform, TrackingQuality};

/// Maximum number of tracked-device slots exposed by the runtime
pub const MAX_TRACKED_DEVICES: usize = 64;

/// Slot the runtime reserves for the head-mounted display
pub const HMD_SLOT: usize = 0;

/// Polled state of one tracked-device slot (current + previous refresh)
#[derive(Debug, Clone)]
pub struct DeviceSnapshot {
    /// Slot index (stable for the lifetime of the cache)
    pub slot: usize,

    /// Device class reported at the last refresh
    pub class: DeviceClass,

    pub current_pressed: u64,
    pub previous_pressed: u64,
    pub current_touched: u64,
    pub previous_touched: u64,

    /// Device-to-standing-origin transform
    pub pose: RigidTransform,

    pub connected: bool,
    pub pose_valid: bool,
    pub tracking_quality: TrackingQuality,

    /// Frame counter of the last refresh (None before the first one)
    pub last_updated_frame: Option<u64>,
}

impl DeviceSnapshot {
    fn new(slot: usize) -> Self {
        Self {
            slot,
            class: DeviceClass::Invalid,
            current_pressed: 0,
            previous_pressed: 0,
            current_touched: 0,
            previous_touched: 0,
            pose: RigidTransform::identity(),
            connected: false,
            pose_valid: false,
            tracking_quality: TrackingQuality::Uninitialized,
            last_updated_frame: None,
        }
    }

    /// Connected and reporting a valid pose
    pub fn has_tracking(&self) -> bool {
        self.connected && self.pose_valid
    }

    pub fn is_out_of_range(&self) -> bool {
        self.tracking_quality == TrackingQuality::OutOfRange
    }

    pub fn is_calibrating(&self) -> bool {
        self.tracking_quality == TrackingQuality::Calibrating
    }

    pub fn is_uninitialized(&self) -> bool {
        self.tracking_quality == TrackingQuality::Uninitialized
    }

    pub fn is_pressed(&self, mask: u64) -> bool {
        self.connected && level(self.current_pressed, mask)
    }

    pub fn is_pressed_edge_down(&self, mask: u64) -> bool {
        self.connected && edge_down(self.previous_pressed, self.current_pressed, mask)
    }

    pub fn is_pressed_edge_up(&self, mask: u64) -> bool {
        self.connected && edge_up(self.previous_pressed, self.current_pressed, mask)
    }

    pub fn is_touched(&self, mask: u64) -> bool {
        self.connected && level(self.current_touched, mask)
    }

    pub fn is_touched_edge_down(&self, mask: u64) -> bool {
        self.connected && edge_down(self.previous_touched, self.current_touched, mask)
    }

    pub fn is_touched_edge_up(&self, mask: u64) -> bool {
        self.connected && edge_up(self.previous_touched, self.current_touched, mask)
    }
}

fn level(bits: u64, mask: u64) -> bool {
    bits & mask != 0
}

fn edge_down(previous: u64, current: u64, mask: u64) -> bool {
    level(current, mask) && !level(previous, mask)
}

fn edge_up(previous: u64, current: u64, mask: u64) -> bool {
    !level(current, mask) && level(previous, mask)
}

/// Owner of every [`DeviceSnapshot`]
#[derive(Debug, Clone)]
pub struct DeviceStateCache {
    slots: Vec<DeviceSnapshot>,
    /// Set once the "backend unavailable" warning has been logged
    unavailable_reported: bool,
}

impl Default for DeviceStateCache {
    fn default() -> Self {
        Self::new(MAX_TRACKED_DEVICES)
    }
}

impl DeviceStateCache {
    /// Allocate `capacity` slots, all disconnected and never refreshed
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(DeviceSnapshot::new).collect(),
            unavailable_reported: false,
        }
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// False while the last [`refresh`](Self::refresh) found the backend down
    pub fn is_tracking_available(&self) -> bool {
        !self.unavailable_reported
    }

    /// Refresh every slot for `frame`
    ///
    /// Slots already refreshed for `frame` are left alone, so calling this
    /// twice in the same frame is a no-op.
    pub fn refresh(&mut self, backend: &dyn TrackingBackend, frame: u64) {
        if !backend.is_available() {
            if !self.unavailable_reported {
                warn!("Tracking backend unavailable, keeping last known device state");
                self.unavailable_reported = true;
            }
        } else if self.unavailable_reported {
            debug!("Tracking backend available again");
            self.unavailable_reported = false;
        }

        for slot in 0..self.slots.len() {
            self.refresh_slot(backend, slot, frame);
        }
    }

    /// Refresh a single slot for `frame`
    ///
    /// # Panics
    /// If `slot` is outside the cache.
    pub fn refresh_slot(&mut self, backend: &dyn TrackingBackend, slot: usize, frame: u64) {
        let snapshot = self.device_mut(slot);
        if snapshot.last_updated_frame == Some(frame) {
            return;
        }

        snapshot.last_updated_frame = Some(frame);
        snapshot.previous_pressed = snapshot.current_pressed;
        snapshot.previous_touched = snapshot.current_touched;

        if !backend.is_available() {
            return;
        }

        let Some(state) = backend.controller_state(slot) else {
            trace!("Slot {} unavailable in frame {}, keeping stale state", slot, frame);
            return;
        };

        let class = backend.device_class(slot);
        if state.connected != snapshot.connected {
            debug!(
                "Slot {} ({}) {}",
                slot,
                class,
                if state.connected { "connected" } else { "disconnected" }
            );
        }

        snapshot.class = class;
        snapshot.current_pressed = state.buttons_pressed;
        snapshot.current_touched = state.buttons_touched;
        snapshot.pose = state.pose;
        snapshot.connected = state.connected;
        snapshot.pose_valid = state.pose_valid;
        snapshot.tracking_quality = state.tracking_quality;
    }

    /// Snapshot for `slot`, or None if outside the cache
    pub fn get(&self, slot: usize) -> Option<&DeviceSnapshot> {
        self.slots.get(slot)
    }

    /// Snapshot for `slot`
    ///
    /// # Panics
    /// If `slot` is outside the cache. Slot indices come from the runtime's
    /// fixed table, so an out-of-range index is a caller bug.
    pub fn device(&self, slot: usize) -> &DeviceSnapshot {
        assert!(
            slot < self.slots.len(),
            "device slot {} out of range (0..{})",
            slot,
            self.slots.len()
        );
        &self.slots[slot]
    }

    fn device_mut(&mut self, slot: usize) -> &mut DeviceSnapshot {
        let len = self.slots.len();
        assert!(slot < len, "device slot {} out of range (0..{})", slot, len);
        &mut self.slots[slot]
    }

    /// All slots in ascending index order
    pub fn iter(&self) -> impl Iterator<Item = &DeviceSnapshot> {
        self.slots.iter()
    }

    /// Connected slots in ascending index order
    pub fn connected(&self) -> impl Iterator<Item = &DeviceSnapshot> {
        self.slots.iter().filter(|s| s.connected)
    }

    pub fn is_pressed(&self, slot: usize, mask: u64) -> bool {
        self.device(slot).is_pressed(mask)
    }

    pub fn is_pressed_edge_down(&self, slot: usize, mask: u64) -> bool {
        self.device(slot).is_pressed_edge_down(mask)
    }

    pub fn is_pressed_edge_up(&self, slot: usize, mask: u64) -> bool {
        self.device(slot).is_pressed_edge_up(mask)
    }

    pub fn is_touched(&self, slot: usize, mask: u64) -> bool {
        self.device(slot).is_touched(mask)
    }

    pub fn is_touched_edge_down(&self, slot: usize, mask: u64) -> bool {
        self.device(slot).is_touched_edge_down(mask)
    }

    pub fn is_touched_edge_up(&self, slot: usize, mask: u64) -> bool {
        self.device(slot).is_touched_edge_up(mask)
    }
}
