//! Digital action edge tracking
//!
//! Actions are named boolean inputs ("grab grip", "grab pinch") resolved by
//! the runtime's binding configuration rather than a fixed physical button.
//! The tracker registers them once, polls every registered action set in one
//! batched call per frame, and reports start/end edges.
//!
//! Each action is a two-state machine:
//!
//! ```text
//!            active poll
//! Inactive ─────────────▶ Active      (started: changed && active)
//!          ◀─────────────             (ended:   changed && !active)
//!           inactive poll
//! ```

use std::collections::HashMap;

use tracing::{debug, info, warn};

use super::backend::{ActionBackend, ActionHandle, ActionSetHandle, DigitalActionData};
use crate::error::{InputError, Result};

/// Placeholder origin name when the runtime cannot resolve one
pub const UNKNOWN_ORIGIN: &str = "Unknown";

/// Default action set of the camera plugin bindings
pub const DEFAULT_ACTION_SET: &str = "/actions/default";

/// Actions the camera plugin binds out of the box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardAction {
    Grip,
    Pinch,
}

impl StandardAction {
    pub const ALL: [StandardAction; 2] = [StandardAction::Grip, StandardAction::Pinch];

    /// Action path in the default action manifest
    pub fn path(self) -> &'static str {
        match self {
            StandardAction::Grip => "/actions/default/in/grabgrip",
            StandardAction::Pinch => "/actions/default/in/grabpinch",
        }
    }
}

/// Current value of one registered action
#[derive(Debug, Clone, PartialEq)]
pub struct ActionState {
    pub path: String,
    pub active: bool,
    /// True iff the last refresh toggled `active`
    pub changed: bool,
    /// Control that produced the last change
    pub origin_name: String,
    /// Backend timestamp of the last change, seconds relative to the poll
    pub update_time: f32,
}

impl ActionState {
    fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            active: false,
            changed: false,
            origin_name: UNKNOWN_ORIGIN.to_string(),
            update_time: 0.0,
        }
    }
}

/// One action transition observed by [`ActionTracker::refresh_all`]
#[derive(Debug, Clone, PartialEq)]
pub struct ActionChange {
    pub handle: ActionHandle,
    pub path: String,
    pub active: bool,
    pub origin_name: String,
}

/// Owner of every [`ActionState`]
#[derive(Debug, Default)]
pub struct ActionTracker {
    initialized: bool,
    sets: HashMap<String, ActionSetHandle>,
    /// Registration order is kept so changes come out in a stable order
    set_order: Vec<ActionSetHandle>,
    handles: HashMap<String, ActionHandle>,
    states: Vec<(ActionHandle, ActionState)>,
    last_frame: Option<u64>,
}

impl ActionTracker {
    /// Create a tracker bound to an initialized action system
    ///
    /// # Errors
    /// [`InputError::BackendUnavailable`] if the action system is not up. Use
    /// [`ActionTracker::inert`] to keep running without actions.
    pub fn initialize(backend: &dyn ActionBackend) -> Result<Self> {
        if !backend.is_available() {
            warn!("Action system is not available");
            return Err(InputError::BackendUnavailable { subsystem: "action" });
        }

        info!("Action tracker initialized");
        Ok(Self {
            initialized: true,
            ..Self::default()
        })
    }

    /// A tracker that reports every action inactive
    pub fn inert() -> Self {
        Self::default()
    }

    /// Whether the tracker is bound to a live action system
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Re-bind after the action system came back
    ///
    /// Registrations are dropped; register actions again afterwards.
    pub fn reinitialize(&mut self, backend: &dyn ActionBackend) -> Result<()> {
        *self = Self::initialize(backend)?;
        Ok(())
    }

    fn ensure_live(&mut self, backend: &dyn ActionBackend) -> Result<()> {
        if self.initialized && backend.is_available() {
            return Ok(());
        }
        if self.initialized {
            warn!("Action system went away, action tracking disabled until reinitialized");
            self.initialized = false;
        }
        Err(InputError::BackendUnavailable { subsystem: "action" })
    }

    /// Register an action set to poll each frame (idempotent per path)
    pub fn register_action_set(
        &mut self,
        backend: &mut dyn ActionBackend,
        path: &str,
    ) -> Result<ActionSetHandle> {
        self.ensure_live(backend)?;
        if let Some(handle) = self.sets.get(path) {
            return Ok(*handle);
        }

        let handle = backend
            .register_action_set(path)
            .map_err(|source| InputError::Registration {
                kind: "action set",
                path: path.to_string(),
                source,
            })?;

        debug!("Registered action set {} -> {}", path, handle);
        self.sets.insert(path.to_string(), handle);
        self.set_order.push(handle);
        Ok(handle)
    }

    /// Register a digital action (idempotent per path)
    ///
    /// # Errors
    /// [`InputError::BackendUnavailable`] if the action system is not
    /// initialized; the tracker stays inert until
    /// [`reinitialize`](Self::reinitialize).
    pub fn register_action(
        &mut self,
        backend: &mut dyn ActionBackend,
        path: &str,
    ) -> Result<ActionHandle> {
        self.ensure_live(backend)?;
        if let Some(handle) = self.handles.get(path) {
            return Ok(*handle);
        }

        let handle = backend
            .register_digital_action(path)
            .map_err(|source| InputError::Registration {
                kind: "digital action",
                path: path.to_string(),
                source,
            })?;

        debug!("Registered digital action {} -> {}", path, handle);
        self.handles.insert(path.to_string(), handle);
        if !self.states.iter().any(|(h, _)| *h == handle) {
            self.states.push((handle, ActionState::new(path)));
        }
        Ok(handle)
    }

    /// Register the default action set with the grip and pinch actions
    pub fn register_standard_actions(
        &mut self,
        backend: &mut dyn ActionBackend,
    ) -> Result<HashMap<StandardAction, ActionHandle>> {
        self.register_action_set(backend, DEFAULT_ACTION_SET)?;

        let mut handles = HashMap::new();
        for action in StandardAction::ALL {
            handles.insert(action, self.register_action(backend, action.path())?);
        }
        Ok(handles)
    }

    /// Handle of a registered action path
    pub fn handle(&self, path: &str) -> Option<ActionHandle> {
        self.handles.get(path).copied()
    }

    /// Poll every registered set once and update all action states
    ///
    /// A second call for the same `frame` is a no-op and returns no changes.
    /// Backend failures leave the previous states in place.
    ///
    /// # Returns
    /// Changes in registration order.
    pub fn refresh_all(&mut self, backend: &mut dyn ActionBackend, frame: u64) -> Vec<ActionChange> {
        if !self.initialized || self.last_frame == Some(frame) {
            return Vec::new();
        }
        self.last_frame = Some(frame);

        if self.ensure_live(&*backend).is_err() {
            self.clear_changed();
            return Vec::new();
        }

        if let Err(e) = backend.poll_action_states(&self.set_order) {
            warn!("Failed to poll action states: {}", e);
            self.clear_changed();
            return Vec::new();
        }

        let mut changes = Vec::new();
        for (handle, state) in self.states.iter_mut() {
            let data = match backend.digital_action_value(*handle) {
                Ok(data) => data,
                Err(e) => {
                    debug!("Failed to read action {}: {}", state.path, e);
                    state.changed = false;
                    continue;
                },
            };

            if let Some(change) = apply(*handle, state, &data, &*backend) {
                changes.push(change);
            }
        }

        changes
    }

    fn clear_changed(&mut self) {
        for (_, state) in self.states.iter_mut() {
            state.changed = false;
        }
    }

    /// State of a registered action
    pub fn state(&self, handle: ActionHandle) -> Option<&ActionState> {
        self.states.iter().find(|(h, _)| *h == handle).map(|(_, s)| s)
    }

    /// Action became active this frame
    pub fn is_started(&self, handle: ActionHandle) -> bool {
        self.initialized && self.state(handle).is_some_and(|s| s.active && s.changed)
    }

    /// Action became inactive this frame
    pub fn is_ended(&self, handle: ActionHandle) -> bool {
        self.initialized && self.state(handle).is_some_and(|s| !s.active && s.changed)
    }

    /// Action is currently held
    pub fn is_active(&self, handle: ActionHandle) -> bool {
        self.initialized && self.state(handle).is_some_and(|s| s.active)
    }
}

/// Fold a polled value into `state`, returning the change record if it toggled
fn apply(
    handle: ActionHandle,
    state: &mut ActionState,
    data: &DigitalActionData,
    backend: &dyn ActionBackend,
) -> Option<ActionChange> {
    state.changed = data.active != state.active;
    state.active = data.active;
    if !state.changed {
        return None;
    }

    state.update_time = data.update_time;
    state.origin_name = origin_name(backend, data);
    debug!(
        "Action changed - {} origin: {} state: {} updateTime: {}",
        state.path, state.origin_name, state.active, state.update_time
    );

    Some(ActionChange {
        handle,
        path: state.path.clone(),
        active: state.active,
        origin_name: state.origin_name.clone(),
    })
}

fn origin_name(backend: &dyn ActionBackend, data: &DigitalActionData) -> String {
    backend
        .resolve_origin_name(data.origin)
        .unwrap_or_else(|_| UNKNOWN_ORIGIN.to_string())
}
