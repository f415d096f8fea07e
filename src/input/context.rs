//! Input context: backends, device cache and action tracker in one place
//!
//! The frame driver owns one [`InputContext`] and calls [`InputContext::tick`]
//! once per frame. Everything read afterwards (button edges, device selection,
//! action edges) reflects that frame.

use tracing::{debug, info, warn};

use super::actions::{ActionChange, ActionTracker, StandardAction, DEFAULT_ACTION_SET};
use super::backend::{ActionBackend, ActionHandle, TrackingBackend};
use super::device_cache::{DeviceStateCache, MAX_TRACKED_DEVICES};
use super::pose::DeviceClass;
use super::selector::{select, DeviceRelation, ReferenceFrame};
use crate::error::Result;

/// Settings an [`InputContext`] is built from
#[derive(Debug, Clone, PartialEq)]
pub struct ContextSettings {
    /// Number of device slots in the cache
    pub max_devices: usize,
    /// Frame selections are made relative to
    pub reference: ReferenceFrame,
    /// Device class candidates must have
    pub device_class: DeviceClass,
    /// Action set polled each frame
    pub action_set: String,
    /// Digital actions registered at startup
    pub digital_actions: Vec<String>,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            max_devices: MAX_TRACKED_DEVICES,
            reference: ReferenceFrame::default(),
            device_class: DeviceClass::Controller,
            action_set: DEFAULT_ACTION_SET.to_string(),
            digital_actions: StandardAction::ALL
                .iter()
                .map(|a| a.path().to_string())
                .collect(),
        }
    }
}

/// What changed during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub action_changes: Vec<ActionChange>,
}

/// Owner of the per-frame input state
pub struct InputContext<B> {
    backend: B,
    cache: DeviceStateCache,
    tracker: ActionTracker,
    settings: ContextSettings,
    frame: u64,
}

impl<B> InputContext<B>
where
    B: TrackingBackend + ActionBackend,
{
    /// Build a context and register the configured actions
    ///
    /// An unavailable tracking system only produces a warning; the cache keeps
    /// its initial (disconnected) state until the backend comes up. An
    /// unavailable action system leaves the tracker inert.
    ///
    /// # Errors
    /// [`crate::InputError::Registration`] when the backend rejects an action
    /// set or action path.
    pub fn initialize(mut backend: B, settings: ContextSettings) -> Result<Self> {
        info!(
            "Initializing input context ({} slots, reference {:?}, class {})",
            settings.max_devices, settings.reference, settings.device_class
        );

        if !TrackingBackend::is_available(&backend) {
            warn!("Tracking system is not available, devices will report disconnected");
        }

        let tracker = match ActionTracker::initialize(&backend) {
            Ok(mut tracker) => {
                register_actions(&mut tracker, &mut backend, &settings)?;
                tracker
            },
            Err(e) => {
                warn!("{}, continuing without digital actions", e);
                ActionTracker::inert()
            },
        };

        info!("✅ Input context initialized");

        Ok(Self {
            backend,
            cache: DeviceStateCache::new(settings.max_devices),
            tracker,
            settings,
            frame: 0,
        })
    }

    /// Advance the frame counter and refresh everything for the new frame
    pub fn tick(&mut self) -> FrameReport {
        self.refresh(self.frame + 1)
    }

    /// Refresh the cache and the tracker for an externally counted `frame`
    ///
    /// Refreshing the same frame again is a no-op and reports no changes.
    pub fn refresh(&mut self, frame: u64) -> FrameReport {
        self.frame = frame;
        self.cache.refresh(&self.backend, frame);
        let action_changes = self.tracker.refresh_all(&mut self.backend, frame);

        if !action_changes.is_empty() {
            debug!("Frame {}: {} action change(s)", frame, action_changes.len());
        }

        FrameReport {
            frame,
            action_changes,
        }
    }

    /// Re-bind the tracker after the action system came back
    pub fn reinitialize_actions(&mut self) -> Result<()> {
        self.tracker.reinitialize(&self.backend)?;
        register_actions(&mut self.tracker, &mut self.backend, &self.settings)?;
        info!("Action tracking re-enabled");
        Ok(())
    }

    /// Last refreshed frame (0 before the first tick)
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn cache(&self) -> &DeviceStateCache {
        &self.cache
    }

    pub fn tracker(&self) -> &ActionTracker {
        &self.tracker
    }

    pub fn settings(&self) -> &ContextSettings {
        &self.settings
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable backend access, e.g. to advance a scripted backend
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Select a device with the configured class and reference frame
    pub fn select(&self, relation: DeviceRelation) -> Option<usize> {
        select(
            &self.cache,
            relation,
            self.settings.device_class,
            self.settings.reference,
        )
    }

    /// Handle of a registered action path
    pub fn action(&self, path: &str) -> Option<ActionHandle> {
        self.tracker.handle(path)
    }

    /// Action at `path` became active this frame
    pub fn action_started(&self, path: &str) -> bool {
        self.action(path).is_some_and(|h| self.tracker.is_started(h))
    }

    /// Action at `path` became inactive this frame
    pub fn action_ended(&self, path: &str) -> bool {
        self.action(path).is_some_and(|h| self.tracker.is_ended(h))
    }

    /// Tear down and hand the backend back
    pub fn shutdown(self) -> B {
        info!("Input context shut down after {} frame(s)", self.frame);
        self.backend
    }
}

fn register_actions<B: ActionBackend>(
    tracker: &mut ActionTracker,
    backend: &mut B,
    settings: &ContextSettings,
) -> Result<()> {
    tracker.register_action_set(backend, &settings.action_set)?;
    for path in &settings.digital_actions {
        tracker.register_action(backend, path)?;
    }
    debug!(
        "Registered {} digital action(s) in {}",
        settings.digital_actions.len(),
        settings.action_set
    );
    Ok(())
}
