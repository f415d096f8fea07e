//! Scripted tracking/action backend driven by a scenario file
//!
//! Replays a list of frames describing device poses, buttons and action
//! values. Used by the CLI to exercise the core without a headset and by the
//! scenario tests.
//!
//! ```yaml
//! devices:
//!   - { slot: 0, class: hmd, name: Headset }
//!   - { slot: 1, class: controller, name: Left Controller }
//! action_origins:
//!   /actions/default/in/grabgrip: Left Hand Grip
//! frames:
//!   - devices:
//!       0: { position: [0.0, 1.7, 0.0] }
//!       1: { position: [-0.3, 1.2, 0.3], pressed: [trigger] }
//!     actions:
//!       /actions/default/in/grabgrip: true
//! ```
//!
//! Devices and actions omitted from a frame keep their value from the
//! previous frame. Seeking past the last frame holds the last frame.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use super::backend::{
    ActionBackend, ActionHandle, ActionSetHandle, DigitalActionData, OriginHandle, TrackingBackend,
};
use super::buttons::mask_from_names;
use super::pose::{rigid_transform, ControllerState, DeviceClass, TrackingQuality};
use crate::error::BackendError;

/// Built-in scenario: HMD plus two controllers, trigger clicks and a grip
pub const DEMO_SCENARIO: &str = include_str!("../../demos/two_controllers.yaml");

/// Scenario file contents
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Scenario {
    /// When false the backend reports both subsystems as unavailable
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(default)]
    pub devices: Vec<DeviceDecl>,
    /// Action path -> localized name of the control bound to it
    #[serde(default)]
    pub action_origins: HashMap<String, String>,
    #[serde(default)]
    pub frames: Vec<ScenarioFrame>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            available: true,
            devices: Vec::new(),
            action_origins: HashMap::new(),
            frames: Vec::new(),
        }
    }
}

/// A device occupying a slot for the whole scenario
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceDecl {
    pub slot: usize,
    pub class: DeviceClass,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// One scripted frame
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScenarioFrame {
    #[serde(default)]
    pub devices: BTreeMap<usize, DeviceFrame>,
    #[serde(default)]
    pub actions: HashMap<String, bool>,
}

/// Device state within a frame
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceFrame {
    #[serde(default)]
    pub position: [f32; 3],
    /// Degrees about X, Y and Z
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default)]
    pub pressed: ButtonSet,
    #[serde(default)]
    pub touched: ButtonSet,
    #[serde(default = "default_true")]
    pub connected: bool,
    #[serde(default = "default_tracking")]
    pub tracking: TrackingQuality,
}

/// Buttons given by name or as a raw mask
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ButtonSet {
    Bits(u64),
    Names(Vec<String>),
}

impl Default for ButtonSet {
    fn default() -> Self {
        ButtonSet::Names(Vec::new())
    }
}

impl ButtonSet {
    pub fn mask(&self) -> u64 {
        match self {
            ButtonSet::Bits(bits) => *bits,
            ButtonSet::Names(names) => mask_from_names(names),
        }
    }
}

impl DeviceFrame {
    fn to_state(&self) -> ControllerState {
        ControllerState {
            buttons_pressed: self.pressed.mask(),
            buttons_touched: self.touched.mask(),
            pose: rigid_transform(self.position, self.rotation),
            connected: self.connected,
            pose_valid: self.connected && self.tracking == TrackingQuality::Normal,
            tracking_quality: self.tracking,
        }
    }
}

fn default_true() -> bool { true }
fn default_tracking() -> TrackingQuality { TrackingQuality::Normal }

impl Scenario {
    /// Load a scenario; `.json` files are parsed as JSON, anything else as YAML
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read scenario file: {}", path.display()))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let scenario: Scenario = if is_json {
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON scenario: {}", path.display()))?
        } else {
            serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML scenario: {}", path.display()))?
        };

        Ok(scenario)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        serde_yaml::from_str(contents).context("Failed to parse YAML scenario")
    }

    /// The built-in demo scenario
    pub fn demo() -> Result<Self> {
        Self::from_yaml(DEMO_SCENARIO)
    }

    /// Check slot references against the cache size
    pub fn validate(&self, max_devices: usize) -> Result<()> {
        let mut declared = HashMap::new();
        for device in &self.devices {
            if device.slot >= max_devices {
                bail!(
                    "Device slot {} is out of range (max_devices = {})",
                    device.slot,
                    max_devices
                );
            }
            if declared.insert(device.slot, device.class).is_some() {
                bail!("Device slot {} is declared twice", device.slot);
            }
        }

        for (index, frame) in self.frames.iter().enumerate() {
            for slot in frame.devices.keys() {
                if !declared.contains_key(slot) {
                    bail!("Frame {} references undeclared device slot {}", index, slot);
                }
            }
        }

        Ok(())
    }
}

/// Fully resolved frame (carry-forward applied)
#[derive(Debug, Clone, Default)]
struct ResolvedFrame {
    devices: HashMap<usize, ControllerState>,
    actions: HashMap<String, bool>,
}

/// Backend replaying a [`Scenario`]
#[derive(Debug)]
pub struct ScriptedBackend {
    available: bool,
    classes: HashMap<usize, DeviceClass>,
    names: HashMap<usize, String>,
    origins: HashMap<String, String>,
    frames: Vec<ResolvedFrame>,
    cursor: usize,
    action_sets: Vec<String>,
    /// Registered action paths; handle = index + 1
    actions: Vec<String>,
    polled: HashMap<ActionHandle, DigitalActionData>,
}

impl ScriptedBackend {
    pub fn new(scenario: Scenario) -> Self {
        let mut frames = Vec::with_capacity(scenario.frames.len().max(1));
        let mut carried = ResolvedFrame::default();

        for frame in &scenario.frames {
            for (slot, device) in &frame.devices {
                carried.devices.insert(*slot, device.to_state());
            }
            for (path, active) in &frame.actions {
                carried.actions.insert(path.clone(), *active);
            }
            frames.push(carried.clone());
        }
        if frames.is_empty() {
            frames.push(ResolvedFrame::default());
        }

        Self {
            available: scenario.available,
            classes: scenario.devices.iter().map(|d| (d.slot, d.class)).collect(),
            names: scenario
                .devices
                .iter()
                .filter_map(|d| d.name.clone().map(|n| (d.slot, n)))
                .collect(),
            origins: scenario.action_origins,
            frames,
            cursor: 0,
            action_sets: Vec::new(),
            actions: Vec::new(),
            polled: HashMap::new(),
        }
    }

    /// Number of scripted frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Index of the frame currently served
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Serve scripted frame `index`, clamped to the last frame
    pub fn seek(&mut self, index: usize) {
        self.cursor = index.min(self.frames.len().saturating_sub(1));
    }

    /// Whether the last scripted frame has been reached
    pub fn is_finished(&self) -> bool {
        self.cursor + 1 >= self.frames.len()
    }

    /// Friendly name of the device in `slot`
    pub fn device_name(&self, slot: usize) -> Option<&str> {
        self.names.get(&slot).map(String::as_str)
    }

    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    fn current(&self) -> &ResolvedFrame {
        &self.frames[self.cursor]
    }

    fn action_path(&self, handle: ActionHandle) -> Option<&str> {
        let index = usize::try_from(handle).ok()?.checked_sub(1)?;
        self.actions.get(index).map(String::as_str)
    }
}

impl TrackingBackend for ScriptedBackend {
    fn is_available(&self) -> bool {
        self.available
    }

    fn device_class(&self, slot: usize) -> DeviceClass {
        self.classes.get(&slot).copied().unwrap_or_default()
    }

    fn controller_state(&self, slot: usize) -> Option<ControllerState> {
        if !self.available {
            return None;
        }
        Some(self.current().devices.get(&slot).cloned().unwrap_or_default())
    }
}

impl ActionBackend for ScriptedBackend {
    fn is_available(&self) -> bool {
        self.available
    }

    fn register_action_set(&mut self, path: &str) -> Result<ActionSetHandle, BackendError> {
        if !self.available {
            return Err(BackendError::NotInitialized);
        }
        let index = match self.action_sets.iter().position(|p| p == path) {
            Some(index) => index,
            None => {
                self.action_sets.push(path.to_string());
                self.action_sets.len() - 1
            },
        };
        Ok(index as u64 + 1)
    }

    fn register_digital_action(&mut self, path: &str) -> Result<ActionHandle, BackendError> {
        if !self.available {
            return Err(BackendError::NotInitialized);
        }
        if !path.starts_with("/actions/") {
            return Err(BackendError::UnknownPath(path.to_string()));
        }
        let index = match self.actions.iter().position(|p| p == path) {
            Some(index) => index,
            None => {
                self.actions.push(path.to_string());
                self.actions.len() - 1
            },
        };
        Ok(index as u64 + 1)
    }

    fn poll_action_states(&mut self, active_sets: &[ActionSetHandle]) -> Result<(), BackendError> {
        if !self.available {
            return Err(BackendError::NotInitialized);
        }
        for set in active_sets {
            if *set == 0 || *set as usize > self.action_sets.len() {
                return Err(BackendError::InvalidHandle(*set));
            }
        }

        let mut polled = HashMap::with_capacity(self.actions.len());
        for (index, path) in self.actions.iter().enumerate() {
            let handle = index as u64 + 1;
            let active = self.current().actions.get(path).copied().unwrap_or(false);
            let was_active = self.polled.get(&handle).is_some_and(|d| d.active);
            polled.insert(
                handle,
                DigitalActionData {
                    active,
                    changed: active != was_active,
                    update_time: 0.0,
                    origin: handle,
                },
            );
        }
        debug!("Polled {} scripted action(s) at frame {}", polled.len(), self.cursor);
        self.polled = polled;
        Ok(())
    }

    fn digital_action_value(&self, handle: ActionHandle) -> Result<DigitalActionData, BackendError> {
        if self.action_path(handle).is_none() {
            return Err(BackendError::InvalidHandle(handle));
        }
        Ok(self.polled.get(&handle).copied().unwrap_or_default())
    }

    fn resolve_origin_name(&self, origin: OriginHandle) -> Result<String, BackendError> {
        self.action_path(origin)
            .and_then(|path| self.origins.get(path))
            .cloned()
            .ok_or(BackendError::NameResolutionFailed(origin))
    }
}
