//! Configuration management for Tracked Input
//!
//! Handles loading, parsing, and validation of YAML configuration files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::input::{
    ContextSettings, DeviceClass, ReferenceFrame, StandardAction, DEFAULT_ACTION_SET,
    MAX_TRACKED_DEVICES,
};

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub actions: ActionsConfig,
    #[serde(default)]
    pub frame: FrameConfig,
    /// Scenario replayed by the scripted backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<PathBuf>,
}

/// Device polling and selection
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TrackingConfig {
    #[serde(default = "default_max_devices")]
    pub max_devices: usize,
    /// Slot selections are relative to; `null` selects in tracking space
    #[serde(default = "default_reference_slot")]
    pub reference_slot: Option<usize>,
    /// Class of the devices considered by selections
    #[serde(default = "default_device_class")]
    pub device_class: DeviceClass,
}

/// Digital actions registered at startup
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ActionsConfig {
    #[serde(default = "default_action_set")]
    pub action_set: String,
    #[serde(default = "default_digital_actions")]
    pub digital: Vec<String>,
}

/// Frame driver timing
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct FrameConfig {
    #[serde(default = "default_rate_hz")]
    pub rate_hz: u32,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            max_devices: default_max_devices(),
            reference_slot: default_reference_slot(),
            device_class: default_device_class(),
        }
    }
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            action_set: default_action_set(),
            digital: default_digital_actions(),
        }
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            rate_hz: default_rate_hz(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file with validation
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: AppConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?;

        // Validate the loaded configuration
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;

        fs::write(path, yaml)
            .await
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration for correctness and consistency
    pub fn validate(&self) -> Result<()> {
        let tracking = &self.tracking;
        if tracking.max_devices == 0 || tracking.max_devices > MAX_TRACKED_DEVICES {
            anyhow::bail!(
                "tracking.max_devices must be between 1 and {} (got {})",
                MAX_TRACKED_DEVICES,
                tracking.max_devices
            );
        }
        if let Some(slot) = tracking.reference_slot {
            if slot >= tracking.max_devices {
                anyhow::bail!(
                    "tracking.reference_slot {} is outside the {} device slots",
                    slot,
                    tracking.max_devices
                );
            }
        }
        if tracking.device_class == DeviceClass::Invalid {
            anyhow::bail!("tracking.device_class cannot be 'invalid'");
        }

        if !self.actions.action_set.starts_with("/actions/") {
            anyhow::bail!(
                "actions.action_set '{}' must start with /actions/",
                self.actions.action_set
            );
        }
        for (idx, path) in self.actions.digital.iter().enumerate() {
            if !path.starts_with(&self.actions.action_set) {
                anyhow::bail!(
                    "actions.digital[{}] '{}' is not in action set {}",
                    idx,
                    path,
                    self.actions.action_set
                );
            }
        }

        if !(1..=1000).contains(&self.frame.rate_hz) {
            anyhow::bail!("frame.rate_hz must be between 1 and 1000 (got {})", self.frame.rate_hz);
        }

        Ok(())
    }

    /// Settings for building an input context
    pub fn context_settings(&self) -> ContextSettings {
        ContextSettings {
            max_devices: self.tracking.max_devices,
            reference: ReferenceFrame::from(self.tracking.reference_slot),
            device_class: self.tracking.device_class,
            action_set: self.actions.action_set.clone(),
            digital_actions: self.actions.digital.clone(),
        }
    }
}

fn default_max_devices() -> usize { MAX_TRACKED_DEVICES }
fn default_reference_slot() -> Option<usize> { Some(crate::input::HMD_SLOT) }
fn default_device_class() -> DeviceClass { DeviceClass::Controller }
fn default_action_set() -> String { DEFAULT_ACTION_SET.to_string() }
fn default_digital_actions() -> Vec<String> {
    StandardAction::ALL.iter().map(|a| a.path().to_string()).collect()
}
fn default_rate_hz() -> u32 { 90 }
