//! Controller button identifiers and bit masks
//!
//! Every physical button maps to exactly one bit of a 64-bit mask. Bit
//! positions follow the OpenVR button numbering so masks coming straight from
//! the runtime can be tested without translation:
//!
//! ```text
//!  bit  0  system (reserved)      bit  7  a
//!  bit  1  application menu       bit 31  proximity sensor
//!  bit  2  grip                   bit 32  axis0 (touchpad)
//!  bit  3..6 dpad l/u/r/d         bit 33  axis1 (trigger)
//!                                 bit 34..36 axis2..axis4
//! ```
//!
//! Combine buttons with bitwise OR to build a multi-button mask. See
//! [`DeviceStateCache`](super::DeviceStateCache) for how combined masks are
//! evaluated by the level and edge queries.

use tracing::warn;

/// Physical controller button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonId {
    System,
    ApplicationMenu,
    Grip,
    DPadLeft,
    DPadUp,
    DPadRight,
    DPadDown,
    A,
    ProximitySensor,
    Axis0,
    Axis1,
    Axis2,
    Axis3,
    Axis4,
}

impl ButtonId {
    /// Touchpad alias (first analog axis)
    pub const TOUCHPAD: ButtonId = ButtonId::Axis0;
    /// Trigger alias (second analog axis)
    pub const TRIGGER: ButtonId = ButtonId::Axis1;

    /// All buttons in bit order
    pub const ALL: [ButtonId; 14] = [
        ButtonId::System,
        ButtonId::ApplicationMenu,
        ButtonId::Grip,
        ButtonId::DPadLeft,
        ButtonId::DPadUp,
        ButtonId::DPadRight,
        ButtonId::DPadDown,
        ButtonId::A,
        ButtonId::ProximitySensor,
        ButtonId::Axis0,
        ButtonId::Axis1,
        ButtonId::Axis2,
        ButtonId::Axis3,
        ButtonId::Axis4,
    ];

    /// Bit index in the button mask
    pub const fn bit(self) -> u32 {
        match self {
            ButtonId::System => 0,
            ButtonId::ApplicationMenu => 1,
            ButtonId::Grip => 2,
            ButtonId::DPadLeft => 3,
            ButtonId::DPadUp => 4,
            ButtonId::DPadRight => 5,
            ButtonId::DPadDown => 6,
            ButtonId::A => 7,
            ButtonId::ProximitySensor => 31,
            ButtonId::Axis0 => 32,
            ButtonId::Axis1 => 33,
            ButtonId::Axis2 => 34,
            ButtonId::Axis3 => 35,
            ButtonId::Axis4 => 36,
        }
    }

    /// Single-bit mask for this button
    pub const fn mask(self) -> u64 {
        1u64 << self.bit()
    }

    /// Short name used in scenario files and logs
    pub fn name(self) -> &'static str {
        match self {
            ButtonId::System => "system",
            ButtonId::ApplicationMenu => "menu",
            ButtonId::Grip => "grip",
            ButtonId::DPadLeft => "dpad_left",
            ButtonId::DPadUp => "dpad_up",
            ButtonId::DPadRight => "dpad_right",
            ButtonId::DPadDown => "dpad_down",
            ButtonId::A => "a",
            ButtonId::ProximitySensor => "proximity",
            ButtonId::Axis0 => "touchpad",
            ButtonId::Axis1 => "trigger",
            ButtonId::Axis2 => "axis2",
            ButtonId::Axis3 => "axis3",
            ButtonId::Axis4 => "axis4",
        }
    }

    /// Parse a button name (case-insensitive, accepts `axis0`/`axis1` aliases)
    pub fn from_name(name: &str) -> Option<ButtonId> {
        let name = name.trim().to_lowercase();
        match name.as_str() {
            "axis0" => return Some(ButtonId::Axis0),
            "axis1" => return Some(ButtonId::Axis1),
            "application_menu" => return Some(ButtonId::ApplicationMenu),
            _ => {},
        }
        ButtonId::ALL.into_iter().find(|b| b.name() == name)
    }
}

/// Precomposed masks for common controls
pub mod button_mask {
    use super::ButtonId;

    pub const SYSTEM: u64 = ButtonId::System.mask();
    pub const APPLICATION_MENU: u64 = ButtonId::ApplicationMenu.mask();
    pub const GRIP: u64 = ButtonId::Grip.mask();
    pub const A: u64 = ButtonId::A.mask();
    pub const AXIS0: u64 = ButtonId::Axis0.mask();
    pub const AXIS1: u64 = ButtonId::Axis1.mask();
    pub const AXIS2: u64 = ButtonId::Axis2.mask();
    pub const AXIS3: u64 = ButtonId::Axis3.mask();
    pub const AXIS4: u64 = ButtonId::Axis4.mask();
    pub const TOUCHPAD: u64 = AXIS0;
    pub const TRIGGER: u64 = AXIS1;
    pub const DPAD: u64 = ButtonId::DPadLeft.mask()
        | ButtonId::DPadUp.mask()
        | ButtonId::DPadRight.mask()
        | ButtonId::DPadDown.mask();
}

/// Combine button names into a mask, skipping (and logging) unknown names
pub fn mask_from_names<S: AsRef<str>>(names: &[S]) -> u64 {
    names.iter().fold(0u64, |mask, name| match ButtonId::from_name(name.as_ref()) {
        Some(button) => mask | button.mask(),
        None => {
            warn!("Unknown button name: {:?}", name.as_ref());
            mask
        },
    })
}
