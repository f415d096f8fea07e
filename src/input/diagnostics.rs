//! Device diagnostics for troubleshooting tracking issues

use tracing::info;

use super::buttons::ButtonId;
use super::device_cache::{DeviceSnapshot, DeviceStateCache};
use super::pose::{DeviceClass, TrackingQuality};
use super::selector::{select, DeviceRelation, ReferenceFrame};

/// Print every connected slot of the cache
///
/// `name_of` supplies a friendly device name when the backend knows one.
pub fn print_device_diagnostics<F>(cache: &DeviceStateCache, name_of: F)
where
    F: Fn(usize) -> Option<String>,
{
    info!("=== Tracked Device Diagnostics ===");
    info!("Slots: {}", cache.len());

    let connected: Vec<&DeviceSnapshot> = cache.connected().collect();
    if connected.is_empty() {
        info!("⚠️  No tracked devices connected");
        info!("   Please check that the tracking runtime is running");
        return;
    }

    info!("📋 {} device(s) connected:", connected.len());
    info!("");

    for device in connected {
        let name = name_of(device.slot).unwrap_or_else(|| device.class.to_string());
        info!("🎮 Slot {}: {}", device.slot, name);
        info!("   {}", describe(device));

        let held = held_buttons(device);
        if !held.is_empty() {
            info!("   Pressed: {}", held.join(", "));
        }
    }

    info!("");
    for relation in [DeviceRelation::Leftmost, DeviceRelation::Rightmost] {
        match select(cache, relation, DeviceClass::Controller, ReferenceFrame::default()) {
            Some(slot) => info!("{} controller: slot {}", relation, slot),
            None => info!("{} controller: none", relation),
        }
    }
    info!("=== End Diagnostics ===");
}

/// One-line summary of a snapshot
pub fn describe(device: &DeviceSnapshot) -> String {
    let position = device.pose.translation.vector;
    let tracking = match device.tracking_quality {
        TrackingQuality::Normal => "tracking ok",
        TrackingQuality::OutOfRange => "out of range",
        TrackingQuality::Calibrating => "calibrating",
        TrackingQuality::Uninitialized => "uninitialized",
    };
    format!(
        "class={} pos=({:.2}, {:.2}, {:.2}) {}{}",
        device.class,
        position.x,
        position.y,
        position.z,
        tracking,
        if device.pose_valid { "" } else { " (pose invalid)" }
    )
}

fn held_buttons(device: &DeviceSnapshot) -> Vec<&'static str> {
    ButtonId::ALL
        .into_iter()
        .filter(|b| device.is_pressed(b.mask()))
        .map(ButtonId::name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::buttons::button_mask;
    use crate::input::testing::FakeTracking;

    #[test]
    fn test_describe_and_held_buttons() {
        let mut backend = FakeTracking::new(4);
        backend.connect(2, DeviceClass::Controller, [0.25, 1.0, -0.5]);
        backend.set_pressed(2, button_mask::TRIGGER | button_mask::GRIP);
        backend.set_quality(2, TrackingQuality::Calibrating);

        let mut cache = DeviceStateCache::new(4);
        cache.refresh(&backend, 1);

        let device = cache.device(2);
        let line = describe(device);
        assert!(line.starts_with("class=controller pos=(0.25, 1.00, -0.50)"));
        assert!(line.contains("calibrating"));
        assert_eq!(held_buttons(device), vec!["grip", "trigger"]);

        print_device_diagnostics(&cache, |_| None);
    }
}
