//! Scenario tests for the input context

use super::*;
use crate::error::InputError;

const GRIP: &str = "/actions/default/in/grabgrip";
const PINCH: &str = "/actions/default/in/grabpinch";

fn load(script: &str) -> InputContext<ScriptedBackend> {
    let scenario = Scenario::from_yaml(script).unwrap();
    scenario.validate(MAX_TRACKED_DEVICES).unwrap();
    InputContext::initialize(ScriptedBackend::new(scenario), ContextSettings::default()).unwrap()
}

/// Serve scripted frame `index` and tick
fn step(ctx: &mut InputContext<ScriptedBackend>, index: usize) -> FrameReport {
    ctx.backend_mut().seek(index);
    ctx.tick()
}

/// Run every scripted frame, collecting `observe` after each tick
fn run<T>(
    ctx: &mut InputContext<ScriptedBackend>,
    mut observe: impl FnMut(&InputContext<ScriptedBackend>) -> T,
) -> Vec<T> {
    let frames = ctx.backend().len();
    (0..frames)
        .map(|index| {
            step(ctx, index);
            observe(ctx)
        })
        .collect()
}

const TRIGGER_CLICK: &str = r#"
devices:
  - { slot: 0, class: hmd }
  - { slot: 1, class: controller }
frames:
  - devices:
      0: { position: [0.0, 1.7, 0.0] }
      1: { position: [0.2, 1.2, 0.4] }
  - devices:
      1: { position: [0.2, 1.2, 0.4], pressed: [trigger] }
  - devices:
      1: { position: [0.2, 1.2, 0.4], pressed: [trigger] }
  - devices:
      1: { position: [0.2, 1.2, 0.4], pressed: [] }
"#;

#[test]
fn test_before_first_tick_nothing_is_reported() {
    let ctx = load(TRIGGER_CLICK);
    assert!(!ctx.cache().is_pressed(1, button_mask::TRIGGER));
    assert_eq!(ctx.select(DeviceRelation::First), None);
    assert_eq!(ctx.select(DeviceRelation::Leftmost), None);
    assert!(!ctx.action_started(GRIP));
}

#[test]
fn test_trigger_edges_follow_press_sequence() {
    let mut ctx = load(TRIGGER_CLICK);
    let observed = run(&mut ctx, |ctx| {
        let cache = ctx.cache();
        (
            cache.is_pressed(1, button_mask::TRIGGER),
            cache.is_pressed_edge_down(1, button_mask::TRIGGER),
            cache.is_pressed_edge_up(1, button_mask::TRIGGER),
        )
    });

    assert_eq!(
        observed,
        vec![
            (false, false, false),
            (true, true, false),
            (true, false, false),
            (false, false, true),
        ]
    );
}

#[test]
fn test_last_frame_holds_without_new_edges() {
    let mut ctx = load(TRIGGER_CLICK);
    step(&mut ctx, 1);
    assert!(ctx.cache().is_pressed_edge_down(1, button_mask::TRIGGER));

    // Script ended on a press: further ticks hold the level only
    ctx.backend_mut().seek(2);
    for _ in 0..3 {
        ctx.tick();
        assert!(ctx.cache().is_pressed(1, button_mask::TRIGGER));
        assert!(!ctx.cache().is_pressed_edge_down(1, button_mask::TRIGGER));
    }
}

#[test]
fn test_backend_outage_keeps_stale_state() {
    let mut ctx = load(TRIGGER_CLICK);
    step(&mut ctx, 0);
    step(&mut ctx, 1);

    ctx.backend_mut().set_available(false);
    ctx.tick();
    let cache = ctx.cache();
    assert!(cache.is_pressed(1, button_mask::TRIGGER));
    assert!(!cache.is_pressed_edge_down(1, button_mask::TRIGGER));
    assert!(cache.device(1).connected);
    assert_eq!(cache.device(1).last_updated_frame, Some(3));
}

#[test]
fn test_backend_outage_hides_devices_from_selection() {
    let mut ctx = load(TRIGGER_CLICK);
    step(&mut ctx, 0);
    assert_eq!(ctx.select(DeviceRelation::First), Some(1));

    ctx.backend_mut().set_available(false);
    ctx.tick();
    ctx.tick();
    assert!(!ctx.cache().is_tracking_available());
    assert_eq!(ctx.select(DeviceRelation::First), None);
    assert_eq!(ctx.select(DeviceRelation::Leftmost), None);

    ctx.backend_mut().set_available(true);
    ctx.tick();
    assert_eq!(ctx.select(DeviceRelation::Leftmost), Some(1));
}

#[test]
fn test_whole_mask_edges() {
    let script = r#"
devices:
  - { slot: 1, class: controller }
frames:
  - devices:
      1: { touched: [grip] }
  - devices:
      1: { touched: [grip, trigger] }
  - devices:
      1: { touched: [trigger] }
  - devices:
      1: { touched: [] }
"#;
    let mut ctx = load(script);
    let both = button_mask::GRIP | button_mask::TRIGGER;
    let observed = run(&mut ctx, |ctx| {
        let cache = ctx.cache();
        (
            cache.is_touched(1, both),
            cache.is_touched_edge_down(1, both),
            cache.is_touched_edge_up(1, both),
            cache.is_touched_edge_down(1, button_mask::TRIGGER),
        )
    });

    // The combined mask only edges when the first bit arrives and the last
    // bit leaves; per-button masks still see the trigger edge
    assert_eq!(
        observed,
        vec![
            (true, true, false, false),
            (true, false, false, true),
            (true, false, false, false),
            (false, false, true, false),
        ]
    );
}

#[test]
fn test_grip_started_and_ended_once() {
    let script = r#"
devices:
  - { slot: 0, class: hmd }
action_origins:
  /actions/default/in/grabgrip: Left Grip
frames:
  - actions: { /actions/default/in/grabgrip: false }
  - actions: { /actions/default/in/grabgrip: true }
  - actions: { /actions/default/in/grabgrip: true }
  - actions: { /actions/default/in/grabgrip: false }
"#;
    let mut ctx = load(script);
    let observed = run(&mut ctx, |ctx| (ctx.action_started(GRIP), ctx.action_ended(GRIP)));

    assert_eq!(
        observed,
        vec![(false, false), (true, false), (false, false), (false, true)]
    );
    let handle = ctx.action(GRIP).unwrap();
    assert_eq!(ctx.tracker().state(handle).unwrap().origin_name, "Left Grip");
    assert!(!ctx.action_started(PINCH));
}

#[test]
fn test_action_changes_are_reported_in_registration_order() {
    let script = r#"
frames:
  - actions:
      /actions/default/in/grabpinch: true
      /actions/default/in/grabgrip: true
"#;
    let mut ctx = load(script);
    let report = step(&mut ctx, 0);

    let paths: Vec<&str> = report.action_changes.iter().map(|c| c.path.as_str()).collect();
    assert_eq!(paths, vec![GRIP, PINCH]);
    assert!(report.action_changes.iter().all(|c| c.active));
    assert!(report
        .action_changes
        .iter()
        .all(|c| c.origin_name == UNKNOWN_ORIGIN));
}

#[test]
fn test_controllers_either_side_of_headset() {
    let script = r#"
devices:
  - { slot: 0, class: hmd }
  - { slot: 4, class: controller }
  - { slot: 7, class: controller }
frames:
  - devices:
      0: { position: [0.0, 0.0, 0.0] }
      4: { position: [1.0, 0.0, 0.0] }
      7: { position: [-1.0, 0.0, 0.0] }
"#;
    let mut ctx = load(script);
    step(&mut ctx, 0);

    assert_eq!(ctx.select(DeviceRelation::Leftmost), Some(7));
    assert_eq!(ctx.select(DeviceRelation::FarthestRight), Some(4));
    assert_eq!(ctx.select(DeviceRelation::Rightmost), Some(4));
    assert_eq!(ctx.select(DeviceRelation::FarthestLeft), Some(7));
    assert_eq!(ctx.select(DeviceRelation::First), Some(4));
}

#[test]
fn test_absolute_reference_ignores_headset_pose() {
    let script = r#"
devices:
  - { slot: 0, class: hmd }
  - { slot: 1, class: controller }
  - { slot: 2, class: controller }
frames:
  - devices:
      0: { position: [0.0, 1.7, 0.0], rotation: [0.0, 180.0, 0.0] }
      1: { position: [-0.5, 1.0, 0.5] }
      2: { position: [0.5, 1.0, 0.5] }
"#;
    let scenario = Scenario::from_yaml(script).unwrap();
    let settings = ContextSettings {
        reference: ReferenceFrame::Absolute,
        ..ContextSettings::default()
    };
    let mut ctx = InputContext::initialize(ScriptedBackend::new(scenario), settings).unwrap();
    ctx.tick();

    assert_eq!(ctx.select(DeviceRelation::Leftmost), Some(1));
    // Relative to the turned headset the sides swap
    let relative = select(
        ctx.cache(),
        DeviceRelation::Leftmost,
        DeviceClass::Controller,
        ReferenceFrame::Device(HMD_SLOT),
    );
    assert_eq!(relative, Some(2));
}

#[test]
fn test_no_controllers_selects_nothing() {
    let script = r#"
devices:
  - { slot: 0, class: hmd }
  - { slot: 1, class: generic_tracker }
frames:
  - devices:
      0: { position: [0.0, 1.7, 0.0] }
      1: { position: [-1.0, 1.0, 0.0] }
"#;
    let mut ctx = load(script);
    ctx.tick();
    assert_eq!(ctx.select(DeviceRelation::Leftmost), None);
    assert_eq!(ctx.select(DeviceRelation::First), None);
}

#[test]
fn test_registering_twice_returns_same_handle() {
    let mut backend = ScriptedBackend::new(Scenario::default());
    let mut tracker = ActionTracker::initialize(&backend).unwrap();
    let first = tracker.register_action(&mut backend, GRIP).unwrap();
    let second = tracker.register_action(&mut backend, GRIP).unwrap();
    let other = tracker.register_action(&mut backend, PINCH).unwrap();
    assert_eq!(first, second);
    assert_ne!(first, other);
}

#[test]
fn test_unavailable_actions_report_once() {
    let scenario = Scenario {
        available: false,
        ..Scenario::default()
    };
    let mut backend = ScriptedBackend::new(scenario);
    assert_eq!(
        ActionTracker::initialize(&backend).unwrap_err(),
        InputError::BackendUnavailable { subsystem: "action" }
    );

    let mut tracker = ActionTracker::inert();
    assert!(tracker.register_action(&mut backend, GRIP).is_err());
    assert!(tracker.refresh_all(&mut backend, 1).is_empty());
}

#[test]
fn test_demo_walkthrough() {
    let mut ctx = InputContext::initialize(
        ScriptedBackend::new(Scenario::demo().unwrap()),
        ContextSettings::default(),
    )
    .unwrap();

    let observed = run(&mut ctx, |ctx| {
        (
            ctx.cache().is_pressed_edge_down(2, button_mask::TRIGGER),
            ctx.action_started(GRIP),
            ctx.action_ended(GRIP),
            ctx.select(DeviceRelation::Leftmost),
            ctx.select(DeviceRelation::Rightmost),
        )
    });

    let trigger_down: Vec<bool> = observed.iter().map(|o| o.0).collect();
    assert_eq!(trigger_down, vec![false, true, false, false, false, false, false, false]);

    let grip_started: Vec<usize> = (0..observed.len()).filter(|&i| observed[i].1).collect();
    let grip_ended: Vec<usize> = (0..observed.len()).filter(|&i| observed[i].2).collect();
    assert_eq!(grip_started, vec![2]);
    assert_eq!(grip_ended, vec![4]);

    // Hands as seen from the headset; it turns around at index 5 and the
    // right controller drops out at index 7
    assert_eq!(observed[0].3, Some(1));
    assert_eq!(observed[0].4, Some(2));
    assert_eq!(observed[5].3, Some(2));
    assert_eq!(observed[5].4, Some(1));
    assert_eq!(observed[7].3, Some(1));
    assert_eq!(observed[7].4, Some(1));

    let right = ctx.cache().device(2);
    assert!(!right.connected);
    assert!(!right.has_tracking());
    assert_eq!(ctx.backend().device_name(2), Some("Right Controller"));
}
