//! End-to-end menu flows through the public API: config file on disk,
//! action building, cursor reconciliation and the controller.

use std::fs;
use std::time::{Duration, Instant};

use juhradial_overlay::actions::ActionKind;
use juhradial_overlay::config::load_shared_config;
use juhradial_overlay::controller::{Controller, EffectSink};
use juhradial_overlay::cursor::{CursorPosition, CursorProbe, CursorTracker, ScreenBounds};
use juhradial_overlay::dbus::{HapticEvent, OverlayEvent, BUTTON_LEFT};
use juhradial_overlay::desktop::Desktop;
use juhradial_overlay::geometry::{subitem_center, Monitor, WINDOW_SIZE};
use juhradial_overlay::overlay::OverlayEffect;

/// GNOME-like probe: the extension reports a fixed position
struct StaticProbe {
    position: CursorPosition,
}

impl CursorProbe for StaticProbe {
    fn refresh_monitors(&mut self) {}
    fn hyprland_position(&mut self) -> Option<CursorPosition> {
        None
    }
    fn gnome_position(&mut self) -> Option<CursorPosition> {
        Some(self.position)
    }
    fn xwayland_position(&mut self) -> Option<CursorPosition> {
        None
    }
    fn xwayland_synced_position(&mut self) -> Option<CursorPosition> {
        None
    }
    fn monitor_at(&mut self, _x: i32, _y: i32) -> Monitor {
        Monitor::fallback()
    }
    fn screen_bounds(&mut self) -> ScreenBounds {
        ScreenBounds::default()
    }
}

#[derive(Default)]
struct Recorded(Vec<OverlayEffect>);

impl EffectSink for Recorded {
    fn apply(&mut self, effect: OverlayEffect) {
        self.0.push(effect);
    }
}

fn gnome() -> Desktop {
    Desktop {
        hyprland: false,
        gnome: true,
        cosmic: false,
        xwayland: true,
    }
}

fn local(dx: f64, dy: f64) -> OverlayEvent {
    OverlayEvent::PointerMoved {
        x: WINDOW_SIZE / 2 + dx as i32,
        y: WINDOW_SIZE / 2 + dy as i32,
    }
}

#[test]
fn easy_switch_host_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r#"{"theme": "nord", "radial_menu": {"easy_switch_shortcuts": true}}"#,
    )
    .unwrap();

    let shared = load_shared_config(&path).unwrap();
    let tracker = CursorTracker::new(
        gnome(),
        StaticProbe {
            position: CursorPosition::new(800, 450),
        },
    );
    let mut controller = Controller::new(shared, tracker, Recorded::default());
    let t0 = Instant::now();

    // Tap: the GNOME helper overrides the stale daemon position
    controller.handle(OverlayEvent::Show { x: 1, y: 1 }, t0);
    controller.handle(OverlayEvent::Hide, t0 + Duration::from_millis(120));
    assert!(controller.menu().is_polling());
    assert_eq!(controller.menu().center(), CursorPosition::new(800, 450));

    // South-west slot holds the Easy-Switch submenu
    controller.handle(local(-70.0, 70.0), t0);
    assert_eq!(controller.menu().submenu(), Some(5));

    let (ix, iy) = subitem_center(5, 1, 3);
    controller.handle(local(ix, iy), t0);
    assert_eq!(controller.menu().subitem(), Some(1));

    controller.handle(
        OverlayEvent::PointerPressed { button: BUTTON_LEFT },
        t0 + Duration::from_secs(1),
    );

    let effects = &controller.sink().0;
    assert_eq!(effects[0], OverlayEffect::Present { x: 800, y: 450 });
    assert_eq!(effects[1], OverlayEffect::Haptic(HapticEvent::MenuAppear));
    assert_eq!(
        &effects[effects.len() - 3..],
        &[
            OverlayEffect::Haptic(HapticEvent::Confirm),
            OverlayEffect::Execute(ActionKind::EasySwitch("1".to_string())),
            OverlayEffect::Dismiss,
        ]
    );
    assert!(!controller.menu().is_visible());
}

#[test]
fn hold_release_with_custom_slices() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r#"{"radial_menu": {"slices": [
            {"label": "Term", "type": "exec", "command": "konsole",
             "icon": "utilities-terminal-symbolic"},
            {"label": "Docs", "type": "url", "command": "https://docs.rs"}
        ]}}"#,
    )
    .unwrap();

    let shared = load_shared_config(&path).unwrap();
    let tracker = CursorTracker::new(
        gnome(),
        StaticProbe {
            position: CursorPosition::new(100, 100),
        },
    );
    let mut controller = Controller::new(shared, tracker, Recorded::default());
    let t0 = Instant::now();

    controller.handle(OverlayEvent::Show { x: 100, y: 100 }, t0);
    controller.handle(OverlayEvent::CursorMoved { dx: 80, dy: -80 }, t0);
    controller.handle(OverlayEvent::Hide, t0 + Duration::from_millis(700));

    assert_eq!(
        controller.sink().0,
        vec![
            OverlayEffect::Present { x: 100, y: 100 },
            OverlayEffect::Haptic(HapticEvent::MenuAppear),
            OverlayEffect::Haptic(HapticEvent::SliceChange),
            OverlayEffect::Highlight { slice: Some(1), subitem: None },
            OverlayEffect::Haptic(HapticEvent::Confirm),
            OverlayEffect::Execute(ActionKind::Url("https://docs.rs".to_string())),
            OverlayEffect::Dismiss,
        ]
    );
}
