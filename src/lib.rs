//! JuhRadial MX Overlay Library
//!
//! Public API for testing and integration.

pub mod actions;
pub mod config;
pub mod controller;
pub mod cursor;
pub mod dbus;
pub mod desktop;
pub mod geometry;
pub mod overlay;
pub mod themes;

/// Re-export commonly used types
pub use actions::{ActionError, ActionKind, ActionRunner, MenuAction, SubAction};
pub use config::{
    load_shared_config, new_shared_config, Config, ConfigError, ConfigWatcher, SharedConfig,
};
pub use controller::{Controller, DbusEffects, EffectSink};
pub use cursor::{
    get_screen_bounds, CursorPosition, CursorProbe, CursorTracker, MenuPlacement, ScreenBounds,
    SystemProbe,
};
pub use dbus::{init_overlay_service, HapticEvent, OverlayEvent, OverlayService, DBUS_PATH};
pub use desktop::Desktop;
pub use geometry::{Monitor, MENU_RADIUS, SLICE_COUNT, WINDOW_SIZE};
pub use overlay::{OverlayEffect, RadialMenu};
pub use themes::{resolve_theme, Theme, THEMES};
