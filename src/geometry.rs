//! Radial menu geometry and hit-testing
//!
//! Slices are numbered clockwise starting at the top:
//! N=0, NE=1, E=2, SE=3, S=4, SW=5, W=6, NW=7.
//! All offsets are screen pixels relative to the menu center, with +y pointing down.

/// Outer radius of the slice ring in pixels
pub const MENU_RADIUS: i32 = 150;

/// Drop shadow offset drawn around the ring
pub const SHADOW_OFFSET: i32 = 12;

/// Dead zone radius in the middle of the menu (no slice selected)
pub const CENTER_ZONE_RADIUS: i32 = 45;

/// Radius at which slice icons sit
pub const ICON_ZONE_RADIUS: i32 = 100;

/// Extra space reserved for submenu items beyond the main ring
pub const SUBMENU_EXTEND: i32 = 80;

/// Side length of the square overlay window
pub const WINDOW_SIZE: i32 = (MENU_RADIUS + SHADOW_OFFSET + SUBMENU_EXTEND) * 2;

/// Number of slices in the ring
pub const SLICE_COUNT: usize = 8;

/// Angular width of one slice in degrees
pub const SLICE_ANGLE: f64 = 360.0 / SLICE_COUNT as f64;

/// Extra reach beyond the ring while hovering in toggle mode
pub const TOGGLE_HOVER_SLACK: i32 = 60;

/// Radius of the arc submenu items are laid out on
pub const SUBMENU_RADIUS: i32 = MENU_RADIUS + 45;

/// Hit radius around a submenu item center
pub const SUBITEM_HIT_RADIUS: f64 = 32.0;

/// Angular distance between neighbouring submenu items in degrees
pub const SUBMENU_SPREAD_DEG: f64 = 15.0;

/// A monitor rectangle in logical (scaled) pixels
#[derive(Debug, Clone, PartialEq)]
pub struct Monitor {
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Monitor {
    /// Placeholder used when no compositor reports monitor layout
    pub fn fallback() -> Self {
        Self {
            name: "fallback".to_string(),
            x: 0,
            y: 0,
            width: 1920,
            height: 1080,
        }
    }
}

/// Angle of an offset in degrees, 0 at the top, growing clockwise, in `[0, 360)`
pub fn compass_angle(dx: f64, dy: f64) -> f64 {
    let angle = dx.atan2(-dy).to_degrees();
    if angle < 0.0 {
        angle + 360.0
    } else {
        angle
    }
}

/// Find the slice under an offset from the menu center
///
/// Returns `None` inside the dead zone (`distance < inner`) or beyond the
/// outer reach (`distance > outer`). Each slice is centered on its compass
/// direction, so slice 0 covers -22.5°..22.5° around the top.
pub fn slice_at(dx: f64, dy: f64, inner: f64, outer: f64) -> Option<usize> {
    let distance = dx.hypot(dy);
    if distance < inner || distance > outer {
        return None;
    }

    let angle = compass_angle(dx, dy);
    Some(((angle + SLICE_ANGLE / 2.0) / SLICE_ANGLE) as usize % SLICE_COUNT)
}

/// Center of submenu item `index` out of `count`, relative to the menu center
///
/// Items fan out around the parent slice direction on `SUBMENU_RADIUS`.
pub fn subitem_center(slice: usize, index: usize, count: usize) -> (f64, f64) {
    let parent_angle = slice as f64 * SLICE_ANGLE - 90.0;
    let offset = (index as f64 - (count as f64 - 1.0) / 2.0) * SUBMENU_SPREAD_DEG;
    let angle = (parent_angle + offset).to_radians();
    let radius = SUBMENU_RADIUS as f64;
    (radius * angle.cos(), radius * angle.sin())
}

/// Find the submenu item under an offset from the menu center
///
/// The first item whose center is closer than `SUBITEM_HIT_RADIUS` wins.
pub fn subitem_at(slice: usize, count: usize, dx: f64, dy: f64) -> Option<usize> {
    (0..count).find(|&i| {
        let (ix, iy) = subitem_center(slice, i, count);
        (dx - ix).hypot(dy - iy) < SUBITEM_HIT_RADIUS
    })
}

/// Clamp a menu center so the whole overlay window stays on `monitor`
pub fn clamp_to_monitor(x: i32, y: i32, monitor: &Monitor) -> (i32, i32) {
    let half = WINDOW_SIZE / 2;
    let x = x.min(monitor.x + monitor.width - half).max(monitor.x + half);
    let y = y.min(monitor.y + monitor.height - half).max(monitor.y + half);
    (x, y)
}
