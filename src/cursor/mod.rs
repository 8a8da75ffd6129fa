//! Cursor position query module
//!
//! Provides cross-compositor cursor position retrieval for the overlay.
//! Supports Hyprland (IPC socket), GNOME (cursor helper extension over D-Bus),
//! COSMIC and other XWayland sessions (XQueryPointer / xdotool).
//!
//! The daemon's `MenuRequested` coordinates can be stale by the time the
//! overlay reacts, so [`CursorTracker::menu_position`] re-queries the
//! compositor before the menu is placed.

pub mod gnome;
pub mod hyprland;
pub mod xwayland;

use std::io::Read;
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};

use crate::desktop::Desktop;
use crate::geometry::{clamp_to_monitor, Monitor};

use gnome::GnomeCursor;
use hyprland::HyprlandIpc;
use xwayland::XPointer;

/// Screen dimensions used for the screen-center fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenBounds {
    pub width: i32,
    pub height: i32,
}

impl Default for ScreenBounds {
    fn default() -> Self {
        // Default to common resolution, will be queried at runtime
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

impl ScreenBounds {
    pub fn center(&self) -> CursorPosition {
        CursorPosition::new(self.width / 2, self.height / 2)
    }
}

/// Cursor position with coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CursorPosition {
    pub x: i32,
    pub y: i32,
}

impl CursorPosition {
    /// Create a new cursor position
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Parse `"x, y"` or `"(x, y)"` into a position
pub fn parse_xy(text: &str) -> Option<CursorPosition> {
    let text = text.trim().trim_start_matches('(').trim_end_matches(')');
    let mut parts = text.split(',');
    let x = parts.next()?.trim().parse().ok()?;
    let y = parts.next()?.trim().parse().ok()?;
    Some(CursorPosition::new(x, y))
}

/// Run a helper program, killing it when it outlives `timeout`
///
/// Returns `None` when the program cannot be started, times out or exits
/// unsuccessfully. Only suited to programs with short output.
pub fn output_with_timeout(command: &mut Command, timeout: Duration) -> Option<Output> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .ok()?;

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() < deadline => {
                std::thread::sleep(Duration::from_millis(2))
            }
            Ok(None) => {
                tracing::debug!(?command, ?timeout, "Helper program timed out");
                let _ = child.kill();
                let _ = child.wait();
                return None;
            }
            Err(e) => {
                tracing::debug!(?command, error = %e, "Helper program wait failed");
                return None;
            }
        }
    };

    if !status.success() {
        return None;
    }

    let mut stdout = Vec::new();
    if let Some(mut pipe) = child.stdout.take() {
        pipe.read_to_end(&mut stdout).ok()?;
    }
    Some(Output {
        status,
        stdout,
        stderr: Vec::new(),
    })
}

/// Where the menu ends up after reconciliation
#[derive(Debug, Clone, PartialEq)]
pub struct MenuPlacement {
    pub x: i32,
    pub y: i32,
    /// Monitor the menu was clamped to (Hyprland only)
    pub monitor: Option<Monitor>,
}

/// Raw access to every cursor backend
///
/// Each method returns `None` when its backend is unavailable; callers decide
/// which backends apply to the current desktop.
pub trait CursorProbe {
    /// Re-read the compositor's monitor layout
    fn refresh_monitors(&mut self);
    fn hyprland_position(&mut self) -> Option<CursorPosition>;
    fn gnome_position(&mut self) -> Option<CursorPosition>;
    fn xwayland_position(&mut self) -> Option<CursorPosition>;
    /// XWayland position after forcing the server to resync the pointer
    fn xwayland_synced_position(&mut self) -> Option<CursorPosition>;
    /// Monitor containing a global point
    fn monitor_at(&mut self, x: i32, y: i32) -> Monitor;
    fn screen_bounds(&mut self) -> ScreenBounds;
}

/// Probe backed by the real compositor, D-Bus and X11
pub struct SystemProbe {
    hyprland: Option<HyprlandIpc>,
    gnome: GnomeCursor,
    x11: XPointer,
    bounds: Option<ScreenBounds>,
}

impl SystemProbe {
    pub fn new() -> Self {
        Self {
            hyprland: HyprlandIpc::from_env(),
            gnome: GnomeCursor::new(),
            x11: XPointer::new(),
            bounds: None,
        }
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl CursorProbe for SystemProbe {
    fn refresh_monitors(&mut self) {
        if let Some(ipc) = self.hyprland.as_mut() {
            ipc.refresh_monitors();
        }
    }

    fn hyprland_position(&mut self) -> Option<CursorPosition> {
        self.hyprland.as_ref()?.cursor_position()
    }

    fn gnome_position(&mut self) -> Option<CursorPosition> {
        self.gnome.cursor_position()
    }

    fn xwayland_position(&mut self) -> Option<CursorPosition> {
        self.x11.query()
    }

    fn xwayland_synced_position(&mut self) -> Option<CursorPosition> {
        self.x11.query_synced()
    }

    fn monitor_at(&mut self, x: i32, y: i32) -> Monitor {
        match self.hyprland.as_mut() {
            Some(ipc) => ipc.monitor_at(x, y),
            None => Monitor::fallback(),
        }
    }

    fn screen_bounds(&mut self) -> ScreenBounds {
        if let Some(bounds) = self.bounds {
            return bounds;
        }
        let bounds = self
            .hyprland
            .as_mut()
            .and_then(HyprlandIpc::screen_bounds)
            .unwrap_or_else(get_screen_bounds);
        self.bounds = Some(bounds);
        bounds
    }
}

/// Picks the right backends for the running desktop
pub struct CursorTracker<P: CursorProbe> {
    desktop: Desktop,
    probe: P,
}

impl<P: CursorProbe> CursorTracker<P> {
    pub fn new(desktop: Desktop, probe: P) -> Self {
        Self { desktop, probe }
    }

    pub fn desktop(&self) -> Desktop {
        self.desktop
    }

    pub fn probe_mut(&mut self) -> &mut P {
        &mut self.probe
    }

    /// Reconcile the daemon-reported position with a fresh compositor query
    ///
    /// Order: Hyprland (also refreshes the monitor cache), GNOME, then the
    /// synced XWayland query on COSMIC. Each fresh reading replaces the
    /// previous one. On Hyprland the result is clamped to the monitor under it.
    pub fn menu_position(&mut self, x: i32, y: i32) -> MenuPlacement {
        let (mut x, mut y) = (x, y);

        if self.desktop.hyprland {
            self.probe.refresh_monitors();
            if let Some(pos) = self.probe.hyprland_position() {
                tracing::debug!(x = pos.x, y = pos.y, "Hyprland fresh cursor position");
                (x, y) = (pos.x, pos.y);
            }
        }

        if self.desktop.gnome {
            if let Some(pos) = self.probe.gnome_position() {
                tracing::debug!(x = pos.x, y = pos.y, "GNOME fresh cursor position");
                (x, y) = (pos.x, pos.y);
            }
        }

        if self.desktop.cosmic && self.desktop.xwayland {
            if let Some(pos) = self.probe.xwayland_synced_position() {
                tracing::debug!(x = pos.x, y = pos.y, "COSMIC synced cursor position");
                (x, y) = (pos.x, pos.y);
            }
        }

        if !self.desktop.hyprland {
            return MenuPlacement { x, y, monitor: None };
        }

        let monitor = self.probe.monitor_at(x, y);
        tracing::info!(
            monitor = %monitor.name,
            width = monitor.width,
            height = monitor.height,
            mx = monitor.x,
            my = monitor.y,
            "Menu monitor"
        );
        let (x, y) = clamp_to_monitor(x, y, &monitor);
        MenuPlacement {
            x,
            y,
            monitor: Some(monitor),
        }
    }

    /// Current cursor position for hover polling
    ///
    /// Chain: Hyprland, GNOME, XWayland, then a screen-center guess.
    pub fn current_position(&mut self) -> CursorPosition {
        if self.desktop.hyprland {
            if let Some(pos) = self.probe.hyprland_position() {
                return pos;
            }
        }

        if self.desktop.gnome {
            if let Some(pos) = self.probe.gnome_position() {
                return pos;
            }
        }

        if self.desktop.xwayland {
            if let Some(pos) = self.probe.xwayland_position() {
                return pos;
            }
        }

        let center = self.probe.screen_bounds().center();
        tracing::debug!(
            x = center.x,
            y = center.y,
            "No cursor backend answered, using screen center"
        );
        center
    }
}

/// Get screen bounds without a compositor-specific backend
///
/// Tries xrandr (multi-monitor), then xdotool, then 1920x1080.
pub fn get_screen_bounds() -> ScreenBounds {
    // Try xrandr (supports multi-monitor, works on X11 and XWayland)
    if let Some(bounds) = get_screen_via_xrandr() {
        return bounds;
    }

    // Fallback to xdotool (single monitor)
    if let Some(bounds) = get_screen_via_xdotool() {
        return bounds;
    }

    tracing::warn!("Could not query screen bounds, using default 1920x1080");
    ScreenBounds::default()
}

/// Query screen bounds via xrandr (for multi-monitor support)
fn get_screen_via_xrandr() -> Option<ScreenBounds> {
    let output = Command::new("xrandr").output().ok()?;

    if !output.status.success() {
        return None;
    }

    parse_xrandr_current(&String::from_utf8_lossy(&output.stdout))
}

/// Parse the `current W x H` part of xrandr's first line
///
/// Example: "Screen 0: minimum 16 x 16, current 4480 x 1440, maximum 32767 x 32767"
pub fn parse_xrandr_current(output: &str) -> Option<ScreenBounds> {
    let line = output
        .lines()
        .find(|line| line.starts_with("Screen") && line.contains("current"))?;
    let after_current = &line[line.find("current")? + "current".len()..];
    let parts: Vec<&str> = after_current.split(',').next()?.split_whitespace().collect();

    if parts.len() >= 3 && parts[1] == "x" {
        let width = parts[0].parse().ok()?;
        let height = parts[2].parse().ok()?;
        tracing::debug!(width, height, "Got screen bounds via xrandr");
        return Some(ScreenBounds { width, height });
    }

    None
}

/// Query screen bounds via xdotool (fallback, single monitor only)
fn get_screen_via_xdotool() -> Option<ScreenBounds> {
    let output = Command::new("xdotool")
        .args(["getdisplaygeometry"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut parts = stdout.split_whitespace();
    let width = parts.next()?.parse().ok()?;
    let height = parts.next()?.parse().ok()?;
    Some(ScreenBounds { width, height })
}
