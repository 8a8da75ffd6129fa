//! Hyprland IPC cursor and monitor queries
//!
//! Talks to the compositor request socket at
//! `$XDG_RUNTIME_DIR/hypr/$HYPRLAND_INSTANCE_SIGNATURE/.socket.sock`.
//! On Hyprland, XWayland windows share the compositor's global coordinate
//! space, so positions are used as-is.

use serde::Deserialize;
use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use super::{output_with_timeout, parse_xy, CursorPosition, ScreenBounds};
use crate::geometry::Monitor;

/// Read/write timeout on the IPC socket
const IPC_TIMEOUT: Duration = Duration::from_millis(100);

/// Runtime dir used when `XDG_RUNTIME_DIR` is unset
const DEFAULT_RUNTIME_DIR: &str = "/run/user/1000";

/// One entry of `j/monitors`
#[derive(Debug, Clone, Deserialize)]
pub struct HyprMonitor {
    #[serde(default = "default_monitor_name")]
    pub name: String,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default = "default_width")]
    pub width: i32,
    #[serde(default = "default_height")]
    pub height: i32,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub focused: bool,
}

fn default_monitor_name() -> String { "?".to_string() }
fn default_width() -> i32 { 1920 }
fn default_height() -> i32 { 1080 }
fn default_scale() -> f64 { 1.0 }

impl HyprMonitor {
    fn logical_size(&self) -> (f64, f64) {
        let scale = if self.scale > 0.0 { self.scale } else { 1.0 };
        (self.width as f64 / scale, self.height as f64 / scale)
    }

    fn contains(&self, x: i32, y: i32) -> bool {
        let (w, h) = self.logical_size();
        let (x, y) = (x as f64, y as f64);
        let (mx, my) = (self.x as f64, self.y as f64);
        mx <= x && x < mx + w && my <= y && y < my + h
    }

    /// Monitor rectangle in logical pixels (accounts for scaling and rotation)
    pub fn logical(&self) -> Monitor {
        let (w, h) = self.logical_size();
        Monitor {
            name: self.name.clone(),
            x: self.x,
            y: self.y,
            width: w as i32,
            height: h as i32,
        }
    }
}

/// Hyprland IPC error
#[derive(Debug)]
pub enum HyprlandError {
    /// Socket connect/read/write failure
    IoError(std::io::Error),
    /// Response could not be parsed
    ParseError(String),
}

impl std::fmt::Display for HyprlandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HyprlandError::IoError(e) => write!(f, "Hyprland IPC I/O error: {}", e),
            HyprlandError::ParseError(msg) => write!(f, "Hyprland IPC parse error: {}", msg),
        }
    }
}

impl std::error::Error for HyprlandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HyprlandError::IoError(e) => Some(e),
            HyprlandError::ParseError(_) => None,
        }
    }
}

/// Hyprland IPC client with a monitor layout cache
#[derive(Debug)]
pub struct HyprlandIpc {
    socket_path: PathBuf,
    monitors: Option<Vec<HyprMonitor>>,
}

impl HyprlandIpc {
    /// Build a client for the running Hyprland instance
    ///
    /// Returns `None` when `HYPRLAND_INSTANCE_SIGNATURE` is not set.
    pub fn from_env() -> Option<Self> {
        let sig = std::env::var("HYPRLAND_INSTANCE_SIGNATURE").ok()?;
        let runtime = std::env::var("XDG_RUNTIME_DIR")
            .unwrap_or_else(|_| DEFAULT_RUNTIME_DIR.to_string());
        Some(Self::with_socket(socket_path_for(&runtime, &sig)))
    }

    /// Build a client for an explicit socket path
    pub fn with_socket(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            monitors: None,
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Send one request and collect the full response
    ///
    /// Reads until the compositor closes the socket or the read times out.
    pub fn request(&self, command: &[u8]) -> Result<String, HyprlandError> {
        let mut stream = UnixStream::connect(&self.socket_path).map_err(HyprlandError::IoError)?;
        stream
            .set_read_timeout(Some(IPC_TIMEOUT))
            .map_err(HyprlandError::IoError)?;
        stream
            .set_write_timeout(Some(IPC_TIMEOUT))
            .map_err(HyprlandError::IoError)?;

        stream.write_all(command).map_err(HyprlandError::IoError)?;

        let mut response = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            match stream.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => response.extend_from_slice(&chunk[..n]),
                Err(e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    break
                }
                Err(e) => return Err(HyprlandError::IoError(e)),
            }
        }

        String::from_utf8(response)
            .map(|s| s.trim().to_string())
            .map_err(|e| HyprlandError::ParseError(e.to_string()))
    }

    /// Current global cursor position
    ///
    /// Uses the IPC socket, falling back to `hyprctl cursorpos`.
    pub fn cursor_position(&self) -> Option<CursorPosition> {
        match self.request(b"cursorpos") {
            Ok(response) => {
                if let Some(pos) = parse_xy(&response) {
                    tracing::debug!(
                        x = pos.x,
                        y = pos.y,
                        "Got cursor position via Hyprland socket"
                    );
                    return Some(pos);
                }
            }
            Err(e) => tracing::debug!(error = %e, "Hyprland socket query failed"),
        }

        let output = output_with_timeout(Command::new("hyprctl").arg("cursorpos"), IPC_TIMEOUT)?;

        let pos = parse_xy(&String::from_utf8_lossy(&output.stdout))?;
        tracing::debug!(x = pos.x, y = pos.y, "Got cursor position via Hyprland (subprocess)");
        Some(pos)
    }

    /// Re-read the monitor layout
    ///
    /// A failed refresh keeps the previous layout; with no previous layout
    /// the cache becomes empty so lookups fall through to the default.
    pub fn refresh_monitors(&mut self) {
        let result = self.request(b"j/monitors").and_then(|response| {
            serde_json::from_str::<Vec<HyprMonitor>>(&response)
                .map_err(|e| HyprlandError::ParseError(e.to_string()))
        });

        match result {
            Ok(monitors) => {
                tracing::debug!(count = monitors.len(), "Refreshed Hyprland monitors");
                self.monitors = Some(monitors);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to refresh Hyprland monitors");
                if self.monitors.is_none() {
                    self.monitors = Some(Vec::new());
                }
            }
        }
    }

    /// Monitor containing a global point (refreshes the cache on first use)
    pub fn monitor_at(&mut self, x: i32, y: i32) -> Monitor {
        if self.monitors.is_none() {
            self.refresh_monitors();
        }
        monitor_at(self.monitors.as_deref().unwrap_or(&[]), x, y)
    }

    /// Bounding box of all monitors
    pub fn screen_bounds(&mut self) -> Option<ScreenBounds> {
        if self.monitors.is_none() {
            self.refresh_monitors();
        }
        bounding_box(self.monitors.as_deref().unwrap_or(&[]))
    }
}

/// Request socket path for a Hyprland instance
pub fn socket_path_for(runtime_dir: &str, signature: &str) -> PathBuf {
    PathBuf::from(runtime_dir)
        .join("hypr")
        .join(signature)
        .join(".socket.sock")
}

/// Find which monitor contains a global point
///
/// Falls back to the focused monitor, then to a 1920x1080 placeholder.
pub fn monitor_at(monitors: &[HyprMonitor], x: i32, y: i32) -> Monitor {
    monitors
        .iter()
        .find(|m| m.contains(x, y))
        .or_else(|| monitors.iter().find(|m| m.focused))
        .map(HyprMonitor::logical)
        .unwrap_or_else(Monitor::fallback)
}

/// Bounding box of a monitor layout in logical pixels
pub fn bounding_box(monitors: &[HyprMonitor]) -> Option<ScreenBounds> {
    let (width, height) = monitors.iter().fold((0, 0), |(w, h), m| {
        let logical = m.logical();
        (w.max(logical.x + logical.width), h.max(logical.y + logical.height))
    });

    if width > 0 && height > 0 {
        Some(ScreenBounds { width, height })
    } else {
        None
    }
}
