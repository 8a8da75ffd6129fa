//! D-Bus IPC for the JuhRadial MX overlay
//!
//! Two surfaces live here.
//!
//! ## Daemon: org.kde.juhradialmx.Daemon (client side)
//!
//! ### Signals consumed:
//! - `MenuRequested(x: i32, y: i32)` - Gesture button pressed at screen position
//! - `HideMenu()` - Gesture button released
//! - `CursorMoved(dx: i32, dy: i32)` - Pointer offset from the menu center while held
//!
//! ### Methods called:
//! - `TriggerHaptic(event: String)` - Haptic pulse (menu_appear, slice_change, confirm, invalid)
//! - `SetHost(index: u8) -> bool` - Easy-Switch host change
//! - `ReloadConfig()` - Ask the daemon to re-read config.json
//!
//! ## Overlay: org.kde.juhradialmx.Overlay (served)
//!
//! ### Methods:
//! - `PointerMoved(x: i32, y: i32)` - Window-local pointer position from the renderer
//! - `PointerPressed(button: u32)` - Mouse click inside the overlay window (1 = left)
//! - `Dismiss()` - Escape pressed
//!
//! ### Signals:
//! - `MenuShown(x: i32, y: i32)` - Draw the menu centered at the screen position
//! - `MenuClosed()` - Hide the menu
//! - `HighlightChanged(slice: i32, subitem: i32)` - Hover feedback (-1 = none)

use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use zbus::{fdo, interface, object_server::SignalEmitter};

/// Daemon object path
pub const DBUS_PATH: &str = "/org/kde/juhradialmx/Daemon";

/// Overlay interface name
pub const OVERLAY_INTERFACE: &str = "org.kde.juhradialmx.Overlay";

/// Overlay object path
pub const OVERLAY_PATH: &str = "/org/kde/juhradialmx/Overlay";

/// Overlay bus name
pub const OVERLAY_NAME: &str = "org.kde.juhradialmx.Overlay";

/// Left mouse button as reported by `PointerPressed`
pub const BUTTON_LEFT: u32 = 1;

/// Haptic events understood by the daemon's `TriggerHaptic`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HapticEvent {
    /// Menu appeared
    MenuAppear,
    /// Pointer entered a slice
    SliceChange,
    /// Selection executed
    Confirm,
    /// Action could not be carried out
    Invalid,
}

impl HapticEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            HapticEvent::MenuAppear => "menu_appear",
            HapticEvent::SliceChange => "slice_change",
            HapticEvent::Confirm => "confirm",
            HapticEvent::Invalid => "invalid",
        }
    }
}

impl std::fmt::Display for HapticEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the menu controller reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayEvent {
    /// Daemon `MenuRequested`
    Show { x: i32, y: i32 },
    /// Daemon `HideMenu`
    Hide,
    /// Daemon `CursorMoved`
    CursorMoved { dx: i32, dy: i32 },
    /// Renderer `PointerMoved`, window-local
    PointerMoved { x: i32, y: i32 },
    /// Renderer `PointerPressed`
    PointerPressed { button: u32 },
    /// Renderer `Dismiss`
    Escape,
}

// ============================================================================
// Daemon client
// ============================================================================

#[zbus::proxy(
    interface = "org.kde.juhradialmx.Daemon",
    default_service = "org.kde.juhradialmx",
    default_path = "/org/kde/juhradialmx/Daemon"
)]
pub trait Daemon {
    /// Trigger haptic feedback for an event name
    fn trigger_haptic(&self, event: &str) -> zbus::Result<()>;

    /// Switch the mouse to another Easy-Switch host
    fn set_host(&self, host_index: u8) -> zbus::Result<bool>;

    /// Reload configuration from disk
    fn reload_config(&self) -> zbus::Result<()>;

    #[zbus(signal)]
    fn menu_requested(&self, x: i32, y: i32) -> zbus::Result<()>;

    #[zbus(signal)]
    fn hide_menu(&self) -> zbus::Result<()>;

    #[zbus(signal)]
    fn cursor_moved(&self, x: i32, y: i32) -> zbus::Result<()>;
}

/// Ask the daemon for a haptic pulse
pub async fn trigger_haptic(
    connection: &zbus::Connection,
    event: HapticEvent,
) -> zbus::Result<()> {
    let proxy = DaemonProxy::new(connection).await?;
    proxy.trigger_haptic(event.as_str()).await
}

/// Forward daemon signals into the controller channel
///
/// Runs until the channel closes or every signal stream ends.
pub async fn listen_daemon_signals(
    connection: zbus::Connection,
    tx: mpsc::Sender<OverlayEvent>,
) -> zbus::Result<()> {
    let proxy = DaemonProxy::new(&connection).await?;
    let mut menu_requested = proxy.receive_menu_requested().await?;
    let mut hide_menu = proxy.receive_hide_menu().await?;
    let mut cursor_moved = proxy.receive_cursor_moved().await?;

    tracing::info!(path = DBUS_PATH, "Listening for daemon signals");

    loop {
        let parsed = tokio::select! {
            Some(signal) = menu_requested.next() => (
                "MenuRequested",
                signal.args().map(|args| OverlayEvent::Show { x: *args.x(), y: *args.y() }),
            ),
            Some(_) = hide_menu.next() => ("HideMenu", Ok(OverlayEvent::Hide)),
            Some(signal) = cursor_moved.next() => (
                "CursorMoved",
                signal
                    .args()
                    .map(|args| OverlayEvent::CursorMoved { dx: *args.x(), dy: *args.y() }),
            ),
            else => {
                tracing::warn!("Daemon signal streams ended");
                return Ok(());
            }
        };

        let Some(event) = signal_event(parsed.0, parsed.1) else {
            continue;
        };

        if tx.send(event).await.is_err() {
            tracing::debug!("Controller channel closed, stopping signal listener");
            return Ok(());
        }
    }
}

/// Unwrap a decoded daemon signal; a body that does not decode is skipped
fn signal_event(name: &str, parsed: zbus::Result<OverlayEvent>) -> Option<OverlayEvent> {
    match parsed {
        Ok(event) => {
            if !matches!(event, OverlayEvent::CursorMoved { .. }) {
                tracing::debug!(signal = name, ?event, "Daemon signal");
            }
            Some(event)
        }
        Err(e) => {
            tracing::warn!(signal = name, error = %e, "Malformed daemon signal, skipping");
            None
        }
    }
}

// ============================================================================
// Overlay service
// ============================================================================

/// Renderer-facing D-Bus service
///
/// Input from the renderer is forwarded to the controller; the signals tell
/// the renderer what to draw.
pub struct OverlayService {
    tx: mpsc::Sender<OverlayEvent>,
}

impl OverlayService {
    pub fn new(tx: mpsc::Sender<OverlayEvent>) -> Self {
        Self { tx }
    }

    async fn forward(&self, event: OverlayEvent) -> fdo::Result<()> {
        self.tx
            .send(event)
            .await
            .map_err(|e| fdo::Error::Failed(format!("Controller unavailable: {}", e)))
    }
}

#[interface(name = "org.kde.juhradialmx.Overlay")]
impl OverlayService {
    /// Pointer position inside the overlay window
    async fn pointer_moved(&self, x: i32, y: i32) -> fdo::Result<()> {
        self.forward(OverlayEvent::PointerMoved { x, y }).await
    }

    /// Mouse button pressed inside the overlay window
    async fn pointer_pressed(&self, button: u32) -> fdo::Result<()> {
        tracing::debug!(button, "PointerPressed");
        self.forward(OverlayEvent::PointerPressed { button }).await
    }

    /// Close without executing (Escape)
    async fn dismiss(&self) -> fdo::Result<()> {
        tracing::debug!("Dismiss called");
        self.forward(OverlayEvent::Escape).await
    }

    #[zbus(signal)]
    async fn menu_shown(emitter: &SignalEmitter<'_>, x: i32, y: i32) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn menu_closed(emitter: &SignalEmitter<'_>) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn highlight_changed(
        emitter: &SignalEmitter<'_>,
        slice: i32,
        subitem: i32,
    ) -> zbus::Result<()>;
}

/// Connect to the session bus and serve the overlay interface
///
/// # Returns
/// A `zbus::Connection` that should be kept alive for the service to run.
pub async fn init_overlay_service(
    tx: mpsc::Sender<OverlayEvent>,
) -> zbus::Result<zbus::Connection> {
    let connection = zbus::connection::Builder::session()?
        .name(OVERLAY_NAME)?
        .serve_at(OVERLAY_PATH, OverlayService::new(tx))?
        .build()
        .await?;

    tracing::info!(
        name = OVERLAY_NAME,
        path = OVERLAY_PATH,
        "Overlay D-Bus service registered"
    );

    Ok(connection)
}

/// Emit `MenuShown`
pub async fn emit_menu_shown(connection: &zbus::Connection, x: i32, y: i32) -> zbus::Result<()> {
    connection
        .emit_signal(None::<&str>, OVERLAY_PATH, OVERLAY_INTERFACE, "MenuShown", &(x, y))
        .await
}

/// Emit `MenuClosed`
pub async fn emit_menu_closed(connection: &zbus::Connection) -> zbus::Result<()> {
    connection
        .emit_signal(None::<&str>, OVERLAY_PATH, OVERLAY_INTERFACE, "MenuClosed", &())
        .await
}

/// Emit `HighlightChanged`, `None` encoded as -1
pub async fn emit_highlight_changed(
    connection: &zbus::Connection,
    slice: Option<usize>,
    subitem: Option<usize>,
) -> zbus::Result<()> {
    let body = (index_to_wire(slice), index_to_wire(subitem));
    connection
        .emit_signal(None::<&str>, OVERLAY_PATH, OVERLAY_INTERFACE, "HighlightChanged", &body)
        .await
}

/// Wire encoding of an optional index
pub fn index_to_wire(index: Option<usize>) -> i32 {
    index
        .and_then(|i| i32::try_from(i).ok())
        .unwrap_or(-1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dbus_constants() {
        assert_eq!(DBUS_PATH, "/org/kde/juhradialmx/Daemon");
        assert_eq!(OVERLAY_INTERFACE, "org.kde.juhradialmx.Overlay");
        assert_eq!(OVERLAY_PATH, "/org/kde/juhradialmx/Overlay");
    }

    #[test]
    fn test_haptic_event_names() {
        assert_eq!(HapticEvent::MenuAppear.as_str(), "menu_appear");
        assert_eq!(HapticEvent::SliceChange.as_str(), "slice_change");
        assert_eq!(HapticEvent::Confirm.as_str(), "confirm");
        assert_eq!(HapticEvent::Invalid.to_string(), "invalid");
    }

    #[test]
    fn test_malformed_signal_is_skipped() {
        let bad = Err(zbus::Error::Failure("unexpected body signature".to_string()));
        assert_eq!(signal_event("MenuRequested", bad), None);

        let good = Ok(OverlayEvent::Show { x: 4, y: 5 });
        assert_eq!(
            signal_event("MenuRequested", good),
            Some(OverlayEvent::Show { x: 4, y: 5 })
        );
    }

    #[test]
    fn test_index_to_wire() {
        assert_eq!(index_to_wire(None), -1);
        assert_eq!(index_to_wire(Some(0)), 0);
        assert_eq!(index_to_wire(Some(7)), 7);
    }

    #[tokio::test]
    async fn test_service_forwards_input() {
        let (tx, mut rx) = mpsc::channel(4);
        let service = OverlayService::new(tx);

        service.pointer_moved(10, 20).await.unwrap();
        service.pointer_pressed(BUTTON_LEFT).await.unwrap();
        service.dismiss().await.unwrap();

        assert_eq!(rx.recv().await, Some(OverlayEvent::PointerMoved { x: 10, y: 20 }));
        assert_eq!(rx.recv().await, Some(OverlayEvent::PointerPressed { button: 1 }));
        assert_eq!(rx.recv().await, Some(OverlayEvent::Escape));
    }

    #[tokio::test]
    async fn test_service_reports_closed_controller() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let service = OverlayService::new(tx);
        assert!(service.dismiss().await.is_err());
    }
}
