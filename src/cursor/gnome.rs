//! GNOME Shell cursor position via the JuhRadial cursor helper extension
//!
//! GNOME on Wayland exposes no pointer position to clients. The
//! `juhradial-cursor@juhlabs.com` extension publishes `global.get_pointer()`
//! on the session bus instead.

use std::time::Duration;

use zbus::blocking::{connection, Connection};

use super::CursorPosition;

/// Upper bound for one helper call; it runs on the controller task
pub const HELPER_CALL_TIMEOUT: Duration = Duration::from_millis(200);

#[zbus::proxy(
    interface = "org.juhradial.CursorHelper",
    default_service = "org.juhradial.CursorHelper",
    default_path = "/org/juhradial/CursorHelper"
)]
trait CursorHelper {
    /// Global pointer position in logical pixels
    fn get_cursor_position(&self) -> zbus::Result<(i32, i32)>;
}

/// Lazily connected client for the GNOME cursor helper
#[derive(Default)]
pub struct GnomeCursor {
    connection: Option<Connection>,
}

impl GnomeCursor {
    pub fn new() -> Self {
        Self::default()
    }

    fn connection(&mut self) -> Option<&Connection> {
        if self.connection.is_none() {
            let built = connection::Builder::session()
                .map(|builder| builder.method_timeout(HELPER_CALL_TIMEOUT))
                .and_then(|builder| builder.build());
            match built {
                Ok(conn) => self.connection = Some(conn),
                Err(e) => {
                    tracing::debug!(error = %e, "Session bus unavailable for GNOME cursor helper");
                    return None;
                }
            }
        }
        self.connection.as_ref()
    }

    /// Ask the extension for the pointer position
    ///
    /// Returns `None` when the extension is not installed or the call fails.
    pub fn cursor_position(&mut self) -> Option<CursorPosition> {
        let conn = self.connection()?;
        let result = CursorHelperProxyBlocking::new(conn)
            .and_then(|proxy| proxy.get_cursor_position());

        match result {
            Ok((x, y)) => {
                tracing::debug!(x, y, "Got cursor position via GNOME extension");
                Some(CursorPosition::new(x, y))
            }
            Err(e) => {
                tracing::debug!(error = %e, "GNOME cursor helper call failed");
                None
            }
        }
    }
}
