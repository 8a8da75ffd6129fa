//! X11 / XWayland pointer queries
//!
//! With the `xlib` feature the pointer is read with `XQueryPointer` on a
//! cached display connection. Without it, `xdotool getmouselocation` is used.
//!
//! COSMIC's XWayland only tracks the pointer while it is over an X11
//! surface, so `XQueryPointer` returns stale coordinates otherwise. The
//! synced query briefly maps an invisible fullscreen override-redirect window
//! to make the server pick up the real position.

use std::process::Command;
use std::time::Duration;

use super::{output_with_timeout, CursorPosition};

/// Interval between pointer reads while waiting for a fresh position
pub const SYNC_POLL_INTERVAL: Duration = Duration::from_millis(4);

/// Accept an unchanged reading after this long (pointer was already over XWayland)
pub const SYNC_CHANGE_WINDOW: Duration = Duration::from_millis(120);

/// Hard limit for the whole synced query
pub const SYNC_DEADLINE: Duration = Duration::from_millis(350);

/// Upper bound for one `xdotool` run
const XDOTOOL_TIMEOUT: Duration = Duration::from_millis(200);

/// Outcome of a synced query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncResult {
    pub position: Option<CursorPosition>,
    /// Whether the reading moved away from the stale one
    pub changed: bool,
}

/// Poll `read` until it reports something different from `stale`
///
/// Stops on the first changed reading, after `change_window` without a
/// change, or at `deadline`. Readings of `None` are skipped.
pub fn wait_for_fresh_position<F>(
    stale: Option<CursorPosition>,
    mut read: F,
    interval: Duration,
    change_window: Duration,
    deadline: Duration,
) -> SyncResult
where
    F: FnMut() -> Option<CursorPosition>,
{
    let start = std::time::Instant::now();
    let mut fresh = stale;

    while start.elapsed() < deadline {
        std::thread::sleep(interval);
        let Some(pos) = read() else {
            continue;
        };
        fresh = Some(pos);
        if stale.is_some() && Some(pos) != stale {
            tracing::debug!(x = pos.x, y = pos.y, "X11 sync: fresh position");
            return SyncResult { position: fresh, changed: true };
        }
        if start.elapsed() >= change_window {
            tracing::debug!(x = pos.x, y = pos.y, "X11 sync: no change, accepting");
            break;
        }
    }

    SyncResult { position: fresh, changed: false }
}

/// Parse `xdotool getmouselocation --shell` output
pub fn parse_xdotool_shell(output: &str) -> Option<CursorPosition> {
    let mut x: Option<i32> = None;
    let mut y: Option<i32> = None;

    for line in output.lines() {
        if let Some(val) = line.strip_prefix("X=") {
            x = val.trim().parse().ok();
        } else if let Some(val) = line.strip_prefix("Y=") {
            y = val.trim().parse().ok();
        }
    }

    match (x, y) {
        (Some(x), Some(y)) => Some(CursorPosition::new(x, y)),
        _ => None,
    }
}

/// Query cursor position via xdotool
fn query_via_xdotool() -> Option<CursorPosition> {
    let output = output_with_timeout(
        Command::new("xdotool").args(["getmouselocation", "--shell"]),
        XDOTOOL_TIMEOUT,
    )?;

    parse_xdotool_shell(&String::from_utf8_lossy(&output.stdout))
}

#[cfg(feature = "xlib")]
mod xlib_pointer {
    use super::*;
    use std::os::raw::{c_int, c_uint, c_ulong};
    use x11::xlib;

    /// Cached Xlib display plus the lazily created sync window
    pub struct XlibPointer {
        display: *mut xlib::Display,
        root: xlib::Window,
        sync_window: Option<xlib::Window>,
    }

    // SAFETY: the display connection is owned by this struct and only ever
    // used through `&mut self`, so it is never touched from two threads at once.
    unsafe impl Send for XlibPointer {}

    impl XlibPointer {
        /// Open the default display, `None` if no X server is reachable
        pub fn open() -> Option<Self> {
            // SAFETY: a null display name selects `$DISPLAY`; the result is checked for null.
            let display = unsafe { xlib::XOpenDisplay(std::ptr::null()) };
            if display.is_null() {
                return None;
            }
            // SAFETY: `display` is a valid connection.
            let root = unsafe { xlib::XDefaultRootWindow(display) };
            Some(Self {
                display,
                root,
                sync_window: None,
            })
        }

        pub fn query(&mut self) -> Option<CursorPosition> {
            let mut root_return: xlib::Window = 0;
            let mut child_return: xlib::Window = 0;
            let (mut root_x, mut root_y, mut win_x, mut win_y): (c_int, c_int, c_int, c_int) =
                (0, 0, 0, 0);
            let mut mask: c_uint = 0;

            // SAFETY: all out-pointers reference live locals.
            let ok = unsafe {
                xlib::XQueryPointer(
                    self.display,
                    self.root,
                    &mut root_return,
                    &mut child_return,
                    &mut root_x,
                    &mut root_y,
                    &mut win_x,
                    &mut win_y,
                    &mut mask,
                )
            };

            if ok != 0 {
                Some(CursorPosition::new(root_x, root_y))
            } else {
                None
            }
        }

        fn ensure_sync_window(&mut self) -> xlib::Window {
            if let Some(window) = self.sync_window {
                return window;
            }

            // SAFETY: every call below uses the valid display and root window;
            // structs passed by pointer are zero-initialised locals.
            let window = unsafe {
                let width = xlib::XDisplayWidth(self.display, 0) as c_uint;
                let height = xlib::XDisplayHeight(self.display, 0) as c_uint;

                let mut vinfo: xlib::XVisualInfo = std::mem::zeroed();
                let argb = xlib::XMatchVisualInfo(self.display, 0, 32, xlib::TrueColor, &mut vinfo);
                let window = if argb != 0 {
                    // 32-bit ARGB visual, background alpha 0 keeps the window invisible
                    let colormap = xlib::XCreateColormap(
                        self.display,
                        self.root,
                        vinfo.visual,
                        xlib::AllocNone,
                    );
                    let mut attrs: xlib::XSetWindowAttributes = std::mem::zeroed();
                    attrs.background_pixel = 0;
                    attrs.border_pixel = 0;
                    attrs.override_redirect = xlib::True;
                    attrs.colormap = colormap;
                    let mask = (xlib::CWBackPixel
                        | xlib::CWBorderPixel
                        | xlib::CWOverrideRedirect
                        | xlib::CWColormap) as c_ulong;
                    xlib::XCreateWindow(
                        self.display,
                        self.root,
                        0,
                        0,
                        width,
                        height,
                        0,
                        32,
                        xlib::InputOutput as c_uint,
                        vinfo.visual,
                        mask,
                        &mut attrs,
                    )
                } else {
                    xlib::XCreateSimpleWindow(self.display, self.root, 0, 0, width, height, 0, 0, 0)
                };
                xlib::XFlush(self.display);
                window
            };

            self.sync_window = Some(window);
            window
        }

        pub fn query_synced(&mut self) -> Option<CursorPosition> {
            let window = self.ensure_sync_window();

            let stale = self.query();
            tracing::debug!(?stale, "X11 sync: stale reading");

            // SAFETY: `window` was created on this display.
            unsafe {
                xlib::XMapWindow(self.display, window);
                xlib::XSync(self.display, xlib::False);
            }

            let result = wait_for_fresh_position(
                stale,
                || self.query(),
                SYNC_POLL_INTERVAL,
                SYNC_CHANGE_WINDOW,
                SYNC_DEADLINE,
            );

            // SAFETY: as above.
            unsafe {
                xlib::XUnmapWindow(self.display, window);
                xlib::XFlush(self.display);
            }

            tracing::debug!(
                position = ?result.position,
                changed = result.changed,
                "X11 sync: result"
            );
            result.position
        }
    }

    impl Drop for XlibPointer {
        fn drop(&mut self) {
            // SAFETY: the display is valid until here and not used afterwards.
            unsafe {
                if let Some(window) = self.sync_window.take() {
                    xlib::XDestroyWindow(self.display, window);
                }
                xlib::XCloseDisplay(self.display);
            }
        }
    }
}

/// X11 pointer access for the XWayland fallback paths
pub struct XPointer {
    #[cfg(feature = "xlib")]
    xlib: Option<xlib_pointer::XlibPointer>,
    #[cfg(feature = "xlib")]
    tried_open: bool,
}

impl XPointer {
    pub fn new() -> Self {
        Self {
            #[cfg(feature = "xlib")]
            xlib: None,
            #[cfg(feature = "xlib")]
            tried_open: false,
        }
    }

    #[cfg(feature = "xlib")]
    fn xlib(&mut self) -> Option<&mut xlib_pointer::XlibPointer> {
        if !self.tried_open {
            self.tried_open = true;
            self.xlib = xlib_pointer::XlibPointer::open();
            if self.xlib.is_none() {
                tracing::warn!("XOpenDisplay failed, using xdotool for pointer queries");
            }
        }
        self.xlib.as_mut()
    }

    /// Plain pointer query
    pub fn query(&mut self) -> Option<CursorPosition> {
        #[cfg(feature = "xlib")]
        if let Some(xlib) = self.xlib() {
            return xlib.query();
        }
        query_via_xdotool()
    }

    /// Pointer query with forced XWayland sync
    ///
    /// Without Xlib there is no way to map the sync window, so this is the
    /// plain query.
    pub fn query_synced(&mut self) -> Option<CursorPosition> {
        #[cfg(feature = "xlib")]
        if let Some(xlib) = self.xlib() {
            return xlib.query_synced();
        }
        query_via_xdotool()
    }
}

impl Default for XPointer {
    fn default() -> Self {
        Self::new()
    }
}
