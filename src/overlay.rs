//! Radial menu state machine
//!
//! Owns all menu state and turns input into [`OverlayEffect`]s. Nothing in
//! here touches D-Bus, processes or the clock; the controller feeds it events
//! and timestamps and carries out the effects in order.
//!
//! Two interaction styles share one menu:
//! - Hold: the gesture button stays down, the daemon streams `CursorMoved`
//!   offsets, releasing the button (`HideMenu`) executes the highlighted slice.
//! - Toggle: a quick tap (< 250 ms) keeps the menu open. The cursor is polled,
//!   submenus open on hover, a left click executes, anything else closes.

use std::time::{Duration, Instant};

use crate::actions::{ActionKind, MenuAction};
use crate::cursor::{CursorPosition, MenuPlacement};
use crate::dbus::{HapticEvent, BUTTON_LEFT};
use crate::geometry::{slice_at, subitem_at, MENU_RADIUS, TOGGLE_HOVER_SLACK, WINDOW_SIZE};

/// Press shorter than this is a tap
pub const TAP_THRESHOLD: Duration = Duration::from_millis(250);

/// Assumed press length when the show time is unknown (counts as a hold)
pub const UNKNOWN_PRESS_DURATION: Duration = Duration::from_millis(1000);

/// Cursor polling period in toggle mode
pub const POLL_INTERVAL: Duration = Duration::from_millis(16);

/// Something the controller has to carry out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayEffect {
    /// Show the menu centered at a screen position
    Present { x: i32, y: i32 },
    /// Hide the menu
    Dismiss,
    /// Hover state changed
    Highlight {
        slice: Option<usize>,
        subitem: Option<usize>,
    },
    /// Ask the daemon for a haptic pulse
    Haptic(HapticEvent),
    /// Run an action
    Execute(ActionKind),
}

/// Radial menu state
#[derive(Debug)]
pub struct RadialMenu {
    actions: Vec<MenuAction>,
    /// Dead zone radius
    center_radius: i32,
    visible: bool,
    center: CursorPosition,
    highlighted: Option<usize>,
    /// Slice whose submenu is open
    submenu: Option<usize>,
    subitem: Option<usize>,
    toggle_mode: bool,
    shown_at: Option<Instant>,
}

impl RadialMenu {
    pub fn new(actions: Vec<MenuAction>, center_radius: i32) -> Self {
        Self {
            actions,
            center_radius,
            visible: false,
            center: CursorPosition::default(),
            highlighted: None,
            submenu: None,
            subitem: None,
            toggle_mode: false,
            shown_at: None,
        }
    }

    /// Swap in freshly loaded actions and theme dead zone
    pub fn reload(&mut self, actions: Vec<MenuAction>, center_radius: i32) {
        self.actions = actions;
        self.center_radius = center_radius;
    }

    pub fn actions(&self) -> &[MenuAction] {
        &self.actions
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_toggle_mode(&self) -> bool {
        self.toggle_mode
    }

    /// Whether the cursor should be polled (open in toggle mode)
    pub fn is_polling(&self) -> bool {
        self.visible && self.toggle_mode
    }

    pub fn center(&self) -> CursorPosition {
        self.center
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    pub fn submenu(&self) -> Option<usize> {
        self.submenu
    }

    pub fn subitem(&self) -> Option<usize> {
        self.subitem
    }

    /// `MenuRequested` from the daemon
    ///
    /// A request while open in toggle mode is the second tap and closes the
    /// menu without executing. Otherwise `resolve` reconciles the position.
    pub fn on_show<F>(&mut self, x: i32, y: i32, now: Instant, resolve: F) -> Vec<OverlayEffect>
    where
        F: FnOnce(i32, i32) -> MenuPlacement,
    {
        if self.toggle_mode && self.visible {
            tracing::info!("Second tap, closing menu");
            return self.close(false);
        }

        let placement = resolve(x, y);
        self.center = CursorPosition::new(placement.x, placement.y);
        self.highlighted = None;
        self.submenu = None;
        self.subitem = None;
        self.toggle_mode = false;
        self.shown_at = Some(now);
        self.visible = true;

        tracing::info!(x = placement.x, y = placement.y, "Menu shown");
        vec![
            OverlayEffect::Present {
                x: placement.x,
                y: placement.y,
            },
            OverlayEffect::Haptic(HapticEvent::MenuAppear),
        ]
    }

    /// `HideMenu` from the daemon (gesture button released)
    pub fn on_hide(&mut self, now: Instant) -> Vec<OverlayEffect> {
        if !self.visible {
            tracing::debug!("HideMenu while hidden, ignoring");
            return Vec::new();
        }

        let held = self
            .shown_at
            .map(|shown| now.saturating_duration_since(shown))
            .unwrap_or(UNKNOWN_PRESS_DURATION);

        if held < TAP_THRESHOLD {
            tracing::info!(held_ms = held.as_millis() as u64, "Quick tap, entering toggle mode");
            self.toggle_mode = true;
            Vec::new()
        } else {
            self.close(true)
        }
    }

    /// `CursorMoved` offsets from the daemon while the button is held
    pub fn on_cursor_moved(&mut self, dx: i32, dy: i32) -> Vec<OverlayEffect> {
        if !self.visible {
            return Vec::new();
        }

        let new_slice = slice_at(
            dx as f64,
            dy as f64,
            self.center_radius as f64,
            MENU_RADIUS as f64,
        );

        let mut effects = Vec::new();
        if new_slice != self.highlighted {
            tracing::debug!(from = ?self.highlighted, to = ?new_slice, "Hold hover changed");
            if new_slice.is_some() {
                effects.push(OverlayEffect::Haptic(HapticEvent::SliceChange));
            }
            self.highlighted = new_slice;
            effects.push(self.highlight_effect());
        }
        effects
    }

    /// Polled global cursor position in toggle mode
    pub fn poll_cursor(&mut self, pos: CursorPosition) -> Vec<OverlayEffect> {
        if !self.is_polling() {
            return Vec::new();
        }
        self.hover(pos.x - self.center.x, pos.y - self.center.y)
    }

    /// Window-local pointer position reported by the renderer
    pub fn pointer_moved(&mut self, x: i32, y: i32) -> Vec<OverlayEffect> {
        if !self.visible {
            return Vec::new();
        }
        let half = WINDOW_SIZE / 2;
        self.hover(x - half, y - half)
    }

    /// Mouse click inside the overlay; only meaningful in toggle mode
    pub fn pointer_pressed(&mut self, button: u32) -> Vec<OverlayEffect> {
        if !self.is_polling() {
            return Vec::new();
        }
        if button == BUTTON_LEFT {
            tracing::info!(
                slice = ?self.highlighted,
                subitem = ?self.subitem,
                "Left click in toggle mode"
            );
            self.close(true)
        } else {
            tracing::info!(button, "Non-left click in toggle mode, closing");
            self.close(false)
        }
    }

    /// Escape key
    pub fn escape(&mut self) -> Vec<OverlayEffect> {
        if !self.visible {
            return Vec::new();
        }
        self.close(false)
    }

    /// Close the menu, executing the current selection when asked
    ///
    /// A highlighted submenu item wins over the highlighted slice. Submenu
    /// slices themselves never execute.
    pub fn close(&mut self, execute: bool) -> Vec<OverlayEffect> {
        self.toggle_mode = false;
        let mut effects = Vec::new();

        if execute {
            if let Some(kind) = self.selected_action() {
                effects.push(OverlayEffect::Haptic(HapticEvent::Confirm));
                effects.push(OverlayEffect::Execute(kind));
            }
        }

        self.submenu = None;
        self.subitem = None;
        self.highlighted = None;
        self.shown_at = None;
        self.visible = false;

        effects.push(OverlayEffect::Dismiss);
        effects
    }

    fn selected_action(&self) -> Option<ActionKind> {
        if let (Some(parent), Some(item)) = (self.submenu, self.subitem) {
            let sub = self.actions.get(parent)?.kind.subitems().get(item)?;
            tracing::info!(label = %sub.label, "Executing submenu item");
            return Some(sub.kind.clone());
        }

        let action = self.actions.get(self.highlighted?)?;
        if action.kind.is_submenu() {
            return None;
        }
        tracing::info!(label = %action.label, "Executing slice");
        Some(action.kind.clone())
    }

    fn submenu_len(&self, slice: usize) -> usize {
        self.actions
            .get(slice)
            .map(|a| a.kind.subitems().len())
            .unwrap_or(0)
    }

    /// Toggle-mode hover with submenu handling
    fn hover(&mut self, dx: i32, dy: i32) -> Vec<OverlayEffect> {
        let (fx, fy) = (dx as f64, dy as f64);
        let distance = fx.hypot(fy);
        let new_slice = slice_at(
            fx,
            fy,
            self.center_radius as f64,
            (MENU_RADIUS + TOGGLE_HOVER_SLACK) as f64,
        );
        let before = (self.highlighted, self.subitem);

        if let Some(parent) = self.submenu {
            if let Some(item) = subitem_at(parent, self.submenu_len(parent), fx, fy) {
                self.subitem = Some(item);
                return self.changed_effects(before, false);
            }
            // Stay open while on the parent slice or on the way out to the items
            if new_slice == Some(parent) || distance > MENU_RADIUS as f64 {
                self.subitem = None;
                return self.changed_effects(before, false);
            }
            self.submenu = None;
            self.subitem = None;
        }

        if let Some(slice) = new_slice {
            if new_slice != self.highlighted && self.submenu_len(slice) > 0 {
                tracing::debug!(slice, "Opening submenu");
                self.submenu = Some(slice);
                self.subitem = None;
            }
        }

        let entered = new_slice != self.highlighted && new_slice.is_some();
        if new_slice != self.highlighted {
            tracing::debug!(from = ?self.highlighted, to = ?new_slice, "Toggle hover changed");
            self.highlighted = new_slice;
        }
        self.changed_effects(before, entered)
    }

    fn changed_effects(
        &self,
        before: (Option<usize>, Option<usize>),
        entered_slice: bool,
    ) -> Vec<OverlayEffect> {
        let mut effects = Vec::new();
        if entered_slice {
            effects.push(OverlayEffect::Haptic(HapticEvent::SliceChange));
        }
        if before != (self.highlighted, self.subitem) {
            effects.push(self.highlight_effect());
        }
        effects
    }

    fn highlight_effect(&self) -> OverlayEffect {
        OverlayEffect::Highlight {
            slice: self.highlighted,
            subitem: self.subitem,
        }
    }
}
