//! Menu controller task
//!
//! The only owner of [`RadialMenu`]. Daemon signals and renderer input arrive
//! on one channel; a 16 ms interval polls the cursor while the menu is open in
//! toggle mode. Effects are handed to an [`EffectSink`] in order.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::actions::{actions_for, default_actions, ActionRunner, MenuAction};
use crate::config::{reload_into, SharedConfig};
use crate::cursor::{CursorProbe, CursorTracker};
use crate::dbus::{
    emit_highlight_changed, emit_menu_closed, emit_menu_shown, trigger_haptic, HapticEvent,
    OverlayEvent,
};
use crate::geometry::CENTER_ZONE_RADIUS;
use crate::overlay::{OverlayEffect, RadialMenu, POLL_INTERVAL};
use crate::themes::resolve_theme;

/// Carries out menu effects
pub trait EffectSink {
    fn apply(&mut self, effect: OverlayEffect);
}

/// Effects over D-Bus
///
/// Effects are queued to a worker task so signals reach the renderer in the
/// order they were produced. Actions run on their own tasks.
pub struct DbusEffects {
    tx: mpsc::UnboundedSender<OverlayEffect>,
}

impl DbusEffects {
    /// Spawn the effect worker
    pub fn spawn(connection: zbus::Connection, runner: Arc<ActionRunner>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<OverlayEffect>();

        tokio::spawn(async move {
            while let Some(effect) = rx.recv().await {
                apply_over_dbus(&connection, &runner, effect).await;
            }
            tracing::debug!("Effect worker stopped");
        });

        Self { tx }
    }
}

impl EffectSink for DbusEffects {
    fn apply(&mut self, effect: OverlayEffect) {
        if self.tx.send(effect).is_err() {
            tracing::warn!("Effect worker gone, dropping effect");
        }
    }
}

async fn apply_over_dbus(
    connection: &zbus::Connection,
    runner: &Arc<ActionRunner>,
    effect: OverlayEffect,
) {
    let result = match effect {
        OverlayEffect::Present { x, y } => emit_menu_shown(connection, x, y).await,
        OverlayEffect::Dismiss => emit_menu_closed(connection).await,
        OverlayEffect::Highlight { slice, subitem } => {
            emit_highlight_changed(connection, slice, subitem).await
        }
        OverlayEffect::Haptic(event) => {
            let connection = connection.clone();
            tokio::spawn(async move {
                if let Err(e) = trigger_haptic(&connection, event).await {
                    tracing::debug!(event = %event, error = %e, "TriggerHaptic failed");
                }
            });
            Ok(())
        }
        OverlayEffect::Execute(kind) => {
            let runner = Arc::clone(runner);
            let connection = connection.clone();
            tokio::spawn(async move {
                if let Err(e) = runner.run(&kind).await {
                    tracing::warn!(kind = kind.type_name(), error = %e, "Action failed");
                    if e.is_invalid_feedback() {
                        if let Err(e) = trigger_haptic(&connection, HapticEvent::Invalid).await {
                            tracing::debug!(error = %e, "TriggerHaptic failed");
                        }
                    }
                }
            });
            Ok(())
        }
    };

    if let Err(e) = result {
        tracing::warn!(error = %e, "Failed to emit overlay signal");
    }
}

/// Re-read the config file the shared config was loaded from
///
/// A failed read keeps the previous config.
fn refresh_from_disk(config: &SharedConfig) {
    let path = match config.read() {
        Ok(config) => config.config_path.clone(),
        Err(_) => None,
    };
    if let Some(path) = path {
        if let Err(e) = reload_into(config, &path) {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Config re-read failed, keeping previous"
            );
        }
    }
}

/// Read actions and dead zone radius from the current config
fn snapshot(config: &SharedConfig) -> Option<(Vec<MenuAction>, i32)> {
    match config.read() {
        Ok(config) => Some((
            actions_for(&config),
            resolve_theme(&config.theme).center_radius(),
        )),
        Err(e) => {
            tracing::error!(error = %e, "Config lock poisoned");
            None
        }
    }
}

/// Drives the radial menu
pub struct Controller<P: CursorProbe, S: EffectSink> {
    menu: RadialMenu,
    tracker: CursorTracker<P>,
    config: SharedConfig,
    sink: S,
}

impl<P: CursorProbe, S: EffectSink> Controller<P, S> {
    pub fn new(config: SharedConfig, tracker: CursorTracker<P>, sink: S) -> Self {
        let (actions, center_radius) =
            snapshot(&config).unwrap_or_else(|| (default_actions(), CENTER_ZONE_RADIUS));
        Self {
            menu: RadialMenu::new(actions, center_radius),
            tracker,
            config,
            sink,
        }
    }

    pub fn menu(&self) -> &RadialMenu {
        &self.menu
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Handle one event
    pub fn handle(&mut self, event: OverlayEvent, now: Instant) {
        let effects = match event {
            OverlayEvent::Show { x, y } => {
                tracing::info!(x, y, "MenuRequested");
                // Pick up settings changes before every show
                refresh_from_disk(&self.config);
                if let Some((actions, center_radius)) = snapshot(&self.config) {
                    self.menu.reload(actions, center_radius);
                }
                let tracker = &mut self.tracker;
                self.menu
                    .on_show(x, y, now, |x, y| tracker.menu_position(x, y))
            }
            OverlayEvent::Hide => self.menu.on_hide(now),
            OverlayEvent::CursorMoved { dx, dy } => self.menu.on_cursor_moved(dx, dy),
            OverlayEvent::PointerMoved { x, y } => self.menu.pointer_moved(x, y),
            OverlayEvent::PointerPressed { button } => self.menu.pointer_pressed(button),
            OverlayEvent::Escape => self.menu.escape(),
        };
        self.apply(effects);
    }

    /// One cursor poll tick
    pub fn poll(&mut self) {
        if !self.menu.is_polling() {
            return;
        }
        let pos = self.tracker.current_position();
        let effects = self.menu.poll_cursor(pos);
        self.apply(effects);
    }

    fn apply(&mut self, effects: Vec<OverlayEffect>) {
        for effect in effects {
            self.sink.apply(effect);
        }
    }

    /// Run until the event channel closes
    pub async fn run(mut self, mut rx: mpsc::Receiver<OverlayEvent>) {
        let mut ticker = tokio::time::interval(POLL_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(desktop = self.tracker.desktop().name(), "Menu controller running");

        loop {
            tokio::select! {
                event = rx.recv() => match event {
                    Some(event) => self.handle(event, Instant::now()),
                    None => break,
                },
                _ = ticker.tick(), if self.menu.is_polling() => self.poll(),
            }
        }

        tracing::info!("Event channel closed, controller stopping");
    }
}
