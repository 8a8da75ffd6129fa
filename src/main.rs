//! JuhRadial MX Overlay
//!
//! Menu controller for the JuhRadial MX radial menu. Listens for the daemon's
//! gesture signals, reconciles the cursor position with the compositor,
//! hit-tests slices and runs the selected action. The renderer draws whatever
//! the controller announces on `org.kde.juhradialmx.Overlay`.

use std::path::Path;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use juhradial_overlay::{
    actions::{actions_for, ActionKind, ActionRunner},
    config::{
        expand_tilde, load_shared_config, new_shared_config, split_key_path, Config,
        ConfigWatcher,
    },
    controller::{Controller, DbusEffects},
    cursor::{CursorTracker, SystemProbe},
    dbus::{init_overlay_service, listen_daemon_signals, DaemonProxy, OverlayEvent},
    desktop::Desktop,
    themes::{resolve_theme, THEMES},
};

/// Controller event queue depth
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Compass names of the slices, clockwise from the top
const DIRECTIONS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

/// JuhRadial MX Overlay - radial menu controller for Logitech MX mice
#[derive(Parser, Debug)]
#[command(name = "juhradial-overlay")]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "~/.config/juhradial/config.json")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Run the menu controller (default)
    Run,
    /// Print the detected desktop and current cursor position
    Cursor,
    /// Print the radial menu slices
    Actions,
    /// List available themes
    Themes,
    /// Print a config value by dotted key path
    ConfigGet {
        /// Key path, e.g. radial_menu.slices.0.label
        key: String,
    },
    /// Ask the daemon to reload its configuration
    Reload,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = expand_tilde(&args.config);

    match args.command.unwrap_or(Command::Run) {
        Command::Run => run(&config_path).await,
        Command::Cursor => {
            print_cursor();
            Ok(())
        }
        Command::Actions => {
            print_actions(&Config::load(&config_path)?);
            Ok(())
        }
        Command::Themes => {
            print_themes(&Config::load(&config_path)?);
            Ok(())
        }
        Command::ConfigGet { key } => {
            let config = Config::load(&config_path)?;
            match config.get(&split_key_path(&key)) {
                Some(value) => {
                    println!("{}", serde_json::to_string_pretty(&value)?);
                    Ok(())
                }
                None => Err(format!("Unknown config key: {}", key).into()),
            }
        }
        Command::Reload => {
            let connection = zbus::Connection::session().await?;
            DaemonProxy::new(&connection).await?.reload_config().await?;
            info!("Daemon configuration reloaded");
            Ok(())
        }
    }
}

async fn run(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    info!("JuhRadial MX Overlay starting...");
    info!("Configuration: {}", config_path.display());

    // Load shared configuration (hot-reloaded by the watcher below)
    let shared_config = match load_shared_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load config, using defaults: {}", e);
            new_shared_config()
        }
    };

    let _watcher = match ConfigWatcher::start(config_path.to_path_buf(), shared_config.clone()) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            warn!("Config watcher unavailable, re-reading on each show: {}", e);
            None
        }
    };

    let (event_tx, event_rx) = mpsc::channel::<OverlayEvent>(EVENT_CHANNEL_CAPACITY);

    let connection = match init_overlay_service(event_tx.clone()).await {
        Ok(conn) => conn,
        Err(e) => {
            error!("Failed to initialize D-Bus service: {}", e);
            return Err(e.into());
        }
    };

    // Daemon signals feed the same channel as renderer input
    let listener_connection = connection.clone();
    let listener_handle = tokio::spawn(async move {
        if let Err(e) = listen_daemon_signals(listener_connection, event_tx).await {
            error!("Daemon signal listener failed: {}", e);
        }
    });

    let desktop = Desktop::detect();
    info!(
        desktop = desktop.name(),
        hyprland = desktop.hyprland,
        gnome = desktop.gnome,
        cosmic = desktop.cosmic,
        xwayland = desktop.xwayland,
        "Desktop detected"
    );

    let runner = Arc::new(ActionRunner::new(Some(connection.clone())));
    let sink = DbusEffects::spawn(connection.clone(), runner);
    let tracker = CursorTracker::new(desktop, SystemProbe::new());
    let controller = Controller::new(shared_config, tracker, sink);

    info!("Ready. Waiting for gesture button...");

    tokio::select! {
        _ = controller.run(event_rx) => {
            warn!("Controller stopped");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
    }

    listener_handle.abort();
    info!("JuhRadial MX Overlay stopped");
    Ok(())
}

fn print_cursor() {
    let desktop = Desktop::detect();
    let mut tracker = CursorTracker::new(desktop, SystemProbe::new());
    let pos = tracker.current_position();
    let placement = tracker.menu_position(pos.x, pos.y);

    println!("Desktop:  {}", desktop.name());
    println!(
        "Backends: hyprland={} gnome={} cosmic={} xwayland={}",
        desktop.hyprland, desktop.gnome, desktop.cosmic, desktop.xwayland
    );
    println!("Cursor:   {}, {}", pos.x, pos.y);
    println!("Menu at:  {}, {}", placement.x, placement.y);
    if let Some(monitor) = placement.monitor {
        println!(
            "Monitor:  {} {}x{} at {},{}",
            monitor.name, monitor.width, monitor.height, monitor.x, monitor.y
        );
    }
}

fn describe(kind: &ActionKind) -> String {
    match kind {
        ActionKind::Exec(command) => command.clone(),
        ActionKind::Url(url) => url.clone(),
        ActionKind::EasySwitch(host) => format!("host {}", host),
        ActionKind::Unknown(kind) => format!("<{}>", kind),
        _ => String::new(),
    }
}

fn print_actions(config: &Config) {
    for (i, action) in actions_for(config).iter().enumerate() {
        let direction = DIRECTIONS.get(i).copied().unwrap_or("-");
        println!(
            "{:<2} {:<3} {:<14} {:<12} {:<12} {}",
            i,
            direction,
            action.label,
            action.kind.type_name(),
            action.icon,
            describe(&action.kind)
        );
        for sub in action.kind.subitems() {
            println!(
                "         - {:<14} {:<12} {}",
                sub.label,
                sub.kind.type_name(),
                describe(&sub.kind)
            );
        }
    }
}

fn print_themes(config: &Config) {
    let current = resolve_theme(&config.theme).key;
    for theme in THEMES {
        let marker = if theme.key == current { "*" } else { " " };
        let style = if theme.radial_image.is_some() {
            "3D"
        } else if theme.is_dark {
            "dark"
        } else {
            "light"
        };
        println!(
            "{} {:<18} {:<22} {:<5} dead zone {:>2}px",
            marker,
            theme.key,
            theme.name,
            style,
            theme.center_radius()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_default_config() {
        let args = Args::parse_from(["juhradial-overlay"]);
        assert_eq!(args.config, "~/.config/juhradial/config.json");
        assert!(!args.verbose);
        assert_eq!(args.command, None);
    }

    #[test]
    fn test_args_verbose_and_config() {
        let args = Args::parse_from(["juhradial-overlay", "-v", "-c", "/tmp/c.json"]);
        assert!(args.verbose);
        assert_eq!(args.config, "/tmp/c.json");
    }

    #[test]
    fn test_args_subcommands() {
        let args = Args::parse_from(["juhradial-overlay", "actions"]);
        assert_eq!(args.command, Some(Command::Actions));

        let args = Args::parse_from([
            "juhradial-overlay",
            "config-get",
            "radial_menu.easy_switch_shortcuts",
        ]);
        assert_eq!(
            args.command,
            Some(Command::ConfigGet {
                key: "radial_menu.easy_switch_shortcuts".to_string()
            })
        );

        assert!(Args::try_parse_from(["juhradial-overlay", "config-get"]).is_err());
        assert!(Args::try_parse_from(["juhradial-overlay", "bogus"]).is_err());
    }

    #[test]
    fn test_directions_cover_slices() {
        assert_eq!(DIRECTIONS.len(), juhradial_overlay::geometry::SLICE_COUNT);
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe(&ActionKind::Exec("kwrite".to_string())), "kwrite");
        assert_eq!(describe(&ActionKind::EasySwitch("1".to_string())), "host 1");
        assert_eq!(describe(&ActionKind::Emoji), "");
    }
}
