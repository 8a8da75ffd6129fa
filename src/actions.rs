//! Radial menu actions and their execution
//!
//! Slices come from `radial_menu.slices` in the config. Each one becomes a
//! [`MenuAction`]; the `submenu` type gets the AI submenu, and with
//! `easy_switch_shortcuts` enabled slot 5 becomes the Easy-Switch host picker.
//!
//! Launching is non-blocking: processes are spawned with stdio discarded and
//! never awaited.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::config::{Config, RadialMenuConfig, SliceConfig};
use crate::dbus::DaemonProxy;

/// Slot replaced by the Easy-Switch submenu
pub const EASY_SWITCH_SLOT: usize = 5;

/// Limit for the daemon's `SetHost` call
pub const SET_HOST_TIMEOUT: Duration = Duration::from_secs(5);

/// Highest Easy-Switch host index
pub const MAX_HOST_INDEX: u8 = 2;

/// Emoji pickers, first launchable wins
const EMOJI_PICKERS: &[&[&str]] = &[
    &["plasma-emojier"],
    &["gnome-characters"],
    &["ibus", "emoji"],
    &["xdg-open", "https://emojipedia.org"],
];

/// Settings dashboard launcher
const SETTINGS_COMMAND: &str = "juhradial-settings";

/// GTK symbolic icon names to internal icon ids
const ICON_NAME_MAP: &[(&str, &str)] = &[
    ("media-playback-start-symbolic", "play_pause"),
    ("media-skip-forward-symbolic", "next_track"),
    ("media-skip-backward-symbolic", "prev_track"),
    ("audio-volume-high-symbolic", "volume_up"),
    ("audio-volume-low-symbolic", "volume_down"),
    ("audio-volume-muted-symbolic", "mute"),
    ("camera-photo-symbolic", "screenshot"),
    ("system-lock-screen-symbolic", "lock"),
    ("folder-symbolic", "folder"),
    ("utilities-terminal-symbolic", "terminal"),
    ("web-browser-symbolic", "browser"),
    ("document-new-symbolic", "note"),
    ("accessories-calculator-symbolic", "calculator"),
    ("emblem-system-symbolic", "settings"),
    ("face-smile-symbolic", "emoji"),
    ("applications-science-symbolic", "ai"),
];

/// Map a GTK icon name to an internal icon id, `settings` when unknown
pub fn map_icon(gtk_icon: &str) -> &'static str {
    ICON_NAME_MAP
        .iter()
        .find(|(gtk, _)| *gtk == gtk_icon)
        .map(|(_, id)| *id)
        .unwrap_or("settings")
}

// ============================================================================
// Action Model
// ============================================================================

/// What a slice or submenu item does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    /// Shell command
    Exec(String),
    /// Opened with xdg-open
    Url(String),
    /// Emoji picker
    Emoji,
    /// Settings dashboard
    Settings,
    /// Opens a submenu instead of running anything
    Submenu(Vec<SubAction>),
    /// Switch the mouse to another paired host (raw index text)
    EasySwitch(String),
    /// Unrecognised type from the config
    Unknown(String),
}

impl ActionKind {
    fn from_slice(slice: &SliceConfig) -> Self {
        match slice.action_type.as_str() {
            "exec" => ActionKind::Exec(slice.command.clone()),
            "url" => ActionKind::Url(slice.command.clone()),
            "emoji" => ActionKind::Emoji,
            "settings" => ActionKind::Settings,
            "submenu" => ActionKind::Submenu(ai_submenu()),
            "easy_switch" => ActionKind::EasySwitch(slice.command.clone()),
            other => ActionKind::Unknown(other.to_string()),
        }
    }

    pub fn is_submenu(&self) -> bool {
        matches!(self, ActionKind::Submenu(_))
    }

    /// Submenu items, empty for everything else
    pub fn subitems(&self) -> &[SubAction] {
        match self {
            ActionKind::Submenu(items) => items,
            _ => &[],
        }
    }

    /// Short type name, as used in the config
    pub fn type_name(&self) -> &'static str {
        match self {
            ActionKind::Exec(_) => "exec",
            ActionKind::Url(_) => "url",
            ActionKind::Emoji => "emoji",
            ActionKind::Settings => "settings",
            ActionKind::Submenu(_) => "submenu",
            ActionKind::EasySwitch(_) => "easy_switch",
            ActionKind::Unknown(_) => "unknown",
        }
    }
}

/// Submenu entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubAction {
    pub label: String,
    pub kind: ActionKind,
    pub icon: String,
}

impl SubAction {
    fn new(label: &str, kind: ActionKind, icon: &str) -> Self {
        Self {
            label: label.to_string(),
            kind,
            icon: icon.to_string(),
        }
    }
}

/// One slice of the radial menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuAction {
    pub label: String,
    pub kind: ActionKind,
    /// Palette color name
    pub color: String,
    /// Internal icon id
    pub icon: String,
}

impl MenuAction {
    fn from_slice(slice: &SliceConfig) -> Self {
        Self {
            label: slice.label.clone(),
            kind: ActionKind::from_slice(slice),
            color: slice.color.clone(),
            icon: map_icon(&slice.icon).to_string(),
        }
    }
}

pub fn ai_submenu() -> Vec<SubAction> {
    vec![
        SubAction::new("Claude", ActionKind::Url("https://claude.ai".to_string()), "claude"),
        SubAction::new(
            "ChatGPT",
            ActionKind::Url("https://chat.openai.com".to_string()),
            "chatgpt",
        ),
        SubAction::new(
            "Gemini",
            ActionKind::Url("https://gemini.google.com".to_string()),
            "gemini",
        ),
        SubAction::new(
            "Perplexity",
            ActionKind::Url("https://perplexity.ai".to_string()),
            "perplexity",
        ),
    ]
}

pub fn easy_switch_submenu() -> Vec<SubAction> {
    (0..=MAX_HOST_INDEX)
        .map(|host| {
            SubAction::new(
                &format!("Host {}", host + 1),
                ActionKind::EasySwitch(host.to_string()),
                &format!("host{}", host + 1),
            )
        })
        .collect()
}

/// Build the slice list from the radial menu config
///
/// An empty slice list yields the defaults.
pub fn load_actions(menu: &RadialMenuConfig) -> Vec<MenuAction> {
    if menu.slices.is_empty() {
        tracing::info!("No radial_menu slices in config, using defaults");
        return default_actions();
    }

    let actions: Vec<MenuAction> = menu
        .slices
        .iter()
        .enumerate()
        .map(|(i, slice)| {
            if menu.easy_switch_shortcuts && i == EASY_SWITCH_SLOT {
                tracing::debug!(slot = i, replaced = %slice.label, "Easy-Switch submenu enabled");
                MenuAction {
                    label: "Easy-Switch".to_string(),
                    kind: ActionKind::Submenu(easy_switch_submenu()),
                    color: slice.color.clone(),
                    icon: "easy_switch".to_string(),
                }
            } else {
                MenuAction::from_slice(slice)
            }
        })
        .collect();

    tracing::debug!(count = actions.len(), "Loaded actions from config");
    actions
}

/// Actions for a full config
pub fn actions_for(config: &Config) -> Vec<MenuAction> {
    load_actions(&config.radial_menu)
}

pub fn default_actions() -> Vec<MenuAction> {
    crate::config::default_slices()
        .iter()
        .map(MenuAction::from_slice)
        .collect()
}

// ============================================================================
// Execution
// ============================================================================

/// What running an action amounts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Launch {
    /// Try each argv in order until one spawns
    Spawn(Vec<Vec<String>>),
    /// Ask the daemon to switch hosts
    SwitchHost(u8),
    /// Nothing to run
    Nothing,
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

/// Validate a URL before handing it to xdg-open
///
/// A leading `-` would be parsed as an option.
pub fn validate_url(url: &str) -> Result<&str, ActionError> {
    if url.starts_with('-') {
        return Err(ActionError::InvalidUrl(url.to_string()));
    }
    Ok(url)
}

/// Parse an Easy-Switch host index (0..=2)
pub fn parse_host_index(raw: &str) -> Result<u8, ActionError> {
    match raw.trim().parse::<u8>() {
        Ok(index) if index <= MAX_HOST_INDEX => Ok(index),
        _ => Err(ActionError::InvalidHost(raw.to_string())),
    }
}

/// Resolve an action into what has to be launched
pub fn plan(kind: &ActionKind) -> Result<Launch, ActionError> {
    match kind {
        ActionKind::Exec(command) => {
            if command.trim().is_empty() {
                return Ok(Launch::Nothing);
            }
            Ok(Launch::Spawn(vec![argv(&["sh", "-c", command])]))
        }
        ActionKind::Url(url) => {
            let url = validate_url(url)?;
            Ok(Launch::Spawn(vec![argv(&["xdg-open", url])]))
        }
        ActionKind::Emoji => Ok(Launch::Spawn(
            EMOJI_PICKERS.iter().map(|cmd| argv(cmd)).collect(),
        )),
        ActionKind::Settings => {
            let mut candidates = vec![argv(&[SETTINGS_COMMAND])];
            if let Some(path) = Config::default_config_path() {
                candidates.push(vec!["xdg-open".to_string(), path.display().to_string()]);
            }
            Ok(Launch::Spawn(candidates))
        }
        ActionKind::EasySwitch(raw) => Ok(Launch::SwitchHost(parse_host_index(raw)?)),
        ActionKind::Submenu(_) => Ok(Launch::Nothing),
        ActionKind::Unknown(kind) => {
            tracing::warn!(kind = %kind, "Unknown action type");
            Ok(Launch::Nothing)
        }
    }
}

/// Spawn the first candidate that can be launched
///
/// Only a missing executable moves on to the next candidate.
fn spawn_first(candidates: &[Vec<String>]) -> Result<(), ActionError> {
    for candidate in candidates {
        let Some((program, args)) = candidate.split_first() else {
            continue;
        };

        let result = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match result {
            Ok(_child) => {
                tracing::debug!(program = %program, "Spawned");
                return Ok(());
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(program = %program, "Not installed, trying next");
            }
            Err(e) => {
                tracing::error!(program = %program, error = %e, "Failed to spawn");
                return Err(ActionError::SpawnFailed(e));
            }
        }
    }
    Err(ActionError::NoLauncher)
}

/// Runs actions, using the daemon for Easy-Switch
pub struct ActionRunner {
    connection: Option<zbus::Connection>,
}

impl ActionRunner {
    pub fn new(connection: Option<zbus::Connection>) -> Self {
        Self { connection }
    }

    /// Execute an action
    pub async fn run(&self, kind: &ActionKind) -> Result<(), ActionError> {
        match plan(kind)? {
            Launch::Spawn(candidates) => {
                tracing::info!(kind = kind.type_name(), "Executing action");
                spawn_first(&candidates)
            }
            Launch::SwitchHost(index) => self.switch_host(index).await,
            Launch::Nothing => Ok(()),
        }
    }

    async fn switch_host(&self, index: u8) -> Result<(), ActionError> {
        let connection = self
            .connection
            .as_ref()
            .ok_or_else(|| ActionError::HostSwitchFailed("No session bus".to_string()))?;

        tracing::info!(host = index, "Easy-Switch: switching host");
        let call = async {
            let proxy = DaemonProxy::new(connection).await?;
            proxy.set_host(index).await
        };

        match tokio::time::timeout(SET_HOST_TIMEOUT, call).await {
            Ok(Ok(true)) => {
                tracing::info!(host = index, "Easy-Switch: switch requested");
                Ok(())
            }
            Ok(Ok(false)) => Err(ActionError::HostSwitchFailed(format!(
                "daemon refused host {}",
                index
            ))),
            Ok(Err(e)) => Err(ActionError::HostSwitchFailed(e.to_string())),
            Err(_) => Err(ActionError::Timeout),
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Action error type
#[derive(Debug)]
pub enum ActionError {
    /// URL rejected before launching
    InvalidUrl(String),
    /// Easy-Switch host index out of range or malformed
    InvalidHost(String),
    /// Process could not be started
    SpawnFailed(std::io::Error),
    /// None of the candidate programs is installed
    NoLauncher,
    /// Daemon call failed or returned false
    HostSwitchFailed(String),
    /// Daemon did not answer in time
    Timeout,
}

impl ActionError {
    /// Whether the user gets the `invalid` haptic pulse
    pub fn is_invalid_feedback(&self) -> bool {
        matches!(
            self,
            ActionError::InvalidHost(_) | ActionError::HostSwitchFailed(_) | ActionError::Timeout
        )
    }
}

impl std::fmt::Display for ActionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionError::InvalidUrl(url) => write!(f, "Invalid URL (starts with -): {}", url),
            ActionError::InvalidHost(raw) => write!(f, "Invalid host index {:?}, must be 0-2", raw),
            ActionError::SpawnFailed(e) => write!(f, "Spawn failed: {}", e),
            ActionError::NoLauncher => write!(f, "No launcher available"),
            ActionError::HostSwitchFailed(msg) => write!(f, "Easy-Switch failed: {}", msg),
            ActionError::Timeout => write!(f, "Easy-Switch D-Bus call timed out"),
        }
    }
}

impl std::error::Error for ActionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ActionError::SpawnFailed(e) => Some(e),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn slice(label: &str, action_type: &str, command: &str, icon: &str) -> SliceConfig {
        SliceConfig {
            label: label.to_string(),
            action_id: None,
            action_type: action_type.to_string(),
            command: command.to_string(),
            color: "teal".to_string(),
            icon: icon.to_string(),
        }
    }

    #[test]
    fn test_default_actions() {
        let actions = default_actions();
        assert_eq!(actions.len(), 8);

        let labels: Vec<&str> = actions.iter().map(|a| a.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Play/Pause", "New Note", "Lock", "Settings", "Screenshot", "Emoji", "Files", "AI"]
        );
        assert_eq!(actions[0].kind, ActionKind::Exec("playerctl play-pause".to_string()));
        assert_eq!(actions[0].icon, "play_pause");
        assert_eq!(actions[3].kind, ActionKind::Settings);
        assert_eq!(actions[5].kind, ActionKind::Emoji);
        assert_eq!(actions[6].icon, "folder");
        assert_eq!(actions[7].kind.subitems().len(), 4);
        assert_eq!(actions[7].color, "teal");
    }

    #[test]
    fn test_icon_mapping() {
        assert_eq!(map_icon("camera-photo-symbolic"), "screenshot");
        assert_eq!(map_icon("applications-science-symbolic"), "ai");
        assert_eq!(map_icon("application-x-executable-symbolic"), "settings");
        assert_eq!(map_icon(""), "settings");
    }

    #[test]
    fn test_load_actions_from_config_slices() {
        let menu = RadialMenuConfig {
            slices: vec![
                slice("Term", "exec", "konsole", "utilities-terminal-symbolic"),
                slice("Docs", "url", "https://docs.rs", "web-browser-symbolic"),
                slice("Weird", "kwin", "", "nope"),
            ],
            easy_switch_shortcuts: false,
        };

        let actions = load_actions(&menu);
        assert_eq!(actions.len(), 3);
        assert_eq!(actions[0].icon, "terminal");
        assert_eq!(actions[1].kind, ActionKind::Url("https://docs.rs".to_string()));
        assert_eq!(actions[2].kind, ActionKind::Unknown("kwin".to_string()));
        assert_eq!(actions[2].icon, "settings");
    }

    #[test]
    fn test_empty_slices_use_defaults() {
        let menu = RadialMenuConfig {
            slices: Vec::new(),
            easy_switch_shortcuts: true,
        };
        assert_eq!(load_actions(&menu), default_actions());
    }

    #[test]
    fn test_easy_switch_replaces_slot_five() {
        let menu = RadialMenuConfig {
            easy_switch_shortcuts: true,
            ..Default::default()
        };

        let actions = load_actions(&menu);
        let slot = &actions[EASY_SWITCH_SLOT];
        assert_eq!(slot.label, "Easy-Switch");
        assert_eq!(slot.icon, "easy_switch");
        assert_eq!(slot.color, "pink");

        let hosts = slot.kind.subitems();
        assert_eq!(hosts.len(), 3);
        assert_eq!(hosts[0].label, "Host 1");
        assert_eq!(hosts[2].kind, ActionKind::EasySwitch("2".to_string()));
        assert_eq!(hosts[1].icon, "host2");

        // Other slots untouched
        assert_eq!(actions[4].label, "Screenshot");
    }

    #[test]
    fn test_easy_switch_needs_six_slices() {
        let menu = RadialMenuConfig {
            slices: vec![slice("A", "exec", "true", ""); 3],
            easy_switch_shortcuts: true,
        };
        let actions = load_actions(&menu);
        assert!(actions.iter().all(|a| a.label == "A"));
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://claude.ai").is_ok());
        assert!(matches!(validate_url("--help"), Err(ActionError::InvalidUrl(_))));
    }

    #[test]
    fn test_parse_host_index() {
        assert_eq!(parse_host_index("0").unwrap(), 0);
        assert_eq!(parse_host_index(" 2 ").unwrap(), 2);
        assert!(parse_host_index("3").is_err());
        assert!(parse_host_index("-1").is_err());
        assert!(parse_host_index("host").is_err());
    }

    #[test]
    fn test_plan() {
        assert_eq!(
            plan(&ActionKind::Exec("dolphin ~".to_string())).unwrap(),
            Launch::Spawn(vec![argv(&["sh", "-c", "dolphin ~"])])
        );
        assert_eq!(plan(&ActionKind::Exec("  ".to_string())).unwrap(), Launch::Nothing);
        assert_eq!(
            plan(&ActionKind::Url("https://perplexity.ai".to_string())).unwrap(),
            Launch::Spawn(vec![argv(&["xdg-open", "https://perplexity.ai"])])
        );
        assert_eq!(plan(&ActionKind::EasySwitch("1".to_string())).unwrap(), Launch::SwitchHost(1));
        assert_eq!(plan(&ActionKind::Submenu(ai_submenu())).unwrap(), Launch::Nothing);
        assert_eq!(plan(&ActionKind::Unknown("kwin".to_string())).unwrap(), Launch::Nothing);
    }

    #[test]
    fn test_emoji_plan_order() {
        let Launch::Spawn(candidates) = plan(&ActionKind::Emoji).unwrap() else {
            panic!("expected spawn");
        };
        assert_eq!(candidates.len(), 4);
        assert_eq!(candidates[0], argv(&["plasma-emojier"]));
        assert_eq!(candidates[2], argv(&["ibus", "emoji"]));
        assert_eq!(candidates[3][0], "xdg-open");
    }

    #[test]
    fn test_invalid_feedback() {
        assert!(ActionError::InvalidHost("9".to_string()).is_invalid_feedback());
        assert!(ActionError::Timeout.is_invalid_feedback());
        assert!(ActionError::HostSwitchFailed("x".to_string()).is_invalid_feedback());
        assert!(!ActionError::InvalidUrl("-x".to_string()).is_invalid_feedback());
        assert!(!ActionError::NoLauncher.is_invalid_feedback());
    }

    #[tokio::test]
    async fn test_spawn_skips_missing_programs() {
        let candidates = vec![
            argv(&["juhradial-definitely-not-installed"]),
            argv(&["sh", "-c", "true"]),
        ];
        assert!(spawn_first(&candidates).is_ok());

        let missing = vec![argv(&["juhradial-definitely-not-installed"])];
        assert!(matches!(spawn_first(&missing), Err(ActionError::NoLauncher)));
    }

    #[tokio::test]
    async fn test_easy_switch_without_bus_fails() {
        let runner = ActionRunner::new(None);
        let err = runner.run(&ActionKind::EasySwitch("1".to_string())).await.unwrap_err();
        assert!(err.is_invalid_feedback());

        let err = runner.run(&ActionKind::EasySwitch("7".to_string())).await.unwrap_err();
        assert!(matches!(err, ActionError::InvalidHost(_)));
    }
}
