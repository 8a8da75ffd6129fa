//! Configuration management for JuhRadial MX
//!
//! Loads `~/.config/juhradial/config.json`, the document shared with the
//! daemon and the settings dashboard. Every key missing from the file is
//! filled from defaults; nested objects merge field by field, arrays such as
//! `radial_menu.slices` replace the default wholesale. Values written in
//! another shape by the daemon (integer haptic intensities) keep their
//! defaults instead of failing the whole file.
//!
//! The overlay never writes the file. [`ConfigWatcher`] picks up changes made
//! by the settings dashboard, and the controller re-reads it before every show.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

// ============================================================================
// Constants
// ============================================================================

/// Default config directory name
const CONFIG_DIR: &str = "juhradial";

/// Default config file name
const CONFIG_FILE: &str = "config.json";

// ============================================================================
// Haptic Configuration
// ============================================================================

/// Per-event haptic waveform names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HapticEventConfig {
    pub menu_appear: String,
    pub slice_change: String,
    pub confirm: String,
    pub invalid: String,
}

impl Default for HapticEventConfig {
    fn default() -> Self {
        Self {
            menu_appear: "damp_state_change".to_string(),
            slice_change: "subtle_collision".to_string(),
            confirm: "sharp_state_change".to_string(),
            invalid: "angry_alert".to_string(),
        }
    }
}

/// Haptic feedback configuration (applied by the daemon)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HapticConfig {
    /// Enable haptic feedback
    pub enabled: bool,
    /// Waveform used when an event has no override
    pub default_pattern: String,
    /// Per-event waveform overrides
    pub per_event: HapticEventConfig,
    /// Minimum time between pulses in milliseconds
    pub debounce_ms: u64,
    /// Minimum time between slice change pulses in milliseconds
    pub slice_debounce_ms: u64,
    /// Re-entry window for the same slice in milliseconds
    pub reentry_debounce_ms: u64,
}

impl Default for HapticConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_pattern: "subtle_collision".to_string(),
            per_event: HapticEventConfig::default(),
            debounce_ms: 20,
            slice_debounce_ms: 20,
            reentry_debounce_ms: 50,
        }
    }
}

// ============================================================================
// Device Settings (owned by the dashboard, carried for completeness)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerConfig {
    pub speed: u8,
    pub acceleration: bool,
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            speed: 10,
            acceleration: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    pub natural: bool,
    pub smooth: bool,
    pub smartshift: bool,
    pub smartshift_threshold: u8,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            natural: false,
            smooth: true,
            smartshift: true,
            smartshift_threshold: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub start_at_login: bool,
    pub show_tray_icon: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            start_at_login: true,
            show_tray_icon: true,
        }
    }
}

// ============================================================================
// Radial Menu
// ============================================================================

/// One configured slice, as written by the settings dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliceConfig {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_id: Option<String>,
    /// Action type: exec, url, emoji, settings, submenu, easy_switch
    #[serde(rename = "type")]
    pub action_type: String,
    pub command: String,
    pub color: String,
    /// GTK symbolic icon name
    pub icon: String,
}

impl Default for SliceConfig {
    fn default() -> Self {
        Self {
            label: "Action".to_string(),
            action_id: None,
            action_type: "exec".to_string(),
            command: String::new(),
            color: "teal".to_string(),
            icon: "application-x-executable-symbolic".to_string(),
        }
    }
}

impl SliceConfig {
    fn new(
        label: &str,
        action_id: &str,
        action_type: &str,
        command: &str,
        color: &str,
        icon: &str,
    ) -> Self {
        Self {
            label: label.to_string(),
            action_id: Some(action_id.to_string()),
            action_type: action_type.to_string(),
            command: command.to_string(),
            color: color.to_string(),
            icon: icon.to_string(),
        }
    }
}

/// Default slices, clockwise from the top
pub fn default_slices() -> Vec<SliceConfig> {
    vec![
        SliceConfig::new(
            "Play/Pause",
            "play_pause",
            "exec",
            "playerctl play-pause",
            "green",
            "media-playback-start-symbolic",
        ),
        SliceConfig::new(
            "New Note",
            "new_note",
            "exec",
            "kwrite",
            "yellow",
            "document-new-symbolic",
        ),
        SliceConfig::new(
            "Lock",
            "lock",
            "exec",
            "loginctl lock-session",
            "red",
            "system-lock-screen-symbolic",
        ),
        SliceConfig::new(
            "Settings",
            "settings",
            "settings",
            "",
            "mauve",
            "emblem-system-symbolic",
        ),
        SliceConfig::new(
            "Screenshot",
            "screenshot",
            "exec",
            "spectacle",
            "blue",
            "camera-photo-symbolic",
        ),
        SliceConfig::new(
            "Emoji",
            "emoji",
            "emoji",
            "",
            "pink",
            "face-smile-symbolic",
        ),
        SliceConfig::new(
            "Files",
            "files",
            "exec",
            "dolphin",
            "sapphire",
            "folder-symbolic",
        ),
        SliceConfig::new(
            "AI",
            "ai",
            "submenu",
            "",
            "teal",
            "applications-science-symbolic",
        ),
    ]
}

/// Radial menu layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadialMenuConfig {
    pub slices: Vec<SliceConfig>,
    /// Replace the Emoji slot with an Easy-Switch host submenu
    pub easy_switch_shortcuts: bool,
}

impl Default for RadialMenuConfig {
    fn default() -> Self {
        Self {
            slices: default_slices(),
            easy_switch_shortcuts: false,
        }
    }
}

// ============================================================================
// Main Configuration
// ============================================================================

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Haptic feedback settings
    pub haptics: HapticConfig,
    /// UI language (`system` follows the locale)
    pub language: String,
    /// Current theme name
    pub theme: String,
    /// Enable blur effects
    pub blur_enabled: bool,
    pub pointer: PointerConfig,
    pub scroll: ScrollConfig,
    pub app: AppConfig,
    pub radial_menu: RadialMenuConfig,

    /// Configuration file path (not serialized)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            haptics: HapticConfig::default(),
            language: "system".to_string(),
            theme: "catppuccin-mocha".to_string(),
            blur_enabled: true,
            pointer: PointerConfig::default(),
            scroll: ScrollConfig::default(),
            app: AppConfig::default(),
            radial_menu: RadialMenuConfig::default(),
            config_path: None,
        }
    }
}

impl Config {
    /// Get the default config directory path
    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(CONFIG_DIR))
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        Self::default_config_dir().map(|p| p.join(CONFIG_FILE))
    }

    /// Load configuration from the default location
    ///
    /// Returns default config if file doesn't exist.
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_config_path() {
            Some(path) => Self::load(&path),
            None => {
                tracing::warn!("Could not determine config directory, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from file path
    ///
    /// Returns default config if file doesn't exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::info!(path = %path.display(), "Config file not found, using defaults");
            let mut config = Self::default();
            config.config_path = Some(path.to_path_buf());
            return Ok(config);
        }

        let contents = fs::read_to_string(path).map_err(ConfigError::IoError)?;
        let document: Value = serde_json::from_str(&contents).map_err(ConfigError::ParseError)?;
        let mut config = Self::from_document(document)?;
        config.config_path = Some(path.to_path_buf());

        tracing::info!(
            path = %path.display(),
            theme = %config.theme,
            slices = config.radial_menu.slices.len(),
            easy_switch = config.radial_menu.easy_switch_shortcuts,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Build a config from a parsed `config.json` document
    ///
    /// The document is merged over the defaults key by key. A value whose JSON
    /// type differs from the default is ignored, as is a slice that does not
    /// describe an action. A section that still fails to deserialize falls
    /// back to its defaults without touching the others. Only a root that is
    /// not an object is an error.
    pub fn from_document(document: Value) -> Result<Self, ConfigError> {
        if !document.is_object() {
            return Err(ConfigError::ValidationError(
                "Config root is not a JSON object".to_string(),
            ));
        }

        let defaults = serde_json::to_value(Self::default()).map_err(ConfigError::ParseError)?;
        let mut merged = defaults.clone();
        let mut ignored = Vec::new();
        merge_over(&mut merged, document, "", &mut ignored);
        drop_invalid_slices(&mut merged, &mut ignored);

        if !ignored.is_empty() {
            tracing::debug!(keys = ?ignored, "Ignored config values with unexpected types");
        }

        match serde_json::from_value(merged.clone()) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(error = %e, "Config did not match schema, checking sections");
                restore_failing_sections(&mut merged, &defaults);
                serde_json::from_value(merged).map_err(ConfigError::ParseError)
            }
        }
    }

    /// Get a nested value by key path
    ///
    /// `get(&["radial_menu", "easy_switch_shortcuts"])` returns the JSON value,
    /// or `None` when any key along the path is missing.
    pub fn get(&self, keys: &[&str]) -> Option<Value> {
        let mut value = serde_json::to_value(self).ok()?;
        for key in keys {
            value = match value {
                Value::Object(mut map) => map.remove(*key)?,
                Value::Array(mut items) => {
                    let index: usize = key.parse().ok()?;
                    if index >= items.len() {
                        return None;
                    }
                    items.swap_remove(index)
                }
                _ => return None,
            };
        }
        Some(value)
    }

    /// Set a nested value by key path (in memory only)
    ///
    /// Intermediate objects are created as needed. The result must still
    /// deserialize as a `Config`, otherwise nothing changes.
    pub fn set(&mut self, keys: &[&str], new_value: Value) -> Result<(), ConfigError> {
        let (last, parents) = keys
            .split_last()
            .ok_or_else(|| ConfigError::ValidationError("Empty key path".to_string()))?;

        let mut root = serde_json::to_value(&*self).map_err(ConfigError::ParseError)?;
        let mut target = &mut root;
        for key in parents {
            let map = target.as_object_mut().ok_or_else(|| {
                ConfigError::ValidationError(format!("'{}' is not an object", key))
            })?;
            target = map
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Default::default()));
        }

        target
            .as_object_mut()
            .ok_or_else(|| ConfigError::ValidationError(format!("Cannot set '{}'", last)))?
            .insert(last.to_string(), new_value);

        let mut updated: Config = serde_json::from_value(root).map_err(ConfigError::ParseError)?;
        updated.config_path = self.config_path.take();
        *self = updated;
        Ok(())
    }
}

/// Deep-merge `overlay` into `base`
///
/// Objects merge per key, every other value replaces the base when its JSON
/// type matches. Keys the base does not have are dropped. Paths of skipped
/// values are pushed onto `ignored`.
fn merge_over(base: &mut Value, overlay: Value, path: &str, ignored: &mut Vec<String>) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                if let Some(slot) = base.get_mut(&key) {
                    let child = if path.is_empty() { key } else { format!("{}.{}", path, key) };
                    merge_over(slot, value, &child, ignored);
                }
            }
        }
        (base, overlay) if same_kind(&*base, &overlay) => *base = overlay,
        _ => ignored.push(path.to_string()),
    }
}

fn same_kind(base: &Value, overlay: &Value) -> bool {
    match (base, overlay) {
        (Value::Bool(_), Value::Bool(_)) => true,
        (Value::String(_), Value::String(_)) => true,
        (Value::Array(_), Value::Array(_)) => true,
        (Value::Number(b), Value::Number(o)) => !b.is_u64() || o.is_u64(),
        _ => false,
    }
}

/// Keep only slices that deserialize on their own
fn drop_invalid_slices(merged: &mut Value, ignored: &mut Vec<String>) {
    let Some(slices) = merged
        .pointer_mut("/radial_menu/slices")
        .and_then(Value::as_array_mut)
    else {
        return;
    };

    let mut index = 0;
    slices.retain(|slice| {
        let keep = serde_json::from_value::<SliceConfig>(slice.clone()).is_ok();
        if !keep {
            ignored.push(format!("radial_menu.slices.{}", index));
        }
        index += 1;
        keep
    });
}

/// Reset every top-level section that fails to deserialize on its own
fn restore_failing_sections(merged: &mut Value, defaults: &Value) {
    let (Some(merged_map), Some(default_map)) = (merged.as_object_mut(), defaults.as_object())
    else {
        return;
    };

    for (key, default_value) in default_map {
        let Some(value) = merged_map.get(key) else {
            continue;
        };
        let mut trial = default_map.clone();
        trial.insert(key.clone(), value.clone());
        if let Err(e) = serde_json::from_value::<Config>(Value::Object(trial)) {
            tracing::warn!(section = %key, error = %e, "Invalid config section, using defaults");
            merged_map.insert(key.clone(), default_value.clone());
        }
    }
}

/// Expand a leading `~/` to the home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// Split a dotted key path (`radial_menu.slices.0.label`)
pub fn split_key_path(path: &str) -> Vec<&str> {
    path.split('.').filter(|s| !s.is_empty()).collect()
}

// ============================================================================
// Shared Config (for hot-reload)
// ============================================================================

/// Thread-safe shared configuration for hot-reload support
pub type SharedConfig = Arc<RwLock<Config>>;

/// Create a new shared config with defaults
pub fn new_shared_config() -> SharedConfig {
    Arc::new(RwLock::new(Config::default()))
}

/// Create a new shared config from file (or defaults if file doesn't exist)
pub fn load_shared_config<P: AsRef<Path>>(path: P) -> Result<SharedConfig, ConfigError> {
    let config = Config::load(path)?;
    Ok(Arc::new(RwLock::new(config)))
}

/// Reload `path` into `shared`, keeping the old config on failure
pub fn reload_into(shared: &SharedConfig, path: &Path) -> Result<(), ConfigError> {
    let config = Config::load(path)?;
    let mut guard = shared
        .write()
        .map_err(|e| ConfigError::ValidationError(format!("Lock error: {}", e)))?;
    *guard = config;
    Ok(())
}

/// Watches the config file and reloads it into a [`SharedConfig`]
///
/// The parent directory is watched because the dashboard saves by writing a
/// temp file and renaming it over `config.json`.
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
}

impl ConfigWatcher {
    pub fn start(path: PathBuf, shared: SharedConfig) -> Result<Self, ConfigError> {
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| ConfigError::ValidationError("Config path has no parent".to_string()))?;
        let file_name = path.file_name().map(|n| n.to_os_string());

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!(error = %e, "Config watch error");
                    return;
                }
            };

            if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                return;
            }
            let touches_config = event
                .paths
                .iter()
                .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
            if !touches_config {
                return;
            }

            match reload_into(&shared, &path) {
                Ok(()) => tracing::info!(path = %path.display(), "Configuration reloaded"),
                Err(e) => tracing::warn!(error = %e, "Config reload failed, keeping previous"),
            }
        })
        .map_err(ConfigError::WatchError)?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(ConfigError::WatchError)?;
        tracing::debug!(dir = %dir.display(), "Watching config directory");

        Ok(Self { _watcher: watcher })
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration error type
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading file
    IoError(std::io::Error),
    /// JSON parsing error
    ParseError(serde_json::Error),
    /// Validation error
    ValidationError(String),
    /// File watcher error
    WatchError(notify::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "I/O error: {}", e),
            ConfigError::ParseError(e) => write!(f, "Parse error: {}", e),
            ConfigError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ConfigError::WatchError(e) => write!(f, "Watch error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError(e) => Some(e),
            ConfigError::ParseError(e) => Some(e),
            ConfigError::ValidationError(_) => None,
            ConfigError::WatchError(e) => Some(e),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.haptics.enabled);
        assert_eq!(config.theme, "catppuccin-mocha");
        assert_eq!(config.language, "system");
        assert_eq!(config.radial_menu.slices.len(), 8);
        assert!(!config.radial_menu.easy_switch_shortcuts);
    }

    #[test]
    fn test_haptic_defaults() {
        let haptic = HapticConfig::default();
        assert_eq!(haptic.default_pattern, "subtle_collision");
        assert_eq!(haptic.per_event.menu_appear, "damp_state_change");
        assert_eq!(haptic.per_event.invalid, "angry_alert");
        assert_eq!(haptic.slice_debounce_ms, 20);
        assert_eq!(haptic.reentry_debounce_ms, 50);
    }

    #[test]
    fn test_config_json_minimal() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_nested_objects_merge_with_defaults() {
        let json = r#"{
            "haptics": {"per_event": {"confirm": "firework"}},
            "scroll": {"natural": true},
            "theme": "nord"
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.haptics.per_event.confirm, "firework");
        assert_eq!(config.haptics.per_event.menu_appear, "damp_state_change");
        assert!(config.haptics.enabled);
        assert!(config.scroll.natural);
        assert_eq!(config.scroll.smartshift_threshold, 50);
        assert_eq!(config.theme, "nord");
    }

    #[test]
    fn test_slices_replace_defaults() {
        let json = r#"{"radial_menu": {"slices": [{"label": "Term", "command": "konsole"}]}}"#;
        let config: Config = serde_json::from_str(json).unwrap();

        assert_eq!(config.radial_menu.slices.len(), 1);
        let slice = &config.radial_menu.slices[0];
        assert_eq!(slice.label, "Term");
        assert_eq!(slice.action_type, "exec");
        assert_eq!(slice.color, "teal");
        assert_eq!(slice.action_id, None);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let json = r#"{"flow": {"enabled": true}, "theme": "dracula"}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.theme, "dracula");
    }

    #[test]
    fn test_get_paths() {
        let config = Config::default();
        assert_eq!(config.get(&["theme"]), Some(json!("catppuccin-mocha")));
        assert_eq!(config.get(&["haptics", "debounce_ms"]), Some(json!(20)));
        assert_eq!(
            config.get(&["radial_menu", "slices", "2", "label"]),
            Some(json!("Lock"))
        );
        assert_eq!(config.get(&["radial_menu", "slices", "9"]), None);
        assert_eq!(config.get(&["nope"]), None);
        assert_eq!(config.get(&["theme", "deeper"]), None);
    }

    #[test]
    fn test_set_paths() {
        let mut config = Config::default();
        config.config_path = Some(PathBuf::from("/tmp/x.json"));

        config.set(&["radial_menu", "easy_switch_shortcuts"], json!(true)).unwrap();
        assert!(config.radial_menu.easy_switch_shortcuts);
        assert_eq!(config.config_path, Some(PathBuf::from("/tmp/x.json")));

        config.set(&["theme"], json!("3d-neon")).unwrap();
        assert_eq!(config.theme, "3d-neon");
    }

    #[test]
    fn test_set_rejects_wrong_type() {
        let mut config = Config::default();
        assert!(config.set(&["blur_enabled"], json!("yes")).is_err());
        assert!(config.blur_enabled);
        assert!(config.set(&[], json!(1)).is_err());
    }

    #[test]
    fn test_split_key_path() {
        assert_eq!(split_key_path("radial_menu.slices.0"), vec!["radial_menu", "slices", "0"]);
        assert_eq!(split_key_path("theme"), vec!["theme"]);
        assert!(split_key_path("").is_empty());
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde("/etc/juhradial.json"), PathBuf::from("/etc/juhradial.json"));
        assert_eq!(expand_tilde("relative.json"), PathBuf::from("relative.json"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                expand_tilde("~/.config/juhradial/config.json"),
                home.join(".config/juhradial/config.json")
            );
        }
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.theme, "catppuccin-mocha");
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_and_reload_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"theme": "nord"}"#).unwrap();

        let shared = load_shared_config(&path).unwrap();
        assert_eq!(shared.read().unwrap().theme, "nord");

        fs::write(&path, r#"{"theme": "dracula"}"#).unwrap();
        reload_into(&shared, &path).unwrap();
        assert_eq!(shared.read().unwrap().theme, "dracula");

        // Broken file keeps the previous config
        fs::write(&path, "{ not json").unwrap();
        assert!(reload_into(&shared, &path).is_err());
        assert_eq!(shared.read().unwrap().theme, "dracula");
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_daemon_written_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{
  "haptics": {
    "enabled": false,
    "intensity": 50,
    "per_event": {"menu_appear": 20, "slice_change": 40, "confirm": 80, "invalid": 30},
    "debounce_ms": 20,
    "slice_debounce_ms": 20,
    "reentry_debounce_ms": 50
  },
  "theme": "nord",
  "radial_menu": {
    "slices": [{"label": "Term", "type": "exec", "command": "konsole"}]
  }
}"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.theme, "nord");
        assert_eq!(config.radial_menu.slices.len(), 1);
        assert_eq!(config.radial_menu.slices[0].label, "Term");
        assert!(!config.haptics.enabled);
        assert_eq!(config.haptics.per_event, HapticEventConfig::default());
    }

    #[test]
    fn test_mistyped_values_keep_defaults() {
        let document = json!({
            "theme": 7,
            "blur_enabled": "no",
            "pointer": {"speed": 300, "acceleration": false},
            "scroll": {"smartshift_threshold": -5, "natural": true},
            "radial_menu": {
                "easy_switch_shortcuts": true,
                "slices": [
                    {"label": "Term", "command": "konsole"},
                    {"label": 12, "command": "broken"},
                    "not a slice"
                ]
            }
        });

        let config = Config::from_document(document).unwrap();
        assert_eq!(config.theme, "catppuccin-mocha");
        assert!(config.blur_enabled);
        // speed overflows u8, so the whole pointer section resets
        assert_eq!(config.pointer, PointerConfig::default());
        assert!(config.scroll.natural);
        assert_eq!(config.scroll.smartshift_threshold, 50);
        assert!(config.radial_menu.easy_switch_shortcuts);
        assert_eq!(config.radial_menu.slices.len(), 1);
        assert_eq!(config.radial_menu.slices[0].command, "konsole");
    }

    #[test]
    fn test_non_object_document_rejected() {
        assert!(matches!(
            Config::from_document(json!([1, 2])),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(Config::from_document(json!({"theme": null})).is_ok());
    }

    #[test]
    fn test_watcher_reloads_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"theme": "nord"}"#).unwrap();

        let shared = load_shared_config(&path).unwrap();
        let _watcher = ConfigWatcher::start(path.clone(), shared.clone()).unwrap();

        // Dashboard-style save: write a temp file, rename it over config.json
        let tmp = dir.path().join("config.json.tmp");
        fs::write(&tmp, r#"{"theme": "dracula"}"#).unwrap();
        fs::rename(&tmp, &path).unwrap();

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while shared.read().unwrap().theme != "dracula" && std::time::Instant::now() < deadline {
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        assert_eq!(shared.read().unwrap().theme, "dracula");
    }

    #[test]
    fn test_watcher_needs_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("juhradial").join("config.json");
        assert!(matches!(
            ConfigWatcher::start(path, new_shared_config()),
            Err(ConfigError::WatchError(_))
        ));
    }

    #[test]
    fn test_error_display() {
        let err = ConfigError::ValidationError("bad".to_string());
        assert!(format!("{}", err).contains("Validation error: bad"));
    }
}
