//! Desktop environment detection
//!
//! Decides which cursor backends are worth trying. Detection is purely
//! environment-variable based and happens once at startup.

/// Which compositor-specific cursor paths are available in this session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Desktop {
    /// Running under Hyprland (`HYPRLAND_INSTANCE_SIGNATURE` set)
    pub hyprland: bool,
    /// GNOME Shell session
    pub gnome: bool,
    /// COSMIC session (XWayland pointer needs forced sync)
    pub cosmic: bool,
    /// An X server (native or XWayland) is reachable via `DISPLAY`
    pub xwayland: bool,
}

impl Desktop {
    /// Detect from the process environment
    pub fn detect() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Detect from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let current_desktop = lookup("XDG_CURRENT_DESKTOP")
            .unwrap_or_default()
            .to_uppercase();

        Self {
            hyprland: lookup("HYPRLAND_INSTANCE_SIGNATURE").is_some(),
            gnome: current_desktop.contains("GNOME"),
            cosmic: current_desktop.contains("COSMIC"),
            xwayland: lookup("DISPLAY").is_some(),
        }
    }

    /// Short human-readable name for logs
    pub fn name(&self) -> &'static str {
        if self.hyprland {
            "Hyprland"
        } else if self.gnome {
            "GNOME"
        } else if self.cosmic {
            "COSMIC"
        } else if self.xwayland {
            "X11/XWayland"
        } else {
            "unknown"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn detect(vars: &[(&str, &str)]) -> Desktop {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Desktop::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_empty_environment() {
        let desktop = detect(&[]);
        assert_eq!(desktop, Desktop::default());
        assert_eq!(desktop.name(), "unknown");
    }

    #[test]
    fn test_hyprland_signature() {
        let desktop = detect(&[("HYPRLAND_INSTANCE_SIGNATURE", "abc_123"), ("DISPLAY", ":1")]);
        assert!(desktop.hyprland);
        assert!(desktop.xwayland);
        assert!(!desktop.gnome);
        assert_eq!(desktop.name(), "Hyprland");
    }

    #[test]
    fn test_current_desktop_is_case_insensitive() {
        let desktop = detect(&[("XDG_CURRENT_DESKTOP", "ubuntu:gnome")]);
        assert!(desktop.gnome);

        let desktop = detect(&[("XDG_CURRENT_DESKTOP", "COSMIC"), ("DISPLAY", ":0")]);
        assert!(desktop.cosmic);
        assert!(desktop.xwayland);
        assert_eq!(desktop.name(), "COSMIC");
    }
}
