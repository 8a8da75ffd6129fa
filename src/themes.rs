//! Radial menu theme registry
//!
//! Only the parts of a theme that affect menu behaviour live here: identity,
//! light/dark flag, the optional 3D wheel image and its ring geometry. The
//! ring geometry decides how large the center dead zone is.

use crate::geometry::CENTER_ZONE_RADIUS;

/// Theme used for `system` and unknown names
pub const DEFAULT_THEME: &str = "juhradial-mx";

/// Ring geometry of an image-based (3D) theme
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialParams {
    /// Rendered wheel image size in pixels
    pub image_size: i32,
    /// Radius icons are drawn on
    pub icon_radius: i32,
    /// Inner edge of the slice ring
    pub ring_inner: i32,
    /// Outer edge of the slice ring
    pub ring_outer: i32,
    /// Explicit dead zone radius, overrides `ring_inner`
    pub center_radius: Option<i32>,
}

/// A theme entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub is_dark: bool,
    /// Wheel image file name for 3D themes
    pub radial_image: Option<&'static str>,
    pub radial_params: Option<RadialParams>,
}

impl Theme {
    /// Dead zone radius for hit-testing
    pub fn center_radius(&self) -> i32 {
        self.radial_params
            .map(|p| p.center_radius.unwrap_or(p.ring_inner))
            .unwrap_or(CENTER_ZONE_RADIUS)
    }
}

const WHEEL_PARAMS: RadialParams = RadialParams {
    image_size: 310,
    icon_radius: 101,
    ring_inner: 58,
    ring_outer: 144,
    center_radius: None,
};

const fn vector(
    key: &'static str,
    name: &'static str,
    description: &'static str,
    is_dark: bool,
) -> Theme {
    Theme {
        key,
        name,
        description,
        is_dark,
        radial_image: None,
        radial_params: None,
    }
}

const fn wheel(
    key: &'static str,
    name: &'static str,
    description: &'static str,
    image: &'static str,
) -> Theme {
    Theme {
        key,
        name,
        description,
        is_dark: true,
        radial_image: Some(image),
        radial_params: Some(WHEEL_PARAMS),
    }
}

/// All bundled themes, in display order
pub const THEMES: &[Theme] = &[
    vector("juhradial-mx", "JuhRadial MX", "Premium dark theme with vibrant cyan accents", true),
    vector(
        "catppuccin-mocha",
        "Catppuccin Mocha",
        "Soothing pastel theme with lavender accents",
        true,
    ),
    vector("nord", "Nord", "Arctic, north-bluish color palette", true),
    vector("dracula", "Dracula", "Dark theme with vibrant colors", true),
    vector("catppuccin-latte", "Catppuccin Latte", "Soothing pastel light theme", false),
    vector("github-light", "GitHub Light", "Clean light theme inspired by GitHub", false),
    vector("solarized-light", "Solarized Light", "Precision colors for machines and people", false),
    wheel(
        "3d-blossom",
        "Pearl Blossom (3D)",
        "Elegant pearl radial wheel with blossom pink tones",
        "radialwheel2.png",
    ),
    wheel(
        "3d-neon",
        "Neon Sci-Fi (3D)",
        "Cyberpunk neon radial wheel with electric glow",
        "radialwheel3.png",
    ),
    wheel(
        "3d-pastel",
        "Dark Ember (3D)",
        "Dark elegant radial wheel with golden accents",
        "radialwheel4.png",
    ),
    wheel(
        "3d-crystal",
        "Golden Classic (3D)",
        "Ornamental radial wheel with golden filigree",
        "radialwheel5.png",
    ),
];

/// Look up a theme by key
pub fn get_theme(key: &str) -> Option<&'static Theme> {
    THEMES.iter().find(|t| t.key == key)
}

/// Resolve a configured theme name
///
/// `system` maps to the default theme; unknown names fall back to it too.
pub fn resolve_theme(name: &str) -> &'static Theme {
    let key = if name == "system" { DEFAULT_THEME } else { name };
    match get_theme(key) {
        Some(theme) => theme,
        None => {
            tracing::warn!(theme = name, fallback = DEFAULT_THEME, "Unknown theme");
            default_theme()
        }
    }
}

pub fn default_theme() -> &'static Theme {
    &THEMES[0]
}
