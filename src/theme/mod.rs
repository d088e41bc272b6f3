//! Declarative theming
//!
//! A theme is a `theme.yml` file naming two palettes (light and dark),
//! font stacks and a default mode. [`compile_css`] turns it into CSS
//! custom properties plus a small inline script that applies the
//! visitor's stored choice before first paint.

mod css;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use css::{bootstrap_script, compile_css, STORAGE_KEY, THEME_ATTRIBUTE};

/// Which palette applies when the visitor has not chosen one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    /// Follow the OS preference
    #[default]
    System,
    Light,
    Dark,
}

/// Named colors for one appearance.
/// Key order is preserved so the emitted CSS matches the YAML.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Palette {
    pub light: IndexMap<String, String>,
    pub dark: IndexMap<String, String>,
}

/// Font stacks exposed as `--font-sans` and `--font-mono`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Fonts {
    pub sans: String,
    pub mono: String,
}

impl Default for Fonts {
    fn default() -> Self {
        Self {
            sans: "system-ui, -apple-system, 'Segoe UI', sans-serif".to_string(),
            mono: "ui-monospace, 'SF Mono', Menlo, monospace".to_string(),
        }
    }
}

/// Theme configuration loaded from theme.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub mode: ThemeMode,
    pub palette: Palette,
    pub fonts: Fonts,

    /// Raw CSS appended verbatim after the generated rules
    pub extra_css: String,

    /// Additional theme data exposed to templates (menus, footer text...)
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        let mut light = IndexMap::new();
        light.insert("background".to_string(), "#ffffff".to_string());
        light.insert("text".to_string(), "#111111".to_string());
        light.insert("muted".to_string(), "#666666".to_string());
        light.insert("accent".to_string(), "#0070f3".to_string());
        light.insert("border".to_string(), "#eaeaea".to_string());
        light.insert("code_background".to_string(), "#f5f5f5".to_string());

        let mut dark = IndexMap::new();
        dark.insert("background".to_string(), "#0a0a0a".to_string());
        dark.insert("text".to_string(), "#ededed".to_string());
        dark.insert("muted".to_string(), "#888888".to_string());
        dark.insert("accent".to_string(), "#3291ff".to_string());
        dark.insert("border".to_string(), "#333333".to_string());
        dark.insert("code_background".to_string(), "#1a1a1a".to_string());

        Self {
            mode: ThemeMode::System,
            palette: Palette { light, dark },
            fonts: Fonts::default(),
            extra_css: String::new(),
            extra: IndexMap::new(),
        }
    }
}

impl ThemeConfig {
    /// Load theme.yml. A missing file yields the default theme.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No theme file at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read theme file: {:?}", path))?;
        let theme: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse theme file: {:?}", path))?;
        Ok(theme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_theme() {
        let theme = ThemeConfig::default();
        assert_eq!(theme.mode, ThemeMode::System);
        assert_eq!(
            theme.palette.light.get("background").map(String::as_str),
            Some("#ffffff")
        );
        assert!(!theme.palette.dark.is_empty());
    }

    #[test]
    fn test_parse_theme_yaml() {
        let theme: ThemeConfig = serde_yaml::from_str(
            r##"
mode: dark
palette:
  light:
    background: "#fafafa"
    text: "#222222"
  dark:
    background: "#000000"
    text: "#eeeeee"
fonts:
  sans: "Inter, sans-serif"
extra_css: |
  article { max-width: 42rem; }
menu:
  - name: Home
    path: /
"##,
        )
        .unwrap();

        assert_eq!(theme.mode, ThemeMode::Dark);
        assert_eq!(
            theme.palette.light.get("background").map(String::as_str),
            Some("#fafafa")
        );
        assert_eq!(theme.fonts.sans, "Inter, sans-serif");
        // Mono keeps its default when omitted
        assert!(theme.fonts.mono.contains("monospace"));
        assert!(theme.extra_css.contains("article { max-width: 42rem; }"));
        assert!(theme.extra.contains_key("menu"));
        assert!(!theme.extra.contains_key("extra_css"));
    }

    #[test]
    fn test_palette_preserves_order() {
        let theme: ThemeConfig = serde_yaml::from_str(
            r##"
palette:
  light:
    zebra: "#000001"
    alpha: "#000002"
    middle: "#000003"
"##,
        )
        .unwrap();
        let keys: Vec<&str> = theme.palette.light.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zebra", "alpha", "middle"]);
    }

    #[test]
    fn test_load_missing_file_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let theme = ThemeConfig::load(dir.path().join("theme.yml")).unwrap();
        assert_eq!(theme.mode, ThemeMode::System);
    }
}
