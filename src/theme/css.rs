//! Theme compiler: palettes to CSS custom properties

use indexmap::IndexMap;

use super::{ThemeConfig, ThemeMode};

/// localStorage key holding the visitor's theme choice
pub const STORAGE_KEY: &str = "mdxpress-theme";

/// Attribute set on `<html>` to force a palette
pub const THEME_ATTRIBUTE: &str = "data-theme";

/// Compile a theme into a stylesheet.
///
/// `:root` carries the default-mode palette plus the font variables.
/// Explicit `data-theme` attributes override it in both directions, and in
/// system mode a `prefers-color-scheme` media query applies the dark
/// palette unless the visitor forced light.
pub fn compile_css(theme: &ThemeConfig) -> String {
    warn_suspect_colors("light", &theme.palette.light);
    warn_suspect_colors("dark", &theme.palette.dark);

    let default_palette = match theme.mode {
        ThemeMode::Dark => &theme.palette.dark,
        ThemeMode::Light | ThemeMode::System => &theme.palette.light,
    };

    let mut css = String::new();
    css.push_str(":root {\n");
    push_color_vars(&mut css, default_palette, "  ");
    css.push_str(&format!("  --font-sans: {};\n", theme.fonts.sans.trim()));
    css.push_str(&format!("  --font-mono: {};\n", theme.fonts.mono.trim()));
    css.push_str("}\n");

    if !theme.palette.light.is_empty() {
        css.push_str(&format!("\n[{}=\"light\"] {{\n", THEME_ATTRIBUTE));
        push_color_vars(&mut css, &theme.palette.light, "  ");
        css.push_str("}\n");
    }

    if !theme.palette.dark.is_empty() {
        css.push_str(&format!("\n[{}=\"dark\"] {{\n", THEME_ATTRIBUTE));
        push_color_vars(&mut css, &theme.palette.dark, "  ");
        css.push_str("}\n");
    }

    if theme.mode == ThemeMode::System && !theme.palette.dark.is_empty() {
        css.push_str("\n@media (prefers-color-scheme: dark) {\n");
        css.push_str(&format!(
            "  :root:not([{}=\"light\"]) {{\n",
            THEME_ATTRIBUTE
        ));
        push_color_vars(&mut css, &theme.palette.dark, "    ");
        css.push_str("  }\n}\n");
    }

    let extra = theme.extra_css.trim();
    if !extra.is_empty() {
        css.push('\n');
        css.push_str(extra);
        css.push('\n');
    }

    css
}

/// Inline script applying the stored theme before first paint.
///
/// Also installs `window.__setTheme(mode)` for toggle buttons; any mode
/// other than `light` or `dark` reverts to the default.
pub fn bootstrap_script() -> String {
    let js = r#"(function () {
  var stored = null;
  try { stored = localStorage.getItem("__KEY__"); } catch (e) {}
  if (stored === "light" || stored === "dark") {
    document.documentElement.setAttribute("__ATTR__", stored);
  }
  window.__setTheme = function (mode) {
    var root = document.documentElement;
    try {
      if (mode === "light" || mode === "dark") {
        root.setAttribute("__ATTR__", mode);
        localStorage.setItem("__KEY__", mode);
      } else {
        root.removeAttribute("__ATTR__");
        localStorage.removeItem("__KEY__");
      }
    } catch (e) {}
  };
})();"#
        .replace("__KEY__", STORAGE_KEY)
        .replace("__ATTR__", THEME_ATTRIBUTE);

    format!("<script>{}</script>", js)
}

fn push_color_vars(css: &mut String, colors: &IndexMap<String, String>, indent: &str) {
    for (key, value) in colors {
        css.push_str(&format!(
            "{}--color-{}: {};\n",
            indent,
            var_name(key),
            value.trim()
        ));
    }
}

/// Palette keys become CSS variable suffixes: `code_background` turns
/// into `code-background`
fn var_name(key: &str) -> String {
    key.trim().to_ascii_lowercase().replace([' ', '_'], "-")
}

fn warn_suspect_colors(variant: &str, colors: &IndexMap<String, String>) {
    for (key, value) in colors {
        if !looks_like_color(value) {
            tracing::warn!(
                "Theme color `{}` in the {} palette does not look like a color: `{}`",
                key,
                variant,
                value
            );
        }
    }
}

/// Loose check that a palette value is plausibly a CSS color
fn looks_like_color(value: &str) -> bool {
    let v = value.trim();
    if let Some(hex) = v.strip_prefix('#') {
        return matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    let lower = v.to_ascii_lowercase();
    lower.starts_with("rgb(")
        || lower.starts_with("rgba(")
        || lower.starts_with("hsl(")
        || lower.starts_with("hsla(")
        || lower.starts_with("oklch(")
        || lower.starts_with("color-mix(")
        || lower.starts_with("var(")
        || (!lower.is_empty() && lower.chars().all(|c| c.is_ascii_alphabetic()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_system_mode() {
        let theme = ThemeConfig::default();
        let css = compile_css(&theme);

        assert!(css.contains(":root {"));
        assert!(css.contains("--color-background: #ffffff;"));
        assert!(css.contains("--color-code-background: #f5f5f5;"));
        assert!(css.contains("--font-sans:"));
        assert!(css.contains("--font-mono:"));
        assert!(css.contains("[data-theme=\"dark\"]"));
        assert!(css.contains("@media (prefers-color-scheme: dark)"));
        assert!(css.contains(":root:not([data-theme=\"light\"])"));
    }

    #[test]
    fn test_compile_light_mode_has_no_media_query() {
        let mut theme = ThemeConfig::default();
        theme.mode = ThemeMode::Light;
        let css = compile_css(&theme);
        assert!(!css.contains("prefers-color-scheme"));
        assert!(css.contains("[data-theme=\"dark\"]"));
    }

    #[test]
    fn test_compile_dark_default() {
        let mut theme = ThemeConfig::default();
        theme.mode = ThemeMode::Dark;
        let css = compile_css(&theme);

        // :root carries the dark palette
        let root_block = css.split("[data-theme").next().unwrap();
        assert!(root_block.contains("--color-background: #0a0a0a;"));
        // The visitor can still force light
        assert!(css.contains("[data-theme=\"light\"]"));
    }

    #[test]
    fn test_extra_css_appended_verbatim() {
        let mut theme = ThemeConfig::default();
        theme.extra_css = ".post-title { letter-spacing: -0.02em; }\n".to_string();
        let css = compile_css(&theme);
        assert!(css.ends_with(".post-title { letter-spacing: -0.02em; }\n"));
    }

    #[test]
    fn test_var_name_kebab() {
        assert_eq!(var_name("code_background"), "code-background");
        assert_eq!(var_name("Accent Hover"), "accent-hover");
    }

    #[test]
    fn test_looks_like_color() {
        assert!(looks_like_color("#fff"));
        assert!(looks_like_color("#aabbcc"));
        assert!(looks_like_color("#aabbccdd"));
        assert!(looks_like_color("rgb(0, 0, 0)"));
        assert!(looks_like_color("hsla(200, 50%, 50%, 0.5)"));
        assert!(looks_like_color("var(--other)"));
        assert!(looks_like_color("rebeccapurple"));

        assert!(!looks_like_color("#ggg"));
        assert!(!looks_like_color("#ffff4"));
        assert!(!looks_like_color("12px"));
        assert!(!looks_like_color("url(x.png)"));
        assert!(!looks_like_color(""));
    }

    #[test]
    fn test_bootstrap_script() {
        let script = bootstrap_script();
        assert!(script.starts_with("<script>"));
        assert!(script.ends_with("</script>"));
        assert!(script.contains(STORAGE_KEY));
        assert!(script.contains("setAttribute(\"data-theme\""));
        assert!(script.contains("window.__setTheme"));
    }
}
