//! Site configuration (site.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub author: String,
    pub language: String,

    // URL
    pub url: String,
    pub base_path: String,
    pub permalink: String,

    // Directory
    pub content_dir: String,
    pub public_dir: String,
    pub static_dir: String,
    pub tag_dir: String,

    // Writing
    pub new_post_name: String,
    pub default_layout: String,
    pub include_drafts: bool,
    pub future: bool,
    pub excerpt_separator: String,
    #[serde(default)]
    pub highlight: HighlightConfig,

    // Content models
    pub strict_models: bool,

    // Date format (moment-style, e.g. "YYYY-MM-DD" or "LL")
    pub date_format: String,

    // Pagination
    pub per_page: usize,
    pub pagination_dir: String,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "My Blog".to_string(),
            subtitle: String::new(),
            description: String::new(),
            author: "Anonymous".to_string(),
            language: "en".to_string(),

            url: "http://localhost:3000".to_string(),
            base_path: "/".to_string(),
            permalink: "posts/:slug/".to_string(),

            content_dir: "content".to_string(),
            public_dir: "public".to_string(),
            static_dir: "static".to_string(),
            tag_dir: "tags".to_string(),

            new_post_name: ":title.mdx".to_string(),
            default_layout: "post".to_string(),
            include_drafts: false,
            future: true,
            excerpt_separator: "<!-- more -->".to_string(),
            highlight: HighlightConfig::default(),

            strict_models: false,

            date_format: "YYYY-MM-DD".to_string(),

            per_page: 10,
            pagination_dir: "page".to_string(),

            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file, then layer environment overrides on top
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let mut config: SiteConfig = serde_yaml::from_str(&content)?;
        config.apply_env_overrides(std::env::vars());
        config.normalize();
        Ok(config)
    }

    /// Build a configuration from defaults plus environment overrides,
    /// for sites that ship no site.yml at all
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides(std::env::vars());
        config.normalize();
        config
    }

    /// Apply `MDXPRESS_*` environment overrides from an iterator of pairs.
    ///
    /// Takes the pairs as an argument so tests can inject values without
    /// touching the process environment.
    pub fn apply_env_overrides<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            match key.as_str() {
                "MDXPRESS_URL" => self.url = value,
                "MDXPRESS_BASE_PATH" => self.base_path = value,
                "MDXPRESS_DRAFTS" => self.include_drafts = parse_bool(&value),
                _ => {}
            }
        }
    }

    /// Normalize URL-ish fields so joins never produce `//`
    pub fn normalize(&mut self) {
        while self.url.ends_with('/') {
            self.url.pop();
        }

        let trimmed = self.base_path.trim_matches('/');
        self.base_path = if trimmed.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", trimmed)
        };
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Code highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub enabled: bool,
    pub theme: String,
    pub line_numbers: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            theme: "base16-ocean.dark".to_string(),
            line_numbers: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.title, "My Blog");
        assert_eq!(config.url, "http://localhost:3000");
        assert_eq!(config.per_page, 10);
        assert!(!config.include_drafts);
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: Notes from the Field
author: Jamie
url: https://blog.example.com
per_page: 5
include_drafts: true
highlight:
  line_numbers: true
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "Notes from the Field");
        assert_eq!(config.author, "Jamie");
        assert_eq!(config.per_page, 5);
        assert!(config.include_drafts);
        assert!(config.highlight.line_numbers);
        // Untouched fields keep their defaults
        assert_eq!(config.permalink, "posts/:slug/");
    }

    #[test]
    fn test_unknown_keys_preserved() {
        let yaml = "title: Blog\ngithub_username: octocat\n";
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            config.extra.get("github_username").and_then(|v| v.as_str()),
            Some("octocat")
        );
    }

    #[test]
    fn test_env_overrides() {
        let mut config = SiteConfig::default();
        config.apply_env_overrides(vec![
            (
                "MDXPRESS_URL".to_string(),
                "https://prod.example.com".to_string(),
            ),
            ("MDXPRESS_BASE_PATH".to_string(), "blog".to_string()),
            ("MDXPRESS_DRAFTS".to_string(), "true".to_string()),
            ("UNRELATED".to_string(), "ignored".to_string()),
        ]);
        config.normalize();

        assert_eq!(config.url, "https://prod.example.com");
        assert_eq!(config.base_path, "/blog/");
        assert!(config.include_drafts);
    }

    #[test]
    fn test_normalize_strips_trailing_slashes() {
        let mut config = SiteConfig {
            url: "https://example.com///".to_string(),
            base_path: "docs".to_string(),
            ..Default::default()
        };
        config.normalize();
        assert_eq!(config.url, "https://example.com");
        assert_eq!(config.base_path, "/docs/");
    }

    #[test]
    fn test_normalize_empty_base_path() {
        let mut config = SiteConfig {
            base_path: "".to_string(),
            ..Default::default()
        };
        config.normalize();
        assert_eq!(config.base_path, "/");
    }

    #[test]
    fn test_parse_bool_variants() {
        for v in ["1", "true", "TRUE", "yes", "on"] {
            assert!(parse_bool(v), "{v} should parse as true");
        }
        for v in ["0", "false", "no", "off", ""] {
            assert!(!parse_bool(v), "{v} should parse as false");
        }
    }
}
