//! mdxpress: an MDX-first static blog generator
//!
//! Reads MDX content with YAML front-matter from a content directory,
//! serializes it to HTML and renders a themed site with pagination,
//! tag listings, adjacent-post navigation and an atom feed.

pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod models;
pub mod server;
pub mod templates;
pub mod theme;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// A site rooted at a directory, with the conventional paths derived
/// from its configuration
#[derive(Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Content source directory
    pub content_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    /// Static assets directory
    pub static_dir: PathBuf,
    /// Scaffold templates used by `new`
    pub scaffold_dir: PathBuf,
    /// Theme definition file
    pub theme_file: PathBuf,
    /// Content model definitions file
    pub models_file: PathBuf,
}

impl Site {
    /// Assemble a site from an explicit configuration
    pub fn new(base_dir: PathBuf, config: config::SiteConfig) -> Self {
        let content_dir = base_dir.join(&config.content_dir);
        let public_dir = base_dir.join(&config.public_dir);
        let static_dir = base_dir.join(&config.static_dir);
        let scaffold_dir = base_dir.join("scaffolds");
        let theme_file = base_dir.join("theme.yml");
        let models_file = base_dir.join("models.yml");

        Self {
            config,
            base_dir,
            content_dir,
            public_dir,
            static_dir,
            scaffold_dir,
            theme_file,
            models_file,
        }
    }

    /// Load a site from a directory, reading `site.yml` when present and
    /// falling back to defaults plus `MDXPRESS_*` environment overrides
    pub fn load<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("site.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::from_env()
        };

        Ok(Self::new(base_dir, config))
    }

    /// Load the content model registry for this site
    pub fn model_registry(&self) -> Result<models::ModelRegistry> {
        models::ModelRegistry::load(&self.models_file)
    }

    /// Scaffold a fresh site in the base directory
    pub fn init(&self) -> Result<()> {
        commands::init::run(self)
    }

    /// Build the static site into the public directory
    pub fn build(&self) -> Result<()> {
        commands::build::run(self)
    }

    /// Remove the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }

    /// Create a new content entry from a scaffold
    pub fn new_entry(&self, title: &str, layout: Option<&str>) -> Result<()> {
        commands::new::run(self, title, layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_reads_site_yml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("site.yml"),
            "title: Field Notes\ncontent_dir: entries\n",
        )
        .unwrap();

        let site = Site::load(dir.path()).unwrap();
        assert_eq!(site.config.title, "Field Notes");
        assert_eq!(site.content_dir, dir.path().join("entries"));
        assert_eq!(site.public_dir, dir.path().join("public"));
    }

    #[test]
    fn test_load_without_site_yml_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::load(dir.path()).unwrap();
        assert_eq!(site.config.title, "My Blog");
        assert_eq!(site.theme_file, dir.path().join("theme.yml"));
        assert_eq!(site.models_file, dir.path().join("models.yml"));
    }
}
