//! Build the static site

use anyhow::Result;
use notify::Watcher;
use std::sync::mpsc::channel;
use std::time::Duration;

use crate::content::ContentLoader;
use crate::generator::Generator;
use crate::Site;

/// Load all content and render the site into the public directory
pub fn run(site: &Site) -> Result<()> {
    let start = std::time::Instant::now();

    let models = site.model_registry()?;
    let loader = ContentLoader::new(site, &models);
    let posts = loader.load_posts()?;
    let pages = loader.load_pages()?;

    tracing::info!("Loaded {} posts and {} pages", posts.len(), pages.len());

    let generator = Generator::new(site)?;
    generator.generate(&posts, &pages)?;

    tracing::info!("Built in {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}

/// Watch content, static files and configuration, rebuilding on change
pub async fn watch(site: &Site) -> Result<()> {
    let (tx, rx) = channel();

    let mut watcher = notify::recommended_watcher(move |res| {
        if let Ok(event) = res {
            let _ = tx.send(event);
        }
    })?;

    watcher.watch(site.content_dir.as_ref(), notify::RecursiveMode::Recursive)?;
    if site.static_dir.exists() {
        watcher.watch(site.static_dir.as_ref(), notify::RecursiveMode::Recursive)?;
    }

    let config_file = site.base_dir.join("site.yml");
    for file in [&config_file, &site.theme_file, &site.models_file] {
        if file.exists() {
            watcher.watch(file, notify::RecursiveMode::NonRecursive)?;
        }
    }

    tracing::info!("Watching for changes. Press Ctrl+C to stop.");

    let mut last_rebuild = std::time::Instant::now();

    loop {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(_event) => {
                // Editors fire bursts of events, rebuild at most twice a second
                if last_rebuild.elapsed() > Duration::from_millis(500) {
                    tracing::info!("File changed, rebuilding...");
                    // Reload so edits to site.yml take effect
                    match Site::load(&site.base_dir).and_then(|site| run(&site)) {
                        Ok(()) => {}
                        Err(e) => tracing::error!("Build failed: {}", e),
                    }
                    last_rebuild = std::time::Instant::now();
                }
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                break;
            }
        }
    }

    Ok(())
}
