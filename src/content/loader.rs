//! Content loader: reads posts and pages from the content directory

use anyhow::Result;
use chrono::{DateTime, Local};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use super::post::{date_from_file_stem, slug_from_file_stem};
use super::{FrontMatter, MdxRenderer, Page, Post};
use crate::helpers::url::url_for;
use crate::models::{ContentModel, ModelRegistry, ModelRejection};
use crate::Site;

/// Loads content from the content directory
pub struct ContentLoader<'a> {
    site: &'a Site,
    models: &'a ModelRegistry,
    renderer: MdxRenderer,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(site: &'a Site, models: &'a ModelRegistry) -> Self {
        let renderer = MdxRenderer::from_config(&site.config.highlight);
        Self {
            site,
            models,
            renderer,
        }
    }

    /// Load all posts from content/posts, newest first
    pub fn load_posts(&self) -> Result<Vec<Post>> {
        let posts_dir = self.site.content_dir.join("posts");
        if !posts_dir.exists() {
            return Ok(Vec::new());
        }

        let mut posts = Vec::new();

        for entry in WalkDir::new(&posts_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && is_mdx_file(path) {
                match self.load_post(path) {
                    Ok(post) => {
                        if post.draft && !self.site.config.include_drafts {
                            tracing::debug!("Skipping draft {:?}", path);
                            continue;
                        }
                        if !self.site.config.future && post.date > Local::now() {
                            tracing::debug!("Skipping future-dated post {:?}", path);
                            continue;
                        }
                        posts.push(post);
                    }
                    // Unreadable or unparsable files are skipped; an entry
                    // its model rejected must fail the whole load
                    Err(e) if e.downcast_ref::<ModelRejection>().is_some() => {
                        return Err(e);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load post {:?}: {}", path, e);
                    }
                }
            }
        }

        // Newest first; same-day posts order by slug so the listing is stable
        posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug)));

        Ok(posts)
    }

    /// Load a single post from a file
    fn load_post(&self, path: &Path) -> Result<Post> {
        let content = fs::read_to_string(path)?;
        let (mut fm, body) = FrontMatter::parse(&content)?;

        let model = self.resolve_model(fm.model.as_deref(), "post");
        if let Some(model) = model {
            model.apply_defaults(&mut fm);
            self.enforce_model(model, &fm, path)?;
        }

        let metadata = fs::metadata(path)?;
        let file_modified = metadata.modified().ok().map(DateTime::<Local>::from);

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("untitled");

        // Date preference: front-matter, then a YYYY-MM-DD- file name
        // prefix, then the file modification time
        let date = fm
            .parse_date()
            .or_else(|| date_from_file_stem(stem))
            .or(file_modified)
            .unwrap_or_else(Local::now);
        let updated = fm.parse_updated().or(file_modified);

        let title = fm.title.clone().unwrap_or_else(|| stem.to_string());

        let source = path
            .strip_prefix(&self.site.content_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string();

        let slug = fm
            .slug
            .clone()
            .unwrap_or_else(|| slug_from_file_stem(stem));

        // Route preference: front-matter permalink, then the model's
        // url_path, then the site-wide permalink pattern
        let route = fm
            .permalink
            .clone()
            .or_else(|| model.and_then(|m| m.url_path.clone()))
            .unwrap_or_else(|| self.site.config.permalink.clone());
        let page_path = url_for(&self.site.config, &resolve_route(&route, &date, &slug));
        let permalink = format!("{}{}", self.site.config.url, page_path);

        let (excerpt_md, full_md) =
            MdxRenderer::split_excerpt(body, &self.site.config.excerpt_separator);
        let doc = self.renderer.serialize(&full_md)?;
        let excerpt = match &excerpt_md {
            Some(excerpt_md) => Some(self.renderer.serialize(excerpt_md)?.html),
            None => None,
        };

        let layout = fm.layout.clone().unwrap_or_else(|| {
            model
                .map(|m| m.layout.clone())
                .unwrap_or_else(|| "post".to_string())
        });
        let model_name = model
            .map(|m| m.name.clone())
            .unwrap_or_else(|| "post".to_string());

        let mut post = Post::new(title, date, source);
        post.updated = updated;
        post.description = fm.description;
        post.author = fm.author;
        post.raw = body.to_string();
        post.content = doc.html;
        post.excerpt = excerpt;
        post.tags = fm.tags;
        post.layout = layout;
        post.model = model_name;
        post.full_source = path.to_path_buf();
        post.path = page_path;
        post.permalink = permalink;
        post.draft = fm.draft;
        post.slug = slug;
        post.image = fm.image;
        post.components = doc.components;
        post.headings = doc.headings;
        post.word_count = doc.word_count;
        post.extra = fm.extra;

        Ok(post)
    }

    /// Load all pages (content files outside posts/)
    pub fn load_pages(&self) -> Result<Vec<Page>> {
        let mut pages = Vec::new();
        if !self.site.content_dir.exists() {
            return Ok(pages);
        }

        for entry in WalkDir::new(&self.site.content_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();

            let relative = path.strip_prefix(&self.site.content_dir).unwrap_or(path);
            let first_component = relative
                .components()
                .next()
                .and_then(|c| c.as_os_str().to_str());

            // posts/ has its own loader; underscore directories are private
            if let Some(first) = first_component {
                if first == "posts" || first.starts_with('_') || first.starts_with('.') {
                    continue;
                }
            }

            if path.is_file() && is_mdx_file(path) {
                match self.load_page(path) {
                    Ok(page) => {
                        if page.draft && !self.site.config.include_drafts {
                            tracing::debug!("Skipping draft {:?}", path);
                            continue;
                        }
                        pages.push(page);
                    }
                    Err(e) if e.downcast_ref::<ModelRejection>().is_some() => {
                        return Err(e);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load page {:?}: {}", path, e);
                    }
                }
            }
        }

        Ok(pages)
    }

    /// Load a single page from a file
    fn load_page(&self, path: &Path) -> Result<Page> {
        let content = fs::read_to_string(path)?;
        let (mut fm, body) = FrontMatter::parse(&content)?;

        let model = self.resolve_model(fm.model.as_deref(), "page");
        if let Some(model) = model {
            model.apply_defaults(&mut fm);
            self.enforce_model(model, &fm, path)?;
        }

        let metadata = fs::metadata(path)?;
        let file_modified = metadata.modified().ok().map(DateTime::<Local>::from);

        let date = fm
            .parse_date()
            .unwrap_or_else(|| file_modified.unwrap_or_else(Local::now));
        let updated = fm.parse_updated().or(file_modified);

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("untitled");
        let title = fm.title.clone().unwrap_or_else(|| stem.to_string());

        let source = path
            .strip_prefix(&self.site.content_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string();

        let slug = fm
            .slug
            .clone()
            .unwrap_or_else(|| slug_from_file_stem(stem));

        // Pages default to a path mirroring their location; index files
        // collapse into their parent directory
        let route = fm
            .permalink
            .clone()
            .or_else(|| model.and_then(|m| m.url_path.clone()));
        let raw_path = match route {
            Some(pattern) => resolve_route(&pattern, &date, &slug),
            None => {
                let without_ext = source.trim_end_matches(".mdx").trim_end_matches(".md");
                if without_ext.ends_with("/index") || without_ext == "index" {
                    without_ext.trim_end_matches("index").to_string()
                } else {
                    format!("{}/", without_ext)
                }
            }
        };
        let page_path = url_for(&self.site.config, &raw_path);
        let permalink = format!("{}{}", self.site.config.url, page_path);

        let doc = self.renderer.serialize(body)?;

        let layout = fm.layout.clone().unwrap_or_else(|| {
            model
                .map(|m| m.layout.clone())
                .unwrap_or_else(|| "page".to_string())
        });
        let model_name = model
            .map(|m| m.name.clone())
            .unwrap_or_else(|| "page".to_string());

        let mut page = Page::new(title, date, source);
        page.updated = updated;
        page.description = fm.description;
        page.author = fm.author;
        page.raw = body.to_string();
        page.content = doc.html;
        page.layout = layout;
        page.model = model_name;
        page.full_source = path.to_path_buf();
        page.path = page_path;
        page.permalink = permalink;
        page.draft = fm.draft;
        page.slug = slug;
        page.image = fm.image;
        page.components = doc.components;
        page.headings = doc.headings;
        page.word_count = doc.word_count;
        page.extra = fm.extra;

        Ok(page)
    }

    /// Look up the entry's model, falling back to the builtin for
    /// unknown names
    fn resolve_model(&self, requested: Option<&str>, fallback: &str) -> Option<&ContentModel> {
        let name = requested.unwrap_or(fallback);
        match self.models.get(name) {
            Some(model) => Some(model),
            None => {
                tracing::warn!("Unknown content model `{}`, using `{}`", name, fallback);
                self.models.get(fallback)
            }
        }
    }

    fn enforce_model(&self, model: &ContentModel, fm: &FrontMatter, path: &Path) -> Result<()> {
        let violations = model.validate(fm);
        if violations.is_empty() {
            return Ok(());
        }
        if self.site.config.strict_models {
            anyhow::bail!(ModelRejection {
                source_path: path.display().to_string(),
                violations,
            });
        }
        for violation in &violations {
            tracing::warn!("{:?}: {}", path, violation);
        }
        Ok(())
    }
}

/// Expand a permalink pattern.
///
/// Supported tokens are `:year`, `:month`, `:day`, `:slug` and `:title`
/// (an alias of `:slug`). The result never carries a leading slash.
pub(crate) fn resolve_route(pattern: &str, date: &DateTime<Local>, slug: &str) -> String {
    pattern
        .replace(":year", &date.format("%Y").to_string())
        .replace(":month", &date.format("%m").to_string())
        .replace(":day", &date.format("%d").to_string())
        .replace(":slug", slug)
        .replace(":title", slug)
        .trim_start_matches('/')
        .to_string()
}

/// Check if a file is an MDX content file
fn is_mdx_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "mdx" || e == "md")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use chrono::TimeZone;
    use std::path::PathBuf;

    fn write_file(path: PathBuf, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn site_with_config(dir: &Path, config: SiteConfig) -> Site {
        Site::new(dir.to_path_buf(), config)
    }

    fn site_in(dir: &Path) -> Site {
        site_with_config(dir, SiteConfig::default())
    }

    #[test]
    fn test_load_posts_sorted_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path().join("content/posts/2024-03-10-older.mdx"),
            "---\ntitle: Older\ndate: 2024-03-10\n---\nOld body.\n",
        );
        write_file(
            dir.path().join("content/posts/2024-03-20-newer.mdx"),
            "---\ntitle: Newer\ndate: 2024-03-20\n---\nNew body.\n",
        );

        let site = site_in(dir.path());
        let models = ModelRegistry::builtin();
        let posts = ContentLoader::new(&site, &models).load_posts().unwrap();

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].slug, "newer");
        assert_eq!(posts[1].slug, "older");
        assert_eq!(posts[0].path, "/posts/newer/");
        assert_eq!(posts[0].permalink, "http://localhost:3000/posts/newer/");
        assert!(posts[0].content.contains("New body."));
    }

    #[test]
    fn test_same_day_posts_order_by_slug() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["banana", "apple", "cherry"] {
            write_file(
                dir.path().join(format!("content/posts/{}.mdx", name)),
                &format!("---\ntitle: {}\ndate: 2024-03-15 10:00:00\n---\nBody.\n", name),
            );
        }

        let site = site_in(dir.path());
        let models = ModelRegistry::builtin();
        let posts = ContentLoader::new(&site, &models).load_posts().unwrap();

        let slugs: Vec<&str> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["apple", "banana", "cherry"]);
    }

    #[test]
    fn test_drafts_hidden_by_default() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path().join("content/posts/wip.mdx"),
            "---\ntitle: WIP\ndate: 2024-03-15\ndraft: true\n---\nNot done.\n",
        );

        let site = site_in(dir.path());
        let models = ModelRegistry::builtin();
        assert!(ContentLoader::new(&site, &models)
            .load_posts()
            .unwrap()
            .is_empty());

        let mut config = SiteConfig::default();
        config.include_drafts = true;
        let site = site_with_config(dir.path(), config);
        assert_eq!(
            ContentLoader::new(&site, &models).load_posts().unwrap().len(),
            1
        );
    }

    #[test]
    fn test_future_posts_follow_config() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path().join("content/posts/scheduled.mdx"),
            "---\ntitle: Scheduled\ndate: 2999-01-01\n---\nLater.\n",
        );

        // Default config renders future posts
        let site = site_in(dir.path());
        let models = ModelRegistry::builtin();
        assert_eq!(
            ContentLoader::new(&site, &models).load_posts().unwrap().len(),
            1
        );

        let mut config = SiteConfig::default();
        config.future = false;
        let site = site_with_config(dir.path(), config);
        assert!(ContentLoader::new(&site, &models)
            .load_posts()
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_date_from_file_name_prefix() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path().join("content/posts/2024-03-15-undated.mdx"),
            "---\ntitle: Undated\n---\nBody.\n",
        );

        let site = site_in(dir.path());
        let models = ModelRegistry::builtin();
        let posts = ContentLoader::new(&site, &models).load_posts().unwrap();

        assert_eq!(posts[0].slug, "undated");
        assert_eq!(posts[0].date.format("%Y-%m-%d").to_string(), "2024-03-15");
    }

    #[test]
    fn test_front_matter_overrides_slug_and_permalink() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path().join("content/posts/long-file-name.mdx"),
            "---\ntitle: Custom\ndate: 2024-03-15\nslug: short\npermalink: \"archive/:year/:slug/\"\n---\nBody.\n",
        );

        let site = site_in(dir.path());
        let models = ModelRegistry::builtin();
        let posts = ContentLoader::new(&site, &models).load_posts().unwrap();

        assert_eq!(posts[0].slug, "short");
        assert_eq!(posts[0].path, "/archive/2024/short/");
    }

    #[test]
    fn test_model_url_path_and_layout() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path().join("content/posts/soup.mdx"),
            "---\ntitle: Soup\ndate: 2024-03-15\nmodel: recipe\ndifficulty: easy\n---\nStir.\n",
        );

        let site = site_in(dir.path());
        let models = ModelRegistry::parse(
            r#"
models:
  recipe:
    url_path: "recipes/:slug/"
    fields:
      - name: title
        type: string
        required: true
      - name: difficulty
        type: enum
        options: [easy, medium, hard]
"#,
        )
        .unwrap();
        let posts = ContentLoader::new(&site, &models).load_posts().unwrap();

        assert_eq!(posts[0].model, "recipe");
        assert_eq!(posts[0].layout, "recipe");
        assert_eq!(posts[0].path, "/recipes/soup/");
    }

    #[test]
    fn test_strict_models_reject_invalid_entries() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path().join("content/posts/untitled.mdx"),
            "---\ndate: 2024-03-15\n---\nNo title.\n",
        );

        // Lenient mode keeps the post and only warns
        let site = site_in(dir.path());
        let models = ModelRegistry::builtin();
        assert_eq!(
            ContentLoader::new(&site, &models).load_posts().unwrap().len(),
            1
        );

        // Strict mode fails the load instead of dropping the entry
        let mut config = SiteConfig::default();
        config.strict_models = true;
        let site = site_with_config(dir.path(), config);
        let err = ContentLoader::new(&site, &models).load_posts().unwrap_err();
        assert!(err.to_string().contains("title"), "{}", err);
    }

    #[test]
    fn test_strict_models_apply_to_pages() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path().join("content/about.mdx"),
            "---\ndescription: who we are\n---\nNo title.\n",
        );

        let site = site_in(dir.path());
        let models = ModelRegistry::builtin();
        assert_eq!(
            ContentLoader::new(&site, &models).load_pages().unwrap().len(),
            1
        );

        let mut config = SiteConfig::default();
        config.strict_models = true;
        let site = site_with_config(dir.path(), config);
        assert!(ContentLoader::new(&site, &models).load_pages().is_err());
    }

    #[test]
    fn test_load_pages() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path().join("content/about.mdx"),
            "---\ntitle: About\nauthor: Sam\nimage: /img/team.png\n---\nHi there.\n",
        );
        write_file(
            dir.path().join("content/docs/index.mdx"),
            "---\ntitle: Docs\n---\nDocs home.\n",
        );
        write_file(
            dir.path().join("content/_partials/skip.mdx"),
            "---\ntitle: Hidden\n---\nNope.\n",
        );
        write_file(
            dir.path().join("content/posts/2024-03-15-post.mdx"),
            "---\ntitle: Post\ndate: 2024-03-15\n---\nBody.\n",
        );

        let site = site_in(dir.path());
        let models = ModelRegistry::builtin();
        let mut pages = ContentLoader::new(&site, &models).load_pages().unwrap();
        pages.sort_by(|a, b| a.slug.cmp(&b.slug));

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].path, "/about/");
        assert_eq!(pages[0].layout, "page");
        assert_eq!(pages[0].author.as_deref(), Some("Sam"));
        assert_eq!(pages[0].image.as_deref(), Some("/img/team.png"));
        assert_eq!(pages[1].path, "/docs/");
        assert_eq!(pages[1].author, None);
    }

    #[test]
    fn test_base_path_in_routes() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path().join("content/posts/2024-03-15-hello.mdx"),
            "---\ntitle: Hello\ndate: 2024-03-15\n---\nBody.\n",
        );

        let mut config = SiteConfig::default();
        config.url = "https://example.com".to_string();
        config.base_path = "/blog/".to_string();
        let site = site_with_config(dir.path(), config);
        let models = ModelRegistry::builtin();
        let posts = ContentLoader::new(&site, &models).load_posts().unwrap();

        assert_eq!(posts[0].path, "/blog/posts/hello/");
        assert_eq!(posts[0].permalink, "https://example.com/blog/posts/hello/");
    }

    #[test]
    fn test_resolve_route_tokens() {
        let date = Local.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        assert_eq!(
            resolve_route("posts/:year/:month/:day/:slug/", &date, "hello"),
            "posts/2024/03/05/hello/"
        );
        assert_eq!(resolve_route("/fixed/path/", &date, "x"), "fixed/path/");
    }
}
