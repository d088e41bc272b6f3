//! Static site generation from loaded content
//!
//! Renders posts, pages, the paginated index, tag listings and the atom
//! feed into the public directory, next to the compiled theme stylesheet
//! and any copied static assets.

use anyhow::{Context as _, Result};
use chrono::{Datelike, Local};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use tera::Context;
use walkdir::WalkDir;

use crate::content::{Page, Paginator, Post, Tag};
use crate::helpers;
use crate::templates::{
    ConfigData, NavPost, PageData, PostData, SiteData, TemplateRenderer, BASE_STYLESHEET,
};
use crate::theme::{self, ThemeConfig};
use crate::Site;

/// Renders the whole site using the embedded Tera templates
pub struct Generator {
    site: Site,
    theme: ThemeConfig,
    renderer: TemplateRenderer,
}

impl Generator {
    pub fn new(site: &Site) -> Result<Self> {
        let theme = ThemeConfig::load(&site.theme_file)?;
        let renderer = TemplateRenderer::new(&site.config)?;

        Ok(Self {
            site: site.clone(),
            theme,
            renderer,
        })
    }

    /// Generate the entire site into the public directory
    ///
    /// `posts` must be sorted newest first, as `ContentLoader::load_posts`
    /// returns them. Adjacent-post navigation follows that order.
    pub fn generate(&self, posts: &[Post], pages: &[Page]) -> Result<()> {
        fs::create_dir_all(&self.site.public_dir)?;

        self.write_stylesheets()?;
        self.copy_static_files()?;

        let site_data = self.build_site_data(posts);

        self.generate_index_pages(posts, &site_data)?;
        self.generate_post_pages(posts, &site_data)?;
        self.generate_page_pages(pages, &site_data)?;
        self.generate_tag_pages(posts, &site_data)?;
        self.generate_atom_feed(posts)?;
        self.generate_search_index(posts)?;

        Ok(())
    }

    /// Compile the theme into CSS custom properties and write the base
    /// stylesheet that consumes them
    fn write_stylesheets(&self) -> Result<()> {
        let css_dir = self.site.public_dir.join("css");
        fs::create_dir_all(&css_dir)?;

        fs::write(css_dir.join("theme.css"), theme::compile_css(&self.theme))?;
        fs::write(css_dir.join("main.css"), BASE_STYLESHEET)?;

        tracing::debug!("Generated css/theme.css and css/main.css");
        Ok(())
    }

    /// Copy everything under the static directory verbatim
    fn copy_static_files(&self) -> Result<()> {
        let static_dir = &self.site.static_dir;
        if !static_dir.exists() {
            return Ok(());
        }

        let mut copied = 0usize;
        for entry in WalkDir::new(static_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(static_dir)?;
            let dest = self.site.public_dir.join(relative);

            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest)?;
            copied += 1;
        }

        if copied > 0 {
            tracing::info!("Copied {} static file(s)", copied);
        }
        Ok(())
    }

    fn build_site_data(&self, posts: &[Post]) -> SiteData {
        let mut tags: HashMap<String, usize> = HashMap::new();
        let mut word_count = 0;

        let post_data: Vec<PostData> = posts
            .iter()
            .map(|p| {
                for tag in &p.tags {
                    *tags.entry(tag.clone()).or_insert(0) += 1;
                }
                word_count += p.word_count;
                PostData::from_post(p, &self.site.config)
            })
            .collect();

        SiteData {
            posts: post_data,
            tags,
            word_count,
        }
    }

    /// Context variables shared by every template
    fn base_context(&self, site_data: &SiteData) -> Context {
        let mut context = Context::new();
        context.insert("config", &ConfigData::from_config(&self.site.config));
        context.insert("site", site_data);
        context.insert("theme", &self.theme);
        context.insert("theme_bootstrap", &theme::bootstrap_script());
        context.insert("now_year", &Local::now().year());
        context
    }

    /// Generate the paginated index: `/` plus `/page/N/` beyond the first
    fn generate_index_pages(&self, posts: &[Post], site_data: &SiteData) -> Result<()> {
        let config = &self.site.config;
        let paginator = Paginator::new(posts.len(), config.per_page, &config.pagination_dir);

        for page in 1..=paginator.page_count() {
            let window: Vec<PostData> = paginator
                .slice(posts, page)
                .iter()
                .map(|p| PostData::from_post(p, config))
                .collect();

            // Templates emit pagination links as-is, so the base path is
            // applied here
            let mut pagination = paginator.context(page);
            pagination.prev = pagination.prev.map(|p| helpers::url_for(config, &p));
            pagination.next = pagination.next.map(|p| helpers::url_for(config, &p));

            let mut context = self.base_context(site_data);
            context.insert("page_title", &config.title);
            if !config.description.is_empty() {
                context.insert("description", &config.description);
            }
            context.insert("posts", &window);
            context.insert("pagination", &pagination);

            let html = self.renderer.render("index.html", &context)?;
            self.write_page(&paginator.page_path(page), &html)?;
        }

        tracing::info!("Generated {} index page(s)", paginator.page_count());
        Ok(())
    }

    fn generate_post_pages(&self, posts: &[Post], site_data: &SiteData) -> Result<()> {
        let config = &self.site.config;

        for post in posts {
            let mut context = self.base_context(site_data);
            context.insert("post", &PostData::from_post(post, config));
            context.insert("page_title", &format!("{} | {}", post.title, config.title));
            if let Some(ref description) = post.description {
                context.insert("description", description);
            }
            context.insert(
                "open_graph",
                &helpers::open_graph(
                    &post.title,
                    post.description.as_deref().unwrap_or(&config.description),
                    &post.permalink,
                    post.image.as_deref(),
                    &config.title,
                ),
            );

            if !post.headings.is_empty() {
                context.insert("toc", &helpers::toc(&post.headings));
            }

            if let Some(prev) = post.previous_in(posts) {
                context.insert(
                    "prev",
                    &NavPost {
                        title: prev.title.clone(),
                        path: prev.path.clone(),
                    },
                );
            }
            if let Some(next) = post.next_in(posts) {
                context.insert(
                    "next",
                    &NavPost {
                        title: next.title.clone(),
                        path: next.path.clone(),
                    },
                );
            }

            let html = self.renderer.render_layout(&post.layout, "post.html", &context)?;
            self.write_page(&post.path, &html)?;
        }

        tracing::info!("Generated {} post(s)", posts.len());
        Ok(())
    }

    fn generate_page_pages(&self, pages: &[Page], site_data: &SiteData) -> Result<()> {
        let config = &self.site.config;

        for page in pages {
            let mut context = self.base_context(site_data);
            context.insert("page", &PageData::from_page(page, config));
            context.insert("page_title", &format!("{} | {}", page.title, config.title));
            if let Some(ref description) = page.description {
                context.insert("description", description);
            }

            let html = self.renderer.render_layout(&page.layout, "page.html", &context)?;
            self.write_page(&page.path, &html)?;
        }

        if !pages.is_empty() {
            tracing::info!("Generated {} page(s)", pages.len());
        }
        Ok(())
    }

    /// Generate one listing per tag plus the tag index
    fn generate_tag_pages(&self, posts: &[Post], site_data: &SiteData) -> Result<()> {
        let config = &self.site.config;

        let mut by_tag: BTreeMap<String, Vec<&Post>> = BTreeMap::new();
        for post in posts {
            for tag in &post.tags {
                if tag.trim().is_empty() {
                    continue;
                }
                by_tag.entry(tag.clone()).or_default().push(post);
            }
        }

        let base_url = format!(
            "{}{}",
            config.url.trim_end_matches('/'),
            config.base_path.trim_end_matches('/')
        );

        let mut tags: Vec<Tag> = Vec::with_capacity(by_tag.len());
        for (name, tag_posts) in &by_tag {
            let mut tag = Tag::new(name, &base_url, &config.tag_dir);
            if tag.slug.is_empty() {
                continue;
            }
            tag.count = tag_posts.len();
            tag.path = helpers::url_for(config, &tag.path);

            let listed: Vec<PostData> = tag_posts
                .iter()
                .map(|p| PostData::from_post(p, config))
                .collect();

            let mut context = self.base_context(site_data);
            context.insert("tag", &tag);
            context.insert("page_title", &format!("{} | {}", tag.name, config.title));
            context.insert("posts", &listed);

            let html = self.renderer.render("tag.html", &context)?;
            self.write_page(&tag.path, &html)?;
            tags.push(tag);
        }

        let mut context = self.base_context(site_data);
        context.insert("page_title", &format!("Tags | {}", config.title));
        context.insert("tags", &tags);

        let html = self.renderer.render("tags.html", &context)?;
        let tags_path = format!("/{}/", config.tag_dir.trim_matches('/'));
        self.write_page(&helpers::url_for(config, &tags_path), &html)?;

        tracing::info!("Generated {} tag page(s)", tags.len());
        Ok(())
    }

    /// Generate the atom feed from the 20 newest posts
    fn generate_atom_feed(&self, posts: &[Post]) -> Result<()> {
        let config = &self.site.config;
        let home = helpers::full_url_for(config, "/");

        let mut feed = String::new();
        feed.push_str(r#"<?xml version="1.0" encoding="utf-8"?>"#);
        feed.push('\n');
        feed.push_str(r#"<feed xmlns="http://www.w3.org/2005/Atom">"#);
        feed.push('\n');
        feed.push_str(&format!("  <title>{}</title>\n", escape_xml(&config.title)));
        feed.push_str(&format!(
            "  <link href=\"{}\" rel=\"self\"/>\n",
            helpers::full_url_for(config, "atom.xml")
        ));
        feed.push_str(&format!("  <link href=\"{}\"/>\n", home));
        feed.push_str(&format!(
            "  <updated>{}</updated>\n",
            helpers::date_xml(&Local::now())
        ));
        feed.push_str(&format!("  <id>{}</id>\n", home));
        feed.push_str(&format!(
            "  <author><name>{}</name></author>\n",
            escape_xml(&config.author)
        ));

        for post in posts.iter().take(20) {
            feed.push_str("  <entry>\n");
            feed.push_str(&format!("    <title>{}</title>\n", escape_xml(&post.title)));
            feed.push_str(&format!("    <link href=\"{}\"/>\n", post.permalink));
            feed.push_str(&format!("    <id>{}</id>\n", post.permalink));
            feed.push_str(&format!(
                "    <published>{}</published>\n",
                helpers::date_xml(&post.date)
            ));
            feed.push_str(&format!(
                "    <updated>{}</updated>\n",
                helpers::date_xml(&post.updated.unwrap_or(post.date))
            ));

            let content = post.excerpt.as_deref().unwrap_or(&post.content);
            let content = absolutize_urls(content, config.url.trim_end_matches('/'));
            feed.push_str(&format!(
                "    <content type=\"html\"><![CDATA[{}]]></content>\n",
                strip_invalid_xml_chars(&content)
            ));
            feed.push_str("  </entry>\n");
        }

        feed.push_str("</feed>\n");

        fs::write(self.site.public_dir.join("atom.xml"), feed)?;
        tracing::info!("Generated atom.xml");
        Ok(())
    }

    /// Emit a JSON search index for client-side search
    fn generate_search_index(&self, posts: &[Post]) -> Result<()> {
        let search_data: Vec<serde_json::Value> = posts
            .iter()
            .map(|p| {
                serde_json::json!({
                    "title": p.title,
                    "url": p.path,
                    "content": helpers::strip_html(&p.content),
                    "tags": p.tags,
                    "date": p.date.format("%Y-%m-%d").to_string(),
                })
            })
            .collect();

        let json = serde_json::to_string_pretty(&search_data)?;
        fs::write(self.site.public_dir.join("search.json"), json)?;
        tracing::info!("Generated search.json");
        Ok(())
    }

    /// Map a site-relative URL path to its file under the public directory
    ///
    /// The base path is stripped first so a site served under `/blog/`
    /// still writes to `public/posts/...`. Directory-style paths get an
    /// `index.html` appended.
    fn output_path(&self, url_path: &str) -> PathBuf {
        let base = self.site.config.base_path.trim_end_matches('/');
        let path = match url_path.strip_prefix(base) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
            _ => url_path,
        };
        let path = path.trim_matches('/');

        let target = self.site.public_dir.join(path);
        if url_path.ends_with('/') || Path::new(path).extension().is_none() {
            target.join("index.html")
        } else {
            target
        }
    }

    fn write_page(&self, url_path: &str, html: &str) -> Result<()> {
        let output = self.output_path(url_path);
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&output, html)
            .with_context(|| format!("failed to write {}", output.display()))?;
        tracing::debug!("Generated {}", output.display());
        Ok(())
    }
}

/// Escape XML special characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Rewrite root-relative `href`/`src` attributes to absolute URLs for
/// feed readers
fn absolutize_urls(content: &str, base_url: &str) -> String {
    content
        .replace("href=\"/", &format!("href=\"{}/", base_url))
        .replace("src=\"/", &format!("src=\"{}/", base_url))
        .replace("href='/", &format!("href='{}/", base_url))
        .replace("src='/", &format!("src='{}/", base_url))
}

/// Drop control characters XML 1.0 forbids, keeping tab, newline and
/// carriage return
fn strip_invalid_xml_chars(s: &str) -> String {
    s.chars()
        .filter(|&c| {
            c == '\t'
                || c == '\n'
                || c == '\r'
                || ('\u{0020}'..='\u{D7FF}').contains(&c)
                || ('\u{E000}'..='\u{FFFD}').contains(&c)
                || ('\u{10000}'..='\u{10FFFF}').contains(&c)
        })
        .collect()
}
