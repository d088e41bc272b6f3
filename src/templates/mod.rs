//! Built-in templates using the Tera template engine
//!
//! The default layout set is embedded in the binary, so a freshly
//! initialized site renders without any theme files on disk.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::{Page, Post};
use crate::helpers;

/// Base stylesheet consuming the theme's CSS custom properties
pub const BASE_STYLESHEET: &str = include_str!("default/style.css");

/// Template renderer with the embedded default layout set
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a renderer with all templates loaded
    pub fn new(config: &SiteConfig) -> Result<Self> {
        let mut tera = Tera::default();

        // Autoescaping stays off: contexts carry pre-rendered HTML and
        // already-escaped strings
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("default/layout.html")),
            ("index.html", include_str!("default/index.html")),
            ("post.html", include_str!("default/post.html")),
            ("page.html", include_str!("default/page.html")),
            ("tag.html", include_str!("default/tag.html")),
            ("tags.html", include_str!("default/tags.html")),
            // Partials
            (
                "partials/head.html",
                include_str!("default/partials/head.html"),
            ),
            (
                "partials/nav.html",
                include_str!("default/partials/nav.html"),
            ),
            (
                "partials/footer.html",
                include_str!("default/partials/footer.html"),
            ),
            (
                "partials/pagination.html",
                include_str!("default/partials/pagination.html"),
            ),
            (
                "partials/post_preview.html",
                include_str!("default/partials/post_preview.html"),
            ),
        ])?;

        tera.register_filter("strip_html", strip_html_filter);
        tera.register_filter("truncate_chars", truncate_chars_filter);
        tera.register_filter("date_format", date_format_filter);
        register_functions(&mut tera, config);

        Ok(Self { tera })
    }

    /// Render a template with the given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }

    /// Fall back to a default template when the named layout is unknown
    pub fn render_layout(
        &self,
        layout: &str,
        fallback: &str,
        context: &Context,
    ) -> Result<String> {
        let name = format!("{}.html", layout);
        if self.tera.get_template_names().any(|t| t == name) {
            self.render(&name, context)
        } else {
            tracing::debug!("No template `{}`, falling back to `{}`", name, fallback);
            self.render(fallback, context)
        }
    }
}

fn register_functions(tera: &mut Tera, config: &SiteConfig) {
    let arg = |args: &HashMap<String, tera::Value>, name: &str| -> String {
        args.get(name)
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string()
    };

    let cfg = config.clone();
    tera.register_function(
        "url_for",
        move |args: &HashMap<String, tera::Value>| -> tera::Result<tera::Value> {
            Ok(tera::Value::String(helpers::url_for(&cfg, &arg(args, "path"))))
        },
    );

    let cfg = config.clone();
    tera.register_function(
        "full_url_for",
        move |args: &HashMap<String, tera::Value>| -> tera::Result<tera::Value> {
            Ok(tera::Value::String(helpers::full_url_for(
                &cfg,
                &arg(args, "path"),
            )))
        },
    );

    let cfg = config.clone();
    tera.register_function(
        "css",
        move |args: &HashMap<String, tera::Value>| -> tera::Result<tera::Value> {
            Ok(tera::Value::String(helpers::css(&cfg, &arg(args, "path"))))
        },
    );

    let cfg = config.clone();
    tera.register_function(
        "js",
        move |args: &HashMap<String, tera::Value>| -> tera::Result<tera::Value> {
            Ok(tera::Value::String(helpers::js(&cfg, &arg(args, "path"))))
        },
    );

    let cfg = config.clone();
    tera.register_function(
        "feed_tag",
        move |_args: &HashMap<String, tera::Value>| -> tera::Result<tera::Value> {
            Ok(tera::Value::String(helpers::feed_tag(
                &cfg,
                "atom.xml",
                None,
            )))
        },
    );

    tera.register_function(
        "meta_generator",
        move |_args: &HashMap<String, tera::Value>| -> tera::Result<tera::Value> {
            Ok(tera::Value::String(helpers::meta_generator()))
        },
    );
}

/// Tera filter: strip HTML tags
fn strip_html_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("strip_html", "value", String, value);
    Ok(tera::Value::String(helpers::strip_html(&s)))
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 150,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => "...".to_string(),
    };
    Ok(tera::Value::String(helpers::truncate(
        &s,
        length,
        Some(&omission),
    )))
}

/// Tera filter: re-format an already formatted date string
fn date_format_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("date_format", "value", String, value);
    let format = match args.get("format") {
        Some(val) => tera::try_get_value!("date_format", "format", String, val),
        None => "YYYY-MM-DD".to_string(),
    };

    // Dates arrive formatted with the site date_format; re-parse the ISO
    // form and apply the requested tokens. "LL" renders a long date like
    // "May 30, 2023".
    if let Ok(date) = chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
        let chrono_format = if format == "LL" {
            "%B %d, %Y".to_string()
        } else {
            helpers::date::moment_to_chrono_format(&format)
        };
        return Ok(tera::Value::String(date.format(&chrono_format).to_string()));
    }

    Ok(tera::Value::String(s))
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub posts: Vec<PostData>,
    pub tags: HashMap<String, usize>,
    pub word_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagRef {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostData {
    pub title: String,
    pub date: String,
    pub updated: Option<String>,
    pub path: String,
    pub permalink: String,
    pub tags: Vec<TagRef>,
    pub content: String,
    pub excerpt: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub image: Option<String>,
    pub slug: String,
    pub reading_time: usize,
    pub word_count: usize,
    pub components: Vec<String>,
}

impl PostData {
    pub fn from_post(post: &Post, config: &SiteConfig) -> Self {
        let tags = post
            .tags
            .iter()
            .map(|name| TagRef {
                name: name.clone(),
                path: helpers::url_for(
                    config,
                    &format!("{}/{}/", config.tag_dir.trim_matches('/'), slug::slugify(name)),
                ),
            })
            .collect();

        Self {
            title: post.title.clone(),
            date: helpers::format_date(&post.date, &config.date_format),
            updated: post
                .updated
                .as_ref()
                .map(|d| helpers::format_date(d, &config.date_format)),
            path: post.path.clone(),
            permalink: post.permalink.clone(),
            tags,
            content: post.content.clone(),
            excerpt: post.excerpt.clone(),
            description: post.description.clone(),
            author: post.author.clone(),
            image: post.image.clone(),
            slug: post.slug.clone(),
            reading_time: post.reading_time(),
            word_count: post.word_count,
            components: post.components.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageData {
    pub title: String,
    pub date: String,
    pub path: String,
    pub permalink: String,
    pub content: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub image: Option<String>,
    pub layout: String,
    pub slug: String,
}

impl PageData {
    pub fn from_page(page: &Page, config: &SiteConfig) -> Self {
        Self {
            title: page.title.clone(),
            date: helpers::format_date(&page.date, &config.date_format),
            path: page.path.clone(),
            permalink: page.permalink.clone(),
            content: page.content.clone(),
            description: page.description.clone(),
            author: page.author.clone(),
            image: page.image.clone(),
            layout: page.layout.clone(),
            slug: page.slug.clone(),
        }
    }
}

/// Adjacent post reference for the post footer navigation
#[derive(Debug, Clone, Serialize)]
pub struct NavPost {
    pub title: String,
    pub path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigData {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub author: String,
    pub language: String,
    pub url: String,
    pub base_path: String,
    pub tag_dir: String,
    pub per_page: usize,
    pub date_format: String,
}

impl ConfigData {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            subtitle: config.subtitle.clone(),
            description: config.description.clone(),
            author: config.author.clone(),
            language: config.language.clone(),
            url: config.url.clone(),
            base_path: config.base_path.clone(),
            tag_dir: config.tag_dir.clone(),
            per_page: config.per_page,
            date_format: config.date_format.clone(),
        }
    }
}
