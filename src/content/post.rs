//! Post and Page models

use chrono::{DateTime, Local};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::content::frontmatter::parse_date_string;
use crate::content::mdx::Heading;

lazy_static! {
    static ref DATE_PREFIX_RE: Regex = Regex::new(r"^(\d{4}-\d{2}-\d{2})-(.+)$").unwrap();
}

/// A blog post
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    /// Post title
    pub title: String,

    /// Publication date
    pub date: DateTime<Local>,

    /// Last updated date
    pub updated: Option<DateTime<Local>>,

    /// Short summary used in listings and meta tags
    pub description: Option<String>,

    /// Author override from front-matter
    pub author: Option<String>,

    /// Raw MDX content without front-matter
    pub raw: String,

    /// Serialized HTML content
    pub content: String,

    /// Rendered excerpt (before the more marker)
    pub excerpt: Option<String>,

    /// Post tags
    pub tags: Vec<String>,

    /// Layout template to use
    pub layout: String,

    /// Content model this post validates against
    pub model: String,

    /// Source file path (relative to the content directory)
    pub source: String,

    /// Full source file path
    pub full_source: PathBuf,

    /// URL path (site-relative, includes base path)
    pub path: String,

    /// Full permalink URL
    pub permalink: String,

    /// Draft flag from front-matter
    pub draft: bool,

    /// Slug (URL-friendly name)
    pub slug: String,

    /// Cover image for social cards
    pub image: Option<String>,

    /// Component tags referenced by the body
    pub components: Vec<String>,

    /// Headings with anchor ids
    pub headings: Vec<Heading>,

    /// Word count of the serialized body
    pub word_count: usize,

    /// Custom front-matter fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Post {
    /// Create a new post with minimal required fields
    pub fn new(title: String, date: DateTime<Local>, source: String) -> Self {
        let slug = slug::slugify(&title);
        Self {
            title,
            date,
            updated: None,
            description: None,
            author: None,
            raw: String::new(),
            content: String::new(),
            excerpt: None,
            tags: Vec::new(),
            layout: "post".to_string(),
            model: "post".to_string(),
            source: source.clone(),
            full_source: PathBuf::from(&source),
            path: String::new(),
            permalink: String::new(),
            draft: false,
            slug,
            image: None,
            components: Vec::new(),
            headings: Vec::new(),
            word_count: 0,
            extra: HashMap::new(),
        }
    }

    /// Estimated reading time in minutes (200 words per minute, at least 1)
    pub fn reading_time(&self) -> usize {
        self.word_count.div_ceil(200).max(1)
    }

    /// The adjacent older post.
    ///
    /// `posts` is expected newest first, so the older neighbor sits at the
    /// following index. Matching is by slug.
    pub fn previous_in<'a>(&self, posts: &'a [Post]) -> Option<&'a Post> {
        let pos = posts.iter().position(|p| p.slug == self.slug)?;
        posts.get(pos + 1)
    }

    /// The adjacent newer post.
    ///
    /// `posts` is expected newest first, so the newer neighbor sits at the
    /// preceding index. Matching is by slug.
    pub fn next_in<'a>(&self, posts: &'a [Post]) -> Option<&'a Post> {
        let pos = posts.iter().position(|p| p.slug == self.slug)?;
        if pos > 0 {
            posts.get(pos - 1)
        } else {
            None
        }
    }
}

/// A standalone page
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    /// Page title
    pub title: String,

    /// Creation date
    pub date: DateTime<Local>,

    /// Last updated date
    pub updated: Option<DateTime<Local>>,

    /// Short summary used in meta tags
    pub description: Option<String>,

    /// Author override from front-matter
    pub author: Option<String>,

    /// Raw MDX content without front-matter
    pub raw: String,

    /// Serialized HTML content
    pub content: String,

    /// Layout template to use
    pub layout: String,

    /// Content model this page validates against
    pub model: String,

    /// Source file path (relative to the content directory)
    pub source: String,

    /// Full source file path
    pub full_source: PathBuf,

    /// URL path (site-relative, includes base path)
    pub path: String,

    /// Full permalink URL
    pub permalink: String,

    /// Draft flag from front-matter
    pub draft: bool,

    /// Slug (URL-friendly name)
    pub slug: String,

    /// Cover image for social cards
    pub image: Option<String>,

    /// Component tags referenced by the body
    pub components: Vec<String>,

    /// Headings with anchor ids
    pub headings: Vec<Heading>,

    /// Word count of the serialized body
    pub word_count: usize,

    /// Custom front-matter fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Page {
    /// Create a new page with minimal required fields
    pub fn new(title: String, date: DateTime<Local>, source: String) -> Self {
        let slug = slug::slugify(&title);
        Self {
            title,
            date,
            updated: None,
            description: None,
            author: None,
            raw: String::new(),
            content: String::new(),
            layout: "page".to_string(),
            model: "page".to_string(),
            source: source.clone(),
            full_source: PathBuf::from(&source),
            path: String::new(),
            permalink: String::new(),
            draft: false,
            slug,
            image: None,
            components: Vec::new(),
            headings: Vec::new(),
            word_count: 0,
            extra: HashMap::new(),
        }
    }
}

/// A tag with associated posts
#[derive(Debug, Clone, Serialize)]
pub struct Tag {
    pub name: String,
    pub slug: String,
    pub path: String,
    pub permalink: String,
    pub count: usize,
}

impl Tag {
    /// `base_url` is the site url joined with the base path, without a
    /// trailing slash.
    pub fn new(name: &str, base_url: &str, tag_dir: &str) -> Self {
        let slug = slug::slugify(name);
        let path = format!("/{}/{}/", tag_dir.trim_matches('/'), slug);
        let permalink = format!("{}{}", base_url.trim_end_matches('/'), path);
        Self {
            name: name.to_string(),
            slug,
            path,
            permalink,
            count: 0,
        }
    }
}

/// Derive a slug from a file stem, stripping a leading `YYYY-MM-DD-` prefix
pub fn slug_from_file_stem(stem: &str) -> String {
    let rest = DATE_PREFIX_RE
        .captures(stem)
        .and_then(|c| c.get(2))
        .map(|m| m.as_str())
        .unwrap_or(stem);
    slug::slugify(rest)
}

/// Extract a publication date from a `YYYY-MM-DD-` file stem prefix
pub(crate) fn date_from_file_stem(stem: &str) -> Option<DateTime<Local>> {
    let captures = DATE_PREFIX_RE.captures(stem)?;
    parse_date_string(captures.get(1)?.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn post_dated(slug: &str, y: i32, m: u32, d: u32) -> Post {
        let date = Local.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap();
        let mut post = Post::new(slug.to_string(), date, format!("posts/{}.mdx", slug));
        post.slug = slug.to_string();
        post
    }

    #[test]
    fn test_navigation_newest_first() {
        // Newest first, the order the loader produces
        let posts = vec![
            post_dated("newest", 2024, 3, 20),
            post_dated("middle", 2024, 3, 15),
            post_dated("oldest", 2024, 3, 10),
        ];

        let middle = &posts[1];
        assert_eq!(middle.previous_in(&posts).map(|p| p.slug.as_str()), Some("oldest"));
        assert_eq!(middle.next_in(&posts).map(|p| p.slug.as_str()), Some("newest"));

        assert_eq!(posts[0].next_in(&posts).map(|p| p.slug.as_str()), None);
        assert_eq!(posts[0].previous_in(&posts).map(|p| p.slug.as_str()), Some("middle"));
        assert_eq!(posts[2].previous_in(&posts).map(|p| p.slug.as_str()), None);
        assert_eq!(posts[2].next_in(&posts).map(|p| p.slug.as_str()), Some("middle"));
    }

    #[test]
    fn test_navigation_unknown_slug() {
        let posts = vec![post_dated("only", 2024, 1, 1)];
        let outsider = post_dated("outsider", 2024, 2, 2);
        assert!(outsider.previous_in(&posts).is_none());
        assert!(outsider.next_in(&posts).is_none());
    }

    #[test]
    fn test_reading_time() {
        let mut post = post_dated("p", 2024, 1, 1);
        assert_eq!(post.reading_time(), 1);
        post.word_count = 200;
        assert_eq!(post.reading_time(), 1);
        post.word_count = 201;
        assert_eq!(post.reading_time(), 2);
        post.word_count = 1000;
        assert_eq!(post.reading_time(), 5);
    }

    #[test]
    fn test_slug_from_file_stem() {
        assert_eq!(slug_from_file_stem("2024-03-15-hello-world"), "hello-world");
        assert_eq!(slug_from_file_stem("2024-03-15-Hello World"), "hello-world");
        assert_eq!(slug_from_file_stem("about"), "about");
        assert_eq!(slug_from_file_stem("My First Post"), "my-first-post");
        assert_eq!(slug_from_file_stem("snake_case_name"), "snake-case-name");
    }

    #[test]
    fn test_date_from_file_stem() {
        let date = date_from_file_stem("2024-03-15-hello").unwrap();
        assert_eq!(date.format("%Y-%m-%d").to_string(), "2024-03-15");
        assert!(date_from_file_stem("hello-world").is_none());
        assert!(date_from_file_stem("2024-03-15").is_none());
    }

    #[test]
    fn test_tag_paths() {
        let tag = Tag::new("Rust Lang", "https://example.com/blog", "tags");
        assert_eq!(tag.slug, "rust-lang");
        assert_eq!(tag.path, "/tags/rust-lang/");
        assert_eq!(tag.permalink, "https://example.com/blog/tags/rust-lang/");
    }
}
