//! MDX serialization: HTML rendering, component inventory and heading metadata

use std::collections::{BTreeSet, HashMap};

use anyhow::Result;
use lazy_static::lazy_static;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use regex::Regex;
use serde::Serialize;
use slug::slugify;
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use crate::config::HighlightConfig;

lazy_static! {
    /// Opening or self-closing JSX-style tags: `<Callout`, `<Layout.Header`
    static ref COMPONENT_RE: Regex = Regex::new(r"<([A-Z][A-Za-z0-9_.]*)").unwrap();
    /// MDX comments: `{/* ... */}`, possibly spanning lines
    static ref MDX_COMMENT_RE: Regex = Regex::new(r"(?s)\{\s*/\*.*?\*/\s*\}").unwrap();
}

/// A heading collected while serializing, with its anchor id
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Heading {
    pub level: u32,
    pub text: String,
    pub id: String,
}

/// The serialized form of one MDX body
#[derive(Debug, Clone, Serialize, Default)]
pub struct MdxDocument {
    /// Rendered HTML with heading anchors and highlighted code
    pub html: String,
    /// Capitalized component tags referenced by the body, sorted and deduplicated
    pub components: Vec<String>,
    /// Headings in document order
    pub headings: Vec<Heading>,
    pub word_count: usize,
}

/// MDX renderer with syntax highlighting
pub struct MdxRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
    line_numbers: bool,
    enabled: bool,
}

impl MdxRenderer {
    /// Create a renderer with default highlighting settings
    pub fn new() -> Self {
        Self::from_config(&HighlightConfig::default())
    }

    /// Create a renderer from the site highlight configuration
    pub fn from_config(config: &HighlightConfig) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme_name: config.theme.clone(),
            line_numbers: config.line_numbers,
            enabled: config.enabled,
        }
    }

    /// Serialize an MDX body (front-matter already removed) into HTML
    /// plus component and heading metadata.
    ///
    /// ESM `import`/`export` blocks and `{/* ... */}` comments are
    /// stripped before rendering; code fences keep their content verbatim.
    pub fn serialize(&self, source: &str) -> Result<MdxDocument> {
        let source = preprocess(source);

        // Enable most options but NOT YAML metadata blocks
        // Front-matter is handled separately in FrontMatter::parse()
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_SMART_PUNCTUATION
            | Options::ENABLE_HEADING_ATTRIBUTES
            | Options::ENABLE_DEFINITION_LIST
            | Options::ENABLE_GFM;
        let parser = Parser::new_ext(&source, options);

        let mut events: Vec<Event> = Vec::new();
        let mut components: BTreeSet<String> = BTreeSet::new();
        let mut headings: Vec<Heading> = Vec::new();
        let mut seen_ids: HashMap<String, usize> = HashMap::new();

        let mut in_code_block = false;
        let mut code_lang: Option<String> = None;
        let mut code_content = String::new();
        let mut heading_capture: Option<(u32, Option<String>, Vec<Event>)> = None;

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    in_code_block = true;
                    code_lang = match kind {
                        CodeBlockKind::Fenced(info) => {
                            // Keep only the language token, MDX fences often
                            // carry extra metadata like ```js title="app.js"
                            info.split_whitespace().next().map(str::to_string)
                        }
                        CodeBlockKind::Indented => None,
                    };
                    code_content.clear();
                }
                Event::End(TagEnd::CodeBlock) => {
                    let highlighted = self.highlight_code(&code_content, code_lang.as_deref());
                    events.push(Event::Html(CowStr::from(highlighted)));
                    in_code_block = false;
                    code_lang = None;
                }
                Event::Text(text) if in_code_block => {
                    code_content.push_str(&text);
                }
                Event::Start(Tag::Heading { level, id, .. }) => {
                    heading_capture =
                        Some((level as u32, id.map(|s| s.to_string()), Vec::new()));
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some((level, explicit_id, inner)) = heading_capture.take() {
                        let text = plain_text_of(&inner);
                        let base = explicit_id.unwrap_or_else(|| {
                            let s = slugify(&text);
                            if s.is_empty() {
                                "section".to_string()
                            } else {
                                s
                            }
                        });
                        let count = seen_ids.entry(base.clone()).or_insert(0);
                        let id = if *count == 0 {
                            base.clone()
                        } else {
                            format!("{}-{}", base, count)
                        };
                        *count += 1;

                        events.push(Event::Html(CowStr::from(format!(
                            r#"<h{} id="{}">"#,
                            level,
                            html_escape(&id)
                        ))));
                        events.extend(inner);
                        events.push(Event::Html(CowStr::from(format!("</h{}>", level))));
                        headings.push(Heading { level, text, id });
                    }
                }
                Event::Html(ref raw) | Event::InlineHtml(ref raw) => {
                    for capture in COMPONENT_RE.captures_iter(raw) {
                        components.insert(capture[1].to_string());
                    }
                    if let Some((_, _, inner)) = heading_capture.as_mut() {
                        inner.push(event);
                    } else {
                        events.push(event);
                    }
                }
                other => {
                    if let Some((_, _, inner)) = heading_capture.as_mut() {
                        inner.push(other);
                    } else {
                        events.push(other);
                    }
                }
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        let word_count = count_words(&html_output);

        Ok(MdxDocument {
            html: html_output,
            components: components.into_iter().collect(),
            headings,
            word_count,
        })
    }

    /// Highlight a code block
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> String {
        let lang = lang.unwrap_or("text");
        if !self.enabled {
            return plain_code_block(code, lang);
        }

        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let theme = match self
            .theme_set
            .themes
            .get(&self.theme_name)
            .or_else(|| self.theme_set.themes.values().next())
        {
            Some(theme) => theme,
            None => return plain_code_block(code, lang),
        };

        match highlighted_html_for_string(code, &self.syntax_set, syntax, theme) {
            Ok(highlighted) => {
                if self.line_numbers {
                    self.add_line_numbers(&highlighted, lang)
                } else {
                    format!(
                        r#"<figure class="highlight {}">{}</figure>"#,
                        html_escape(lang),
                        highlighted
                    )
                }
            }
            Err(_) => plain_code_block(code, lang),
        }
    }

    /// Add a line-number gutter to highlighted code
    fn add_line_numbers(&self, highlighted: &str, lang: &str) -> String {
        // highlighted_html_for_string wraps the code in a <pre> of its own;
        // peel it off so the gutter only counts code lines
        let body = highlighted
            .trim_end()
            .strip_suffix("</pre>")
            .unwrap_or(highlighted)
            .trim_end_matches('\n');
        let body = match body.find('\n') {
            Some(idx) if body[..idx].starts_with("<pre") => &body[idx + 1..],
            _ => body,
        };

        let lines: Vec<&str> = body.lines().collect();
        let line_count = lines.len();

        let mut gutter = String::new();
        let mut code_lines = String::new();
        for (i, line) in lines.iter().enumerate() {
            gutter.push_str(&format!(r#"<span class="line-number">{}</span>"#, i + 1));
            code_lines.push_str(line);
            if i < line_count - 1 {
                gutter.push('\n');
                code_lines.push('\n');
            }
        }

        format!(
            r#"<figure class="highlight {}"><table><tr><td class="gutter"><pre>{}</pre></td><td class="code"><pre>{}</pre></td></tr></table></figure>"#,
            html_escape(lang),
            gutter,
            code_lines
        )
    }

    /// Split content on the excerpt marker.
    ///
    /// Both the configured separator (usually `<!-- more -->`) and the MDX
    /// comment form `{/* more */}` are honored; whichever appears first wins.
    /// Returns the excerpt (if any) and the full content with the marker removed.
    pub fn split_excerpt(content: &str, separator: &str) -> (Option<String>, String) {
        const MDX_MORE: &str = "{/* more */}";
        let hit = [separator, MDX_MORE]
            .into_iter()
            .filter(|marker| !marker.is_empty())
            .filter_map(|marker| content.find(marker).map(|pos| (pos, marker.len())))
            .min_by_key(|(pos, _)| *pos);

        match hit {
            Some((pos, len)) => {
                let excerpt = content[..pos].trim().to_string();
                let remaining = content[pos + len..].trim().to_string();
                let full = format!("{}\n\n{}", excerpt, remaining);
                (Some(excerpt), full)
            }
            None => (None, content.to_string()),
        }
    }
}

impl Default for MdxRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip ESM import/export blocks and MDX comments outside code fences
fn preprocess(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut region = String::new();
    let mut fence: Option<&'static str> = None;
    let mut in_esm = false;
    let mut at_block_start = true;

    for line in source.lines() {
        if let Some(marker) = fence {
            out.push_str(line);
            out.push('\n');
            if line.trim_start().starts_with(marker) {
                fence = None;
                at_block_start = false;
            }
            continue;
        }

        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            flush_region(&mut out, &mut region);
            in_esm = false;
            fence = Some(if trimmed.starts_with("```") { "```" } else { "~~~" });
            out.push_str(line);
            out.push('\n');
        } else if in_esm {
            // ESM blocks run until a blank line
            if line.trim().is_empty() {
                in_esm = false;
                at_block_start = true;
                region.push('\n');
            }
        } else if at_block_start
            && (line.starts_with("import ") || line.starts_with("export "))
        {
            in_esm = true;
        } else {
            region.push_str(line);
            region.push('\n');
            at_block_start = line.trim().is_empty();
        }
    }
    flush_region(&mut out, &mut region);
    out
}

fn flush_region(out: &mut String, region: &mut String) {
    if region.is_empty() {
        return;
    }
    out.push_str(&MDX_COMMENT_RE.replace_all(region, ""));
    region.clear();
}

/// Concatenate the visible text of buffered inline events
fn plain_text_of(events: &[Event]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            _ => {}
        }
    }
    text.trim().to_string()
}

fn plain_code_block(code: &str, lang: &str) -> String {
    format!(
        r#"<pre><code class="language-{}">{}</code></pre>"#,
        html_escape(lang),
        html_escape(code)
    )
}

/// Simple HTML escaping
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Count words in rendered HTML: runs of alphanumerics count as one word,
/// CJK characters count one each
fn count_words(html_text: &str) -> usize {
    let mut count = 0;
    let mut in_word = false;
    let mut in_tag = false;

    for ch in html_text.chars() {
        if in_tag {
            if ch == '>' {
                in_tag = false;
            }
            continue;
        }
        if ch == '<' {
            in_tag = true;
            in_word = false;
            continue;
        }
        if is_cjk(ch) {
            count += 1;
            in_word = false;
        } else if ch.is_alphanumeric() {
            if !in_word {
                count += 1;
                in_word = true;
            }
        } else {
            in_word = false;
        }
    }
    count
}

fn is_cjk(ch: char) -> bool {
    matches!(ch as u32,
        0x4E00..=0x9FFF      // CJK Unified Ideographs
        | 0x3400..=0x4DBF    // Extension A
        | 0x3040..=0x30FF    // Hiragana + Katakana
        | 0xAC00..=0xD7AF    // Hangul syllables
    )
}
