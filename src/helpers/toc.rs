//! Table of contents built from collected headings

use super::html::html_escape;
use crate::content::Heading;

/// Render a nested table of contents as an HTML list.
///
/// Nesting follows heading levels relative to the shallowest heading
/// present. Returns an empty string when there are no headings.
pub fn toc(headings: &[Heading]) -> String {
    let Some(min_level) = headings.iter().map(|h| h.level).min() else {
        return String::new();
    };

    let mut out = String::from("<ul class=\"toc\">\n");
    let mut current = min_level;

    for heading in headings {
        let level = heading.level.clamp(min_level, 6);
        while current < level {
            out.push_str("<ul>\n");
            current += 1;
        }
        while current > level {
            out.push_str("</ul>\n");
            current -= 1;
        }
        out.push_str(&format!(
            "<li><a href=\"#{}\">{}</a></li>\n",
            heading.id,
            html_escape(&heading.text)
        ));
    }

    while current > min_level {
        out.push_str("</ul>\n");
        current -= 1;
    }
    out.push_str("</ul>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading(level: u32, text: &str, id: &str) -> Heading {
        Heading {
            level,
            text: text.to_string(),
            id: id.to_string(),
        }
    }

    #[test]
    fn test_empty_toc() {
        assert_eq!(toc(&[]), "");
    }

    #[test]
    fn test_flat_toc() {
        let html = toc(&[
            heading(2, "First", "first"),
            heading(2, "Second", "second"),
        ]);
        assert!(html.contains(r##"<a href="#first">First</a>"##));
        assert!(html.contains(r##"<a href="#second">Second</a>"##));
        assert!(html.find("first").unwrap() < html.find("second").unwrap());
    }

    #[test]
    fn test_nested_toc() {
        let html = toc(&[
            heading(2, "Intro", "intro"),
            heading(3, "Detail", "detail"),
            heading(2, "Outro", "outro"),
        ]);
        // One nested list opens for the h3 and closes before the final h2
        assert_eq!(html.matches("<ul").count(), 2);
        assert_eq!(html.matches("</ul>").count(), 2);
    }

    #[test]
    fn test_escapes_heading_text() {
        let html = toc(&[heading(2, "Tips & Tricks", "tips-tricks")]);
        assert!(html.contains("Tips &amp; Tricks"));
    }
}
