//! Create a new content entry from a scaffold

use anyhow::Result;
use std::fs;

use crate::Site;

const DEFAULT_SCAFFOLD: &str = "---\ntitle: {{ title }}\ndate: {{ date }}\n---\n";

/// Create a new entry under the content directory.
///
/// Pages land at the content root, everything else under `posts/`.
/// The scaffold named after the layout is used when present, so a
/// custom content model gets its own boilerplate by adding
/// `scaffolds/<layout>.mdx`.
pub fn create_entry(site: &Site, title: &str, layout: &str, path: Option<&str>) -> Result<()> {
    let now = chrono::Local::now();
    let slug = slug::slugify(title);

    let target_dir = match layout {
        "page" => site.content_dir.clone(),
        _ => site.content_dir.join("posts"),
    };

    let filename = if let Some(p) = path {
        format!("{}.mdx", p.trim_end_matches(".mdx"))
    } else if layout == "page" {
        format!("{}.mdx", slug)
    } else {
        site.config
            .new_post_name
            .replace(":title", &slug)
            .replace(":year", &now.format("%Y").to_string())
            .replace(":month", &now.format("%m").to_string())
            .replace(":day", &now.format("%d").to_string())
    };

    let file_path = target_dir.join(&filename);
    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    let scaffold_path = site.scaffold_dir.join(format!("{}.mdx", layout));
    let scaffold = if scaffold_path.exists() {
        fs::read_to_string(&scaffold_path)?
    } else {
        DEFAULT_SCAFFOLD.to_string()
    };

    let content = scaffold
        .replace("{{ title }}", title)
        .replace("{{ date }}", &now.format("%Y-%m-%d %H:%M:%S").to_string())
        .replace("{{ slug }}", &slug);

    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;

    println!("Created: {:?}", file_path);

    Ok(())
}

/// Run the new command with the configured default layout
pub fn run(site: &Site, title: &str, layout: Option<&str>) -> Result<()> {
    let layout = layout.unwrap_or(&site.config.default_layout);
    create_entry(site, title, layout, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;

    fn test_site(dir: &std::path::Path) -> Site {
        Site::new(dir.to_path_buf(), SiteConfig::default())
    }

    #[test]
    fn test_create_post_with_default_scaffold() {
        let dir = tempfile::tempdir().unwrap();
        let site = test_site(dir.path());

        create_entry(&site, "My First Post", "post", None).unwrap();

        let path = site.content_dir.join("posts/my-first-post.mdx");
        let content = fs::read_to_string(path).unwrap();
        assert!(content.starts_with("---\ntitle: My First Post\n"));
        assert!(content.contains("date: "));
    }

    #[test]
    fn test_create_page_at_content_root() {
        let dir = tempfile::tempdir().unwrap();
        let site = test_site(dir.path());

        create_entry(&site, "About Me", "page", None).unwrap();
        assert!(site.content_dir.join("about-me.mdx").exists());
    }

    #[test]
    fn test_custom_scaffold_tokens_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let site = test_site(dir.path());

        fs::create_dir_all(&site.scaffold_dir).unwrap();
        fs::write(
            site.scaffold_dir.join("recipe.mdx"),
            "---\ntitle: {{ title }}\nmodel: recipe\nslug: {{ slug }}\n---\n",
        )
        .unwrap();

        create_entry(&site, "Tomato Soup", "recipe", None).unwrap();

        let content =
            fs::read_to_string(site.content_dir.join("posts/tomato-soup.mdx")).unwrap();
        assert!(content.contains("title: Tomato Soup"));
        assert!(content.contains("model: recipe"));
        assert!(content.contains("slug: tomato-soup"));
    }

    #[test]
    fn test_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let site = test_site(dir.path());

        create_entry(&site, "Once", "post", None).unwrap();
        assert!(create_entry(&site, "Once", "post", None).is_err());
    }

    #[test]
    fn test_explicit_path_gets_extension() {
        let dir = tempfile::tempdir().unwrap();
        let site = test_site(dir.path());

        create_entry(&site, "Notes", "post", Some("series/intro")).unwrap();
        assert!(site.content_dir.join("posts/series/intro.mdx").exists());
    }
}
