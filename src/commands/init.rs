//! Initialize a new site

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::Site;

const SITE_CONFIG: &str = r#"# mdxpress configuration

# Site
title: My Blog
subtitle: ''
description: ''
author: Anonymous
language: en

# URL
## Set url to the deployed origin and base_path to the subpath the
## site is served under (e.g. /blog/ for a project page)
url: http://localhost:3000
base_path: /
permalink: posts/:slug/

# Directory
content_dir: content
public_dir: public
static_dir: static
tag_dir: tags

# Writing
new_post_name: ':title.mdx'
default_layout: post
include_drafts: false
future: true
excerpt_separator: '<!-- more -->'
highlight:
  enabled: true
  theme: base16-ocean.dark
  line_numbers: false

# Content models
## With strict_models enabled, entries violating their model fail the
## build instead of logging a warning
strict_models: false

# Date format (moment-style)
date_format: YYYY-MM-DD

# Pagination
per_page: 10
pagination_dir: page
"#;

const THEME_CONFIG: &str = r#"# Theme definition
#
# mode picks the default color scheme: system follows the visitor's
# preference, light and dark force one. The toggle in the header
# overrides it per visitor.
mode: system

palette:
  light:
    background: '#ffffff'
    text: '#111111'
    muted: '#666666'
    accent: '#0070f3'
    border: '#eaeaea'
    code_background: '#f5f5f5'
  dark:
    background: '#0a0a0a'
    text: '#ededed'
    muted: '#888888'
    accent: '#3291ff'
    border: '#333333'
    code_background: '#1a1a1a'

fonts:
  sans: "system-ui, -apple-system, 'Segoe UI', sans-serif"
  mono: "ui-monospace, 'SF Mono', Menlo, monospace"

# Raw CSS appended after the generated variables
# extra_css: |
#   article { max-width: 42rem; }

# Header navigation
menu:
  - name: Posts
    path: /
  - name: Tags
    path: /tags/
  - name: About
    path: /about/
"#;

const MODELS_CONFIG: &str = r#"# Content model definitions
#
# Models declare the fields an entry may carry and how it is routed.
# The built-in post and page models are always available; defining a
# model with the same name replaces the built-in one.
#
# models:
#   recipe:
#     label: Recipe
#     layout: recipe
#     url_path: recipes/:slug/
#     fields:
#       - name: title
#         type: string
#         required: true
#       - name: cuisine
#         type: enum
#         options: [italian, japanese, mexican]
#       - name: servings
#         type: string
#         default: '4'
"#;

const POST_SCAFFOLD: &str = r#"---
title: {{ title }}
date: {{ date }}
tags:
---
"#;

const PAGE_SCAFFOLD: &str = r#"---
title: {{ title }}
---
"#;

const DRAFT_SCAFFOLD: &str = r#"---
title: {{ title }}
draft: true
tags:
---
"#;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir)?;
    fs::create_dir_all(target_dir.join("content/posts"))?;
    fs::create_dir_all(target_dir.join("static"))?;
    fs::create_dir_all(target_dir.join("scaffolds"))?;

    fs::write(target_dir.join("site.yml"), SITE_CONFIG)?;
    fs::write(target_dir.join("theme.yml"), THEME_CONFIG)?;
    fs::write(target_dir.join("models.yml"), MODELS_CONFIG)?;

    fs::write(target_dir.join("scaffolds/post.mdx"), POST_SCAFFOLD)?;
    fs::write(target_dir.join("scaffolds/page.mdx"), PAGE_SCAFFOLD)?;
    fs::write(target_dir.join("scaffolds/draft.mdx"), DRAFT_SCAFFOLD)?;

    let now = chrono::Local::now();
    let sample_post = format!(
        r#"---
title: Hello World
date: {}
description: Your first post, rendered from MDX.
tags: [meta]
---

Welcome to your new blog. This post lives at
`content/posts/hello-world.mdx`, and everything between the `---`
markers above is its front-matter.

<!-- more -->

## Writing MDX

Standard Markdown works as you expect, with MDX extras on top:

{{/* Comments in braces are stripped before rendering. */}}

- `<Component />` tags are collected into the document's component
  inventory
- top-level `import` and `export` statements are ignored

## Code

```rust
fn main() {{
    println!("hello, blog");
}}
```

Create another post with:

```bash
$ mdxpress new "My Second Post"
```
"#,
        now.format("%Y-%m-%d %H:%M:%S")
    );

    fs::write(
        target_dir.join("content/posts/hello-world.mdx"),
        sample_post,
    )?;

    Ok(())
}

/// Run the init command for an existing site instance
pub fn run(site: &Site) -> Result<()> {
    init_site(&site.base_dir)
}
