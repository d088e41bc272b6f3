//! Declarative content models
//!
//! A content model names the fields an entry carries, which layout renders
//! it and where it lives in the URL space. The builtin `post` and `page`
//! models cover a plain blog; `models.yml` can add new models or replace
//! the builtins by name.

use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::frontmatter::parse_date_string;
use crate::content::FrontMatter;

/// Field kinds a model can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    String,
    Text,
    Markdown,
    #[serde(rename = "datetime")]
    DateTime,
    Boolean,
    List,
    Image,
    Enum,
}

impl FieldKind {
    fn expected(&self) -> &'static str {
        match self {
            FieldKind::String | FieldKind::Text | FieldKind::Markdown | FieldKind::Image => {
                "a string"
            }
            FieldKind::DateTime => "a datetime string",
            FieldKind::Boolean => "a boolean",
            FieldKind::List => "a list",
            FieldKind::Enum => "one of the declared options",
        }
    }
}

/// One declared field of a content model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    /// Back-filled into entries that omit the field
    #[serde(default)]
    pub default: Option<serde_yaml::Value>,
    /// Allowed values for `enum` fields
    #[serde(default)]
    pub options: Vec<String>,
    /// Human-readable name for editing UIs
    #[serde(default)]
    pub label: Option<String>,
}

impl FieldDef {
    fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: false,
            default: None,
            options: Vec::new(),
            label: None,
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A violation found while validating an entry against its model
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelViolation {
    #[error("missing required field `{field}` (model `{model}`)")]
    MissingField { model: String, field: String },

    #[error("field `{field}` expects {expected}, got {found} (model `{model}`)")]
    TypeMismatch {
        model: String,
        field: String,
        expected: &'static str,
        found: String,
    },

    #[error("field `{field}` must be one of [{options}], got `{value}` (model `{model}`)")]
    UnknownVariant {
        model: String,
        field: String,
        options: String,
        value: String,
    },
}

/// An entry rejected by its model under `strict_models`.
///
/// Loaders skip entries that fail for incidental reasons (unreadable
/// file, bad YAML), but this error must propagate and fail the build.
#[derive(Debug, Error)]
#[error("{source_path}: {}", .violations.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
pub struct ModelRejection {
    pub source_path: String,
    pub violations: Vec<ModelViolation>,
}

/// A named content model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentModel {
    /// Model name, filled from the registry key
    #[serde(default)]
    pub name: String,

    /// Human-readable name for editing UIs
    #[serde(default)]
    pub label: Option<String>,

    /// Layout template entries of this model render with.
    /// Defaults to the model name.
    #[serde(default)]
    pub layout: String,

    /// Permalink pattern for entries of this model, overriding the site
    /// default. Supports `:year`, `:month`, `:day` and `:slug` tokens.
    #[serde(default)]
    pub url_path: Option<String>,

    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

impl ContentModel {
    /// Validate an entry's front-matter against this model
    pub fn validate(&self, fm: &FrontMatter) -> Vec<ModelViolation> {
        let mut violations = Vec::new();

        for field in &self.fields {
            let builtin = is_builtin_field(&field.name);
            if field.required && !field_present(fm, &field.name) {
                violations.push(ModelViolation::MissingField {
                    model: self.name.clone(),
                    field: field.name.clone(),
                });
                continue;
            }
            // Builtin fields are typed at parse time; only custom fields
            // need their values checked here
            if builtin {
                continue;
            }
            let Some(value) = fm.extra.get(&field.name) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            self.check_value(field, value, &mut violations);
        }

        violations
    }

    fn check_value(
        &self,
        field: &FieldDef,
        value: &serde_yaml::Value,
        violations: &mut Vec<ModelViolation>,
    ) {
        let mismatch = |found: &str| ModelViolation::TypeMismatch {
            model: self.name.clone(),
            field: field.name.clone(),
            expected: field.kind.expected(),
            found: found.to_string(),
        };

        match field.kind {
            FieldKind::String | FieldKind::Text | FieldKind::Markdown | FieldKind::Image => {
                if !value.is_string() {
                    violations.push(mismatch(kind_of(value)));
                }
            }
            FieldKind::Boolean => {
                if !value.is_bool() {
                    violations.push(mismatch(kind_of(value)));
                }
            }
            FieldKind::List => {
                if !value.is_sequence() {
                    violations.push(mismatch(kind_of(value)));
                }
            }
            FieldKind::DateTime => match value.as_str() {
                Some(s) if parse_date_string(s).is_some() => {}
                Some(s) => violations.push(mismatch(&format!("`{}`", s))),
                None => violations.push(mismatch(kind_of(value))),
            },
            FieldKind::Enum => match value.as_str() {
                Some(s) if self_options_contain(&field.options, s) => {}
                Some(s) => violations.push(ModelViolation::UnknownVariant {
                    model: self.name.clone(),
                    field: field.name.clone(),
                    options: field.options.join(", "),
                    value: s.to_string(),
                }),
                None => violations.push(mismatch(kind_of(value))),
            },
        }
    }

    /// Back-fill declared defaults into an entry that omits them
    pub fn apply_defaults(&self, fm: &mut FrontMatter) {
        for field in &self.fields {
            let Some(default) = &field.default else {
                continue;
            };
            if field_present(fm, &field.name) {
                continue;
            }
            match field.name.as_str() {
                "title" => fm.title = default.as_str().map(str::to_string),
                "description" => fm.description = default.as_str().map(str::to_string),
                "author" => fm.author = default.as_str().map(str::to_string),
                "image" => fm.image = default.as_str().map(str::to_string),
                "layout" => fm.layout = default.as_str().map(str::to_string),
                "tags" => {
                    if let Some(seq) = default.as_sequence() {
                        fm.tags = seq
                            .iter()
                            .filter_map(|v| v.as_str().map(str::to_string))
                            .collect();
                    }
                }
                "date" | "updated" | "model" | "slug" | "permalink" | "draft" => {}
                _ => {
                    fm.extra.insert(field.name.clone(), default.clone());
                }
            }
        }
    }
}

/// The set of known content models
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: IndexMap<String, ContentModel>,
}

#[derive(Debug, Deserialize)]
struct ModelsFile {
    #[serde(default)]
    models: IndexMap<String, ContentModel>,
}

impl ModelRegistry {
    /// The builtin `post` and `page` models
    pub fn builtin() -> Self {
        let mut models = IndexMap::new();

        let post = ContentModel {
            name: "post".to_string(),
            label: Some("Blog Post".to_string()),
            layout: "post".to_string(),
            url_path: None,
            fields: vec![
                FieldDef::new("title", FieldKind::String).required(),
                FieldDef::new("date", FieldKind::DateTime),
                FieldDef::new("description", FieldKind::Text),
                FieldDef::new("tags", FieldKind::List),
                FieldDef::new("image", FieldKind::Image),
                FieldDef::new("draft", FieldKind::Boolean),
            ],
        };
        let page = ContentModel {
            name: "page".to_string(),
            label: Some("Page".to_string()),
            layout: "page".to_string(),
            url_path: None,
            fields: vec![
                FieldDef::new("title", FieldKind::String).required(),
                FieldDef::new("description", FieldKind::Text),
            ],
        };

        models.insert(post.name.clone(), post);
        models.insert(page.name.clone(), page);
        Self { models }
    }

    /// Load `models.yml`, replacing builtins that share a name.
    /// A missing file leaves the builtin registry untouched.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::builtin());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read models file: {:?}", path))?;
        Self::parse(&content).with_context(|| format!("Failed to parse models file: {:?}", path))
    }

    /// Parse a `models.yml` document on top of the builtin registry
    pub fn parse(content: &str) -> Result<Self> {
        let file: ModelsFile = serde_yaml::from_str(content)?;
        let mut registry = Self::builtin();

        for (name, mut model) in file.models {
            model.name = name.clone();
            if model.layout.is_empty() {
                model.layout = name.clone();
            }
            for field in &model.fields {
                if field.kind == FieldKind::Enum && field.options.is_empty() {
                    tracing::warn!(
                        "Model `{}` field `{}` is an enum without options",
                        name,
                        field.name
                    );
                }
            }
            registry.models.insert(name, model);
        }
        Ok(registry)
    }

    pub fn get(&self, name: &str) -> Option<&ContentModel> {
        self.models.get(name)
    }

    pub fn models(&self) -> impl Iterator<Item = &ContentModel> {
        self.models.values()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn self_options_contain(options: &[String], value: &str) -> bool {
    options.iter().any(|o| o == value)
}

/// Fields parsed into typed `FrontMatter` slots rather than `extra`
fn is_builtin_field(name: &str) -> bool {
    matches!(
        name,
        "title"
            | "date"
            | "updated"
            | "description"
            | "author"
            | "tags"
            | "layout"
            | "model"
            | "slug"
            | "permalink"
            | "draft"
            | "image"
    )
}

fn field_present(fm: &FrontMatter, name: &str) -> bool {
    match name {
        "title" => fm.title.is_some(),
        "date" => fm.date.is_some(),
        "updated" => fm.updated.is_some(),
        "description" => fm.description.is_some(),
        "author" => fm.author.is_some(),
        "tags" => !fm.tags.is_empty(),
        "layout" => fm.layout.is_some(),
        "model" => fm.model.is_some(),
        "slug" => fm.slug.is_some(),
        "permalink" => fm.permalink.is_some(),
        // Always present, the parser defaults it to false
        "draft" => true,
        "image" => fm.image.is_some(),
        _ => fm
            .extra
            .get(name)
            .map(|v| !v.is_null())
            .unwrap_or(false),
    }
}

fn kind_of(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "a boolean",
        serde_yaml::Value::Number(_) => "a number",
        serde_yaml::Value::String(_) => "a string",
        serde_yaml::Value::Sequence(_) => "a list",
        serde_yaml::Value::Mapping(_) => "a mapping",
        serde_yaml::Value::Tagged(_) => "a tagged value",
    }
}
