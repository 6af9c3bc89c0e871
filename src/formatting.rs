//! Coordinate line templates and the rules that pick them.
//!
//! Each processed image produces one manifest line. Which line format is
//! used depends on the image: a formatting table maps regex patterns to
//! templates, and the first pattern that matches wins.
//!
//! ## Table files
//!
//! A table is a flat key/value document, JSON or TOML, read in file order:
//!
//! ```json
//! {
//!     ".*_hover": "    imagebutton:\n        hover \"{path}\"\n",
//!     ".*_idle": "        idle \"{path}\"\n        xpos {x} ypos {y} focus_mask True\n",
//!     "bg_.*|bg.*": "    add \"{path}\" xpos {x} ypos {y}\n",
//!     ".png": "{name} {x},{y}\n"
//! }
//! ```
//!
//! The table above is also the built-in one used when no file is found.
//! Anything no pattern matches uses [`DEFAULT_TEMPLATE`].
//!
//! ## Placeholders
//!
//! | Placeholder | Value |
//! |---|---|
//! | `{name}` | output file name |
//! | `{path}` | absolute output path |
//! | `{x}` `{y}` | left/top of the image's content box |
//! | `{bx}` `{by}` | right/bottom of the image's content box |
//!
//! `{{` and `}}` produce literal braces. Any other `{...}` is an error, and
//! every template is test-rendered when the table is loaded.

use crate::config::ConfigError;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Line format used when no pattern matches.
pub const DEFAULT_TEMPLATE: &str = "{path} {x},{y},{bx},{by}\n";

const BUILTIN_RULES: &[(&str, &str)] = &[
    (".*_hover", "    imagebutton:\n        hover \"{path}\"\n"),
    (
        ".*_idle",
        "        idle \"{path}\"\n        xpos {x} ypos {y} focus_mask True\n",
    ),
    ("bg_.*|bg.*", "    add \"{path}\" xpos {x} ypos {y}\n"),
    (".png", "{name} {x},{y}\n"),
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unknown placeholder '{{{0}}}'")]
    UnknownPlaceholder(String),
    #[error("unclosed '{{' in template {0:?}")]
    Unclosed(String),
    #[error("unmatched '}}' in template {0:?}")]
    StrayBrace(String),
}

/// Values available to a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholders {
    pub name: String,
    pub path: String,
    pub x: u32,
    pub y: u32,
    pub bx: u32,
    pub by: u32,
}

impl Placeholders {
    fn lookup(&self, key: &str) -> Option<String> {
        match key {
            "name" => Some(self.name.clone()),
            "path" => Some(self.path.clone()),
            "x" => Some(self.x.to_string()),
            "y" => Some(self.y.to_string()),
            "bx" => Some(self.bx.to_string()),
            "by" => Some(self.by.to_string()),
            _ => None,
        }
    }

    fn sample() -> Self {
        Self {
            name: "sample.png".into(),
            path: "/sample.png".into(),
            x: 0,
            y: 0,
            bx: 1,
            by: 1,
        }
    }
}

/// A line format with `{placeholder}` fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template(String);

impl Template {
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substitute every placeholder.
    pub fn render(&self, values: &Placeholders) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(self.0.len() + 32);
        let mut chars = self.0.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    out.push('{');
                }
                '{' => {
                    let mut key = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(ch) => key.push(ch),
                            None => return Err(TemplateError::Unclosed(self.0.clone())),
                        }
                    }
                    let value = values
                        .lookup(&key)
                        .ok_or(TemplateError::UnknownPlaceholder(key))?;
                    out.push_str(&value);
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    out.push('}');
                }
                '}' => return Err(TemplateError::StrayBrace(self.0.clone())),
                _ => out.push(c),
            }
        }

        Ok(out)
    }
}

/// One pattern → template rule.
#[derive(Debug, Clone)]
pub struct Rule {
    pub pattern: Regex,
    pub template: Template,
}

/// Ordered rules plus the fallback template.
///
/// Loaded once per run and shared read-only by every writer.
#[derive(Debug, Clone)]
pub struct FormattingTable {
    rules: Vec<Rule>,
    default: Template,
}

impl FormattingTable {
    /// Compile and validate rules, keeping their order.
    pub fn new<P, T>(rules: impl IntoIterator<Item = (P, T)>) -> Result<Self, ConfigError>
    where
        P: AsRef<str>,
        T: Into<String>,
    {
        let sample = Placeholders::sample();
        let rules = rules
            .into_iter()
            .map(|(pattern, template)| -> Result<Rule, ConfigError> {
                let pattern = pattern.as_ref();
                let regex = Regex::new(pattern).map_err(|source| ConfigError::Regex {
                    pattern: pattern.to_string(),
                    source,
                })?;
                let template = Template::new(template);
                template
                    .render(&sample)
                    .map_err(|source| ConfigError::Template {
                        pattern: pattern.to_string(),
                        source,
                    })?;
                Ok(Rule {
                    pattern: regex,
                    template,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self {
            rules,
            default: Template::new(DEFAULT_TEMPLATE),
        })
    }

    /// Table with no rules: everything renders with [`DEFAULT_TEMPLATE`].
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            default: Template::new(DEFAULT_TEMPLATE),
        }
    }

    /// The four-rule table for hover/idle/background sprites.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::new(BUILTIN_RULES.iter().copied())
    }

    /// Load a table file, or the built-in table when there is none.
    ///
    /// - `None` or a missing file → [`FormattingTable::builtin`]
    /// - `.json` / `.toml` → parsed in file order
    /// - any other extension → warning, built-in table
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Self::builtin();
        };
        if !path.is_file() {
            info!(
                "Formatting table {} not found, using built-in rules",
                path.display()
            );
            return Self::builtin();
        }

        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let pairs = match ext.as_str() {
            "json" => parse_json(path, &fs::read_to_string(path)?)?,
            "toml" => parse_toml(path, &fs::read_to_string(path)?)?,
            other => {
                warn!(
                    "Formatting table {} has unsupported extension '{other}', using built-in rules",
                    path.display()
                );
                return Self::builtin();
            }
        };

        info!(
            "Loaded {} formatting rules from {}",
            pairs.len(),
            path.display()
        );
        Self::new(pairs)
    }

    /// Table whose templates are not test-rendered.
    #[cfg(test)]
    pub(crate) fn unchecked(pattern: &str, template: &str) -> Self {
        Self {
            rules: vec![Rule {
                pattern: Regex::new(pattern).unwrap(),
                template: Template::new(template),
            }],
            default: Template::new(DEFAULT_TEMPLATE),
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn default_template(&self) -> &Template {
        &self.default
    }

    /// Template of the first rule whose pattern is found in `candidate`.
    ///
    /// Pure: same table and candidate always give the same template.
    pub fn resolve(&self, candidate: &str) -> &Template {
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(candidate))
            .map(|rule| &rule.template)
            .unwrap_or(&self.default)
    }
}

/// The string rules are matched against: full path or bare file name.
pub fn match_candidate(output: &Path, match_path: bool) -> String {
    if match_path {
        output.to_string_lossy().to_string()
    } else {
        output
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

fn parse_json(path: &Path, content: &str) -> Result<Vec<(String, String)>, ConfigError> {
    let map: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    map.into_iter()
        .map(|(key, value)| match value {
            serde_json::Value::String(s) => Ok((key, s)),
            other => Err(invalid_value(path, &key, &other.to_string())),
        })
        .collect()
}

fn parse_toml(path: &Path, content: &str) -> Result<Vec<(String, String)>, ConfigError> {
    let table: toml::Table = toml::from_str(content).map_err(|source| ConfigError::Toml {
        path: path.to_path_buf(),
        source,
    })?;
    table
        .into_iter()
        .map(|(key, value)| match value {
            toml::Value::String(s) => Ok((key, s)),
            other => Err(invalid_value(path, &key, &other.to_string())),
        })
        .collect()
}

fn invalid_value(path: &Path, key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidTable {
        path: PathBuf::from(path),
        message: format!("value for '{key}' must be a string, got {value}"),
    }
}
