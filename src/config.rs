//! Run configuration.
//!
//! Every option has a default matching the CLI, so a bare `autocrop` run
//! processes `*.jpg`/`*.png` under the current directory into `output/`:
//!
//! ```text
//! input            = "."
//! output           = "output"
//! extensions       = ["jpg", "png"]
//! group            = false
//! match_path       = false
//! formatting       = "formatting.json"    # optional, built-in table if absent
//! manifest_name    = "coords.txt"
//! border           = 0 x 0
//! group_pattern    = "(.+)(hover|idle)"
//! max_processes    = all cores
//! ```
//!
//! [`CropConfig::validate`] runs before any filesystem work so that bad
//! options fail fast.

use crate::formatting::TemplateError;
use crate::imaging::Border;
use regex::Regex;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid regex '{pattern}': {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("Grouping regex '{0}' has no capture group to use as the group key")]
    MissingCaptureGroup(String),
    #[error("JSON parse error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("TOML parse error in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid formatting table {path}: {message}")]
    InvalidTable { path: PathBuf, message: String },
    #[error("Invalid template for pattern '{pattern}': {source}")]
    Template {
        pattern: String,
        #[source]
        source: TemplateError,
    },
    #[error("Config validation error: {0}")]
    Validation(String),
}

pub const DEFAULT_GROUP_PATTERN: &str = "(.+)(hover|idle)";
pub const DEFAULT_MANIFEST_NAME: &str = "coords.txt";
pub const DEFAULT_FORMATTING_FILE: &str = "formatting.json";
pub const DEFAULT_OUTPUT: &str = "output";

/// Options for one cropping run.
#[derive(Debug, Clone)]
pub struct CropConfig {
    /// Root directory scanned for images.
    pub input: PathBuf,
    /// Root of the mirrored output tree.
    pub output: PathBuf,
    /// Accepted extension tokens without the leading dot.
    pub extensions: Vec<String>,
    /// Crop groups with a shared box instead of each image on its own.
    pub group: bool,
    /// Match formatting rules against the full output path instead of the file name.
    pub match_path: bool,
    /// Optional formatting table (JSON or TOML).
    pub formatting: Option<PathBuf>,
    /// File name of the per-directory coordinate manifest.
    pub manifest_name: String,
    pub border: Border,
    /// Regex whose first capture group is the group key.
    pub group_pattern: String,
    /// Maximum number of parallel workers. `None` means all cores.
    pub max_processes: Option<usize>,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("."),
            output: PathBuf::from(DEFAULT_OUTPUT),
            extensions: vec!["jpg".to_string(), "png".to_string()],
            group: false,
            match_path: false,
            formatting: Some(PathBuf::from(DEFAULT_FORMATTING_FILE)),
            manifest_name: DEFAULT_MANIFEST_NAME.to_string(),
            border: Border::default(),
            group_pattern: DEFAULT_GROUP_PATTERN.to_string(),
            max_processes: None,
        }
    }
}

impl CropConfig {
    /// Validate option values and the grouping regex.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "at least one extension is required".into(),
            ));
        }
        if self.extensions.iter().any(|e| e.is_empty()) {
            return Err(ConfigError::Validation(
                "extensions must not be empty strings".into(),
            ));
        }
        if self.manifest_name.is_empty() || self.manifest_name.contains(['/', '\\']) {
            return Err(ConfigError::Validation(
                "manifest name must be a plain file name".into(),
            ));
        }
        if self.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "max_processes must be at least 1".into(),
            ));
        }
        compile_group_pattern(&self.group_pattern)?;
        Ok(())
    }

    /// Name of the output folder; directories whose path contains it are skipped.
    pub fn output_folder_name(&self) -> String {
        self.output
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| DEFAULT_OUTPUT.to_string())
    }
}

/// Strip leading dots so `.png` and `png` are the same token.
pub fn normalize_extensions<S: AsRef<str>>(extensions: &[S]) -> Vec<String> {
    extensions
        .iter()
        .map(|e| e.as_ref().trim_start_matches('.').to_string())
        .collect()
}

/// Resolve the input root: a file path means "the directory containing it".
pub fn resolve_input_dir(path: &Path) -> PathBuf {
    if path.is_file() {
        path.parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    } else {
        path.to_path_buf()
    }
}

/// Compile the grouping regex anchored at the start of the file name.
///
/// The key is capture group 1, so patterns without one are rejected.
pub fn compile_group_pattern(pattern: &str) -> Result<Regex, ConfigError> {
    let anchored = format!("^(?:{pattern})");
    let regex = Regex::new(&anchored).map_err(|source| ConfigError::Regex {
        pattern: pattern.to_string(),
        source,
    })?;
    if regex.captures_len() < 2 {
        return Err(ConfigError::MissingCaptureGroup(pattern.to_string()));
    }
    Ok(regex)
}

/// Resolve the effective thread count.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(max_processes: Option<usize>) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_passes_validation() {
        CropConfig::default().validate().unwrap();
    }

    #[test]
    fn default_values() {
        let config = CropConfig::default();
        assert_eq!(config.extensions, vec!["jpg", "png"]);
        assert_eq!(config.manifest_name, "coords.txt");
        assert_eq!(config.group_pattern, "(.+)(hover|idle)");
        assert_eq!(config.border, Border::new(0, 0));
        assert!(!config.group);
    }

    #[test]
    fn validate_rejects_empty_extensions() {
        let config = CropConfig {
            extensions: vec![],
            ..CropConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_manifest_path() {
        let config = CropConfig {
            manifest_name: "sub/coords.txt".into(),
            ..CropConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_zero_workers() {
        let config = CropConfig {
            max_processes: Some(0),
            ..CropConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_bad_regex() {
        let config = CropConfig {
            group_pattern: "(unclosed".into(),
            ..CropConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Regex { .. })));
    }

    #[test]
    fn group_pattern_requires_capture_group() {
        assert!(matches!(
            compile_group_pattern(".*_hover"),
            Err(ConfigError::MissingCaptureGroup(_))
        ));
    }

    #[test]
    fn group_pattern_is_anchored_at_start() {
        let regex = compile_group_pattern("(bg)_").unwrap();
        assert!(regex.captures("bg_sky.png").is_some());
        assert!(regex.captures("old_bg_sky.png").is_none());
    }

    #[test]
    fn group_pattern_alternation_stays_anchored() {
        let regex = compile_group_pattern("(a)x|(b)y").unwrap();
        assert!(regex.captures("zby").is_none());
        assert!(regex.captures("by").is_some());
    }

    #[test]
    fn normalize_extensions_strips_dots() {
        assert_eq!(normalize_extensions(&[".jpg", "png", "..webp"]), vec!["jpg", "png", "webp"]);
    }

    #[test]
    fn output_folder_name_from_path() {
        let config = CropConfig {
            output: PathBuf::from("/tmp/build/cropped"),
            ..CropConfig::default()
        };
        assert_eq!(config.output_folder_name(), "cropped");
    }

    #[test]
    fn resolve_input_dir_uses_parent_of_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let file = tmp.path().join("sprite.png");
        std::fs::write(&file, "").unwrap();

        assert_eq!(resolve_input_dir(&file), tmp.path());
        assert_eq!(resolve_input_dir(tmp.path()), tmp.path());
    }

    #[test]
    fn effective_threads_auto() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(None), cores);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(Some(99999)), cores);
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        assert_eq!(effective_threads(Some(1)), 1);
    }
}
