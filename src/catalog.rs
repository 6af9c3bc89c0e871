//! Filesystem walk and image classification.
//!
//! First stage of a run. Walks the input tree and, for every directory that
//! holds matching images, records them twice:
//!
//! - **singles**: every image, in directory-listing order
//! - **groups**: the same images split by a key taken from the grouping regex
//!
//! ```text
//! sprites/
//! ├── menu/
//! │   ├── bg_menu.png          # no key         → its own group
//! │   ├── load_hover.png       # key "load_"    ┐
//! │   ├── load_idle.png        # key "load_"    ┘ one group
//! │   ├── quit_hover.png       # key "quit_"    ┐
//! │   └── quit_idle.png        # key "quit_"    ┘ one group
//! └── output/                  # skipped: path contains the output folder name
//! ```
//!
//! ## Consecutive grouping
//!
//! Groups are formed from *runs* of equal keys in listing order. Files are
//! never re-sorted by key, so two clusters with the same key separated by a
//! different file stay two groups. Files whose name does not match the
//! regex are never grouped with anything.
//!
//! ## Errors
//!
//! A missing or unreadable root is fatal. Unreadable subdirectories are
//! logged and skipped so one bad folder does not stop the walk.

use crate::config::{self, ConfigError, CropConfig};
use crate::types::{Group, GroupKey, ImageRef};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Input directory not found: {0}")]
    RootNotFound(PathBuf),
}

/// Options controlling which files are catalogued and how they are grouped.
#[derive(Debug, Clone)]
pub struct CatalogOptions {
    /// Extension tokens without the leading dot.
    pub extensions: Vec<String>,
    /// Anchored grouping regex; capture group 1 is the key.
    pub group_regex: Regex,
    /// Directories whose relative path contains this are skipped.
    pub skip_name: String,
    /// Output root, skipped if it lies inside the input tree.
    pub output_root: Option<PathBuf>,
}

impl CatalogOptions {
    /// Build options from a run config, compiling the grouping regex.
    pub fn from_config(config: &CropConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            extensions: config::normalize_extensions(&config.extensions),
            group_regex: config::compile_group_pattern(&config.group_pattern)?,
            skip_name: config.output_folder_name(),
            output_root: Some(config.output.clone()),
        })
    }
}

/// Images of one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogDir {
    /// Directory relative to the input root.
    pub relative: PathBuf,
    pub singles: Vec<ImageRef>,
    pub groups: Vec<Group>,
}

/// Result of the walk: directories in walk order, each with its images.
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Canonical input root.
    pub root: PathBuf,
    pub dirs: Vec<CatalogDir>,
}

impl Catalog {
    pub fn image_count(&self) -> usize {
        self.dirs.iter().map(|d| d.singles.len()).sum()
    }

    pub fn group_count(&self) -> usize {
        self.dirs.iter().map(|d| d.groups.len()).sum()
    }
}

pub fn scan(root: &Path, options: &CatalogOptions) -> Result<Catalog, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::RootNotFound(root.to_path_buf()));
    }
    let root = fs::canonicalize(root)?;
    let output_root = options
        .output_root
        .as_ref()
        .and_then(|p| fs::canonicalize(p).ok());

    let walker = WalkDir::new(&root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if !entry.file_type().is_dir() {
                return true;
            }
            !is_skipped_dir(entry.path(), &root, &options.skip_name, output_root.as_deref())
        });

    let mut dirs = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Skipping unreadable entry: {e}");
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }

        let files = match collect_files(entry.path()) {
            Ok(files) => files,
            Err(e) => {
                warn!("Skipping unreadable directory {}: {e}", entry.path().display());
                continue;
            }
        };

        let relative = entry
            .path()
            .strip_prefix(&root)
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let singles: Vec<ImageRef> = files
            .into_iter()
            .filter_map(|path| {
                let file_name = path.file_name()?.to_string_lossy().to_string();
                matches_extension(&file_name, &options.extensions).then(|| ImageRef {
                    path,
                    dir: relative.clone(),
                    file_name,
                })
            })
            .collect();

        if singles.is_empty() {
            continue;
        }

        let groups = group_consecutive(&singles, &options.group_regex);
        debug!(
            "{}: {} images in {} groups",
            relative.display(),
            singles.len(),
            groups.len()
        );
        dirs.push(CatalogDir {
            relative,
            singles,
            groups,
        });
    }

    Ok(Catalog { root, dirs })
}

fn is_skipped_dir(path: &Path, root: &Path, skip_name: &str, output_root: Option<&Path>) -> bool {
    if output_root.is_some_and(|out| out == path) {
        return true;
    }
    let relative = path.strip_prefix(root).unwrap_or(path);
    !skip_name.is_empty() && relative.to_string_lossy().contains(skip_name)
}

/// Regular files of one directory, sorted by name.
fn collect_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|e| e.path())
        .collect();

    files.sort();
    Ok(files)
}

/// Case-sensitive substring test for `.{ext}` in the file name.
pub fn matches_extension(file_name: &str, extensions: &[String]) -> bool {
    extensions
        .iter()
        .any(|ext| file_name.contains(&format!(".{ext}")))
}

/// Key of a file name: capture group 1 of a prefix match, if any.
pub fn group_key(regex: &Regex, file_name: &str) -> GroupKey {
    regex
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Split images into runs of equal keys, keeping listing order.
///
/// Unmatched files (`None` key) always start a group of their own.
pub fn group_consecutive(images: &[ImageRef], regex: &Regex) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();

    for image in images {
        let key = group_key(regex, &image.file_name);
        let extends_last = key.is_some() && groups.last().is_some_and(|g| g.key == key);

        if extends_last && let Some(last) = groups.last_mut() {
            last.members.push(image.clone());
        } else {
            groups.push(Group {
                key,
                members: vec![image.clone()],
            });
        }
    }

    groups
}
