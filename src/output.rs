//! CLI output formatting for every stage of a run.
//!
//! # Output Format
//!
//! ## Catalog
//!
//! Directories in walk order, each group as a header with its members
//! indented below. Ungrouped images are listed bare.
//!
//! ```text
//! menu/ (4 images, 3 groups)
//!     bg_menu.png
//!     load_ (2 images)
//!         load_hover.png
//!         load_idle.png
//! ```
//!
//! ## Process
//!
//! One line per event, printed as units finish:
//!
//! ```text
//! menu/load_hover.png → 64x32
//! skipped menu/ghost.png: no visible content
//! ```
//!
//! ## Summary
//!
//! ```text
//! Cropped 4 images, skipped 1
//!     output/menu/coords.txt
//! ```
//!
//! ## Difference
//!
//! ```text
//! output/menu/load_idle.png: 1200 px alone, 2048 px in group
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::catalog::Catalog;
use crate::process::{DifferenceReport, ProcessEvent, ProcessSummary};
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Directory label with a trailing slash; the input root shows as `./`.
fn dir_label(relative: &Path) -> String {
    if relative.as_os_str().is_empty() {
        "./".to_string()
    } else {
        format!("{}/", relative.display())
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Format the scanned catalog.
pub fn format_catalog(catalog: &Catalog) -> Vec<String> {
    let mut lines = Vec::new();

    for dir in &catalog.dirs {
        lines.push(format!(
            "{} ({}, {})",
            dir_label(&dir.relative),
            plural(dir.singles.len(), "image"),
            plural(dir.groups.len(), "group")
        ));

        for group in &dir.groups {
            match (&group.key, group.members.as_slice()) {
                (None, members) | (Some(_), members @ [_]) => {
                    for member in members {
                        lines.push(format!("{}{}", indent(1), member.file_name));
                    }
                }
                (Some(key), members) => {
                    lines.push(format!(
                        "{}{} ({})",
                        indent(1),
                        key,
                        plural(members.len(), "image")
                    ));
                    for member in members {
                        lines.push(format!("{}{}", indent(2), member.file_name));
                    }
                }
            }
        }
    }

    if lines.is_empty() {
        lines.push("No images found".to_string());
    }
    lines
}

pub fn print_catalog(catalog: &Catalog) {
    for line in format_catalog(catalog) {
        println!("{}", line);
    }
}

// ============================================================================
// Process
// ============================================================================

/// Format a single process progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::Cropped {
            source,
            output: _,
            size: (width, height),
        } => {
            let name = source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| source.display().to_string());
            let dir = source
                .parent()
                .and_then(|p| p.file_name())
                .map(|d| format!("{}/", d.to_string_lossy()))
                .unwrap_or_default();
            vec![format!("{dir}{name} \u{2192} {width}x{height}")]
        }
        ProcessEvent::Skipped { unit, reason } => {
            vec![format!("skipped {unit}: {reason}")]
        }
    }
}

/// Format the end-of-run summary: counts, then every manifest written.
pub fn format_summary(summary: &ProcessSummary) -> Vec<String> {
    let mut lines = Vec::new();

    let mut header = format!("Cropped {}", plural(summary.processed.len(), "image"));
    if !summary.skipped.is_empty() {
        header.push_str(&format!(", skipped {}", summary.skipped.len()));
    }
    lines.push(header);

    for manifest in &summary.manifests {
        lines.push(format!("{}{}", indent(1), manifest.display()));
    }
    lines
}

pub fn print_summary(summary: &ProcessSummary) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Difference
// ============================================================================

/// Format a difference report: one line per image grouping enlarges.
pub fn format_difference(report: &DifferenceReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .differences
        .iter()
        .map(|d| {
            format!(
                "{}: {} px alone, {} px in group",
                d.output.display(),
                d.single_area,
                d.group_area
            )
        })
        .collect();

    if lines.is_empty() {
        lines.push("Single and group crops have the same size".to_string());
    }
    for skipped in &report.skipped {
        lines.push(format!("skipped {}: {}", skipped.unit, skipped.reason));
    }
    lines
}

pub fn print_difference(report: &DifferenceReport) {
    for line in format_difference(report) {
        println!("{}", line);
    }
}
