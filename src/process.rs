//! Cropping pipeline.
//!
//! Takes the [`Catalog`] from the scan stage and turns every image into a
//! trimmed copy plus one manifest line.
//!
//! ## Units of work
//!
//! - **Single mode**: every image is its own unit and gets its own box.
//! - **Group mode**: every catalog group is a unit. All members are decoded
//!   and measured first, then every member is cropped with the *union* of
//!   their boxes, so animation frames keep the same size and alignment.
//!
//! ```text
//! go_hover.png  content (2,3)-(12,13)  ┐ union (2,3)-(15,16)
//! go_idle.png   content (5,6)-(15,16)  ┘ → both saved as 13x13
//! ```
//!
//! ## Output structure
//!
//! ```text
//! output/
//! ├── coords.txt          # one line per image in this directory
//! └── menu/
//!     ├── coords.txt
//!     ├── go_hover.png    # cropped, transparent border applied
//!     └── go_idle.png
//! ```
//!
//! ## Parallel processing
//!
//! Units run in parallel using [rayon](https://docs.rs/rayon). Results are
//! collected in catalog order and manifest lines are written afterwards
//! through one [`ManifestWriter`], so manifests are identical across runs.
//!
//! ## Failures
//!
//! A unit that cannot be decoded, saved, or has no visible pixel is
//! skipped and listed in the [`ProcessSummary`]; the other units carry on.
//! A group is cropped in full before its first save, and if a later save
//! fails the members already written are removed again, so the output tree
//! only holds images that have a manifest line.
//! A template error aborts the run because every later line would fail
//! the same way.

use crate::catalog::Catalog;
use crate::config::CropConfig;
use crate::coords::{ManifestWriter, render_line, retry_once};
use crate::formatting::{FormattingTable, TemplateError};
use crate::imaging::{
    BackendError, CropSpec, EmptyGroupError, ImageBackend, RustBackend, crop, union_bounding_box,
};
use crate::types::{CropResult, ImageRef};
use image::DynamicImage;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
    #[error("{source}")]
    EmptyGroup {
        unit: String,
        #[source]
        source: EmptyGroupError,
    },
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
}

/// Progress events emitted while units run.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    Cropped {
        source: PathBuf,
        output: PathBuf,
        size: (u32, u32),
    },
    Skipped {
        unit: String,
        reason: String,
    },
}

/// A unit that produced no output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub unit: String,
    pub reason: String,
}

/// What a run did.
#[derive(Debug, Default)]
pub struct ProcessSummary {
    /// Every cropped image in catalog order.
    pub processed: Vec<CropResult>,
    pub skipped: Vec<Skipped>,
    /// Manifests written, sorted.
    pub manifests: Vec<PathBuf>,
}

/// One image whose single-crop and group-crop areas differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeDifference {
    pub output: PathBuf,
    pub single_area: u64,
    pub group_area: u64,
}

/// Result of [`difference`].
#[derive(Debug, Default)]
pub struct DifferenceReport {
    pub differences: Vec<SizeDifference>,
    pub skipped: Vec<Skipped>,
}

/// Images cropped with one shared box.
struct Unit<'a> {
    label: String,
    members: &'a [ImageRef],
}

/// Where a source image is written: `<output>/<relative dir>/<file name>`.
pub fn output_path(output_root: &Path, image: &ImageRef) -> PathBuf {
    output_root.join(&image.dir).join(&image.file_name)
}

/// Manifest that records `output`.
pub fn manifest_path(output: &Path, manifest_name: &str) -> PathBuf {
    output
        .parent()
        .map(|p| p.join(manifest_name))
        .unwrap_or_else(|| PathBuf::from(manifest_name))
}

fn unit_label(members: &[ImageRef]) -> String {
    match members {
        [single] => single.dir.join(&single.file_name).display().to_string(),
        [first, ..] => format!(
            "group {} ({} images)",
            first.dir.join(&first.file_name).display(),
            members.len()
        ),
        [] => "empty group".to_string(),
    }
}

fn build_units(catalog: &Catalog, group: bool) -> Vec<Unit<'_>> {
    catalog
        .dirs
        .iter()
        .flat_map(|dir| {
            let units: Vec<Unit<'_>> = if group {
                dir.groups
                    .iter()
                    .map(|g| Unit {
                        label: unit_label(&g.members),
                        members: &g.members,
                    })
                    .collect()
            } else {
                dir.singles
                    .iter()
                    .map(|img| Unit {
                        label: unit_label(std::slice::from_ref(img)),
                        members: std::slice::from_ref(img),
                    })
                    .collect()
            };
            units
        })
        .collect()
}

pub fn process(
    catalog: &Catalog,
    table: &FormattingTable,
    config: &CropConfig,
    events: Option<Sender<ProcessEvent>>,
) -> Result<ProcessSummary, ProcessError> {
    let backend = RustBackend::new();
    process_with_backend(&backend, catalog, table, config, events)
}

/// Process the catalog using a specific backend (allows testing with mock).
pub fn process_with_backend(
    backend: &impl ImageBackend,
    catalog: &Catalog,
    table: &FormattingTable,
    config: &CropConfig,
    events: Option<Sender<ProcessEvent>>,
) -> Result<ProcessSummary, ProcessError> {
    let units = build_units(catalog, config.group);
    info!(
        "Cropping {} images in {} units ({} mode)",
        catalog.image_count(),
        units.len(),
        if config.group { "group" } else { "single" }
    );

    // Every directory starts the run without a manifest; only this run's
    // lines end up in it.
    let writer = ManifestWriter::new();
    for dir in &catalog.dirs {
        let manifest = config.output.join(&dir.relative).join(&config.manifest_name);
        writer.reset(&manifest)?;
    }

    let outcomes: Vec<(String, Result<Vec<CropResult>, ProcessError>)> = units
        .par_iter()
        .map_with(events, |tx, unit| {
            let outcome = crop_unit(backend, unit, config);
            if let Some(tx) = tx {
                match &outcome {
                    Ok(results) => {
                        for r in results {
                            tx.send(ProcessEvent::Cropped {
                                source: r.source.path.clone(),
                                output: r.output.clone(),
                                size: r.size,
                            })
                            .ok();
                        }
                    }
                    Err(e) => {
                        tx.send(ProcessEvent::Skipped {
                            unit: unit.label.clone(),
                            reason: e.to_string(),
                        })
                        .ok();
                    }
                }
            }
            (unit.label.clone(), outcome)
        })
        .collect();

    let mut summary = ProcessSummary::default();

    for (label, outcome) in outcomes {
        let results = match outcome {
            Ok(results) => results,
            Err(e) => {
                warn!("{label}: {e}");
                summary.skipped.push(Skipped {
                    unit: label,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        for result in results {
            let line = render_line(table, &result, config.match_path)?;
            let manifest = manifest_path(&result.output, &config.manifest_name);
            if let Err(e) = writer.append(&manifest, &line) {
                warn!("Could not write {}: {e}", manifest.display());
                summary.skipped.push(Skipped {
                    unit: result.source.file_name.clone(),
                    reason: format!("manifest write failed: {e}"),
                });
                continue;
            }
            summary.processed.push(result);
        }
    }

    summary.manifests = writer.written();
    Ok(summary)
}

/// Decode every member and measure it before any crop starts.
fn load_members(
    backend: &impl ImageBackend,
    members: &[ImageRef],
) -> Result<Vec<DynamicImage>, BackendError> {
    members.iter().map(|m| backend.load(&m.path)).collect()
}

fn crop_unit(
    backend: &impl ImageBackend,
    unit: &Unit<'_>,
    config: &CropConfig,
) -> Result<Vec<CropResult>, ProcessError> {
    let images = load_members(backend, unit.members)?;
    let bounds = union_bounding_box(&images).map_err(|source| ProcessError::EmptyGroup {
        unit: unit.label.clone(),
        source,
    })?;
    let spec = CropSpec::new(bounds.union, config.border);

    // Crop every member before the first save so a failure cannot leave
    // a half-written group behind.
    let canvases: Vec<_> = images.iter().map(|image| crop(image, &spec)).collect();
    drop(images);

    let mut results: Vec<CropResult> = Vec::with_capacity(unit.members.len());
    for ((member, canvas), content) in unit.members.iter().zip(canvases).zip(bounds.members) {
        let output = output_path(&config.output, member);
        if let Err(e) = retry_once(|| backend.save(&canvas, &output)) {
            discard_outputs(backend, &results);
            return Err(e.into());
        }

        results.push(CropResult {
            source: member.clone(),
            output,
            // A transparent frame inside a group has no box of its own
            content: content.unwrap_or(bounds.union),
            applied: spec,
            size: canvas.dimensions(),
        });
    }

    Ok(results)
}

/// Remove outputs already saved for a unit that failed.
fn discard_outputs(backend: &impl ImageBackend, results: &[CropResult]) {
    for result in results {
        if let Err(e) = backend.remove(&result.output) {
            warn!(
                "Could not remove partial output {}: {e}",
                result.output.display()
            );
        }
    }
}

/// Compare single crops with group crops without writing anything.
///
/// Lists every image whose own box has a different area from its group's
/// shared box, i.e. the images that grouping makes larger.
pub fn difference(catalog: &Catalog, config: &CropConfig) -> DifferenceReport {
    difference_with_backend(&RustBackend::new(), catalog, config)
}

pub fn difference_with_backend(
    backend: &impl ImageBackend,
    catalog: &Catalog,
    config: &CropConfig,
) -> DifferenceReport {
    let units = build_units(catalog, true);

    let outcomes: Vec<(String, Result<Vec<SizeDifference>, ProcessError>)> = units
        .par_iter()
        .map(|unit| {
            let outcome = load_members(backend, unit.members)
                .map_err(ProcessError::from)
                .and_then(|images| {
                    union_bounding_box(&images).map_err(|source| ProcessError::EmptyGroup {
                        unit: unit.label.clone(),
                        source,
                    })
                })
                .map(|bounds| {
                    unit.members
                        .iter()
                        .zip(&bounds.members)
                        .filter_map(|(member, own)| {
                            let own = (*own)?;
                            (own.area() != bounds.union.area()).then(|| SizeDifference {
                                output: output_path(&config.output, member),
                                single_area: own.area(),
                                group_area: bounds.union.area(),
                            })
                        })
                        .collect()
                });
            (unit.label.clone(), outcome)
        })
        .collect();

    let mut report = DifferenceReport::default();
    for (label, outcome) in outcomes {
        match outcome {
            Ok(diffs) => report.differences.extend(diffs),
            Err(e) => {
                warn!("{label}: {e}");
                report.skipped.push(Skipped {
                    unit: label,
                    reason: e.to_string(),
                });
            }
        }
    }
    report
}
