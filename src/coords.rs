//! Coordinate manifests: one text file per output directory.
//!
//! Every cropped image adds one rendered template line to the manifest in
//! its output directory (`coords.txt` by default). The line records where
//! the visible content sat in the *source* image, so a consumer can place
//! the trimmed sprite back at its original position.
//!
//! # Single writer per manifest
//!
//! [`ManifestWriter`] owns one file handle per manifest path, each behind
//! its own mutex. Two callers can never interleave bytes within one
//! manifest, while different manifests can be written concurrently.
//!
//! A manifest is truncated the first time this writer touches it and
//! appended to afterwards, so re-running over the same output directory
//! produces the same file instead of growing it. Manifests of directories
//! where nothing was cropped are removed up front with
//! [`ManifestWriter::reset`], so no line from an earlier run survives.

use crate::formatting::{FormattingTable, Placeholders, TemplateError, match_candidate};
use crate::types::CropResult;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

/// Run `op`, retrying once if it fails.
///
/// File writes can fail transiently (permissions being fixed up, a full
/// disk being cleaned); a second failure is returned to the caller.
pub fn retry_once<T, E: std::fmt::Display>(
    mut op: impl FnMut() -> Result<T, E>,
) -> Result<T, E> {
    match op() {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!("Write failed ({e}), retrying once");
            op()
        }
    }
}

/// Write all of `bytes`, retrying a failed write once.
///
/// The retry resumes after the bytes already accepted, so a line is never
/// written twice.
pub fn write_resuming<W: Write>(out: &mut W, bytes: &[u8]) -> io::Result<()> {
    let mut written = 0;
    let mut retried = false;

    while written < bytes.len() {
        match out.write(&bytes[written..]) {
            Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) if !retried => {
                warn!("Write failed ({e}), retrying once");
                retried = true;
            }
            Err(e) => return Err(e),
        }
    }
    out.flush()
}

/// Serialising appender for per-directory manifests.
#[derive(Default)]
pub struct ManifestWriter {
    files: Mutex<HashMap<PathBuf, Arc<Mutex<File>>>>,
}

impl ManifestWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `line` to the manifest at `manifest`.
    pub fn append(&self, manifest: &Path, line: &str) -> io::Result<()> {
        let handle = self.handle(manifest)?;
        let mut file = handle.lock().unwrap_or_else(PoisonError::into_inner);
        write_resuming(&mut *file, line.as_bytes())
    }

    /// Remove a manifest left by an earlier run, unless this writer owns it.
    ///
    /// A missing file is fine.
    pub fn reset(&self, manifest: &Path) -> io::Result<()> {
        let files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        if files.contains_key(manifest) {
            return Ok(());
        }
        match fs::remove_file(manifest) {
            Ok(()) => {
                debug!("Removed stale manifest {}", manifest.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Manifests written so far, sorted.
    pub fn written(&self) -> Vec<PathBuf> {
        let files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        let mut paths: Vec<PathBuf> = files.keys().cloned().collect();
        paths.sort();
        paths
    }

    fn handle(&self, manifest: &Path) -> io::Result<Arc<Mutex<File>>> {
        let mut files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = files.get(manifest) {
            return Ok(Arc::clone(handle));
        }

        if let Some(parent) = manifest.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = retry_once(|| {
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(manifest)
        })?;
        debug!("Opened manifest {}", manifest.display());

        let handle = Arc::new(Mutex::new(file));
        files.insert(manifest.to_path_buf(), Arc::clone(&handle));
        Ok(handle)
    }
}

/// Render the manifest line for one crop result.
///
/// Coordinates are the image's own content box in source coordinates;
/// `{path}` is the absolute output path.
pub fn render_line(
    table: &FormattingTable,
    result: &CropResult,
    match_path: bool,
) -> Result<String, TemplateError> {
    let candidate = match_candidate(&result.output, match_path);
    let template = table.resolve(&candidate);

    let absolute = std::path::absolute(&result.output).unwrap_or_else(|_| result.output.clone());
    let name = result
        .output
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    template.render(&Placeholders {
        name,
        path: absolute.to_string_lossy().to_string(),
        x: result.content.left,
        y: result.content.top,
        bx: result.content.right,
        by: result.content.bottom,
    })
}
