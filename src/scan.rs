//! Screenshot source discovery.
//!
//! Stage 1 of the screenshot pipeline. Resolves the configured sources into
//! an ordered [`SourceManifest`] with the output stem of every source already
//! decided, so the processing stage only renders.
//!
//! ## Discovery
//!
//! ```text
//! screenshots/                 # screenshots.source_dir
//! ├── 02_today.png             # sources, sorted by file name
//! ├── 04_detail.png
//! ├── 05_chat.jpg
//! ├── notes.txt                # ignored: no decoder for .txt
//! ├── .DS_Store                # ignored: hidden
//! └── raw/                     # ignored: not recursive
//! ```
//!
//! - **Explicit list** (`screenshots.sources` non-empty): exactly those files,
//!   in that order. Entries are resolved against `source_dir`. An entry that
//!   does not exist stays in the manifest (marked absent) so it keeps its
//!   position and is reported per target later.
//! - **Directory listing** (no explicit list): every visible regular file in
//!   `source_dir` whose extension has a compiled-in decoder.
//!
//! ## Validation
//!
//! - The source directory must exist when it is listed
//! - At least one source must be found
//! - Two sources may not resolve to the same output stem

use crate::config::{self, ScreenshotsConfig};
use crate::imaging::is_supported_input;
use crate::naming::renumbered_stem;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Source directory not found: {0}")]
    SourceDirMissing(PathBuf),
    #[error("No screenshot sources found in {0}")]
    NoSources(PathBuf),
    #[error("Sources {first} and {second} both produce output stem {stem:?}")]
    DuplicateStem {
        stem: String,
        first: PathBuf,
        second: PathBuf,
    },
}

/// One screenshot source with its decided output stem.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    pub path: PathBuf,
    /// Stem used for every rendered output of this source.
    pub stem: String,
    /// 1-based position in source order.
    pub position: usize,
    /// Whether the file existed at scan time.
    pub present: bool,
}

/// Ordered output of the scan stage.
#[derive(Debug, Clone, Default)]
pub struct SourceManifest {
    pub sources: Vec<SourceImage>,
}

impl SourceManifest {
    /// Explicitly listed sources that do not exist.
    pub fn missing(&self) -> impl Iterator<Item = &SourceImage> {
        self.sources.iter().filter(|s| !s.present)
    }

    pub fn present_count(&self) -> usize {
        self.sources.iter().filter(|s| s.present).count()
    }
}

/// Resolve the screenshot sources for a project rooted at `root`.
pub fn scan_sources(config: &ScreenshotsConfig, root: &Path) -> Result<SourceManifest, ScanError> {
    let source_dir = config::resolve_path(root, &config.source_dir);

    let entries: Vec<(PathBuf, Option<String>)> = if config.sources.is_empty() {
        list_source_dir(&source_dir)?
            .into_iter()
            .map(|path| (path, None))
            .collect()
    } else {
        config
            .sources
            .iter()
            .map(|entry| (source_dir.join(&entry.path), entry.rename.clone()))
            .collect()
    };

    if entries.is_empty() {
        return Err(ScanError::NoSources(source_dir));
    }

    let mut sources = Vec::with_capacity(entries.len());
    let mut seen: HashMap<String, PathBuf> = HashMap::new();
    for (index, (path, rename)) in entries.into_iter().enumerate() {
        let position = index + 1;
        let stem = output_stem(&path, rename.as_deref(), config.renumber, position);

        if let Some(first) = seen.get(&stem) {
            return Err(ScanError::DuplicateStem {
                stem,
                first: first.clone(),
                second: path,
            });
        }
        seen.insert(stem.clone(), path.clone());

        let present = path.is_file();
        if !present {
            debug!(path = %path.display(), "listed source does not exist");
        }
        sources.push(SourceImage {
            path,
            stem,
            position,
            present,
        });
    }

    Ok(SourceManifest { sources })
}

/// An explicit rename is taken verbatim; renumbering applies to file stems only.
fn output_stem(path: &Path, rename: Option<&str>, renumber: bool, position: usize) -> String {
    if let Some(rename) = rename {
        return rename.to_string();
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    if renumber {
        renumbered_stem(&stem, position)
    } else {
        stem
    }
}

fn list_source_dir(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !dir.is_dir() {
        return Err(ScanError::SourceDirMissing(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if entry.file_type().is_file() && !hidden && is_supported_input(entry.path()) {
            files.push(entry.into_path());
        } else {
            debug!(path = %entry.path().display(), "skipping non-source entry");
        }
    }
    Ok(files)
}
