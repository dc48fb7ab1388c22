//! Project configuration module.
//!
//! Handles loading, validating, and merging `storefit.toml`. Stock defaults
//! describe the canvases and icon sizes the App Store and Play Store ask for;
//! a project file overrides only what it needs.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [screenshots]
//! source_dir = "screenshots"        # Raw captures
//! output_dir = "store/screenshots"  # Rendered canvases land in <output_dir>/<target.dir>/
//! sources = []                      # Explicit list; empty = every image in source_dir
//! renumber = false                  # Rewrite NN_ prefixes to 01_, 02_, ... in source order
//! format = "png"                    # png | jpeg
//! quality = 90                      # JPEG quality (1-100)
//!
//! [[screenshots.targets]]
//! name = "APP_IPHONE_67"
//! width = 1290
//! height = 2796
//! suffix = "_67"
//! dir = "appstore"
//!
//! [icons]
//! source = "logo.png"
//! output_dir = "store/icons"
//! quality = 90                      # JPEG quality for .jpg icon paths
//!
//! [[icons.outputs]]
//! size = 1024
//! path = "appstore_icon_1024.png"
//!
//! [listing]
//! source = "listing.toml"
//! output_dir = "store/playstore"
//!
//! [processing]
//! max_processes = 4                 # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! ## Merging
//!
//! The user file is merged over the stock defaults with [`merge_toml`]:
//! tables merge key by key, while arrays replace wholesale. Declaring any
//! `[[screenshots.targets]]` therefore replaces the whole stock target table
//! instead of appending to it.
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::OutputFormat;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "storefit.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Project configuration loaded from `storefit.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Screenshot sources, target canvases, output layout.
    pub screenshots: ScreenshotsConfig,
    /// Logo source and icon size table.
    pub icons: IconsConfig,
    /// Store listing text source and export directory.
    pub listing: ListingConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl StoreConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.screenshots.validate()?;
        self.icons.validate()?;
        Ok(())
    }
}

/// A single file-name component: non-empty, no separators, no `..`.
fn is_plain_name(value: &str) -> bool {
    !value.trim().is_empty() && !value.contains(['/', '\\']) && !value.contains("..")
}

/// A relative path that stays under the directory it is joined to.
fn is_contained_path(value: &str) -> bool {
    let path = Path::new(value);
    !value.contains('\\')
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Encoder for rendered screenshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenshotFormat {
    #[default]
    Png,
    #[serde(alias = "jpg")]
    Jpeg,
}

impl From<ScreenshotFormat> for OutputFormat {
    fn from(format: ScreenshotFormat) -> Self {
        match format {
            ScreenshotFormat::Png => OutputFormat::Png,
            ScreenshotFormat::Jpeg => OutputFormat::Jpeg,
        }
    }
}

/// Screenshot generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScreenshotsConfig {
    /// Directory holding the raw captures.
    pub source_dir: String,
    /// Root directory for rendered canvases.
    pub output_dir: String,
    /// Explicit sources, in output order. Empty means every image in `source_dir`.
    pub sources: Vec<SourceEntry>,
    /// Rewrite `NN_` prefixes to the 1-based source position.
    pub renumber: bool,
    /// Output encoder.
    pub format: ScreenshotFormat,
    /// JPEG encoding quality (1 = worst, 100 = best). Ignored for PNG.
    pub quality: u32,
    /// Canvases every source is rendered onto.
    pub targets: Vec<ScreenshotTarget>,
}

impl Default for ScreenshotsConfig {
    fn default() -> Self {
        Self {
            source_dir: "screenshots".to_string(),
            output_dir: "store/screenshots".to_string(),
            sources: Vec::new(),
            renumber: false,
            format: ScreenshotFormat::Png,
            quality: 90,
            targets: default_screenshot_targets(),
        }
    }
}

impl ScreenshotsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.quality) {
            return Err(ConfigError::Validation(
                "screenshots.quality must be 1-100".into(),
            ));
        }
        if self.targets.is_empty() {
            return Err(ConfigError::Validation(
                "screenshots.targets must not be empty".into(),
            ));
        }

        let mut names = HashSet::new();
        let mut slots = HashSet::new();
        for (i, target) in self.targets.iter().enumerate() {
            if target.width == 0 || target.height == 0 {
                return Err(ConfigError::Validation(format!(
                    "screenshots.targets[{i}] ({}): width and height must be positive, got {}x{}",
                    target.name, target.width, target.height
                )));
            }
            // The suffix is part of the file name, the dir a subdirectory of output_dir
            if !target.suffix.is_empty() && !is_plain_name(&target.suffix) {
                return Err(ConfigError::Validation(format!(
                    "screenshots.targets[{i}] ({}): suffix {:?} must not contain path separators or ..",
                    target.name, target.suffix
                )));
            }
            if !is_contained_path(&target.dir) {
                return Err(ConfigError::Validation(format!(
                    "screenshots.targets[{i}] ({}): dir {:?} must be relative to screenshots.output_dir",
                    target.name, target.dir
                )));
            }
            if !names.insert(target.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "screenshots.targets: duplicate name {}",
                    target.name
                )));
            }
            // Two targets with the same dir and suffix would overwrite each other
            if !slots.insert((target.dir.as_str(), target.suffix.as_str())) {
                return Err(ConfigError::Validation(format!(
                    "screenshots.targets[{i}] ({}): dir {:?} + suffix {:?} already used by another target",
                    target.name, target.dir, target.suffix
                )));
            }
        }

        for (i, source) in self.sources.iter().enumerate() {
            if source.path.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "screenshots.sources[{i}]: path must not be empty"
                )));
            }
            if let Some(rename) = &source.rename
                && !is_plain_name(rename)
            {
                return Err(ConfigError::Validation(format!(
                    "screenshots.sources[{i}] ({}): rename {:?} must be a plain file stem",
                    source.path, rename
                )));
            }
        }
        Ok(())
    }
}

/// One explicitly listed screenshot source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceEntry {
    /// Path relative to `source_dir` (or absolute).
    pub path: String,
    /// Output stem to use instead of the source file stem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename: Option<String>,
}

/// A fixed store canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScreenshotTarget {
    /// Store display type, e.g. `APP_IPHONE_67`.
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Appended to the output stem, e.g. `_67` → `02_today_67.png`.
    #[serde(default)]
    pub suffix: String,
    /// Subdirectory of `output_dir`.
    #[serde(default)]
    pub dir: String,
}

fn default_screenshot_targets() -> Vec<ScreenshotTarget> {
    vec![
        ScreenshotTarget {
            name: "APP_IPHONE_67".to_string(),
            width: 1290,
            height: 2796,
            suffix: "_67".to_string(),
            dir: "appstore".to_string(),
        },
        ScreenshotTarget {
            name: "APP_IPHONE_65".to_string(),
            width: 1284,
            height: 2778,
            suffix: "_65".to_string(),
            dir: "appstore".to_string(),
        },
        ScreenshotTarget {
            name: "PLAY_PHONE".to_string(),
            width: 1080,
            height: 1920,
            suffix: String::new(),
            dir: "playstore".to_string(),
        },
    ]
}

/// Icon generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IconsConfig {
    /// Logo image; any aspect ratio, center square is used.
    pub source: String,
    /// Root directory for rendered icons.
    pub output_dir: String,
    /// JPEG encoding quality for `.jpg` icon paths. Ignored for PNG.
    pub quality: u32,
    /// Sizes to render, each to its own path under `output_dir`.
    pub outputs: Vec<IconOutput>,
}

impl Default for IconsConfig {
    fn default() -> Self {
        Self {
            source: "logo.png".to_string(),
            output_dir: "store/icons".to_string(),
            quality: 90,
            outputs: default_icon_outputs(),
        }
    }
}

impl IconsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.quality) {
            return Err(ConfigError::Validation("icons.quality must be 1-100".into()));
        }
        let mut paths = HashSet::new();
        for (i, output) in self.outputs.iter().enumerate() {
            if output.size == 0 {
                return Err(ConfigError::Validation(format!(
                    "icons.outputs[{i}] ({}): size must be positive",
                    output.path
                )));
            }
            if output.path.trim().is_empty() || !is_contained_path(&output.path) {
                return Err(ConfigError::Validation(format!(
                    "icons.outputs[{i}]: path must be relative to icons.output_dir, got {:?}",
                    output.path
                )));
            }
            if OutputFormat::from_path(Path::new(&output.path)).is_none() {
                return Err(ConfigError::Validation(format!(
                    "icons.outputs[{i}] ({}): extension must be png, jpg or jpeg",
                    output.path
                )));
            }
            if !paths.insert(output.path.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "icons.outputs: duplicate path {}",
                    output.path
                )));
            }
        }
        Ok(())
    }
}

/// One square icon render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IconOutput {
    pub size: u32,
    /// Relative to `icons.output_dir`; nested directories are created.
    pub path: String,
}

fn icon(size: u32, path: &str) -> IconOutput {
    IconOutput {
        size,
        path: path.to_string(),
    }
}

fn default_icon_outputs() -> Vec<IconOutput> {
    vec![
        // Store listings
        icon(1024, "appstore_icon_1024.png"),
        icon(512, "playstore_icon_512.png"),
        // iOS asset catalog
        icon(180, "ios/Icon-180.png"),
        icon(120, "ios/Icon-120.png"),
        icon(167, "ios/Icon-167.png"),
        icon(152, "ios/Icon-152.png"),
        icon(76, "ios/Icon-76.png"),
        icon(40, "ios/Icon-40.png"),
        icon(80, "ios/Icon-80.png"),
        icon(120, "ios/Icon-120-spotlight.png"),
        icon(29, "ios/Icon-29.png"),
        icon(58, "ios/Icon-58.png"),
        icon(87, "ios/Icon-87.png"),
        // Android launcher mipmaps
        icon(48, "android/mipmap-mdpi/ic_launcher.png"),
        icon(72, "android/mipmap-hdpi/ic_launcher.png"),
        icon(96, "android/mipmap-xhdpi/ic_launcher.png"),
        icon(144, "android/mipmap-xxhdpi/ic_launcher.png"),
        icon(192, "android/mipmap-xxxhdpi/ic_launcher.png"),
    ]
}

/// Store listing export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListingConfig {
    /// Listing text file (see [`crate::listing`]).
    pub source: String,
    /// Export directory for `store_listing.json` and `listings/<locale>/`.
    pub output_dir: String,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            source: "listing.toml".to_string(),
            output_dir: "store/playstore".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Resolve a config path against the project root; absolute paths pass through.
pub fn resolve_path(root: &Path, value: &str) -> PathBuf {
    root.join(value)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(StoreConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay (including arrays) replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<StoreConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: StoreConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result. A missing file yields the stock defaults.
pub fn load_config(path: &Path) -> Result<StoreConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `storefit.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# storefit configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Relative paths resolve against the directory holding this file
# (or --root when given). Unknown keys will cause an error.
#
# Arrays of tables replace the defaults wholesale: declaring a single
# [[screenshots.targets]] drops every stock target not repeated here.

# ---------------------------------------------------------------------------
# Screenshots
# ---------------------------------------------------------------------------
[screenshots]
# Directory holding the raw captures.
source_dir = "screenshots"

# Rendered canvases land in <output_dir>/<target.dir>/<stem><target.suffix>.<ext>
output_dir = "store/screenshots"

# Explicit sources, in output order. Empty = every image in source_dir,
# sorted by file name. Example:
#   sources = [
#     { path = "02_today.png" },
#     { path = "04_detail.png", rename = "02_detail" },
#   ]
sources = []

# Rewrite NN_ prefixes to the 1-based source position (02_today -> 01_today).
renumber = false

# Output encoder: "png" or "jpeg".
format = "png"

# JPEG quality (1 = worst, 100 = best). Ignored for PNG.
quality = 90

# iPhone 6.7" display
[[screenshots.targets]]
name = "APP_IPHONE_67"
width = 1290
height = 2796
suffix = "_67"
dir = "appstore"

# iPhone 6.5" display
[[screenshots.targets]]
name = "APP_IPHONE_65"
width = 1284
height = 2778
suffix = "_65"
dir = "appstore"

# Play Store phone (9:16)
[[screenshots.targets]]
name = "PLAY_PHONE"
width = 1080
height = 1920
suffix = ""
dir = "playstore"

# ---------------------------------------------------------------------------
# Icons
# ---------------------------------------------------------------------------
[icons]
# Logo image. Any aspect ratio; the centered square is used.
source = "logo.png"
output_dir = "store/icons"

# JPEG quality for icon paths ending in .jpg/.jpeg (1-100). Ignored for PNG.
quality = 90

[[icons.outputs]]
size = 1024
path = "appstore_icon_1024.png"

[[icons.outputs]]
size = 512
path = "playstore_icon_512.png"

[[icons.outputs]]
size = 180
path = "ios/Icon-180.png"

[[icons.outputs]]
size = 120
path = "ios/Icon-120.png"

[[icons.outputs]]
size = 167
path = "ios/Icon-167.png"

[[icons.outputs]]
size = 152
path = "ios/Icon-152.png"

[[icons.outputs]]
size = 76
path = "ios/Icon-76.png"

[[icons.outputs]]
size = 40
path = "ios/Icon-40.png"

[[icons.outputs]]
size = 80
path = "ios/Icon-80.png"

[[icons.outputs]]
size = 120
path = "ios/Icon-120-spotlight.png"

[[icons.outputs]]
size = 29
path = "ios/Icon-29.png"

[[icons.outputs]]
size = 58
path = "ios/Icon-58.png"

[[icons.outputs]]
size = 87
path = "ios/Icon-87.png"

[[icons.outputs]]
size = 48
path = "android/mipmap-mdpi/ic_launcher.png"

[[icons.outputs]]
size = 72
path = "android/mipmap-hdpi/ic_launcher.png"

[[icons.outputs]]
size = 96
path = "android/mipmap-xhdpi/ic_launcher.png"

[[icons.outputs]]
size = 144
path = "android/mipmap-xxhdpi/ic_launcher.png"

[[icons.outputs]]
size = 192
path = "android/mipmap-xxxhdpi/ic_launcher.png"

# ---------------------------------------------------------------------------
# Store listing
# ---------------------------------------------------------------------------
[listing]
# Localized listing text, one [locales.<code>] table per locale.
source = "listing.toml"

# Receives store_listing.json and listings/<locale>/*.txt
output_dir = "store/playstore"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# Set to 1 for a fully sequential run.
# max_processes = 4
"##
}
