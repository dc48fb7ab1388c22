//! # storefit
//!
//! Prepares the image and text assets an app needs for the App Store and the
//! Play Store. Raw captures of any size become screenshots at the exact pixel
//! sizes each store canvas demands, a single logo becomes the whole icon set,
//! and localized listing text is checked against store limits and exported.
//!
//! # Architecture: Scan, Then Render
//!
//! ```text
//! 1. Scan      screenshots/  →  SourceManifest   (which files, in what order, named how)
//! 2. Process   manifest      →  store/screenshots/, store/icons/
//! 3. Listing   listing.toml  →  store/playstore/
//! ```
//!
//! Every output name is decided in the scan and planning steps, before any
//! pixel work. Processing receives a plan and only renders it, so the
//! pipeline can be tested against a recording backend without encoding a
//! single image.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Resolves screenshot sources, their order, and their output stems |
//! | [`process`] | Renders every source onto every target canvas, and the icon set |
//! | [`listing`] | Listing text: per-store character limits, Play Store export |
//! | [`config`] | `storefit.toml` loading, merging over stock defaults, validation |
//! | [`naming`] | `NN_name` stem convention: parsing, renumbering, output names |
//! | [`imaging`] | Fit-and-crop geometry and the pure-Rust image backend |
//! | [`output`] | CLI output formatting for every command |
//!
//! # Design Decisions
//!
//! ## Cover, Then Crop
//!
//! Store canvases have fixed aspect ratios that rarely match the device a
//! screenshot was captured on. Letterboxing looks wrong in a store listing,
//! and stretching distorts the UI. Each source is therefore scaled, keeping
//! its aspect ratio, until it covers the canvas, and the overflow is cropped
//! evenly from both sides. See [`imaging::plan_fit`] for the exact geometry.
//!
//! ## Exact Integer Geometry
//!
//! Intermediate sizes and crop offsets are floored, computed with
//! cross-multiplication in `u64`. The same inputs always produce the same
//! pixel boxes on every platform, and the resized image always covers the
//! target, so the crop never reads outside the image.
//!
//! ## Independent Outputs
//!
//! A missing source or a failed write affects only its own outputs. Every run
//! ends with a report of what was written and what failed, and the process
//! exits non-zero if anything failed.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, Lanczos3 resampling and encoding all use the `image` crate. The
//! binary needs no ImageMagick or other system libraries.

pub mod config;
pub mod imaging;
pub mod listing;
pub mod naming;
pub mod output;
pub mod process;
pub mod scan;
