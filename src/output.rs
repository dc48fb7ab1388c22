//! CLI output formatting for all commands.
//!
//! # Information-First Display
//!
//! Every entity (screenshot source, rendered output, listing locale) leads
//! with its positional index and identity; filesystem paths follow as
//! indented context lines. Paths are shown relative to the project root when
//! they live under it.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Screenshots (3 sources)
//! 001 01_today
//!     Source: screenshots/02_today.png
//! 002 02_detail
//!     Source: screenshots/04_detail.png (missing)
//!
//! Targets
//!     APP_IPHONE_67 1290x2796 → store/screenshots/appstore/<stem>_67.png
//! ```
//!
//! ## Process
//!
//! ```text
//! 001/003 01_today
//!     Source: screenshots/02_today.png
//!     APP_IPHONE_67 → store/screenshots/appstore/01_today_67.png
//!     APP_IPHONE_65 failed: Processing failed: ...
//! Screenshots: 5 written, 1 failed, 0 sources skipped
//! ```
//!
//! ## Check
//!
//! ```text
//! Decode (2 sources + logo)
//!     screenshots/02_today.png 1920x1080
//!     logo.png unreadable: Source image not found or unreadable: ...
//! ```
//!
//! ## Listing
//!
//! ```text
//! Locales
//! 001 de-DE
//!     Title: CleanOrga - Putzplan App (24/30)
//!     Short description: 29/80
//!     Description: 1840/4000
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::config::{ScreenshotsConfig, resolve_path};
use crate::imaging::OutputFormat;
use crate::listing::{self, Listing, Violation};
use crate::naming::output_file_name;
use crate::process::{DecodeRecord, ProcessEvent, ProcessReport};
use crate::scan::SourceManifest;
use std::path::{Path, PathBuf};

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Show `path` relative to `root` when it lives under it.
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// Scan output
// ============================================================================

/// Format the discovered sources and the canvases they will be rendered onto.
pub fn format_scan_output(
    manifest: &SourceManifest,
    config: &ScreenshotsConfig,
    root: &Path,
) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!(
        "Screenshots ({})",
        plural(manifest.sources.len(), "source", "sources")
    ));
    for source in &manifest.sources {
        lines.push(format!("{} {}", format_index(source.position), source.stem));
        let missing = if source.present { "" } else { " (missing)" };
        lines.push(format!(
            "{}Source: {}{}",
            indent(1),
            display_path(&source.path, root),
            missing
        ));
    }

    lines.push(String::new());
    lines.push("Targets".to_string());
    let output_dir = resolve_path(root, &config.output_dir);
    let extension = OutputFormat::from(config.format).extension();
    for target in &config.targets {
        let pattern: PathBuf = output_dir
            .join(&target.dir)
            .join(output_file_name("<stem>", &target.suffix, extension));
        lines.push(format!(
            "{}{} {}x{} \u{2192} {}",
            indent(1),
            target.name,
            target.width,
            target.height,
            display_path(&pattern, root)
        ));
    }
    lines
}

/// Print scan output to stdout.
pub fn print_scan_output(manifest: &SourceManifest, config: &ScreenshotsConfig, root: &Path) {
    print_lines(format_scan_output(manifest, config, root));
}

// ============================================================================
// Process output
// ============================================================================

/// Format a single process progress event as display lines.
pub fn format_process_event(event: &ProcessEvent, root: &Path) -> Vec<String> {
    match event {
        ProcessEvent::SourceStarted {
            position,
            total,
            path,
            stem,
        } => vec![
            format!("{}/{} {}", format_index(*position), format_index(*total), stem),
            format!("{}Source: {}", indent(1), display_path(path, root)),
        ],
        ProcessEvent::OutputWritten { label, path } => vec![format!(
            "{}{} \u{2192} {}",
            indent(1),
            label,
            display_path(path, root)
        )],
        ProcessEvent::OutputFailed { label, path, error } => vec![
            format!("{}{} failed: {}", indent(1), label, error),
            format!("{}Output: {}", indent(2), display_path(path, root)),
        ],
        ProcessEvent::SourceSkipped {
            path,
            reason,
            output_count,
        } => vec![format!(
            "{}Skipped {} ({}): {}",
            indent(1),
            display_path(path, root),
            plural(*output_count, "output", "outputs"),
            reason
        )],
    }
}

/// Format the end-of-run summary, listing every failure.
///
/// ```text
/// Screenshots: 5 written, 1 failed, 0 sources skipped
/// Failed
///     APP_IPHONE_65 store/screenshots/appstore/02_detail_65.png: IO error: ...
/// ```
pub fn format_process_summary(label: &str, report: &ProcessReport, root: &Path) -> Vec<String> {
    let mut lines = vec![format!(
        "{}: {} written, {} failed, {} skipped",
        label,
        report.written_count(),
        report.failed_count(),
        plural(report.skipped.len(), "source", "sources")
    )];
    let failed: Vec<_> = report.failed().collect();
    if !failed.is_empty() {
        lines.push("Failed".to_string());
        for output in failed {
            lines.push(format!(
                "{}{} {}: {}",
                indent(1),
                output.label,
                display_path(&output.path, root),
                output.error.as_deref().unwrap_or_default()
            ));
        }
    }
    lines
}

/// Print the end-of-run summary to stdout.
pub fn print_process_summary(label: &str, report: &ProcessReport, root: &Path) {
    print_lines(format_process_summary(label, report, root));
}

// ============================================================================
// Check output
// ============================================================================

/// Format the header reads done by `check`, one line per file.
pub fn format_decode_report(
    records: &[DecodeRecord],
    manifest: &SourceManifest,
    root: &Path,
) -> Vec<String> {
    let mut lines = vec![format!(
        "Decode ({} + logo)",
        plural(manifest.present_count(), "source", "sources")
    )];
    for record in records {
        let path = display_path(&record.path, root);
        lines.push(match &record.result {
            Ok((width, height)) => format!("{}{} {}x{}", indent(1), path, width, height),
            Err(error) => format!("{}{} unreadable: {}", indent(1), path, error),
        });
    }
    lines
}

/// Print the decode report to stdout.
pub fn print_decode_report(records: &[DecodeRecord], manifest: &SourceManifest, root: &Path) {
    print_lines(format_decode_report(records, manifest, root));
}

// ============================================================================
// Listing output
// ============================================================================

/// Format per-locale character usage followed by any violations.
pub fn format_listing_report(listing: &Listing, violations: &[Violation]) -> Vec<String> {
    let mut lines = vec!["Locales".to_string()];
    for (i, (locale, text)) in listing.locales.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), locale));
        lines.push(format!(
            "{}Title: {} ({}/{})",
            indent(1),
            text.title,
            text.title.chars().count(),
            listing::PLAY_TITLE_MAX
        ));
        lines.push(format!(
            "{}Short description: {}/{}",
            indent(1),
            text.short_description().chars().count(),
            listing::PLAY_SHORT_DESCRIPTION_MAX
        ));
        lines.push(format!(
            "{}Description: {}/{}",
            indent(1),
            text.description.chars().count(),
            listing::DESCRIPTION_MAX
        ));
        if !text.keywords.is_empty() {
            lines.push(format!(
                "{}Keywords: {}/{}",
                indent(1),
                text.keywords.chars().count(),
                listing::APPSTORE_KEYWORDS_MAX
            ));
        }
    }

    if !violations.is_empty() {
        lines.push(String::new());
        lines.push(format!(
            "Violations ({})",
            plural(violations.len(), "problem", "problems")
        ));
        for violation in violations {
            lines.push(format!("{}{}", indent(1), violation));
        }
    }
    lines
}

/// Print the listing report to stdout.
pub fn print_listing_report(listing: &Listing, violations: &[Violation]) {
    print_lines(format_listing_report(listing, violations));
}

/// Format the files written by a listing export.
pub fn format_listing_export(written: &[PathBuf], root: &Path) -> Vec<String> {
    let mut lines = vec![format!(
        "Listing: {}",
        plural(written.len(), "file written", "files written")
    )];
    lines.extend(
        written
            .iter()
            .map(|p| format!("{}{}", indent(1), display_path(p, root))),
    );
    lines
}

/// Print the listing export result to stdout.
pub fn print_listing_export(written: &[PathBuf], root: &Path) {
    print_lines(format_listing_export(written, root));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::listing::ViolationKind;
    use crate::process::{OutputRecord, SkippedSource};
    use crate::scan::SourceImage;

    fn root() -> &'static Path {
        Path::new("/proj")
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn display_path_relative_under_root() {
        assert_eq!(
            display_path(Path::new("/proj/screenshots/a.png"), root()),
            "screenshots/a.png"
        );
        assert_eq!(display_path(Path::new("/elsewhere/a.png"), root()), "/elsewhere/a.png");
    }

    // =========================================================================
    // Scan
    // =========================================================================

    #[test]
    fn scan_output_lists_sources_and_targets() {
        let manifest = SourceManifest {
            sources: vec![
                SourceImage {
                    path: "/proj/screenshots/02_today.png".into(),
                    stem: "01_today".into(),
                    position: 1,
                    present: true,
                },
                SourceImage {
                    path: "/proj/screenshots/04_detail.png".into(),
                    stem: "02_detail".into(),
                    position: 2,
                    present: false,
                },
            ],
        };
        let config = StoreConfig::default().screenshots;
        let lines = format_scan_output(&manifest, &config, root());

        assert_eq!(lines[0], "Screenshots (2 sources)");
        assert_eq!(lines[1], "001 01_today");
        assert_eq!(lines[2], "    Source: screenshots/02_today.png");
        assert_eq!(lines[4], "    Source: screenshots/04_detail.png (missing)");
        assert_eq!(lines[6], "Targets");
        assert_eq!(
            lines[7],
            "    APP_IPHONE_67 1290x2796 \u{2192} store/screenshots/appstore/<stem>_67.png"
        );
        assert_eq!(
            lines[9],
            "    PLAY_PHONE 1080x1920 \u{2192} store/screenshots/playstore/<stem>.png"
        );
    }

    // =========================================================================
    // Check
    // =========================================================================

    #[test]
    fn decode_report_marks_unreadable_files() {
        let manifest = SourceManifest {
            sources: vec![SourceImage {
                path: "/proj/screenshots/02_today.png".into(),
                stem: "01_today".into(),
                position: 1,
                present: true,
            }],
        };
        let records = vec![
            DecodeRecord {
                path: "/proj/screenshots/02_today.png".into(),
                result: Ok((1920, 1080)),
            },
            DecodeRecord {
                path: "/proj/logo.png".into(),
                result: Err("bad header".into()),
            },
        ];
        assert_eq!(
            format_decode_report(&records, &manifest, root()),
            vec![
                "Decode (1 source + logo)",
                "    screenshots/02_today.png 1920x1080",
                "    logo.png unreadable: bad header",
            ]
        );
    }

    // =========================================================================
    // Process events
    // =========================================================================

    #[test]
    fn format_source_started() {
        let event = ProcessEvent::SourceStarted {
            position: 2,
            total: 5,
            path: "/proj/screenshots/04_detail.png".into(),
            stem: "02_detail".into(),
        };
        assert_eq!(
            format_process_event(&event, root()),
            vec!["002/005 02_detail", "    Source: screenshots/04_detail.png"]
        );
    }

    #[test]
    fn format_output_written_and_failed() {
        let written = ProcessEvent::OutputWritten {
            label: "APP_IPHONE_67".into(),
            path: "/proj/store/screenshots/appstore/01_today_67.png".into(),
        };
        assert_eq!(
            format_process_event(&written, root()),
            vec!["    APP_IPHONE_67 \u{2192} store/screenshots/appstore/01_today_67.png"]
        );

        let failed = ProcessEvent::OutputFailed {
            label: "512px".into(),
            path: "/proj/store/icons/playstore_icon_512.png".into(),
            error: "IO error: disk full".into(),
        };
        let lines = format_process_event(&failed, root());
        assert_eq!(lines[0], "    512px failed: IO error: disk full");
        assert_eq!(lines[1], "        Output: store/icons/playstore_icon_512.png");
    }

    #[test]
    fn format_source_skipped() {
        let event = ProcessEvent::SourceSkipped {
            path: "/proj/screenshots/gone.png".into(),
            reason: "not found".into(),
            output_count: 3,
        };
        assert_eq!(
            format_process_event(&event, root()),
            vec!["    Skipped screenshots/gone.png (3 outputs): not found"]
        );
    }

    #[test]
    fn summary_lists_failures() {
        let report = ProcessReport {
            outputs: vec![
                OutputRecord {
                    source: "/proj/screenshots/a.png".into(),
                    label: "APP_IPHONE_67".into(),
                    path: "/proj/out/a_67.png".into(),
                    error: None,
                },
                OutputRecord {
                    source: "/proj/screenshots/b.png".into(),
                    label: "PLAY_PHONE".into(),
                    path: "/proj/out/b.png".into(),
                    error: Some("not found".into()),
                },
            ],
            skipped: vec![SkippedSource {
                path: "/proj/screenshots/b.png".into(),
                reason: "not found".into(),
            }],
        };
        let lines = format_process_summary("Screenshots", &report, root());
        assert_eq!(
            lines,
            vec![
                "Screenshots: 1 written, 1 failed, 1 source skipped",
                "Failed",
                "    PLAY_PHONE out/b.png: not found",
            ]
        );
    }

    #[test]
    fn summary_without_failures_is_one_line() {
        let lines = format_process_summary("Icons", &ProcessReport::default(), root());
        assert_eq!(lines, vec!["Icons: 0 written, 0 failed, 0 sources skipped"]);
    }

    // =========================================================================
    // Listing
    // =========================================================================

    #[test]
    fn listing_report_shows_usage_and_violations() {
        let listing: Listing = toml::from_str(
            r#"
[locales.de-DE]
title = "Putzplan"
promotional_text = "Kurz"
description = "Lang genug"
"#,
        )
        .unwrap();
        let violations = vec![Violation {
            locale: "de-DE".into(),
            field: "title",
            kind: ViolationKind::Empty,
        }];
        let lines = format_listing_report(&listing, &violations);
        assert_eq!(lines[0], "Locales");
        assert_eq!(lines[1], "001 de-DE");
        assert_eq!(lines[2], "    Title: Putzplan (8/30)");
        assert_eq!(lines[3], "    Short description: 4/80");
        assert_eq!(lines[4], "    Description: 10/4000");
        assert_eq!(lines[6], "Violations (1 problem)");
        assert_eq!(lines[7], "    de-DE: title must not be empty");
    }

    #[test]
    fn listing_export_lists_files() {
        let written = vec![
            PathBuf::from("/proj/store/playstore/store_listing.json"),
            PathBuf::from("/proj/store/playstore/listings/en-US/title.txt"),
        ];
        let lines = format_listing_export(&written, root());
        assert_eq!(lines[0], "Listing: 2 files written");
        assert_eq!(lines[1], "    store/playstore/store_listing.json");
    }
}
