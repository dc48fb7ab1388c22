//! Localized store listing text: validation and Play Store export.
//!
//! The listing file holds one table per locale:
//!
//! ```toml
//! [locales.en-US]
//! title = "CleanOrga - Cleaning Schedule"
//! promotional_text = "No more cleaning disputes!"
//! description = """
//! The smart cleaning schedule app for shared living.
//! """
//! keywords = "cleaning,schedule,roommate,chores"
//! whats_new = "First release."
//! support_url = "https://example.com/support"
//! marketing_url = "https://example.com"
//! ```
//!
//! `short_description` is optional and falls back to `promotional_text`,
//! which is what the Play Store short description usually mirrors.
//!
//! ## Limits
//!
//! Counted in characters, not bytes:
//!
//! | Field | Store | Limit |
//! |---|---|---|
//! | `title` | Play | 30 |
//! | short description | Play | 80 |
//! | `description` | both | 4000 |
//! | `keywords` | App Store | 100 |
//! | `promotional_text` | App Store | 170 |
//! | `whats_new` | App Store | 4000 |
//!
//! ## Export
//!
//! ```text
//! <listing.output_dir>/
//! ├── store_listing.json
//! └── listings/
//!     └── en-US/
//!         ├── title.txt
//!         ├── short_description.txt
//!         └── full_description.txt
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ListingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Listing file not found: {0}")]
    NotFound(PathBuf),
    #[error("Listing file has no [locales.*] tables: {0}")]
    NoLocales(PathBuf),
    #[error("Listing has {} violation(s)", .0.len())]
    Invalid(Vec<Violation>),
}

/// Parsed listing file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Listing {
    /// Keyed by locale code (`de-DE`, `en-US`); iteration is sorted.
    #[serde(default)]
    pub locales: BTreeMap<String, LocaleListing>,
}

/// Store text for one locale.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocaleListing {
    pub title: String,
    pub short_description: Option<String>,
    pub promotional_text: String,
    pub description: String,
    pub keywords: String,
    pub whats_new: String,
    pub support_url: Option<String>,
    pub marketing_url: Option<String>,
}

impl LocaleListing {
    /// Play Store short description, falling back to the promotional text.
    pub fn short_description(&self) -> &str {
        self.short_description
            .as_deref()
            .unwrap_or(&self.promotional_text)
    }
}

pub const PLAY_TITLE_MAX: usize = 30;
pub const PLAY_SHORT_DESCRIPTION_MAX: usize = 80;
pub const DESCRIPTION_MAX: usize = 4000;
pub const APPSTORE_KEYWORDS_MAX: usize = 100;
pub const APPSTORE_PROMOTIONAL_MAX: usize = 170;
pub const APPSTORE_WHATS_NEW_MAX: usize = 4000;

/// One broken rule in one locale.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub locale: String,
    pub field: &'static str,
    pub kind: ViolationKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViolationKind {
    TooLong { limit: usize, actual: usize },
    Empty,
    InvalidUrl(String),
    InvalidLocale,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ViolationKind::TooLong { limit, actual } => write!(
                f,
                "{}: {} is {} characters (limit {})",
                self.locale, self.field, actual, limit
            ),
            ViolationKind::Empty => write!(f, "{}: {} must not be empty", self.locale, self.field),
            ViolationKind::InvalidUrl(url) => write!(
                f,
                "{}: {} must start with http:// or https://, got {:?}",
                self.locale, self.field, url
            ),
            ViolationKind::InvalidLocale => write!(
                f,
                "{:?}: locale code must be non-empty and contain no path separators",
                self.locale
            ),
        }
    }
}

/// Load and parse a listing file.
pub fn load_listing(path: &Path) -> Result<Listing, ListingError> {
    if !path.is_file() {
        return Err(ListingError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    let listing: Listing = toml::from_str(&content)?;
    if listing.locales.is_empty() {
        return Err(ListingError::NoLocales(path.to_path_buf()));
    }
    Ok(listing)
}

/// Check every locale against the store limits. Returns all violations.
pub fn validate(listing: &Listing) -> Vec<Violation> {
    let mut violations = Vec::new();
    for (locale, text) in &listing.locales {
        let mut push = |field: &'static str, kind: ViolationKind| {
            violations.push(Violation {
                locale: locale.clone(),
                field,
                kind,
            });
        };

        if locale.trim().is_empty() || locale.contains(['/', '\\']) || locale.starts_with('.') {
            push("locale", ViolationKind::InvalidLocale);
        }

        for (field, value) in [("title", &text.title), ("description", &text.description)] {
            if value.trim().is_empty() {
                push(field, ViolationKind::Empty);
            }
        }

        let limits = [
            ("title", text.title.as_str(), PLAY_TITLE_MAX),
            (
                "short_description",
                text.short_description(),
                PLAY_SHORT_DESCRIPTION_MAX,
            ),
            ("description", text.description.as_str(), DESCRIPTION_MAX),
            ("keywords", text.keywords.as_str(), APPSTORE_KEYWORDS_MAX),
            (
                "promotional_text",
                text.promotional_text.as_str(),
                APPSTORE_PROMOTIONAL_MAX,
            ),
            ("whats_new", text.whats_new.as_str(), APPSTORE_WHATS_NEW_MAX),
        ];
        for (field, value, limit) in limits {
            let actual = value.chars().count();
            if actual > limit {
                push(field, ViolationKind::TooLong { limit, actual });
            }
        }

        for (field, url) in [
            ("support_url", &text.support_url),
            ("marketing_url", &text.marketing_url),
        ] {
            match url {
                Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                    push(field, ViolationKind::InvalidUrl(url.clone()));
                }
                _ => {}
            }
        }
    }
    violations
}

/// Play Store fields for one locale, as written to `store_listing.json`.
#[derive(Debug, Serialize)]
struct PlayListing<'a> {
    title: &'a str,
    short_description: &'a str,
    full_description: &'a str,
    keywords: &'a str,
}

/// Write the Play Store export under `output_dir`.
///
/// Nothing is written when validation fails. Returns the written paths.
pub fn export_play_listing(listing: &Listing, output_dir: &Path) -> Result<Vec<PathBuf>, ListingError> {
    let violations = validate(listing);
    if !violations.is_empty() {
        return Err(ListingError::Invalid(violations));
    }

    let play: BTreeMap<&str, PlayListing<'_>> = listing
        .locales
        .iter()
        .map(|(locale, text)| {
            (
                locale.as_str(),
                PlayListing {
                    title: &text.title,
                    short_description: text.short_description(),
                    full_description: &text.description,
                    keywords: &text.keywords,
                },
            )
        })
        .collect();

    let mut written = Vec::new();

    let json_path = output_dir.join("store_listing.json");
    write_atomic(&json_path, serde_json::to_string_pretty(&play)?.as_bytes())?;
    written.push(json_path);

    for (locale, text) in &play {
        let dir = output_dir.join("listings").join(locale);
        for (name, content) in [
            ("title.txt", text.title),
            ("short_description.txt", text.short_description),
            ("full_description.txt", text.full_description),
        ] {
            let path = dir.join(name);
            write_atomic(&path, content.as_bytes())?;
            written.push(path);
        }
    }

    debug!(files = written.len(), dir = %output_dir.display(), "exported play listing");
    Ok(written)
}

fn write_atomic(path: &Path, content: &[u8]) -> Result<(), ListingError> {
    let dir = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(dir)?;
    let mut tmp = tempfile::Builder::new()
        .prefix(".storefit-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(content)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const LISTING: &str = r#"
[locales.de-DE]
title = "CleanOrga - Putzplan App"
promotional_text = "Nie wieder Streit ums Putzen!"
description = "Die intelligente Putzplan-App für WGs."
keywords = "Putzplan,WG,Reinigung"
whats_new = "Erste Version."
support_url = "https://example.com/CleanOrga"

[locales.en-US]
title = "CleanOrga - Cleaning Schedule"
short_description = "Fair chores for shared flats"
promotional_text = "No more cleaning disputes!"
description = "The smart cleaning schedule app."
keywords = "cleaning,schedule,roommate"
"#;

    fn listing() -> Listing {
        toml::from_str(LISTING).unwrap()
    }

    fn locale<'a>(listing: &'a mut Listing, code: &str) -> &'a mut LocaleListing {
        listing.locales.get_mut(code).unwrap()
    }

    #[test]
    fn parses_locales_sorted() {
        let listing = listing();
        let codes: Vec<_> = listing.locales.keys().map(String::as_str).collect();
        assert_eq!(codes, vec!["de-DE", "en-US"]);
    }

    #[test]
    fn short_description_falls_back_to_promotional_text() {
        let listing = listing();
        assert_eq!(
            listing.locales["de-DE"].short_description(),
            "Nie wieder Streit ums Putzen!"
        );
        assert_eq!(
            listing.locales["en-US"].short_description(),
            "Fair chores for shared flats"
        );
    }

    #[test]
    fn valid_listing_has_no_violations() {
        assert!(validate(&listing()).is_empty());
    }

    #[test]
    fn limits_count_characters_not_bytes() {
        let mut listing = listing();
        // 30 two-byte characters: at the limit, 60 bytes
        locale(&mut listing, "de-DE").title = "ü".repeat(30);
        assert!(validate(&listing).is_empty());

        locale(&mut listing, "de-DE").title = "ü".repeat(31);
        assert_eq!(
            validate(&listing),
            vec![Violation {
                locale: "de-DE".into(),
                field: "title",
                kind: ViolationKind::TooLong {
                    limit: 30,
                    actual: 31
                },
            }]
        );
    }

    #[test]
    fn every_violation_is_reported() {
        let mut listing = listing();
        let de = locale(&mut listing, "de-DE");
        de.description = String::new();
        de.keywords = "k".repeat(101);
        de.promotional_text = "p".repeat(171);
        let en = locale(&mut listing, "en-US");
        en.marketing_url = Some("example.com".into());
        en.whats_new = "w".repeat(4001);

        let violations = validate(&listing);
        let fields: Vec<(&str, &str)> = violations
            .iter()
            .map(|v| (v.locale.as_str(), v.field))
            .collect();
        // de-DE has no short_description, so the long promo text trips both limits
        assert_eq!(
            fields,
            vec![
                ("de-DE", "description"),
                ("de-DE", "short_description"),
                ("de-DE", "keywords"),
                ("de-DE", "promotional_text"),
                ("en-US", "whats_new"),
                ("en-US", "marketing_url"),
            ]
        );
    }

    #[test]
    fn empty_title_is_violation() {
        let mut listing = listing();
        locale(&mut listing, "en-US").title = "   ".into();
        let violations = validate(&listing);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::Empty);
        assert!(violations[0].to_string().contains("title must not be empty"));
    }

    #[test]
    fn locale_code_used_as_directory_is_checked() {
        let mut listing = listing();
        let text = listing.locales["en-US"].clone();
        listing.locales.insert("../evil".into(), text);
        assert!(
            validate(&listing)
                .iter()
                .any(|v| v.kind == ViolationKind::InvalidLocale)
        );
    }

    #[test]
    fn unknown_field_rejected() {
        let result: Result<Listing, _> = toml::from_str("[locales.en-US]\ntitel = \"x\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn load_listing_errors() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("listing.toml");
        assert!(matches!(
            load_listing(&missing),
            Err(ListingError::NotFound(_))
        ));

        fs::write(&missing, "").unwrap();
        assert!(matches!(
            load_listing(&missing),
            Err(ListingError::NoLocales(_))
        ));

        fs::write(&missing, LISTING).unwrap();
        assert_eq!(load_listing(&missing).unwrap().locales.len(), 2);
    }

    #[test]
    fn export_writes_json_and_text_files() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("playstore");

        let written = export_play_listing(&listing(), &out).unwrap();
        assert_eq!(written.len(), 7);

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join("store_listing.json")).unwrap())
                .unwrap();
        assert_eq!(json["de-DE"]["title"], "CleanOrga - Putzplan App");
        assert_eq!(
            json["de-DE"]["short_description"],
            "Nie wieder Streit ums Putzen!"
        );
        assert_eq!(json["en-US"]["keywords"], "cleaning,schedule,roommate");
        assert_eq!(
            json["en-US"]["full_description"],
            "The smart cleaning schedule app."
        );

        let title = fs::read_to_string(out.join("listings/en-US/title.txt")).unwrap();
        assert_eq!(title, "CleanOrga - Cleaning Schedule");
        assert!(out.join("listings/de-DE/full_description.txt").is_file());
    }

    #[test]
    fn export_refuses_invalid_listing() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("playstore");
        let mut listing = listing();
        locale(&mut listing, "en-US").title = "t".repeat(31);

        let result = export_play_listing(&listing, &out);
        assert!(matches!(result, Err(ListingError::Invalid(ref v)) if v.len() == 1));
        assert!(!out.exists());
    }
}
