//! Screenshot file naming for the `NN_name` convention.
//!
//! Store screenshots are ordered by a numeric prefix on the file stem, joined
//! to the name by `_` or `-`:
//! - `02_today` → number 2, separator `_`, name `today`
//! - `04-chat-detail` → number 4, separator `-`, name `chat-detail`
//! - `splash` → unnumbered
//!
//! Rendered files are named `<stem><target suffix>.<ext>`, so
//! `02_today.png` on the `_67` canvas becomes `02_today_67.png`.

/// Result of parsing a screenshot stem like `02_today`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedStem {
    /// Number prefix if present (e.g., `2` from `02_today`)
    pub number: Option<u32>,
    /// Separator between number and name; `_` when absent.
    pub separator: char,
    /// Name after the prefix. For unnumbered stems, the full input.
    pub name: String,
}

/// Parse a stem following the `NN_name` / `NN-name` convention.
///
/// - `"02_today"` → number=Some(2), separator='_', name="today"
/// - `"05-chat_detail"` → number=Some(5), separator='-', name="chat_detail"
/// - `"03"` → number=Some(3), name=""
/// - `"today"` → number=None, name="today"
/// - `"2x_today"` → number=None (prefix must be all digits)
pub fn parse_screenshot_stem(stem: &str) -> ParsedStem {
    if let Some(sep_pos) = stem.find(['_', '-']) {
        let prefix = &stem[..sep_pos];
        if let Some(number) = parse_digits(prefix) {
            return ParsedStem {
                number: Some(number),
                separator: stem[sep_pos..].chars().next().unwrap_or('_'),
                name: stem[sep_pos + 1..].to_string(),
            };
        }
    }
    if let Some(number) = parse_digits(stem) {
        return ParsedStem {
            number: Some(number),
            separator: '_',
            name: String::new(),
        };
    }
    ParsedStem {
        number: None,
        separator: '_',
        name: stem.to_string(),
    }
}

/// `u32::from_str` accepts a leading `+`; a prefix must be plain digits.
fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Rewrite the numeric prefix of `stem` to `position`, zero-padded to two digits.
///
/// The original separator is kept. A stem without a prefix gets one:
/// `splash` at position 3 becomes `03_splash`.
pub fn renumbered_stem(stem: &str, position: usize) -> String {
    let parsed = parse_screenshot_stem(stem);
    if parsed.name.is_empty() {
        return format!("{position:02}");
    }
    format!("{position:02}{}{}", parsed.separator, parsed.name)
}

/// Output file name for one rendered canvas.
pub fn output_file_name(stem: &str, suffix: &str, extension: &str) -> String {
    format!("{stem}{suffix}.{extension}")
}
