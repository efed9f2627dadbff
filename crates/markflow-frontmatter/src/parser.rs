//! Front matter detection.
//!
//! A document may start with a section fenced by `---` lines:
//!
//! ```text
//! ---
//! title = "Guide"
//! ---
//! # Guide
//! ```
//!
//! The parser only locates the section. Its content is opaque here and is
//! interpreted by the decoders of a [`DecoderRegistry`](crate::DecoderRegistry).

use std::fmt;

use serde::{Deserialize, Serialize};

const DELIMITER: &str = "---";
const BOM: char = '\u{feff}';

/// Best-effort guess of the front matter syntax.
///
/// YAML has no hint; it is what a section without a hint is assumed to be.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatHint {
    Json,
    Toml,
}

impl fmt::Display for FormatHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Toml => f.write_str("toml"),
        }
    }
}

/// Raw front matter section handed to decoders.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSection {
    /// Text between the delimiter lines, including its final line break.
    pub raw_text: String,
    /// Guessed syntax.
    pub format_hint: Option<FormatHint>,
    /// 1-based document line of the first content line.
    pub content_start_line: usize,
}

impl ConfigSection {
    /// Build a section from raw text, guessing its format.
    #[must_use]
    pub fn new(raw_text: impl Into<String>, content_start_line: usize) -> Self {
        let raw_text = raw_text.into();
        let format_hint = guess_format(&raw_text);
        Self {
            raw_text,
            format_hint,
            content_start_line,
        }
    }

    /// Convert a 0-based byte offset into `raw_text` to a 1-based document
    /// `(line, column)`.
    #[must_use]
    pub fn position_of(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.raw_text.len());
        let before = &self.raw_text[..offset];
        let line = before.matches('\n').count();
        let column = before
            .rfind('\n')
            .map_or(before.chars().count(), |nl| before[nl + 1..].chars().count());
        (self.content_start_line + line, column + 1)
    }

    /// Convert a 1-based line within `raw_text` to a document line.
    #[must_use]
    pub fn document_line(&self, section_line: usize) -> usize {
        self.content_start_line + section_line.saturating_sub(1)
    }
}

/// A detected front matter section and the rest of the document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrontMatter {
    /// Section content.
    pub section: ConfigSection,
    /// Document text after the closing delimiter line.
    pub body: String,
    /// Exact document prefix occupied by the section, delimiters included.
    pub consumed: String,
}

/// Detect a leading front matter section.
///
/// The first line (after an optional byte-order mark) must be exactly `---`,
/// and a later line must be exactly `---` too. Lines may end with `\n` or
/// `\r\n`. Returns `None` when either delimiter is missing.
#[must_use]
pub fn parse_front_matter(text: &str) -> Option<FrontMatter> {
    let start = if text.starts_with(BOM) { BOM.len_utf8() } else { 0 };
    let mut lines = Lines::new(text, start);

    let opening = lines.next()?;
    if opening.content != DELIMITER {
        return None;
    }
    let content_start = opening.end;

    let closing = lines.find(|line| line.content == DELIMITER)?;
    let raw_text = &text[content_start..closing.start];

    Some(FrontMatter {
        section: ConfigSection::new(raw_text, 2),
        body: text[closing.end..].to_owned(),
        consumed: text[..closing.end].to_owned(),
    })
}

/// Guess the section syntax: JSON for `{`/`[`, TOML if any line has `=`.
fn guess_format(raw_text: &str) -> Option<FormatHint> {
    let trimmed = raw_text.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        Some(FormatHint::Json)
    } else if raw_text.lines().any(|line| line.contains('=')) {
        Some(FormatHint::Toml)
    } else {
        None
    }
}

struct Line<'a> {
    content: &'a str,
    start: usize,
    end: usize,
}

/// Line iterator that keeps byte offsets, terminators excluded from content.
struct Lines<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str, pos: usize) -> Self {
        Self { text, pos }
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = Line<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.text.len() {
            return None;
        }
        let start = self.pos;
        let rest = &self.text[start..];
        let (raw, end) = match rest.find('\n') {
            Some(nl) => (&rest[..nl], start + nl + 1),
            None => (rest, self.text.len()),
        };
        self.pos = end;
        Some(Line {
            content: raw.strip_suffix('\r').unwrap_or(raw),
            start,
            end,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_toml_front_matter() {
        let text = "---\ntitle = \"Hello\"\ncount = 3\n---\n# Heading\nbody";
        let fm = parse_front_matter(text).unwrap();

        assert_eq!(fm.section.raw_text, "title = \"Hello\"\ncount = 3\n");
        assert_eq!(fm.section.format_hint, Some(FormatHint::Toml));
        assert_eq!(fm.section.content_start_line, 2);
        assert_eq!(fm.body, "# Heading\nbody");
        assert_eq!(fm.consumed, "---\ntitle = \"Hello\"\ncount = 3\n---\n");
    }

    #[test]
    fn test_parse_yaml_front_matter_has_no_hint() {
        let fm = parse_front_matter("---\ntitle: Hello\n---\nbody").unwrap();
        assert_eq!(fm.section.format_hint, None);
        assert_eq!(fm.body, "body");
    }

    #[test]
    fn test_parse_json_front_matter() {
        let fm = parse_front_matter("---\n{\"title\": \"a=b\"}\n---\n").unwrap();
        assert_eq!(fm.section.format_hint, Some(FormatHint::Json));
        assert_eq!(fm.body, "");
    }

    #[test]
    fn test_parse_with_bom_and_crlf() {
        let text = "\u{feff}---\r\ntitle: Hi\r\n---\r\nbody";
        let fm = parse_front_matter(text).unwrap();

        assert_eq!(fm.section.raw_text, "title: Hi\r\n");
        assert_eq!(fm.body, "body");
        assert!(fm.consumed.starts_with('\u{feff}'));
        assert_eq!(format!("{}{}", fm.consumed, fm.body), text);
    }

    #[test]
    fn test_parse_empty_section() {
        let fm = parse_front_matter("---\n---\nbody").unwrap();
        assert_eq!(fm.section.raw_text, "");
        assert_eq!(fm.section.format_hint, None);
        assert_eq!(fm.body, "body");
    }

    #[test]
    fn test_closing_delimiter_at_end_of_text() {
        let fm = parse_front_matter("---\na: 1\n---").unwrap();
        assert_eq!(fm.section.raw_text, "a: 1\n");
        assert_eq!(fm.body, "");
    }

    #[test]
    fn test_no_front_matter() {
        assert!(parse_front_matter("# Title\n---\n").is_none());
        assert!(parse_front_matter("").is_none());
        assert!(parse_front_matter("--- \ntitle: x\n---\n").is_none());
    }

    #[test]
    fn test_unclosed_front_matter() {
        assert!(parse_front_matter("---\ntitle: x\n--\nbody").is_none());
    }

    #[test]
    fn test_delimiter_must_be_exact() {
        assert!(parse_front_matter("---\ntitle: x\n----\nbody").is_none());
    }

    #[test]
    fn test_position_of_offset() {
        let section = ConfigSection::new("a = 1\nbad line\n", 2);
        assert_eq!(section.position_of(0), (2, 1));
        assert_eq!(section.position_of(6), (3, 1));
        assert_eq!(section.position_of(10), (3, 5));
    }

    #[test]
    fn test_format_hint_display() {
        assert_eq!(FormatHint::Json.to_string(), "json");
        assert_eq!(FormatHint::Toml.to_string(), "toml");
    }
}
