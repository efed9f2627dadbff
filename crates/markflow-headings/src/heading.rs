//! Heading extraction and anchor assignment.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::fence::FenceTracker;
use crate::slug::AnchorSet;

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})[ \t]+(.+)$").unwrap());

static EXPLICIT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)\s*\{#([A-Za-z0-9_-]+)\}$").unwrap());

/// A heading found in Markdown text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingInfo {
    /// Heading level (1-6).
    pub level: u8,
    /// Source line, without its line terminator.
    pub raw_line: String,
    /// Display text.
    pub text: String,
    /// Anchor id, unique within the document.
    pub anchor: String,
    /// Whether the anchor was written in the source as `{#id}`.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub explicit: bool,
    /// 1-based line within the scanned text.
    pub line: usize,
    /// Index of the block the heading came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_index: Option<usize>,
}

/// Heading line split into its parts.
struct ParsedHeading<'a> {
    indent: &'a str,
    hashes: &'a str,
    text: &'a str,
    explicit_id: Option<&'a str>,
}

fn parse_heading(line: &str) -> Option<ParsedHeading<'_>> {
    let indent_len = line.len() - line.trim_start().len();
    let trimmed = line.trim();
    let caps = HEADING_RE.captures(trimmed)?;
    let hashes = caps.get(1)?.as_str();
    let mut text = strip_closing_hashes(caps.get(2)?.as_str());
    let mut explicit_id = None;

    if let Some(explicit) = EXPLICIT_ID_RE.captures(text) {
        text = explicit.get(1).map_or("", |m| strip_closing_hashes(m.as_str()));
        explicit_id = explicit.get(2).map(|m| m.as_str());
    }
    if text.is_empty() {
        return None;
    }

    Some(ParsedHeading {
        indent: &line[..indent_len],
        hashes,
        text,
        explicit_id,
    })
}

/// Remove trailing `#` characters and surrounding whitespace.
fn strip_closing_hashes(text: &str) -> &str {
    text.trim().trim_end_matches('#').trim_end()
}

/// Assigns anchors to the headings of one document.
///
/// A document may be scanned in several pieces (one per block). Anchors stay
/// unique across all of them.
#[derive(Debug, Clone)]
pub struct HeadingIndex {
    anchors: AnchorSet,
    headings: Vec<HeadingInfo>,
    max_level: u8,
}

impl Default for HeadingIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadingIndex {
    /// Index recording every heading level.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_level(6)
    }

    /// Index recording headings up to `max_level`. Deeper headings still
    /// receive anchors.
    #[must_use]
    pub fn with_max_level(max_level: u8) -> Self {
        Self {
            anchors: AnchorSet::new(),
            headings: Vec::new(),
            max_level,
        }
    }

    /// Record the headings of `text`.
    pub fn scan(&mut self, text: &str, block_index: Option<usize>) {
        self.walk(text, block_index, |_, _| None);
    }

    /// Record the headings of `text` and return it with an explicit `{#id}`
    /// on every heading that lacks one.
    pub fn inject(&mut self, text: &str, block_index: Option<usize>) -> String {
        self.walk(text, block_index, |parsed, anchor| {
            parsed.explicit_id.is_none().then(|| {
                format!(
                    "{}{} {} {{#{anchor}}}",
                    parsed.indent, parsed.hashes, parsed.text
                )
            })
        })
    }

    /// Headings recorded so far, in document order.
    #[must_use]
    pub fn headings(&self) -> &[HeadingInfo] {
        &self.headings
    }

    #[must_use]
    pub fn into_headings(self) -> Vec<HeadingInfo> {
        self.headings
    }

    /// Scan lines, optionally replacing heading lines with `rewrite`'s output.
    fn walk<F>(&mut self, text: &str, block_index: Option<usize>, mut rewrite: F) -> String
    where
        F: FnMut(&ParsedHeading<'_>, &str) -> Option<String>,
    {
        let mut fence = FenceTracker::default();
        let mut output = String::with_capacity(text.len());

        for (number, raw) in text.split_inclusive('\n').enumerate() {
            let body = raw.trim_end_matches(['\n', '\r']);
            let ending = &raw[body.len()..];

            let parsed = if fence.is_code(body) {
                None
            } else {
                parse_heading(body)
            };
            let Some(parsed) = parsed else {
                output.push_str(raw);
                continue;
            };

            let (anchor, explicit) = match parsed.explicit_id {
                Some(id) => (self.anchors.reserve(id), true),
                None => (self.anchors.claim(parsed.text), false),
            };
            let level = u8::try_from(parsed.hashes.len()).unwrap_or(6);
            if level <= self.max_level {
                self.headings.push(HeadingInfo {
                    level,
                    raw_line: body.to_owned(),
                    text: parsed.text.to_owned(),
                    anchor: anchor.clone(),
                    explicit,
                    line: number + 1,
                    block_index,
                });
            }

            match rewrite(&parsed, &anchor) {
                Some(line) => {
                    output.push_str(&line);
                    output.push_str(ending);
                }
                None => output.push_str(raw),
            }
        }

        output
    }
}

/// Extract the headings of a Markdown text with document-unique anchors.
///
/// Lines inside fenced code are ignored.
#[must_use]
pub fn extract_headings(text: &str) -> Vec<HeadingInfo> {
    let mut index = HeadingIndex::new();
    index.scan(text, None);
    index.into_headings()
}

/// Add an explicit `{#id}` anchor to every heading that lacks one.
///
/// Existing explicit anchors are kept and count as used.
#[must_use]
pub fn inject_heading_ids(text: &str) -> String {
    HeadingIndex::new().inject(text, None)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn anchors(text: &str) -> Vec<String> {
        extract_headings(text).into_iter().map(|h| h.anchor).collect()
    }

    #[test]
    fn test_extract_levels_and_text() {
        let headings = extract_headings("# Title\n\ntext\n  ### Deep ###\r\n");

        assert_eq!(headings.len(), 2);
        assert_eq!(headings[0].level, 1);
        assert_eq!(headings[0].raw_line, "# Title");
        assert_eq!(headings[1].raw_line, "  ### Deep ###");
        assert_eq!(headings[0].text, "Title");
        assert_eq!(headings[0].line, 1);
        assert_eq!(headings[1].level, 3);
        assert_eq!(headings[1].text, "Deep");
        assert_eq!(headings[1].anchor, "deep");
        assert_eq!(headings[1].line, 4);
    }

    #[test]
    fn test_trailing_hashes_stripped() {
        let headings = extract_headings("# C#\n## Notes ##\n");
        assert_eq!(headings[0].text, "C");
        assert_eq!(headings[0].anchor, "c");
        assert_eq!(headings[1].text, "Notes");
    }

    #[test]
    fn test_non_headings_ignored() {
        let text = "#hashtag\n####### seven\n#\n  ## Indented\n";
        let headings = extract_headings(text);
        assert_eq!(headings.len(), 1);
        assert_eq!(headings[0].text, "Indented");
    }

    #[test]
    fn test_duplicate_headings_disambiguated() {
        assert_eq!(anchors("## Sub\n## Sub\n"), vec!["sub", "sub-2"]);
    }

    #[test]
    fn test_explicit_id_counts_as_used() {
        let headings = extract_headings("## Setup {#Install}\n## Install\n");
        assert_eq!(headings[0].text, "Setup");
        assert_eq!(headings[0].anchor, "install");
        assert!(headings[0].explicit);
        assert_eq!(headings[1].anchor, "install-2");
    }

    #[test]
    fn test_fenced_code_is_not_scanned() {
        let text = "# Real\n```sh\n# comment\n```\n## After\n";
        assert_eq!(anchors(text), vec!["real", "after"]);
    }

    #[test]
    fn test_no_headings() {
        assert!(extract_headings("plain text\n").is_empty());
        assert!(extract_headings("").is_empty());
    }

    #[test]
    fn test_inject_heading_ids() {
        let text = "# Title\n\n## Sub\r\n## Sub {#custom}\n## Sub";
        assert_eq!(
            inject_heading_ids(text),
            "# Title {#title}\n\n## Sub {#sub}\r\n## Sub {#custom}\n## Sub {#sub-2}"
        );
    }

    #[test]
    fn test_inject_keeps_code_untouched() {
        let text = "~~~\n# code\n~~~\n";
        assert_eq!(inject_heading_ids(text), text);
    }

    #[test]
    fn test_inject_is_idempotent() {
        let once = inject_heading_ids("# A\n## A\n");
        assert_eq!(inject_heading_ids(&once), once);
    }

    #[test]
    fn test_index_spans_blocks() {
        let mut index = HeadingIndex::new();
        index.scan("# Intro\n", Some(0));
        index.scan("# Intro\n", Some(2));

        let headings = index.headings();
        assert_eq!(headings[0].block_index, Some(0));
        assert_eq!(headings[1].block_index, Some(2));
        assert_eq!(headings[1].anchor, "intro-2");
    }

    #[test]
    fn test_max_level_filters_but_reserves_anchor() {
        let mut index = HeadingIndex::with_max_level(2);
        index.scan("### Notes\n## Notes\n", None);

        let headings = index.into_headings();
        assert_eq!(headings.len(), 1);
        assert_eq!(headings[0].anchor, "notes-2");
    }

    #[test]
    fn test_heading_serializes_compactly() {
        let heading = &extract_headings("# Title")[0];
        let json = serde_json::to_value(heading).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "level": 1,
                "raw_line": "# Title",
                "text": "Title",
                "anchor": "title",
                "line": 1
            })
        );
    }
}
