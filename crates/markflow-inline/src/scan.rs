//! Section scanner.
//!
//! Splits a document source into Markdown text and embedded
//! `<Composable ...>...</Composable>` sections. Embedded sections do not nest.

use markflow_core::Attributes;

use crate::attrs::{is_inline, parse_tag_attributes};

const OPEN_TAG: &str = "<Composable";
const CLOSE_TAG: &str = "</Composable>";

/// One section of a scanned document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Section {
    /// Markdown text between embedded sections.
    Markdown(String),
    /// Embedded block, tags included.
    Composable {
        text: String,
        attrs: Attributes,
    },
}

impl Section {
    /// Check whether this is an embedded section marked inline.
    #[must_use]
    pub fn is_inline(&self) -> bool {
        match self {
            Self::Markdown(_) => false,
            Self::Composable { attrs, .. } => is_inline(attrs),
        }
    }
}

/// Split `source` into sections.
///
/// Text sections and embedded sections alternate; only empty text between
/// two adjacent embedded sections is left out. A start tag without a matching
/// end is left as Markdown text.
#[must_use]
pub fn scan_sections(source: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut rest = source;

    while let Some(open) = find_open_tag(rest) {
        let Some(tag_end) = find_tag_end(&rest[open..]).map(|i| open + i) else {
            break;
        };
        let self_closing = rest[..tag_end].ends_with('/');
        let section_end = if self_closing {
            tag_end + 1
        } else {
            match rest[tag_end..].find(CLOSE_TAG) {
                Some(close) => tag_end + close + CLOSE_TAG.len(),
                None => break,
            }
        };

        push_markdown(&mut sections, &rest[..open]);
        let tag_body = &rest[open + OPEN_TAG.len()..tag_end];
        sections.push(Section::Composable {
            text: rest[open..section_end].to_owned(),
            attrs: parse_tag_attributes(tag_body),
        });
        rest = &rest[section_end..];
    }

    push_markdown(&mut sections, rest);
    sections
}

/// Offset of the next `<Composable` that is a whole tag name.
fn find_open_tag(text: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(found) = text[from..].find(OPEN_TAG) {
        let start = from + found;
        let after = text[start + OPEN_TAG.len()..].chars().next();
        if after.is_none_or(|c| c.is_whitespace() || c == '>' || c == '/') {
            return Some(start);
        }
        from = start + OPEN_TAG.len();
    }
    None
}

/// Offset of the `>` closing a start tag, skipping quoted attribute values.
fn find_tag_end(tag: &str) -> Option<usize> {
    let mut quote = None;
    for (i, c) in tag.char_indices() {
        match (quote, c) {
            (Some(open), _) if c == open => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return Some(i),
            (None, _) => {}
        }
    }
    None
}

fn push_markdown(sections: &mut Vec<Section>, text: &str) {
    if !text.is_empty() {
        sections.push(Section::Markdown(text.to_owned()));
    }
}
