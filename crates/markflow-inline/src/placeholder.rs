//! Placeholder tokens.
//!
//! An inline block's position in Markdown text is marked with
//! `[cm-inline:<id>]`, where the id matches `[A-Za-z0-9_-]+`.

use std::sync::LazyLock;

use regex::Regex;

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[cm-inline:([A-Za-z0-9_-]+)\]").unwrap());

const TOKEN_PREFIX: &str = "[cm-inline:";

/// Placeholder id of the `n`-th inline block (1-based).
#[must_use]
pub fn placeholder_id(n: usize) -> String {
    format!("cm_inline_{n:03}")
}

/// Token marking placeholder `id` in Markdown text.
#[must_use]
pub fn placeholder_token(id: &str) -> String {
    format!("{TOKEN_PREFIX}{id}]")
}

/// Quick check for placeholder tokens.
#[must_use]
pub fn has_placeholders(text: &str) -> bool {
    text.contains(TOKEN_PREFIX) && PLACEHOLDER_RE.is_match(text)
}

/// Piece of text split at placeholder tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaceholderPiece<'a> {
    Text(&'a str),
    Placeholder(&'a str),
}

/// Split `text` into literal text and placeholder ids. Empty text pieces are
/// omitted.
#[must_use]
pub fn split_placeholders(text: &str) -> Vec<PlaceholderPiece<'_>> {
    let mut pieces = Vec::new();
    let mut last = 0;

    for caps in PLACEHOLDER_RE.captures_iter(text) {
        let (Some(token), Some(id)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if token.start() > last {
            pieces.push(PlaceholderPiece::Text(&text[last..token.start()]));
        }
        pieces.push(PlaceholderPiece::Placeholder(id.as_str()));
        last = token.end();
    }
    if last < text.len() {
        pieces.push(PlaceholderPiece::Text(&text[last..]));
    }

    pieces
}
