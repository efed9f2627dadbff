//! Attribute scanner for embedded block tags.
//!
//! Parses the attribute part of `<Composable inline kind="badge" size=small>`.
//! This is a small scanner, not an HTML parser: no entities, no escapes.

use markflow_core::{Attributes, attr};

/// Value recorded for a bare key.
const BARE_VALUE: &str = "true";

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':' | '.')
}

/// Parse tag attributes.
///
/// Supports `key`, `key="value"`, `key='value'` and `key=value`. A bare key
/// maps to `"true"`. An unterminated quote runs to the end of the input.
/// Characters that cannot start a key are skipped.
#[must_use]
pub fn parse_tag_attributes(input: &str) -> Attributes {
    let mut attrs = Attributes::new();
    let mut remaining = input;

    loop {
        remaining = remaining.trim_start_matches(|c: char| c.is_whitespace() || c == '/');
        let Some(first) = remaining.chars().next() else {
            break;
        };

        let key_len = remaining.find(|c: char| !is_key_char(c)).unwrap_or(remaining.len());
        if key_len == 0 {
            remaining = &remaining[first.len_utf8()..];
            continue;
        }
        let key = &remaining[..key_len];
        let after_key = remaining[key_len..].trim_start();

        let Some(after_eq) = after_key.strip_prefix('=') else {
            attrs.insert(key.to_owned(), Some(BARE_VALUE.to_owned()));
            remaining = after_key;
            continue;
        };
        let (value, rest) = parse_value(after_eq.trim_start());
        attrs.insert(key.to_owned(), Some(value.to_owned()));
        remaining = rest;
    }

    attrs
}

/// Split a value off the front of `s`: quoted, or up to the next whitespace.
fn parse_value(s: &str) -> (&str, &str) {
    for quote in ['"', '\''] {
        if let Some(quoted) = s.strip_prefix(quote) {
            return match quoted.find(quote) {
                Some(end) => (&quoted[..end], &quoted[end + 1..]),
                None => (quoted, ""),
            };
        }
    }
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    (&s[..end], &s[end..])
}

/// Check whether attributes mark a block as inline.
///
/// A bare `inline` key or `inline="true"` (any case) counts.
#[must_use]
pub fn is_inline(attrs: &Attributes) -> bool {
    match attr(attrs, "inline") {
        Some(None) => true,
        Some(Some(value)) => value.eq_ignore_ascii_case(BARE_VALUE),
        None => false,
    }
}
