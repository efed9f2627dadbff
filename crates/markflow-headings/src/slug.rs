//! Anchor slugs.

use std::collections::HashSet;

/// Anchor used when a heading has no sluggable characters.
const FALLBACK_SLUG: &str = "section";

/// Convert heading text to an anchor slug.
///
/// Letters and digits are lower-cased and kept. Any run of whitespace, `-` or
/// `_` becomes a single `-`. Other characters are dropped. The result has no
/// leading or trailing `-`.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_dash = true;
        }
    }

    slug
}

/// Anchors already used in one document.
///
/// Comparison is case-insensitive.
#[derive(Debug, Default, Clone)]
pub struct AnchorSet {
    used: HashSet<String>,
}

impl AnchorSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an explicitly authored anchor as used and return it lower-cased.
    pub fn reserve(&mut self, anchor: &str) -> String {
        let anchor = anchor.to_lowercase();
        self.used.insert(anchor.clone());
        anchor
    }

    /// Claim a unique anchor for heading text.
    ///
    /// The first heading with a given slug gets the slug itself, later ones
    /// get `-2`, `-3`, ... appended.
    pub fn claim(&mut self, text: &str) -> String {
        let mut base = slugify(text);
        if base.is_empty() {
            FALLBACK_SLUG.clone_into(&mut base);
        }

        let mut anchor = base.clone();
        let mut n = 2;
        while self.contains(&anchor) {
            anchor = format!("{base}-{n}");
            n += 1;
        }
        self.used.insert(anchor.clone());
        anchor
    }

    /// Check whether `anchor` is used (case-insensitive).
    #[must_use]
    pub fn contains(&self, anchor: &str) -> bool {
        self.used.contains(&anchor.to_lowercase())
    }
}
