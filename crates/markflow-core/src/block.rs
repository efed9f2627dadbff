//! Document blocks.
//!
//! A document is a sequence of [`BlockItem`]s: Markdown text spans and
//! embedded UI-producing spans. Blocks are immutable; rewrites produce new
//! blocks.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Attribute mapping of an embedded block (`key` → optional value).
pub type Attributes = BTreeMap<String, Option<String>>;

/// Producer of an embedded block's rendered content.
pub type Content<O> = Arc<dyn Fn() -> O + Send + Sync>;

/// Markdown text span.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarkdownBlock {
    /// Markdown source text.
    pub text: String,
    /// Explicit source path, if the block came from a separate file.
    pub path: Option<String>,
}

/// Embedded UI-producing span.
pub struct ComposableBlock<O> {
    /// Source text of the embedded section.
    pub text: String,
    /// Explicit source path.
    pub path: Option<String>,
    /// Attributes parsed from the opening tag.
    pub attrs: Attributes,
    /// Rendered content producer.
    pub content: Content<O>,
}

impl<O> Clone for ComposableBlock<O> {
    fn clone(&self) -> Self {
        Self {
            text: self.text.clone(),
            path: self.path.clone(),
            attrs: self.attrs.clone(),
            content: Arc::clone(&self.content),
        }
    }
}

impl<O> fmt::Debug for ComposableBlock<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposableBlock")
            .field("text", &self.text)
            .field("path", &self.path)
            .field("attrs", &self.attrs)
            .finish_non_exhaustive()
    }
}

impl<O> PartialEq for ComposableBlock<O> {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
            && self.path == other.path
            && self.attrs == other.attrs
            && Arc::ptr_eq(&self.content, &other.content)
    }
}

/// A unit of document content.
pub enum BlockItem<O> {
    /// Markdown text.
    Markdown(MarkdownBlock),
    /// Embedded UI block.
    Composable(ComposableBlock<O>),
}

impl<O> BlockItem<O> {
    /// Create a Markdown block.
    #[must_use]
    pub fn markdown(text: impl Into<String>, path: Option<String>) -> Self {
        Self::Markdown(MarkdownBlock {
            text: text.into(),
            path,
        })
    }

    /// Create an embedded block.
    #[must_use]
    pub fn composable<F>(
        text: impl Into<String>,
        path: Option<String>,
        attrs: Attributes,
        content: F,
    ) -> Self
    where
        F: Fn() -> O + Send + Sync + 'static,
    {
        Self::Composable(ComposableBlock {
            text: text.into(),
            path,
            attrs,
            content: Arc::new(content),
        })
    }

    /// Source text.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Markdown(block) => &block.text,
            Self::Composable(block) => &block.text,
        }
    }

    /// Explicit source path.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Markdown(block) => block.path.as_deref(),
            Self::Composable(block) => block.path.as_deref(),
        }
    }

    /// Attributes of an embedded block (`None` for Markdown).
    #[must_use]
    pub fn attrs(&self) -> Option<&Attributes> {
        match self {
            Self::Markdown(_) => None,
            Self::Composable(block) => Some(&block.attrs),
        }
    }

    /// Check if this is a Markdown block.
    #[must_use]
    pub fn is_markdown(&self) -> bool {
        matches!(self, Self::Markdown(_))
    }

    /// Copy of this block with different source text.
    #[must_use]
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        match self {
            Self::Markdown(block) => Self::Markdown(MarkdownBlock {
                text: text.into(),
                path: block.path.clone(),
            }),
            Self::Composable(block) => Self::Composable(ComposableBlock {
                text: text.into(),
                ..block.clone()
            }),
        }
    }
}

impl<O> Clone for BlockItem<O> {
    fn clone(&self) -> Self {
        match self {
            Self::Markdown(block) => Self::Markdown(block.clone()),
            Self::Composable(block) => Self::Composable(block.clone()),
        }
    }
}

impl<O> fmt::Debug for BlockItem<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Markdown(block) => f.debug_tuple("Markdown").field(block).finish(),
            Self::Composable(block) => f.debug_tuple("Composable").field(block).finish(),
        }
    }
}

impl<O> PartialEq for BlockItem<O> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Markdown(a), Self::Markdown(b)) => a == b,
            (Self::Composable(a), Self::Composable(b)) => a == b,
            _ => false,
        }
    }
}

/// Look up an attribute, treating a bare key as present with no value.
#[must_use]
pub fn attr<'a>(attrs: &'a Attributes, key: &str) -> Option<Option<&'a str>> {
    attrs.get(key).map(Option::as_deref)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn badge() -> BlockItem<String> {
        let mut attrs = Attributes::new();
        attrs.insert("inline".to_owned(), Some("true".to_owned()));
        BlockItem::composable("<Composable inline>", None, attrs, || "badge".to_owned())
    }

    #[test]
    fn test_markdown_accessors() {
        let block: BlockItem<String> = BlockItem::markdown("# Title", Some("guide.md".to_owned()));
        assert_eq!(block.text(), "# Title");
        assert_eq!(block.path(), Some("guide.md"));
        assert!(block.attrs().is_none());
        assert!(block.is_markdown());
    }

    #[test]
    fn test_composable_accessors() {
        let block = badge();
        assert!(!block.is_markdown());
        assert_eq!(block.path(), None);
        let attrs = block.attrs().unwrap();
        assert_eq!(attr(attrs, "inline"), Some(Some("true")));
        assert_eq!(attr(attrs, "missing"), None);
    }

    #[test]
    fn test_with_text_keeps_other_fields() {
        let block = badge();
        let renamed = block.with_text("<Composable inline=true>");
        assert_eq!(renamed.text(), "<Composable inline=true>");
        assert_eq!(renamed.attrs(), block.attrs());
        let BlockItem::Composable(inner) = &renamed else {
            panic!("expected composable");
        };
        assert_eq!((inner.content)(), "badge");
    }

    #[test]
    fn test_equality_compares_content_identity() {
        let block = badge();
        assert_eq!(block, block.clone());
        assert_ne!(block, badge());
        assert_ne!(block, BlockItem::markdown("<Composable inline>", None));
    }

    #[test]
    fn test_debug_omits_content() {
        let debug = format!("{:?}", badge());
        assert!(debug.starts_with("Composable(ComposableBlock {"));
        assert!(debug.contains(".."));
    }
}
