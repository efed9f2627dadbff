//! Terminal render capability.
//!
//! The host never builds UI itself. Every render stage ends in a call to a
//! [`Render`] implementation supplied by the embedding toolkit.

use std::collections::BTreeMap;

use crate::block::Content;

/// Presentation hints passed through to the renderer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Modifier {
    /// Style classes.
    pub classes: Vec<String>,
    /// Free-form presentation attributes.
    pub attributes: BTreeMap<String, String>,
}

impl Modifier {
    /// Create an empty modifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a style class.
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Set a presentation attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Piece of a Markdown block whose text contains inline placeholders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InlinePiece<O> {
    /// Markdown text between placeholders.
    Text(String),
    /// Rendered output registered for a placeholder.
    Child(O),
    /// Placeholder whose output has not been registered yet.
    Pending(String),
}

/// UI-producing capability wrapped by the render pipelines.
pub trait Render: Send + Sync + 'static {
    /// Rendered UI node.
    type Output: Clone + Send + Sync + 'static;

    /// Render Markdown text.
    fn render_raw_text(&self, modifier: &Modifier, path: Option<&str>, text: &str) -> Self::Output;

    /// Render an embedded fragment around caller-supplied content.
    fn render_fragment(
        &self,
        modifier: &Modifier,
        text: &str,
        content: &Content<Self::Output>,
    ) -> Self::Output;

    /// Compose rendered children into one node.
    fn compose(&self, modifier: &Modifier, children: Vec<Self::Output>) -> Self::Output;

    /// Placeholder shown while inline content is unavailable.
    fn loading(&self) -> Self::Output {
        self.compose(&Modifier::default(), Vec::new())
    }

    /// Render Markdown text interleaved with inline children.
    ///
    /// The default renders each text piece separately and composes the
    /// result; toolkits with real inline layout should override it.
    fn render_inline_text(
        &self,
        modifier: &Modifier,
        path: Option<&str>,
        pieces: Vec<InlinePiece<Self::Output>>,
    ) -> Self::Output {
        let children = pieces
            .into_iter()
            .map(|piece| match piece {
                InlinePiece::Text(text) => self.render_raw_text(modifier, path, &text),
                InlinePiece::Child(output) => output,
                InlinePiece::Pending(_) => self.loading(),
            })
            .collect();
        self.compose(modifier, children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockRender;

    #[test]
    fn test_modifier_builder() {
        let modifier = Modifier::new()
            .with_class("prose")
            .with_attribute("width", "full");
        assert_eq!(modifier.classes, vec!["prose"]);
        assert_eq!(modifier.attributes.get("width").map(String::as_str), Some("full"));
    }

    #[test]
    fn test_default_inline_text_composes_pieces() {
        let render = MockRender;
        let output = render.render_inline_text(
            &Modifier::default(),
            None,
            vec![
                InlinePiece::Text("Status ".to_owned()),
                InlinePiece::Child("badge".to_owned()),
                InlinePiece::Pending("cm_inline_002".to_owned()),
            ],
        );
        assert_eq!(output, "compose[md(Status ), badge, loading]");
    }
}
