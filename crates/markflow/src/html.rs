//! HTML renderer backed by pulldown-cmark.

use markflow_core::{Content, InlinePiece, Modifier, Render};
use pulldown_cmark::{Options, Parser, html};

/// Private-use character delimiting inline child markers.
const INLINE_MARK: char = '\u{E000}';

/// Renders documents to HTML strings.
///
/// Markdown goes through pulldown-cmark with heading attributes enabled, so
/// `{#id}` anchors written by the headings plugin become `id` attributes.
/// A non-empty [`Modifier`] wraps the output in a `<div>` carrying its
/// classes and attributes.
#[derive(Clone, Copy, Debug)]
pub struct HtmlRender {
    gfm: bool,
}

impl Default for HtmlRender {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlRender {
    /// Create a renderer with GitHub Flavored Markdown enabled.
    #[must_use]
    pub fn new() -> Self {
        Self { gfm: true }
    }

    /// Enable or disable GitHub Flavored Markdown features.
    ///
    /// GFM is enabled by default. When enabled, the parser supports:
    /// - Tables
    /// - Strikethrough (`~~text~~`)
    /// - Task lists (`- [ ] item`)
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    /// Get parser options based on GFM configuration.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        let options = Options::ENABLE_HEADING_ATTRIBUTES;
        if self.gfm {
            options
                | Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_GFM
        } else {
            options
        }
    }

    fn markdown_to_html(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.parser_options());
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}

impl Render for HtmlRender {
    type Output = String;

    fn render_raw_text(&self, modifier: &Modifier, _path: Option<&str>, text: &str) -> String {
        wrap(modifier, self.markdown_to_html(text))
    }

    fn render_fragment(&self, modifier: &Modifier, _text: &str, content: &Content<String>) -> String {
        wrap(modifier, content())
    }

    fn compose(&self, modifier: &Modifier, children: Vec<String>) -> String {
        wrap(modifier, children.concat())
    }

    fn loading(&self) -> String {
        r#"<span class="markflow-loading"></span>"#.to_owned()
    }

    /// Renders the text pieces as one Markdown document and splices the
    /// children into the resulting HTML, so they stay inside their paragraph.
    fn render_inline_text(
        &self,
        modifier: &Modifier,
        _path: Option<&str>,
        pieces: Vec<InlinePiece<String>>,
    ) -> String {
        let mut source = String::new();
        let mut children = Vec::new();
        for piece in pieces {
            match piece {
                InlinePiece::Text(text) => {
                    source.extend(text.chars().filter(|&c| c != INLINE_MARK));
                }
                InlinePiece::Child(output) => {
                    source.push_str(&marker(children.len()));
                    children.push(output);
                }
                InlinePiece::Pending(_) => {
                    source.push_str(&marker(children.len()));
                    children.push(self.loading());
                }
            }
        }

        let mut out = self.markdown_to_html(&source);
        for (i, child) in children.iter().enumerate() {
            out = out.replacen(&marker(i), child, 1);
        }
        wrap(modifier, out)
    }
}

fn marker(index: usize) -> String {
    format!("{INLINE_MARK}{index}{INLINE_MARK}")
}

/// Wrap `inner` in a `<div>` when the modifier carries anything.
fn wrap(modifier: &Modifier, inner: String) -> String {
    if modifier.classes.is_empty() && modifier.attributes.is_empty() {
        return inner;
    }

    let mut out = String::from("<div");
    if !modifier.classes.is_empty() {
        out.push_str(" class=\"");
        out.push_str(&escape_html(&modifier.classes.join(" ")));
        out.push('"');
    }
    for (key, value) in &modifier.attributes {
        out.push(' ');
        out.push_str(&escape_html(key));
        out.push_str("=\"");
        out.push_str(&escape_html(value));
        out.push('"');
    }
    out.push('>');
    out.push_str(&inner);
    out.push_str("</div>");
    out
}

fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;

    fn render(text: &str) -> String {
        HtmlRender::new().render_raw_text(&Modifier::default(), None, text)
    }

    #[test]
    fn test_render_paragraph() {
        assert_eq!(render("Hello *world*"), "<p>Hello <em>world</em></p>\n");
    }

    #[test]
    fn test_heading_attributes_become_ids() {
        assert_eq!(render("# Intro {#intro}"), "<h1 id=\"intro\">Intro</h1>\n");
    }

    #[test]
    fn test_gfm_strikethrough() {
        assert_eq!(render("~~gone~~"), "<p><del>gone</del></p>\n");
    }

    #[test]
    fn test_gfm_disabled() {
        let html = HtmlRender::new()
            .with_gfm(false)
            .render_raw_text(&Modifier::default(), None, "~~kept~~");
        assert_eq!(html, "<p>~~kept~~</p>\n");
    }

    #[test]
    fn test_modifier_wraps_output() {
        let modifier = Modifier::new()
            .with_class("prose")
            .with_attribute("data-kind", "a\"b");
        let html = HtmlRender::new().compose(&modifier, vec!["<p>x</p>".to_owned()]);
        assert_eq!(
            html,
            "<div class=\"prose\" data-kind=\"a&quot;b\"><p>x</p></div>"
        );
    }

    #[test]
    fn test_fragment_renders_content() {
        let content: Content<String> = Arc::new(|| "<button>Go</button>".to_owned());
        let html = HtmlRender::new().render_fragment(&Modifier::default(), "<Composable/>", &content);
        assert_eq!(html, "<button>Go</button>");
    }

    #[test]
    fn test_marker_lookalike_in_text_is_not_spliced() {
        let html = HtmlRender::new().render_inline_text(
            &Modifier::default(),
            None,
            vec![
                InlinePiece::Text(format!("x {INLINE_MARK}0{INLINE_MARK} y ")),
                InlinePiece::Child("<b>ok</b>".to_owned()),
            ],
        );
        assert_eq!(html, "<p>x 0 y <b>ok</b></p>\n");
    }

    #[test]
    fn test_inline_children_stay_in_paragraph() {
        let html = HtmlRender::new().render_inline_text(
            &Modifier::default(),
            None,
            vec![
                InlinePiece::Text("Status: ".to_owned()),
                InlinePiece::Child("<b>ok</b>".to_owned()),
                InlinePiece::Text(" and ".to_owned()),
                InlinePiece::Pending("cm_inline_002".to_owned()),
            ],
        );
        assert_eq!(
            html,
            "<p>Status: <b>ok</b> and <span class=\"markflow-loading\"></span></p>\n"
        );
    }
}
