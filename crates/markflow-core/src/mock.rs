//! String-producing renderer for tests.
//!
//! Output is a compact textual trace of the render calls:
//! `md(text)`, `md[path](text)`, `fragment(text|content)`, `compose[a, b]`
//! and `loading`.

use crate::block::Content;
use crate::render::{Modifier, Render};

/// Renderer that describes render calls as strings.
#[derive(Clone, Copy, Debug, Default)]
pub struct MockRender;

impl Render for MockRender {
    type Output = String;

    fn render_raw_text(&self, _modifier: &Modifier, path: Option<&str>, text: &str) -> String {
        match path {
            Some(path) => format!("md[{path}]({text})"),
            None => format!("md({text})"),
        }
    }

    fn render_fragment(&self, _modifier: &Modifier, text: &str, content: &Content<String>) -> String {
        format!("fragment({text}|{})", content())
    }

    fn compose(&self, _modifier: &Modifier, children: Vec<String>) -> String {
        format!("compose[{}]", children.join(", "))
    }

    fn loading(&self) -> String {
        "loading".to_owned()
    }
}
