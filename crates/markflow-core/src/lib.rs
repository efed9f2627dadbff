//! Staged Markdown rendering host.
//!
//! A [`MarkdownHost`] owns seven stage pipelines and a terminal [`Render`]
//! implementation. Plugins register interceptors on the pipelines to rewrite
//! text and blocks before rendering, share data through the invocation's
//! metadata store, and wrap the render thunks of each stage.
//!
//! # Example
//!
//! ```
//! use markflow_core::{Content, MarkdownHost, Modifier, Render};
//! use markflow_pipeline::Priority;
//!
//! struct Plain;
//!
//! impl Render for Plain {
//!     type Output = String;
//!
//!     fn render_raw_text(&self, _: &Modifier, _: Option<&str>, text: &str) -> String {
//!         text.to_owned()
//!     }
//!
//!     fn render_fragment(&self, _: &Modifier, _: &str, content: &Content<String>) -> String {
//!         content()
//!     }
//!
//!     fn compose(&self, _: &Modifier, children: Vec<String>) -> String {
//!         children.concat()
//!     }
//! }
//!
//! let mut host = MarkdownHost::new(Plain);
//! host.pipelines_mut().text.intercept(Priority::Normal, 0, |ctx| {
//!     let mut source = ctx.subject().data.clone();
//!     source.source = source.source.trim().to_owned();
//!     let next = ctx.subject().with_data(source);
//!     ctx.proceed_with(next)
//! });
//!
//! let outcome = host.render_document(&Modifier::default(), None, "  # Hi  ").unwrap();
//! assert_eq!(outcome.output, "# Hi");
//! ```

mod block;
mod host;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
mod plugin;
mod render;
mod stage;

pub use block::{Attributes, BlockItem, ComposableBlock, Content, MarkdownBlock, attr};
pub use host::{MarkdownHost, Pipelines, RenderOutcome};
pub use plugin::{FnPlugin, Plugin};
pub use render::{InlinePiece, Modifier, Render};
pub use stage::{
    BlockList, BlocksPayload, BlocksRenderPayload, ComposableBlockContext, ComposableBlockPayload,
    ComposableRenderPayload, MarkdownBlockContext, MarkdownBlockPayload, MarkdownRenderPayload,
    RenderStage, StagedPayload, TextPayload, TextSource, Thunk,
};
