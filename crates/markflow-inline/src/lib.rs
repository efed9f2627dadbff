//! Inline embedded blocks for markflow.
//!
//! Some embedded blocks belong inside the text flow, like a status badge in
//! the middle of a sentence. Marking one `<Composable inline>` makes
//! [`InlineEmbedPlugin`] hoist it to the front of the block list, leave a
//! `[cm-inline:<id>]` token where it was, and substitute the block's rendered
//! output for the token when the surrounding Markdown renders.

mod attrs;
mod placeholder;
mod plugin;
mod registry;
mod rewrite;
mod scan;

pub use attrs::{is_inline, parse_tag_attributes};
pub use placeholder::{
    PlaceholderPiece, has_placeholders, placeholder_id, placeholder_token, split_placeholders,
};
pub use plugin::{InlineConfig, InlineEmbedPlugin};
pub use registry::{InlineRenderRegistry, render_registry_key};
pub use rewrite::{INLINE_SLOTS, InlineRewrite, InlineSlotConfig, InlineSlots, rewrite_inline_blocks};
pub use scan::{Section, scan_sections};
