//! Block list rewrite that hoists inline blocks.
//!
//! Inline blocks move to the front of the block list. Their original
//! positions become placeholder tokens in the surrounding Markdown, and
//! adjacent Markdown blocks are merged so the text around a placeholder
//! renders as one block.

use std::collections::HashMap;

use markflow_core::{Attributes, BlockItem, MarkdownBlock};
use markflow_pipeline::MetadataKey;
use serde::Serialize;

use crate::attrs::is_inline;
use crate::placeholder::{placeholder_id, placeholder_token};
use crate::scan::{Section, scan_sections};

/// Inline slots discovered in the rendered document.
pub const INLINE_SLOTS: MetadataKey<InlineSlots> = MetadataKey::new("inline_slots");

/// A hoisted inline block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InlineSlotConfig {
    /// Placeholder id.
    pub id: String,
    /// Attributes of the embedded block.
    pub attrs: Attributes,
    /// Position of the block among the hoisted blocks, which is also its index
    /// in the rewritten block list.
    pub block_index: usize,
}

/// Inline slots by placeholder id and in discovery order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct InlineSlots {
    ordered: Vec<InlineSlotConfig>,
    #[serde(skip)]
    by_id: HashMap<String, usize>,
}

impl InlineSlots {
    fn push(&mut self, slot: InlineSlotConfig) {
        self.by_id.insert(slot.id.clone(), self.ordered.len());
        self.ordered.push(slot);
    }

    /// Slot for placeholder `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&InlineSlotConfig> {
        self.by_id.get(id).map(|&i| &self.ordered[i])
    }

    /// Slot of the block at `block_index` of the rewritten list.
    #[must_use]
    pub fn at_block(&self, block_index: usize) -> Option<&InlineSlotConfig> {
        self.ordered.get(block_index).filter(|slot| slot.block_index == block_index)
    }

    /// Slots in discovery order.
    #[must_use]
    pub fn ordered(&self) -> &[InlineSlotConfig] {
        &self.ordered
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

/// Rewritten block list and its slots.
#[derive(Debug)]
pub struct InlineRewrite<O> {
    pub blocks: Vec<BlockItem<O>>,
    pub slots: InlineSlots,
}

/// Output under construction: hoisted inline blocks and the positional rest.
struct Weaver<O> {
    hoisted: Vec<BlockItem<O>>,
    body: Vec<BlockItem<O>>,
    slots: InlineSlots,
    /// Body index of the last emitted Markdown block.
    last_markdown: Option<usize>,
    /// Whether the last emission can absorb following Markdown.
    merge: bool,
}

impl<O> Weaver<O> {
    fn new() -> Self {
        Self {
            hoisted: Vec::new(),
            body: Vec::new(),
            slots: InlineSlots::default(),
            last_markdown: None,
            merge: false,
        }
    }

    fn markdown(&mut self, block: &MarkdownBlock) {
        if self.merge
            && let Some(BlockItem::Markdown(last)) = self.body.last_mut()
        {
            last.text.push_str(&block.text);
            return;
        }
        self.body.push(BlockItem::Markdown(block.clone()));
        self.last_markdown = Some(self.body.len() - 1);
        self.merge = true;
    }

    fn block(&mut self, block: &BlockItem<O>) {
        self.body.push(block.clone());
        self.merge = false;
    }

    /// Hoist `block` and leave its placeholder in the last Markdown block, or
    /// in a new leading one when no Markdown was emitted yet.
    fn inline(&mut self, block: &BlockItem<O>, attrs: Attributes) {
        let id = placeholder_id(self.slots.len() + 1);
        let token = placeholder_token(&id);

        match self.last_markdown.and_then(|index| self.body.get_mut(index)) {
            Some(BlockItem::Markdown(target)) => target.text.push_str(&token),
            _ => {
                self.body
                    .insert(0, BlockItem::markdown(token, block.path().map(ToOwned::to_owned)));
                self.last_markdown = Some(0);
                self.merge = self.body.len() == 1;
            }
        }

        self.slots.push(InlineSlotConfig {
            id,
            attrs,
            block_index: self.hoisted.len(),
        });
        self.hoisted.push(block.clone());
    }

    fn finish(mut self) -> InlineRewrite<O> {
        self.hoisted.append(&mut self.body);
        InlineRewrite {
            blocks: self.hoisted,
            slots: self.slots,
        }
    }
}

/// Hoist the inline blocks of a document.
///
/// `full_source` is scanned for embedded sections and walked in step with
/// `blocks`, whose text is kept. Returns `None` when the document has no
/// inline section or when the scan does not line up with the block list.
#[must_use]
pub fn rewrite_inline_blocks<O>(
    full_source: &str,
    blocks: &[BlockItem<O>],
) -> Option<InlineRewrite<O>> {
    let sections = scan_sections(full_source);
    if !sections.iter().any(Section::is_inline) {
        return None;
    }

    let mut weaver = Weaver::new();
    for (position, (section, block)) in sections.iter().zip(blocks).enumerate() {
        match (section, block) {
            (Section::Markdown(_), BlockItem::Markdown(markdown)) => weaver.markdown(markdown),
            (Section::Composable { attrs, .. }, BlockItem::Composable(composable)) => {
                let attrs = if composable.attrs.is_empty() {
                    attrs.clone()
                } else {
                    composable.attrs.clone()
                };
                if is_inline(&attrs) {
                    weaver.inline(block, attrs);
                } else {
                    weaver.block(block);
                }
            }
            _ => {
                tracing::warn!(
                    position,
                    sections = sections.len(),
                    blocks = blocks.len(),
                    "Embedded sections do not match block list, skipping inline rewrite"
                );
                return None;
            }
        }
    }

    for block in blocks.iter().skip(sections.len()) {
        match block {
            BlockItem::Markdown(markdown) => weaver.markdown(markdown),
            BlockItem::Composable(_) => weaver.block(block),
        }
    }

    let rewrite = weaver.finish();
    tracing::debug!(slots = rewrite.slots.len(), "Hoisted inline blocks");
    Some(rewrite)
}
