//! Stage payloads.
//!
//! Every pipeline subject is a [`StagedPayload`]: the invocation's shared
//! [`MetadataStore`] plus stage-specific data. Interceptors build a new payload
//! (usually with [`StagedPayload::with_data`]) and pass it on with
//! `proceed_with`.

use std::fmt;
use std::sync::Arc;

use markflow_pipeline::{MetadataStore, PipelineError};

use crate::block::{Attributes, BlockItem, Content};
use crate::render::Modifier;

/// Deferred render call producing the stage output.
pub type Thunk<O> = Arc<dyn Fn() -> Result<O, PipelineError> + Send + Sync>;

/// Stage data paired with the invocation's metadata.
#[derive(Clone, Debug)]
pub struct StagedPayload<T> {
    /// Metadata shared by all stages of the invocation.
    pub metadata: MetadataStore,
    /// Stage-specific data.
    pub data: T,
}

impl<T> StagedPayload<T> {
    /// Pair `data` with `metadata`.
    #[must_use]
    pub fn new(metadata: MetadataStore, data: T) -> Self {
        Self { metadata, data }
    }

    /// New payload with different data and the same metadata store.
    #[must_use]
    pub fn with_data<U>(&self, data: U) -> StagedPayload<U> {
        StagedPayload {
            metadata: self.metadata.clone(),
            data,
        }
    }

    /// Transform the data, keeping the metadata store.
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> StagedPayload<U> {
        StagedPayload {
            metadata: self.metadata,
            data: f(self.data),
        }
    }
}

/// Raw Markdown text before block splitting.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextSource {
    /// Document path, if known.
    pub path: Option<String>,
    /// Markdown source.
    pub source: String,
}

/// Full block list of a document.
///
/// `full_source` is the text the blocks were split from. Rewrites that change
/// block text without changing the document structure may leave it as is.
pub struct BlockList<O> {
    /// Document path, if known.
    pub path: Option<String>,
    /// Complete document source.
    pub full_source: String,
    /// Blocks in document order.
    pub blocks: Vec<BlockItem<O>>,
}

impl<O> Clone for BlockList<O> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            full_source: self.full_source.clone(),
            blocks: self.blocks.clone(),
        }
    }
}

impl<O> fmt::Debug for BlockList<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockList")
            .field("path", &self.path)
            .field("full_source", &self.full_source)
            .field("blocks", &self.blocks)
            .finish()
    }
}

impl<O> PartialEq for BlockList<O> {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
            && self.full_source == other.full_source
            && self.blocks == other.blocks
    }
}

/// Render context of one Markdown block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarkdownBlockContext {
    /// Presentation hints.
    pub modifier: Modifier,
    /// Block or document path.
    pub path: Option<String>,
    /// Markdown text to render.
    pub text: String,
    /// Position in the aggregate block list (`None` outside aggregate rendering).
    pub index: Option<usize>,
}

/// Render context of one embedded block.
pub struct ComposableBlockContext<O> {
    /// Presentation hints.
    pub modifier: Modifier,
    /// Block or document path.
    pub path: Option<String>,
    /// Source text of the embedded section.
    pub text: String,
    /// Attributes of the embedded section.
    pub attrs: Attributes,
    /// Position in the aggregate block list (`None` outside aggregate rendering).
    pub index: Option<usize>,
    /// Content producer.
    pub content: Content<O>,
}

impl<O> Clone for ComposableBlockContext<O> {
    fn clone(&self) -> Self {
        Self {
            modifier: self.modifier.clone(),
            path: self.path.clone(),
            text: self.text.clone(),
            attrs: self.attrs.clone(),
            index: self.index,
            content: Arc::clone(&self.content),
        }
    }
}

impl<O> fmt::Debug for ComposableBlockContext<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposableBlockContext")
            .field("modifier", &self.modifier)
            .field("path", &self.path)
            .field("text", &self.text)
            .field("attrs", &self.attrs)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

/// Render stage data: the stage input and the thunk producing its output.
pub struct RenderStage<I, O> {
    /// Input the thunk was built from.
    pub input: I,
    /// Deferred render call.
    pub render: Thunk<O>,
}

impl<I, O: 'static> RenderStage<I, O> {
    /// Pair an input with its render thunk.
    #[must_use]
    pub fn new(input: I, render: Thunk<O>) -> Self {
        Self { input, render }
    }

    /// Run the thunk.
    pub fn invoke(&self) -> Result<O, PipelineError> {
        (self.render)()
    }

    /// Copy of this stage whose thunk is `wrapper` applied to the current thunk.
    #[must_use]
    pub fn wrapped<F>(&self, wrapper: F) -> Self
    where
        I: Clone,
        F: Fn(&Thunk<O>) -> Result<O, PipelineError> + Send + Sync + 'static,
    {
        let inner = Arc::clone(&self.render);
        Self {
            input: self.input.clone(),
            render: Arc::new(move || wrapper(&inner)),
        }
    }

    /// Copy of this stage with a replacement thunk.
    #[must_use]
    pub fn with_render(&self, render: Thunk<O>) -> Self
    where
        I: Clone,
    {
        Self {
            input: self.input.clone(),
            render,
        }
    }
}

impl<I: Clone, O> Clone for RenderStage<I, O> {
    fn clone(&self) -> Self {
        Self {
            input: self.input.clone(),
            render: Arc::clone(&self.render),
        }
    }
}

impl<I: fmt::Debug, O> fmt::Debug for RenderStage<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderStage")
            .field("input", &self.input)
            .finish_non_exhaustive()
    }
}

/// Raw text pre-processing subject.
pub type TextPayload = StagedPayload<TextSource>;
/// Block list pre-processing subject.
pub type BlocksPayload<O> = StagedPayload<BlockList<O>>;
/// Markdown block pre-processing subject.
pub type MarkdownBlockPayload = StagedPayload<MarkdownBlockContext>;
/// Embedded block pre-processing subject.
pub type ComposableBlockPayload<O> = StagedPayload<ComposableBlockContext<O>>;
/// Markdown block render subject.
pub type MarkdownRenderPayload<O> = StagedPayload<RenderStage<MarkdownBlockContext, O>>;
/// Embedded block render subject.
pub type ComposableRenderPayload<O> = StagedPayload<RenderStage<ComposableBlockContext<O>, O>>;
/// Aggregate block render subject.
pub type BlocksRenderPayload<O> = StagedPayload<RenderStage<BlockList<O>, O>>;
