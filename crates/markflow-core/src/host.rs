//! Document host: stage pipelines and render entry points.
//!
//! # Stages
//!
//! | Pipeline | Subject |
//! |---|---|
//! | `text` | raw Markdown before block splitting |
//! | `blocks` | full block list of a document |
//! | `markdown_block` | one Markdown block's render context |
//! | `composable_block` | one embedded block's render context |
//! | `markdown_render` | render thunk of one Markdown block |
//! | `composable_render` | render thunk of one embedded block |
//! | `blocks_render` | render thunk of the whole block sequence |
//!
//! Every entry point creates one [`MetadataStore`], threads it through the
//! pre-process and render stages, and returns a frozen snapshot of it with
//! the output.

use std::sync::Arc;

use markflow_pipeline::{MetadataSnapshot, MetadataStore, Pipeline, PipelineError};

use crate::block::{Attributes, BlockItem, Content};
use crate::plugin::Plugin;
use crate::render::{Modifier, Render};
use crate::stage::{
    BlockList, BlocksPayload, BlocksRenderPayload, ComposableBlockContext, ComposableBlockPayload,
    ComposableRenderPayload, MarkdownBlockContext, MarkdownBlockPayload, MarkdownRenderPayload,
    RenderStage, StagedPayload, TextPayload, TextSource, Thunk,
};

/// The stage pipelines of a host.
pub struct Pipelines<O> {
    /// Raw text pre-processing.
    pub text: Pipeline<TextPayload>,
    /// Block list pre-processing.
    pub blocks: Pipeline<BlocksPayload<O>>,
    /// Markdown block pre-processing.
    pub markdown_block: Pipeline<MarkdownBlockPayload>,
    /// Embedded block pre-processing.
    pub composable_block: Pipeline<ComposableBlockPayload<O>>,
    /// Markdown block rendering.
    pub markdown_render: Pipeline<MarkdownRenderPayload<O>>,
    /// Embedded block rendering.
    pub composable_render: Pipeline<ComposableRenderPayload<O>>,
    /// Aggregate block rendering.
    pub blocks_render: Pipeline<BlocksRenderPayload<O>>,
}

impl<O> Pipelines<O> {
    fn new() -> Self {
        Self {
            text: Pipeline::new("text"),
            blocks: Pipeline::new("blocks"),
            markdown_block: Pipeline::new("markdown_block"),
            composable_block: Pipeline::new("composable_block"),
            markdown_render: Pipeline::new("markdown_render"),
            composable_render: Pipeline::new("composable_render"),
            blocks_render: Pipeline::new("blocks_render"),
        }
    }
}

impl<O> Clone for Pipelines<O> {
    fn clone(&self) -> Self {
        Self {
            text: self.text.clone(),
            blocks: self.blocks.clone(),
            markdown_block: self.markdown_block.clone(),
            composable_block: self.composable_block.clone(),
            markdown_render: self.markdown_render.clone(),
            composable_render: self.composable_render.clone(),
            blocks_render: self.blocks_render.clone(),
        }
    }
}

/// Output of a render entry point.
#[derive(Clone, Debug)]
pub struct RenderOutcome<O> {
    /// Rendered UI node.
    pub output: O,
    /// Metadata produced during the invocation.
    pub metadata: MetadataSnapshot,
}

/// Host owning the stage pipelines and the terminal renderer.
///
/// Plugins are installed with [`install`](Self::install) before rendering.
/// Rendering takes `&self`, so a configured host can be shared.
pub struct MarkdownHost<R: Render> {
    renderer: Arc<R>,
    pipelines: Arc<Pipelines<R::Output>>,
    plugins: Vec<String>,
}

impl<R: Render> MarkdownHost<R> {
    /// Create a host without plugins.
    #[must_use]
    pub fn new(renderer: R) -> Self {
        Self::from_arc(Arc::new(renderer))
    }

    /// Create a host around a shared renderer.
    #[must_use]
    pub fn from_arc(renderer: Arc<R>) -> Self {
        Self {
            renderer,
            pipelines: Arc::new(Pipelines::new()),
            plugins: Vec::new(),
        }
    }

    /// Terminal renderer.
    #[must_use]
    pub fn renderer(&self) -> &Arc<R> {
        &self.renderer
    }

    /// Stage pipelines.
    #[must_use]
    pub fn pipelines(&self) -> &Pipelines<R::Output> {
        &self.pipelines
    }

    /// Stage pipelines for registering interceptors.
    pub fn pipelines_mut(&mut self) -> &mut Pipelines<R::Output> {
        Arc::make_mut(&mut self.pipelines)
    }

    /// Names of installed plugins in installation order.
    #[must_use]
    pub fn plugins(&self) -> &[String] {
        &self.plugins
    }

    /// Install a plugin.
    ///
    /// Builds the plugin's default configuration, applies `configure` to it,
    /// then lets the plugin register its interceptors with that configuration.
    pub fn install<P, F>(&mut self, plugin: &P, configure: F) -> &mut Self
    where
        P: Plugin<R>,
        F: FnOnce(&mut P::Config),
    {
        let mut config = plugin.default_config();
        configure(&mut config);
        tracing::debug!(plugin = plugin.name(), "Installing plugin");
        plugin.register(self, config);
        self.plugins.push(plugin.name().to_owned());
        self
    }

    /// Render a Markdown document as a single block.
    ///
    /// Runs `text`, then `markdown_block`, then `markdown_render`, and invokes
    /// the resulting thunk.
    pub fn render_document(
        &self,
        modifier: &Modifier,
        path: Option<&str>,
        source: &str,
    ) -> Result<RenderOutcome<R::Output>, PipelineError> {
        tracing::debug!(path = ?path, len = source.len(), "Rendering document");

        let payload = StagedPayload::new(
            MetadataStore::new(),
            TextSource {
                path: path.map(ToOwned::to_owned),
                source: source.to_owned(),
            },
        );
        let text = self.pipelines.text.execute(payload)?;
        let metadata = text.metadata.clone();

        let context = MarkdownBlockContext {
            modifier: modifier.clone(),
            path: text.data.path.clone(),
            text: text.data.source.clone(),
            index: None,
        };
        let output =
            render_markdown_block(&self.pipelines, &self.renderer, text.with_data(context))?;

        Ok(RenderOutcome {
            output,
            metadata: metadata.snapshot(),
        })
    }

    /// Render an embedded fragment around caller-supplied content.
    ///
    /// Runs `composable_block`, then `composable_render`, and invokes the
    /// resulting thunk.
    pub fn render_fragment(
        &self,
        modifier: &Modifier,
        source: &str,
        content: Content<R::Output>,
    ) -> Result<RenderOutcome<R::Output>, PipelineError> {
        tracing::debug!(len = source.len(), "Rendering fragment");

        let metadata = MetadataStore::new();
        let context = ComposableBlockContext {
            modifier: modifier.clone(),
            path: None,
            text: source.to_owned(),
            attrs: Attributes::new(),
            index: None,
            content,
        };
        let output = render_composable_block(
            &self.pipelines,
            &self.renderer,
            StagedPayload::new(metadata.clone(), context),
        )?;

        Ok(RenderOutcome {
            output,
            metadata: metadata.snapshot(),
        })
    }

    /// Render a document split into blocks.
    ///
    /// Runs `blocks`, then `blocks_render` around a thunk that renders every
    /// block through its per-block stages and composes the results. An empty
    /// block list renders as an empty composition.
    pub fn render_blocks(
        &self,
        modifier: &Modifier,
        path: Option<&str>,
        full_source: &str,
        blocks: Vec<BlockItem<R::Output>>,
    ) -> Result<RenderOutcome<R::Output>, PipelineError> {
        tracing::debug!(path = ?path, blocks = blocks.len(), "Rendering block list");

        let payload = StagedPayload::new(
            MetadataStore::new(),
            BlockList {
                path: path.map(ToOwned::to_owned),
                full_source: full_source.to_owned(),
                blocks,
            },
        );
        let list = self.pipelines.blocks.execute(payload)?;
        let metadata = list.metadata.clone();

        let thunk: Thunk<R::Output> = {
            let pipelines = Arc::clone(&self.pipelines);
            let renderer = Arc::clone(&self.renderer);
            let metadata = metadata.clone();
            let modifier = modifier.clone();
            let list = list.data.clone();
            Arc::new(move || {
                let children = list
                    .blocks
                    .iter()
                    .enumerate()
                    .map(|(index, block)| {
                        render_block(
                            &pipelines,
                            &renderer,
                            &metadata,
                            &modifier,
                            list.path.as_deref(),
                            index,
                            block,
                        )
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(renderer.compose(&modifier, children))
            })
        };

        let staged = list.map(|data| RenderStage::new(data, thunk));
        let staged = self.pipelines.blocks_render.execute(staged)?;
        let output = staged.data.invoke()?;

        Ok(RenderOutcome {
            output,
            metadata: metadata.snapshot(),
        })
    }
}

fn render_block<R: Render>(
    pipelines: &Pipelines<R::Output>,
    renderer: &Arc<R>,
    metadata: &MetadataStore,
    modifier: &Modifier,
    document_path: Option<&str>,
    index: usize,
    block: &BlockItem<R::Output>,
) -> Result<R::Output, PipelineError> {
    let path = block.path().or(document_path).map(ToOwned::to_owned);
    match block {
        BlockItem::Markdown(markdown) => {
            let context = MarkdownBlockContext {
                modifier: modifier.clone(),
                path,
                text: markdown.text.clone(),
                index: Some(index),
            };
            render_markdown_block(
                pipelines,
                renderer,
                StagedPayload::new(metadata.clone(), context),
            )
        }
        BlockItem::Composable(composable) => {
            let context = ComposableBlockContext {
                modifier: modifier.clone(),
                path,
                text: composable.text.clone(),
                attrs: composable.attrs.clone(),
                index: Some(index),
                content: Arc::clone(&composable.content),
            };
            render_composable_block(
                pipelines,
                renderer,
                StagedPayload::new(metadata.clone(), context),
            )
        }
    }
}

fn render_markdown_block<R: Render>(
    pipelines: &Pipelines<R::Output>,
    renderer: &Arc<R>,
    payload: MarkdownBlockPayload,
) -> Result<R::Output, PipelineError> {
    let payload = pipelines.markdown_block.execute(payload)?;

    let thunk: Thunk<R::Output> = {
        let renderer = Arc::clone(renderer);
        let input = payload.data.clone();
        Arc::new(move || {
            Ok(renderer.render_raw_text(&input.modifier, input.path.as_deref(), &input.text))
        })
    };

    let staged = payload.map(|data| RenderStage::new(data, thunk));
    pipelines.markdown_render.execute(staged)?.data.invoke()
}

fn render_composable_block<R: Render>(
    pipelines: &Pipelines<R::Output>,
    renderer: &Arc<R>,
    payload: ComposableBlockPayload<R::Output>,
) -> Result<R::Output, PipelineError> {
    let payload = pipelines.composable_block.execute(payload)?;

    let thunk: Thunk<R::Output> = {
        let renderer = Arc::clone(renderer);
        let input = payload.data.clone();
        Arc::new(move || Ok(renderer.render_fragment(&input.modifier, &input.text, &input.content)))
    };

    let staged = payload.map(|data| RenderStage::new(data, thunk));
    pipelines.composable_render.execute(staged)?.data.invoke()
}
