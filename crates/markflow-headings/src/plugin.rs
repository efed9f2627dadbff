use markflow_core::{BlockItem, BlockList, MarkdownHost, Plugin, Render, TextSource};
use markflow_pipeline::{MetadataKey, MetadataStore, Priority};

use crate::breadcrumbs::{Breadcrumb, breadcrumbs};
use crate::heading::{HeadingIndex, HeadingInfo};

/// Headings of the rendered document, in document order.
pub const HEADINGS: MetadataKey<Vec<HeadingInfo>> = MetadataKey::new("headings");

/// Breadcrumb trail of the rendered document's path.
pub const BREADCRUMBS: MetadataKey<Vec<Breadcrumb>> = MetadataKey::new("breadcrumbs");

/// Configuration of [`HeadingsPlugin`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeadingsConfig {
    /// Rewrite headings with explicit `{#id}` anchors.
    pub inject_ids: bool,
    /// Publish [`BREADCRUMBS`] for documents with a path.
    pub breadcrumbs: bool,
    /// Deepest heading level published under [`HEADINGS`].
    pub max_level: u8,
}

impl Default for HeadingsConfig {
    fn default() -> Self {
        Self {
            inject_ids: false,
            breadcrumbs: true,
            max_level: 6,
        }
    }
}

/// Indexes headings on the `text` and `blocks` stages.
///
/// Runs after front matter stripping and inline hoisting, so anchors and block
/// indices refer to the document as it is rendered.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeadingsPlugin;

impl<R: Render> Plugin<R> for HeadingsPlugin {
    type Config = HeadingsConfig;

    fn name(&self) -> &str {
        "headings"
    }

    fn default_config(&self) -> HeadingsConfig {
        HeadingsConfig::default()
    }

    fn register(&self, host: &mut MarkdownHost<R>, config: HeadingsConfig) {
        let pipelines = host.pipelines_mut();

        pipelines.text.intercept(Priority::Normal, -10, move |ctx| {
            let payload = ctx.subject();
            let mut index = HeadingIndex::with_max_level(config.max_level);
            let source = if config.inject_ids {
                Some(index.inject(&payload.data.source, None))
            } else {
                index.scan(&payload.data.source, None);
                None
            };
            publish(&payload.metadata, &config, payload.data.path.as_deref(), index);

            match source {
                Some(source) => {
                    let next = payload.with_data(TextSource {
                        path: payload.data.path.clone(),
                        source,
                    });
                    ctx.proceed_with(next)
                }
                None => ctx.proceed(),
            }
        });

        pipelines.blocks.intercept(Priority::Normal, -10, move |ctx| {
            let payload = ctx.subject();
            let list = &payload.data;
            let mut index = HeadingIndex::with_max_level(config.max_level);

            let blocks = list
                .blocks
                .iter()
                .enumerate()
                .map(|(i, block)| match block {
                    BlockItem::Markdown(markdown) if config.inject_ids => {
                        block.with_text(index.inject(&markdown.text, Some(i)))
                    }
                    BlockItem::Markdown(markdown) => {
                        index.scan(&markdown.text, Some(i));
                        block.clone()
                    }
                    BlockItem::Composable(_) => block.clone(),
                })
                .collect();
            publish(&payload.metadata, &config, list.path.as_deref(), index);

            if !config.inject_ids {
                return ctx.proceed();
            }
            let next = payload.with_data(BlockList {
                path: list.path.clone(),
                full_source: list.full_source.clone(),
                blocks,
            });
            ctx.proceed_with(next)
        });
    }
}

fn publish(
    metadata: &MetadataStore,
    config: &HeadingsConfig,
    path: Option<&str>,
    index: HeadingIndex,
) {
    let headings = index.into_headings();
    tracing::debug!(headings = headings.len(), path = ?path, "Indexed headings");
    metadata.put(&HEADINGS, headings);

    if config.breadcrumbs
        && let Some(path) = path
    {
        metadata.put(&BREADCRUMBS, breadcrumbs(path));
    }
}
