use std::sync::Arc;

use markflow_core::{BlockList, InlinePiece, MarkdownHost, Plugin, Render};
use markflow_pipeline::{MetadataStore, Priority};

use crate::attrs::is_inline;
use crate::placeholder::{PlaceholderPiece, has_placeholders, split_placeholders};
use crate::registry::{InlineRenderRegistry, render_registry_key};
use crate::rewrite::{INLINE_SLOTS, rewrite_inline_blocks};

/// Configuration of [`InlineEmbedPlugin`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InlineConfig {
    /// Hoist inline blocks and resolve placeholders.
    pub enabled: bool,
}

impl Default for InlineConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Renders `<Composable inline>` blocks inside the surrounding text.
///
/// Registers four interceptors:
///
/// - `blocks`: hoists inline blocks and publishes [`INLINE_SLOTS`].
/// - `blocks_render`: provides an [`InlineRenderRegistry`] while the block
///   sequence renders.
/// - `composable_render`: stores the output of a hoisted block in the registry
///   and renders an empty composition in its place.
/// - `markdown_render`: renders placeholder-bearing text with
///   [`Render::render_inline_text`].
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineEmbedPlugin;

impl<R: Render> Plugin<R> for InlineEmbedPlugin {
    type Config = InlineConfig;

    fn name(&self) -> &str {
        "inline-embed"
    }

    fn default_config(&self) -> InlineConfig {
        InlineConfig::default()
    }

    fn register(&self, host: &mut MarkdownHost<R>, config: InlineConfig) {
        if !config.enabled {
            return;
        }
        let renderer = Arc::clone(host.renderer());
        let pipelines = host.pipelines_mut();

        pipelines.blocks.intercept(Priority::Normal, 0, |ctx| {
            let payload = ctx.subject();
            if payload.metadata.contains(&INLINE_SLOTS) {
                return ctx.proceed();
            }
            let list = &payload.data;
            let Some(rewrite) = rewrite_inline_blocks(&list.full_source, &list.blocks) else {
                return ctx.proceed();
            };
            payload.metadata.put(&INLINE_SLOTS, rewrite.slots);
            let next = payload.with_data(BlockList {
                path: list.path.clone(),
                full_source: list.full_source.clone(),
                blocks: rewrite.blocks,
            });
            ctx.proceed_with(next)
        });

        pipelines.blocks_render.intercept(Priority::Normal, 0, |ctx| {
            let metadata = ctx.subject().metadata.clone();
            if !metadata.contains(&INLINE_SLOTS) {
                return ctx.proceed();
            }
            let stage = ctx.subject().data.wrapped(move |inner| {
                let key = render_registry_key::<R::Output>();
                metadata.put(&key, InlineRenderRegistry::new());
                let result = inner();
                metadata.remove(&key);
                result
            });
            let next = ctx.subject().with_data(stage);
            ctx.proceed_with(next)
        });

        let compose = Arc::clone(&renderer);
        pipelines
            .composable_render
            .intercept(Priority::Normal, 0, move |ctx| {
                let payload = ctx.subject();
                let input = &payload.data.input;
                let slot_id = input.index.and_then(|index| {
                    let slots = payload.metadata.get(&INLINE_SLOTS)?;
                    slots
                        .at_block(index)
                        .filter(|slot| is_inline(&slot.attrs))
                        .map(|slot| slot.id.clone())
                });
                let Some(slot_id) = slot_id else {
                    return ctx.proceed();
                };

                let metadata = payload.metadata.clone();
                let modifier = input.modifier.clone();
                let renderer = Arc::clone(&compose);
                let stage = payload.data.wrapped(move |inner| {
                    let output = inner()?;
                    match metadata.get(&render_registry_key::<R::Output>()) {
                        Some(registry) => {
                            registry.register(slot_id.clone(), output);
                            Ok(renderer.compose(&modifier, Vec::new()))
                        }
                        None => Ok(output),
                    }
                });
                let next = payload.with_data(stage);
                ctx.proceed_with(next)
            });

        pipelines
            .markdown_render
            .intercept(Priority::Normal, 0, move |ctx| {
                let payload = ctx.subject();
                if !has_placeholders(&payload.data.input.text) {
                    return ctx.proceed();
                }

                let input = payload.data.input.clone();
                let metadata = payload.metadata.clone();
                let renderer = Arc::clone(&renderer);
                let stage = payload.data.with_render(Arc::new(move || {
                    let pieces = resolve_pieces::<R::Output>(&metadata, &input.text);
                    Ok(renderer.render_inline_text(&input.modifier, input.path.as_deref(), pieces))
                }));
                let next = payload.with_data(stage);
                ctx.proceed_with(next)
            });
    }
}

/// Map placeholder pieces to registered outputs.
fn resolve_pieces<O>(metadata: &MetadataStore, text: &str) -> Vec<InlinePiece<O>>
where
    O: Clone + Send + Sync + 'static,
{
    let registry = metadata.get(&render_registry_key::<O>());
    split_placeholders(text)
        .into_iter()
        .map(|piece| match piece {
            PlaceholderPiece::Text(text) => InlinePiece::Text(text.to_owned()),
            PlaceholderPiece::Placeholder(id) => {
                match registry.as_ref().and_then(|registry| registry.get(id)) {
                    Some(output) => InlinePiece::Child(output),
                    None => {
                        tracing::debug!(id, "Inline placeholder not resolved");
                        InlinePiece::Pending(id.to_owned())
                    }
                }
            }
        })
        .collect()
}
