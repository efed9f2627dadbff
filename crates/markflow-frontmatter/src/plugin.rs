use std::sync::Arc;

use markflow_core::{BlockList, MarkdownHost, Plugin, Render, TextSource};
use markflow_pipeline::Priority;

use crate::parser::parse_front_matter;
use crate::registry::DecoderRegistry;
use crate::store::{FRONT_MATTER, FrontMatterConfigStore, strip_front_matter};

/// Configuration of [`FrontMatterPlugin`].
#[derive(Clone, Debug)]
pub struct FrontMatterConfig {
    /// Default registry of the per-document store.
    pub registry: Arc<DecoderRegistry>,
    /// Remove the front matter before rendering.
    pub strip: bool,
}

impl Default for FrontMatterConfig {
    fn default() -> Self {
        Self {
            registry: DecoderRegistry::empty(),
            strip: true,
        }
    }
}

/// Detects front matter on the `text` and `blocks` stages.
///
/// The parsed section is published under [`FRONT_MATTER`]. Runs at high
/// priority so later interceptors see the stripped document.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrontMatterPlugin;

impl<R: Render> Plugin<R> for FrontMatterPlugin {
    type Config = FrontMatterConfig;

    fn name(&self) -> &str {
        "front-matter"
    }

    fn default_config(&self) -> FrontMatterConfig {
        FrontMatterConfig::default()
    }

    fn register(&self, host: &mut MarkdownHost<R>, config: FrontMatterConfig) {
        let pipelines = host.pipelines_mut();

        let text_config = config.clone();
        pipelines.text.intercept(Priority::High, 100, move |ctx| {
            let Some(front_matter) = parse_front_matter(&ctx.subject().data.source) else {
                return ctx.proceed();
            };
            tracing::debug!(
                path = ?ctx.subject().data.path,
                hint = ?front_matter.section.format_hint,
                "Found front matter"
            );
            let payload = ctx.subject();
            payload.metadata.put(
                &FRONT_MATTER,
                FrontMatterConfigStore::new(front_matter.section, Arc::clone(&text_config.registry)),
            );
            if !text_config.strip {
                return ctx.proceed();
            }
            let next = payload.with_data(TextSource {
                path: payload.data.path.clone(),
                source: front_matter.body,
            });
            ctx.proceed_with(next)
        });

        pipelines.blocks.intercept(Priority::High, 100, move |ctx| {
            let Some(front_matter) = parse_front_matter(&ctx.subject().data.full_source) else {
                return ctx.proceed();
            };
            tracing::debug!(
                path = ?ctx.subject().data.path,
                hint = ?front_matter.section.format_hint,
                "Found front matter"
            );
            let payload = ctx.subject();
            payload.metadata.put(
                &FRONT_MATTER,
                FrontMatterConfigStore::new(front_matter.section, Arc::clone(&config.registry)),
            );
            if !config.strip {
                return ctx.proceed();
            }
            let list = &payload.data;
            let Some(blocks) = strip_front_matter(&list.blocks, &front_matter.consumed) else {
                tracing::warn!(
                    path = ?list.path,
                    "First block does not start with the front matter, leaving document unstripped"
                );
                return ctx.proceed();
            };
            let next = payload.with_data(BlockList {
                path: list.path.clone(),
                full_source: front_matter.body,
                blocks,
            });
            ctx.proceed_with(next)
        });
    }
}

#[cfg(test)]
mod tests {
    use markflow_core::mock::MockRender;
    use markflow_core::{Attributes, BlockItem, Modifier, StagedPayload};
    use markflow_pipeline::MetadataStore;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    use super::*;
    use crate::store::FrontMatterExt;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Page {
        title: String,
    }

    const DOC: &str = "---\ntitle = \"Hello\"\n---\n# Heading\nbody";

    fn host(strip: bool) -> MarkdownHost<MockRender> {
        let mut host = MarkdownHost::new(MockRender);
        host.install(&FrontMatterPlugin, |config| {
            config.registry = DecoderRegistry::builder().serde::<Page>(0).build();
            config.strip = strip;
        });
        host
    }

    #[test]
    fn test_document_front_matter_is_stripped_and_published() {
        let outcome = host(true)
            .render_document(&Modifier::default(), None, DOC)
            .unwrap();

        assert_eq!(outcome.output, "md(# Heading\nbody)");
        let store = outcome.metadata.front_matter().unwrap();
        assert_eq!(store.decode::<Page>().value.unwrap().title, "Hello");
    }

    #[test]
    fn test_document_front_matter_kept_without_strip() {
        let outcome = host(false)
            .render_document(&Modifier::default(), None, DOC)
            .unwrap();

        assert_eq!(outcome.output, format!("md({DOC})"));
        assert!(outcome.metadata.front_matter().is_some());
    }

    #[test]
    fn test_document_without_front_matter() {
        let outcome = host(true)
            .render_document(&Modifier::default(), None, "# Plain")
            .unwrap();

        assert_eq!(outcome.output, "md(# Plain)");
        assert!(outcome.metadata.front_matter().is_none());
    }

    #[test]
    fn test_block_list_front_matter_is_stripped() {
        let blocks = vec![
            BlockItem::markdown("---\ntitle = \"Hello\"\n---\nIntro ", None),
            BlockItem::composable("<Composable>", None, Attributes::new(), || "C".to_owned()),
        ];
        let outcome = host(true)
            .render_blocks(
                &Modifier::default(),
                None,
                "---\ntitle = \"Hello\"\n---\nIntro <Composable>",
                blocks,
            )
            .unwrap();

        assert_eq!(outcome.output, "compose[md(Intro ), fragment(<Composable>|C)]");
        assert!(outcome.metadata.front_matter().is_some());
    }

    #[test]
    fn test_block_list_left_whole_when_first_block_lacks_front_matter() {
        let blocks = vec![
            BlockItem::markdown("Intro ", None),
            BlockItem::composable("<Composable>", None, Attributes::new(), || "C".to_owned()),
        ];
        let source = "---\ntitle = \"Hello\"\n---\nIntro <Composable>";
        let list = host(true)
            .pipelines()
            .blocks
            .execute(StagedPayload::new(
                MetadataStore::new(),
                BlockList {
                    path: None,
                    full_source: source.to_owned(),
                    blocks: blocks.clone(),
                },
            ))
            .unwrap();

        assert_eq!(list.data.full_source, source);
        assert_eq!(list.data.blocks, blocks);
        assert!(list.metadata.front_matter().is_some());
    }

    #[test]
    fn test_decode_error_exposed_on_snapshot() {
        let mut host = MarkdownHost::new(MockRender);
        host.install(&FrontMatterPlugin, |config| {
            config.registry = DecoderRegistry::builder()
                .serde::<Page>(0)
                .on_error(|_| {})
                .build();
        });
        let outcome = host
            .render_document(&Modifier::default(), None, "---\ntitle = 3\n---\nx")
            .unwrap();

        let store = outcome.metadata.front_matter().unwrap();
        assert!(store.decode::<Page>().value.is_none());
        assert_eq!(outcome.metadata.front_matter_errors().len(), 1);
    }
}
