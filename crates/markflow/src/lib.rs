//! Staged Markdown rendering.
//!
//! markflow renders Markdown documents, and documents mixed with embedded
//! `<Composable>` blocks, through a chain of stage pipelines that plugins
//! hook into. This crate wires the standard plugins together from a
//! [`Config`]:
//!
//! - [`FrontMatterPlugin`]: decodes and strips a leading `---` section.
//! - [`InlineEmbedPlugin`]: renders `<Composable inline>` blocks inside the
//!   surrounding text.
//! - [`HeadingsPlugin`]: publishes heading anchors and breadcrumbs.
//!
//! # Quick Start
//!
//! ```
//! use markflow::{Config, HEADINGS, HtmlRender, Modifier, standard_host};
//!
//! let host = standard_host(HtmlRender::new(), &Config::default());
//! let outcome = host
//!     .render_document(&Modifier::default(), Some("guide/intro.md"), "---\ntitle: Intro\n---\n# Intro\n")
//!     .unwrap();
//!
//! assert_eq!(outcome.output, "<h1>Intro</h1>\n");
//! assert_eq!(outcome.metadata.get(&HEADINGS).unwrap()[0].anchor, "intro");
//! ```

mod collection;
mod html;

use std::sync::Arc;

pub use collection::{CollectedDocument, CollectionError, DocumentCollection, document_key};
pub use html::HtmlRender;

pub use markflow_config::{CollectionConfig, Config, ConfigError};
pub use markflow_core::{
    Attributes, BlockItem, BlockList, Content, FnPlugin, InlinePiece, MarkdownHost, Modifier,
    Pipelines, Plugin, Render, RenderOutcome, RenderStage, StagedPayload,
};
pub use markflow_frontmatter::{
    ConfigSection, DecodeFailure, DecodeOutcome, Decoded, DecoderRegistry, FRONT_MATTER,
    FormatHint, FrontMatter, FrontMatterConfig, FrontMatterConfigStore, FrontMatterError,
    FrontMatterExt, FrontMatterPlugin, parse_front_matter,
};
pub use markflow_headings::{
    BREADCRUMBS, Breadcrumb, HEADINGS, HeadingInfo, HeadingsConfig, HeadingsPlugin, TocNode,
    table_of_contents,
};
pub use markflow_inline::{INLINE_SLOTS, InlineConfig, InlineEmbedPlugin, InlineSlots};
pub use markflow_pipeline::{
    MetadataKey, MetadataSnapshot, MetadataStore, Pipeline, PipelineContext, PipelineError, Priority,
};

/// Create a host with the standard plugins configured from `config`.
///
/// Front matter is stored with an empty decoder registry; decode it with
/// [`FrontMatterConfigStore::decode_with`] or use
/// [`standard_host_with_registry`].
pub fn standard_host<R: Render>(renderer: R, config: &Config) -> MarkdownHost<R> {
    standard_host_with_registry(renderer, config, DecoderRegistry::empty())
}

/// Create a host with the standard plugins and a front matter decoder
/// registry.
pub fn standard_host_with_registry<R: Render>(
    renderer: R,
    config: &Config,
    registry: Arc<DecoderRegistry>,
) -> MarkdownHost<R> {
    let mut host = MarkdownHost::new(renderer);
    host.install(&FrontMatterPlugin, |front_matter| {
        front_matter.registry = registry;
        front_matter.strip = config.front_matter.strip;
    })
    .install(&InlineEmbedPlugin, |inline| {
        inline.enabled = config.inline.enabled;
    })
    .install(&HeadingsPlugin, |headings| {
        headings.inject_ids = config.headings.inject_ids;
        headings.breadcrumbs = config.headings.breadcrumbs;
        headings.max_level = config.headings.max_level;
    });

    tracing::debug!(plugins = ?host.plugins(), "Created standard host");
    host
}
