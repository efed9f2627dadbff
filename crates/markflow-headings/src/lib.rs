//! Heading anchors and navigation data for markflow documents.
//!
//! - [`extract_headings`] and [`HeadingIndex`] find ATX headings outside fenced
//!   code and give each a document-unique anchor.
//! - [`inject_heading_ids`] writes those anchors back as `{#id}` suffixes.
//! - [`table_of_contents`] nests headings by level.
//! - [`breadcrumbs`] derives a navigation trail from a document path.
//! - [`HeadingsPlugin`] publishes headings and breadcrumbs as render metadata.

mod breadcrumbs;
mod fence;
mod heading;
mod plugin;
mod slug;
mod toc;

pub use breadcrumbs::{Breadcrumb, breadcrumbs};
pub use heading::{HeadingIndex, HeadingInfo, extract_headings, inject_heading_ids};
pub use plugin::{BREADCRUMBS, HEADINGS, HeadingsConfig, HeadingsPlugin};
pub use slug::{AnchorSet, slugify};
pub use toc::{TocNode, table_of_contents};
