//! Front matter for markflow documents.
//!
//! Detects a leading `---` section, decodes it into typed configuration
//! through a priority-ordered [`DecoderRegistry`], memoizes the results per
//! document, and strips the section before rendering.
//!
//! # Example
//!
//! ```
//! use markflow_frontmatter::{DecoderRegistry, FrontMatterConfigStore, parse_front_matter};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Page {
//!     title: String,
//! }
//!
//! let doc = parse_front_matter("---\ntitle: Guide\n---\n# Guide\n").unwrap();
//! assert_eq!(doc.body, "# Guide\n");
//!
//! let registry = DecoderRegistry::builder().serde::<Page>(0).build();
//! let store = FrontMatterConfigStore::new(doc.section, registry);
//! assert_eq!(store.decode::<Page>().value.unwrap().title, "Guide");
//! ```

mod decode;
mod parser;
mod plugin;
mod registry;
mod store;

pub use decode::{DecodeFailure, DecodeOutcome, DecodeRequest, FrontMatterError};
pub use parser::{ConfigSection, FormatHint, FrontMatter, parse_front_matter};
pub use plugin::{FrontMatterConfig, FrontMatterPlugin};
pub use registry::{DecoderRegistry, DecoderRegistryBuilder};
pub use store::{Decoded, FRONT_MATTER, FrontMatterConfigStore, FrontMatterExt, strip_front_matter};
