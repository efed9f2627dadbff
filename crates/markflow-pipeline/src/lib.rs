//! Ordered interceptor pipelines and typed per-render metadata.
//!
//! This crate is the engine underneath the markflow document host:
//!
//! - [`Pipeline`]: a priority-ordered, re-entrant interceptor chain with
//!   subject replacement and early termination.
//! - [`MetadataStore`]: a typed key-value store threaded through every stage
//!   of one render invocation, with frozen [`MetadataSnapshot`]s.
//!
//! # Example
//!
//! ```
//! use markflow_pipeline::{MetadataKey, MetadataStore, Pipeline, Priority};
//!
//! const SEEN: MetadataKey<usize> = MetadataKey::new("seen");
//!
//! let mut pipeline: Pipeline<(MetadataStore, String)> = Pipeline::new("example");
//! pipeline.intercept(Priority::Normal, 0, |ctx| {
//!     let (metadata, text) = ctx.subject();
//!     metadata.put(&SEEN, text.len());
//!     ctx.proceed()
//! });
//!
//! let (metadata, _) = pipeline.execute((MetadataStore::new(), "hello".to_owned())).unwrap();
//! assert_eq!(metadata.get(&SEEN).as_deref(), Some(&5));
//! ```

mod error;
mod metadata;
mod pipeline;

pub use error::{BoxError, PipelineError};
pub use metadata::{MetadataKey, MetadataSnapshot, MetadataStore};
pub use pipeline::{Interceptor, Pipeline, PipelineContext, PipelineEntry, Priority};
