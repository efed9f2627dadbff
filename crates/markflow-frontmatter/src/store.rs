//! Per-document decode cache and metadata access.

use std::any::TypeId;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::{Arc, Mutex};

use markflow_core::BlockItem;
use markflow_pipeline::{MetadataKey, MetadataSnapshot, MetadataStore};

use crate::decode::{DecodeRequest, FrontMatterError};
use crate::parser::ConfigSection;
use crate::registry::{DecoderRegistry, ErasedDecode};

/// Metadata key of the current document's front matter.
pub const FRONT_MATTER: MetadataKey<FrontMatterConfigStore> = MetadataKey::new("front_matter");

/// Typed decode result.
#[derive(Debug)]
pub struct Decoded<T> {
    /// Decoded value, if any decoder produced one.
    pub value: Option<Arc<T>>,
    /// Errors recorded while decoding.
    pub errors: Vec<FrontMatterError>,
}

/// Front matter of one document with memoized decodes.
///
/// Each `(registry, type)` pair is decoded once. Later requests return the
/// cached result without calling decoders or reporting errors again.
pub struct FrontMatterConfigStore {
    section: ConfigSection,
    registry: Arc<DecoderRegistry>,
    cache: Mutex<HashMap<(u64, TypeId), ErasedDecode>>,
    errors: Mutex<Vec<FrontMatterError>>,
}

impl FrontMatterConfigStore {
    /// Create a store decoding with `registry` by default.
    #[must_use]
    pub fn new(section: ConfigSection, registry: Arc<DecoderRegistry>) -> Self {
        Self {
            section,
            registry,
            cache: Mutex::new(HashMap::new()),
            errors: Mutex::new(Vec::new()),
        }
    }

    /// Raw section.
    #[must_use]
    pub fn section(&self) -> &ConfigSection {
        &self.section
    }

    /// Decode as `T` with the default registry.
    pub fn decode<T: Send + Sync + 'static>(&self) -> Decoded<T> {
        let registry = Arc::clone(&self.registry);
        self.decode_with(&registry)
    }

    /// Decode as `T` with `registry`.
    pub fn decode_with<T: Send + Sync + 'static>(&self, registry: &DecoderRegistry) -> Decoded<T> {
        let key = (registry.id(), TypeId::of::<T>());
        if let Some(cached) = self.cache.lock().unwrap().get(&key) {
            return typed(cached);
        }

        let outcome = registry.decode_erased(&self.section, &DecodeRequest::of::<T>());

        let (result, fresh_errors) = {
            let mut cache = self.cache.lock().unwrap();
            match cache.entry(key) {
                Entry::Occupied(entry) => return typed(entry.get()),
                Entry::Vacant(entry) => {
                    let stored = entry.insert(outcome);
                    (typed(stored), stored.errors.clone())
                }
            }
        };

        for error in &fresh_errors {
            registry.report(error);
        }
        self.errors.lock().unwrap().extend(fresh_errors);
        result
    }

    /// Every error recorded by decodes on this store, in order.
    #[must_use]
    pub fn errors(&self) -> Vec<FrontMatterError> {
        self.errors.lock().unwrap().clone()
    }
}

fn typed<T: Send + Sync + 'static>(outcome: &ErasedDecode) -> Decoded<T> {
    Decoded {
        value: outcome
            .value
            .as_ref()
            .and_then(|value| Arc::clone(value).downcast::<T>().ok()),
        errors: outcome.errors.clone(),
    }
}

impl fmt::Debug for FrontMatterConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrontMatterConfigStore")
            .field("section", &self.section)
            .field("registry", &self.registry.id())
            .finish_non_exhaustive()
    }
}

/// Front matter accessors on render metadata.
pub trait FrontMatterExt {
    /// Front matter of the rendered document.
    fn front_matter(&self) -> Option<Arc<FrontMatterConfigStore>>;

    /// Errors recorded while decoding the document's front matter.
    fn front_matter_errors(&self) -> Vec<FrontMatterError> {
        self.front_matter()
            .map(|store| store.errors())
            .unwrap_or_default()
    }
}

impl FrontMatterExt for MetadataSnapshot {
    fn front_matter(&self) -> Option<Arc<FrontMatterConfigStore>> {
        self.get(&FRONT_MATTER)
    }
}

impl FrontMatterExt for MetadataStore {
    fn front_matter(&self) -> Option<Arc<FrontMatterConfigStore>> {
        self.get(&FRONT_MATTER)
    }
}

/// Remove the consumed front matter text from the first block.
///
/// Returns `None` if the first block does not start with `consumed`. An empty
/// list has nothing to strip and is returned as is.
#[must_use]
pub fn strip_front_matter<O>(
    blocks: &[BlockItem<O>],
    consumed: &str,
) -> Option<Vec<BlockItem<O>>> {
    let Some((first, rest)) = blocks.split_first() else {
        return Some(Vec::new());
    };
    let body = first.text().strip_prefix(consumed)?;

    let mut stripped = Vec::with_capacity(blocks.len());
    stripped.push(first.with_text(body));
    stripped.extend(rest.iter().cloned());
    Some(stripped)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use markflow_core::Attributes;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    use super::*;
    use crate::decode::{DecodeFailure, DecodeOutcome};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Page {
        title: String,
    }

    fn section() -> ConfigSection {
        ConfigSection::new("title = \"Hello\"\n", 2)
    }

    #[test]
    fn test_decode_caches_per_registry_and_type() {
        let failing_calls = Arc::new(AtomicUsize::new(0));
        let succeeding_calls = Arc::new(AtomicUsize::new(0));
        let reported = Arc::new(AtomicUsize::new(0));

        let registry = {
            let failing_calls = Arc::clone(&failing_calls);
            let succeeding_calls = Arc::clone(&succeeding_calls);
            let reported = Arc::clone(&reported);
            DecoderRegistry::builder()
                .decoder::<Page, _>("failing", 10, move |_| {
                    failing_calls.fetch_add(1, Ordering::SeqCst);
                    Ok(DecodeFailure::new("not today").into())
                })
                .decoder::<Page, _>("succeeding", 0, move |_| {
                    succeeding_calls.fetch_add(1, Ordering::SeqCst);
                    Ok(DecodeOutcome::success(Page {
                        title: "Hello".to_owned(),
                    }))
                })
                .on_error(move |_| {
                    reported.fetch_add(1, Ordering::SeqCst);
                })
                .build()
        };
        let store = FrontMatterConfigStore::new(section(), registry);

        let first = store.decode::<Page>();
        let second = store.decode::<Page>();

        assert_eq!(first.value.unwrap().title, "Hello");
        assert_eq!(second.value.unwrap().title, "Hello");
        assert_eq!(second.errors.len(), 1);
        assert_eq!(failing_calls.load(Ordering::SeqCst), 1);
        assert_eq!(succeeding_calls.load(Ordering::SeqCst), 1);
        assert_eq!(reported.load(Ordering::SeqCst), 1);
        assert_eq!(store.errors().len(), 1);
    }

    #[test]
    fn test_decode_with_other_registry_is_separate() {
        let store = FrontMatterConfigStore::new(section(), DecoderRegistry::empty());
        assert!(store.decode::<Page>().value.is_none());

        let serde = DecoderRegistry::builder().serde::<Page>(0).build();
        let decoded = store.decode_with::<Page>(&serde);
        assert_eq!(decoded.value.unwrap().title, "Hello");
    }

    #[test]
    fn test_metadata_accessors() {
        let metadata = MetadataStore::new();
        assert!(metadata.front_matter().is_none());
        assert!(metadata.front_matter_errors().is_empty());

        let registry = DecoderRegistry::builder()
            .decoder::<Page, _>("broken", 0, |_| Ok(DecodeFailure::new("bad").into()))
            .on_error(|_| {})
            .build();
        metadata.put(&FRONT_MATTER, FrontMatterConfigStore::new(section(), registry));
        metadata.front_matter().unwrap().decode::<Page>();

        let snapshot = metadata.snapshot();
        assert_eq!(snapshot.front_matter_errors().len(), 1);
        assert_eq!(snapshot.front_matter_errors()[0].decoder_id, "broken");
    }

    #[test]
    fn test_strip_front_matter_from_first_block() {
        let blocks: Vec<BlockItem<String>> = vec![
            BlockItem::markdown("---\na: 1\n---\n# Title", None),
            BlockItem::composable("<Composable>", None, Attributes::new(), String::new),
        ];
        let stripped = strip_front_matter(&blocks, "---\na: 1\n---\n").unwrap();

        assert_eq!(stripped[0].text(), "# Title");
        assert_eq!(stripped[1].text(), "<Composable>");
    }

    #[test]
    fn test_strip_front_matter_mismatch_is_none() {
        let blocks: Vec<BlockItem<String>> = vec![BlockItem::markdown("# Title", None)];
        assert!(strip_front_matter(&blocks, "---\na: 1\n---\n").is_none());
    }

    #[test]
    fn test_strip_front_matter_empty_list() {
        let stripped = strip_front_matter::<String>(&[], "---\n---\n").unwrap();
        assert!(stripped.is_empty());
    }
}
