use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use markflow_pipeline::MetadataKey;

/// Rendered inline outputs of one aggregate render, by placeholder id.
///
/// Cloning yields another handle to the same registry.
pub struct InlineRenderRegistry<O> {
    outputs: Arc<Mutex<HashMap<String, O>>>,
}

impl<O: Clone> InlineRenderRegistry<O> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            outputs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Register (or replace) the output for `id`.
    pub fn register(&self, id: impl Into<String>, output: O) {
        self.outputs.lock().unwrap().insert(id.into(), output);
    }

    /// Output registered for `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<O> {
        self.outputs.lock().unwrap().get(id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.outputs.lock().unwrap().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<O: Clone> Default for InlineRenderRegistry<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O> Clone for InlineRenderRegistry<O> {
    fn clone(&self) -> Self {
        Self {
            outputs: Arc::clone(&self.outputs),
        }
    }
}

impl<O> fmt::Debug for InlineRenderRegistry<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outputs = self.outputs.lock().unwrap();
        let mut ids: Vec<_> = outputs.keys().collect();
        ids.sort_unstable();
        f.debug_struct("InlineRenderRegistry")
            .field("ids", &ids)
            .finish()
    }
}

/// Metadata key of the registry while an aggregate render runs.
#[must_use]
pub const fn render_registry_key<O>() -> MetadataKey<InlineRenderRegistry<O>> {
    MetadataKey::new("inline_render_registry")
}
