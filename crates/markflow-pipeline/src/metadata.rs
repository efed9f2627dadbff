//! Typed, heterogeneous metadata carried through one render invocation.
//!
//! A [`MetadataKey<T>`] binds a name to exactly one value type. Values are
//! stored behind `Arc` so reads are cheap and a [`MetadataSnapshot`] can copy
//! the map without copying values. Replacing a value never affects a snapshot
//! taken earlier.
//!
//! # Example
//!
//! ```
//! use markflow_pipeline::{MetadataKey, MetadataStore};
//!
//! const TITLE: MetadataKey<String> = MetadataKey::new("title");
//!
//! let store = MetadataStore::new();
//! store.put(&TITLE, "Guide".to_owned());
//!
//! let snapshot = store.snapshot();
//! store.put(&TITLE, "Changed".to_owned());
//!
//! assert_eq!(snapshot.get(&TITLE).as_deref().map(String::as_str), Some("Guide"));
//! assert_eq!(store.get(&TITLE).as_deref().map(String::as_str), Some("Changed"));
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, RwLock};

type Value = Arc<dyn Any + Send + Sync>;

/// Storage identity of a key: its name plus the bound value type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct Slot {
    name: &'static str,
    type_id: TypeId,
}

/// Key binding a metadata entry to the value type `T`.
///
/// Two keys with the same name but different value types address different
/// entries, so a lookup can never observe a value of the wrong type.
pub struct MetadataKey<T> {
    name: &'static str,
    _value: PhantomData<fn() -> T>,
}

impl<T> MetadataKey<T> {
    /// Create a key with the given name.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _value: PhantomData,
        }
    }

    /// Key name (for diagnostics).
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T: 'static> MetadataKey<T> {
    fn slot(&self) -> Slot {
        Slot {
            name: self.name,
            type_id: TypeId::of::<T>(),
        }
    }
}

impl<T> Clone for MetadataKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for MetadataKey<T> {}

impl<T> fmt::Debug for MetadataKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MetadataKey").field(&self.name).finish()
    }
}

fn downcast<T: Send + Sync + 'static>(value: &Value) -> Option<Arc<T>> {
    Arc::clone(value).downcast::<T>().ok()
}

/// Mutable metadata shared by every stage of one render invocation.
///
/// Cloning a store yields another handle to the same entries; this is how
/// the store is threaded from pre-processing into the render stages.
#[derive(Clone, Default)]
pub struct MetadataStore {
    entries: Arc<RwLock<HashMap<Slot, Value>>>,
}

impl MetadataStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the value for `key`.
    pub fn put<T: Send + Sync + 'static>(&self, key: &MetadataKey<T>, value: T) {
        self.put_arc(key, Arc::new(value));
    }

    /// Insert or replace the value for `key` with an already shared value.
    pub fn put_arc<T: Send + Sync + 'static>(&self, key: &MetadataKey<T>, value: Arc<T>) {
        self.entries.write().unwrap().insert(key.slot(), value);
    }

    /// Get the value for `key`, if present.
    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self, key: &MetadataKey<T>) -> Option<Arc<T>> {
        self.entries.read().unwrap().get(&key.slot()).and_then(downcast)
    }

    /// Check whether `key` has a value.
    #[must_use]
    pub fn contains<T: 'static>(&self, key: &MetadataKey<T>) -> bool {
        self.entries.read().unwrap().contains_key(&key.slot())
    }

    /// Remove and return the value for `key`.
    pub fn remove<T: Send + Sync + 'static>(&self, key: &MetadataKey<T>) -> Option<Arc<T>> {
        self.entries
            .write()
            .unwrap()
            .remove(&key.slot())
            .as_ref()
            .and_then(downcast)
    }

    /// Replace the value for `key` with one computed from the current value.
    ///
    /// The closure runs without holding the store lock, so it may read other
    /// entries.
    pub fn update<T, F>(&self, key: &MetadataKey<T>, f: F)
    where
        T: Send + Sync + 'static,
        F: FnOnce(Option<&T>) -> T,
    {
        let current = self.get(key);
        let next = f(current.as_deref());
        self.put(key, next);
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    /// Check if the store has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().unwrap().is_empty()
    }

    /// Check whether two handles refer to the same store.
    #[must_use]
    pub fn same_store(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }

    /// Freeze the current entries into an immutable snapshot.
    #[must_use]
    pub fn snapshot(&self) -> MetadataSnapshot {
        MetadataSnapshot {
            entries: Arc::new(self.entries.read().unwrap().clone()),
        }
    }
}

impl fmt::Debug for MetadataStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.read().unwrap();
        let mut names: Vec<_> = entries.keys().map(|slot| slot.name).collect();
        names.sort_unstable();
        f.debug_struct("MetadataStore").field("keys", &names).finish()
    }
}

/// Immutable point-in-time copy of a [`MetadataStore`].
#[derive(Clone, Default)]
pub struct MetadataSnapshot {
    entries: Arc<HashMap<Slot, Value>>,
}

impl MetadataSnapshot {
    /// Get the value for `key`, if it was present when the snapshot was taken.
    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self, key: &MetadataKey<T>) -> Option<Arc<T>> {
        self.entries.get(&key.slot()).and_then(downcast)
    }

    /// Check whether `key` had a value.
    #[must_use]
    pub fn contains<T: 'static>(&self, key: &MetadataKey<T>) -> bool {
        self.entries.contains_key(&key.slot())
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the snapshot has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for MetadataSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.entries.keys().map(|slot| slot.name).collect();
        names.sort_unstable();
        f.debug_struct("MetadataSnapshot")
            .field("keys", &names)
            .finish()
    }
}
