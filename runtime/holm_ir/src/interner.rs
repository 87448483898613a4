//! String interner for identifier storage.
//!
//! Provides O(1) interning and lookup with thread-safe access. Definition
//! loading and evaluation may run on different threads, so the interner is
//! shared behind an `Arc` and guarded by a `parking_lot::RwLock`.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::Name;

struct Inner {
    /// Map from string content to index.
    map: FxHashMap<Arc<str>, u32>,
    /// Storage for string contents, indexed by `Name::raw()`.
    strings: Vec<Arc<str>>,
}

/// Thread-safe string interner.
///
/// Interned strings are stored as `Arc<str>` so `resolve` hands out a cheap
/// clone instead of holding a lock guard across the caller's use.
pub struct StringInterner {
    inner: RwLock<Inner>,
}

impl StringInterner {
    /// Create a new interner with the empty string pre-interned as `Name::EMPTY`.
    pub fn new() -> Self {
        let empty: Arc<str> = Arc::from("");
        let mut map = FxHashMap::default();
        map.insert(Arc::clone(&empty), 0);
        StringInterner {
            inner: RwLock::new(Inner {
                map,
                strings: vec![empty],
            }),
        }
    }

    /// Intern a string, returning its `Name`.
    ///
    /// Interning the same content twice returns the same `Name`.
    pub fn intern(&self, s: &str) -> Name {
        {
            let inner = self.inner.read();
            if let Some(&idx) = inner.map.get(s) {
                return Name::from_raw(idx);
            }
        }
        let mut inner = self.inner.write();
        // Re-check under the write lock; another thread may have interned it.
        if let Some(&idx) = inner.map.get(s) {
            return Name::from_raw(idx);
        }
        let idx = u32::try_from(inner.strings.len()).unwrap_or(u32::MAX);
        let stored: Arc<str> = Arc::from(s);
        inner.map.insert(Arc::clone(&stored), idx);
        inner.strings.push(stored);
        Name::from_raw(idx)
    }

    /// Resolve a `Name` back to its string content.
    ///
    /// Returns the empty string for a `Name` that was not produced by this
    /// interner rather than panicking.
    pub fn resolve(&self, name: Name) -> Arc<str> {
        let inner = self.inner.read();
        inner
            .strings
            .get(name.raw() as usize)
            .map_or_else(|| Arc::from(""), Arc::clone)
    }

    /// Number of interned strings (including the pre-interned empty string).
    pub fn len(&self) -> usize {
        self.inner.read().strings.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared handle to a [`StringInterner`].
#[derive(Clone, Default)]
pub struct SharedInterner(Arc<StringInterner>);

impl SharedInterner {
    pub fn new() -> Self {
        SharedInterner(Arc::new(StringInterner::new()))
    }
}

impl std::ops::Deref for SharedInterner {
    type Target = StringInterner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
