//! Shared registry handles.
//!
//! Function and class registries are populated once while definitions load
//! and then read by every execution context in the process. The handle is
//! an `Arc` over a `parking_lot::RwLock`; contexts take short read locks
//! per lookup, the loader takes write locks per definition.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Cheaply clonable handle to a process-wide registry.
pub struct SharedRegistry<T>(Arc<RwLock<T>>);

impl<T> SharedRegistry<T> {
    pub fn new(value: T) -> Self {
        SharedRegistry(Arc::new(RwLock::new(value)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.0.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.0.write()
    }
}

impl<T> Clone for SharedRegistry<T> {
    fn clone(&self) -> Self {
        SharedRegistry(Arc::clone(&self.0))
    }
}

impl<T: Default> Default for SharedRegistry<T> {
    fn default() -> Self {
        SharedRegistry::new(T::default())
    }
}
