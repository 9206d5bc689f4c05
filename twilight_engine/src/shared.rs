//! Lock-guarded registry handle for multi-threaded hosts.
//!
//! Every mutation holds the write lock for its full duration, so a failed reload and its
//! rollback are a single step to readers. Queries share the read lock.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use twilight_data::{ContentValidationError, PackLoadError};

use crate::registry::ContentRegistry;

#[derive(Debug, Clone, Default)]
pub struct SharedContentRegistry {
    inner: Arc<RwLock<ContentRegistry>>,
}

impl SharedContentRegistry {
    pub fn new(registry: ContentRegistry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    /// Shared access for queries. A poisoned lock is recovered rather than propagated.
    pub fn read(&self) -> RwLockReadGuard<'_, ContentRegistry> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, ContentRegistry> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `query` under the read lock.
    pub fn with<R>(&self, query: impl FnOnce(&ContentRegistry) -> R) -> R {
        query(&self.read())
    }

    /// Load one pack; returns its id.
    ///
    /// # Errors
    /// As [`ContentRegistry::load_pack`].
    pub fn load_pack(&self, path: &Path) -> Result<String, PackLoadError> {
        self.write().load_pack(path).map(|pack| pack.id().to_string())
    }

    /// Load a batch; returns the ids in load order.
    ///
    /// # Errors
    /// As [`ContentRegistry::load_packs`].
    pub fn load_packs<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Vec<String>, PackLoadError> {
        self.write()
            .load_packs(paths)
            .map(|packs| packs.into_iter().map(|pack| pack.id().to_string()).collect())
    }

    /// # Errors
    /// As [`ContentRegistry::unload_pack`].
    pub fn unload_pack(&self, pack_id: &str) -> Result<(), PackLoadError> {
        self.write().unload_pack(pack_id).map(|_| ())
    }

    /// # Errors
    /// As [`ContentRegistry::safe_reload_pack`]; the registry is unchanged on error.
    pub fn safe_reload_pack(&self, pack_id: &str, path: &Path) -> Result<(), PackLoadError> {
        self.write().safe_reload_pack(pack_id, path).map(|_| ())
    }

    pub fn validate_all_content(&self) -> Vec<ContentValidationError> {
        self.read().validate_all_content()
    }
}
