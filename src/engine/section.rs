//! Scoped exclusive section

use crate::error::Result;
use crate::storage::StorageBackend;

/// Holds a backend's exclusive section until dropped
///
/// Released on drop, which covers early `?` returns and cancelled futures.
pub(crate) struct ExclusiveSection<'a> {
    backend: &'a dyn StorageBackend,
}

impl<'a> ExclusiveSection<'a> {
    pub(crate) async fn enter(backend: &'a dyn StorageBackend) -> Result<Self> {
        backend.acquire_exclusive().await?;
        Ok(Self { backend })
    }
}

impl Drop for ExclusiveSection<'_> {
    fn drop(&mut self) {
        self.backend.release_exclusive();
    }
}
