//! The persistent store seam.

use cinder_common::FileStamp;

use crate::artifact::CompiledArtifact;
use crate::error::CacheError;
use crate::key::CacheKey;

/// A store that keeps compiled artifacts across process restarts.
///
/// Entries are keyed by the cache key and the template file's modification
/// stamp; an entry recorded under an older stamp is unreachable. Writes must
/// be idempotent and overwritable: storing an equivalent artifact again for
/// the same `(key, stamp)` is always safe.
pub trait PersistentStore: Send + Sync {
    /// Loads the artifact stored for `(key, stamp)`, or `None` on any miss.
    fn load(&self, key: &CacheKey, stamp: FileStamp) -> Option<CompiledArtifact>;

    /// Stores an artifact for `(key, stamp)`, replacing any previous entry.
    fn store(
        &self,
        key: &CacheKey,
        stamp: FileStamp,
        artifact: &CompiledArtifact,
    ) -> Result<(), CacheError>;
}
