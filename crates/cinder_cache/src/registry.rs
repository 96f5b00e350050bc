//! Per-template in-memory artifact registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use cinder_common::{ContentHash, FileStamp};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::artifact::CompiledArtifact;
use crate::key::CacheKey;
use crate::persist::PersistentStore;

/// How a registry behaves when several threads miss on the same key at once.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompilePolicy {
    /// Every missing caller compiles; the first artifact inserted wins and
    /// the others are discarded.
    #[default]
    Shared,
    /// Callers missing on the same key wait on a per-key lock, so each key
    /// is compiled at most once per registry.
    Exclusive,
}

/// In-memory map from [`CacheKey`] to shared [`CompiledArtifact`].
///
/// Owned by one template. Optionally backed by a [`PersistentStore`], which
/// is consulted on a miss before compiling and written after a compile.
pub struct ArtifactRegistry {
    entries: RwLock<HashMap<CacheKey, Arc<CompiledArtifact>>>,
    /// Per-key compile locks, used only under [`CompilePolicy::Exclusive`].
    compiling: Mutex<HashMap<CacheKey, Arc<Mutex<()>>>>,
    persistent: Option<Box<dyn PersistentStore>>,
    policy: CompilePolicy,
}

impl ArtifactRegistry {
    /// Creates an empty registry with no persistent backing.
    pub fn new(policy: CompilePolicy) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            compiling: Mutex::new(HashMap::new()),
            persistent: None,
            policy,
        }
    }

    /// Adds a persistent store behind the in-memory map.
    pub fn with_store(mut self, store: Box<dyn PersistentStore>) -> Self {
        self.persistent = Some(store);
        self
    }

    /// Returns the configured compile policy.
    pub fn policy(&self) -> CompilePolicy {
        self.policy
    }

    /// Returns `true` if a persistent store is attached.
    pub fn is_persistent(&self) -> bool {
        self.persistent.is_some()
    }

    /// Returns the artifact for `key`, compiling it on a miss.
    ///
    /// Lookup order: memory, then the persistent store (only when `stamp` is
    /// known, i.e. for file-bound templates), then `compile`. A freshly
    /// compiled artifact is written to the persistent store; a failed write
    /// is logged and otherwise ignored. Compile errors are returned as-is and
    /// nothing is cached for them.
    pub fn get_or_compile<E, F>(
        &self,
        key: &CacheKey,
        stamp: Option<FileStamp>,
        compile: F,
    ) -> Result<Arc<CompiledArtifact>, E>
    where
        F: FnOnce() -> Result<CompiledArtifact, E>,
    {
        if let Some(hit) = self.lookup(key) {
            tracing::debug!(key = %key, "artifact cache hit");
            return Ok(hit);
        }

        match self.policy {
            CompilePolicy::Shared => self.fill(key, stamp, compile),
            CompilePolicy::Exclusive => {
                let slot = Arc::clone(self.compiling.lock().entry(key.clone()).or_default());
                let _guard = slot.lock();
                // Another caller may have filled the entry while we waited.
                if let Some(hit) = self.lookup(key) {
                    tracing::debug!(key = %key, "artifact compiled by another caller");
                    return Ok(hit);
                }
                let result = self.fill(key, stamp, compile);
                self.compiling.lock().remove(key);
                result
            }
        }
    }

    /// Returns the in-memory artifact for `key`, if present.
    pub fn lookup(&self, key: &CacheKey) -> Option<Arc<CompiledArtifact>> {
        self.entries.read().get(key).cloned()
    }

    fn fill<E, F>(
        &self,
        key: &CacheKey,
        stamp: Option<FileStamp>,
        compile: F,
    ) -> Result<Arc<CompiledArtifact>, E>
    where
        F: FnOnce() -> Result<CompiledArtifact, E>,
    {
        if let (Some(store), Some(stamp)) = (&self.persistent, stamp) {
            if let Some(artifact) = store.load(key, stamp) {
                tracing::debug!(key = %key, %stamp, "artifact loaded from persistent store");
                return Ok(self.insert(key, artifact));
            }
        }

        tracing::debug!(key = %key, "artifact cache miss, compiling");
        let artifact = compile()?;

        if let (Some(store), Some(stamp)) = (&self.persistent, stamp) {
            if let Err(e) = store.store(key, stamp, &artifact) {
                tracing::warn!(key = %key, error = %e, "failed to persist compiled artifact");
            }
        }
        Ok(self.insert(key, artifact))
    }

    fn insert(&self, key: &CacheKey, artifact: CompiledArtifact) -> Arc<CompiledArtifact> {
        let mut entries = self.entries.write();
        Arc::clone(
            entries
                .entry(key.clone())
                .or_insert_with(|| Arc::new(artifact)),
        )
    }

    /// Returns the number of cached artifacts.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drops every in-memory artifact. The persistent store is untouched.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Drops artifacts compiled from any body other than `signature`.
    ///
    /// Returns the number of entries removed.
    pub fn retain_signature(&self, signature: ContentHash) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|key, _| key.signature == signature);
        before - entries.len()
    }
}

impl fmt::Debug for ArtifactRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactRegistry")
            .field("entries", &self.len())
            .field("persistent", &self.is_persistent())
            .field("policy", &self.policy)
            .finish()
    }
}
