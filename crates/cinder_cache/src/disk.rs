//! On-disk artifact persistence.
//!
//! Artifacts for one template file live in their own subdirectory of the
//! cache directory, named after a hash of the template path. Each file is
//! `<key digest>.<mtime stamp>.cpt` and starts with a validated binary header
//! containing magic bytes, a format version, and a payload checksum.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use cinder_common::{ContentHash, FileStamp};
use serde::{Deserialize, Serialize};

use crate::artifact::{from_bytes, to_bytes, CompiledArtifact};
use crate::error::CacheError;
use crate::key::CacheKey;
use crate::persist::PersistentStore;

/// Distinguishes temp files of concurrent writers within one process.
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Magic bytes identifying a cinder cache artifact.
const ARTIFACT_MAGIC: [u8; 4] = *b"CNDR";

/// Current artifact format version. Increment on breaking changes to
/// the header or payload format.
const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// File extension of persisted artifacts.
const ARTIFACT_EXT: &str = "cpt";

/// Header prepended to every persisted artifact for validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactHeader {
    /// Magic bytes: must be `b"CNDR"`.
    pub magic: [u8; 4],

    /// Artifact format version.
    pub format_version: u32,

    /// Version of the crate that produced this artifact.
    pub producer_version: String,

    /// Content hash of the payload data (for integrity checks).
    pub checksum: ContentHash,
}

/// The payload: the artifact together with the full key it was compiled for.
#[derive(Serialize, Deserialize)]
struct StoredArtifact {
    key: CacheKey,
    artifact: CompiledArtifact,
}

/// File-backed [`PersistentStore`] for one template file.
#[derive(Debug, Clone)]
pub struct DiskStore {
    /// `<cachedir>/<hash of template path>`.
    dir: PathBuf,
}

impl DiskStore {
    /// Creates a store for the template at `template_path`, rooted at `cachedir`.
    ///
    /// Nothing is created on disk until the first artifact is stored.
    pub fn new(cachedir: &Path, template_path: &Path) -> Self {
        let scope = ContentHash::of_str(&template_path.to_string_lossy());
        Self {
            dir: cachedir.join(scope.to_string()),
        }
    }

    /// Returns the directory holding this template's artifacts.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file path for the artifact of `(key, stamp)`.
    pub fn artifact_path(&self, key: &CacheKey, stamp: FileStamp) -> PathBuf {
        self.dir
            .join(format!("{}.{}.{ARTIFACT_EXT}", key.digest(), stamp))
    }

    /// Reads and validates the artifact at `path` for `key`.
    fn read_artifact(&self, path: &Path, key: &CacheKey) -> Result<CompiledArtifact, CacheError> {
        let raw = std::fs::read(path).map_err(|e| CacheError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let invalid = || CacheError::InvalidHeader {
            path: path.to_path_buf(),
        };

        // 4-byte header length (little-endian) + header + payload
        let len_bytes: [u8; 4] = raw
            .get(..4)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(invalid)?;
        let header_len = u32::from_le_bytes(len_bytes) as usize;
        let header_end = 4usize.checked_add(header_len).ok_or_else(invalid)?;
        let header_bytes = raw.get(4..header_end).ok_or_else(invalid)?;

        let header: ArtifactHeader = from_bytes(header_bytes).map_err(|_| invalid())?;

        if header.magic != ARTIFACT_MAGIC {
            return Err(invalid());
        }
        if header.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(CacheError::VersionMismatch {
                expected: ARTIFACT_FORMAT_VERSION,
                found: header.format_version,
            });
        }

        let payload = &raw[header_end..];
        if ContentHash::from_bytes(payload) != header.checksum {
            return Err(CacheError::ChecksumMismatch {
                path: path.to_path_buf(),
            });
        }

        let stored: StoredArtifact = from_bytes(payload)?;
        if &stored.key != key {
            return Err(CacheError::KeyMismatch {
                path: path.to_path_buf(),
            });
        }
        Ok(stored.artifact)
    }

    /// Removes artifacts recorded under any stamp other than `current`.
    ///
    /// Returns the number of files removed. A missing directory removes
    /// nothing.
    pub fn gc(&self, current: FileStamp) -> Result<usize, CacheError> {
        if !self.dir.exists() {
            return Ok(0);
        }

        let io_err = |path: &Path, e| CacheError::Io {
            path: path.to_path_buf(),
            source: e,
        };
        let mut removed = 0;
        let entries = std::fs::read_dir(&self.dir).map_err(|e| io_err(self.dir.as_path(), e))?;
        let current = current.to_string();

        for entry in entries {
            let path = entry.map_err(|e| io_err(self.dir.as_path(), e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ARTIFACT_EXT) {
                continue;
            }
            let stamp = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|stem| stem.rsplit_once('.'))
                .map(|(_, stamp)| stamp);
            if stamp != Some(current.as_str()) {
                std::fs::remove_file(&path).map_err(|e| io_err(&path, e))?;
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::debug!(dir = %self.dir.display(), removed, "collected stale artifacts");
        }
        Ok(removed)
    }
}

impl PersistentStore for DiskStore {
    fn load(&self, key: &CacheKey, stamp: FileStamp) -> Option<CompiledArtifact> {
        let path = self.artifact_path(key, stamp);
        if !path.exists() {
            return None;
        }
        match self.read_artifact(&path, key) {
            Ok(artifact) => Some(artifact),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "ignoring unusable artifact");
                None
            }
        }
    }

    fn store(
        &self,
        key: &CacheKey,
        stamp: FileStamp,
        artifact: &CompiledArtifact,
    ) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| CacheError::Io {
            path: self.dir.clone(),
            source: e,
        })?;

        let stored = StoredArtifact {
            key: key.clone(),
            artifact: artifact.clone(),
        };
        let payload = to_bytes(&stored)?;

        let header = ArtifactHeader {
            magic: ARTIFACT_MAGIC,
            format_version: ARTIFACT_FORMAT_VERSION,
            producer_version: env!("CARGO_PKG_VERSION").to_string(),
            checksum: ContentHash::from_bytes(&payload),
        };
        let header_bytes = to_bytes(&header)?;

        let header_len = header_bytes.len() as u32;
        let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
        output.extend_from_slice(&header_len.to_le_bytes());
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(&payload);

        // Write beside the target and rename, so concurrent writers of the
        // same entry never leave a torn file behind.
        let path = self.artifact_path(key, stamp);
        let tmp = path.with_extension(format!(
            "{}.{}.tmp",
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        if let Err(e) = std::fs::write(&tmp, &output) {
            let _ = std::fs::remove_file(&tmp);
            return Err(CacheError::Io {
                path: tmp,
                source: e,
            });
        }
        std::fs::rename(&tmp, &path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            CacheError::Io { path, source: e }
        })
    }
}
