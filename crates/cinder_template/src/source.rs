//! Template source state and file reload detection.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cinder_common::{ContentHash, FileStamp};
use parking_lot::RwLock;

use crate::error::RenderError;

/// The current body of a template and what was derived from it.
#[derive(Debug, Clone)]
pub struct SourceSnapshot {
    /// The template body.
    pub body: Arc<str>,
    /// Signature of `body`.
    pub signature: ContentHash,
    /// File modification stamp at the time `body` was read; `None` for
    /// templates created from a string.
    pub stamp: Option<FileStamp>,
}

impl SourceSnapshot {
    /// Creates a snapshot for an in-memory body.
    pub fn inline(body: impl Into<Arc<str>>) -> Self {
        let body = body.into();
        Self {
            signature: ContentHash::of_str(&body),
            body,
            stamp: None,
        }
    }

    /// Reads the template file at `path`.
    ///
    /// The stamp is taken before the body is read, so a write racing with
    /// the read is seen as a change by the next reload check.
    pub fn read(path: &Path) -> Result<Self, RenderError> {
        let source_err = |e| RenderError::SourceRead {
            path: path.to_path_buf(),
            source: e,
        };
        let stamp = FileStamp::of_path(path).map_err(source_err)?;
        let body = std::fs::read_to_string(path).map_err(source_err)?;
        Ok(Self {
            signature: ContentHash::of_str(&body),
            body: body.into(),
            stamp: Some(stamp),
        })
    }
}

/// Source state of a template, swapped in place on reload.
#[derive(Debug)]
pub(crate) struct SourceState {
    current: RwLock<SourceSnapshot>,
    path: Option<PathBuf>,
    auto_reload: bool,
}

impl SourceState {
    pub(crate) fn inline(body: impl Into<Arc<str>>) -> Self {
        Self {
            current: RwLock::new(SourceSnapshot::inline(body)),
            path: None,
            auto_reload: false,
        }
    }

    pub(crate) fn file(path: PathBuf, auto_reload: bool) -> Result<Self, RenderError> {
        let snapshot = SourceSnapshot::read(&path)?;
        Ok(Self {
            current: RwLock::new(snapshot),
            path: Some(path),
            auto_reload,
        })
    }

    pub(crate) fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn snapshot(&self) -> SourceSnapshot {
        self.current.read().clone()
    }

    /// Re-reads the file if `auto_reload` is on and its stamp has changed.
    ///
    /// Returns the snapshot to render with and whether a reload happened.
    /// A missing or unreadable file is an error even when the stamp would
    /// not have changed.
    pub(crate) fn refresh(&self) -> Result<(SourceSnapshot, bool), RenderError> {
        let path = match (&self.path, self.auto_reload) {
            (Some(path), true) => path,
            _ => return Ok((self.snapshot(), false)),
        };

        let now = FileStamp::of_path(path).map_err(|e| RenderError::SourceRead {
            path: path.clone(),
            source: e,
        })?;
        {
            let current = self.current.read();
            if current.stamp == Some(now) {
                return Ok((current.clone(), false));
            }
        }

        let mut current = self.current.write();
        // Another renderer may have reloaded while we waited for the lock.
        if current.stamp == Some(now) {
            return Ok((current.clone(), false));
        }
        let fresh = SourceSnapshot::read(path)?;
        tracing::info!(
            path = %path.display(),
            signature = %fresh.signature.short(),
            "template file changed, reloaded"
        );
        *current = fresh.clone();
        Ok((fresh, true))
    }
}

/// Path of the generated-program listing for a template file.
pub(crate) fn listing_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".source");
    PathBuf::from(name)
}
