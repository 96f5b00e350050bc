//! File modification stamps used for reload detection and disk cache keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// A file modification time, in nanoseconds since the Unix epoch.
///
/// Only equality matters to the engine: a template is re-read when the
/// current stamp differs from the one recorded at the last read, in either
/// direction.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct FileStamp(u64);

impl FileStamp {
    /// Creates a stamp from a raw nanosecond count.
    pub fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Returns the raw nanosecond count.
    pub fn as_nanos(self) -> u64 {
        self.0
    }

    /// Converts a `SystemTime`. Times before the epoch collapse to zero.
    pub fn from_system_time(time: SystemTime) -> Self {
        let nanos = time
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX));
        Self(nanos)
    }

    /// Reads the modification time of the file at `path`.
    pub fn of_path(path: &Path) -> io::Result<Self> {
        let modified = std::fs::metadata(path)?.modified()?;
        Ok(Self::from_system_time(modified))
    }
}

impl fmt::Display for FileStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn from_system_time_epoch_offset() {
        let t = UNIX_EPOCH + Duration::from_secs(2);
        assert_eq!(FileStamp::from_system_time(t).as_nanos(), 2_000_000_000);
    }

    #[test]
    fn before_epoch_is_zero() {
        let t = UNIX_EPOCH - Duration::from_secs(10);
        assert_eq!(FileStamp::from_system_time(t), FileStamp::from_nanos(0));
    }

    #[test]
    fn of_path_reads_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.pt");
        std::fs::write(&path, "hello").unwrap();
        let stamp = FileStamp::of_path(&path).unwrap();
        assert!(stamp.as_nanos() > 0);
    }

    #[test]
    fn of_path_missing_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileStamp::of_path(&dir.path().join("missing.pt")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
