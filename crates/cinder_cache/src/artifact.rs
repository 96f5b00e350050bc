//! The compiled artifact and its binary encoding.

use cinder_common::Variables;
use cinder_diagnostics::AnnotationTable;
use cinder_runtime::{GlobalsTable, Program};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Encodes `value` with the bincode configuration used for every cache file.
pub(crate) fn to_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, CacheError> {
    bincode::serde::encode_to_vec(value, bincode::config::standard()).map_err(|e| {
        CacheError::Serialization {
            reason: e.to_string(),
        }
    })
}

/// Decodes a value written by [`to_bytes`].
pub(crate) fn from_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CacheError> {
    bincode::serde::decode_from_slice(bytes, bincode::config::standard())
        .map(|(value, _)| value)
        .map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })
}

/// Everything produced by compiling one [`CacheKey`](crate::CacheKey).
///
/// Immutable once built; registries hand out shared references.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct CompiledArtifact {
    /// The executable unit.
    pub program: Program,
    /// Local name to builtin symbol for every global the program calls.
    pub globals: GlobalsTable,
    /// Generated line to construct description, sparse.
    pub annotations: AnnotationTable,
    /// Variables injected by the template itself; these override caller
    /// variables of the same name.
    pub selectors: Variables,
}

impl CompiledArtifact {
    /// Encodes the artifact with bincode.
    pub fn encode(&self) -> Result<Vec<u8>, CacheError> {
        to_bytes(self)
    }

    /// Decodes an artifact previously produced by [`encode`](Self::encode).
    pub fn decode(bytes: &[u8]) -> Result<Self, CacheError> {
        from_bytes(bytes)
    }
}
