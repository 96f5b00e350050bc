//! Compiled-artifact caching for the cinder template engine.
//!
//! Each template owns an [`ArtifactRegistry`]: an in-memory map from
//! [`CacheKey`] (signature, macro, call-site variable names) to a shared
//! [`CompiledArtifact`]. A registry may be backed by a [`PersistentStore`];
//! [`DiskStore`] keeps artifacts in a cache directory keyed additionally by
//! the template file's modification stamp, so they survive process restarts.

#![warn(missing_docs)]

pub mod artifact;
pub mod disk;
pub mod error;
pub mod key;
pub mod persist;
pub mod registry;

pub use artifact::CompiledArtifact;
pub use disk::DiskStore;
pub use error::CacheError;
pub use key::{build_key, CacheKey};
pub use persist::PersistentStore;
pub use registry::{ArtifactRegistry, CompilePolicy};
