//! Shared foundational types used across the cinder template engine.
//!
//! This crate provides content hashing for template signatures and cache keys,
//! file modification stamps for reload detection, and the [`Value`] data model
//! that render variables, selectors, and program literals are expressed in.

#![warn(missing_docs)]

pub mod hash;
pub mod stamp;
pub mod value;

pub use hash::ContentHash;
pub use stamp::FileStamp;
pub use value::{Value, Variables};
