//! Cache keys for compiled artifacts.

use std::collections::BTreeSet;
use std::fmt;

use cinder_common::ContentHash;
use serde::{Deserialize, Serialize};

/// Identity of one compiled shape of a template.
///
/// The cache is over code shape, not data: two renders with the same
/// variable names but different values share a key, while adding, removing,
/// or renaming a variable yields a new key. Variable names are held in a
/// sorted set so keyword order never matters.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct CacheKey {
    /// Signature of the template body.
    pub signature: ContentHash,
    /// The macro being rendered, or `None` for the whole template.
    pub macro_name: Option<String>,
    /// Names of the variables supplied at the call site.
    pub variables: BTreeSet<String>,
}

impl CacheKey {
    /// Returns a stable digest of the full key, used to name persisted files.
    pub fn digest(&self) -> ContentHash {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(self.signature.as_bytes());
        match &self.macro_name {
            Some(name) => {
                buf.push(1);
                push_field(&mut buf, name);
            }
            None => buf.push(0),
        }
        for name in &self.variables {
            push_field(&mut buf, name);
        }
        ContentHash::from_bytes(&buf)
    }
}

/// Length-prefixes a field so adjacent names cannot run together.
fn push_field(buf: &mut Vec<u8>, field: &str) {
    buf.extend_from_slice(&(field.len() as u64).to_le_bytes());
    buf.extend_from_slice(field.as_bytes());
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.signature.short())?;
        if let Some(name) = &self.macro_name {
            write!(f, "#{name}")?;
        }
        f.write_str("(")?;
        for (i, name) in self.variables.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(name)?;
        }
        f.write_str(")")
    }
}

/// Builds the cache key for a render call.
///
/// `variable_names` may arrive in any order and may repeat; the key is the
/// same for every permutation.
pub fn build_key<I, S>(signature: ContentHash, macro_name: Option<&str>, variable_names: I) -> CacheKey
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    CacheKey {
        signature,
        macro_name: macro_name.map(str::to_string),
        variables: variable_names.into_iter().map(Into::into).collect(),
    }
}
