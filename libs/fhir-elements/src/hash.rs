//! Lazily computed structural hash codes

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

/// Cached structural hash of an immutable instance.
///
/// The cache is not part of the instance's identity: it always compares equal
/// and contributes nothing to `Hash`, so types holding one can derive
/// `PartialEq`/`Eq` over their declared fields.
#[derive(Clone, Default)]
pub struct HashCache(OnceLock<u64>);

impl HashCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value, computing it on first access.
    ///
    /// `compute` must be pure; a racing first access on another thread
    /// publishes the same value.
    pub fn get_or_compute(&self, compute: impl FnOnce() -> u64) -> u64 {
        *self.0.get_or_init(compute)
    }

    pub fn is_computed(&self) -> bool {
        self.0.get().is_some()
    }
}

impl PartialEq for HashCache {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for HashCache {}

impl Hash for HashCache {
    fn hash<H: Hasher>(&self, _state: &mut H) {}
}

impl fmt::Debug for HashCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashCache")
    }
}

/// Hash a value with a fixed-key hasher, so codes are stable across runs.
pub fn hash_of<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}
