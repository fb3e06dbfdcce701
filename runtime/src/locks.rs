//! Keyed mutual exclusion with bounded waits.
//!
//! Keys are hashed onto a fixed set of stripes. An action holding several
//! keys takes their stripes in ascending index order, so two multi-key
//! actions can never wait on each other in a cycle. Distinct keys may share a
//! stripe; that only serializes more than strictly needed.

use crate::error::StoreError;
use smallvec::SmallVec;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::Instant;

/// Default number of stripes.
pub const DEFAULT_STRIPES: usize = 64;

/// Striped set of async mutexes addressed by key.
#[derive(Debug)]
pub struct KeyedLocks {
    stripes: Box<[Arc<Mutex<()>>]>,
}

/// Guards for every stripe an action holds. Released on drop.
#[derive(Debug)]
pub struct KeyGuard {
    held: SmallVec<[OwnedMutexGuard<()>; 4]>,
}

impl KeyGuard {
    /// Number of distinct stripes held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.held.len()
    }

    /// True when the action needed no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}

impl KeyedLocks {
    /// Create a lock set with `stripes` slots (at least one).
    #[must_use]
    pub fn new(stripes: usize) -> Self {
        let stripes = (0..stripes.max(1))
            .map(|_| Arc::new(Mutex::new(())))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self { stripes }
    }

    /// Stripe index a key maps to.
    ///
    /// `DefaultHasher::new()` uses fixed keys, so the mapping is stable for
    /// the life of the process.
    #[must_use]
    pub fn stripe_of<K: Hash + ?Sized>(&self, key: &K) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let len = u64::try_from(self.stripes.len()).unwrap_or(u64::MAX);
        usize::try_from(hasher.finish() % len).unwrap_or(0)
    }

    /// Acquire every stripe covering `keys`, in ascending order, before
    /// `deadline`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if any stripe cannot be taken in time.
    /// Stripes already taken are released before returning.
    pub async fn acquire<K: Hash>(
        &self,
        keys: &[K],
        deadline: Instant,
    ) -> Result<KeyGuard, StoreError> {
        let started = Instant::now();

        let mut indices: SmallVec<[usize; 4]> = keys.iter().map(|k| self.stripe_of(k)).collect();
        indices.sort_unstable();
        indices.dedup();

        let mut held = SmallVec::with_capacity(indices.len());
        for index in indices {
            let stripe = Arc::clone(&self.stripes[index]);
            match tokio::time::timeout_at(deadline, stripe.lock_owned()).await {
                Ok(guard) => held.push(guard),
                Err(_) => {
                    let waited = started.elapsed();
                    tracing::warn!(stripe = index, ?waited, "Timed out waiting for key lock");
                    return Err(StoreError::Timeout { waited });
                }
            }
        }

        Ok(KeyGuard { held })
    }
}

impl Default for KeyedLocks {
    fn default() -> Self {
        Self::new(DEFAULT_STRIPES)
    }
}
