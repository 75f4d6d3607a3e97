//! # Bucket Map
//!
//! Key to bucket mapping that applies a [`Bucket`] strategy on every insert.
//! The container is supplied by the caller, so the same map serves both an
//! ordered tally (`BTreeMap`) and a hash-keyed grouping (`hashbrown::HashMap`).

use crate::bucket::Bucket;
use std::collections::btree_map;
use std::collections::hash_map;
use std::collections::BTreeMap;
use std::hash::{BuildHasher, Hash};
use std::marker::PhantomData;

/// Container seam for [`BucketMap`].
///
/// Implementors store one bucket per key and fold a value into the bucket for
/// `key` with a single lookup.
pub trait BucketStore<K, B> {
    fn fold_in<V, S>(&mut self, key: K, value: V, strategy: &S)
    where
        S: Bucket<V, Output = B>;

    fn bucket(&self, key: &K) -> Option<&B>;

    fn bucket_count(&self) -> usize;
}

impl<K: Ord, B> BucketStore<K, B> for BTreeMap<K, B> {
    fn fold_in<V, S>(&mut self, key: K, value: V, strategy: &S)
    where
        S: Bucket<V, Output = B>,
    {
        match self.entry(key) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(strategy.create(value));
            }
            btree_map::Entry::Occupied(mut slot) => strategy.accumulate(slot.get_mut(), value),
        }
    }

    fn bucket(&self, key: &K) -> Option<&B> {
        self.get(key)
    }

    fn bucket_count(&self) -> usize {
        self.len()
    }
}

impl<K: Hash + Eq, B, H: BuildHasher> BucketStore<K, B> for std::collections::HashMap<K, B, H> {
    fn fold_in<V, S>(&mut self, key: K, value: V, strategy: &S)
    where
        S: Bucket<V, Output = B>,
    {
        match self.entry(key) {
            hash_map::Entry::Vacant(slot) => {
                slot.insert(strategy.create(value));
            }
            hash_map::Entry::Occupied(mut slot) => strategy.accumulate(slot.get_mut(), value),
        }
    }

    fn bucket(&self, key: &K) -> Option<&B> {
        self.get(key)
    }

    fn bucket_count(&self) -> usize {
        self.len()
    }
}

impl<K: Hash + Eq, B, H: BuildHasher> BucketStore<K, B> for hashbrown::HashMap<K, B, H> {
    fn fold_in<V, S>(&mut self, key: K, value: V, strategy: &S)
    where
        S: Bucket<V, Output = B>,
    {
        match self.entry(key) {
            hashbrown::hash_map::Entry::Vacant(slot) => {
                slot.insert(strategy.create(value));
            }
            hashbrown::hash_map::Entry::Occupied(mut slot) => {
                strategy.accumulate(slot.get_mut(), value)
            }
        }
    }

    fn bucket(&self, key: &K) -> Option<&B> {
        self.get(key)
    }

    fn bucket_count(&self) -> usize {
        self.len()
    }
}

/// Applies a bucket strategy over an injected container.
///
/// Each key maps to exactly one bucket, and that bucket always equals the fold
/// of every value inserted under the key, in insertion order.
#[derive(Debug, Clone)]
pub struct BucketMap<K, V, S, M> {
    map: M,
    strategy: S,
    _entries: PhantomData<fn(K, V)>,
}

impl<K, V, S, M> BucketMap<K, V, S, M>
where
    S: Bucket<V>,
    M: BucketStore<K, S::Output>,
{
    /// Wrap `map`, which may already hold buckets, and take ownership of it.
    pub fn new(map: M, strategy: S) -> Self {
        Self {
            map,
            strategy,
            _entries: PhantomData,
        }
    }

    /// Create the bucket for `key` on first insert, accumulate afterwards.
    #[inline]
    pub fn add(&mut self, key: K, value: V) {
        self.map.fold_in(key, value, &self.strategy);
    }

    /// Live view of the key to bucket mapping.
    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn into_map(self) -> M {
        self.map
    }

    pub fn get(&self, key: &K) -> Option<&S::Output> {
        self.map.bucket(key)
    }

    pub fn len(&self) -> usize {
        self.map.bucket_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Ord, V, S: Bucket<V>> BucketMap<K, V, S, BTreeMap<K, S::Output>> {
    /// Start from an empty key-ordered container.
    pub fn ordered(strategy: S) -> Self {
        Self::new(BTreeMap::new(), strategy)
    }
}
