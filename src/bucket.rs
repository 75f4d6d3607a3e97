//! # Bucket Strategies
//!
//! A bucket is the accumulation cell stored under one key of a
//! [`BucketMap`](crate::bucket_map::BucketMap). The strategy decides how the
//! first value seeds a bucket and how later values fold into it.

use std::ops::AddAssign;

/// How values combine into a bucket.
///
/// `create` seeds a bucket from the first value inserted under a key;
/// `accumulate` folds every later value into the stored bucket in place.
pub trait Bucket<V> {
    type Output;

    fn create(&self, value: V) -> Self::Output;

    fn accumulate(&self, bucket: &mut Self::Output, value: V);
}

/// Weighted counting: the bucket holds the sum of every inserted value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SumBucket;

impl<V: AddAssign> Bucket<V> for SumBucket {
    type Output = V;

    #[inline]
    fn create(&self, value: V) -> V {
        value
    }

    #[inline]
    fn accumulate(&self, bucket: &mut V, value: V) {
        *bucket += value;
    }
}

/// Presence counting: the bucket holds how many values were inserted,
/// whatever they were.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OccurrenceBucket;

impl<V> Bucket<V> for OccurrenceBucket {
    type Output = u64;

    #[inline]
    fn create(&self, _value: V) -> u64 {
        1
    }

    #[inline]
    fn accumulate(&self, bucket: &mut u64, _value: V) {
        *bucket += 1;
    }
}

/// Grouping: the bucket holds every inserted value in insertion order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListBucket;

impl<V> Bucket<V> for ListBucket {
    type Output = Vec<V>;

    fn create(&self, value: V) -> Vec<V> {
        vec![value]
    }

    fn accumulate(&self, bucket: &mut Vec<V>, value: V) {
        bucket.push(value);
    }
}
