//! # Table descriptor
//!
//! The [`Table`] trait is the dependency surface a [`crate::mutable_table::MutableTable`]
//! is generic over. It supplies everything the mutable table needs to know
//! about the key/value types it stores without ever naming them concretely:
//! how to pull a key out of a value, how keys compare, how to manufacture a
//! tombstone, and the on-disk block layout constants that bound how many
//! values a single mutable table may ever hold.
//!
//! A real implementation of this trait lives with the immutable on-disk
//! table it describes — this crate only consumes it.

use std::cmp::Ordering;
use std::hash::Hash;

/// Describes the key/value types and layout constants a [`crate::mutable_table::MutableTable`]
/// is parameterized over.
///
/// # Contract
///
/// - `key_of` must be a pure function of its argument: two calls with
///   equal values (by [`Table::compare`] on their extracted keys) must
///   return equal keys.
/// - `compare` must be a total order.
/// - `tombstone_of(k)` must return a value `v` such that `key_of(&v) == k`
///   and `is_tombstone(&v)` is `true`.
pub trait Table {
    /// The key type extracted from a value.
    type Key: Clone + Eq + Hash;

    /// The value type stored in the mutable table. Embeds its own key.
    type Value;

    /// Maximum number of values a single on-disk data block can hold.
    ///
    /// Used, together with [`Table::DATA_BLOCK_COUNT_MAX`], to bound the
    /// mutable table's capacity to what the downstream immutable table
    /// can absorb in one drain.
    const DATA_VALUE_COUNT_MAX: usize;

    /// Maximum number of data blocks in the target immutable table.
    const DATA_BLOCK_COUNT_MAX: usize;

    /// Extracts the key embedded in a value.
    fn key_of(value: &Self::Value) -> Self::Key;

    /// Total order over keys.
    fn compare(a: &Self::Key, b: &Self::Key) -> Ordering;

    /// Constructs a sentinel value carrying `key` and marked as a deletion.
    fn tombstone_of(key: Self::Key) -> Self::Value;

    /// Reports whether `value` is a tombstone.
    ///
    /// The mutable table never calls this itself — coalescing only needs
    /// `key_of`, and a stored tombstone replaces a stored live value (or
    /// vice versa) uniformly, without the table ever needing to know
    /// which is which. This exists purely for hosts and callers that do
    /// need to distinguish a live hit from a deletion record after a
    /// `get` or after reading a drained, sorted sequence.
    fn is_tombstone(value: &Self::Value) -> bool;
}
