//! # Mutable Table
//!
//! ## Design Invariants
//!
//! - At most one value is stored per distinct key: a `put` over an
//!   existing key replaces it, a `remove` over an existing key replaces
//!   it with a tombstone, and a `put` following a `remove` replaces the
//!   tombstone. There is no multi-version retention.
//! - `count()` never exceeds `value_count_max`, which is fixed at
//!   construction and never grows.
//! - Nothing allocates between construction and teardown; the backing
//!   hash map is pre-sized to `value_count_max` up front.
//!
//! ## Flush Semantics
//!
//! - [`MutableTable::sort_into_values_and_clear`] drains every stored
//!   value into a caller-owned scratch slice, sorts the occupied prefix
//!   in ascending key order, and empties the table (retaining its
//!   backing capacity).
//! - Tombstones are emitted indistinguishably from live values; it is
//!   the caller's responsibility to honor them downstream.
//!
//! ## Concurrency
//!
//! None. This is a plain, single-threaded buffer — no internal locking,
//! no suspension points. Callers are expected to drive it from one
//! logical task at a time.

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::collections::TryReserveError;

use thiserror::Error;
use tracing::trace;

use crate::table::Table;

/// Errors that can occur while constructing a [`MutableTable`].
///
/// Every other precondition violation (capacity overflow, clearing an
/// empty table, a wrong-sized scratch slice, a zero `commit_count_max`)
/// is a programming error and is reported by assertion rather than by
/// this type — see the module-level docs and spec section on error
/// handling.
#[derive(Debug, Error)]
pub enum MutableTableError {
    /// The backing hash map could not be pre-sized to `value_count_max`.
    #[error("failed to reserve capacity for {value_count_max} values: {source}")]
    OutOfMemory {
        value_count_max: usize,
        #[source]
        source: TryReserveError,
    },
}

/// A capacity-bounded, key-coalescing, hash-indexed write buffer.
///
/// `T` is the [`Table`] descriptor supplying key/value types and the
/// callbacks needed to extract keys, compare them, and manufacture
/// tombstones. `BATCH_MULTIPLE` is the compile-time constant governing
/// how many commits of up to `commit_count_max` values may accumulate
/// before a mandatory flush; it is a const generic parameter rather than
/// a runtime field so the capacity arithmetic is resolved once, at
/// compile time, and the hot path never branches on it.
///
/// # Example
///
/// ```
/// use mutable_table::{MutableTable, Table};
/// use std::cmp::Ordering;
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Value {
///     key: u64,
///     tombstone: bool,
///     payload: u64,
/// }
///
/// struct Descriptor;
///
/// impl Table for Descriptor {
///     type Key = u64;
///     type Value = Value;
///
///     const DATA_VALUE_COUNT_MAX: usize = 4;
///     const DATA_BLOCK_COUNT_MAX: usize = 16;
///
///     fn key_of(value: &Value) -> u64 {
///         value.key
///     }
///
///     fn compare(a: &u64, b: &u64) -> Ordering {
///         a.cmp(b)
///     }
///
///     fn tombstone_of(key: u64) -> Value {
///         Value { key, tombstone: true, payload: 0 }
///     }
///
///     fn is_tombstone(value: &Value) -> bool {
///         value.tombstone
///     }
/// }
///
/// let mut table: MutableTable<Descriptor, 1> = MutableTable::new(4).unwrap();
/// table.put(Value { key: 3, tombstone: false, payload: 10 });
/// table.put(Value { key: 3, tombstone: false, payload: 20 });
/// table.put(Value { key: 7, tombstone: false, payload: 5 });
/// assert_eq!(table.count(), 2);
///
/// let mut scratch = vec![
///     Value { key: 0, tombstone: false, payload: 0 };
///     table.value_count_max()
/// ];
/// let sorted = table.sort_into_values_and_clear(&mut scratch);
/// assert_eq!(sorted, &[
///     Value { key: 3, tombstone: false, payload: 20 },
///     Value { key: 7, tombstone: false, payload: 5 },
/// ]);
/// assert_eq!(table.count(), 0);
/// ```
pub struct MutableTable<T: Table, const BATCH_MULTIPLE: usize> {
    values: HashMap<T::Key, T::Value>,
    value_count_max: usize,
}

impl<T: Table, const BATCH_MULTIPLE: usize> MutableTable<T, BATCH_MULTIPLE> {
    /// Creates an empty mutable table sized to hold `commit_count_max *
    /// BATCH_MULTIPLE` values.
    ///
    /// # Panics
    ///
    /// Panics (fails fast) if `commit_count_max` is zero, if
    /// `BATCH_MULTIPLE` is zero, or if the resulting `value_count_max`
    /// would require more data blocks than `T::DATA_BLOCK_COUNT_MAX`
    /// permits — all are construction-time invariants of the host's own
    /// configuration, not runtime conditions to recover from.
    ///
    /// # Errors
    ///
    /// Returns [`MutableTableError::OutOfMemory`] if the backing hash
    /// map cannot be pre-sized to `value_count_max`. This is the only
    /// recoverable failure mode: once constructed, steady-state
    /// operation never allocates.
    pub fn new(commit_count_max: usize) -> Result<Self, MutableTableError> {
        assert!(
            commit_count_max > 0,
            "commit_count_max must be greater than zero"
        );
        assert!(BATCH_MULTIPLE > 0, "BATCH_MULTIPLE must be greater than zero");

        let value_count_max = commit_count_max
            .checked_mul(BATCH_MULTIPLE)
            .expect("commit_count_max * BATCH_MULTIPLE overflowed usize");

        let data_block_count = value_count_max.div_ceil(T::DATA_VALUE_COUNT_MAX);
        assert!(
            data_block_count <= T::DATA_BLOCK_COUNT_MAX,
            "mutable table of {value_count_max} values needs {data_block_count} data \
             blocks, exceeding DATA_BLOCK_COUNT_MAX ({})",
            T::DATA_BLOCK_COUNT_MAX
        );

        let mut values = HashMap::new();
        values
            .try_reserve(value_count_max)
            .map_err(|source| MutableTableError::OutOfMemory {
                value_count_max,
                source,
            })?;

        trace!(value_count_max, "mutable table constructed");

        Ok(Self {
            values,
            value_count_max,
        })
    }

    /// The maximum number of distinct keys this table may ever hold.
    pub fn value_count_max(&self) -> usize {
        self.value_count_max
    }

    /// Returns a reference to the stored value for `key`, if present.
    ///
    /// The returned value may be a live value or a tombstone; callers
    /// inspect it (via [`Table::is_tombstone`]) to tell the two apart.
    /// The reference is valid until the next mutating call on this
    /// table.
    pub fn get(&self, key: &T::Key) -> Option<&T::Value> {
        self.values.get(key)
    }

    /// Inserts or overwrites the value for `key_of(&value)`.
    ///
    /// A put over an existing key overwrites it; a put following a
    /// `remove` on the same key replaces the tombstone.
    ///
    /// # Panics
    ///
    /// Panics if this insertion would push `count()` past
    /// `value_count_max`. Callers are expected to gate writes by
    /// consulting [`MutableTable::cannot_commit_batch`] first.
    pub fn put(&mut self, value: T::Value) {
        let key = T::key_of(&value);
        trace!(count = self.values.len(), "put() started");

        self.values.insert(key, value);

        assert!(
            self.values.len() <= self.value_count_max,
            "mutable table exceeded value_count_max ({}) after put",
            self.value_count_max
        );
    }

    /// Replaces the value for `key` with a tombstone.
    ///
    /// A remove over an existing key replaces it; a remove over an
    /// absent key inserts a fresh tombstone so that a subsequent `get`
    /// observes the deletion.
    ///
    /// # Panics
    ///
    /// Panics if this insertion would push `count()` past
    /// `value_count_max`.
    pub fn remove(&mut self, key: T::Key) {
        trace!(count = self.values.len(), "remove() started");

        let tombstone = T::tombstone_of(key.clone());
        self.values.insert(key, tombstone);

        assert!(
            self.values.len() <= self.value_count_max,
            "mutable table exceeded value_count_max ({}) after remove",
            self.value_count_max
        );
    }

    /// Reports whether committing `n` more values would exceed
    /// `value_count_max`.
    ///
    /// Hosts are expected to call this before admitting a batch of
    /// writes, rather than relying on `put`/`remove` to panic.
    ///
    /// # Panics
    ///
    /// Panics if `n` itself exceeds `value_count_max` — no single batch
    /// can ever fit regardless of current occupancy, which indicates a
    /// misconfigured caller.
    pub fn cannot_commit_batch(&self, n: usize) -> bool {
        assert!(
            n <= self.value_count_max,
            "batch of {n} values can never fit in a table sized to {}",
            self.value_count_max
        );
        self.values.len() + n > self.value_count_max
    }

    /// The number of distinct keys currently stored.
    pub fn count(&self) -> usize {
        self.values.len()
    }

    /// Empties the table without releasing its backing capacity.
    ///
    /// # Panics
    ///
    /// Panics if the table is already empty.
    pub fn clear(&mut self) {
        assert!(!self.values.is_empty(), "clear() called on an empty table");
        self.values.clear();
    }

    /// Drains every stored value into `out`, sorts the occupied prefix
    /// in ascending key order, empties the table, and returns the sorted
    /// prefix as a view over `out`.
    ///
    /// `out` must have exactly `value_count_max` elements; this is the
    /// scratch buffer the caller is expected to reuse across tables, and
    /// its full length — not just the occupied prefix — is asserted to
    /// catch host-side size mismatches early. Elements of `out` beyond
    /// the returned prefix are left untouched from the caller's
    /// perspective (this call may overwrite them with dropped contents
    /// from a previous use, but never reads them).
    ///
    /// The returned slice borrows `out` and is only valid until the
    /// caller next writes to or frees that scratch buffer — this table
    /// retains no reference to it after the call returns.
    ///
    /// # Panics
    ///
    /// Panics if the table is empty, or if `out.len() !=
    /// value_count_max`.
    pub fn sort_into_values_and_clear<'out>(
        &mut self,
        out: &'out mut [T::Value],
    ) -> &'out [T::Value] {
        assert!(
            !self.values.is_empty(),
            "sort_into_values_and_clear() called on an empty table"
        );
        assert_eq!(
            out.len(),
            self.value_count_max,
            "scratch slice must have exactly value_count_max ({}) elements",
            self.value_count_max
        );

        let count = self.values.len();
        trace!(count, "sort_into_values_and_clear() started");

        for (slot, (_, value)) in out.iter_mut().zip(self.values.drain()) {
            *slot = value;
        }

        let sorted = &mut out[..count];
        sorted.sort_unstable_by(|a, b| T::compare(&T::key_of(a), &T::key_of(b)));

        trace!(count, "sort_into_values_and_clear() finished");
        sorted
    }
}
