//! Shared test fixtures for the mutable table test suite.

use std::cmp::Ordering;

use crate::mutable_table::MutableTable;
use crate::table::Table;

/// Initialize tracing for tests; safe to call repeatedly, only the first
/// call takes effect.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

/// Test value: a key, a tombstone flag, and an arbitrary payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestValue {
    pub key: u64,
    pub tombstone: bool,
    pub payload: u64,
}

/// Test `Table` descriptor: `u64` keys, up to 4 values per data block, up
/// to 1024 data blocks — matching the scenarios in spec.md §8.
pub struct TestTable;

impl Table for TestTable {
    type Key = u64;
    type Value = TestValue;

    const DATA_VALUE_COUNT_MAX: usize = 4;
    const DATA_BLOCK_COUNT_MAX: usize = 1024;

    fn key_of(value: &TestValue) -> u64 {
        value.key
    }

    fn compare(a: &u64, b: &u64) -> Ordering {
        a.cmp(b)
    }

    fn tombstone_of(key: u64) -> TestValue {
        TestValue {
            key,
            tombstone: true,
            payload: 0,
        }
    }

    fn is_tombstone(value: &TestValue) -> bool {
        value.tombstone
    }
}

/// Convenience constructor for a live (non-tombstone) test value.
pub fn live(key: u64, payload: u64) -> TestValue {
    TestValue {
        key,
        tombstone: false,
        payload,
    }
}

/// A mutable table with `batch_multiple == 1`, so `value_count_max ==
/// commit_count_max`.
pub type SingleBatchTable = MutableTable<TestTable, 1>;

/// Builds a `value_count_max`-sized scratch buffer for
/// `sort_into_values_and_clear`.
pub fn scratch(len: usize) -> Vec<TestValue> {
    vec![
        TestValue {
            key: 0,
            tombstone: false,
            payload: 0,
        };
        len
    ]
}
