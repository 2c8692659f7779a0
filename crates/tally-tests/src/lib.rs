//! Integration and property tests for Tally.
//!
//! The tests under `tests/` drive the whole service through inbound events
//! against recording doubles, and check the RocksDB ledger across restarts.

pub mod helpers;
