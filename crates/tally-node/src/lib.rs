//! # tally-node: ledger storage, configuration and the event loop.
//!
//! - [`storage::RocksLedger`]: user records backed by RocksDB
//! - [`node::Node`]: event loop driving the [`tally_core::service::Service`]
//! - [`console`]: JSON-lines transport and list-based membership oracle
//! - [`config::NodeConfig`]: bot configuration

pub mod config;
pub mod console;
pub mod node;
pub mod storage;

pub use config::NodeConfig;
pub use node::Node;
pub use storage::RocksLedger;
