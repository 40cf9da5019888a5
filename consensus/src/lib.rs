//! The DAG consensus core: accepts blocks into the block DAG, resolves
//! their UTXO state and tracks the selected parent chain.

#[macro_use]
extern crate log;
extern crate parking_lot;

extern crate primitives;
extern crate chain;
extern crate network;
extern crate script;
extern crate serialization as ser;
extern crate storage;
extern crate db;
extern crate verification;
extern crate dagcrypto as crypto;

#[cfg(test)]
extern crate test_data;

pub mod reachability;

mod chain_tracker;
mod dag;
mod ghostdag;
mod index_manager;
mod state_manager;

pub use primitives::{hash, compact};

pub use chain_tracker::ChainTracker;
pub use dag::{BlockDag, BlockInfo, SubmitBlockResponse};
pub use ghostdag::ghostdag;
pub use index_manager::IndexManager;
pub use reachability::ReachabilityIndex;
