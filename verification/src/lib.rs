//! DAG consensus verification
//!
//! Full block verification consists of two phases:
//! - sanity verification: context-free checks that depend on the block
//!   alone (`VerifyXXX` structures)
//! - contextual verification: checks against the block's resolved
//!   parents and, later, against its past UTXO (`AcceptXXX` structures)
//!
//! On block arrival the consensus facade runs `HeaderVerifier` +
//! `BlockVerifier`, resolves parents, runs `BlockAcceptor`, and the
//! consensus state manager finishes with `BlockUtxoAcceptor` once the
//! block's past UTXO is known.

#[macro_use]
extern crate log;
extern crate rayon;

extern crate primitives;
extern crate chain;
extern crate network;
extern crate script;
extern crate serialization as ser;
extern crate storage;

#[cfg(test)]
#[macro_use]
extern crate assert_matches;
#[cfg(test)]
extern crate test_data;

mod canon;
mod error;
mod fee;
mod mass;
mod sequence;
mod timestamp;
mod work;

// sanity verification
mod verify_block;
mod verify_header;
mod verify_transaction;

// contextual verification
mod accept_block;
mod accept_utxo;

pub use primitives::{bigint, hash, compact};

pub use canon::CanonBlock;
pub use error::{Error, TransactionError};
pub use fee::checked_transaction_fee;
pub use mass::{transaction_mass, transaction_mass_from_utxo, block_mass};
pub use sequence::{SequenceLock, sequence_lock_active, PastMedianTimeProvider};
pub use timestamp::{median_timestamp, MEDIAN_TIME_WINDOW};
pub use work::{block_subsidy, block_work, is_valid_proof_of_work, is_valid_proof_of_work_hash, required_difficulty};

pub use verify_block::BlockVerifier;
pub use verify_header::HeaderVerifier;
pub use verify_transaction::TransactionVerifier;

pub use accept_block::BlockAcceptor;
pub use accept_utxo::BlockUtxoAcceptor;

use primitives::hash::H256;

/// Ancestry queries answered by the reachability index.
pub trait DagTopology {
	/// Is `ancestor` in the past of `descendant` (or equal to it)?
	fn is_dag_ancestor_of(&self, ancestor: &H256, descendant: &H256) -> bool;
}
