extern crate chain;
extern crate primitives;

mod consensus;
mod genesis;
mod network;

pub use primitives::{hash, compact};

pub use consensus::ConsensusParams;
pub use network::Network;
