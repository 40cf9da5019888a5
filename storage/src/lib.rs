extern crate primitives;
extern crate chain;
extern crate serialization as ser;
extern crate dagcrypto as crypto;

mod acceptance;
mod block_provider;
mod block_status;
mod chain_changes;
mod error;
mod ghostdag;
mod utxo;

pub use primitives::{hash, bytes};

pub use acceptance::{AcceptanceData, BlockAcceptanceData, TransactionAcceptanceData};
pub use block_provider::{BlockHeaderProvider, BlockProvider};
pub use block_status::BlockStatus;
pub use chain_changes::SelectedParentChainChanges;
pub use error::Error;
pub use ghostdag::GhostdagData;
pub use utxo::{UTXOEntry, UTXODiff, UTXOSet};

use hash::H256;

/// Read access to per-block consensus records. The concrete database in
/// the `db` crate implements all of these; staging overlays in the
/// consensus crate wrap them.
pub trait BlockStatusStore {
	fn block_status(&self, hash: &H256) -> Option<BlockStatus>;
}

pub trait GhostdagStore {
	fn ghostdag_data(&self, hash: &H256) -> Option<GhostdagData>;
}

pub trait UtxoDiffStore {
	/// The block's UTXO diff together with the hash of its diff child,
	/// if any. A missing child means the diff is anchored at the virtual.
	fn utxo_diff(&self, hash: &H256) -> Option<(UTXODiff, Option<H256>)>;
}

pub trait MultisetStore {
	fn multiset(&self, hash: &H256) -> Option<crypto::Multiset>;
}

pub trait AcceptanceDataStore {
	fn acceptance_data(&self, hash: &H256) -> Option<AcceptanceData>;
}
