//! Typed access to the consensus database.

use bytes::Bytes;
use chain::{IndexedBlock, IndexedBlockHeader};
use crypto::Multiset;
use hash::H256;
use storage::{
	AcceptanceData, AcceptanceDataStore, BlockHeaderProvider, BlockProvider, BlockStatus,
	BlockStatusStore, Error, GhostdagData, GhostdagStore, MultisetStore, UTXODiff, UtxoDiffStore,
};
use kv::{Key, KeyState, KeyValue, KeyValueDatabase, Transaction, Value};

fn value_of<T>(db: &T, key: &Key) -> Option<Value> where T: KeyValueDatabase {
	match db.get(key) {
		Ok(state) => state.into_option(),
		Err(err) => {
			warn!(target: "db", "database read failed: {}", err);
			None
		},
	}
}

pub fn get_block<T>(db: &T, hash: &H256) -> Option<IndexedBlock> where T: KeyValueDatabase {
	value_of(db, &Key::Block(*hash)).and_then(Value::as_block)
}

pub fn get_block_status<T>(db: &T, hash: &H256) -> Option<BlockStatus> where T: KeyValueDatabase {
	value_of(db, &Key::BlockStatus(*hash)).and_then(Value::as_block_status)
}

pub fn get_ghostdag_data<T>(db: &T, hash: &H256) -> Option<GhostdagData> where T: KeyValueDatabase {
	value_of(db, &Key::Ghostdag(*hash)).and_then(Value::as_ghostdag)
}

pub fn get_utxo_diff<T>(db: &T, hash: &H256) -> Option<(UTXODiff, Option<H256>)> where T: KeyValueDatabase {
	value_of(db, &Key::UtxoDiff(*hash)).and_then(Value::as_utxo_diff)
}

pub fn get_multiset<T>(db: &T, hash: &H256) -> Option<Multiset> where T: KeyValueDatabase {
	value_of(db, &Key::Multiset(*hash)).and_then(Value::as_multiset)
}

pub fn get_reachability_data<T>(db: &T, hash: &H256) -> Option<Bytes> where T: KeyValueDatabase {
	value_of(db, &Key::Reachability(*hash)).and_then(Value::as_reachability)
}

pub fn get_acceptance_data<T>(db: &T, hash: &H256) -> Option<AcceptanceData> where T: KeyValueDatabase {
	value_of(db, &Key::AcceptanceData(*hash)).and_then(Value::as_acceptance_data)
}

pub fn put<T>(db: &T, key_value: KeyValue) -> Result<(), Error> where T: KeyValueDatabase {
	let mut tx = Transaction::new();
	tx.insert(key_value);
	write(db, tx)
}

pub fn write<T>(db: &T, tx: Transaction) -> Result<(), Error> where T: KeyValueDatabase {
	db.write(tx).map_err(Error::DatabaseDriverError)
}

/// Wrapper implementing the `storage` read traits on top of any
/// key/value database, staged overlays included.
pub struct DagDatabase<T> where T: KeyValueDatabase {
	db: T,
}

impl<T> DagDatabase<T> where T: KeyValueDatabase {
	pub fn new(db: T) -> Self {
		DagDatabase { db: db }
	}

	pub fn database(&self) -> &T {
		&self.db
	}

	pub fn write(&self, tx: Transaction) -> Result<(), Error> {
		write(&self.db, tx)
	}

	pub fn reachability_data(&self, hash: &H256) -> Option<Bytes> {
		get_reachability_data(&self.db, hash)
	}

	pub fn is_known_block(&self, hash: &H256) -> bool {
		match self.db.get(&Key::BlockStatus(*hash)) {
			Ok(KeyState::Insert(_)) => true,
			_ => false,
		}
	}
}

impl<T> BlockHeaderProvider for DagDatabase<T> where T: KeyValueDatabase {
	fn block_header(&self, hash: &H256) -> Option<IndexedBlockHeader> {
		get_block(&self.db, hash).map(|block| block.header)
	}
}

impl<T> BlockProvider for DagDatabase<T> where T: KeyValueDatabase {
	fn block(&self, hash: &H256) -> Option<IndexedBlock> {
		get_block(&self.db, hash)
	}
}

impl<T> BlockStatusStore for DagDatabase<T> where T: KeyValueDatabase {
	fn block_status(&self, hash: &H256) -> Option<BlockStatus> {
		get_block_status(&self.db, hash)
	}
}

impl<T> GhostdagStore for DagDatabase<T> where T: KeyValueDatabase {
	fn ghostdag_data(&self, hash: &H256) -> Option<GhostdagData> {
		get_ghostdag_data(&self.db, hash)
	}
}

impl<T> UtxoDiffStore for DagDatabase<T> where T: KeyValueDatabase {
	fn utxo_diff(&self, hash: &H256) -> Option<(UTXODiff, Option<H256>)> {
		get_utxo_diff(&self.db, hash)
	}
}

impl<T> MultisetStore for DagDatabase<T> where T: KeyValueDatabase {
	fn multiset(&self, hash: &H256) -> Option<Multiset> {
		get_multiset(&self.db, hash)
	}
}

impl<T> AcceptanceDataStore for DagDatabase<T> where T: KeyValueDatabase {
	fn acceptance_data(&self, hash: &H256) -> Option<AcceptanceData> {
		get_acceptance_data(&self.db, hash)
	}
}

#[cfg(test)]
mod tests {
	use hash::H256;
	use storage::{BlockStatus, BlockStatusStore};
	use kv::{KeyValue, MemoryDatabase};
	use super::{put, DagDatabase};

	#[test]
	fn test_dag_database_status_round_trip() {
		let db = DagDatabase::new(MemoryDatabase::default());
		let hash = H256::from(3u8);

		assert_eq!(db.block_status(&hash), None);
		assert!(!db.is_known_block(&hash));

		put(db.database(), KeyValue::BlockStatus(hash, BlockStatus::UTXOPendingVerification)).unwrap();
		assert_eq!(db.block_status(&hash), Some(BlockStatus::UTXOPendingVerification));
		assert!(db.is_known_block(&hash));
	}
}
