use std::collections::HashMap;
use std::mem::replace;
use std::sync::Arc;
use parking_lot::RwLock;
use bytes::Bytes;
use chain::IndexedBlock;
use crypto::Multiset;
use hash::H256;
use storage::{AcceptanceData, BlockStatus, GhostdagData, UTXODiff};
use kv::{Key, KeyState, KeyValue, KeyValueDatabase, Operation, Transaction, Value};

#[derive(Default)]
struct InnerDatabase {
	block: HashMap<H256, KeyState<IndexedBlock>>,
	block_status: HashMap<H256, KeyState<BlockStatus>>,
	ghostdag: HashMap<H256, KeyState<GhostdagData>>,
	utxo_diff: HashMap<H256, KeyState<(UTXODiff, Option<H256>)>>,
	multiset: HashMap<H256, KeyState<Multiset>>,
	reachability: HashMap<H256, KeyState<Bytes>>,
	acceptance_data: HashMap<H256, KeyState<AcceptanceData>>,
}

#[derive(Default)]
pub struct MemoryDatabase {
	db: RwLock<InnerDatabase>,
}

impl MemoryDatabase {
	/// Moves everything written so far out as a single transaction,
	/// leaving the database empty. Used to flush a staging overlay into
	/// its backing database.
	pub fn drain_transaction(&self) -> Transaction {
		let mut db = self.db.write();

		let block = replace(&mut db.block, HashMap::default()).into_iter()
			.flat_map(|(key, state)| into_operation(state, key, KeyValue::Block, Key::Block));

		let block_status = replace(&mut db.block_status, HashMap::default()).into_iter()
			.flat_map(|(key, state)| into_operation(state, key, KeyValue::BlockStatus, Key::BlockStatus));

		let ghostdag = replace(&mut db.ghostdag, HashMap::default()).into_iter()
			.flat_map(|(key, state)| into_operation(state, key, KeyValue::Ghostdag, Key::Ghostdag));

		let utxo_diff = replace(&mut db.utxo_diff, HashMap::default()).into_iter()
			.flat_map(|(key, state)| into_operation(state, key, KeyValue::UtxoDiff, Key::UtxoDiff));

		let multiset = replace(&mut db.multiset, HashMap::default()).into_iter()
			.flat_map(|(key, state)| into_operation(state, key, KeyValue::Multiset, Key::Multiset));

		let reachability = replace(&mut db.reachability, HashMap::default()).into_iter()
			.flat_map(|(key, state)| into_operation(state, key, KeyValue::Reachability, Key::Reachability));

		let acceptance_data = replace(&mut db.acceptance_data, HashMap::default()).into_iter()
			.flat_map(|(key, state)| into_operation(state, key, KeyValue::AcceptanceData, Key::AcceptanceData));

		Transaction {
			operations: block
				.chain(block_status)
				.chain(ghostdag)
				.chain(utxo_diff)
				.chain(multiset)
				.chain(reachability)
				.chain(acceptance_data)
				.collect(),
		}
	}

	pub fn is_known(&self, key: &Key) -> bool {
		match self.get(key) {
			Ok(KeyState::Unknown) | Err(_) => false,
			_ => true,
		}
	}
}

fn into_operation<V, I, D>(state: KeyState<V>, key: H256, insert: I, delete: D) -> Option<Operation>
	where I: FnOnce(H256, V) -> KeyValue, D: FnOnce(H256) -> Key {
	match state {
		KeyState::Insert(value) => Some(Operation::Insert(insert(key, value))),
		KeyState::Delete => Some(Operation::Delete(delete(key))),
		KeyState::Unknown => None,
	}
}

impl KeyValueDatabase for MemoryDatabase {
	fn write(&self, tx: Transaction) -> Result<(), String> {
		let mut db = self.db.write();
		for op in tx.operations.into_iter() {
			match op {
				Operation::Insert(insert) => match insert {
					KeyValue::Block(key, value) => { db.block.insert(key, KeyState::Insert(value)); },
					KeyValue::BlockStatus(key, value) => { db.block_status.insert(key, KeyState::Insert(value)); },
					KeyValue::Ghostdag(key, value) => { db.ghostdag.insert(key, KeyState::Insert(value)); },
					KeyValue::UtxoDiff(key, value) => { db.utxo_diff.insert(key, KeyState::Insert(value)); },
					KeyValue::Multiset(key, value) => { db.multiset.insert(key, KeyState::Insert(value)); },
					KeyValue::Reachability(key, value) => { db.reachability.insert(key, KeyState::Insert(value)); },
					KeyValue::AcceptanceData(key, value) => { db.acceptance_data.insert(key, KeyState::Insert(value)); },
				},
				Operation::Delete(delete) => match delete {
					Key::Block(key) => { db.block.insert(key, KeyState::Delete); },
					Key::BlockStatus(key) => { db.block_status.insert(key, KeyState::Delete); },
					Key::Ghostdag(key) => { db.ghostdag.insert(key, KeyState::Delete); },
					Key::UtxoDiff(key) => { db.utxo_diff.insert(key, KeyState::Delete); },
					Key::Multiset(key) => { db.multiset.insert(key, KeyState::Delete); },
					Key::Reachability(key) => { db.reachability.insert(key, KeyState::Delete); },
					Key::AcceptanceData(key) => { db.acceptance_data.insert(key, KeyState::Delete); },
				},
			}
		}
		Ok(())
	}

	fn get(&self, key: &Key) -> Result<KeyState<Value>, String> {
		let db = self.db.read();
		let result = match *key {
			Key::Block(ref key) => db.block.get(key).cloned().unwrap_or_default().map(Value::Block),
			Key::BlockStatus(ref key) => db.block_status.get(key).cloned().unwrap_or_default().map(Value::BlockStatus),
			Key::Ghostdag(ref key) => db.ghostdag.get(key).cloned().unwrap_or_default().map(Value::Ghostdag),
			Key::UtxoDiff(ref key) => db.utxo_diff.get(key).cloned().unwrap_or_default().map(Value::UtxoDiff),
			Key::Multiset(ref key) => db.multiset.get(key).cloned().unwrap_or_default().map(Value::Multiset),
			Key::Reachability(ref key) => db.reachability.get(key).cloned().unwrap_or_default().map(Value::Reachability),
			Key::AcceptanceData(ref key) => db.acceptance_data.get(key).cloned().unwrap_or_default().map(Value::AcceptanceData),
		};

		Ok(result)
	}
}

/// Clonable `Arc` wrapper around the memory database.
#[derive(Default)]
pub struct SharedMemoryDatabase {
	db: Arc<MemoryDatabase>,
}

impl Clone for SharedMemoryDatabase {
	fn clone(&self) -> Self {
		SharedMemoryDatabase {
			db: self.db.clone(),
		}
	}
}

impl KeyValueDatabase for SharedMemoryDatabase {
	fn write(&self, tx: Transaction) -> Result<(), String> {
		self.db.write(tx)
	}

	fn get(&self, key: &Key) -> Result<KeyState<Value>, String> {
		self.db.get(key)
	}
}

#[cfg(test)]
mod tests {
	use hash::H256;
	use storage::BlockStatus;
	use kv::{Key, KeyState, KeyValue, KeyValueDatabase, Transaction};
	use super::MemoryDatabase;

	#[test]
	fn test_memory_database_insert_get_delete() {
		let db = MemoryDatabase::default();
		let hash = H256::from(1u8);

		let mut tx = Transaction::new();
		tx.insert(KeyValue::BlockStatus(hash, BlockStatus::Valid));
		db.write(tx).unwrap();

		match db.get(&Key::BlockStatus(hash)).unwrap() {
			KeyState::Insert(value) => assert_eq!(value.as_block_status(), Some(BlockStatus::Valid)),
			_ => panic!("expected insert state"),
		}

		let mut tx = Transaction::new();
		tx.delete(Key::BlockStatus(hash));
		db.write(tx).unwrap();

		match db.get(&Key::BlockStatus(hash)).unwrap() {
			KeyState::Delete => (),
			_ => panic!("expected delete state"),
		}
	}

	#[test]
	fn test_drain_transaction_empties_database() {
		let db = MemoryDatabase::default();
		let mut tx = Transaction::new();
		tx.insert(KeyValue::BlockStatus(H256::from(1u8), BlockStatus::Valid));
		db.write(tx).unwrap();

		let drained = db.drain_transaction();
		assert_eq!(drained.operations.len(), 1);
		assert!(db.drain_transaction().is_empty());
	}
}
