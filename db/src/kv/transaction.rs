//! Typed keys and values of the consensus database.

use bytes::Bytes;
use chain::IndexedBlock;
use crypto::Multiset;
use hash::H256;
use storage::{AcceptanceData, BlockStatus, GhostdagData, UTXODiff};

/// Typed lookup key. One variant per logical bucket:
/// `blocks/`, `blockStatuses/`, `ghostdag/`, `utxoDiffs/`, `multiset/`,
/// `reachability/` and `acceptanceData/`, each suffixed by a block hash.
#[derive(Debug, Clone, PartialEq)]
pub enum Key {
	Block(H256),
	BlockStatus(H256),
	Ghostdag(H256),
	UtxoDiff(H256),
	Multiset(H256),
	Reachability(H256),
	AcceptanceData(H256),
}

/// Typed key/value pair written by an insert operation.
#[derive(Debug, Clone)]
pub enum KeyValue {
	Block(H256, IndexedBlock),
	BlockStatus(H256, BlockStatus),
	Ghostdag(H256, GhostdagData),
	UtxoDiff(H256, (UTXODiff, Option<H256>)),
	Multiset(H256, Multiset),
	/// Raw serialized reachability record; the reachability index owns
	/// the byte layout.
	Reachability(H256, Bytes),
	AcceptanceData(H256, AcceptanceData),
}

/// Typed value returned by a lookup.
#[derive(Debug, Clone)]
pub enum Value {
	Block(IndexedBlock),
	BlockStatus(BlockStatus),
	Ghostdag(GhostdagData),
	UtxoDiff((UTXODiff, Option<H256>)),
	Multiset(Multiset),
	Reachability(Bytes),
	AcceptanceData(AcceptanceData),
}

impl Value {
	pub fn as_block(self) -> Option<IndexedBlock> {
		match self {
			Value::Block(block) => Some(block),
			_ => None,
		}
	}

	pub fn as_block_status(self) -> Option<BlockStatus> {
		match self {
			Value::BlockStatus(status) => Some(status),
			_ => None,
		}
	}

	pub fn as_ghostdag(self) -> Option<GhostdagData> {
		match self {
			Value::Ghostdag(data) => Some(data),
			_ => None,
		}
	}

	pub fn as_utxo_diff(self) -> Option<(UTXODiff, Option<H256>)> {
		match self {
			Value::UtxoDiff(diff) => Some(diff),
			_ => None,
		}
	}

	pub fn as_multiset(self) -> Option<Multiset> {
		match self {
			Value::Multiset(multiset) => Some(multiset),
			_ => None,
		}
	}

	pub fn as_reachability(self) -> Option<Bytes> {
		match self {
			Value::Reachability(bytes) => Some(bytes),
			_ => None,
		}
	}

	pub fn as_acceptance_data(self) -> Option<AcceptanceData> {
		match self {
			Value::AcceptanceData(data) => Some(data),
			_ => None,
		}
	}
}

/// State of a key in a write overlay.
#[derive(Debug, Clone)]
pub enum KeyState<V> {
	Insert(V),
	Delete,
	Unknown,
}

impl<V> Default for KeyState<V> {
	fn default() -> Self {
		KeyState::Unknown
	}
}

impl<V> KeyState<V> {
	pub fn map<U, F>(self, f: F) -> KeyState<U> where F: FnOnce(V) -> U {
		match self {
			KeyState::Insert(value) => KeyState::Insert(f(value)),
			KeyState::Delete => KeyState::Delete,
			KeyState::Unknown => KeyState::Unknown,
		}
	}

	pub fn into_option(self) -> Option<V> {
		match self {
			KeyState::Insert(value) => Some(value),
			_ => None,
		}
	}
}

#[derive(Debug, Clone)]
pub enum Operation {
	Insert(KeyValue),
	Delete(Key),
}

/// An atomic batch of database operations.
#[derive(Debug, Clone, Default)]
pub struct Transaction {
	pub operations: Vec<Operation>,
}

impl Transaction {
	pub fn new() -> Self {
		Transaction::default()
	}

	pub fn insert(&mut self, insert: KeyValue) {
		self.operations.push(Operation::Insert(insert));
	}

	pub fn delete(&mut self, delete: Key) {
		self.operations.push(Operation::Delete(delete));
	}

	pub fn is_empty(&self) -> bool {
		self.operations.is_empty()
	}
}
