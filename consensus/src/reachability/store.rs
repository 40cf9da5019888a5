//! Reachability record persistence.
//!
//! Record layout, per block hash:
//! `interval.start (u64 LE) ‖ interval.end (u64 LE) ‖ parent hash (32
//! bytes, zero for the root) ‖ child count (varint) ‖ child hashes ‖
//! future covering set size (varint) ‖ future hashes`.
//!
//! Nodes reference each other by hash on disk; links are resolved back
//! to arena ids during the two-pass load.

use std::collections::HashMap;
use hash::H256;
use primitives::bytes::Bytes;
use ser::{CompactInteger, Reader, Stream};
use storage::Error;
use db::kv::{KeyValue, KeyValueDatabase, Transaction};
use db::dag_db;
use super::interval::Interval;
use super::tree::{NodeId, ReachabilityIndex};

fn serialize_node(index: &ReachabilityIndex, id: NodeId) -> Bytes {
	let node = index.node(id);
	let mut stream = Stream::default();

	stream.append(&node.interval.start).append(&node.interval.end);

	let parent_hash = node.parent
		.map(|parent| index.node(parent).hash)
		.unwrap_or_else(H256::zero);
	stream.append(&parent_hash);

	stream.append(&CompactInteger::from(node.children.len()));
	for &child in &node.children {
		stream.append(&index.node(child).hash);
	}

	stream.append(&CompactInteger::from(node.future_covering_set.len()));
	for &covered in &node.future_covering_set {
		stream.append(&index.node(covered).hash);
	}

	stream.out()
}

struct RawRecord {
	interval: Interval,
	parent: H256,
	children: Vec<H256>,
	future_covering_set: Vec<H256>,
}

fn deserialize_record(bytes: &Bytes) -> Result<RawRecord, Error> {
	let mut reader = Reader::new(bytes);

	let start: u64 = reader.read()?;
	let end: u64 = reader.read()?;
	let parent: H256 = reader.read()?;

	let child_count: usize = reader.read::<CompactInteger>()?.into();
	let mut children = Vec::with_capacity(child_count);
	for _ in 0..child_count {
		children.push(reader.read()?);
	}

	let covering_count: usize = reader.read::<CompactInteger>()?.into();
	let mut future_covering_set = Vec::with_capacity(covering_count);
	for _ in 0..covering_count {
		future_covering_set.push(reader.read()?);
	}

	Ok(RawRecord {
		interval: Interval::new(start, end),
		parent: parent,
		children: children,
		future_covering_set: future_covering_set,
	})
}

/// Writes all records the index dirtied since the last flush into the
/// given database (typically the staging overlay of the running block
/// resolution).
pub fn flush_reachability<T>(index: &mut ReachabilityIndex, db: &T) -> Result<(), Error> where T: KeyValueDatabase {
	let dirty = index.take_dirty();
	if dirty.is_empty() {
		return Ok(());
	}

	let mut tx = Transaction::new();
	for id in dirty {
		let hash = index.node(id).hash;
		tx.insert(KeyValue::Reachability(hash, serialize_node(index, id)));
	}
	dag_db::write(db, tx)
}

/// Rebuilds the index from stored records.
///
/// Two passes: the first populates the arena with every node, the
/// second resolves parent/children/covering references, which are then
/// guaranteed to exist.
pub fn load_reachability<T>(db: &T, hashes: &[H256]) -> Result<ReachabilityIndex, Error> where T: KeyValueDatabase {
	let mut records = HashMap::with_capacity(hashes.len());
	for hash in hashes {
		let bytes = dag_db::get_reachability_data(db, hash)
			.ok_or(Error::MissingRecord("reachability", *hash))?;
		records.insert(*hash, deserialize_record(&bytes)?);
	}

	let mut index = ReachabilityIndex::new();
	for hash in hashes {
		index.load_node(*hash, records[hash].interval);
	}

	for hash in hashes {
		let record = &records[hash];
		let parent = if record.parent.is_zero() { None } else { Some(record.parent) };
		index.link_node(hash, parent, &record.children, &record.future_covering_set)?;
	}

	// linking does not re-dirty the nodes
	index.take_dirty();
	Ok(index)
}

#[cfg(test)]
mod tests {
	use hash::H256;
	use db::kv::MemoryDatabase;
	use reachability::ReachabilityIndex;
	use super::{flush_reachability, load_reachability};

	fn hash(n: u8) -> H256 {
		H256::from(n)
	}

	#[test]
	fn test_flush_and_two_pass_load_round_trip() {
		let mut index = ReachabilityIndex::new();
		index.insert(hash(0), None, &[]).unwrap();
		index.insert(hash(1), Some(&hash(0)), &[]).unwrap();
		index.insert(hash(2), Some(&hash(0)), &[]).unwrap();
		index.insert(hash(3), Some(&hash(1)), &[hash(2)]).unwrap();

		let db = MemoryDatabase::default();
		flush_reachability(&mut index, &db).unwrap();

		let hashes = [hash(0), hash(1), hash(2), hash(3)];
		let reloaded = load_reachability(&db, &hashes).unwrap();

		assert_eq!(reloaded.len(), 4);
		for ancestor in 0..4u8 {
			for descendant in 0..4u8 {
				assert_eq!(
					::verification::DagTopology::is_dag_ancestor_of(&index, &hash(ancestor), &hash(descendant)),
					::verification::DagTopology::is_dag_ancestor_of(&reloaded, &hash(ancestor), &hash(descendant)),
					"ancestry of ({}, {}) survived the round trip", ancestor, descendant,
				);
			}
		}
	}

	#[test]
	fn test_flush_writes_only_dirty_nodes() {
		let mut index = ReachabilityIndex::new();
		index.insert(hash(0), None, &[]).unwrap();

		let db = MemoryDatabase::default();
		flush_reachability(&mut index, &db).unwrap();

		// a second flush with no changes writes nothing
		let drained = {
			flush_reachability(&mut index, &db).unwrap();
			db.drain_transaction()
		};
		assert_eq!(drained.operations.len(), 1);
	}
}
