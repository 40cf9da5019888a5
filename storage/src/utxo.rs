//! UTXO set snapshots and the diff algebra connecting them.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::io;
use chain::OutPoint;
use bytes::Bytes;
use ser::{Deserializable, Error as ReaderError, Reader, Serializable, Stream};
use error::Error;

/// A single unspent output together with the context it was accepted in.
#[derive(Debug, Clone, PartialEq)]
pub struct UTXOEntry {
	pub amount: u64,
	pub script_pubkey: Bytes,
	/// Blue score of the block that accepted the output.
	pub block_blue_score: u64,
	pub is_coinbase: bool,
}

impl Serializable for UTXOEntry {
	fn serialize(&self, stream: &mut Stream) {
		stream
			.append(&self.amount)
			.append(&self.script_pubkey)
			.append(&self.block_blue_score)
			.append(&self.is_coinbase);
	}
}

impl Deserializable for UTXOEntry {
	fn deserialize<T>(reader: &mut Reader<T>) -> Result<Self, ReaderError> where T: io::Read {
		Ok(UTXOEntry {
			amount: reader.read()?,
			script_pubkey: reader.read()?,
			block_blue_score: reader.read()?,
			is_coinbase: reader.read()?,
		})
	}
}

/// Immutable UTXO snapshot. All mutation goes through diffs; the
/// operations below never modify `self`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct UTXOSet {
	entries: HashMap<OutPoint, UTXOEntry>,
}

impl UTXOSet {
	pub fn new() -> Self {
		UTXOSet::default()
	}

	pub fn get(&self, outpoint: &OutPoint) -> Option<&UTXOEntry> {
		self.entries.get(outpoint)
	}

	pub fn contains(&self, outpoint: &OutPoint) -> bool {
		self.entries.contains_key(outpoint)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&OutPoint, &UTXOEntry)> {
		self.entries.iter()
	}

	/// Applies the diff in place.
	///
	/// Fails with `DiffConflict` when `to_remove` names an outpoint that
	/// is not in the base, or `to_add` collides with an existing one.
	pub fn apply(&mut self, diff: &UTXODiff) -> Result<(), Error> {
		for outpoint in diff.to_remove.keys() {
			if self.entries.remove(outpoint).is_none() {
				return Err(Error::DiffConflict(outpoint.clone()));
			}
		}

		for (outpoint, entry) in &diff.to_add {
			match self.entries.entry(outpoint.clone()) {
				Entry::Occupied(_) => return Err(Error::DiffConflict(outpoint.clone())),
				Entry::Vacant(vacant) => { vacant.insert(entry.clone()); },
			}
		}

		Ok(())
	}

	/// Non-mutating companion of `apply`.
	pub fn with_diff(&self, diff: &UTXODiff) -> Result<UTXOSet, Error> {
		let mut result = self.clone();
		result.apply(diff)?;
		Ok(result)
	}

	/// The unique diff `d` with `self.with_diff(d) == other`.
	pub fn diff_from(&self, other: &UTXOSet) -> UTXODiff {
		let mut diff = UTXODiff::default();

		for (outpoint, entry) in &self.entries {
			if other.entries.get(outpoint) != Some(entry) {
				diff.to_remove.insert(outpoint.clone(), entry.clone());
			}
		}

		for (outpoint, entry) in &other.entries {
			if self.entries.get(outpoint) != Some(entry) {
				diff.to_add.insert(outpoint.clone(), entry.clone());
			}
		}

		diff
	}
}

/// An additive/subtractive delta between two UTXO snapshots.
/// Invariant: `to_add` and `to_remove` are disjoint.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct UTXODiff {
	to_add: HashMap<OutPoint, UTXOEntry>,
	to_remove: HashMap<OutPoint, UTXOEntry>,
}

impl UTXODiff {
	pub fn new() -> Self {
		UTXODiff::default()
	}

	/// Records the creation of an output. Adding back an output the diff
	/// was about to remove cancels the removal instead.
	pub fn add_entry(&mut self, outpoint: OutPoint, entry: UTXOEntry) {
		if self.to_remove.remove(&outpoint).is_none() {
			self.to_add.insert(outpoint, entry);
		}
	}

	/// Records the spending of an output. Spending an output the diff
	/// itself created cancels the addition instead.
	pub fn remove_entry(&mut self, outpoint: &OutPoint, entry: &UTXOEntry) {
		if self.to_add.remove(outpoint).is_none() {
			self.to_remove.insert(outpoint.clone(), entry.clone());
		}
	}

	pub fn added(&self) -> impl Iterator<Item = (&OutPoint, &UTXOEntry)> {
		self.to_add.iter()
	}

	pub fn removed(&self) -> impl Iterator<Item = (&OutPoint, &UTXOEntry)> {
		self.to_remove.iter()
	}

	pub fn is_empty(&self) -> bool {
		self.to_add.is_empty() && self.to_remove.is_empty()
	}
}

impl Serializable for UTXODiff {
	fn serialize(&self, stream: &mut Stream) {
		let mut to_add: Vec<_> = self.to_add.iter().collect();
		to_add.sort_by(|a, b| (a.0.tx_id, a.0.index).cmp(&(b.0.tx_id, b.0.index)));
		let mut to_remove: Vec<_> = self.to_remove.iter().collect();
		to_remove.sort_by(|a, b| (a.0.tx_id, a.0.index).cmp(&(b.0.tx_id, b.0.index)));

		stream.append(&::ser::CompactInteger::from(to_add.len()));
		for (outpoint, entry) in to_add {
			stream.append(outpoint).append(entry);
		}
		stream.append(&::ser::CompactInteger::from(to_remove.len()));
		for (outpoint, entry) in to_remove {
			stream.append(outpoint).append(entry);
		}
	}
}

impl Deserializable for UTXODiff {
	fn deserialize<T>(reader: &mut Reader<T>) -> Result<Self, ReaderError> where T: io::Read {
		let mut diff = UTXODiff::default();

		let added: usize = reader.read::<::ser::CompactInteger>()?.into();
		for _ in 0..added {
			let outpoint: OutPoint = reader.read()?;
			let entry: UTXOEntry = reader.read()?;
			diff.to_add.insert(outpoint, entry);
		}

		let removed: usize = reader.read::<::ser::CompactInteger>()?.into();
		for _ in 0..removed {
			let outpoint: OutPoint = reader.read()?;
			let entry: UTXOEntry = reader.read()?;
			diff.to_remove.insert(outpoint, entry);
		}

		Ok(diff)
	}
}
