//! Commutative hash of an unordered element collection.

use blake2_rfc::blake2b::Blake2b;
use primitives::hash::H256;
use primitives::U256;

/// Hash of an unordered multiset of byte strings.
///
/// Elements are folded into a 256-bit accumulator by wrapping addition of
/// their digests, so insertion order does not matter and every insertion
/// can be undone by the matching removal.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Multiset {
	accumulator: U256,
}

impl Multiset {
	pub fn new() -> Self {
		Multiset::default()
	}

	pub fn from_hash(hash: H256) -> Self {
		Multiset {
			accumulator: hash.to_u256(),
		}
	}

	pub fn add(&mut self, element: &[u8]) {
		let (accumulator, _) = self.accumulator.overflowing_add(element_digest(element));
		self.accumulator = accumulator;
	}

	pub fn remove(&mut self, element: &[u8]) {
		let (accumulator, _) = self.accumulator.overflowing_sub(element_digest(element));
		self.accumulator = accumulator;
	}

	pub fn hash(&self) -> H256 {
		let mut bytes = [0u8; 32];
		self.accumulator.to_big_endian(&mut bytes);
		H256::from(bytes)
	}
}

fn element_digest(element: &[u8]) -> U256 {
	let mut hasher = Blake2b::new(32);
	hasher.update(element);
	U256::from(hasher.finalize().as_bytes())
}

#[cfg(test)]
mod tests {
	use super::Multiset;

	#[test]
	fn test_multiset_is_commutative() {
		let mut first = Multiset::new();
		first.add(b"one");
		first.add(b"two");

		let mut second = Multiset::new();
		second.add(b"two");
		second.add(b"one");

		assert_eq!(first.hash(), second.hash());
	}

	#[test]
	fn test_multiset_remove_reverts_add() {
		let mut set = Multiset::new();
		set.add(b"one");
		let checkpoint = set.hash();

		set.add(b"two");
		set.remove(b"two");
		assert_eq!(set.hash(), checkpoint);
	}

	#[test]
	fn test_empty_multiset_is_zero() {
		assert!(Multiset::new().hash().is_zero());
	}
}
