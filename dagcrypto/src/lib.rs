extern crate blake2_rfc;
extern crate primitives;

mod multiset;

pub use blake2_rfc::blake2b::Blake2b;
pub use multiset::Multiset;

use primitives::hash::H256;

/// The domain hash: blake2b with a 32-byte digest.
pub fn dhash256(input: &[u8]) -> H256 {
	let mut hasher = Blake2b::new(32);
	hasher.update(input);
	H256::from_slice(hasher.finalize().as_bytes())
}

/// Domain hash of the concatenation of two hashes, used by merkle trees.
pub fn concat_hash256(left: &H256, right: &H256) -> H256 {
	let mut hasher = Blake2b::new(32);
	hasher.update(&**left);
	hasher.update(&**right);
	H256::from_slice(hasher.finalize().as_bytes())
}

#[cfg(test)]
mod tests {
	use primitives::hash::H256;
	use super::{dhash256, concat_hash256};

	#[test]
	fn test_dhash256_is_deterministic() {
		assert_eq!(dhash256(b"hello"), dhash256(b"hello"));
		assert!(dhash256(b"hello") != dhash256(b"world"));
	}

	#[test]
	fn test_concat_hash_is_ordered() {
		let a = H256::from(1u8);
		let b = H256::from(2u8);
		assert!(concat_hash256(&a, &b) != concat_hash256(&b, &a));
	}
}
