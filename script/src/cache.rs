//! Shared cache of already verified signatures.

use std::collections::HashSet;
use parking_lot::Mutex;
use crypto::dhash256;
use hash::H256;

/// Set of `(sighash, signature, pubkey)` triples that have already been
/// verified this epoch. Shared between the script verification workers;
/// a hit skips the expensive curve operation.
#[derive(Default)]
pub struct SignatureCache {
	verified: Mutex<HashSet<H256>>,
}

impl SignatureCache {
	pub fn new() -> Self {
		SignatureCache::default()
	}

	pub fn contains(&self, sighash: &H256, signature: &[u8], pubkey: &[u8]) -> bool {
		let key = cache_key(sighash, signature, pubkey);
		self.verified.lock().contains(&key)
	}

	pub fn insert(&self, sighash: &H256, signature: &[u8], pubkey: &[u8]) {
		let key = cache_key(sighash, signature, pubkey);
		self.verified.lock().insert(key);
	}

	pub fn len(&self) -> usize {
		self.verified.lock().len()
	}
}

fn cache_key(sighash: &H256, signature: &[u8], pubkey: &[u8]) -> H256 {
	let mut data = Vec::with_capacity(32 + signature.len() + pubkey.len());
	data.extend_from_slice(&**sighash);
	data.extend_from_slice(signature);
	data.extend_from_slice(pubkey);
	dhash256(&data)
}

#[cfg(test)]
mod tests {
	use hash::H256;
	use super::SignatureCache;

	#[test]
	fn test_signature_cache() {
		let cache = SignatureCache::new();
		let sighash = H256::from(1u8);

		assert!(!cache.contains(&sighash, b"sig", b"key"));
		cache.insert(&sighash, b"sig", b"key");
		assert!(cache.contains(&sighash, b"sig", b"key"));
		assert!(!cache.contains(&sighash, b"sig", b"other-key"));
	}
}
