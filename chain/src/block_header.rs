use std::{fmt, io};
use hex::FromHex;
use ser::{deserialize, serialize};
use ser::{Deserializable, Error as ReaderError, Reader, Serializable, Stream};
use crypto::dhash256;
use compact::Compact;
use hash::H256;

/// A block header binds the block's parents, its transaction set and its
/// proof-of-work solution.
#[derive(PartialEq, Clone)]
pub struct BlockHeader {
	pub version: u32,
	/// Hashes of the parent blocks, sorted ascending.
	pub parent_hashes: Vec<H256>,
	/// Merkle root over the transaction hashes.
	pub hash_merkle_root: H256,
	/// Merkle root over the ids of transactions accepted by this block.
	pub accepted_id_merkle_root: H256,
	/// Multiset hash of the UTXO set after this block.
	pub utxo_commitment: H256,
	/// Milliseconds since the unix epoch.
	pub time: u64,
	pub bits: Compact,
	pub nonce: u64,
}

impl BlockHeader {
	/// Compute hash of the block header.
	pub fn hash(&self) -> H256 {
		block_header_hash(self)
	}

	pub fn is_genesis(&self) -> bool {
		self.parent_hashes.is_empty()
	}
}

impl fmt::Debug for BlockHeader {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("BlockHeader")
			.field("version", &self.version)
			.field("parent_hashes", &self.parent_hashes)
			.field("hash_merkle_root", &self.hash_merkle_root)
			.field("accepted_id_merkle_root", &self.accepted_id_merkle_root)
			.field("utxo_commitment", &self.utxo_commitment)
			.field("time", &self.time)
			.field("bits", &self.bits)
			.field("nonce", &self.nonce)
			.finish()
	}
}

impl From<&'static str> for BlockHeader {
	fn from(s: &'static str) -> Self {
		deserialize(&s.from_hex::<Vec<u8>>().unwrap() as &[u8]).unwrap()
	}
}

impl Serializable for BlockHeader {
	fn serialize(&self, stream: &mut Stream) {
		stream
			.append(&self.version)
			.append_list(&self.parent_hashes)
			.append(&self.hash_merkle_root)
			.append(&self.accepted_id_merkle_root)
			.append(&self.utxo_commitment)
			.append(&self.time)
			.append(&self.bits)
			.append(&self.nonce);
	}
}

impl Deserializable for BlockHeader {
	fn deserialize<T>(reader: &mut Reader<T>) -> Result<Self, ReaderError> where T: io::Read {
		Ok(BlockHeader {
			version: reader.read()?,
			parent_hashes: reader.read_list()?,
			hash_merkle_root: reader.read()?,
			accepted_id_merkle_root: reader.read()?,
			utxo_commitment: reader.read()?,
			time: reader.read()?,
			bits: reader.read()?,
			nonce: reader.read()?,
		})
	}
}

/// Compute hash of the block header.
pub fn block_header_hash(block_header: &BlockHeader) -> H256 {
	dhash256(&serialize(block_header))
}

#[cfg(test)]
mod tests {
	use ser::{deserialize, serialize};
	use hash::H256;
	use super::BlockHeader;

	fn sample_header() -> BlockHeader {
		BlockHeader {
			version: 1,
			parent_hashes: vec![H256::from(2u8), H256::from(3u8)],
			hash_merkle_root: H256::from(4u8),
			accepted_id_merkle_root: H256::from(5u8),
			utxo_commitment: H256::from(6u8),
			time: 7,
			bits: 8.into(),
			nonce: 9,
		}
	}

	#[test]
	fn test_block_header_round_trip() {
		let header = sample_header();
		let reread: BlockHeader = deserialize(serialize(&header).as_ref()).unwrap();
		assert_eq!(header, reread);
	}

	#[test]
	fn test_block_header_hash_depends_on_nonce() {
		let header = sample_header();
		let mut other = header.clone();
		other.nonce += 1;
		assert!(header.hash() != other.hash());
	}
}
