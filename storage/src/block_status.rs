use std::io;
use ser::{Deserializable, Error as ReaderError, Reader, Serializable, Stream};

/// Validation state of a block. Transitions are monotonic:
/// `HeaderOnly -> UTXOPendingVerification -> {Valid | DisqualifiedFromChain}`;
/// `Invalid` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStatus {
	/// The block failed validation and will never be revisited.
	Invalid,
	/// Only the header passed validation so far.
	HeaderOnly,
	/// Body accepted; the block's UTXO state has not been resolved yet.
	UTXOPendingVerification,
	/// Fully validated against its past UTXO.
	Valid,
	/// Contextually fine but its UTXO state contradicts its chain;
	/// the block stays in the DAG but can never be a chain block.
	DisqualifiedFromChain,
}

impl BlockStatus {
	pub fn to_u8(self) -> u8 {
		match self {
			BlockStatus::Invalid => 0,
			BlockStatus::HeaderOnly => 1,
			BlockStatus::UTXOPendingVerification => 2,
			BlockStatus::Valid => 3,
			BlockStatus::DisqualifiedFromChain => 4,
		}
	}

	pub fn from_u8(value: u8) -> Option<BlockStatus> {
		match value {
			0 => Some(BlockStatus::Invalid),
			1 => Some(BlockStatus::HeaderOnly),
			2 => Some(BlockStatus::UTXOPendingVerification),
			3 => Some(BlockStatus::Valid),
			4 => Some(BlockStatus::DisqualifiedFromChain),
			_ => None,
		}
	}

	pub fn is_utxo_verified(self) -> bool {
		self == BlockStatus::Valid || self == BlockStatus::DisqualifiedFromChain
	}
}

impl Serializable for BlockStatus {
	fn serialize(&self, stream: &mut Stream) {
		stream.append(&self.to_u8());
	}

	fn serialized_size(&self) -> usize {
		1
	}
}

impl Deserializable for BlockStatus {
	fn deserialize<T>(reader: &mut Reader<T>) -> Result<Self, ReaderError> where T: io::Read {
		BlockStatus::from_u8(reader.read()?).ok_or(ReaderError::MalformedData)
	}
}

#[cfg(test)]
mod tests {
	use ser::{deserialize, serialize};
	use super::BlockStatus;

	#[test]
	fn test_status_byte_round_trip() {
		let statuses = [
			BlockStatus::Invalid,
			BlockStatus::HeaderOnly,
			BlockStatus::UTXOPendingVerification,
			BlockStatus::Valid,
			BlockStatus::DisqualifiedFromChain,
		];

		for status in &statuses {
			let reread: BlockStatus = deserialize(serialize(status).as_ref()).unwrap();
			assert_eq!(*status, reread);
		}
	}

	#[test]
	fn test_utxo_verified() {
		assert!(BlockStatus::Valid.is_utxo_verified());
		assert!(BlockStatus::DisqualifiedFromChain.is_utxo_verified());
		assert!(!BlockStatus::UTXOPendingVerification.is_utxo_verified());
	}
}
