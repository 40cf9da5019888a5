//! Which transactions a chain block accepted from its merge set.

use std::io;
use chain::Transaction;
use hash::H256;
use ser::{Deserializable, Error as ReaderError, Reader, Serializable, Stream};
use utxo::UTXOEntry;

/// Acceptance verdict for one transaction of a merge-set block.
///
/// The full transaction and the entries its inputs consumed are kept so
/// that index updates can be reversed when the block leaves the selected
/// chain.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionAcceptanceData {
	pub transaction: Transaction,
	pub tx_id: H256,
	pub fee: u64,
	pub is_accepted: bool,
	/// UTXO entries consumed by the inputs, in input order. Empty for
	/// rejected transactions.
	pub input_entries: Vec<UTXOEntry>,
}

/// Acceptance verdicts for every transaction of one merge-set block.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockAcceptanceData {
	pub block_hash: H256,
	pub transactions: Vec<TransactionAcceptanceData>,
}

/// Per-accepted-block acceptance data of a single chain block, in merge
/// ordering.
pub type AcceptanceData = Vec<BlockAcceptanceData>;

impl Serializable for TransactionAcceptanceData {
	fn serialize(&self, stream: &mut Stream) {
		stream
			.append(&self.transaction)
			.append(&self.tx_id)
			.append(&self.fee)
			.append(&self.is_accepted);
		stream.append_list(&self.input_entries);
	}
}

impl Deserializable for TransactionAcceptanceData {
	fn deserialize<T>(reader: &mut Reader<T>) -> Result<Self, ReaderError> where T: io::Read {
		Ok(TransactionAcceptanceData {
			transaction: reader.read()?,
			tx_id: reader.read()?,
			fee: reader.read()?,
			is_accepted: reader.read()?,
			input_entries: reader.read_list()?,
		})
	}
}

impl Serializable for BlockAcceptanceData {
	fn serialize(&self, stream: &mut Stream) {
		stream.append(&self.block_hash);
		stream.append_list(&self.transactions);
	}
}

impl Deserializable for BlockAcceptanceData {
	fn deserialize<T>(reader: &mut Reader<T>) -> Result<Self, ReaderError> where T: io::Read {
		Ok(BlockAcceptanceData {
			block_hash: reader.read()?,
			transactions: reader.read_list()?,
		})
	}
}
