//! DAG transaction.

use std::io;
use hex::FromHex;
use bytes::Bytes;
use ser::{deserialize, serialize};
use ser::{Deserializable, Error as ReaderError, Reader, Serializable, Stream};
use crypto::dhash256;
use hash::H256;
use constants::{SEQUENCE_FINAL, LOCK_TIME_THRESHOLD};
use subnetwork::{SubnetworkId, SUBNETWORK_ID_COINBASE};

/// Reference to an output of an earlier transaction.
#[derive(Debug, PartialEq, Eq, Clone, Default, Hash)]
pub struct OutPoint {
	pub tx_id: H256,
	pub index: u32,
}

impl OutPoint {
	pub fn new(tx_id: H256, index: u32) -> Self {
		OutPoint {
			tx_id: tx_id,
			index: index,
		}
	}
}

impl Serializable for OutPoint {
	fn serialize(&self, stream: &mut Stream) {
		stream
			.append(&self.tx_id)
			.append(&self.index);
	}

	fn serialized_size(&self) -> usize {
		36
	}
}

impl Deserializable for OutPoint {
	fn deserialize<T>(reader: &mut Reader<T>) -> Result<Self, ReaderError> where T: io::Read {
		Ok(OutPoint {
			tx_id: reader.read()?,
			index: reader.read()?,
		})
	}
}

#[derive(Debug, PartialEq, Default, Clone)]
pub struct TransactionInput {
	pub previous_outpoint: OutPoint,
	pub signature_script: Bytes,
	pub sequence: u64,
}

impl TransactionInput {
	pub fn is_final(&self) -> bool {
		self.sequence == SEQUENCE_FINAL
	}
}

impl Serializable for TransactionInput {
	fn serialize(&self, stream: &mut Stream) {
		stream
			.append(&self.previous_outpoint)
			.append(&self.signature_script)
			.append(&self.sequence);
	}
}

impl Deserializable for TransactionInput {
	fn deserialize<T>(reader: &mut Reader<T>) -> Result<Self, ReaderError> where T: io::Read {
		Ok(TransactionInput {
			previous_outpoint: reader.read()?,
			signature_script: reader.read()?,
			sequence: reader.read()?,
		})
	}
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct TransactionOutput {
	pub value: u64,
	pub script_pubkey: Bytes,
}

impl Serializable for TransactionOutput {
	fn serialize(&self, stream: &mut Stream) {
		stream
			.append(&self.value)
			.append(&self.script_pubkey);
	}
}

impl Deserializable for TransactionOutput {
	fn deserialize<T>(reader: &mut Reader<T>) -> Result<Self, ReaderError> where T: io::Read {
		Ok(TransactionOutput {
			value: reader.read()?,
			script_pubkey: reader.read()?,
		})
	}
}

#[derive(Debug, PartialEq, Default, Clone)]
pub struct Transaction {
	pub version: u32,
	pub inputs: Vec<TransactionInput>,
	pub outputs: Vec<TransactionOutput>,
	pub lock_time: u64,
	pub subnetwork_id: SubnetworkId,
	pub payload: Bytes,
}

impl From<&'static str> for Transaction {
	fn from(s: &'static str) -> Self {
		deserialize(&s.from_hex::<Vec<u8>>().unwrap() as &[u8]).unwrap()
	}
}

impl Transaction {
	/// Hash of the full serialization, including signature scripts.
	pub fn hash(&self) -> H256 {
		transaction_hash(self)
	}

	/// Transaction id: hash of the serialization with signature scripts
	/// blanked, so that malleating a signature does not change the id.
	pub fn id(&self) -> H256 {
		transaction_id(self)
	}

	pub fn inputs(&self) -> &[TransactionInput] {
		&self.inputs
	}

	pub fn outputs(&self) -> &[TransactionOutput] {
		&self.outputs
	}

	pub fn is_empty(&self) -> bool {
		self.inputs.is_empty() || self.outputs.is_empty()
	}

	pub fn is_coinbase(&self) -> bool {
		self.subnetwork_id == SUBNETWORK_ID_COINBASE
	}

	pub fn is_final(&self) -> bool {
		// if lock_time is 0, transaction is final
		if self.lock_time == 0 {
			return true;
		}
		// setting all sequence numbers to the final sequence disables the
		// lock-time check entirely
		self.inputs.iter().all(TransactionInput::is_final)
	}

	/// Is the transaction final when included in a block with the given
	/// blue score and past median time (in milliseconds)?
	pub fn is_final_in_block(&self, block_blue_score: u64, block_median_time: u64) -> bool {
		if self.lock_time == 0 {
			return true;
		}

		let max_lock_time = if self.lock_time < LOCK_TIME_THRESHOLD {
			block_blue_score
		} else {
			block_median_time
		};

		if self.lock_time < max_lock_time {
			return true;
		}

		self.inputs.iter().all(TransactionInput::is_final)
	}

	pub fn total_spends(&self) -> u64 {
		let mut result = 0u64;
		for output in self.outputs.iter() {
			if ::std::u64::MAX - result < output.value {
				return ::std::u64::MAX;
			}
			result += output.value;
		}
		result
	}
}

impl Serializable for Transaction {
	fn serialize(&self, stream: &mut Stream) {
		stream
			.append(&self.version)
			.append_list(&self.inputs)
			.append_list(&self.outputs)
			.append(&self.lock_time)
			.append(&self.subnetwork_id)
			.append(&self.payload);
	}
}

impl Deserializable for Transaction {
	fn deserialize<T>(reader: &mut Reader<T>) -> Result<Self, ReaderError> where T: io::Read {
		Ok(Transaction {
			version: reader.read()?,
			inputs: reader.read_list()?,
			outputs: reader.read_list()?,
			lock_time: reader.read()?,
			subnetwork_id: reader.read()?,
			payload: reader.read()?,
		})
	}
}

pub fn transaction_hash(transaction: &Transaction) -> H256 {
	dhash256(&serialize(transaction))
}

pub fn transaction_id(transaction: &Transaction) -> H256 {
	let blanked = Transaction {
		version: transaction.version,
		inputs: transaction.inputs.iter().map(|input| TransactionInput {
			previous_outpoint: input.previous_outpoint.clone(),
			signature_script: Bytes::new(),
			sequence: input.sequence,
		}).collect(),
		outputs: transaction.outputs.clone(),
		lock_time: transaction.lock_time,
		subnetwork_id: transaction.subnetwork_id,
		payload: transaction.payload.clone(),
	};
	dhash256(&serialize(&blanked))
}

#[cfg(test)]
mod tests {
	use bytes::Bytes;
	use constants::SEQUENCE_FINAL;
	use ser::{deserialize, serialize, Serializable};
	use subnetwork::SUBNETWORK_ID_COINBASE;
	use super::{OutPoint, Transaction, TransactionInput, TransactionOutput};

	fn sample_transaction() -> Transaction {
		Transaction {
			version: 1,
			inputs: vec![TransactionInput {
				previous_outpoint: OutPoint::new(7u8.into(), 0),
				signature_script: "0145".into(),
				sequence: 1,
			}],
			outputs: vec![TransactionOutput {
				value: 1000,
				script_pubkey: "51".into(),
			}],
			lock_time: 0,
			subnetwork_id: Default::default(),
			payload: Bytes::new(),
		}
	}

	#[test]
	fn test_transaction_round_trip() {
		let transaction = sample_transaction();
		let reread: Transaction = deserialize(serialize(&transaction).as_ref()).unwrap();
		assert_eq!(transaction, reread);
		assert_eq!(transaction.serialized_size(), serialize(&transaction).len());
	}

	#[test]
	fn test_transaction_id_ignores_signature_script() {
		let transaction = sample_transaction();
		let mut malleated = transaction.clone();
		malleated.inputs[0].signature_script = "0199".into();

		assert_eq!(transaction.id(), malleated.id());
		assert!(transaction.hash() != malleated.hash());
	}

	#[test]
	fn test_coinbase_by_subnetwork() {
		let mut transaction = sample_transaction();
		assert!(!transaction.is_coinbase());
		transaction.subnetwork_id = SUBNETWORK_ID_COINBASE;
		assert!(transaction.is_coinbase());
	}

	#[test]
	fn test_transaction_finality() {
		let mut transaction = sample_transaction();
		assert!(transaction.is_final());

		// blue-score lock
		transaction.lock_time = 100;
		assert!(!transaction.is_final_in_block(100, 0));
		assert!(transaction.is_final_in_block(101, 0));

		// maxed out sequences neutralize the lock
		transaction.inputs[0].sequence = SEQUENCE_FINAL;
		assert!(transaction.is_final_in_block(100, 0));
	}
}
