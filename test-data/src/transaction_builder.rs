use chain::{OutPoint, Transaction, TransactionInput, TransactionOutput};
use chain::{SubnetworkId, SUBNETWORK_ID_COINBASE};
use primitives::bytes::Bytes;

pub fn transaction_builder() -> TransactionBuilder {
	TransactionBuilder::default()
}

/// Fluent transaction builder. Inputs default to a final sequence and an
/// empty signature script; outputs default to an anyone-can-spend
/// script.
pub struct TransactionBuilder {
	version: u32,
	inputs: Vec<TransactionInput>,
	outputs: Vec<TransactionOutput>,
	lock_time: u64,
	subnetwork_id: SubnetworkId,
	payload: Bytes,
}

impl Default for TransactionBuilder {
	fn default() -> Self {
		TransactionBuilder {
			version: 1,
			inputs: vec![],
			outputs: vec![],
			lock_time: 0,
			subnetwork_id: Default::default(),
			payload: Bytes::new(),
		}
	}
}

impl TransactionBuilder {
	pub fn coinbase(mut self) -> Self {
		self.subnetwork_id = SUBNETWORK_ID_COINBASE;
		self.inputs.clear();
		self
	}

	pub fn with_subnetwork(mut self, subnetwork_id: SubnetworkId) -> Self {
		self.subnetwork_id = subnetwork_id;
		self
	}

	pub fn with_input(mut self, previous_outpoint: OutPoint) -> Self {
		self.inputs.push(TransactionInput {
			previous_outpoint: previous_outpoint,
			signature_script: Bytes::new(),
			sequence: ::std::u64::MAX,
		});
		self
	}

	/// Sets the sequence of the most recently added input.
	pub fn with_sequence(mut self, sequence: u64) -> Self {
		self.inputs.last_mut().expect("with_sequence follows with_input").sequence = sequence;
		self
	}

	/// Sets the signature script of the most recently added input.
	pub fn with_signature_script(mut self, signature_script: Bytes) -> Self {
		self.inputs.last_mut().expect("with_signature_script follows with_input").signature_script = signature_script;
		self
	}

	pub fn with_output(self, value: u64) -> Self {
		// OP_1: anyone can spend
		self.with_output_script(value, vec![0x51].into())
	}

	pub fn with_output_script(mut self, value: u64, script_pubkey: Bytes) -> Self {
		self.outputs.push(TransactionOutput {
			value: value,
			script_pubkey: script_pubkey,
		});
		self
	}

	pub fn with_lock_time(mut self, lock_time: u64) -> Self {
		self.lock_time = lock_time;
		self
	}

	pub fn with_payload(mut self, payload: &[u8]) -> Self {
		self.payload = payload.to_vec().into();
		self
	}

	pub fn build(self) -> Transaction {
		Transaction {
			version: self.version,
			inputs: self.inputs,
			outputs: self.outputs,
			lock_time: self.lock_time,
			subnetwork_id: self.subnetwork_id,
			payload: self.payload,
		}
	}
}
