use std::collections::HashSet;
use chain::IndexedTransaction;
use chain::constants::MAX_SOMPI;
use error::TransactionError;

/// Maximum length of the coinbase payload carrying miner data.
pub const MAX_COINBASE_PAYLOAD_LENGTH: usize = 150;

/// Standalone transaction sanity checks; everything that can be decided
/// without looking at the DAG.
pub struct TransactionVerifier<'a> {
	pub empty: TransactionEmpty<'a>,
	pub coinbase_shape: TransactionCoinbaseShape<'a>,
	pub output_values: TransactionOutputValues<'a>,
	pub duplicate_inputs: TransactionDuplicateInputs<'a>,
}

impl<'a> TransactionVerifier<'a> {
	pub fn new(transaction: &'a IndexedTransaction) -> Self {
		TransactionVerifier {
			empty: TransactionEmpty::new(transaction),
			coinbase_shape: TransactionCoinbaseShape::new(transaction),
			output_values: TransactionOutputValues::new(transaction),
			duplicate_inputs: TransactionDuplicateInputs::new(transaction),
		}
	}

	pub fn check(&self) -> Result<(), TransactionError> {
		self.empty.check()?;
		self.coinbase_shape.check()?;
		self.output_values.check()?;
		self.duplicate_inputs.check()?;
		Ok(())
	}
}

/// A value-transfer transaction moves value: it must consume inputs and
/// create outputs. Coinbases have no inputs by construction.
pub struct TransactionEmpty<'a> {
	transaction: &'a IndexedTransaction,
}

impl<'a> TransactionEmpty<'a> {
	fn new(transaction: &'a IndexedTransaction) -> Self {
		TransactionEmpty {
			transaction: transaction,
		}
	}

	fn check(&self) -> Result<(), TransactionError> {
		if !self.transaction.raw.is_coinbase() && self.transaction.raw.is_empty() {
			return Err(TransactionError::Empty);
		}
		Ok(())
	}
}

pub struct TransactionCoinbaseShape<'a> {
	transaction: &'a IndexedTransaction,
}

impl<'a> TransactionCoinbaseShape<'a> {
	fn new(transaction: &'a IndexedTransaction) -> Self {
		TransactionCoinbaseShape {
			transaction: transaction,
		}
	}

	fn check(&self) -> Result<(), TransactionError> {
		if !self.transaction.raw.is_coinbase() {
			return Ok(());
		}

		if !self.transaction.raw.inputs.is_empty() {
			return Err(TransactionError::CoinbaseWithInputs);
		}

		let payload_length = self.transaction.raw.payload.len();
		if payload_length > MAX_COINBASE_PAYLOAD_LENGTH {
			return Err(TransactionError::CoinbasePayloadLength(payload_length));
		}

		Ok(())
	}
}

/// Every output and the output total must stay below the money ceiling.
pub struct TransactionOutputValues<'a> {
	transaction: &'a IndexedTransaction,
}

impl<'a> TransactionOutputValues<'a> {
	fn new(transaction: &'a IndexedTransaction) -> Self {
		TransactionOutputValues {
			transaction: transaction,
		}
	}

	fn check(&self) -> Result<(), TransactionError> {
		let mut total: u64 = 0;
		for output in &self.transaction.raw.outputs {
			if output.value > MAX_SOMPI {
				return Err(TransactionError::BadTxOutValue { value: output.value, max: MAX_SOMPI });
			}

			total = match total.checked_add(output.value) {
				Some(total) if total <= MAX_SOMPI => total,
				_ => return Err(TransactionError::BadTxOutValue { value: ::std::u64::MAX, max: MAX_SOMPI }),
			};
		}

		Ok(())
	}
}

pub struct TransactionDuplicateInputs<'a> {
	transaction: &'a IndexedTransaction,
}

impl<'a> TransactionDuplicateInputs<'a> {
	fn new(transaction: &'a IndexedTransaction) -> Self {
		TransactionDuplicateInputs {
			transaction: transaction,
		}
	}

	fn check(&self) -> Result<(), TransactionError> {
		let mut spent = HashSet::with_capacity(self.transaction.raw.inputs.len());
		for input in &self.transaction.raw.inputs {
			if !spent.insert(&input.previous_outpoint) {
				return Err(TransactionError::DuplicateInput(input.previous_outpoint.clone()));
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use chain::{IndexedTransaction, OutPoint, Transaction, TransactionInput, TransactionOutput};
	use chain::SUBNETWORK_ID_COINBASE;
	use chain::constants::MAX_SOMPI;
	use error::TransactionError;
	use super::{TransactionVerifier, MAX_COINBASE_PAYLOAD_LENGTH};

	fn input(n: u8) -> TransactionInput {
		TransactionInput {
			previous_outpoint: OutPoint::new(n.into(), 0),
			signature_script: Default::default(),
			sequence: 0,
		}
	}

	fn output(value: u64) -> TransactionOutput {
		TransactionOutput {
			value: value,
			script_pubkey: "51".into(),
		}
	}

	#[test]
	fn test_empty_transaction_fails() {
		let transaction: IndexedTransaction = Transaction {
			inputs: vec![input(1)],
			outputs: vec![],
			..Default::default()
		}.into();
		assert_eq!(TransactionVerifier::new(&transaction).check(), Err(TransactionError::Empty));
	}

	#[test]
	fn test_coinbase_with_inputs_fails() {
		let transaction: IndexedTransaction = Transaction {
			subnetwork_id: SUBNETWORK_ID_COINBASE,
			inputs: vec![input(1)],
			outputs: vec![output(1)],
			..Default::default()
		}.into();
		assert_eq!(TransactionVerifier::new(&transaction).check(), Err(TransactionError::CoinbaseWithInputs));
	}

	#[test]
	fn test_oversized_coinbase_payload_fails() {
		let transaction: IndexedTransaction = Transaction {
			subnetwork_id: SUBNETWORK_ID_COINBASE,
			payload: vec![0; MAX_COINBASE_PAYLOAD_LENGTH + 1].into(),
			..Default::default()
		}.into();
		assert_eq!(
			TransactionVerifier::new(&transaction).check(),
			Err(TransactionError::CoinbasePayloadLength(MAX_COINBASE_PAYLOAD_LENGTH + 1)),
		);
	}

	#[test]
	fn test_output_value_overflow_fails() {
		let transaction: IndexedTransaction = Transaction {
			inputs: vec![input(1)],
			outputs: vec![output(MAX_SOMPI), output(MAX_SOMPI)],
			..Default::default()
		}.into();
		assert_matches!(
			TransactionVerifier::new(&transaction).check(),
			Err(TransactionError::BadTxOutValue { .. })
		);
	}

	#[test]
	fn test_duplicate_inputs_fail() {
		let transaction: IndexedTransaction = Transaction {
			inputs: vec![input(1), input(1)],
			outputs: vec![output(1)],
			..Default::default()
		}.into();
		assert_eq!(
			TransactionVerifier::new(&transaction).check(),
			Err(TransactionError::DuplicateInput(OutPoint::new(1u8.into(), 0))),
		);
	}

	#[test]
	fn test_plain_transfer_passes() {
		let transaction: IndexedTransaction = Transaction {
			inputs: vec![input(1), input(2)],
			outputs: vec![output(10)],
			..Default::default()
		}.into();
		assert_eq!(TransactionVerifier::new(&transaction).check(), Ok(()));
	}
}
