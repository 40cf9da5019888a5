//! The block mass model.
//!
//! Mass approximates the resources a transaction consumes when being
//! validated and stored. Three properties contribute, each with its own
//! price per unit.

use chain::Transaction;
use primitives::bytes::Bytes;
use ser::Serializable;
use script::transaction_sigops;
use storage::UTXOSet;
use error::{Error, TransactionError};

/// Grams every serialized byte adds to a transaction.
pub const MASS_PER_TX_BYTE: u64 = 1;
/// Grams every output script byte adds to a transaction.
pub const MASS_PER_SCRIPT_PUB_KEY_BYTE: u64 = 10;
/// Grams every signature operation adds to a transaction.
pub const MASS_PER_SIG_OP: u64 = 10_000;

/// The mass of a transaction given the output scripts its inputs refer
/// to. Coinbase transactions only pay the byte term.
pub fn transaction_mass(transaction: &Transaction, previous_script_pubkeys: &[Bytes]) -> u64 {
	let size = transaction.serialized_size() as u64;

	if transaction.is_coinbase() {
		return size * MASS_PER_TX_BYTE;
	}

	let script_pubkey_size: u64 = transaction.outputs.iter()
		.map(|output| output.script_pubkey.len() as u64)
		.sum();

	let sigops = transaction_sigops(transaction, previous_script_pubkeys) as u64;

	size * MASS_PER_TX_BYTE +
		script_pubkey_size * MASS_PER_SCRIPT_PUB_KEY_BYTE +
		sigops * MASS_PER_SIG_OP
}

/// The mass of a transaction with input scripts resolved against the
/// given UTXO snapshot.
pub fn transaction_mass_from_utxo(transaction: &Transaction, utxo: &UTXOSet) -> Result<u64, TransactionError> {
	if transaction.is_coinbase() {
		return Ok(transaction_mass(transaction, &[]));
	}

	let mut previous_script_pubkeys = Vec::with_capacity(transaction.inputs.len());
	for input in &transaction.inputs {
		let entry = utxo.get(&input.previous_outpoint)
			.ok_or_else(|| TransactionError::MissingTxOut(input.previous_outpoint.clone()))?;
		previous_script_pubkeys.push(entry.script_pubkey.clone());
	}

	Ok(transaction_mass(transaction, &previous_script_pubkeys))
}

/// Accumulated mass of a block's transactions against its past UTXO.
/// Fails once the accumulator exceeds the limit, without a full count.
pub fn block_mass(transactions: &[Transaction], utxo: &UTXOSet, max_mass: u64) -> Result<u64, Error> {
	let mut total: u64 = 0;

	for (index, transaction) in transactions.iter().enumerate() {
		let mass = transaction_mass_from_utxo(transaction, utxo)
			.map_err(|err| Error::Transaction(index, err))?;

		if mass > max_mass {
			return Err(Error::Transaction(index, TransactionError::TxMassTooHigh { mass: mass, max: max_mass }));
		}

		total = match total.checked_add(mass) {
			Some(total) if total <= max_mass => total,
			_ => return Err(Error::BlockMassTooHigh { mass: total.saturating_add(mass), max: max_mass }),
		};
	}

	Ok(total)
}
