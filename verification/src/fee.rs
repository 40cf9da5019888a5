use chain::Transaction;
use chain::constants::MAX_SOMPI;
use network::ConsensusParams;
use storage::UTXOSet;
use error::TransactionError;

/// Checks the inputs of a transaction against the given UTXO snapshot
/// and returns its fee.
///
/// Covers input existence, coinbase maturity, value ranges against the
/// money ceiling and the input/output balance. Coinbase transactions
/// have no inputs to validate and pay no fee.
pub fn checked_transaction_fee(
	transaction: &Transaction,
	spending_blue_score: u64,
	utxo: &UTXOSet,
	params: &ConsensusParams,
) -> Result<u64, TransactionError> {
	if transaction.is_coinbase() {
		return Ok(0);
	}

	let mut total_in: u64 = 0;
	for input in &transaction.inputs {
		let entry = utxo.get(&input.previous_outpoint)
			.ok_or_else(|| TransactionError::MissingTxOut(input.previous_outpoint.clone()))?;

		validate_coinbase_maturity(entry.is_coinbase, entry.block_blue_score, spending_blue_score, params)?;

		if entry.amount > MAX_SOMPI {
			return Err(TransactionError::BadTxOutValue { value: entry.amount, max: MAX_SOMPI });
		}

		total_in = match total_in.checked_add(entry.amount) {
			Some(total) if total <= MAX_SOMPI => total,
			_ => return Err(TransactionError::BadTxOutValue { value: total_in, max: MAX_SOMPI }),
		};
	}

	let total_out = transaction.total_spends();
	if total_in < total_out {
		return Err(TransactionError::SpendTooHigh { spent: total_out, available: total_in });
	}

	Ok(total_in - total_out)
}

/// The single place deciding when a coinbase output has matured: an
/// output accepted at `origin` may be spent at `spend` iff
/// `spend - origin >= maturity`.
fn validate_coinbase_maturity(
	is_coinbase: bool,
	origin_blue_score: u64,
	spending_blue_score: u64,
	params: &ConsensusParams,
) -> Result<(), TransactionError> {
	if !is_coinbase {
		return Ok(());
	}

	if spending_blue_score.saturating_sub(origin_blue_score) < params.block_coinbase_maturity {
		return Err(TransactionError::ImmatureSpend {
			origin: origin_blue_score,
			spend: spending_blue_score,
			maturity: params.block_coinbase_maturity,
		});
	}

	Ok(())
}
