use rayon::prelude::{IntoParallelRefIterator, IndexedParallelIterator, ParallelIterator};
use chain::constants::COINBASE_TRANSACTION_INDEX;
use network::ConsensusParams;
use script::{verify_script, Script, SignatureCache, TransactionInputSigner, TransactionSignatureChecker};
use storage::UTXOSet;
use canon::CanonBlock;
use fee::checked_transaction_fee;
use mass::block_mass;
use sequence::{calculate_sequence_lock, sequence_lock_active, PastMedianTimeProvider};
use error::{Error, TransactionError};

/// Re-validation of a block under its true past UTXO, run by the state
/// manager once the selected-parent chain is resolved. A failure here
/// disqualifies the block from the chain instead of rejecting it.
pub struct BlockUtxoAcceptor<'a> {
	block: CanonBlock<'a>,
	past_utxo: &'a UTXOSet,
	blue_score: u64,
	median_time: u64,
	max_coinbase_value: u64,
	consensus: &'a ConsensusParams,
	median_times: &'a PastMedianTimeProvider,
	signature_cache: &'a SignatureCache,
}

impl<'a> BlockUtxoAcceptor<'a> {
	pub fn new(
		block: CanonBlock<'a>,
		past_utxo: &'a UTXOSet,
		blue_score: u64,
		median_time: u64,
		max_coinbase_value: u64,
		consensus: &'a ConsensusParams,
		median_times: &'a PastMedianTimeProvider,
		signature_cache: &'a SignatureCache,
	) -> Self {
		trace!(target: "verification", "Block UTXO verification {}", block.hash());
		BlockUtxoAcceptor {
			block: block,
			past_utxo: past_utxo,
			blue_score: blue_score,
			median_time: median_time,
			max_coinbase_value: max_coinbase_value,
			consensus: consensus,
			median_times: median_times,
			signature_cache: signature_cache,
		}
	}

	pub fn check(&self) -> Result<(), Error> {
		self.check_no_overwrites()?;
		self.check_block_mass()?;
		self.check_fees()?;
		self.check_finalized()?;
		self.check_coinbase_value()?;
		self.check_scripts()?;
		Ok(())
	}

	/// A transaction id may only repeat once every output of the older
	/// occurrence is spent; an unspent duplicate would overwrite it.
	fn check_no_overwrites(&self) -> Result<(), Error> {
		for transaction in &self.block.transactions {
			for index in 0..transaction.raw.outputs.len() {
				let outpoint = ::chain::OutPoint::new(transaction.id, index as u32);
				if self.past_utxo.contains(&outpoint) {
					return Err(Error::OverwriteTx(transaction.id));
				}
			}
		}
		Ok(())
	}

	fn check_block_mass(&self) -> Result<(), Error> {
		let transactions: Vec<_> = self.block.transactions.iter().map(|tx| tx.raw.clone()).collect();
		block_mass(&transactions, self.past_utxo, self.consensus.max_mass_per_block)?;
		Ok(())
	}

	fn check_fees(&self) -> Result<(), Error> {
		let mut total_fees: u64 = 0;

		for (index, transaction) in self.block.transactions.iter().enumerate() {
			let fee = checked_transaction_fee(&transaction.raw, self.blue_score, self.past_utxo, self.consensus)
				.map_err(|err| Error::Transaction(index, err))?;

			total_fees = match total_fees.checked_add(fee) {
				Some(total) => total,
				None => return Err(Error::BadFees),
			};
		}

		Ok(())
	}

	fn check_finalized(&self) -> Result<(), Error> {
		for (index, transaction) in self.block.transactions.iter().enumerate() {
			if !transaction.raw.is_final_in_block(self.blue_score, self.median_time) {
				return Err(Error::Transaction(index, TransactionError::UnfinalizedTx));
			}

			let lock = calculate_sequence_lock(&transaction.raw, self.past_utxo, self.median_times)
				.map_err(|err| Error::Transaction(index, err))?;
			if !sequence_lock_active(&lock, self.blue_score, self.median_time) {
				return Err(Error::Transaction(index, TransactionError::UnfinalizedTx));
			}
		}

		Ok(())
	}

	fn check_coinbase_value(&self) -> Result<(), Error> {
		let claim = self.block.transactions[COINBASE_TRANSACTION_INDEX].raw.total_spends();
		if claim > self.max_coinbase_value {
			Err(Error::BadCoinbaseValue { expected_max: self.max_coinbase_value, actual: claim })
		} else {
			Ok(())
		}
	}

	/// The expensive part: script execution for every input, fanned out
	/// over the worker pool with the shared signature cache. The pool
	/// joins before this returns.
	fn check_scripts(&self) -> Result<(), Error> {
		self.block.transactions.par_iter()
			.enumerate()
			.map(|(index, transaction)| self.check_transaction_scripts(&transaction.raw)
				.map_err(|err| Error::Transaction(index, err)))
			.reduce(|| Ok(()), |acc, check| acc.and(check))
	}

	fn check_transaction_scripts(&self, transaction: &::chain::Transaction) -> Result<(), TransactionError> {
		if transaction.is_coinbase() {
			return Ok(());
		}

		let signer = TransactionInputSigner::from(transaction.clone());

		for (input_index, input) in transaction.inputs.iter().enumerate() {
			let entry = self.past_utxo.get(&input.previous_outpoint)
				.ok_or_else(|| TransactionError::MissingTxOut(input.previous_outpoint.clone()))?;

			let checker = TransactionSignatureChecker {
				signer: signer.clone(),
				input_index: input_index,
				input_amount: entry.amount,
			};

			let signature_script: Script = input.signature_script.clone().into();
			let script_pubkey: Script = entry.script_pubkey.clone().into();

			verify_script(&signature_script, &script_pubkey, &checker, self.signature_cache)
				.map_err(|err| TransactionError::Signature(input_index, err))?;
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use chain::IndexedBlock;
	use network::{ConsensusParams, Network};
	use script::SignatureCache;
	use storage::{UTXODiff, UTXOEntry, UTXOSet};
	use test_data;
	use canon::CanonBlock;
	use sequence::PastMedianTimeProvider;
	use error::{Error, TransactionError};
	use super::BlockUtxoAcceptor;

	struct ZeroMedianTime;

	impl PastMedianTimeProvider for ZeroMedianTime {
		fn median_time_at_blue_score(&self, _blue_score: u64) -> u64 {
			0
		}
	}

	fn utxo_with_anyone_can_spend(outpoint: ::chain::OutPoint, amount: u64) -> UTXOSet {
		let mut set = UTXOSet::new();
		let mut diff = UTXODiff::new();
		diff.add_entry(outpoint, UTXOEntry {
			amount: amount,
			script_pubkey: "51".into(),
			block_blue_score: 0,
			is_coinbase: false,
		});
		set.apply(&diff).unwrap();
		set
	}

	fn acceptor_error(block: &IndexedBlock, utxo: &UTXOSet, max_coinbase: u64) -> Result<(), Error> {
		let consensus = ConsensusParams::new(Network::Unitest);
		let cache = SignatureCache::new();
		let median_times = ZeroMedianTime;
		BlockUtxoAcceptor::new(
			CanonBlock::new(block),
			utxo,
			1,
			consensus.genesis_block.header.raw.time,
			max_coinbase,
			&consensus,
			&median_times,
			&cache,
		).check()
	}

	#[test]
	fn test_spend_of_existing_output_passes() {
		let outpoint = ::chain::OutPoint::new(3u8.into(), 0);
		let utxo = utxo_with_anyone_can_spend(outpoint.clone(), 100);

		let block: IndexedBlock = test_data::block_builder()
			.with_coinbase(10)
			.with_transaction(test_data::transaction_builder()
				.with_input(outpoint)
				.with_output(90)
				.build())
			.merkled()
			.build()
			.into();

		assert_eq!(acceptor_error(&block, &utxo, 1_000_000), Ok(()));
	}

	#[test]
	fn test_spend_of_missing_output_fails() {
		let outpoint = ::chain::OutPoint::new(3u8.into(), 0);
		let utxo = UTXOSet::new();

		let block: IndexedBlock = test_data::block_builder()
			.with_coinbase(10)
			.with_transaction(test_data::transaction_builder()
				.with_input(outpoint.clone())
				.with_output(90)
				.build())
			.merkled()
			.build()
			.into();

		assert_eq!(
			acceptor_error(&block, &utxo, 1_000_000),
			Err(Error::Transaction(1, TransactionError::MissingTxOut(outpoint))),
		);
	}

	#[test]
	fn test_greedy_coinbase_fails() {
		let utxo = UTXOSet::new();
		let block: IndexedBlock = test_data::block_builder()
			.with_coinbase(1_000)
			.merkled()
			.build()
			.into();

		assert_eq!(
			acceptor_error(&block, &utxo, 999),
			Err(Error::BadCoinbaseValue { expected_max: 999, actual: 1_000 }),
		);
	}
}
