//! Relative lock-times carried in input sequence numbers.

use chain::Transaction;
use storage::UTXOSet;
use error::TransactionError;

/// Bit 63: the input's relative lock is disabled.
pub const SEQUENCE_LOCK_TIME_DISABLED: u64 = 1 << 63;
/// Bit 62: the lock value counts milliseconds, not blue scores.
pub const SEQUENCE_LOCK_TIME_IS_MILLISECONDS: u64 = 1 << 62;
/// Low bits carrying the relative lock value.
pub const SEQUENCE_LOCK_TIME_MASK: u64 = 0xffff_ffff;

/// The point from which a transaction with relative locks may be mined:
/// both components must be strictly passed. `-1` marks a component that
/// no input constrains.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequenceLock {
	pub milliseconds: i64,
	pub block_blue_score: i64,
}

/// Past median times of selected-chain ancestors, answered by the
/// consensus state. Needed to anchor millisecond-based relative locks at
/// the time their input was accepted. `Sync` because the script
/// verification workers consult it concurrently.
pub trait PastMedianTimeProvider: Sync {
	/// Past median time of the most recent selected-chain ancestor whose
	/// blue score does not exceed the given one.
	fn median_time_at_blue_score(&self, blue_score: u64) -> u64;
}

/// Determines if a transaction's sequence locks have been met, meaning
/// that all the inputs of a given transaction have reached a blue score
/// or time sufficient for their relative lock-time maturity.
pub fn sequence_lock_active(lock: &SequenceLock, block_blue_score: u64, median_time: u64) -> bool {
	lock.milliseconds < median_time as i64 && lock.block_blue_score < block_blue_score as i64
}

/// Computes the sequence lock of a transaction: the componentwise
/// maximum of its inputs' relative locks, each anchored at the point the
/// spent output was accepted.
pub fn calculate_sequence_lock(
	transaction: &Transaction,
	utxo: &UTXOSet,
	median_times: &PastMedianTimeProvider,
) -> Result<SequenceLock, TransactionError> {
	let mut lock = SequenceLock {
		milliseconds: -1,
		block_blue_score: -1,
	};

	if transaction.is_coinbase() {
		return Ok(lock);
	}

	for input in &transaction.inputs {
		if input.sequence & SEQUENCE_LOCK_TIME_DISABLED != 0 {
			continue;
		}

		let entry = utxo.get(&input.previous_outpoint)
			.ok_or_else(|| TransactionError::MissingTxOut(input.previous_outpoint.clone()))?;
		let value = input.sequence & SEQUENCE_LOCK_TIME_MASK;

		if input.sequence & SEQUENCE_LOCK_TIME_IS_MILLISECONDS != 0 {
			let anchor = median_times.median_time_at_blue_score(entry.block_blue_score) as i64;
			lock.milliseconds = lock.milliseconds.max(anchor + value as i64 - 1);
		} else {
			lock.block_blue_score = lock.block_blue_score.max(entry.block_blue_score as i64 + value as i64 - 1);
		}
	}

	Ok(lock)
}

#[cfg(test)]
mod tests {
	use chain::{OutPoint, Transaction, TransactionInput};
	use storage::{UTXODiff, UTXOEntry, UTXOSet};
	use super::*;

	struct ConstantMedianTime(u64);

	impl PastMedianTimeProvider for ConstantMedianTime {
		fn median_time_at_blue_score(&self, _blue_score: u64) -> u64 {
			self.0
		}
	}

	fn utxo_at_blue_score(outpoint: OutPoint, blue_score: u64) -> UTXOSet {
		let mut set = UTXOSet::new();
		let mut diff = UTXODiff::new();
		diff.add_entry(outpoint, UTXOEntry {
			amount: 1,
			script_pubkey: Default::default(),
			block_blue_score: blue_score,
			is_coinbase: false,
		});
		set.apply(&diff).unwrap();
		set
	}

	fn transaction_with_sequence(outpoint: OutPoint, sequence: u64) -> Transaction {
		Transaction {
			inputs: vec![TransactionInput {
				previous_outpoint: outpoint,
				signature_script: Default::default(),
				sequence: sequence,
			}],
			..Default::default()
		}
	}

	#[test]
	fn test_lock_activity_is_monotone() {
		let lock = SequenceLock { milliseconds: 100, block_blue_score: 10 };

		assert!(!sequence_lock_active(&lock, 10, 101));
		assert!(!sequence_lock_active(&lock, 11, 100));
		assert!(sequence_lock_active(&lock, 11, 101));
		// increasing either coordinate never deactivates the lock
		assert!(sequence_lock_active(&lock, 12, 102));
	}

	#[test]
	fn test_disabled_sequence_constrains_nothing() {
		let outpoint = OutPoint::new(1u8.into(), 0);
		let utxo = utxo_at_blue_score(outpoint.clone(), 50);
		let transaction = transaction_with_sequence(outpoint, SEQUENCE_LOCK_TIME_DISABLED | 16);

		let lock = calculate_sequence_lock(&transaction, &utxo, &ConstantMedianTime(0)).unwrap();
		assert_eq!(lock, SequenceLock { milliseconds: -1, block_blue_score: -1 });
	}

	#[test]
	fn test_blue_score_lock_anchored_at_origin() {
		let outpoint = OutPoint::new(1u8.into(), 0);
		let utxo = utxo_at_blue_score(outpoint.clone(), 50);
		let transaction = transaction_with_sequence(outpoint, 16);

		let lock = calculate_sequence_lock(&transaction, &utxo, &ConstantMedianTime(0)).unwrap();
		assert_eq!(lock.block_blue_score, 50 + 16 - 1);

		// active only once the spending block's blue score passes it
		assert!(!sequence_lock_active(&lock, 65, 1));
		assert!(sequence_lock_active(&lock, 66, 1));
	}

	#[test]
	fn test_millisecond_lock_anchored_at_origin_median_time() {
		let outpoint = OutPoint::new(1u8.into(), 0);
		let utxo = utxo_at_blue_score(outpoint.clone(), 50);
		let transaction = transaction_with_sequence(outpoint, SEQUENCE_LOCK_TIME_IS_MILLISECONDS | 2_000);

		let lock = calculate_sequence_lock(&transaction, &utxo, &ConstantMedianTime(10_000)).unwrap();
		assert_eq!(lock.milliseconds, 10_000 + 2_000 - 1);
	}
}
