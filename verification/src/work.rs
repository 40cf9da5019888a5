use primitives::compact::Compact;
use primitives::hash::H256;
use primitives::U256;
use network::ConsensusParams;
use storage::{BlockHeaderProvider, GhostdagStore};

/// Returns true if hash is lower or equal than target represented by
/// compact bits
pub fn is_valid_proof_of_work_hash(bits: Compact, hash: &H256) -> bool {
	let target = match bits.to_u256() {
		Ok(target) => target,
		_err => return false,
	};

	hash.to_u256() <= target
}

/// Returns true if hash is lower or equal than target and target is
/// lower or equal than current network maximum
pub fn is_valid_proof_of_work(max_work_bits: Compact, bits: Compact, hash: &H256) -> bool {
	let maximum = match max_work_bits.to_u256() {
		Ok(max) => max,
		_err => return false,
	};

	let target = match bits.to_u256() {
		Ok(target) => target,
		_err => return false,
	};

	target <= maximum && hash.to_u256() <= target
}

/// Amount of work a block with the given bits contributes:
/// `~target / (target + 1)`, the expected number of hash attempts.
pub fn block_work(bits: Compact) -> U256 {
	let target = match bits.to_u256() {
		Ok(target) => target,
		_err => return 0.into(),
	};

	// (2^256 - 1 - target) / (target + 1) + 1, avoiding 2^256 overflow
	(!target / (target + U256::from(1u64))) + U256::from(1u64)
}

/// Returns work required for a block whose bluest parent is given.
///
/// The required target is the window average of the selected-parent
/// chain targets scaled by the actual/expected timespan ratio, clamped
/// to the network maximum. While the chain is shorter than the window
/// the maximum target is required.
pub fn required_difficulty(
	bluest_parent: &H256,
	ghostdag: &GhostdagStore,
	headers: &BlockHeaderProvider,
	params: &ConsensusParams,
) -> Compact {
	let mut window = Vec::with_capacity(params.difficulty_adjustment_window);
	let mut current = *bluest_parent;

	loop {
		let header = match headers.block_header(&current) {
			Some(header) => header,
			None => return params.pow_max,
		};
		window.push((header.raw.bits, header.raw.time));

		if window.len() == params.difficulty_adjustment_window {
			break;
		}

		match ghostdag.ghostdag_data(&current).and_then(|data| data.selected_parent) {
			Some(selected_parent) => current = selected_parent,
			// the window reached past genesis
			None => return params.pow_max,
		}
	}

	let pow_max = params.pow_max.to_u256().expect("pow_max is a validated network constant");

	let mut targets_sum = U256::from(0u64);
	for &(bits, _) in &window {
		let target = match bits.to_u256() {
			Ok(target) => target,
			Err(_) => return params.pow_max,
		};
		// scale down before summing so the accumulator cannot overflow
		targets_sum = targets_sum + target / U256::from(window.len() as u64);
	}

	let newest_time = window.first().expect("window is non-empty").1;
	let oldest_time = window.last().expect("window is non-empty").1;
	let expected_timespan = params.target_time_per_block * (window.len() as u64 - 1).max(1);

	// the adjustment per window is clamped to 4x either way, which also
	// keeps the target arithmetic inside 256 bits
	let actual_timespan = newest_time.saturating_sub(oldest_time)
		.max(expected_timespan / 4)
		.min(expected_timespan * 4);

	let adjusted = targets_sum / U256::from(expected_timespan) * U256::from(actual_timespan);
	if adjusted > pow_max {
		params.pow_max
	} else {
		Compact::from_u256(adjusted)
	}
}

/// Base reward for a block at the given blue score, in sompi.
pub fn block_subsidy(blue_score: u64, params: &ConsensusParams) -> u64 {
	let halvings = blue_score / params.subsidy_halving_interval;
	if halvings >= 64 {
		return 0;
	}
	(50 * ::chain::constants::SOMPI_PER_COIN) >> halvings
}

#[cfg(test)]
mod tests {
	use primitives::compact::Compact;
	use primitives::hash::H256;
	use network::{ConsensusParams, Network};
	use super::{block_subsidy, block_work, is_valid_proof_of_work_hash};

	#[test]
	fn test_zero_hash_satisfies_any_target() {
		assert!(is_valid_proof_of_work_hash(Compact::new(0x207fffff), &H256::zero()));
	}

	#[test]
	fn test_all_ones_hash_fails_real_target() {
		let mut hash = H256::zero();
		for byte in hash.iter_mut() {
			*byte = 0xff;
		}
		assert!(!is_valid_proof_of_work_hash(Compact::new(0x1d00ffff), &hash));
	}

	#[test]
	fn test_harder_target_means_more_work() {
		let easy = block_work(Compact::new(0x207fffff));
		let hard = block_work(Compact::new(0x1d00ffff));
		assert!(hard > easy);
	}

	#[test]
	fn test_subsidy_halves() {
		let mut params = ConsensusParams::new(Network::Unitest);
		params.subsidy_halving_interval = 100;

		assert_eq!(block_subsidy(0, &params), 2 * block_subsidy(100, &params));
		assert_eq!(block_subsidy(99, &params), 2 * block_subsidy(199, &params));
		assert_eq!(block_subsidy(100 * 64, &params), 0);
	}
}
