use primitives::hash::H256;
use storage::{BlockHeaderProvider, GhostdagStore};

/// Number of selected-chain ancestors (inclusive) whose timestamps are
/// taken into account when computing the past median time.
pub const MEDIAN_TIME_WINDOW: usize = 11;

/// Returns the past median time of the block with the given hash: the
/// median timestamp of up to `MEDIAN_TIME_WINDOW` blocks walking the
/// selected-parent chain from it, inclusive.
pub fn median_timestamp(
	block_hash: &H256,
	ghostdag: &GhostdagStore,
	headers: &BlockHeaderProvider,
) -> u64 {
	let mut timestamps = Vec::with_capacity(MEDIAN_TIME_WINDOW);
	let mut current = *block_hash;

	while timestamps.len() < MEDIAN_TIME_WINDOW {
		let header = match headers.block_header(&current) {
			Some(header) => header,
			None => break,
		};
		timestamps.push(header.raw.time);

		match ghostdag.ghostdag_data(&current).and_then(|data| data.selected_parent) {
			Some(selected_parent) => current = selected_parent,
			None => break,
		}
	}

	if timestamps.is_empty() {
		return 0;
	}

	timestamps.sort();
	timestamps[timestamps.len() / 2]
}
