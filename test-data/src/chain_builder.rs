use chain::{Block, Transaction};
use chain::constants::SOMPI_PER_COIN;
use primitives::compact::Compact;
use primitives::hash::H256;
use block_builder::block_builder;

/// Builds valid linear extensions: sorted parents, correct bits and
/// stepped timestamps, computed merkle roots and a subsidy coinbase per
/// block. Header commitments come from the injected callback, typically
/// backed by the consensus under test.
pub struct ChainBuilder<'a> {
	commitments: &'a Fn(&[H256]) -> (H256, H256),
	coinbase_value: u64,
	bits: Compact,
	time_step: u64,
}

impl<'a> ChainBuilder<'a> {
	pub fn new(commitments: &'a Fn(&[H256]) -> (H256, H256)) -> Self {
		ChainBuilder {
			commitments: commitments,
			coinbase_value: 50 * SOMPI_PER_COIN,
			bits: Compact::new(0x207fffff),
			time_step: 1_000,
		}
	}

	/// A valid block over the given parents at the given time.
	pub fn block_at(&self, parents: Vec<H256>, transactions: Vec<Transaction>, time: u64) -> Block {
		let mut parents = parents;
		parents.sort();
		let (accepted_id_merkle_root, utxo_commitment) = (self.commitments)(&parents);

		let mut builder = block_builder()
			.with_parents(parents)
			.with_coinbase(self.coinbase_value)
			.with_bits(self.bits)
			.with_time(time)
			.with_commitments(accepted_id_merkle_root, utxo_commitment);
		for transaction in transactions {
			builder = builder.with_transaction(transaction);
		}
		builder.merkled().build()
	}

	/// A linear extension of `length` empty blocks on top of `from`.
	/// Every block is handed to `submit` before the next one is built,
	/// so commitments are computed against the updated state.
	pub fn extend<F>(&self, from: H256, from_time: u64, length: usize, mut submit: F) -> Vec<Block>
		where F: FnMut(Block) {
		let mut blocks = Vec::with_capacity(length);
		let mut parent = from;
		let mut time = from_time;

		for _ in 0..length {
			time += self.time_step;
			let block = self.block_at(vec![parent], vec![], time);
			parent = block.hash();
			submit(block.clone());
			blocks.push(block);
		}

		blocks
	}
}
