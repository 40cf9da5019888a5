use chain::IndexedBlock;
use primitives::compact::Compact;
use primitives::hash::H256;
use genesis::genesis_block;
use network::Network;

/// Parameters that influence DAG consensus. Injected into the consensus
/// core by the embedder; nothing here is negotiated at runtime.
#[derive(Debug, Clone)]
pub struct ConsensusParams {
	/// Network.
	pub network: Network,
	/// The genesis block. Its hash anchors the DAG; a submitted block
	/// with no parents must be this block.
	pub genesis_block: IndexedBlock,
	/// Hash of the genesis block.
	pub genesis_hash: H256,
	/// Highest allowed proof-of-work target.
	pub pow_max: Compact,
	/// Skip the expensive hash-below-target check. Only ever set on
	/// private test networks.
	pub skip_proof_of_work: bool,
	/// Optimal interval between blocks, in milliseconds.
	pub target_time_per_block: u64,
	/// A block timestamp may exceed local time by at most
	/// `timestamp_deviation_tolerance * target_time_per_block`
	/// milliseconds before the block is delayed.
	pub timestamp_deviation_tolerance: u64,
	/// Blue scores that must pass before a coinbase output can be spent.
	pub block_coinbase_maturity: u64,
	/// Upper bound for the accumulated mass of a block.
	pub max_mass_per_block: u64,
	/// Allow transactions on subnetworks other than the built-in ones.
	pub enable_non_native_subnetworks: bool,
	/// Depth below the virtual's selected parent at which the selected
	/// chain is considered final.
	pub finality_depth: u64,
	/// GHOSTDAG anticone size parameter.
	pub ghostdag_k: u64,
	/// Number of selected-chain ancestors averaged when retargeting.
	/// Windows that reach back past genesis yield `pow_max`.
	pub difficulty_adjustment_window: usize,
	/// Blue score interval between subsidy halvings.
	pub subsidy_halving_interval: u64,
}

impl ConsensusParams {
	pub fn new(network: Network) -> Self {
		let genesis = IndexedBlock::from_raw(genesis_block(network));
		let genesis_hash = *genesis.hash();

		match network {
			Network::Mainnet => ConsensusParams {
				network: network,
				genesis_block: genesis,
				genesis_hash: genesis_hash,
				pow_max: Compact::new(0x1e00ffff),
				skip_proof_of_work: false,
				target_time_per_block: network.target_time_per_block(),
				timestamp_deviation_tolerance: 132,
				block_coinbase_maturity: 100,
				max_mass_per_block: 10_000_000,
				enable_non_native_subnetworks: false,
				finality_depth: 86_400,
				ghostdag_k: 18,
				difficulty_adjustment_window: 2_640,
				subsidy_halving_interval: 150_000_000,
			},
			Network::Testnet => ConsensusParams {
				network: network,
				genesis_block: genesis,
				genesis_hash: genesis_hash,
				pow_max: Compact::new(0x1e7fffff),
				skip_proof_of_work: false,
				target_time_per_block: network.target_time_per_block(),
				timestamp_deviation_tolerance: 132,
				block_coinbase_maturity: 100,
				max_mass_per_block: 10_000_000,
				enable_non_native_subnetworks: true,
				finality_depth: 86_400,
				ghostdag_k: 18,
				difficulty_adjustment_window: 2_640,
				subsidy_halving_interval: 150_000_000,
			},
			Network::Unitest => ConsensusParams {
				network: network,
				genesis_block: genesis,
				genesis_hash: genesis_hash,
				pow_max: Compact::new(0x207fffff),
				skip_proof_of_work: true,
				target_time_per_block: network.target_time_per_block(),
				timestamp_deviation_tolerance: 132,
				block_coinbase_maturity: 10,
				max_mass_per_block: 10_000_000,
				enable_non_native_subnetworks: false,
				finality_depth: 1_000,
				ghostdag_k: 10,
				difficulty_adjustment_window: 10_000,
				subsidy_halving_interval: 150_000_000,
			},
		}
	}

	/// Maximum allowed distance between a block timestamp and local time,
	/// in milliseconds.
	pub fn max_future_block_time(&self) -> u64 {
		self.timestamp_deviation_tolerance * self.target_time_per_block
	}
}

#[cfg(test)]
mod tests {
	use network::Network;
	use super::ConsensusParams;

	#[test]
	fn test_genesis_hash_matches_genesis_block() {
		let params = ConsensusParams::new(Network::Unitest);
		assert_eq!(params.genesis_hash, *params.genesis_block.hash());
	}

	#[test]
	fn test_unitest_pow_is_bypassed() {
		let params = ConsensusParams::new(Network::Unitest);
		assert!(params.skip_proof_of_work);
		assert!(!ConsensusParams::new(Network::Mainnet).skip_proof_of_work);
	}
}
