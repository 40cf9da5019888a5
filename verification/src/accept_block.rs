use hash::H256;
use network::ConsensusParams;
use storage::{BlockHeaderProvider, GhostdagStore};
use canon::CanonBlock;
use timestamp::median_timestamp;
use work::required_difficulty;
use error::Error;
use DagTopology;

/// Contextual checks against the block's resolved parents. The block's
/// past UTXO is not available yet at this point; everything that needs
/// it lives in `BlockUtxoAcceptor`.
pub struct BlockAcceptor<'a> {
	pub parents: BlockParentsRelation<'a>,
	pub difficulty: BlockDifficulty<'a>,
	pub median_time: BlockMedianTime<'a>,
}

impl<'a> BlockAcceptor<'a> {
	pub fn new(
		topology: &'a DagTopology,
		ghostdag: &'a GhostdagStore,
		headers: &'a BlockHeaderProvider,
		consensus: &'a ConsensusParams,
		block: CanonBlock<'a>,
		bluest_parent: H256,
		finality_point: Option<H256>,
	) -> Self {
		trace!(target: "verification", "Block contextual verification {}", block.hash());
		BlockAcceptor {
			parents: BlockParentsRelation::new(topology, block, finality_point),
			difficulty: BlockDifficulty::new(ghostdag, headers, consensus, block, bluest_parent),
			median_time: BlockMedianTime::new(ghostdag, headers, block, bluest_parent),
		}
	}

	pub fn check(&self) -> Result<(), Error> {
		self.parents.check()?;
		self.difficulty.check()?;
		self.median_time.check()?;
		Ok(())
	}
}

/// No parent may be an ancestor of another parent, and no parent may be
/// behind the finality point.
pub struct BlockParentsRelation<'a> {
	topology: &'a DagTopology,
	block: CanonBlock<'a>,
	finality_point: Option<H256>,
}

impl<'a> BlockParentsRelation<'a> {
	fn new(topology: &'a DagTopology, block: CanonBlock<'a>, finality_point: Option<H256>) -> Self {
		BlockParentsRelation {
			topology: topology,
			block: block,
			finality_point: finality_point,
		}
	}

	fn check(&self) -> Result<(), Error> {
		let parents = &self.block.header.raw.parent_hashes;

		if let Some(ref finality_point) = self.finality_point {
			for parent in parents {
				if !self.topology.is_dag_ancestor_of(finality_point, parent) {
					return Err(Error::Finality(*parent));
				}
			}
		}

		for parent_a in parents {
			for parent_b in parents {
				if parent_a == parent_b {
					continue;
				}

				if self.topology.is_dag_ancestor_of(parent_a, parent_b) {
					return Err(Error::InvalidParentsRelation(*parent_a, *parent_b));
				}
			}
		}

		Ok(())
	}
}

pub struct BlockDifficulty<'a> {
	ghostdag: &'a GhostdagStore,
	headers: &'a BlockHeaderProvider,
	consensus: &'a ConsensusParams,
	block: CanonBlock<'a>,
	bluest_parent: H256,
}

impl<'a> BlockDifficulty<'a> {
	fn new(
		ghostdag: &'a GhostdagStore,
		headers: &'a BlockHeaderProvider,
		consensus: &'a ConsensusParams,
		block: CanonBlock<'a>,
		bluest_parent: H256,
	) -> Self {
		BlockDifficulty {
			ghostdag: ghostdag,
			headers: headers,
			consensus: consensus,
			block: block,
			bluest_parent: bluest_parent,
		}
	}

	fn check(&self) -> Result<(), Error> {
		if self.block.header.raw.is_genesis() {
			return Ok(());
		}

		let expected = required_difficulty(&self.bluest_parent, self.ghostdag, self.headers, self.consensus);
		let actual = self.block.header.raw.bits;
		if expected == actual {
			Ok(())
		} else {
			Err(Error::UnexpectedDifficulty { expected: expected, actual: actual })
		}
	}
}

pub struct BlockMedianTime<'a> {
	ghostdag: &'a GhostdagStore,
	headers: &'a BlockHeaderProvider,
	block: CanonBlock<'a>,
	bluest_parent: H256,
}

impl<'a> BlockMedianTime<'a> {
	fn new(
		ghostdag: &'a GhostdagStore,
		headers: &'a BlockHeaderProvider,
		block: CanonBlock<'a>,
		bluest_parent: H256,
	) -> Self {
		BlockMedianTime {
			ghostdag: ghostdag,
			headers: headers,
			block: block,
			bluest_parent: bluest_parent,
		}
	}

	fn check(&self) -> Result<(), Error> {
		if self.block.header.raw.is_genesis() {
			return Ok(());
		}

		let median = median_timestamp(&self.bluest_parent, self.ghostdag, self.headers);
		let timestamp = self.block.header.raw.time;
		if timestamp < median {
			Err(Error::TimeTooOld { timestamp: timestamp, median: median })
		} else {
			Ok(())
		}
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;
	use hash::H256;
	use canon::CanonBlock;
	use chain::IndexedBlock;
	use network::{ConsensusParams, Network};
	use test_data;
	use error::Error;
	use DagTopology;
	use super::BlockParentsRelation;

	/// Topology fixture: explicit (ancestor, descendant) pairs.
	struct PairTopology(HashSet<(H256, H256)>);

	impl DagTopology for PairTopology {
		fn is_dag_ancestor_of(&self, ancestor: &H256, descendant: &H256) -> bool {
			ancestor == descendant || self.0.contains(&(*ancestor, *descendant))
		}
	}

	fn two_parent_block(consensus: &ConsensusParams, a: H256, b: H256) -> IndexedBlock {
		let mut parents = vec![a, b];
		parents.sort();
		test_data::block_builder()
			.with_parents(parents)
			.with_coinbase(100)
			.with_time(consensus.genesis_block.header.raw.time + 1_000)
			.merkled()
			.build()
			.into()
	}

	#[test]
	fn test_related_parents_are_rejected() {
		let consensus = ConsensusParams::new(Network::Unitest);
		let a = H256::from(1u8);
		let b = H256::from(2u8);
		let block = two_parent_block(&consensus, a, b);

		let mut pairs = HashSet::new();
		pairs.insert((a, b));
		let topology = PairTopology(pairs);

		assert_eq!(
			BlockParentsRelation::new(&topology, CanonBlock::new(&block), None).check(),
			Err(Error::InvalidParentsRelation(a, b)),
		);
	}

	#[test]
	fn test_unrelated_parents_pass() {
		let consensus = ConsensusParams::new(Network::Unitest);
		let block = two_parent_block(&consensus, 1u8.into(), 2u8.into());
		let topology = PairTopology(HashSet::new());

		assert_eq!(BlockParentsRelation::new(&topology, CanonBlock::new(&block), None).check(), Ok(()));
	}

	#[test]
	fn test_parent_behind_finality_point_is_rejected() {
		let consensus = ConsensusParams::new(Network::Unitest);
		let parent = H256::from(1u8);
		let finality_point = H256::from(9u8);
		let block = two_parent_block(&consensus, parent, 2u8.into());

		// the finality point only reaches the second parent
		let mut pairs = HashSet::new();
		pairs.insert((finality_point, H256::from(2u8)));
		let topology = PairTopology(pairs);

		assert_eq!(
			BlockParentsRelation::new(&topology, CanonBlock::new(&block), Some(finality_point)).check(),
			Err(Error::Finality(parent)),
		);
	}
}
