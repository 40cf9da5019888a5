use chain::{IndexedBlock, IndexedBlockHeader};
use hash::H256;

pub trait BlockHeaderProvider {
	/// Resolves the header of a stored block.
	fn block_header(&self, hash: &H256) -> Option<IndexedBlockHeader>;
}

pub trait BlockProvider: BlockHeaderProvider {
	fn block(&self, hash: &H256) -> Option<IndexedBlock>;

	fn contains_block(&self, hash: &H256) -> bool {
		self.block(hash).is_some()
	}
}
