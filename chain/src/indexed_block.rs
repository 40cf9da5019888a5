use std::cmp;
use hash::H256;
use ser::{Serializable, serialized_list_size};
use block::Block;
use transaction::Transaction;
use merkle_root::merkle_root;
use indexed_header::IndexedBlockHeader;
use indexed_transaction::IndexedTransaction;

#[derive(Debug, Clone)]
pub struct IndexedBlock {
	pub header: IndexedBlockHeader,
	pub transactions: Vec<IndexedTransaction>,
}

impl From<Block> for IndexedBlock {
	fn from(block: Block) -> Self {
		Self::from_raw(block)
	}
}

impl cmp::PartialEq for IndexedBlock {
	fn eq(&self, other: &Self) -> bool {
		self.header.hash == other.header.hash
	}
}

impl IndexedBlock {
	pub fn new(header: IndexedBlockHeader, transactions: Vec<IndexedTransaction>) -> Self {
		IndexedBlock {
			header: header,
			transactions: transactions,
		}
	}

	/// Explicit conversion of the raw Block into IndexedBlock.
	///
	/// Hashes block header + transactions.
	pub fn from_raw(block: Block) -> Self {
		let Block { block_header, transactions } = block;
		Self::new(
			IndexedBlockHeader::from_raw(block_header),
			transactions.into_iter().map(IndexedTransaction::from_raw).collect(),
		)
	}

	pub fn hash(&self) -> &H256 {
		&self.header.hash
	}

	pub fn to_raw_block(self) -> Block {
		Block::new(self.header.raw, self.transactions.into_iter().map(|tx| tx.raw).collect())
	}

	pub fn size(&self) -> usize {
		let header_size = self.header.raw.serialized_size();
		let transactions = self.transactions.iter().map(|tx| &tx.raw).collect::<Vec<_>>();
		let txs_size = serialized_list_size::<Transaction, &Transaction>(&transactions);
		header_size + txs_size
	}

	pub fn merkle_root(&self) -> H256 {
		merkle_root(&self.transactions.iter().map(|tx| tx.hash).collect::<Vec<H256>>())
	}

	pub fn is_genesis(&self) -> bool {
		self.header.raw.is_genesis()
	}
}

#[cfg(test)]
mod tests {
	use block::Block;
	use block_header::BlockHeader;
	use transaction::Transaction;
	use super::IndexedBlock;

	#[test]
	fn test_indexed_block_caches_hashes() {
		let transaction = Transaction::default();
		let block = Block::new(
			BlockHeader {
				version: 1,
				parent_hashes: vec![],
				hash_merkle_root: Default::default(),
				accepted_id_merkle_root: Default::default(),
				utxo_commitment: Default::default(),
				time: 0,
				bits: 0.into(),
				nonce: 0,
			},
			vec![transaction.clone()],
		);

		let indexed = IndexedBlock::from_raw(block.clone());
		assert_eq!(*indexed.hash(), block.hash());
		assert_eq!(indexed.transactions[0].hash, transaction.hash());
		assert_eq!(indexed.transactions[0].id, transaction.id());
		assert_eq!(indexed.merkle_root(), block.merkle_root());
	}
}
