use std::collections::{HashMap, HashSet};
use chain::IndexedBlock;
use chain::constants::COINBASE_TRANSACTION_INDEX;
use network::ConsensusParams;
use verify_transaction::TransactionVerifier;
use error::Error;

/// Context-free block body checks, run after the header passed sanity.
pub struct BlockVerifier<'a> {
	pub empty: BlockEmpty<'a>,
	pub transactions_count: BlockTransactionsCount<'a>,
	pub coinbase: BlockCoinbase<'a>,
	pub transaction_order: BlockTransactionOrder<'a>,
	pub subnetworks: BlockSubnetworks<'a>,
	pub transactions_sanity: BlockTransactionsSanity<'a>,
	pub merkle_root: BlockMerkleRoot<'a>,
	pub duplicate_transactions: BlockDuplicateTransactions<'a>,
	pub double_spends: BlockDoubleSpends<'a>,
}

impl<'a> BlockVerifier<'a> {
	pub fn new(block: &'a IndexedBlock, consensus: &'a ConsensusParams) -> Self {
		trace!(target: "verification", "Block sanity {}", block.hash());
		BlockVerifier {
			empty: BlockEmpty::new(block),
			transactions_count: BlockTransactionsCount::new(block, consensus),
			coinbase: BlockCoinbase::new(block),
			transaction_order: BlockTransactionOrder::new(block),
			subnetworks: BlockSubnetworks::new(block, consensus),
			transactions_sanity: BlockTransactionsSanity::new(block),
			merkle_root: BlockMerkleRoot::new(block),
			duplicate_transactions: BlockDuplicateTransactions::new(block),
			double_spends: BlockDoubleSpends::new(block),
		}
	}

	pub fn check(&self) -> Result<(), Error> {
		self.empty.check()?;
		self.transactions_count.check()?;
		self.coinbase.check()?;
		self.transaction_order.check()?;
		self.subnetworks.check()?;
		self.transactions_sanity.check()?;
		self.merkle_root.check()?;
		self.duplicate_transactions.check()?;
		self.double_spends.check()?;
		Ok(())
	}
}

pub struct BlockEmpty<'a> {
	block: &'a IndexedBlock,
}

impl<'a> BlockEmpty<'a> {
	fn new(block: &'a IndexedBlock) -> Self {
		BlockEmpty { block: block }
	}

	fn check(&self) -> Result<(), Error> {
		if self.block.transactions.is_empty() {
			Err(Error::NoTransactions)
		} else {
			Ok(())
		}
	}
}

/// A block with more transactions than its mass allows is over the limit
/// before a single byte is weighed.
pub struct BlockTransactionsCount<'a> {
	block: &'a IndexedBlock,
	max_mass: u64,
}

impl<'a> BlockTransactionsCount<'a> {
	fn new(block: &'a IndexedBlock, consensus: &ConsensusParams) -> Self {
		BlockTransactionsCount {
			block: block,
			max_mass: consensus.max_mass_per_block,
		}
	}

	fn check(&self) -> Result<(), Error> {
		let count = self.block.transactions.len() as u64;
		if count > self.max_mass {
			Err(Error::BlockMassTooHigh { mass: count, max: self.max_mass })
		} else {
			Ok(())
		}
	}
}

pub struct BlockCoinbase<'a> {
	block: &'a IndexedBlock,
}

impl<'a> BlockCoinbase<'a> {
	fn new(block: &'a IndexedBlock) -> Self {
		BlockCoinbase { block: block }
	}

	fn check(&self) -> Result<(), Error> {
		if !self.block.transactions[COINBASE_TRANSACTION_INDEX].raw.is_coinbase() {
			return Err(Error::FirstTxNotCoinbase);
		}

		for (index, transaction) in self.block.transactions.iter().enumerate().skip(COINBASE_TRANSACTION_INDEX + 1) {
			if transaction.raw.is_coinbase() {
				return Err(Error::MultipleCoinbases(index));
			}
		}

		Ok(())
	}
}

/// Transactions after the coinbase are sorted non-descending by
/// subnetwork; equal ids keep their order.
pub struct BlockTransactionOrder<'a> {
	block: &'a IndexedBlock,
}

impl<'a> BlockTransactionOrder<'a> {
	fn new(block: &'a IndexedBlock) -> Self {
		BlockTransactionOrder { block: block }
	}

	fn check(&self) -> Result<(), Error> {
		let sorted = self.block.transactions[COINBASE_TRANSACTION_INDEX + 1..]
			.windows(2)
			.all(|pair| pair[0].raw.subnetwork_id <= pair[1].raw.subnetwork_id);
		if sorted {
			Ok(())
		} else {
			Err(Error::TransactionsNotSorted)
		}
	}
}

pub struct BlockSubnetworks<'a> {
	block: &'a IndexedBlock,
	enable_non_native: bool,
}

impl<'a> BlockSubnetworks<'a> {
	fn new(block: &'a IndexedBlock, consensus: &ConsensusParams) -> Self {
		BlockSubnetworks {
			block: block,
			enable_non_native: consensus.enable_non_native_subnetworks,
		}
	}

	fn check(&self) -> Result<(), Error> {
		if self.enable_non_native {
			return Ok(());
		}

		for transaction in &self.block.transactions {
			if !transaction.raw.subnetwork_id.is_builtin() {
				return Err(Error::InvalidSubnetwork);
			}
		}

		Ok(())
	}
}

pub struct BlockTransactionsSanity<'a> {
	block: &'a IndexedBlock,
}

impl<'a> BlockTransactionsSanity<'a> {
	fn new(block: &'a IndexedBlock) -> Self {
		BlockTransactionsSanity { block: block }
	}

	fn check(&self) -> Result<(), Error> {
		for (index, transaction) in self.block.transactions.iter().enumerate() {
			TransactionVerifier::new(transaction).check()
				.map_err(|err| Error::Transaction(index, err))?;
		}
		Ok(())
	}
}

pub struct BlockMerkleRoot<'a> {
	block: &'a IndexedBlock,
}

impl<'a> BlockMerkleRoot<'a> {
	fn new(block: &'a IndexedBlock) -> Self {
		BlockMerkleRoot { block: block }
	}

	fn check(&self) -> Result<(), Error> {
		let merkle_root = self.block.merkle_root();
		if merkle_root == self.block.header.raw.hash_merkle_root {
			Ok(())
		} else {
			Err(Error::BadMerkleRoot {
				expected: self.block.header.raw.hash_merkle_root,
				actual: merkle_root,
			})
		}
	}
}

pub struct BlockDuplicateTransactions<'a> {
	block: &'a IndexedBlock,
}

impl<'a> BlockDuplicateTransactions<'a> {
	fn new(block: &'a IndexedBlock) -> Self {
		BlockDuplicateTransactions { block: block }
	}

	fn check(&self) -> Result<(), Error> {
		let mut ids = HashSet::with_capacity(self.block.transactions.len());
		for transaction in &self.block.transactions {
			if !ids.insert(transaction.id) {
				return Err(Error::DuplicateTx(transaction.id));
			}
		}
		Ok(())
	}
}

pub struct BlockDoubleSpends<'a> {
	block: &'a IndexedBlock,
}

impl<'a> BlockDoubleSpends<'a> {
	fn new(block: &'a IndexedBlock) -> Self {
		BlockDoubleSpends { block: block }
	}

	fn check(&self) -> Result<(), Error> {
		let mut spent = HashMap::new();
		for transaction in &self.block.transactions {
			for input in &transaction.raw.inputs {
				if spent.insert(input.previous_outpoint.clone(), transaction.id).is_some() {
					return Err(Error::DoubleSpendInSameBlock(input.previous_outpoint.clone()));
				}
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use chain::{IndexedBlock, OutPoint};
	use network::{ConsensusParams, Network};
	use test_data;
	use error::Error;
	use super::BlockVerifier;

	fn consensus() -> ConsensusParams {
		ConsensusParams::new(Network::Unitest)
	}

	#[test]
	fn test_genesis_passes_sanity() {
		let consensus = consensus();
		let genesis = consensus.genesis_block.clone();
		assert_eq!(BlockVerifier::new(&genesis, &consensus).check(), Ok(()));
	}

	#[test]
	fn test_block_without_coinbase_fails() {
		let consensus = consensus();
		let block: IndexedBlock = test_data::block_builder()
			.with_parents(vec![consensus.genesis_hash])
			.with_transaction(test_data::transaction_builder()
				.with_input(OutPoint::new(1u8.into(), 0))
				.with_output(10)
				.build())
			.merkled()
			.build()
			.into();
		assert_eq!(BlockVerifier::new(&block, &consensus).check(), Err(Error::FirstTxNotCoinbase));
	}

	#[test]
	fn test_two_coinbases_fail() {
		let consensus = consensus();
		let block: IndexedBlock = test_data::block_builder()
			.with_parents(vec![consensus.genesis_hash])
			.with_coinbase(100)
			.with_transaction(test_data::transaction_builder().coinbase().with_payload(b"second").build())
			.merkled()
			.build()
			.into();
		assert_eq!(BlockVerifier::new(&block, &consensus).check(), Err(Error::MultipleCoinbases(1)));
	}

	#[test]
	fn test_bad_merkle_root_fails() {
		let consensus = consensus();
		let mut block = test_data::block_builder()
			.with_parents(vec![consensus.genesis_hash])
			.with_coinbase(100)
			.merkled()
			.build();
		block.block_header.hash_merkle_root = 42u8.into();
		let block: IndexedBlock = block.into();
		assert_matches!(BlockVerifier::new(&block, &consensus).check(), Err(Error::BadMerkleRoot { .. }));
	}

	#[test]
	fn test_in_block_double_spend_fails() {
		let consensus = consensus();
		let outpoint = OutPoint::new(7u8.into(), 0);
		let block: IndexedBlock = test_data::block_builder()
			.with_parents(vec![consensus.genesis_hash])
			.with_coinbase(100)
			.with_transaction(test_data::transaction_builder().with_input(outpoint.clone()).with_output(1).build())
			.with_transaction(test_data::transaction_builder()
				.with_input(outpoint.clone())
				.with_output(2)
				.build())
			.merkled()
			.build()
			.into();
		assert_eq!(
			BlockVerifier::new(&block, &consensus).check(),
			Err(Error::DoubleSpendInSameBlock(outpoint)),
		);
	}
}
