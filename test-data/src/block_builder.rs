use chain::{Block, BlockHeader, Transaction, merkle_root};
use chain::SUBNETWORK_ID_COINBASE;
use primitives::compact::Compact;
use primitives::hash::H256;
use ser::Stream;

pub fn block_builder() -> BlockBuilder {
	BlockBuilder::default()
}

/// Fluent block builder. Defaults target the unit-test network: maximal
/// bits and a timestamp in the unit-test genesis era.
pub struct BlockBuilder {
	version: u32,
	parents: Vec<H256>,
	time: u64,
	bits: Compact,
	nonce: u64,
	hash_merkle_root: H256,
	accepted_id_merkle_root: H256,
	utxo_commitment: H256,
	coinbase_value: Option<u64>,
	transactions: Vec<Transaction>,
	merkled: bool,
}

impl Default for BlockBuilder {
	fn default() -> Self {
		BlockBuilder {
			version: 1,
			parents: vec![],
			time: 1_000_000_000_000,
			bits: Compact::new(0x207fffff),
			nonce: 0,
			hash_merkle_root: H256::zero(),
			accepted_id_merkle_root: H256::zero(),
			utxo_commitment: H256::zero(),
			coinbase_value: None,
			transactions: vec![],
			merkled: false,
		}
	}
}

impl BlockBuilder {
	/// Parent hashes are used exactly as given; callers that want a
	/// valid block sort them first.
	pub fn with_parents(mut self, parents: Vec<H256>) -> Self {
		self.parents = parents;
		self
	}

	/// Prepends a coinbase of the given value at build time, with a
	/// payload derived from the block's parents, time and nonce so that
	/// sibling coinbases do not collide.
	pub fn with_coinbase(mut self, value: u64) -> Self {
		self.coinbase_value = Some(value);
		self
	}

	pub fn with_transaction(mut self, transaction: Transaction) -> Self {
		self.transactions.push(transaction);
		self
	}

	pub fn with_time(mut self, time: u64) -> Self {
		self.time = time;
		self
	}

	pub fn with_bits(mut self, bits: Compact) -> Self {
		self.bits = bits;
		self
	}

	pub fn with_nonce(mut self, nonce: u64) -> Self {
		self.nonce = nonce;
		self
	}

	pub fn with_commitments(mut self, accepted_id_merkle_root: H256, utxo_commitment: H256) -> Self {
		self.accepted_id_merkle_root = accepted_id_merkle_root;
		self.utxo_commitment = utxo_commitment;
		self
	}

	pub fn with_merkle_root(mut self, hash_merkle_root: H256) -> Self {
		self.hash_merkle_root = hash_merkle_root;
		self
	}

	/// Compute `hash_merkle_root` from the final transaction list at
	/// build time.
	pub fn merkled(mut self) -> Self {
		self.merkled = true;
		self
	}

	pub fn build(self) -> Block {
		let mut transactions = self.transactions;
		if let Some(value) = self.coinbase_value {
			let mut payload = Stream::default();
			payload.append_list(&self.parents);
			payload.append(&self.time).append(&self.nonce).append(&value);

			let coinbase = Transaction {
				version: 1,
				inputs: vec![],
				outputs: vec![::chain::TransactionOutput {
					value: value,
					script_pubkey: vec![0x51].into(),
				}],
				lock_time: 0,
				subnetwork_id: SUBNETWORK_ID_COINBASE,
				payload: payload.out(),
			};
			transactions.insert(0, coinbase);
		}

		let hash_merkle_root = if self.merkled {
			merkle_root(&transactions.iter().map(Transaction::hash).collect::<Vec<H256>>())
		} else {
			self.hash_merkle_root
		};

		Block {
			block_header: BlockHeader {
				version: self.version,
				parent_hashes: self.parents,
				hash_merkle_root: hash_merkle_root,
				accepted_id_merkle_root: self.accepted_id_merkle_root,
				utxo_commitment: self.utxo_commitment,
				time: self.time,
				bits: self.bits,
				nonce: self.nonce,
			},
			transactions: transactions,
		}
	}
}
