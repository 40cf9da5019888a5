//! The block DAG facade: accepts blocks under the DAG write lock,
//! resolves their state and answers the queries the RPC and P2P layers
//! consume.

use std::time::{Duration, SystemTime, UNIX_EPOCH};
use parking_lot::RwLock;
use chain::IndexedBlock;
use hash::H256;
use network::ConsensusParams;
use primitives::U256;
use script::SignatureCache;
use storage::{
	AcceptanceData, BlockStatus, Error as StorageError, GhostdagData,
	SelectedParentChainChanges, UTXODiff, UTXOSet,
};
use db::dag_db::{self, DagDatabase, get_acceptance_data, get_block, get_block_status, get_ghostdag_data};
use db::kv::{KeyValue, KeyValueDatabase, OverlayDatabase};
use verification::{block_work, BlockAcceptor, BlockVerifier, CanonBlock, Error as RuleError, HeaderVerifier};
use chain_tracker::ChainTracker;
use ghostdag::ghostdag;
use index_manager::IndexManager;
use reachability::{flush_reachability, ReachabilityIndex};
use state_manager::{self, StateContext};

/// Outcome of a successful `submit_block`.
#[derive(Debug, PartialEq)]
pub enum SubmitBlockResponse {
	Accepted,
	/// The block's timestamp is ahead of local time; resubmit after the
	/// given wait.
	Delayed(Duration),
}

#[derive(Debug)]
pub struct BlockInfo {
	pub hash: H256,
	pub status: BlockStatus,
	pub blue_score: u64,
	pub acceptance_data: Option<AcceptanceData>,
}

/// State guarded by the DAG lock. Everything here must stay consistent
/// with the committed database.
struct DagState {
	reachability: ReachabilityIndex,
	tips: Vec<H256>,
	selected_tip: H256,
	/// UTXO of the virtual's selected parent; the anchor of every diff
	/// without a diff child.
	virtual_utxo: UTXOSet,
	virtual_diff_parents: Vec<H256>,
	chain: ChainTracker,
}

pub struct BlockDag<T> where T: KeyValueDatabase {
	params: ConsensusParams,
	db: T,
	state: RwLock<DagState>,
	signature_cache: SignatureCache,
	index_managers: Vec<Box<IndexManager>>,
}

impl<T> BlockDag<T> where T: KeyValueDatabase {
	/// Creates the DAG with the genesis block resolved and committed.
	pub fn new(params: ConsensusParams, db: T, index_managers: Vec<Box<IndexManager>>) -> Result<Self, StorageError> {
		let genesis = params.genesis_block.clone();
		let genesis_hash = *genesis.hash();
		let signature_cache = SignatureCache::new();

		let mut reachability = ReachabilityIndex::new();
		let virtual_utxo = UTXOSet::new();
		let mut virtual_diff_parents = vec![];

		{
			let overlay = OverlayDatabase::new(&db);
			dag_db::put(&overlay, KeyValue::Block(genesis_hash, genesis.clone()))?;
			dag_db::put(&overlay, KeyValue::BlockStatus(genesis_hash, BlockStatus::UTXOPendingVerification))?;
			dag_db::put(&overlay, KeyValue::Ghostdag(genesis_hash, GhostdagData::genesis(block_work(genesis.header.raw.bits))))?;
			reachability.insert(genesis_hash, None, &[])?;

			let status = {
				let mut ctx = StateContext {
					db: &overlay,
					params: &params,
					reachability: &reachability,
					virtual_utxo: &virtual_utxo,
					signature_cache: &signature_cache,
					virtual_diff_parents: &mut virtual_diff_parents,
				};
				state_manager::resolve_block_status(&mut ctx, &genesis_hash)?
			};
			if status != BlockStatus::Valid {
				return Err(StorageError::InconsistentData("genesis failed UTXO verification"));
			}

			flush_reachability(&mut reachability, &overlay)?;
			overlay.flush().map_err(StorageError::DatabaseDriverError)?;
		}

		let mut chain = ChainTracker::new();
		chain.push(genesis_hash);

		let dag = BlockDag {
			params: params,
			db: db,
			state: RwLock::new(DagState {
				reachability: reachability,
				tips: vec![genesis_hash],
				selected_tip: genesis_hash,
				virtual_utxo: virtual_utxo,
				virtual_diff_parents: virtual_diff_parents,
				chain: chain,
			}),
			signature_cache: signature_cache,
			index_managers: index_managers,
		};

		{
			let stores = DagDatabase::new(&dag.db);
			let genesis_changes = SelectedParentChainChanges {
				removed: vec![],
				added: vec![genesis_hash],
			};
			for index_manager in &dag.index_managers {
				index_manager.init(&stores, &stores)?;
				index_manager.connect_block(&genesis_changes, &stores, &stores)?;
			}
		}

		Ok(dag)
	}

	pub fn params(&self) -> &ConsensusParams {
		&self.params
	}

	/// Read access to the committed consensus stores.
	pub fn stores(&self) -> DagDatabase<&T> {
		DagDatabase::new(&self.db)
	}

	/// Validates the block and, if it passes, inserts it into the DAG,
	/// resolving the virtual chain. Rule errors leave no trace of the
	/// block; infrastructure errors surface as `Error::Database`.
	pub fn submit_block(&self, block: IndexedBlock) -> Result<SubmitBlockResponse, RuleError> {
		self.submit_block_at(block, current_time_millis())
	}

	fn submit_block_at(&self, block: IndexedBlock, now: u64) -> Result<SubmitBlockResponse, RuleError> {
		let mut state = self.state.write();
		let hash = *block.hash();

		if get_block_status(&self.db, &hash).is_some() {
			return Err(RuleError::Duplicate);
		}

		// context-free checks
		let delay = HeaderVerifier::new(&block.header, &self.params, now).check()?;
		BlockVerifier::new(&block, &self.params).check()?;
		if let Some(delay) = delay {
			return Ok(SubmitBlockResponse::Delayed(delay));
		}

		// parents resolution
		let parent_hashes = block.header.raw.parent_hashes.clone();
		let missing: Vec<H256> = parent_hashes.iter()
			.filter(|parent| get_block_status(&self.db, parent).is_none())
			.cloned()
			.collect();
		if !missing.is_empty() {
			return Err(RuleError::ParentsUnknown(missing));
		}

		let data = ghostdag(&parent_hashes, block.header.raw.bits, &self.db, &state.reachability, self.params.ghostdag_k)?;
		let selected_parent = data.selected_parent.expect("non-genesis block has parents");

		// contextual checks against the resolved parents
		let finality_point = self.finality_point(&state)?;
		{
			let stores = DagDatabase::new(&self.db);
			BlockAcceptor::new(
				&state.reachability,
				&stores,
				&stores,
				&self.params,
				CanonBlock::new(&block),
				selected_parent,
				finality_point,
			).check()?;
		}

		// everything from here on stages into the overlay and commits
		// (or is discarded) as one unit
		let overlay = OverlayDatabase::new(&self.db);
		dag_db::put(&overlay, KeyValue::Block(hash, block.clone()))?;
		dag_db::put(&overlay, KeyValue::BlockStatus(hash, BlockStatus::UTXOPendingVerification))?;
		dag_db::put(&overlay, KeyValue::Ghostdag(hash, data.clone()))?;

		let mergeset: Vec<H256> = data.mergeset()
			.filter(|merged| **merged != selected_parent)
			.cloned()
			.collect();
		state.reachability.insert(hash, Some(&selected_parent), &mergeset)?;

		let mut tips: Vec<H256> = state.tips.iter()
			.filter(|tip| !parent_hashes.contains(tip))
			.cloned()
			.collect();
		tips.push(hash);

		// resolve virtual: heaviest tips first, the first valid one wins
		let mut candidates: Vec<(U256, H256)> = vec![];
		for tip in &tips {
			let tip_data = get_ghostdag_data(&overlay, tip)
				.ok_or(StorageError::MissingRecord("ghostdag", *tip))?;
			candidates.push((tip_data.blue_work, *tip));
		}
		candidates.sort();
		candidates.reverse();

		let old_selected = state.selected_tip;
		let mut new_selected = old_selected;
		let mut staged_diff_parents = state.virtual_diff_parents.clone();

		for &(_, candidate) in &candidates {
			let status = {
				let mut ctx = StateContext {
					db: &overlay,
					params: &self.params,
					reachability: &state.reachability,
					virtual_utxo: &state.virtual_utxo,
					signature_cache: &self.signature_cache,
					virtual_diff_parents: &mut staged_diff_parents,
				};
				state_manager::resolve_block_status(&mut ctx, &candidate)?
			};

			if status == BlockStatus::Valid {
				new_selected = candidate;
				break;
			}
		}

		// moving the virtual re-anchors every virtual diff parent at the
		// new virtual UTXO
		let new_virtual_utxo = if new_selected != old_selected {
			let new_utxo = state_manager::restore_utxo(&overlay, &state.virtual_utxo, &new_selected)?;

			for diff_parent in staged_diff_parents.iter().filter(|parent| **parent != new_selected) {
				let parent_utxo = state_manager::restore_utxo(&overlay, &state.virtual_utxo, diff_parent)?;
				dag_db::put(&overlay, KeyValue::UtxoDiff(*diff_parent, (new_utxo.diff_from(&parent_utxo), None)))?;
			}
			dag_db::put(&overlay, KeyValue::UtxoDiff(new_selected, (UTXODiff::new(), None)))?;

			Some(new_utxo)
		} else {
			None
		};

		flush_reachability(&mut state.reachability, &overlay)?;
		overlay.flush().map_err(StorageError::DatabaseDriverError)?;

		// the overlay is committed: reflect the change in memory
		state.tips = tips;
		state.virtual_diff_parents = staged_diff_parents;

		let chain_changes = match new_virtual_utxo {
			Some(new_utxo) => {
				let stores = DagDatabase::new(&self.db);
				let changes = state.chain.reorg_to(new_selected, &stores)?;
				state.selected_tip = new_selected;
				state.virtual_utxo = new_utxo;
				changes
			},
			None => SelectedParentChainChanges::default(),
		};

		if !chain_changes.is_empty() {
			let stores = DagDatabase::new(&self.db);
			for index_manager in &self.index_managers {
				index_manager.connect_block(&chain_changes, &stores, &stores)?;
			}
		}

		Ok(SubmitBlockResponse::Accepted)
	}

	pub fn get_block(&self, hash: &H256) -> Option<IndexedBlock> {
		let _state = self.state.read();
		get_block(&self.db, hash)
	}

	pub fn block_status(&self, hash: &H256) -> Option<BlockStatus> {
		let _state = self.state.read();
		get_block_status(&self.db, hash)
	}

	pub fn get_block_info(&self, hash: &H256, include_acceptance_data: bool) -> Option<BlockInfo> {
		let _state = self.state.read();
		let status = get_block_status(&self.db, hash)?;
		let data = get_ghostdag_data(&self.db, hash)?;

		Some(BlockInfo {
			hash: *hash,
			status: status,
			blue_score: data.blue_score,
			acceptance_data: if include_acceptance_data {
				get_acceptance_data(&self.db, hash)
			} else {
				None
			},
		})
	}

	pub fn get_block_acceptance_data(&self, hash: &H256) -> Option<AcceptanceData> {
		let _state = self.state.read();
		get_acceptance_data(&self.db, hash)
	}

	/// The chain delta from `start_hash` (genesis when omitted) to the
	/// current virtual selected parent. Callers are responsible for
	/// truncating oversized responses.
	pub fn get_selected_parent_chain(&self, start_hash: Option<&H256>) -> Result<SelectedParentChainChanges, StorageError> {
		let state = self.state.read();

		match start_hash {
			None => Ok(state.chain.changes_from_genesis()),
			Some(start) => {
				if get_block_status(&self.db, start).is_none() {
					return Err(StorageError::MissingRecord("blocks", *start));
				}
				let stores = DagDatabase::new(&self.db);
				state.chain.changes_since(start, &stores)
			},
		}
	}

	pub fn selected_tip(&self) -> H256 {
		self.state.read().selected_tip
	}

	pub fn tips(&self) -> Vec<H256> {
		self.state.read().tips.clone()
	}

	pub fn virtual_blue_score(&self) -> Result<u64, StorageError> {
		let state = self.state.read();
		let data = get_ghostdag_data(&self.db, &state.selected_tip)
			.ok_or(StorageError::MissingRecord("ghostdag", state.selected_tip))?;
		Ok(data.blue_score + 1)
	}

	/// Header commitments of a block template on top of the given
	/// parents: the accepted-id merkle root and the UTXO commitment the
	/// header must carry to pass UTXO verification.
	pub fn header_commitments(&self, parent_hashes: &[H256]) -> Result<(H256, H256), StorageError> {
		let state = self.state.read();
		let data = ghostdag(parent_hashes, self.params.pow_max, &self.db, &state.reachability, self.params.ghostdag_k)?;
		let (_, acceptance_data, multiset) =
			state_manager::calculate_past_utxo_and_acceptance(&self.db, &self.params, &state.virtual_utxo, &data)?;
		Ok((state_manager::accepted_id_merkle_root(&acceptance_data), multiset.hash()))
	}

	/// The selected-chain block `finality_depth` blue score below the
	/// virtual's selected parent; blocks not in its future may no longer
	/// join the DAG.
	fn finality_point(&self, state: &DagState) -> Result<Option<H256>, StorageError> {
		let tip_data = get_ghostdag_data(&self.db, &state.selected_tip)
			.ok_or(StorageError::MissingRecord("ghostdag", state.selected_tip))?;
		if tip_data.blue_score < self.params.finality_depth {
			return Ok(None);
		}

		let target = tip_data.blue_score - self.params.finality_depth;
		let mut current = state.selected_tip;
		loop {
			let data = get_ghostdag_data(&self.db, &current)
				.ok_or(StorageError::MissingRecord("ghostdag", current))?;
			if data.blue_score <= target {
				return Ok(Some(current));
			}
			match data.selected_parent {
				Some(selected_parent) => current = selected_parent,
				None => return Ok(Some(current)),
			}
		}
	}
}

fn current_time_millis() -> u64 {
	let since_epoch = SystemTime::now().duration_since(UNIX_EPOCH)
		.expect("system clock is past the unix epoch");
	since_epoch.as_secs() * 1_000 + (since_epoch.subsec_millis() as u64)
}

#[cfg(test)]
mod tests {
	use chain::{Block, IndexedBlock, OutPoint};
	use chain::constants::SOMPI_PER_COIN;
	use hash::H256;
	use network::{ConsensusParams, Network};
	use storage::BlockStatus;
	use db::kv::MemoryDatabase;
	use test_data::{self, ChainBuilder};
	use verification::Error as RuleError;
	use super::{BlockDag, SubmitBlockResponse, current_time_millis};

	const SUBSIDY: u64 = 50 * SOMPI_PER_COIN;

	fn new_dag() -> BlockDag<MemoryDatabase> {
		let params = ConsensusParams::new(Network::Unitest);
		BlockDag::new(params, MemoryDatabase::default(), vec![]).unwrap()
	}

	fn commitments_of<'a>(dag: &'a BlockDag<MemoryDatabase>) -> impl Fn(&[H256]) -> (H256, H256) + 'a {
		move |parents| dag.header_commitments(parents).unwrap()
	}

	fn genesis_time(dag: &BlockDag<MemoryDatabase>) -> u64 {
		dag.params().genesis_block.header.raw.time
	}

	fn extend_chain(
		dag: &BlockDag<MemoryDatabase>,
		chain: &ChainBuilder,
		from: H256,
		from_time: u64,
		length: usize,
	) -> Vec<H256> {
		chain.extend(from, from_time, length, |block| {
			assert_eq!(dag.submit_block(block.into()), Ok(SubmitBlockResponse::Accepted));
		}).iter().map(Block::hash).collect()
	}

	#[test]
	fn test_genesis_only() {
		let dag = new_dag();
		let genesis_hash = dag.params().genesis_hash;

		assert_eq!(dag.block_status(&genesis_hash), Some(BlockStatus::Valid));
		assert_eq!(dag.selected_tip(), genesis_hash);

		let changes = dag.get_selected_parent_chain(None).unwrap();
		assert!(changes.removed.is_empty());
		assert_eq!(changes.added, vec![genesis_hash]);
	}

	#[test]
	fn test_linear_extension() {
		let dag = new_dag();
		let genesis_hash = dag.params().genesis_hash;
		let commitments = commitments_of(&dag);
		let builder = ChainBuilder::new(&commitments);
		let chain = extend_chain(&dag, &builder, genesis_hash, genesis_time(&dag), 2);

		let info = dag.get_block_info(&chain[1], false).unwrap();
		assert_eq!(info.status, BlockStatus::Valid);
		assert_eq!(info.blue_score, 2);

		let changes = dag.get_selected_parent_chain(Some(&genesis_hash)).unwrap();
		assert!(changes.removed.is_empty());
		assert_eq!(changes.added, chain);
	}

	#[test]
	fn test_double_spend_in_same_block_is_rejected_and_not_stored() {
		let dag = new_dag();
		let genesis_hash = dag.params().genesis_hash;
		let commitments = commitments_of(&dag);
		let builder = ChainBuilder::new(&commitments);
		let outpoint = OutPoint::new(7u8.into(), 0);

		let spend_once = test_data::transaction_builder()
			.with_input(outpoint.clone())
			.with_output(1)
			.build();
		let spend_twice = test_data::transaction_builder()
			.with_input(outpoint.clone())
			.with_output(2)
			.build();

		let block: IndexedBlock = builder
			.block_at(vec![genesis_hash], vec![spend_once, spend_twice], genesis_time(&dag) + 1_000)
			.into();
		let hash = *block.hash();

		assert_eq!(dag.submit_block(block), Err(RuleError::DoubleSpendInSameBlock(outpoint)));
		assert!(dag.get_block(&hash).is_none());
		assert_eq!(dag.block_status(&hash), None);
	}

	#[test]
	fn test_unsorted_parents_are_rejected() {
		let dag = new_dag();
		let genesis_hash = dag.params().genesis_hash;
		let commitments = commitments_of(&dag);
		let builder = ChainBuilder::new(&commitments);
		let time = genesis_time(&dag) + 1_000;

		let first: IndexedBlock = builder.block_at(vec![genesis_hash], vec![], time).into();
		let second: IndexedBlock = builder.block_at(vec![genesis_hash], vec![], time + 1).into();
		assert_eq!(dag.submit_block(first.clone()), Ok(SubmitBlockResponse::Accepted));
		assert_eq!(dag.submit_block(second.clone()), Ok(SubmitBlockResponse::Accepted));

		let mut sorted = vec![*first.hash(), *second.hash()];
		sorted.sort();
		let (accepted_id_merkle_root, utxo_commitment) = commitments(&sorted);

		// the chain builder never emits unsorted parents, so the bad
		// block is assembled by hand
		let unsorted = vec![sorted[1], sorted[0]];
		let bad_block: IndexedBlock = test_data::block_builder()
			.with_parents(unsorted)
			.with_coinbase(SUBSIDY)
			.with_time(time + 1_000)
			.with_commitments(accepted_id_merkle_root, utxo_commitment)
			.merkled()
			.build()
			.into();
		assert_eq!(dag.submit_block(bad_block), Err(RuleError::WrongParentsOrder));

		let good_block: IndexedBlock = builder.block_at(sorted, vec![], time + 1_000).into();
		assert_eq!(dag.submit_block(good_block), Ok(SubmitBlockResponse::Accepted));
	}

	#[test]
	fn test_immature_coinbase_spend_disqualifies_until_matured() {
		let dag = new_dag();
		let genesis_hash = dag.params().genesis_hash;
		let maturity = dag.params().block_coinbase_maturity;
		let start_time = genesis_time(&dag);
		let commitments = commitments_of(&dag);
		let builder = ChainBuilder::new(&commitments);

		// the first block's coinbase is accepted by its child at blue
		// score 2; a chain of maturity blocks puts the tip one short of
		// the earliest legal spend
		let chain = extend_chain(&dag, &builder, genesis_hash, start_time, maturity as usize);
		let tip = chain[maturity as usize - 1];
		let first_coinbase_id = dag.get_block(&chain[0]).unwrap().transactions[0].id;

		let spend = test_data::transaction_builder()
			.with_input(OutPoint::new(first_coinbase_id, 0))
			.with_output(SUBSIDY)
			.build();

		// the spender extends the tip so it is resolved immediately;
		// one blue score short of maturity it is disqualified
		let early_block: IndexedBlock = builder.block_at(vec![tip], vec![spend.clone()],
			start_time + 1_000 * (maturity + 1)).into();
		let early_hash = *early_block.hash();
		assert_eq!(dag.submit_block(early_block), Ok(SubmitBlockResponse::Accepted));
		assert_eq!(dag.block_status(&early_hash), Some(BlockStatus::DisqualifiedFromChain));
		// the disqualified tip did not move the chain
		assert_eq!(dag.selected_tip(), tip);

		// grow the valid chain past the disqualified sibling
		let filler_block: IndexedBlock = builder.block_at(vec![tip], vec![],
			start_time + 1_000 * (maturity + 2)).into();
		let filler_hash = *filler_block.hash();
		assert_eq!(dag.submit_block(filler_block), Ok(SubmitBlockResponse::Accepted));
		assert_eq!(dag.selected_tip(), filler_hash);

		// exactly at maturity the same spend is fine
		let mature_block: IndexedBlock = builder.block_at(vec![filler_hash], vec![spend],
			start_time + 1_000 * (maturity + 3)).into();
		let mature_hash = *mature_block.hash();
		assert_eq!(dag.submit_block(mature_block), Ok(SubmitBlockResponse::Accepted));
		assert_eq!(dag.block_status(&mature_hash), Some(BlockStatus::Valid));
		assert_eq!(dag.selected_tip(), mature_hash);
	}

	#[test]
	fn test_reorg_emits_removed_and_added() {
		let dag = new_dag();
		let genesis_hash = dag.params().genesis_hash;
		let start_time = genesis_time(&dag);
		let commitments = commitments_of(&dag);
		let builder = ChainBuilder::new(&commitments);

		// short chain, then a longer side chain overtaking it
		let short = extend_chain(&dag, &builder, genesis_hash, start_time, 2);
		let long = extend_chain(&dag, &builder, genesis_hash, start_time + 10_000, 3);

		assert_eq!(dag.selected_tip(), long[2]);

		// a caller that followed the short tip sees it unwound top-down
		// and the new chain applied bottom-up
		let changes = dag.get_selected_parent_chain(Some(&short[1])).unwrap();
		assert_eq!(changes.removed, vec![short[1], short[0]]);
		assert_eq!(changes.added, long.clone());

		let from_genesis = dag.get_selected_parent_chain(Some(&genesis_hash)).unwrap();
		assert_eq!(from_genesis.added, long);
	}

	#[test]
	fn test_futuristic_block_is_delayed() {
		let dag = new_dag();
		let genesis_hash = dag.params().genesis_hash;
		let commitments = commitments_of(&dag);
		let builder = ChainBuilder::new(&commitments);

		let far_future = current_time_millis() + 10 * dag.params().max_future_block_time();
		let block: IndexedBlock = builder.block_at(vec![genesis_hash], vec![], far_future).into();
		let hash = *block.hash();

		match dag.submit_block(block).unwrap() {
			SubmitBlockResponse::Delayed(delay) => assert!(delay.as_secs() > 0),
			other => panic!("expected a delayed response, got {:?}", other),
		}
		// delayed blocks are not inserted
		assert_eq!(dag.block_status(&hash), None);
	}

	#[test]
	fn test_block_with_unknown_parent_is_rejected() {
		let dag = new_dag();
		let unknown = H256::from(0x42u8);

		let block: IndexedBlock = test_data::block_builder()
			.with_parents(vec![unknown])
			.with_coinbase(SUBSIDY)
			.with_time(genesis_time(&dag) + 1_000)
			.merkled()
			.build()
			.into();

		assert_eq!(dag.submit_block(block), Err(RuleError::ParentsUnknown(vec![unknown])));
	}
}
