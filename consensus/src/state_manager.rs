//! Resolution of a block's UTXO state: past UTXO computation, acceptance
//! data, UTXO verification and status assignment.

use chain::{IndexedBlock, OutPoint, Transaction};
use crypto::Multiset;
use hash::H256;
use network::ConsensusParams;
use script::SignatureCache;
use ser::Stream;
use storage::{
	AcceptanceData, BlockAcceptanceData, BlockStatus, Error, GhostdagData,
	TransactionAcceptanceData, UTXODiff, UTXOEntry, UTXOSet,
};
use db::dag_db::{self, DagDatabase, get_block, get_ghostdag_data, get_multiset, get_utxo_diff};
use db::kv::{KeyValue, KeyValueDatabase};
use verification::{
	block_subsidy, checked_transaction_fee, median_timestamp,
	BlockUtxoAcceptor, CanonBlock, PastMedianTimeProvider,
};
use reachability::ReachabilityIndex;

/// Merkle root over the ids of accepted transactions. Ids are sorted so
/// the root does not depend on the merge ordering.
pub fn accepted_id_merkle_root(acceptance_data: &AcceptanceData) -> H256 {
	let mut accepted_ids: Vec<H256> = acceptance_data.iter()
		.flat_map(|block_acceptance| block_acceptance.transactions.iter())
		.filter(|tx| tx.is_accepted)
		.map(|tx| tx.tx_id)
		.collect();
	accepted_ids.sort();
	::chain::merkle_root(&accepted_ids)
}

/// Everything a block-status resolution needs to see. `db` is the
/// staging overlay of the running submission; all writes are staged
/// there and commit or vanish with it.
pub struct StateContext<'a, T: KeyValueDatabase + 'a> {
	pub db: &'a T,
	pub params: &'a ConsensusParams,
	pub reachability: &'a ReachabilityIndex,
	/// UTXO of the current virtual's selected parent; anchor of every
	/// diff with no diff child.
	pub virtual_utxo: &'a UTXOSet,
	pub signature_cache: &'a SignatureCache,
	/// Blocks whose diff is anchored at the virtual. Updated while
	/// diffs are re-pointed; committed by the caller on success.
	pub virtual_diff_parents: &'a mut Vec<H256>,
}

/// Resolves the status of the given block, resolving every unverified
/// selected-parent ancestor on the way. Statuses are staged into the
/// context database.
pub fn resolve_block_status<T>(ctx: &mut StateContext<T>, block_hash: &H256) -> Result<BlockStatus, Error>
	where T: KeyValueDatabase {
	let unverified_blocks = unverified_chain_blocks(ctx, block_hash)?;

	// nothing unverified: the stored status is the answer
	if unverified_blocks.is_empty() {
		return dag_db::get_block_status(ctx.db, block_hash)
			.ok_or(Error::MissingRecord("blockStatuses", *block_hash));
	}

	let mut selected_parent_status = anchor_status(ctx, &unverified_blocks)?;

	let mut block_status = selected_parent_status;
	for unverified_hash in unverified_blocks.iter().rev() {
		if selected_parent_status == BlockStatus::DisqualifiedFromChain {
			block_status = BlockStatus::DisqualifiedFromChain;
		} else {
			block_status = resolve_single_block_status(ctx, unverified_hash)?;
		}

		dag_db::put(ctx.db, KeyValue::BlockStatus(*unverified_hash, block_status))?;
		selected_parent_status = block_status;
	}

	Ok(block_status)
}

/// Walks the selected-parent chain upwards collecting blocks that are
/// still awaiting UTXO verification, newest first.
fn unverified_chain_blocks<T>(ctx: &StateContext<T>, block_hash: &H256) -> Result<Vec<H256>, Error>
	where T: KeyValueDatabase {
	let mut unverified = vec![];
	let mut current = *block_hash;

	loop {
		let status = dag_db::get_block_status(ctx.db, &current)
			.ok_or(Error::MissingRecord("blockStatuses", current))?;
		if status != BlockStatus::UTXOPendingVerification {
			return Ok(unverified);
		}

		unverified.push(current);

		let data = get_ghostdag_data(ctx.db, &current)
			.ok_or(Error::MissingRecord("ghostdag", current))?;
		match data.selected_parent {
			Some(selected_parent) => current = selected_parent,
			// reached genesis
			None => return Ok(unverified),
		}
	}
}

/// Status of the selected parent of the oldest unverified block, the
/// anchor the resolution starts from.
fn anchor_status<T>(ctx: &StateContext<T>, unverified_blocks: &[H256]) -> Result<BlockStatus, Error>
	where T: KeyValueDatabase {
	let last_unverified = unverified_blocks.last().expect("caller checked non-empty");
	if *last_unverified == ctx.params.genesis_hash {
		return Ok(BlockStatus::Valid);
	}

	let data = get_ghostdag_data(ctx.db, last_unverified)
		.ok_or(Error::MissingRecord("ghostdag", *last_unverified))?;
	let selected_parent = data.selected_parent
		.ok_or(Error::InconsistentData("non-genesis block without selected parent"))?;
	dag_db::get_block_status(ctx.db, &selected_parent)
		.ok_or(Error::MissingRecord("blockStatuses", selected_parent))
}

fn resolve_single_block_status<T>(ctx: &mut StateContext<T>, block_hash: &H256) -> Result<BlockStatus, Error>
	where T: KeyValueDatabase {
	let data = get_ghostdag_data(ctx.db, block_hash)
		.ok_or(Error::MissingRecord("ghostdag", *block_hash))?;

	let (utxo, acceptance_data, multiset) =
		calculate_past_utxo_and_acceptance(ctx.db, ctx.params, ctx.virtual_utxo, &data)?;

	dag_db::put(ctx.db, KeyValue::AcceptanceData(*block_hash, acceptance_data.clone()))?;

	let block = get_block(ctx.db, block_hash)
		.ok_or(Error::MissingRecord("blocks", *block_hash))?;

	match verify_utxo(ctx, &block, &data, &utxo, &acceptance_data, &multiset) {
		Ok(()) => (),
		Err(::verification::Error::Database(db_error)) => return Err(db_error),
		Err(rule_error) => {
			debug!(target: "consensus", "block {} disqualified from chain: {:?}", block_hash, rule_error);
			return Ok(BlockStatus::DisqualifiedFromChain);
		},
	}

	dag_db::put(ctx.db, KeyValue::Multiset(*block_hash, multiset))?;
	dag_db::put(ctx.db, KeyValue::UtxoDiff(*block_hash, (ctx.virtual_utxo.diff_from(&utxo), None)))?;

	update_parent_diffs(ctx, block_hash, &utxo, &block.header.raw.parent_hashes)?;

	if !ctx.virtual_diff_parents.contains(block_hash) {
		ctx.virtual_diff_parents.push(*block_hash);
	}

	Ok(BlockStatus::Valid)
}

/// Walks the merge set in merge order, applying each block's accepted
/// transactions onto the selected-parent snapshot.
///
/// Returns the block's past UTXO (selected parent UTXO plus the
/// acceptance mutations), the acceptance data and the matching UTXO
/// multiset.
pub fn calculate_past_utxo_and_acceptance<T>(
	db: &T,
	params: &ConsensusParams,
	virtual_utxo: &UTXOSet,
	data: &GhostdagData,
) -> Result<(UTXOSet, AcceptanceData, Multiset), Error> where T: KeyValueDatabase {
	let (mut utxo, mut multiset) = match data.selected_parent {
		Some(ref selected_parent) => selected_parent_state(db, params, virtual_utxo, selected_parent)?,
		None => (UTXOSet::new(), Multiset::new()),
	};

	let mut acceptance_data = AcceptanceData::with_capacity(data.mergeset_blues.len() + data.mergeset_reds.len());

	for merged_hash in data.mergeset() {
		let merged_block = get_block(db, merged_hash)
			.ok_or(Error::MissingRecord("blocks", *merged_hash))?;

		let mut transactions = Vec::with_capacity(merged_block.transactions.len());
		for transaction in &merged_block.transactions {
			transactions.push(try_accept_transaction(
				&mut utxo,
				&mut multiset,
				&transaction.raw,
				transaction.id,
				data.blue_score,
				params,
			)?);
		}

		acceptance_data.push(BlockAcceptanceData {
			block_hash: *merged_hash,
			transactions: transactions,
		});
	}

	Ok((utxo, acceptance_data, multiset))
}

/// UTXO and multiset of the selected parent. Resolved parents answer
/// from their stored diff and multiset; a parent still awaiting
/// resolution (a side chain being walked for the first time) is
/// computed transiently from its own merge set.
fn selected_parent_state<T>(
	db: &T,
	params: &ConsensusParams,
	virtual_utxo: &UTXOSet,
	selected_parent: &H256,
) -> Result<(UTXOSet, Multiset), Error> where T: KeyValueDatabase {
	if let Some(multiset) = get_multiset(db, selected_parent) {
		let utxo = restore_utxo(db, virtual_utxo, selected_parent)?;
		return Ok((utxo, multiset));
	}

	let data = get_ghostdag_data(db, selected_parent)
		.ok_or(Error::MissingRecord("ghostdag", *selected_parent))?;
	let (utxo, _, multiset) = calculate_past_utxo_and_acceptance(db, params, virtual_utxo, &data)?;
	Ok((utxo, multiset))
}

/// Tries to apply one merged transaction to the working snapshot.
/// Transactions whose inputs are unavailable (spent by an earlier
/// accepted transaction, or double-spending within the merge set) are
/// recorded as rejected, not failed.
fn try_accept_transaction(
	utxo: &mut UTXOSet,
	multiset: &mut Multiset,
	transaction: &Transaction,
	tx_id: H256,
	accepting_blue_score: u64,
	params: &ConsensusParams,
) -> Result<TransactionAcceptanceData, Error> {
	let fee = match checked_transaction_fee(transaction, accepting_blue_score, utxo, params) {
		Ok(fee) => fee,
		Err(_) => {
			return Ok(TransactionAcceptanceData {
				transaction: transaction.clone(),
				tx_id: tx_id,
				fee: 0,
				is_accepted: false,
				input_entries: vec![],
			});
		},
	};

	let mut diff = UTXODiff::new();
	let mut input_entries = Vec::with_capacity(transaction.inputs.len());

	for input in &transaction.inputs {
		let entry = utxo.get(&input.previous_outpoint)
			.expect("checked_transaction_fee resolved every input")
			.clone();
		multiset.remove(&utxo_element(&input.previous_outpoint, &entry));
		diff.remove_entry(&input.previous_outpoint, &entry);
		input_entries.push(entry);
	}

	for (index, output) in transaction.outputs.iter().enumerate() {
		let outpoint = OutPoint::new(tx_id, index as u32);
		let entry = UTXOEntry {
			amount: output.value,
			script_pubkey: output.script_pubkey.clone(),
			block_blue_score: accepting_blue_score,
			is_coinbase: transaction.is_coinbase(),
		};
		multiset.add(&utxo_element(&outpoint, &entry));
		diff.add_entry(outpoint, entry);
	}

	utxo.apply(&diff)?;

	Ok(TransactionAcceptanceData {
		transaction: transaction.clone(),
		tx_id: tx_id,
		fee: fee,
		is_accepted: true,
		input_entries: input_entries,
	})
}

fn utxo_element(outpoint: &OutPoint, entry: &UTXOEntry) -> Vec<u8> {
	let mut stream = Stream::default();
	stream.append(outpoint).append(entry);
	stream.out().take()
}

/// Restores the full UTXO snapshot of a block by composing the diffs
/// along its diff-child chain down to the virtual anchor.
pub fn restore_utxo<T>(db: &T, virtual_utxo: &UTXOSet, block_hash: &H256) -> Result<UTXOSet, Error>
	where T: KeyValueDatabase {
	let mut diffs = vec![];
	let mut current = *block_hash;

	loop {
		let (diff, diff_child) = get_utxo_diff(db, &current)
			.ok_or(Error::MissingRecord("utxoDiffs", current))?;
		diffs.push(diff);

		match diff_child {
			Some(child) => current = child,
			None => break,
		}
	}

	let mut utxo = virtual_utxo.clone();
	for diff in diffs.iter().rev() {
		utxo.apply(diff)?;
	}
	Ok(utxo)
}

/// Re-checks the block under its true past UTXO: commitments, coinbase
/// value against subsidy plus accepted fees, and the full transaction
/// validation including script execution.
fn verify_utxo<T>(
	ctx: &StateContext<T>,
	block: &IndexedBlock,
	data: &GhostdagData,
	utxo: &UTXOSet,
	acceptance_data: &AcceptanceData,
	multiset: &Multiset,
) -> Result<(), ::verification::Error> where T: KeyValueDatabase {
	let accepted_id_merkle_root = self::accepted_id_merkle_root(acceptance_data);
	if accepted_id_merkle_root != block.header.raw.accepted_id_merkle_root {
		return Err(::verification::Error::BadAcceptedIDMerkleRoot {
			expected: block.header.raw.accepted_id_merkle_root,
			actual: accepted_id_merkle_root,
		});
	}

	let utxo_commitment = multiset.hash();
	if utxo_commitment != block.header.raw.utxo_commitment {
		return Err(::verification::Error::BadUTXOCommitment {
			expected: block.header.raw.utxo_commitment,
			actual: utxo_commitment,
		});
	}

	let mut max_coinbase_value = block_subsidy(data.blue_score, ctx.params);
	for accepted in acceptance_data.iter().flat_map(|block_acceptance| block_acceptance.transactions.iter()) {
		if accepted.is_accepted {
			max_coinbase_value = max_coinbase_value.checked_add(accepted.fee)
				.ok_or(::verification::Error::BadFees)?;
		}
	}

	let stores = DagDatabase::new(ctx.db);
	let median_time = match data.selected_parent {
		Some(ref selected_parent) => median_timestamp(selected_parent, &stores, &stores),
		None => block.header.raw.time,
	};

	let median_times = ChainMedianTimes {
		stores: &stores,
		chain_start: data.selected_parent,
	};

	BlockUtxoAcceptor::new(
		CanonBlock::new(block),
		utxo,
		data.blue_score,
		median_time,
		max_coinbase_value,
		ctx.params,
		&median_times,
		ctx.signature_cache,
	).check()
}

/// Re-points the diffs of parents that had no diff child yet at the
/// freshly resolved block, preserving the invariant that only virtual
/// diff parents anchor at the virtual.
fn update_parent_diffs<T>(
	ctx: &mut StateContext<T>,
	block_hash: &H256,
	block_utxo: &UTXOSet,
	parent_hashes: &[H256],
) -> Result<(), Error> where T: KeyValueDatabase {
	for parent_hash in parent_hashes {
		let (_, diff_child) = match get_utxo_diff(ctx.db, parent_hash) {
			Some(diff) => diff,
			// unresolved or disqualified parents have no diff to re-point
			None => continue,
		};
		if diff_child.is_some() {
			continue;
		}

		match dag_db::get_block_status(ctx.db, parent_hash) {
			Some(BlockStatus::Valid) => (),
			_ => continue,
		}

		let parent_utxo = restore_utxo(ctx.db, ctx.virtual_utxo, parent_hash)?;
		dag_db::put(ctx.db, KeyValue::UtxoDiff(*parent_hash, (block_utxo.diff_from(&parent_utxo), Some(*block_hash))))?;
		ctx.virtual_diff_parents.retain(|hash| hash != parent_hash);
	}

	Ok(())
}

/// Past median times along the selected-parent chain starting at the
/// resolving block's selected parent, used to anchor relative locks.
struct ChainMedianTimes<'a, T: KeyValueDatabase + 'a> {
	stores: &'a DagDatabase<&'a T>,
	chain_start: Option<H256>,
}

impl<'a, T: KeyValueDatabase + 'a> PastMedianTimeProvider for ChainMedianTimes<'a, T> {
	fn median_time_at_blue_score(&self, blue_score: u64) -> u64 {
		use storage::GhostdagStore;

		let mut current = match self.chain_start {
			Some(start) => start,
			None => return 0,
		};

		loop {
			let data = match self.stores.ghostdag_data(&current) {
				Some(data) => data,
				None => return 0,
			};

			if data.blue_score <= blue_score {
				return median_timestamp(&current, self.stores, self.stores);
			}

			match data.selected_parent {
				Some(selected_parent) => current = selected_parent,
				None => return median_timestamp(&current, self.stores, self.stores),
			}
		}
	}
}
