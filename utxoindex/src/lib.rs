//! Script-public-key to outpoint index, fed by selected parent chain
//! deltas.

#[macro_use]
extern crate log;
extern crate parking_lot;

extern crate primitives;
extern crate chain;
extern crate storage;
extern crate consensus;

#[cfg(test)]
extern crate db;
#[cfg(test)]
extern crate network;
#[cfg(test)]
extern crate test_data;

use std::collections::HashMap;
use std::sync::Arc;
use parking_lot::RwLock;
use chain::OutPoint;
use primitives::bytes::Bytes;
use primitives::hash::H256;
use storage::{
	AcceptanceDataStore, Error, GhostdagStore, SelectedParentChainChanges,
	TransactionAcceptanceData, UTXOEntry,
};
use consensus::IndexManager;

/// Live UTXO entries grouped by the script public key that locks them.
pub type UtxoByScript = HashMap<Bytes, HashMap<OutPoint, UTXOEntry>>;

/// Changes of one `update` call, staged until the single commit at the
/// end. An error anywhere before the commit simply drops the staging.
#[derive(Default)]
struct StagedChanges {
	to_add: Vec<(Bytes, OutPoint, UTXOEntry)>,
	to_remove: Vec<(Bytes, OutPoint)>,
}

impl StagedChanges {
	fn add(&mut self, script_pubkey: Bytes, outpoint: OutPoint, entry: UTXOEntry) {
		self.to_add.push((script_pubkey, outpoint, entry));
	}

	fn remove(&mut self, script_pubkey: Bytes, outpoint: OutPoint) {
		self.to_remove.push((script_pubkey, outpoint));
	}
}

/// The script-public-key index. Updated exclusively through chain
/// deltas; applying a delta and its reverse is an identity.
#[derive(Default)]
pub struct UtxoIndex {
	utxos: RwLock<UtxoByScript>,
}

impl UtxoIndex {
	pub fn new() -> Self {
		UtxoIndex::default()
	}

	/// Applies a chain reorganization delta: removed blocks are
	/// reversed first, then added blocks are applied, and everything
	/// commits at once.
	pub fn update(
		&self,
		chain_changes: &SelectedParentChainChanges,
		acceptance: &AcceptanceDataStore,
		ghostdag: &GhostdagStore,
	) -> Result<(), Error> {
		let mut staged = StagedChanges::default();

		for removed_hash in &chain_changes.removed {
			self.remove_block(&mut staged, removed_hash, acceptance)?;
		}
		for added_hash in &chain_changes.added {
			self.add_block(&mut staged, added_hash, acceptance, ghostdag)?;
		}

		trace!(target: "utxoindex", "committing {} additions, {} removals",
			staged.to_add.len(), staged.to_remove.len());
		self.commit(staged);
		Ok(())
	}

	fn add_block(
		&self,
		staged: &mut StagedChanges,
		block_hash: &H256,
		acceptance: &AcceptanceDataStore,
		ghostdag: &GhostdagStore,
	) -> Result<(), Error> {
		let acceptance_data = acceptance.acceptance_data(block_hash)
			.ok_or(Error::MissingRecord("acceptanceData", *block_hash))?;
		let blue_score = ghostdag.ghostdag_data(block_hash)
			.ok_or(Error::MissingRecord("ghostdag", *block_hash))?
			.blue_score;

		for accepted in accepted_transactions(&acceptance_data) {
			// spent outputs leave the index
			for (input, entry) in accepted.transaction.inputs.iter().zip(&accepted.input_entries) {
				staged.remove(entry.script_pubkey.clone(), input.previous_outpoint.clone());
			}

			// created outputs enter it, stamped with the accepting block
			for (index, output) in accepted.transaction.outputs.iter().enumerate() {
				let outpoint = OutPoint::new(accepted.tx_id, index as u32);
				staged.add(output.script_pubkey.clone(), outpoint, UTXOEntry {
					amount: output.value,
					script_pubkey: output.script_pubkey.clone(),
					block_blue_score: blue_score,
					is_coinbase: accepted.transaction.is_coinbase(),
				});
			}
		}

		Ok(())
	}

	fn remove_block(
		&self,
		staged: &mut StagedChanges,
		block_hash: &H256,
		acceptance: &AcceptanceDataStore,
	) -> Result<(), Error> {
		let acceptance_data = acceptance.acceptance_data(block_hash)
			.ok_or(Error::MissingRecord("acceptanceData", *block_hash))?;

		for accepted in accepted_transactions(&acceptance_data) {
			// outputs the block created disappear again
			for (index, output) in accepted.transaction.outputs.iter().enumerate() {
				let outpoint = OutPoint::new(accepted.tx_id, index as u32);
				staged.remove(output.script_pubkey.clone(), outpoint);
			}

			// outputs it spent come back with their original entries
			for (input, entry) in accepted.transaction.inputs.iter().zip(&accepted.input_entries) {
				staged.add(entry.script_pubkey.clone(), input.previous_outpoint.clone(), entry.clone());
			}
		}

		Ok(())
	}

	fn commit(&self, staged: StagedChanges) {
		let mut utxos = self.utxos.write();

		for (script_pubkey, outpoint) in staged.to_remove {
			let emptied = match utxos.get_mut(&script_pubkey) {
				Some(outpoints) => {
					outpoints.remove(&outpoint);
					outpoints.is_empty()
				},
				None => false,
			};
			if emptied {
				utxos.remove(&script_pubkey);
			}
		}

		for (script_pubkey, outpoint, entry) in staged.to_add {
			utxos.entry(script_pubkey).or_insert_with(HashMap::new).insert(outpoint, entry);
		}
	}

	/// All live outpoints locked by the given script public key.
	pub fn utxos_by_script_pubkey(&self, script_pubkey: &Bytes) -> Vec<(OutPoint, UTXOEntry)> {
		self.utxos.read()
			.get(script_pubkey)
			.map(|outpoints| outpoints.iter().map(|(outpoint, entry)| (outpoint.clone(), entry.clone())).collect())
			.unwrap_or_default()
	}

	/// Snapshot of the whole index.
	pub fn snapshot(&self) -> UtxoByScript {
		self.utxos.read().clone()
	}
}

fn accepted_transactions(acceptance_data: &storage::AcceptanceData) -> impl Iterator<Item = &TransactionAcceptanceData> {
	acceptance_data.iter()
		.flat_map(|block_acceptance| block_acceptance.transactions.iter())
		.filter(|tx| tx.is_accepted)
}

impl IndexManager for UtxoIndex {
	fn init(&self, _acceptance: &AcceptanceDataStore, _ghostdag: &GhostdagStore) -> Result<(), Error> {
		Ok(())
	}

	fn connect_block(
		&self,
		chain_changes: &SelectedParentChainChanges,
		acceptance: &AcceptanceDataStore,
		ghostdag: &GhostdagStore,
	) -> Result<(), Error> {
		self.update(chain_changes, acceptance, ghostdag)
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;
	use chain::Block;
	use primitives::bytes::Bytes;
	use primitives::hash::H256;
	use db::kv::MemoryDatabase;
	use network::{ConsensusParams, Network};
	use consensus::BlockDag;
	use test_data::ChainBuilder;
	use super::UtxoIndex;

	const SUBSIDY: u64 = 50 * ::chain::constants::SOMPI_PER_COIN;

	fn anyone_can_spend() -> Bytes {
		vec![0x51].into()
	}

	fn new_dag_with_index() -> (BlockDag<MemoryDatabase>, Arc<UtxoIndex>) {
		let params = ConsensusParams::new(Network::Unitest);
		let index = Arc::new(UtxoIndex::new());
		let dag = BlockDag::new(params, MemoryDatabase::default(), vec![Box::new(index.clone())]).unwrap();
		(dag, index)
	}

	fn commitments_of<'a>(dag: &'a BlockDag<MemoryDatabase>) -> impl Fn(&[H256]) -> (H256, H256) + 'a {
		move |parents| dag.header_commitments(parents).unwrap()
	}

	fn extend_chain(
		dag: &BlockDag<MemoryDatabase>,
		chain: &ChainBuilder,
		from: H256,
		from_time: u64,
		length: usize,
	) -> Vec<Block> {
		chain.extend(from, from_time, length, |block| {
			dag.submit_block(block.into()).unwrap();
		})
	}

	#[test]
	fn test_accepted_coinbases_enter_the_index() {
		let (dag, index) = new_dag_with_index();
		let genesis_hash = dag.params().genesis_hash;
		let genesis_time = dag.params().genesis_block.header.raw.time;
		let commitments = commitments_of(&dag);
		let builder = ChainBuilder::new(&commitments);

		extend_chain(&dag, &builder, genesis_hash, genesis_time, 2);

		// the chain tip accepted the coinbases of genesis and the first
		// block; the tip's own coinbase is not accepted yet
		let utxos = index.utxos_by_script_pubkey(&anyone_can_spend());
		assert_eq!(utxos.len(), 2);
		for (_, entry) in &utxos {
			assert!(entry.is_coinbase);
			assert_eq!(entry.amount, SUBSIDY);
		}
	}

	#[test]
	fn test_delta_followed_by_reverse_is_identity() {
		let (dag, index) = new_dag_with_index();
		let genesis_hash = dag.params().genesis_hash;
		let genesis_time = dag.params().genesis_block.header.raw.time;
		let commitments = commitments_of(&dag);
		let builder = ChainBuilder::new(&commitments);

		extend_chain(&dag, &builder, genesis_hash, genesis_time, 3);
		let before = index.snapshot();

		let delta = dag.get_selected_parent_chain(Some(&genesis_hash)).unwrap();
		let stores = dag.stores();
		index.update(&delta.reversed(), &stores, &stores).unwrap();
		index.update(&delta, &stores, &stores).unwrap();

		assert_eq!(index.snapshot(), before);
	}

	#[test]
	fn test_index_after_reorg_matches_from_scratch_build() {
		let (dag, index) = new_dag_with_index();
		let genesis_hash = dag.params().genesis_hash;
		let genesis_time = dag.params().genesis_block.header.raw.time;
		let commitments = commitments_of(&dag);
		let builder = ChainBuilder::new(&commitments);

		// short chain first, then a heavier one reorganizing it away
		extend_chain(&dag, &builder, genesis_hash, genesis_time, 2);
		let long = extend_chain(&dag, &builder, genesis_hash, genesis_time + 10_000, 3);
		assert_eq!(dag.selected_tip(), long[2].hash());

		// a fresh dag fed only the winning chain ends with the same index
		let (reference_dag, reference_index) = new_dag_with_index();
		for block in long {
			reference_dag.submit_block(block.into()).unwrap();
		}

		assert_eq!(index.snapshot(), reference_index.snapshot());
	}
}
