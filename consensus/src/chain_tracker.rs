//! Tracks the virtual selected parent chain and emits reorganization
//! deltas.

use std::collections::HashMap;
use hash::H256;
use storage::{Error, GhostdagStore, SelectedParentChainChanges};

/// The current selected parent chain, genesis first, with O(1) position
/// lookup by hash.
#[derive(Default)]
pub struct ChainTracker {
	chain: Vec<H256>,
	positions: HashMap<H256, usize>,
}

impl ChainTracker {
	pub fn new() -> Self {
		ChainTracker::default()
	}

	pub fn tip(&self) -> Option<&H256> {
		self.chain.last()
	}

	pub fn contains(&self, hash: &H256) -> bool {
		self.positions.contains_key(hash)
	}

	pub fn len(&self) -> usize {
		self.chain.len()
	}

	/// Appends the initial chain block (genesis).
	pub fn push(&mut self, hash: H256) {
		debug_assert!(!self.contains(&hash));
		self.positions.insert(hash, self.chain.len());
		self.chain.push(hash);
	}

	/// Moves the tip to `new_tip`, walking back to the lowest common
	/// ancestor with the current chain. Returns the delta: `removed`
	/// top-down from the old tip, `added` bottom-up to the new tip.
	pub fn reorg_to(&mut self, new_tip: H256, ghostdag: &GhostdagStore) -> Result<SelectedParentChainChanges, Error> {
		if self.contains(&new_tip) {
			// moving the tip onto an existing chain block only removes
			let position = self.positions[&new_tip];
			let removed = self.truncate(position + 1);
			return Ok(SelectedParentChainChanges {
				removed: removed,
				added: vec![],
			});
		}

		// walk the new tip's selected-parent chain down to the fork point
		let mut added = vec![];
		let mut current = new_tip;
		let fork_position = loop {
			match self.positions.get(&current) {
				Some(&position) => break position,
				None => {
					added.push(current);
					let data = ghostdag.ghostdag_data(&current)
						.ok_or(Error::MissingRecord("ghostdag", current))?;
					current = data.selected_parent
						.ok_or(Error::InconsistentData("selected parent chain does not meet the tracked chain"))?;
				},
			}
		};

		let removed = self.truncate(fork_position + 1);

		added.reverse();
		for hash in &added {
			self.positions.insert(*hash, self.chain.len());
			self.chain.push(*hash);
		}

		Ok(SelectedParentChainChanges {
			removed: removed,
			added: added,
		})
	}

	fn truncate(&mut self, new_len: usize) -> Vec<H256> {
		let removed: Vec<H256> = self.chain.split_off(new_len);
		for hash in &removed {
			self.positions.remove(hash);
		}
		removed.into_iter().rev().collect()
	}

	/// The delta a caller tracking the chain from `start_hash` has to
	/// apply to arrive at the current chain. A `start_hash` off the
	/// current selected chain resolves through the lowest common
	/// ancestor; unknown blocks are the caller's error.
	pub fn changes_since(&self, start_hash: &H256, ghostdag: &GhostdagStore) -> Result<SelectedParentChainChanges, Error> {
		if let Some(&position) = self.positions.get(start_hash) {
			return Ok(SelectedParentChainChanges {
				removed: vec![],
				added: self.chain[position + 1..].to_vec(),
			});
		}

		let mut removed = vec![];
		let mut current = *start_hash;
		let fork_position = loop {
			match self.positions.get(&current) {
				Some(&position) => break position,
				None => {
					removed.push(current);
					let data = ghostdag.ghostdag_data(&current)
						.ok_or(Error::MissingRecord("ghostdag", current))?;
					current = data.selected_parent
						.ok_or(Error::InconsistentData("start hash does not meet the selected chain"))?;
				},
			}
		};

		Ok(SelectedParentChainChanges {
			removed: removed,
			added: self.chain[fork_position + 1..].to_vec(),
		})
	}

	/// The delta from genesis: the whole current chain.
	pub fn changes_from_genesis(&self) -> SelectedParentChainChanges {
		SelectedParentChainChanges {
			removed: vec![],
			added: self.chain.clone(),
		}
	}
}
