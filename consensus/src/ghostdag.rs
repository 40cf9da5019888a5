//! GHOSTDAG: partitions a new block's merge set into blues and reds and
//! accumulates its blue totals.

use std::collections::{HashMap, HashSet};
use hash::H256;
use primitives::compact::Compact;
use storage::{Error, GhostdagData};
use db::dag_db::{get_block, get_ghostdag_data};
use db::kv::KeyValueDatabase;
use verification::block_work;
use reachability::ReachabilityIndex;

/// Computes the GHOSTDAG record of a block with the given parents and
/// proof-of-work bits. All parents must already carry records of their
/// own.
pub fn ghostdag<T>(
	parents: &[H256],
	bits: Compact,
	db: &T,
	reachability: &ReachabilityIndex,
	k: u64,
) -> Result<GhostdagData, Error> where T: KeyValueDatabase {
	debug_assert!(!parents.is_empty());

	let selected_parent = select_parent(parents, db)?;
	let selected_parent_data = get_ghostdag_data(db, &selected_parent)
		.ok_or(Error::MissingRecord("ghostdag", selected_parent))?;

	let mergeset = ordered_mergeset_without_selected_parent(&selected_parent, parents, db, reachability)?;

	// the selected parent is blue by definition and opens the merge set
	let mut mergeset_blues = vec![selected_parent];
	let mut mergeset_reds = vec![];
	let mut blues_anticone_sizes = HashMap::new();
	blues_anticone_sizes.insert(selected_parent, 0u64);

	for candidate in mergeset {
		let anticone: Vec<H256> = mergeset_blues.iter()
			.filter(|blue| !reachable_either_way(reachability, blue, &candidate))
			.cloned()
			.collect();

		let fits_cluster = anticone.len() as u64 <= k &&
			anticone.iter().all(|blue| blues_anticone_sizes[blue] < k);

		if fits_cluster {
			for blue in &anticone {
				*blues_anticone_sizes.get_mut(blue).expect("anticone members are blues") += 1;
			}
			blues_anticone_sizes.insert(candidate, anticone.len() as u64);
			mergeset_blues.push(candidate);
		} else {
			mergeset_reds.push(candidate);
		}
	}

	let blue_score = selected_parent_data.blue_score + mergeset_blues.len() as u64;

	// own work plus the work of every newly merged blue
	let mut blue_work = selected_parent_data.blue_work + block_work(bits);
	for blue in mergeset_blues.iter().skip(1) {
		let header = get_block(db, blue)
			.ok_or(Error::MissingRecord("block", *blue))?
			.header;
		blue_work = blue_work + block_work(header.raw.bits);
	}

	Ok(GhostdagData {
		selected_parent: Some(selected_parent),
		mergeset_blues: mergeset_blues,
		mergeset_reds: mergeset_reds,
		blues_anticone_sizes: blues_anticone_sizes,
		blue_score: blue_score,
		blue_work: blue_work,
	})
}

/// The parent with the highest blue work; ties break towards the higher
/// hash so selection is deterministic across nodes.
fn select_parent<T>(parents: &[H256], db: &T) -> Result<H256, Error> where T: KeyValueDatabase {
	let mut best: Option<(H256, GhostdagData)> = None;

	for parent in parents {
		let data = get_ghostdag_data(db, parent)
			.ok_or(Error::MissingRecord("ghostdag", *parent))?;

		best = match best {
			None => Some((*parent, data)),
			Some((best_hash, best_data)) => {
				if (data.blue_work, *parent) > (best_data.blue_work, best_hash) {
					Some((*parent, data))
				} else {
					Some((best_hash, best_data))
				}
			},
		};
	}

	Ok(best.expect("parents is non-empty").0)
}

/// Collects `past(block) \ past(selected_parent)`, excluding the
/// selected parent itself, ordered ascending by `(blue_work, hash)`.
fn ordered_mergeset_without_selected_parent<T>(
	selected_parent: &H256,
	parents: &[H256],
	db: &T,
	reachability: &ReachabilityIndex,
) -> Result<Vec<H256>, Error> where T: KeyValueDatabase {
	let mut queue: Vec<H256> = parents.iter().filter(|p| *p != selected_parent).cloned().collect();
	let mut visited: HashSet<H256> = queue.iter().cloned().collect();
	let mut mergeset = vec![];

	while let Some(current) = queue.pop() {
		// anything in the selected parent's past is already accounted for
		use verification::DagTopology;
		if reachability.is_dag_ancestor_of(&current, selected_parent) {
			continue;
		}

		mergeset.push(current);

		let header = get_block(db, &current)
			.ok_or(Error::MissingRecord("block", current))?
			.header;
		for parent in &header.raw.parent_hashes {
			if visited.insert(*parent) {
				queue.push(*parent);
			}
		}
	}

	let mut keyed = Vec::with_capacity(mergeset.len());
	for hash in mergeset {
		let data = get_ghostdag_data(db, &hash)
			.ok_or(Error::MissingRecord("ghostdag", hash))?;
		keyed.push((data.blue_work, hash));
	}
	keyed.sort();

	Ok(keyed.into_iter().map(|(_, hash)| hash).collect())
}

fn reachable_either_way(reachability: &ReachabilityIndex, a: &H256, b: &H256) -> bool {
	use verification::DagTopology;
	reachability.is_dag_ancestor_of(a, b) || reachability.is_dag_ancestor_of(b, a)
}
