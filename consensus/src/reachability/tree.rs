//! The reachability tree: an interval-labelled tree over the selected
//! parent relation, plus a future covering set per node, answering DAG
//! ancestry queries in near constant time.

use std::collections::{HashMap, HashSet};
use hash::H256;
use storage::Error;
use verification::DagTopology;
use super::interval::Interval;

/// Arena handle of a tree node. Links between nodes are ids into the
/// arena, never owning pointers.
pub type NodeId = usize;

#[derive(Debug, Clone)]
pub struct TreeNode {
	pub hash: H256,
	pub parent: Option<NodeId>,
	pub children: Vec<NodeId>,
	pub interval: Interval,
	/// Tree nodes covering this node's non-chain future, sorted by
	/// interval start for binary search.
	pub future_covering_set: Vec<NodeId>,
}

/// In-memory arena of reachability tree nodes, indexed by block hash.
#[derive(Default)]
pub struct ReachabilityIndex {
	nodes: Vec<TreeNode>,
	by_hash: HashMap<H256, NodeId>,
	dirty: HashSet<NodeId>,
}

impl ReachabilityIndex {
	pub fn new() -> Self {
		ReachabilityIndex::default()
	}

	pub fn contains(&self, hash: &H256) -> bool {
		self.by_hash.contains_key(hash)
	}

	pub fn node_id(&self, hash: &H256) -> Option<NodeId> {
		self.by_hash.get(hash).cloned()
	}

	pub fn node(&self, id: NodeId) -> &TreeNode {
		&self.nodes[id]
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	/// Inserts a block keyed by its selected parent. `mergeset` lists
	/// the blocks of the new block's merge set other than the selected
	/// parent; the new block enters their future covering sets.
	pub fn insert(&mut self, hash: H256, selected_parent: Option<&H256>, mergeset: &[H256]) -> Result<(), Error> {
		if self.contains(&hash) {
			return Err(Error::InconsistentData("reachability node inserted twice"));
		}

		let id = match selected_parent {
			None => {
				if !self.nodes.is_empty() {
					return Err(Error::InconsistentData("reachability tree has two roots"));
				}
				self.push_node(hash, None, Interval::maximal())
			},
			Some(parent_hash) => {
				let parent = self.node_id(parent_hash)
					.ok_or(Error::MissingRecord("reachability", *parent_hash))?;
				let remaining = self.remaining_capacity(parent);

				if remaining.size() > 0 {
					// hand the child half of the remaining capacity, so
					// repeated insertions decay exponentially instead of
					// forcing a reindex every time
					let (allocated, _) = remaining.split_at((remaining.size() + 1) / 2);
					let id = self.push_node(hash, Some(parent), allocated);
					self.nodes[parent].children.push(id);
					self.dirty.insert(parent);
					id
				} else {
					// no room: join the tree with an empty interval, then
					// reindex with the new child already counted
					let id = self.push_node(hash, Some(parent), Interval::empty());
					self.nodes[parent].children.push(id);
					self.dirty.insert(parent);
					self.reindex(parent)?;
					id
				}
			},
		};

		for covered in mergeset {
			let covered = self.node_id(covered)
				.ok_or(Error::MissingRecord("reachability", *covered))?;
			self.insert_to_future_covering_set(covered, id);
		}

		Ok(())
	}

	fn push_node(&mut self, hash: H256, parent: Option<NodeId>, interval: Interval) -> NodeId {
		let id = self.nodes.len();
		self.nodes.push(TreeNode {
			hash: hash,
			parent: parent,
			children: vec![],
			interval: interval,
			future_covering_set: vec![],
		});
		self.by_hash.insert(hash, id);
		self.dirty.insert(id);
		id
	}

	/// Slots of the parent not yet allocated to children. The last slot
	/// of a node's interval represents the node itself.
	fn remaining_capacity(&self, id: NodeId) -> Interval {
		let node = &self.nodes[id];
		let start = match node.children.last() {
			Some(&last) => self.nodes[last].interval.end + 1,
			None => node.interval.start,
		};
		Interval::new(start, node.interval.end.saturating_sub(1))
	}

	/// Climbs to the closest ancestor with enough room for its whole
	/// subtree, then redistributes that ancestor's interval among the
	/// subtree proportionally to subtree sizes.
	fn reindex(&mut self, from: NodeId) -> Result<(), Error> {
		let mut current = from;

		loop {
			let needed = 2 * self.subtree_size(current) as u64 + 1;
			if self.nodes[current].interval.size() >= needed {
				break;
			}

			match self.nodes[current].parent {
				Some(parent) => current = parent,
				None => {
					// the root interval holds 2^64 - 2 slots; running out
					// of them is fatal
					if self.nodes[current].interval.size() < self.subtree_size(current) as u64 {
						return Err(Error::ReachabilityReindexOverflow);
					}
					break;
				},
			}
		}

		trace!(target: "reachability", "reindexing {} nodes below {:?}",
			self.subtree_size(current), self.nodes[current].hash);
		self.reallocate_subtree(current);
		Ok(())
	}

	fn reallocate_subtree(&mut self, id: NodeId) {
		let children = self.nodes[id].children.clone();
		if children.is_empty() {
			self.dirty.insert(id);
			return;
		}

		let weights: Vec<u64> = children.iter()
			.map(|&child| self.subtree_size(child) as u64)
			.collect();

		let interval = self.nodes[id].interval;
		let available = Interval::new(interval.start, interval.end.saturating_sub(1));
		let parts = available.split_proportionally(&weights);

		for (&child, part) in children.iter().zip(parts) {
			self.nodes[child].interval = part;
			self.reallocate_subtree(child);
		}
		self.dirty.insert(id);
	}

	pub fn subtree_size(&self, id: NodeId) -> usize {
		let mut size = 1;
		for &child in &self.nodes[id].children {
			size += self.subtree_size(child);
		}
		size
	}

	/// Inserts `new_node` into the future covering set of `target`,
	/// keeping the set minimal and ordered.
	fn insert_to_future_covering_set(&mut self, target: NodeId, new_node: NodeId) {
		let new_interval = self.nodes[new_node].interval;
		let position = {
			let set = &self.nodes[target].future_covering_set;
			match set.binary_search_by(|&member| self.nodes[member].interval.start.cmp(&new_interval.start)) {
				Ok(position) => position,
				Err(position) => position,
			}
		};

		// a member covering the new node makes the insertion redundant;
		// a member covered by it is replaced
		if position > 0 {
			let predecessor = self.nodes[target].future_covering_set[position - 1];
			if self.nodes[predecessor].interval.contains(&new_interval) {
				return;
			}
		}
		if position < self.nodes[target].future_covering_set.len() {
			let successor = self.nodes[target].future_covering_set[position];
			if new_interval.contains(&self.nodes[successor].interval) {
				self.nodes[target].future_covering_set[position] = new_node;
				self.dirty.insert(target);
				return;
			}
		}

		self.nodes[target].future_covering_set.insert(position, new_node);
		self.dirty.insert(target);
	}

	/// Is `ancestor` a selected-parent-chain ancestor of `descendant`
	/// (or equal to it)? O(1) via interval containment.
	pub fn is_chain_ancestor_of(&self, ancestor: &H256, descendant: &H256) -> bool {
		match (self.node_id(ancestor), self.node_id(descendant)) {
			(Some(ancestor), Some(descendant)) =>
				self.nodes[ancestor].interval.contains(&self.nodes[descendant].interval),
			_ => false,
		}
	}

	/// Is `ancestor` anywhere in the past of `descendant` (or equal to
	/// it)? Chain containment, with the future covering set answering
	/// for the non-chain future.
	pub fn is_dag_ancestor_of_ids(&self, ancestor: NodeId, descendant: NodeId) -> bool {
		let descendant_interval = self.nodes[descendant].interval;
		if self.nodes[ancestor].interval.contains(&descendant_interval) {
			return true;
		}

		let set = &self.nodes[ancestor].future_covering_set;
		let position = match set.binary_search_by(|&member| self.nodes[member].interval.start.cmp(&descendant_interval.start)) {
			Ok(position) => Some(position),
			Err(0) => None,
			Err(position) => Some(position - 1),
		};

		match position {
			Some(position) => self.nodes[set[position]].interval.contains(&descendant_interval),
			None => false,
		}
	}

	/// First pass of a load: places a node with its interval; links are
	/// resolved by `link_node` once every node exists.
	pub fn load_node(&mut self, hash: H256, interval: Interval) -> NodeId {
		self.push_node(hash, None, interval)
	}

	/// Second pass of a load: resolves the hash references of a loaded
	/// node into arena ids.
	pub fn link_node(
		&mut self,
		hash: &H256,
		parent: Option<H256>,
		children: &[H256],
		future_covering_set: &[H256],
	) -> Result<(), Error> {
		let id = self.node_id(hash)
			.ok_or(Error::MissingRecord("reachability", *hash))?;

		let parent = match parent {
			Some(parent_hash) => Some(self.node_id(&parent_hash)
				.ok_or(Error::MissingRecord("reachability", parent_hash))?),
			None => None,
		};

		let mut child_ids = Vec::with_capacity(children.len());
		for child in children {
			child_ids.push(self.node_id(child).ok_or(Error::MissingRecord("reachability", *child))?);
		}

		let mut covering_ids = Vec::with_capacity(future_covering_set.len());
		for covered in future_covering_set {
			covering_ids.push(self.node_id(covered).ok_or(Error::MissingRecord("reachability", *covered))?);
		}

		self.nodes[id].parent = parent;
		self.nodes[id].children = child_ids;
		self.nodes[id].future_covering_set = covering_ids;
		Ok(())
	}

	/// Drains the dirty-node set; used by the persistence layer.
	pub fn take_dirty(&mut self) -> Vec<NodeId> {
		let mut dirty: Vec<NodeId> = self.dirty.drain().collect();
		dirty.sort();
		dirty
	}
}

impl DagTopology for ReachabilityIndex {
	fn is_dag_ancestor_of(&self, ancestor: &H256, descendant: &H256) -> bool {
		match (self.node_id(ancestor), self.node_id(descendant)) {
			(Some(ancestor), Some(descendant)) => self.is_dag_ancestor_of_ids(ancestor, descendant),
			_ => false,
		}
	}
}

#[cfg(test)]
mod tests {
	use hash::H256;
	use verification::DagTopology;
	use super::ReachabilityIndex;

	fn hash(n: u8) -> H256 {
		H256::from(n)
	}

	fn linear_chain(length: u8) -> ReachabilityIndex {
		let mut index = ReachabilityIndex::new();
		index.insert(hash(0), None, &[]).unwrap();
		for n in 1..length {
			index.insert(hash(n), Some(&hash(n - 1)), &[]).unwrap();
		}
		index
	}

	#[test]
	fn test_chain_ancestry() {
		let index = linear_chain(10);

		for ancestor in 0..10u8 {
			for descendant in ancestor..10u8 {
				assert!(index.is_chain_ancestor_of(&hash(ancestor), &hash(descendant)),
					"{} should be an ancestor of {}", ancestor, descendant);
			}
		}

		assert!(!index.is_chain_ancestor_of(&hash(5), &hash(4)));
		assert!(!index.is_chain_ancestor_of(&hash(9), &hash(0)));
	}

	#[test]
	fn test_fork_is_not_related() {
		let mut index = ReachabilityIndex::new();
		index.insert(hash(0), None, &[]).unwrap();
		index.insert(hash(1), Some(&hash(0)), &[]).unwrap();
		index.insert(hash(2), Some(&hash(0)), &[]).unwrap();

		assert!(!index.is_dag_ancestor_of(&hash(1), &hash(2)));
		assert!(!index.is_dag_ancestor_of(&hash(2), &hash(1)));
		assert!(index.is_dag_ancestor_of(&hash(0), &hash(1)));
		assert!(index.is_dag_ancestor_of(&hash(0), &hash(2)));
	}

	#[test]
	fn test_mergeset_enters_future_covering_set() {
		// 0 <- 1, 0 <- 2, then 3 selects 1 and merges 2
		let mut index = ReachabilityIndex::new();
		index.insert(hash(0), None, &[]).unwrap();
		index.insert(hash(1), Some(&hash(0)), &[]).unwrap();
		index.insert(hash(2), Some(&hash(0)), &[]).unwrap();
		index.insert(hash(3), Some(&hash(1)), &[hash(2)]).unwrap();

		// 3 is in the future of both its selected parent and the merged block
		assert!(index.is_dag_ancestor_of(&hash(1), &hash(3)));
		assert!(index.is_dag_ancestor_of(&hash(2), &hash(3)));
		// but 2 is still not an ancestor of 1
		assert!(!index.is_dag_ancestor_of(&hash(2), &hash(1)));
	}

	#[test]
	fn test_every_node_is_its_own_ancestor() {
		let index = linear_chain(3);
		assert!(index.is_dag_ancestor_of(&hash(0), &hash(0)));
		assert!(index.is_chain_ancestor_of(&hash(2), &hash(2)));
	}

	#[test]
	fn test_deep_chain_triggers_reindex_and_stays_correct() {
		// exponential-decay allocation exhausts quickly under a narrow
		// root; a long chain exercises the reindex path many times
		let mut index = ReachabilityIndex::new();
		index.insert(hash(0), None, &[]).unwrap();
		for n in 1..200u8 {
			index.insert(hash(n), Some(&hash(n - 1)), &[]).unwrap();
		}

		for n in 1..200u8 {
			assert!(index.is_chain_ancestor_of(&hash(n - 1), &hash(n)));
			assert!(!index.is_chain_ancestor_of(&hash(n), &hash(n - 1)));
		}
		assert!(index.is_chain_ancestor_of(&hash(0), &hash(199)));
	}

	#[test]
	fn test_wide_fanout_triggers_reindex_and_stays_correct() {
		let mut index = ReachabilityIndex::new();
		index.insert(hash(0), None, &[]).unwrap();
		// all children of a single parent
		for n in 1..150u8 {
			index.insert(hash(n), Some(&hash(0)), &[]).unwrap();
		}

		for n in 1..150u8 {
			assert!(index.is_chain_ancestor_of(&hash(0), &hash(n)));
			for m in 1..150u8 {
				if n != m {
					assert!(!index.is_dag_ancestor_of(&hash(n), &hash(m)));
				}
			}
		}
	}
}
