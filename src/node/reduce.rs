use std::collections::BTreeSet;

use super::{Branch, NodeId, MAX_DEPTH};

/// Ordering key of a mergeable node: fewest pixels first, then oldest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct RankKey {
	pub count: u64,
	pub serial: u64,
	pub id: NodeId,
}

impl RankKey {
	pub fn of(id: NodeId, branch: &Branch) -> Self {
		RankKey { count: branch.count, serial: branch.serial, id }
	}
}

/// Per-depth ordered sets of internal nodes that can be merged.
///
/// Only nodes with at least one child belong here. A node's key embeds its
/// pixel count, so callers must `remove` the old key before changing the count
/// and `insert` the new one afterwards.
#[derive(Clone, Debug, Default)]
pub struct ReductionIndex {
	levels: [BTreeSet<RankKey>; MAX_DEPTH],
}

impl ReductionIndex {
	pub fn insert(&mut self, depth: usize, key: RankKey) -> bool {
		self.levels[depth].insert(key)
	}

	pub fn remove(&mut self, depth: usize, key: &RankKey) -> bool {
		self.levels[depth].remove(key)
	}

	pub fn contains(&self, depth: usize, key: &RankKey) -> bool {
		self.levels[depth].contains(key)
	}

	/// The next merge target: the cheapest node at the deepest non-empty level.
	pub fn peek_cheapest(&self) -> Option<(usize, RankKey)> {
		(0..MAX_DEPTH)
			.rev()
			.find_map(|depth| self.levels[depth].iter().next().map(|key| (depth, *key)))
	}

	/// Removes and returns the next merge target.
	pub fn pop_cheapest(&mut self) -> Option<(usize, RankKey)> {
		let (depth, key) = self.peek_cheapest()?;
		self.levels[depth].remove(&key);
		Some((depth, key))
	}

	/// Mergeable nodes at `depth`, cheapest first.
	pub fn level(&self, depth: usize) -> impl Iterator<Item = &RankKey> + '_ {
		self.levels[depth].iter()
	}

	pub fn len(&self) -> usize {
		self.levels.iter().map(BTreeSet::len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.levels.iter().all(BTreeSet::is_empty)
	}

	pub fn clear(&mut self) {
		self.levels.iter_mut().for_each(BTreeSet::clear);
	}
}
