pub mod palette;

#[cfg(test)]
mod proptests;

use std::convert::TryFrom;

use super::error::{Channel, ConfigError, InsertError};
use super::reduce::{RankKey, ReductionIndex};
use super::{octant_index, Branch, ColorSample, LeafStats, NodeArena, NodeId, OctreeNode, MAX_DEPTH};

use palette::{PaletteEntry, PaletteExtractor};

/// Options recognized by `Quantizer`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuantizerConfig {
	/// Hard bound on simultaneously live leaves; must be at least 1.
	pub max_colors: usize,
	/// Number of entries `Quantizer::palette` returns.
	pub top_n: usize,
}

impl Default for QuantizerConfig {
	fn default() -> Self {
		QuantizerConfig { max_colors: 16, top_n: 4 }
	}
}

/// Streaming octree color quantizer with a fixed leaf budget.
///
/// Samples are inserted one at a time. Whenever the number of leaves would
/// exceed `max_colors`, the cheapest node at the deepest level is merged
/// until the budget holds again.
#[derive(Clone, Debug)]
pub struct Quantizer {
	arena: NodeArena,
	index: ReductionIndex,
	root: NodeId,
	leaf_count: usize,
	pixel_count: u64,
	next_serial: u64,
	config: QuantizerConfig,
}

impl Quantizer {
	/// Creates an empty quantizer keeping at most `max_colors` leaves.
	pub fn new(max_colors: usize) -> Result<Self, ConfigError> {
		Self::with_config(QuantizerConfig { max_colors, ..Default::default() })
	}

	pub fn with_config(config: QuantizerConfig) -> Result<Self, ConfigError> {
		if config.max_colors < 1 {
			return Err(ConfigError::ZeroMaxColors);
		}
		let mut arena = NodeArena::default();
		let root = arena.alloc(0, OctreeNode::Internal(Branch::new(0)));
		Ok(Quantizer {
			arena,
			index: ReductionIndex::default(),
			root,
			leaf_count: 0,
			pixel_count: 0,
			next_serial: 1,
			config,
		})
	}

	pub fn config(&self) -> &QuantizerConfig {
		&self.config
	}

	pub fn max_colors(&self) -> usize {
		self.config.max_colors
	}

	/// Number of leaves currently in the tree.
	pub fn leaf_count(&self) -> usize {
		self.leaf_count
	}

	/// Number of samples inserted since construction or the last `reset`.
	pub fn pixel_count(&self) -> u64 {
		self.pixel_count
	}

	pub fn is_empty(&self) -> bool {
		self.pixel_count == 0
	}

	/// Drops every node, returning to the freshly constructed state.
	pub fn reset(&mut self) {
		self.arena.clear();
		self.index.clear();
		self.root = self.arena.alloc(0, OctreeNode::Internal(Branch::new(0)));
		self.leaf_count = 0;
		self.pixel_count = 0;
		self.next_serial = 1;
	}

	/// Routes one sample down to a leaf, then merges nodes as needed to keep
	/// the leaf count within `max_colors`.
	///
	/// An `Err` here is always `InsertError::ReductionExhausted`, which means
	/// the tree's bookkeeping is broken.
	pub fn insert(&mut self, sample: ColorSample) -> Result<(), InsertError> {
		// Internal nodes visited, indexed by depth.
		let mut path = [self.root; MAX_DEPTH];
		let mut path_len = 0;
		let mut current = self.root;
		loop {
			let octant = match &self.arena[current] {
				OctreeNode::Leaf(_) => break,
				OctreeNode::Internal(_) => octant_index(sample, path_len),
			};
			path[path_len] = current;
			path_len += 1;
			current = self.child_or_spawn(current, octant, path_len);
		}
		if let OctreeNode::Leaf(stats) = &mut self.arena[current] {
			stats.accumulate(sample);
		}
		for (depth, &id) in path[..path_len].iter().enumerate() {
			if let OctreeNode::Internal(branch) = &mut self.arena[id] {
				self.index.remove(depth, &RankKey::of(id, branch));
				branch.count += 1;
				self.index.insert(depth, RankKey::of(id, branch));
			}
		}
		self.pixel_count += 1;
		self.restore_bound()
	}

	/// Inserts every sample in order, stopping at the first failure.
	pub fn insert_all<I>(&mut self, samples: I) -> Result<(), InsertError>
	where
		I: IntoIterator<Item = ColorSample>,
	{
		for sample in samples {
			self.insert(sample)?;
		}
		Ok(())
	}

	/// Checked insertion for sources that hand out wider integers.
	///
	/// Every channel is validated before the tree is touched.
	pub fn insert_channels(&mut self, channels: [i32; 3]) -> Result<(), InsertError> {
		let mut sample = [0u8; 3];
		let names = [Channel::Red, Channel::Green, Channel::Blue];
		for ((out, &value), &channel) in sample.iter_mut().zip(channels.iter()).zip(names.iter()) {
			*out = match u8::try_from(value) {
				Ok(v) => v,
				Err(_) => return Err(InsertError::InvalidSample { channel, value }),
			};
		}
		self.insert(::image::Rgb(sample))
	}

	/// Merges nodes until at least one leaf has been removed.
	///
	/// Merging a node whose only child is a leaf frees nothing, so several
	/// merges may be performed. Returns the number of leaves freed.
	pub fn reduce_once(&mut self) -> Result<usize, InsertError> {
		let before = self.leaf_count;
		while self.leaf_count >= before {
			let (depth, key) = match self.index.pop_cheapest() {
				Some(found) => found,
				None => {
					log::warn!(
						"reduction exhausted with {} leaves over a budget of {}",
						self.leaf_count,
						self.config.max_colors
					);
					return Err(InsertError::ReductionExhausted {
						leaf_count: self.leaf_count,
						max_colors: self.config.max_colors,
					});
				}
			};
			self.merge(key.id, depth);
		}
		Ok(before - self.leaf_count)
	}

	/// Ranked palette of at most `top_n` averaged colors.
	pub fn extract_palette(&self, top_n: usize) -> Vec<PaletteEntry> {
		PaletteExtractor::new(self).extract(top_n)
	}

	/// Ranked palette using the configured `top_n`.
	pub fn palette(&self) -> Vec<PaletteEntry> {
		self.extract_palette(self.config.top_n)
	}

	/// Every distinct averaged color, ranked.
	pub fn full_palette(&self) -> Vec<PaletteEntry> {
		PaletteExtractor::new(self).ranked()
	}

	fn restore_bound(&mut self) -> Result<(), InsertError> {
		if self.leaf_count <= self.config.max_colors {
			return Ok(());
		}
		log::debug!(
			"{} leaves over a budget of {}, reducing",
			self.leaf_count,
			self.config.max_colors
		);
		while self.leaf_count > self.config.max_colors {
			self.reduce_once()?;
		}
		Ok(())
	}

	fn child_or_spawn(&mut self, parent: NodeId, octant: usize, depth: usize) -> NodeId {
		let existing = self.arena.get(parent)
			.and_then(OctreeNode::as_branch)
			.and_then(|b| b.child(octant));
		if let Some(child) = existing {
			return child;
		}
		let node = if depth == MAX_DEPTH {
			self.leaf_count += 1;
			OctreeNode::Leaf(LeafStats::default())
		} else {
			self.next_serial += 1;
			OctreeNode::Internal(Branch::new(self.next_serial - 1))
		};
		let child = self.arena.alloc(depth, node);
		if let OctreeNode::Internal(branch) = &mut self.arena[parent] {
			branch.set_child(octant, child);
		}
		child
	}

	/// Collapses the subtree under `id` into a single leaf.
	///
	/// The node must already be out of the reduction index.
	fn merge(&mut self, id: NodeId, depth: usize) {
		let branch = match std::mem::replace(&mut self.arena[id], OctreeNode::Leaf(LeafStats::default())) {
			OctreeNode::Internal(branch) => branch,
			leaf @ OctreeNode::Leaf(_) => {
				self.arena[id] = leaf;
				return;
			}
		};
		let mut merged = LeafStats::default();
		let mut removed = 0;
		let mut pending = branch.children().collect::<Vec<_>>();
		while let Some(child) = pending.pop() {
			match self.arena.release(child) {
				Some((_, OctreeNode::Leaf(stats))) => {
					merged.absorb(&stats);
					removed += 1;
				}
				Some((child_depth, OctreeNode::Internal(inner))) => {
					self.index.remove(child_depth, &RankKey::of(child, &inner));
					pending.extend(inner.children());
				}
				None => {}
			}
		}
		debug_assert_eq!(merged.count, branch.count);
		log::trace!(
			"merged {} children ({} leaves) into node {:?} at depth {} ({} pixels)",
			branch.child_count(),
			removed,
			id,
			depth,
			merged.count
		);
		self.arena[id] = OctreeNode::Leaf(merged);
		self.leaf_count = self.leaf_count + 1 - removed;
	}
}
