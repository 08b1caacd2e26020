use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

use super::Quantizer;
use crate::node::{ColorSample, LeafStats, NodeArena, NodeId, OctreeNode};

/// One ranked color of an extracted palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaletteEntry {
	pub color: ColorSample,
	/// Number of pixels represented by this color.
	pub weight: u64,
}

impl PaletteEntry {
	/// The color as a lowercase `#rrggbb` string.
	pub fn key(&self) -> String {
		self.to_string()
	}
}

impl fmt::Display for PaletteEntry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let [r, g, b] = self.color.0;
		write!(f, "#{:02x}{:02x}{:02x}", r, g, b)
	}
}

/// Reads the leaves of a quantizer's tree and ranks their average colors.
pub struct PaletteExtractor<'a> {
	arena: &'a NodeArena,
	root: NodeId,
}

impl<'a> PaletteExtractor<'a> {
	pub fn new(quantizer: &'a Quantizer) -> Self {
		PaletteExtractor { arena: &quantizer.arena, root: quantizer.root }
	}

	/// Statistics of every leaf, depth-first in ascending octant order.
	pub fn leaves(&self) -> Vec<LeafStats> {
		let mut leaves = Vec::new();
		let mut stack = vec![self.root];
		while let Some(id) = stack.pop() {
			match &self.arena[id] {
				OctreeNode::Leaf(stats) => leaves.push(*stats),
				OctreeNode::Internal(branch) => {
					stack.extend((0..8).rev().filter_map(|octant| branch.child(octant)))
				}
			}
		}
		leaves
	}

	/// All distinct averaged colors, heaviest first.
	pub fn ranked(&self) -> Vec<PaletteEntry> {
		rank_leaves(self.leaves())
	}

	/// The `top_n` heaviest averaged colors.
	pub fn extract(&self, top_n: usize) -> Vec<PaletteEntry> {
		let mut entries = self.ranked();
		entries.truncate(top_n);
		entries
	}
}

/// Sums weights per averaged color and sorts by descending weight.
///
/// Equal weights keep the order in which their colors were first seen.
fn rank_leaves<I>(leaves: I) -> Vec<PaletteEntry>
where
	I: IntoIterator<Item = LeafStats>,
{
	let mut entries: Vec<PaletteEntry> = Vec::new();
	let mut positions: HashMap<ColorSample, usize> = HashMap::new();
	for stats in leaves {
		let color = match stats.mean() {
			Some(c) => c,
			None => continue,
		};
		match positions.entry(color) {
			Entry::Occupied(e) => entries[*e.get()].weight += stats.count,
			Entry::Vacant(e) => {
				e.insert(entries.len());
				entries.push(PaletteEntry { color, weight: stats.count });
			}
		}
	}
	entries.sort_by(|a, b| b.weight.cmp(&a.weight));
	entries
}

fn abs_sub(a: u8, b: u8) -> u8 {
	(a as i16 - b as i16).abs() as u8
}

fn vec3_len_squared(a: u8, b: u8, c: u8) -> u32 {
	(a as u32 * a as u32) +
	(b as u32 * b as u32) +
	(c as u32 * c as u32)
}

pub(crate) fn color_distance(a: &ColorSample, b: &ColorSample) -> u32 {
	vec3_len_squared(
		abs_sub(a.0[0], b.0[0]),
		abs_sub(a.0[1], b.0[1]),
		abs_sub(a.0[2], b.0[2]),
	)
}

/// A list of colors that pixels can be mapped onto by index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Palette {
	pub colors: Box<[ColorSample]>,
}

impl Palette {
	pub fn len(&self) -> usize {
		self.colors.len()
	}

	pub fn is_empty(&self) -> bool {
		self.colors.is_empty()
	}

	pub fn get(&self, index: u32) -> Option<ColorSample> {
		self.colors.get(index as usize).copied()
	}

	/// Index of the palette color closest to `color` by squared RGB distance.
	///
	/// Ties resolve to the lowest index. Returns `None` for an empty palette.
	pub fn nearest(&self, color: &ColorSample) -> Option<u32> {
		self.colors.iter()
			.enumerate()
			.map(|(ind, col)| (color_distance(color, col), ind as u32))
			.min()
			.map(|(_, ind)| ind)
	}
}

impl From<Vec<ColorSample>> for Palette {
	fn from(v: Vec<ColorSample>) -> Self {
		Palette { colors: v.into_boxed_slice() }
	}
}

impl From<&[PaletteEntry]> for Palette {
	fn from(entries: &[PaletteEntry]) -> Self {
		Palette { colors: entries.iter().map(|e| e.color).collect() }
	}
}
