pub mod error;
pub mod image;
pub mod quantize;
pub mod reduce;

pub use error::{Channel, ConfigError, InsertError, RemapError};
pub use self::image::quantize_to_palette;
pub use quantize::palette::{Palette, PaletteEntry, PaletteExtractor};
pub use quantize::{Quantizer, QuantizerConfig};

use bitvec::prelude::*;

/// A single pixel color fed to the quantizer.
pub type ColorSample = ::image::Rgb<u8>;

/// Depth at which nodes are always created as leaves.
///
/// Internal nodes only ever exist at depths `0..MAX_DEPTH`.
pub const MAX_DEPTH: usize = 7;

/// Occupancy of the eight octant slots of an internal node.
type ChildMask = BitArray<[u8; 1], Lsb0>;

/// Handle to a node stored in a `NodeArena`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
	pub fn index(self) -> usize {
		self.0
	}
}

/// Exact running statistics of the pixels that ended up in one leaf.
///
/// Sums are kept at full width; nothing is rounded until extraction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LeafStats {
	pub red: u64,
	pub green: u64,
	pub blue: u64,
	pub count: u64,
}

impl LeafStats {
	/// Adds one sample to the running sums.
	pub fn accumulate(&mut self, sample: ColorSample) {
		self.red += sample.0[0] as u64;
		self.green += sample.0[1] as u64;
		self.blue += sample.0[2] as u64;
		self.count += 1;
	}

	/// Folds another leaf's statistics into this one.
	pub fn absorb(&mut self, other: &LeafStats) {
		self.red += other.red;
		self.green += other.green;
		self.blue += other.blue;
		self.count += other.count;
	}

	/// Mean color of the leaf, truncating each channel toward zero.
	///
	/// Returns `None` for a leaf that has not seen any pixels.
	pub fn mean(&self) -> Option<ColorSample> {
		if self.count == 0 {
			return None;
		}
		Some(::image::Rgb([
			(self.red / self.count) as u8,
			(self.green / self.count) as u8,
			(self.blue / self.count) as u8,
		]))
	}
}

/// Internal node: up to eight children plus the reduction ranking data.
#[derive(Clone, Debug)]
pub struct Branch {
	children: [NodeId; 8],
	present: ChildMask,
	/// Pixels routed through this node so far.
	pub count: u64,
	/// Creation order within the owning tree, used to break ranking ties.
	pub serial: u64,
}

impl Branch {
	pub fn new(serial: u64) -> Self {
		Branch {
			children: [NodeId(0); 8],
			present: BitArray::new([0]),
			count: 0,
			serial,
		}
	}

	/// The child stored in slot `octant`, if that slot is occupied.
	pub fn child(&self, octant: usize) -> Option<NodeId> {
		if self.present[octant] {
			Some(self.children[octant])
		} else {
			None
		}
	}

	pub fn set_child(&mut self, octant: usize, id: NodeId) {
		self.children[octant] = id;
		self.present.set(octant, true);
	}

	/// Occupied children in ascending octant order.
	pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
		self.present.iter_ones().map(move |octant| self.children[octant])
	}

	pub fn child_count(&self) -> usize {
		self.present.count_ones()
	}

	pub fn has_children(&self) -> bool {
		self.present.any()
	}
}

/// Node in the color octree.
///
/// A leaf holds aggregated pixel statistics; an internal node routes samples
/// further down. Nodes carry no parent link.
#[derive(Clone, Debug)]
pub enum OctreeNode {
	Leaf(LeafStats),
	Internal(Branch),
}

impl OctreeNode {
	pub fn is_leaf(&self) -> bool {
		matches!(self, OctreeNode::Leaf(_))
	}

	pub fn as_branch(&self) -> Option<&Branch> {
		match self {
			OctreeNode::Internal(b) => Some(b),
			OctreeNode::Leaf(_) => None,
		}
	}
}

/// Computes which of the eight children a sample descends into at `depth`.
///
/// Takes bit `7 - depth` of each channel and packs them as `rgb`, so the most
/// significant bits split the cube first.
pub fn octant_index(sample: ColorSample, depth: usize) -> usize {
	debug_assert!(depth < MAX_DEPTH);
	let shift = 7 - depth;
	let [r, g, b] = sample.0;
	((((r >> shift) & 1) << 2) | (((g >> shift) & 1) << 1) | ((b >> shift) & 1)) as usize
}

#[derive(Clone, Debug)]
struct ArenaEntry {
	depth: usize,
	node: OctreeNode,
}

/// Slot storage for the nodes of one tree.
///
/// Released slots are recycled by later allocations, so a `NodeId` is only
/// meaningful while its node is reachable.
#[derive(Clone, Debug, Default)]
pub struct NodeArena {
	slots: Vec<Option<ArenaEntry>>,
	free: Vec<NodeId>,
}

impl NodeArena {
	pub fn alloc(&mut self, depth: usize, node: OctreeNode) -> NodeId {
		let entry = Some(ArenaEntry { depth, node });
		match self.free.pop() {
			Some(id) => {
				self.slots[id.0] = entry;
				id
			}
			None => {
				self.slots.push(entry);
				NodeId(self.slots.len() - 1)
			}
		}
	}

	/// Removes a node, returning its depth and contents.
	pub fn release(&mut self, id: NodeId) -> Option<(usize, OctreeNode)> {
		let entry = self.slots.get_mut(id.0)?.take()?;
		self.free.push(id);
		Some((entry.depth, entry.node))
	}

	pub fn get(&self, id: NodeId) -> Option<&OctreeNode> {
		self.slots.get(id.0)?.as_ref().map(|e| &e.node)
	}

	pub fn depth(&self, id: NodeId) -> Option<usize> {
		self.slots.get(id.0)?.as_ref().map(|e| e.depth)
	}

	/// Number of nodes currently allocated.
	pub fn live_count(&self) -> usize {
		self.slots.len() - self.free.len()
	}

	pub fn clear(&mut self) {
		self.slots.clear();
		self.free.clear();
	}
}

impl std::ops::Index<NodeId> for NodeArena {
	type Output = OctreeNode;

	fn index(&self, id: NodeId) -> &OctreeNode {
		match self.slots.get(id.0) {
			Some(Some(entry)) => &entry.node,
			_ => panic!("node {:?} is not allocated", id),
		}
	}
}

impl std::ops::IndexMut<NodeId> for NodeArena {
	fn index_mut(&mut self, id: NodeId) -> &mut OctreeNode {
		match self.slots.get_mut(id.0) {
			Some(Some(entry)) => &mut entry.node,
			_ => panic!("node {:?} is not allocated", id),
		}
	}
}
