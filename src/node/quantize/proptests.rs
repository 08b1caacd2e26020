use super::*;

use proptest::prelude::*;
use std::collections::BTreeSet;

/// Walks the whole tree and checks every structural invariant.
///
/// Returns the summed statistics of all leaves.
fn validate_tree(q: &Quantizer) -> LeafStats {
	let mut total = LeafStats::default();
	let mut leaves = 0usize;
	let mut reachable = 0usize;
	let mut indexed = BTreeSet::new();
	let mut stack = vec![(q.root, 0usize)];
	let mut subtree_counts = Vec::new();
	while let Some((id, depth)) = stack.pop() {
		reachable += 1;
		assert_eq!(q.arena.depth(id), Some(depth), "stored depth must match position");
		match &q.arena[id] {
			OctreeNode::Leaf(stats) => {
				assert!(depth <= MAX_DEPTH, "leaf below the last level");
				assert!(stats.count > 0, "reachable leaf without pixels");
				total.absorb(stats);
				leaves += 1;
			}
			OctreeNode::Internal(branch) => {
				assert!(depth < MAX_DEPTH, "internal node at the last level");
				let key = RankKey::of(id, branch);
				if branch.has_children() {
					assert!(q.index.contains(depth, &key), "mergeable node missing from index");
					indexed.insert((depth, key));
				} else {
					assert_eq!(id, q.root, "only the empty root may be childless");
					assert_eq!(branch.count, 0);
				}
				subtree_counts.push((id, branch.count));
				for child in branch.children() {
					stack.push((child, depth + 1));
				}
			}
		}
	}
	for (id, count) in subtree_counts {
		assert_eq!(count, leaf_sum(q, id), "internal count must equal its leaves' counts");
	}
	assert_eq!(q.index.len(), indexed.len(), "index holds unreachable nodes");
	assert_eq!(q.leaf_count, leaves, "leaf_count must track reachable leaves");
	assert_eq!(q.arena.live_count(), reachable, "released nodes must not stay allocated");
	assert!(q.leaf_count <= q.config.max_colors);
	total
}

fn leaf_sum(q: &Quantizer, id: NodeId) -> u64 {
	match &q.arena[id] {
		OctreeNode::Leaf(stats) => stats.count,
		OctreeNode::Internal(branch) => branch.children().map(|c| leaf_sum(q, c)).sum(),
	}
}

fn sample_strategy() -> impl Strategy<Value = ColorSample> {
	any::<[u8; 3]>().prop_map(::image::Rgb)
}

/// Samples drawn from a handful of colors, so leaves collect repeats.
fn clustered_strategy() -> impl Strategy<Value = Vec<ColorSample>> {
	prop::collection::vec(sample_strategy(), 1..6).prop_flat_map(|seeds| {
		let n = seeds.len();
		prop::collection::vec(0..n, 0..200)
			.prop_map(move |picks| picks.into_iter().map(|i| seeds[i]).collect::<Vec<_>>())
	})
}

proptest! {
	#[test]
	fn bound_holds_after_every_insert(
		max_colors in 1usize..24,
		samples in prop::collection::vec(sample_strategy(), 0..300)
	) {
		let mut q = Quantizer::new(max_colors).unwrap();
		let mut expected = LeafStats::default();
		for sample in samples {
			q.insert(sample).unwrap();
			expected.accumulate(sample);
			prop_assert!(q.leaf_count() <= max_colors);
		}
		let total = validate_tree(&q);
		prop_assert_eq!(total, expected);
		prop_assert_eq!(total.count, q.pixel_count());
	}

	#[test]
	fn merges_conserve_sums(
		max_colors in 2usize..12,
		samples in prop::collection::vec(sample_strategy(), 1..200)
	) {
		let mut q = Quantizer::new(64).unwrap();
		q.insert_all(samples.iter().copied()).unwrap();
		let before = validate_tree(&q);
		while q.leaf_count() > max_colors {
			let leaves = q.leaf_count();
			let freed = q.reduce_once().unwrap();
			prop_assert!(freed >= 1);
			prop_assert_eq!(q.leaf_count(), leaves - freed);
			prop_assert_eq!(validate_tree(&q), before);
		}
	}

	#[test]
	fn runs_are_deterministic(
		max_colors in 1usize..20,
		samples in clustered_strategy(),
		top_n in 0usize..10
	) {
		let mut a = Quantizer::new(max_colors).unwrap();
		let mut b = Quantizer::new(max_colors).unwrap();
		a.insert_all(samples.iter().copied()).unwrap();
		b.insert_all(samples.iter().copied()).unwrap();
		let first = a.extract_palette(top_n);
		prop_assert_eq!(&first, &b.extract_palette(top_n));
		prop_assert_eq!(&first, &a.extract_palette(top_n));
		prop_assert!(first.len() <= top_n.min(max_colors));
		prop_assert!(first.windows(2).all(|w| w[0].weight >= w[1].weight));

		// A reset tree replays identically.
		a.reset();
		prop_assert!(a.extract_palette(top_n).is_empty());
		a.insert_all(samples.iter().copied()).unwrap();
		prop_assert_eq!(&first, &a.extract_palette(top_n));
	}

	#[test]
	fn palette_weights_cover_every_pixel(
		max_colors in 1usize..16,
		samples in clustered_strategy()
	) {
		let mut q = Quantizer::new(max_colors).unwrap();
		q.insert_all(samples.iter().copied()).unwrap();
		let full = q.full_palette();
		prop_assert_eq!(full.iter().map(|e| e.weight).sum::<u64>(), samples.len() as u64);
		validate_tree(&q);
	}
}
