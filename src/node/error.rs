use thiserror::Error;

/// Reason why a quantizer couldn't be constructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
	/// The leaf budget must allow at least one color.
	#[error("max_colors must be at least 1")]
	ZeroMaxColors,
}

/// Reason why a sample couldn't be inserted into the octree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsertError {
	/// A channel value is outside `0..=255`. The tree is left untouched.
	#[error("{channel} channel value {value} is outside 0..=255")]
	InvalidSample {
		channel: Channel,
		value: i32,
	},
	/// The leaf budget is exceeded but no internal node is left to merge.
	///
	/// This indicates broken bookkeeping rather than bad input.
	#[error("no reducible node left with {leaf_count} leaves over a budget of {max_colors}")]
	ReductionExhausted {
		leaf_count: usize,
		max_colors: usize,
	},
}

/// One of the three color channels, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
	Red,
	Green,
	Blue,
}

impl std::fmt::Display for Channel {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			Channel::Red => "red",
			Channel::Green => "green",
			Channel::Blue => "blue",
		})
	}
}

/// Reason why pixels couldn't be mapped onto a palette, or a mapping rendered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemapError {
	/// There are no colors to map onto.
	#[error("palette is empty")]
	EmptyPalette,
	/// An index refers past the end of the palette.
	#[error("palette index {index} is out of range for {len} colors")]
	IndexOutOfRange {
		index: u32,
		len: usize,
	},
	/// The number of indices doesn't match the requested dimensions.
	#[error("{len} indices cannot fill a {width}x{height} image")]
	DimensionMismatch {
		len: usize,
		width: u32,
		height: u32,
	},
}
