//! Bounded octree color quantization.
//!
//! A [`Quantizer`] consumes pixel colors one at a time and never holds more
//! than a configured number of leaves, merging the least significant octree
//! nodes as it goes. Once the stream is consumed, the leaves can be ranked
//! into a palette of representative colors.

pub mod node;

pub use node::*;
