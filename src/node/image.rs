use std::collections::HashMap;

use super::error::{InsertError, RemapError};
use super::quantize::palette::Palette;
use super::quantize::Quantizer;

impl Quantizer {
	/// Feeds every pixel of `img` into the tree in row-major order.
	pub fn insert_image(&mut self, img: &image::RgbImage) -> Result<(), InsertError> {
		self.insert_all(img.pixels().copied())
	}
}

/// Maps each pixel of an image to the index of the closest palette color.
///
/// Indices are in row-major order, one per pixel.
pub fn quantize_to_palette(
	img: &image::RgbImage,
	palette: &Palette
) -> Result<Vec<u32>, RemapError> {
	if palette.is_empty() {
		return Err(RemapError::EmptyPalette);
	}
	let mut quant_cache = HashMap::new();
	Ok(img.pixels()
		.map(|pix| {
			*quant_cache.entry(*pix)
				.or_insert_with(|| palette.nearest(pix).unwrap_or(0))
		})
		.collect::<Vec<_>>())
}

impl Palette {
	/// Builds an image of the given size from palette indices in row-major order.
	pub fn render(
		&self,
		indices: &[u32],
		width: u32,
		height: u32
	) -> Result<image::RgbImage, RemapError> {
		if indices.len() != width as usize * height as usize {
			return Err(RemapError::DimensionMismatch { len: indices.len(), width, height });
		}
		let mut output = image::RgbImage::new(width, height);
		for (pixel, &index) in output.pixels_mut().zip(indices.iter()) {
			*pixel = match self.get(index) {
				Some(c) => c,
				None => return Err(RemapError::IndexOutOfRange { index, len: self.len() }),
			};
		}
		Ok(output)
	}
}
