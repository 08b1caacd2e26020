use image::error::ImageError;

use octree_palette::{quantize_to_palette, InsertError, Palette, Quantizer, QuantizerConfig};

/// Helper function for `main`.
fn error_exit(msg: &str, code: i32) -> ! {
	eprintln!("{}", msg);
	std::process::exit(code)
}

fn parse_arg(matches: &clap::ArgMatches, name: &str, default: usize) -> usize {
	match matches.value_of(name).map(str::parse::<usize>).unwrap_or(Ok(default)) {
		Ok(n) => n,
		Err(_) => error_exit(&format!("Non-numeric value for {}", name), 2)
	}
}

/// `clap`-based CLI for extracting a palette from an image.
///
/// May exit process with status code if there are errors:
///
/// 1: `clap` error
///
/// 2: invalid arguments
///
/// 3: file I/O issues
///
/// 4: invalid image data
///
/// 5: computation limits exceeded
///
/// 6: internal reduction failure
///
/// 10: other, potentially unknown error
fn main() {
	env_logger::init();

	let clap_matches = clap::App::new("octree_palette")
		.version(env!("CARGO_PKG_VERSION"))
		.author("vkcz")
		.about("Extracts the dominant colors of an image with a bounded octree.")
		.arg_from_usage("-c, --colors=[N] 'Maximum number of octree leaves kept while reading; defaults to 16'")
		.arg_from_usage("-n, --top=[N] 'Number of palette entries to print; defaults to 4'")
		.arg_from_usage("-o, --output=[FILE] 'Also write the image remapped onto every leaf color'")
		.arg_from_usage("<INPUT> 'Path to input image'")
		.get_matches();

	let defaults = QuantizerConfig::default();
	let config = QuantizerConfig {
		max_colors: parse_arg(&clap_matches, "colors", defaults.max_colors),
		top_n: parse_arg(&clap_matches, "top", defaults.top_n),
	};

	let input_path = match clap_matches.value_of("INPUT") {
		Some(p) => p,
		None => error_exit("No input file given", 2)
	};
	let source = match image::open(input_path) {
		Ok(i) => i,
		Err(e) => {
			let (msg, code) = match e {
				ImageError::Decoding(_) => ("Invalid image data", 4),
				ImageError::Limits(_) => ("Computation limits exceeded", 5),
				ImageError::IoError(_) => ("File not found or could not be read", 3),
				_ => ("An error occurred", 10)
			};
			error_exit(msg, code)
		}
	}.into_rgb8();
	log::info!("read {}x{} image from {}", source.width(), source.height(), input_path);

	let mut quantizer = match Quantizer::with_config(config) {
		Ok(q) => q,
		Err(e) => error_exit(&e.to_string(), 2)
	};
	match quantizer.insert_image(&source) {
		Ok(()) => (),
		Err(e @ InsertError::ReductionExhausted { .. }) => error_exit(&e.to_string(), 6),
		Err(e) => error_exit(&e.to_string(), 10)
	}
	log::info!(
		"{} pixels reduced to {} leaves",
		quantizer.pixel_count(),
		quantizer.leaf_count()
	);

	for entry in quantizer.palette() {
		println!("{} {}", entry, entry.weight);
	}

	if let Some(output_path) = clap_matches.value_of("output") {
		let palette = Palette::from(&quantizer.full_palette()[..]);
		let rendered = quantize_to_palette(&source, &palette)
			.and_then(|indices| palette.render(&indices, source.width(), source.height()));
		let output = match rendered {
			Ok(img) => img,
			Err(e) => error_exit(&e.to_string(), 4)
		};
		match output.save(output_path) {
			Ok(_) => (),
			Err(_) => error_exit("Could not save output", 3)
		}
	}
}
