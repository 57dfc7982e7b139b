use clap::Parser;
use std::error::Error;
use std::time::Instant;

use hex_tiling::params::HexTilingParams;
use hex_tiling::procedural::{self, ProceduralConfig};
use hex_tiling::render::{self, RenderSettings};
use hex_tiling::texture::{ColorSpace, ImageTexture};
use hex_tiling::DetileError;

#[derive(Parser, Debug)]
#[command(name = "hex_tiling")]
#[command(about = "Render a texture across a large surface with hexagonal tile-breaking")]
struct Args {
    /// Input texture (a seamless procedural texture is generated if omitted)
    #[arg(short, long)]
    input: Option<String>,

    /// Output image path
    #[arg(short, long, default_value = "detiled.png")]
    output: String,

    /// Width of the output in pixels
    #[arg(short = 'W', long, default_value = "1024")]
    width: u32,

    /// Height of the output in pixels
    #[arg(short = 'H', long, default_value = "1024")]
    height: u32,

    /// Texture periods across the output width
    #[arg(short, long, default_value = "8")]
    repeat: f32,

    /// Treat the input as non-color data (normal/roughness maps): blend without gamma
    #[arg(long)]
    linear: bool,

    /// JSON file with tiling parameters (camelCase keys, all optional)
    #[arg(long)]
    params: Option<String>,

    /// Hex patch scale, larger = smaller patches (default: 2)
    #[arg(long)]
    patch_scale: Option<f32>,

    /// Disable contrast-corrected blending
    #[arg(long)]
    no_contrast_correction: bool,

    /// Coefficient under which texture lookups are skipped (default: 0.01)
    #[arg(long)]
    skip_threshold: Option<f32>,

    /// Exponent applied to blend weights before the skip test (default: 8)
    #[arg(long)]
    exponent: Option<f32>,

    /// Also write a plain-tiling render to this path
    #[arg(long)]
    export_plain: Option<String>,

    /// Also write a plain | hex side-by-side comparison to this path
    #[arg(long)]
    export_comparison: Option<String>,

    /// Seed for the procedural texture (random if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Edge length of the procedural texture
    #[arg(long, default_value = "256")]
    texture_size: u32,
}

fn load_texture(args: &Args) -> Result<ImageTexture, DetileError> {
    let color_space = if args.linear { ColorSpace::Linear } else { ColorSpace::Srgb };

    match &args.input {
        Some(path) => {
            println!("Loading texture {}...", path);
            let img = image::open(path)?;
            ImageTexture::from_image(&img, color_space).ok_or_else(|| DetileError::EmptyTexture(path.clone()))
        }
        None => {
            let seed = args.seed.unwrap_or_else(|| rand::random());
            println!("Generating procedural texture with seed: {}", seed);
            let config = ProceduralConfig {
                size: args.texture_size,
                ..ProceduralConfig::default()
            };
            procedural::generate_texture(&config, seed)
                .ok_or_else(|| DetileError::EmptyTexture("procedural".to_string()))
        }
    }
}

fn tiling_params(args: &Args) -> Result<HexTilingParams, DetileError> {
    let mut flags = HexTilingParams {
        patch_scale: args.patch_scale,
        use_contrast_corrected_blending: None,
        lookup_skip_threshold: args.skip_threshold,
        texture_sample_coefficient_exponent: args.exponent,
    };
    if args.no_contrast_correction {
        flags.use_contrast_corrected_blending = Some(false);
    }

    match &args.params {
        Some(path) => {
            println!("Loading parameters from {}...", path);
            Ok(flags.or(HexTilingParams::load(path)?))
        }
        None => Ok(flags),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let texture = load_texture(&args)?;
    println!("Texture size: {}x{}", texture.width, texture.height);

    let (config, adjustments) = tiling_params(&args)?.resolve_with_report();
    for adjustment in &adjustments {
        eprintln!("Warning: {}", adjustment);
    }
    println!(
        "Tiling: patch scale {}, contrast correction {}, skip threshold {}, exponent {}",
        config.patch_scale,
        if config.use_contrast_corrected_blending { "on" } else { "off" },
        config.lookup_skip_threshold,
        config.texture_sample_coefficient_exponent,
    );

    let settings = RenderSettings {
        width: args.width,
        height: args.height,
        repeat: args.repeat,
    };
    println!("Output size: {}x{} ({} periods across)", settings.width, settings.height, settings.repeat);

    println!("Rendering hex tiling...");
    let start = Instant::now();
    let (detiled, stats) = render::render_detiled(&texture, &settings, &config);
    println!("  Rendered in {:?}", start.elapsed());
    println!("  Average lookups per pixel: {:.3}", stats.average_lookups());

    render::save_image(&detiled, &args.output)?;
    println!("Saved {}", args.output);

    if args.export_plain.is_some() || args.export_comparison.is_some() {
        println!("Rendering plain tiling...");
        let plain = render::render_plain(&texture, &settings);

        if let Some(path) = &args.export_plain {
            render::save_image(&plain, path)?;
            println!("Saved {}", path);
        }
        if let Some(path) = &args.export_comparison {
            let comparison = render::side_by_side(&plain, &detiled, 8);
            render::save_image(&comparison, path)?;
            println!("Saved {}", path);
        }
    }

    Ok(())
}
