//! Profiling tool for the lookup-skipping trade-off

use std::time::Instant;

use hex_tiling::params::HexTilingParams;
use hex_tiling::procedural::{self, ProceduralConfig};
use hex_tiling::render::{self, RenderSettings};

fn main() {
    let seed = 1337u64;
    let settings = RenderSettings {
        width: 1024,
        height: 1024,
        repeat: 8.0,
    };

    println!("=== Hex Tiling Profiling ===");
    println!("Output size: {}x{} ({} pixels)", settings.width, settings.height, settings.width * settings.height);
    println!();

    let Some(texture) = procedural::generate_texture(&ProceduralConfig::default(), seed) else {
        eprintln!("Warning: procedural texture came out empty");
        return;
    };

    let start = Instant::now();
    let _plain = render::render_plain(&texture, &settings);
    let plain_time = start.elapsed();
    println!("Plain tiling baseline: {:?}", plain_time);
    println!();

    let thresholds = [0.0f32, 0.01, 0.05, 0.2, 0.5];
    let exponents = [1.0f32, 4.0, 8.0, 16.0];

    println!("{:>10} {:>10} {:>16} {:>14}", "threshold", "exponent", "lookups/pixel", "time");
    println!("─────────────────────────────────────────────────────");
    for &threshold in &thresholds {
        for &exponent in &exponents {
            let config = HexTilingParams::default()
                .lookup_skip_threshold(threshold)
                .coefficient_exponent(exponent)
                .resolve();

            let start = Instant::now();
            let (_img, stats) = render::render_detiled(&texture, &settings, &config);
            let elapsed = start.elapsed();

            println!(
                "{:>10.2} {:>10.1} {:>16.3} {:>14}",
                threshold,
                exponent,
                stats.average_lookups(),
                format!("{:?}", elapsed)
            );
        }
    }
}
