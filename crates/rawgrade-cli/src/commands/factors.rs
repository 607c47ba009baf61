//! Upscale factor query command

use anyhow::{Context, Result};

use rawgrade_compute::{SpatialUpscaler, upscaled_size};
use rawgrade_pipeline::Config;

use crate::FactorsArgs;

pub fn run(args: FactorsArgs, config: &Config) -> Result<()> {
    let (w, h) = image::image_dimensions(&args.input)
        .with_context(|| format!("Failed to read dimensions: {}", args.input.display()))?;

    let ctx = config.render_context();
    let factors = SpatialUpscaler::new(&ctx).available_factors(w, h);

    println!("{} ({}x{}), ceiling {}", args.input.display(), w, h, ctx.limits().max_texture_dim);
    for (mode, factor, allowed) in [
        (0, 1.5, factors.can_scale_1_5x),
        (1, 2.0, factors.can_scale_2x),
        (2, 3.0, factors.can_scale_3x),
    ] {
        let (dw, dh) = upscaled_size(w, h, factor);
        let mark = if allowed { "+" } else { "-" };
        println!("[{}] mode {}: {}x -> {}x{}", mark, mode, factor, dw, dh);
    }
    Ok(())
}
