//! Backend listing command

use anyhow::Result;

use rawgrade_compute::{describe_backends, select_best_backend};
use rawgrade_pipeline::Config;

pub fn run(config: &Config) -> Result<()> {
    print!("{}", describe_backends());
    println!("Auto selects: {}", select_best_backend());

    let ctx = config.render_context();
    let limits = ctx.limits();
    println!(
        "Active: {} (requested {}), max texture {}, ~{} MB available",
        ctx.backend_name(),
        config.backend,
        limits.max_texture_dim,
        limits.available_memory >> 20
    );
    Ok(())
}
