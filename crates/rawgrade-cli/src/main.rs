//! rawgrade - color-adjustment and LUT rendering from the command line

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use rawgrade_compute::Backend;
use rawgrade_pipeline::Config;

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "rawgrade")]
#[command(author, version, about = "Color-adjustment and LUT rendering pipeline")]
#[command(long_about = "
Grades raster images with exposure, white balance, tone and color controls,
an optional 3D LUT and an optional spatial upscale. Runs on the GPU through
wgpu when an adapter is available, otherwise on the CPU.

Examples:
  rawgrade render photo.png -o out.png --exposure 0.5 --contrast 1.2
  rawgrade render photo.tif -o out.tif --adjustments look.json
  rawgrade render photo.png -o out.png --lut bundle:Warm --lut-intensity 0.6
  rawgrade render photo.png -o big.png --upscale 1
  rawgrade luts import film.cube
  rawgrade luts list
  rawgrade factors photo.png
  rawgrade backends
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Number of threads (0 = auto)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,

    /// Compute backend: auto, cpu, wgpu
    #[arg(long, global = true)]
    backend: Option<Backend>,

    /// Data directory (preferences and imported LUTs)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Directory of read-only .cube presets
    #[arg(long, global = true)]
    bundle_dir: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Environment config with command-line overrides applied.
    fn config(&self) -> Config {
        let mut config = Config::from_env();
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(dir) = &self.bundle_dir {
            config.bundle_dir = Some(dir.clone());
        }
        config
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Grade an image
    #[command(visible_alias = "r")]
    Render(RenderArgs),

    /// Manage LUTs
    #[command(subcommand)]
    Luts(LutsCommand),

    /// List compute backends
    Backends,

    /// Show which upscale factors an image allows
    Factors(FactorsArgs),
}

#[derive(Args)]
pub struct RenderArgs {
    /// Input image (PNG, JPEG, TIFF)
    pub input: PathBuf,

    /// Output image
    #[arg(short, long)]
    pub output: PathBuf,

    /// JSON file with adjustments; flags below override its values
    #[arg(short, long)]
    pub adjustments: Option<PathBuf>,

    /// Exposure in stops [-2, 2]
    #[arg(long, allow_hyphen_values = true)]
    pub exposure: Option<f32>,

    /// Brightness [-1, 1]
    #[arg(long, allow_hyphen_values = true)]
    pub brightness: Option<f32>,

    /// Contrast [0.5, 2]
    #[arg(long)]
    pub contrast: Option<f32>,

    /// Saturation [0, 2]
    #[arg(long)]
    pub saturation: Option<f32>,

    /// Highlights [0, 2]
    #[arg(long)]
    pub highlights: Option<f32>,

    /// Shadows [-1, 1]
    #[arg(long, allow_hyphen_values = true)]
    pub shadows: Option<f32>,

    /// White point the image was shot under, in Kelvin
    #[arg(long)]
    pub reference_temperature: Option<f32>,

    /// Tint the image was shot under
    #[arg(long, allow_hyphen_values = true)]
    pub reference_tint: Option<f32>,

    /// Target white point in Kelvin [2000, 10000]
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Target tint [-100, 100]
    #[arg(long, allow_hyphen_values = true)]
    pub tint: Option<f32>,

    /// Sharpening [0, 2]
    #[arg(long)]
    pub sharpness: Option<f32>,

    /// Vibrance [-1, 1]
    #[arg(long, allow_hyphen_values = true)]
    pub vibrance: Option<f32>,

    /// Hue rotation in degrees [-180, 180]
    #[arg(long, allow_hyphen_values = true)]
    pub hue: Option<f32>,

    /// Tone curve y values: blacks,shadows,mids,highlights,whites
    #[arg(long, value_delimiter = ',')]
    pub curve: Option<Vec<f32>>,

    /// Enable noise reduction
    #[arg(long)]
    pub denoise: bool,

    /// Noise threshold [0, 0.1]
    #[arg(long)]
    pub noise_level: Option<f32>,

    /// Detail restored after denoise [0, 2]
    #[arg(long)]
    pub noise_sharpness: Option<f32>,

    /// LUT id (bundle:<name> or import:<uuid>); enables the LUT
    #[arg(short, long)]
    pub lut: Option<String>,

    /// LUT intensity [0, 1]
    #[arg(long)]
    pub lut_intensity: Option<f32>,

    /// Upscale mode: 0 = 1.5x, 1 = 2x, 2 = 3x
    #[arg(short, long)]
    pub upscale: Option<u32>,
}

#[derive(Subcommand)]
pub enum LutsCommand {
    /// List every selectable LUT
    #[command(visible_alias = "ls")]
    List,

    /// Copy a .cube file into the managed store
    Import {
        /// .cube file
        file: PathBuf,
    },
}

#[derive(Args)]
pub struct FactorsArgs {
    /// Input image
    pub input: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init(cli.verbose, cli.log_file.as_deref())?;

    // Configure thread pool
    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    let config = cli.config();
    match cli.command {
        Commands::Render(args) => commands::render::run(args, &config),
        Commands::Luts(cmd) => commands::luts::run(cmd, &config),
        Commands::Backends => commands::backends::run(&config),
        Commands::Factors(args) => commands::factors::run(args, &config),
    }
}
