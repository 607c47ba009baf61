//! Render command

use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use rawgrade_lut::LutId;
use rawgrade_pipeline::{AdjustmentSet, Config, RenderSession, ToneCurve};

use crate::RenderArgs;

pub fn run(args: RenderArgs, config: &Config) -> Result<()> {
    let adjustments = build_adjustments(&args)?;
    let image = super::load_image(&args.input)?;
    debug!(
        input = %args.input.display(),
        width = image.width(),
        height = image.height(),
        ?adjustments,
        "render"
    );

    let pipeline = Arc::new(config.build_pipeline());
    info!(backend = pipeline.context().backend_name(), "pipeline ready");

    let mut session = RenderSession::new(pipeline, image);
    let generation = session.submit(adjustments);
    let result = session
        .wait_for(generation)
        .with_context(|| format!("Failed to render {}", args.input.display()))?;

    super::save_image(&args.output, &result)?;
    println!(
        "{} -> {} ({}x{})",
        args.input.display(),
        args.output.display(),
        result.width(),
        result.height()
    );
    Ok(())
}

/// Adjustments from the JSON file (if any) with flags applied on top.
fn build_adjustments(args: &RenderArgs) -> Result<AdjustmentSet> {
    let mut adj = match &args.adjustments {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read: {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Invalid adjustments in {}", path.display()))?
        }
        None => AdjustmentSet::default(),
    };

    // The target white point follows the reference unless set explicitly
    if let Some(t) = args.reference_temperature {
        adj.reference_temperature = t;
        adj.temperature = t;
    }
    if let Some(t) = args.reference_tint {
        adj.reference_tint = t;
        adj.tint = t;
    }

    let set = |field: &mut f32, value: Option<f32>| {
        if let Some(v) = value {
            *field = v;
        }
    };
    set(&mut adj.exposure, args.exposure);
    set(&mut adj.brightness, args.brightness);
    set(&mut adj.contrast, args.contrast);
    set(&mut adj.saturation, args.saturation);
    set(&mut adj.highlights, args.highlights);
    set(&mut adj.shadows, args.shadows);
    set(&mut adj.temperature, args.temperature);
    set(&mut adj.tint, args.tint);
    set(&mut adj.sharpness, args.sharpness);
    set(&mut adj.vibrance, args.vibrance);
    set(&mut adj.hue, args.hue);
    set(&mut adj.noise_level, args.noise_level);
    set(&mut adj.noise_sharpness, args.noise_sharpness);
    set(&mut adj.lut_intensity, args.lut_intensity);

    if let Some(ys) = &args.curve {
        let &[blacks, shadows, mids, highlights, whites] = ys.as_slice() else {
            bail!("--curve takes exactly 5 values, got {}", ys.len());
        };
        adj.tone_curve = ToneCurve { blacks, shadows, mids, highlights, whites };
    }
    if args.denoise {
        adj.noise_reduction_enabled = true;
    }
    if let Some(id) = &args.lut {
        if LutId::parse(id).is_none() {
            bail!("Invalid LUT id '{}': expected none, bundle:<name> or import:<uuid>", id);
        }
        adj.lut_id = id.clone();
        adj.lut_enabled = true;
    }
    if let Some(mode) = args.upscale {
        adj.upscale_mode = mode;
        adj.upscaling_enabled = true;
    }

    Ok(adj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: RenderArgs,
    }

    fn parse(argv: &[&str]) -> RenderArgs {
        let mut full = vec!["rawgrade", "in.png", "-o", "out.png"];
        full.extend_from_slice(argv);
        Wrapper::parse_from(full).args
    }

    #[test]
    fn test_defaults_without_flags() {
        assert!(build_adjustments(&parse(&[])).unwrap().is_default());
    }

    #[test]
    fn test_flags_applied() {
        let adj = build_adjustments(&parse(&[
            "--exposure", "-0.5", "--lut", "bundle:Warm", "--upscale", "2", "--curve", "0,0.2,0.5,0.8,1",
        ]))
        .unwrap();
        assert_eq!(adj.exposure, -0.5);
        assert!(adj.lut_enabled);
        assert_eq!(adj.upscale_factor(), 3.0);
        assert_eq!(adj.tone_curve.shadows, 0.2);
    }

    #[test]
    fn test_reference_moves_target() {
        let adj = build_adjustments(&parse(&["--reference-temperature", "5000"])).unwrap();
        assert!(!adj.white_balance_changed());
    }

    #[test]
    fn test_bad_inputs_rejected() {
        assert!(build_adjustments(&parse(&["--lut", "bogus"])).is_err());
        assert!(build_adjustments(&parse(&["--curve", "0,1"])).is_err());
    }

    #[test]
    fn test_json_file_then_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("look.json");
        fs::write(&path, r#"{"exposure": 1.0, "hue": 20.0}"#).unwrap();

        let adj = build_adjustments(&parse(&["-a", path.to_str().unwrap(), "--hue", "-10"])).unwrap();
        assert_eq!(adj.exposure, 1.0);
        assert_eq!(adj.hue, -10.0);
    }
}
