//! The color pipeline: ordered stages, LUT grade, optional upscale.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use rawgrade_compute::{RasterImage, RenderContext, SpatialUpscaler};
use rawgrade_lut::LutRegistry;

use crate::session::CancelToken;
use crate::stages::Stage;
use crate::{AdjustmentSet, RenderError, RenderResult};

/// Renders an image through the fixed stage order.
///
/// The context and registry are injected so tests and the CLI can each
/// build their own.
#[derive(Debug)]
pub struct ColorPipeline {
    context: RenderContext,
    registry: Arc<LutRegistry>,
    upscaler: SpatialUpscaler,
}

impl ColorPipeline {
    pub fn new(context: RenderContext, registry: Arc<LutRegistry>) -> Self {
        let upscaler = SpatialUpscaler::new(&context);
        Self { context, registry, upscaler }
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    pub fn registry(&self) -> &Arc<LutRegistry> {
        &self.registry
    }

    pub fn upscaler(&self) -> &SpatialUpscaler {
        &self.upscaler
    }

    /// Stages a render with `adj` would run, in order.
    pub fn plan(adj: &AdjustmentSet) -> Vec<Stage> {
        if !adj.needs_grading() {
            return Vec::new();
        }
        Stage::plan(adj)
    }

    /// Render `image` with `adj`.
    pub fn render(&self, image: &RasterImage, adj: &AdjustmentSet) -> RenderResult<RasterImage> {
        self.render_with_cancel(image, adj, &CancelToken::new())
    }

    /// Render, checking `cancel` before every stage.
    ///
    /// A stage that fails leaves the running image unchanged and the render
    /// continues. When upscaling is enabled but refused, the graded image is
    /// returned at its original size.
    pub fn render_with_cancel(
        &self,
        image: &RasterImage,
        adj: &AdjustmentSet,
        cancel: &CancelToken,
    ) -> RenderResult<RasterImage> {
        if image.is_empty() {
            return Err(RenderError::DecodeFailed(format!(
                "empty raster ({}x{})",
                image.width(),
                image.height()
            )));
        }

        let mut out = image.clone();
        let plan = Self::plan(adj);
        if plan.is_empty() {
            debug!(width = image.width(), height = image.height(), "no grading needed");
        }

        for stage in plan {
            cancel.check()?;
            trace!(stage = %stage, "running stage");
            if stage == Stage::Lut {
                self.apply_lut(&mut out, adj);
            } else {
                stage.apply_cpu(&mut out, adj);
            }
        }

        if adj.upscaling_enabled {
            cancel.check()?;
            let factor = adj.upscale_factor();
            match self.upscaler.upscale(&out, factor) {
                Some(up) => out = up,
                None => debug!(factor, "upscale refused, keeping original size"),
            }
        }

        cancel.check()?;
        Ok(out)
    }

    fn apply_lut(&self, image: &mut RasterImage, adj: &AdjustmentSet) {
        let Some(lut) = self.registry.resolve(&adj.lut_id) else {
            warn!(id = %adj.lut_id, "LUT did not resolve, stage skipped");
            return;
        };
        let intensity = adj.lut_intensity.clamp(0.0, 1.0);

        match self.context.backend().apply_lut3d(image, &lut, intensity) {
            Ok(graded) => *image = graded,
            Err(e) => warn!(
                stage = %Stage::Lut,
                backend = self.context.backend_name(),
                error = %e,
                "stage failed, image left unchanged"
            ),
        }
    }
}
