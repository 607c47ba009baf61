//! Single-flight rendering for one image.
//!
//! Each [`RenderSession::submit`] cancels the in-flight render, bumps the
//! generation and spawns a new render on the rayon pool. Finished renders
//! come back over a channel and are applied only by
//! [`RenderSession::process_events`] (or [`RenderSession::wait_for`], which
//! drains the same channel). A result whose generation is no longer the
//! latest is dropped, so the published image always reflects the last
//! request.
//!
//! Interactive callers can go through [`RenderSession::edit`] instead of
//! `submit`: edits are held in a [`Debouncer`] and only the last one of a
//! burst is submitted, by `process_events`, once the window has passed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use rawgrade_compute::RasterImage;

use crate::{AdjustmentSet, ColorPipeline, RenderError, RenderResult};

/// Generation counter for invalidating stale results.
pub type Generation = u64;

/// Cooperative cancel flag shared with a running render.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// `Err(Cancelled)` once cancelled.
    pub fn check(&self) -> RenderResult<()> {
        if self.is_cancelled() {
            Err(RenderError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// A finished render on its way back to the session.
struct Completed {
    generation: Generation,
    adjustments: AdjustmentSet,
    result: RenderResult<RasterImage>,
}

/// Owns the source image and the published render for one image.
pub struct RenderSession {
    pipeline: Arc<ColorPipeline>,
    source: Arc<RasterImage>,
    current: Arc<RasterImage>,
    adjustments: AdjustmentSet,
    latest: Generation,
    applied: Generation,
    failed: Option<(Generation, RenderError)>,
    inflight: Option<CancelToken>,
    debouncer: Debouncer,
    tx: Sender<Completed>,
    rx: Receiver<Completed>,
}

impl RenderSession {
    /// Start a session showing `source` unmodified.
    pub fn new(pipeline: Arc<ColorPipeline>, source: RasterImage) -> Self {
        let (tx, rx) = mpsc::channel();
        let source = Arc::new(source);
        Self {
            pipeline,
            current: Arc::clone(&source),
            source,
            adjustments: AdjustmentSet::default(),
            latest: 0,
            applied: 0,
            failed: None,
            inflight: None,
            debouncer: Debouncer::default(),
            tx,
            rx,
        }
    }

    /// Replace the coalescing window used by [`edit`](Self::edit).
    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.debouncer = Debouncer::new(window);
        self
    }

    /// Request a render with `adjustments`. Supersedes any earlier request.
    pub fn submit(&mut self, adjustments: AdjustmentSet) -> Generation {
        if let Some(prev) = self.inflight.take() {
            prev.cancel();
        }
        self.latest += 1;
        let generation = self.latest;
        let token = CancelToken::new();
        self.inflight = Some(token.clone());

        let pipeline = Arc::clone(&self.pipeline);
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        debug!(generation, "render submitted");

        rayon::spawn(move || {
            let result = pipeline.render_with_cancel(&source, &adjustments, &token);
            // The session may be gone; nothing to deliver to then.
            let _ = tx.send(Completed { generation, adjustments, result });
        });
        generation
    }

    /// Queue an edit. It is submitted once no further edit arrives within
    /// the debounce window.
    pub fn edit(&mut self, adjustments: AdjustmentSet) {
        self.edit_at(adjustments, Instant::now());
    }

    pub fn edit_at(&mut self, adjustments: AdjustmentSet, now: Instant) {
        self.debouncer.push_at(adjustments, now);
    }

    /// True while an edit waits for its window to pass.
    pub fn has_pending_edit(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Submit the queued edit if its window has passed.
    pub fn submit_settled_at(&mut self, now: Instant) -> Option<Generation> {
        let adjustments = self.debouncer.poll_at(now)?;
        Some(self.submit(adjustments))
    }

    /// Submit the queued edit now, regardless of the window.
    pub fn flush_edits(&mut self) -> Option<Generation> {
        let adjustments = self.debouncer.flush()?;
        Some(self.submit(adjustments))
    }

    /// Submit a settled edit, then apply finished renders. Returns true if the
    /// published image changed.
    pub fn process_events(&mut self) -> bool {
        self.submit_settled_at(Instant::now());
        let mut published = false;
        while let Ok(done) = self.rx.try_recv() {
            published |= self.apply(done);
        }
        published
    }

    /// Block until `generation` is applied.
    ///
    /// Returns `Cancelled` if a newer request superseded it, `NotSubmitted`
    /// for a generation that was never issued, or the render's own error.
    pub fn wait_for(&mut self, generation: Generation) -> RenderResult<Arc<RasterImage>> {
        if generation > self.latest {
            return Err(RenderError::NotSubmitted(generation));
        }
        loop {
            if generation < self.latest {
                return Err(RenderError::Cancelled);
            }
            if self.applied >= generation {
                return Ok(Arc::clone(&self.current));
            }
            if let Some((failed, err)) = &self.failed {
                if *failed == generation {
                    return Err(err.clone());
                }
            }
            match self.rx.recv() {
                Ok(done) => {
                    self.apply(done);
                }
                Err(_) => return Err(RenderError::Cancelled),
            }
        }
    }

    /// Drop all edits and republish the source.
    pub fn reset(&mut self) {
        if let Some(prev) = self.inflight.take() {
            prev.cancel();
        }
        self.debouncer.flush();
        self.latest += 1;
        self.applied = self.latest;
        self.failed = None;
        self.adjustments.reset();
        self.current = Arc::clone(&self.source);
        debug!(generation = self.latest, "session reset");
    }

    /// The published image.
    pub fn current(&self) -> Arc<RasterImage> {
        Arc::clone(&self.current)
    }

    /// Adjustments the published image was rendered with.
    pub fn adjustments(&self) -> &AdjustmentSet {
        &self.adjustments
    }

    pub fn source(&self) -> &Arc<RasterImage> {
        &self.source
    }

    pub fn latest_generation(&self) -> Generation {
        self.latest
    }

    pub fn applied_generation(&self) -> Generation {
        self.applied
    }

    /// Error of the latest render, if it failed.
    pub fn last_error(&self) -> Option<&RenderError> {
        self.failed
            .as_ref()
            .filter(|(g, _)| *g == self.latest)
            .map(|(_, e)| e)
    }

    /// True while the latest request has not finished.
    pub fn is_rendering(&self) -> bool {
        self.applied < self.latest && self.last_error().is_none()
    }

    fn apply(&mut self, done: Completed) -> bool {
        if done.generation != self.latest {
            trace!(generation = done.generation, latest = self.latest, "discarding stale render");
            return false;
        }
        self.inflight = None;
        match done.result {
            Ok(image) => {
                self.current = Arc::new(image);
                self.adjustments = done.adjustments;
                self.applied = done.generation;
                true
            }
            Err(RenderError::Cancelled) => false,
            Err(err) => {
                warn!(generation = done.generation, error = %err, "render failed");
                self.failed = Some((done.generation, err));
                false
            }
        }
    }
}

impl std::fmt::Debug for RenderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderSession")
            .field("source", &self.source.dimensions())
            .field("latest", &self.latest)
            .field("applied", &self.applied)
            .finish()
    }
}

/// Coalesces bursts of edits: only the last set pushed within `window` of
/// the previous push is released.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    pending: Option<(AdjustmentSet, Instant)>,
}

impl Debouncer {
    /// Default coalescing window.
    pub const DEFAULT_WINDOW: Duration = Duration::from_millis(100);

    pub fn new(window: Duration) -> Self {
        Self { window, pending: None }
    }

    pub fn push_at(&mut self, adjustments: AdjustmentSet, now: Instant) {
        self.pending = Some((adjustments, now));
    }

    /// The pending set, once `window` has passed since the last push.
    pub fn poll_at(&mut self, now: Instant) -> Option<AdjustmentSet> {
        match &self.pending {
            Some((_, pushed)) if now.saturating_duration_since(*pushed) >= self.window => {
                self.pending.take().map(|(adj, _)| adj)
            }
            _ => None,
        }
    }

    /// Release the pending set immediately.
    pub fn flush(&mut self) -> Option<AdjustmentSet> {
        self.pending.take().map(|(adj, _)| adj)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        let shared = token.clone();
        assert!(token.check().is_ok());
        shared.cancel();
        assert_eq!(token.check(), Err(RenderError::Cancelled));
    }

    #[test]
    fn test_debouncer_coalesces() {
        let start = Instant::now();
        let mut d = Debouncer::default();

        d.push_at(AdjustmentSet { exposure: 0.1, ..Default::default() }, start);
        d.push_at(AdjustmentSet { exposure: 0.2, ..Default::default() }, start + Duration::from_millis(40));
        assert!(d.poll_at(start + Duration::from_millis(100)).is_none());

        let released = d.poll_at(start + Duration::from_millis(140)).unwrap();
        assert_eq!(released.exposure, 0.2);
        assert!(!d.is_pending());
    }

    #[test]
    fn test_debouncer_flush() {
        let now = Instant::now();
        let mut d = Debouncer::new(Duration::from_secs(60));
        d.push_at(AdjustmentSet::default(), now);
        assert!(d.poll_at(now + Duration::from_secs(1)).is_none());
        assert!(d.flush().is_some());
        assert!(d.flush().is_none());
    }
}
