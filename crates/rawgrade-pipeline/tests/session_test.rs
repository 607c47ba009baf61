//! Single-flight render session tests.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rawgrade_compute::{RasterImage, RenderContext};
use rawgrade_lut::{LutRegistry, MemoryPreferences};
use rawgrade_pipeline::{AdjustmentSet, ColorPipeline, RenderError, RenderSession};

fn session(width: u32, height: u32) -> RenderSession {
    let registry = LutRegistry::new(
        std::env::temp_dir().join("rawgrade-session-test"),
        Box::new(MemoryPreferences::new()),
    );
    let pipeline = Arc::new(ColorPipeline::new(RenderContext::cpu(), Arc::new(registry)));
    let data = [0.2, 0.3, 0.4, 1.0].repeat((width * height) as usize);
    RenderSession::new(pipeline, RasterImage::from_rgba(width, height, data).unwrap())
}

fn exposure(ev: f32) -> AdjustmentSet {
    AdjustmentSet { exposure: ev, ..Default::default() }
}

#[test]
fn test_starts_with_source() {
    let s = session(4, 4);
    assert!(Arc::ptr_eq(&s.current(), s.source()));
    assert!(s.adjustments().is_default());
    assert!(!s.is_rendering());
}

#[test]
fn test_submit_and_wait() {
    let mut s = session(8, 8);
    let generation = s.submit(exposure(1.0));
    let img = s.wait_for(generation).unwrap();

    assert!((img.data()[0] - 0.4).abs() < 1e-6);
    assert_eq!(s.adjustments().exposure, 1.0);
    assert_eq!(s.applied_generation(), generation);
}

#[test]
fn test_last_request_wins() {
    let mut s = session(64, 64);
    let first = s.submit(exposure(1.0));
    let second = s.submit(exposure(-1.0));

    assert_eq!(s.wait_for(first).unwrap_err(), RenderError::Cancelled);
    let img = s.wait_for(second).unwrap();
    assert!((img.data()[0] - 0.1).abs() < 1e-6);

    // A late result for the first request must not be published
    std::thread::sleep(std::time::Duration::from_millis(50));
    s.process_events();
    assert_eq!(s.adjustments().exposure, -1.0);
    assert!((s.current().data()[0] - 0.1).abs() < 1e-6);
}

#[test]
fn test_many_rapid_edits() {
    let mut s = session(32, 32);
    let mut last = 0;
    for i in 0..20 {
        last = s.submit(exposure(i as f32 * 0.05));
    }
    s.wait_for(last).unwrap();
    assert!((s.adjustments().exposure - 0.95).abs() < 1e-6);
}

#[test]
fn test_reset_republishes_source() {
    let mut s = session(4, 4);
    let generation = s.submit(exposure(0.5));
    s.wait_for(generation).unwrap();

    s.reset();
    assert!(Arc::ptr_eq(&s.current(), s.source()));
    assert!(s.adjustments().is_default());

    // Anything still in flight is stale now
    s.process_events();
    assert!(Arc::ptr_eq(&s.current(), s.source()));
}

#[test]
fn test_failed_render_reports_error() {
    let registry = LutRegistry::new(
        std::env::temp_dir().join("rawgrade-session-test"),
        Box::new(MemoryPreferences::new()),
    );
    let pipeline = Arc::new(ColorPipeline::new(RenderContext::cpu(), Arc::new(registry)));
    let mut s = RenderSession::new(pipeline, RasterImage::default());

    let generation = s.submit(exposure(1.0));
    let err = s.wait_for(generation).unwrap_err();
    assert!(matches!(err, RenderError::DecodeFailed(_)));
    assert!(s.last_error().is_some());
    assert!(!s.is_rendering());
}

#[test]
fn test_wait_for_unissued_generation() {
    let mut s = session(4, 4);
    assert_eq!(s.wait_for(1).unwrap_err(), RenderError::NotSubmitted(1));

    let generation = s.submit(exposure(0.5));
    assert_eq!(s.wait_for(generation + 1).unwrap_err(), RenderError::NotSubmitted(generation + 1));
    assert!(s.wait_for(generation).is_ok());
}

#[test]
fn test_edit_burst_submits_once() {
    let mut s = session(8, 8);
    let start = Instant::now();

    s.edit_at(exposure(0.5), start);
    s.edit_at(exposure(1.0), start + Duration::from_millis(40));
    assert!(s.submit_settled_at(start + Duration::from_millis(100)).is_none());
    assert!(s.has_pending_edit());

    let generation = s.submit_settled_at(start + Duration::from_millis(140)).unwrap();
    assert_eq!(generation, 1);
    assert!(!s.has_pending_edit());

    let img = s.wait_for(generation).unwrap();
    assert!((img.data()[0] - 0.4).abs() < 1e-6);
    assert_eq!(s.latest_generation(), 1);
}

#[test]
fn test_flush_and_reset_pending_edit() {
    let mut s = session(4, 4).with_debounce(Duration::from_secs(60));

    s.edit(exposure(1.0));
    let generation = s.flush_edits().unwrap();
    s.wait_for(generation).unwrap();
    assert_eq!(s.adjustments().exposure, 1.0);
    assert!(s.flush_edits().is_none());

    s.edit(exposure(-1.0));
    s.reset();
    assert!(!s.has_pending_edit());
    assert!(s.adjustments().is_default());
}
