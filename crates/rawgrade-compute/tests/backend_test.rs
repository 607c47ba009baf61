//! Backend tests for rawgrade-compute.

use rawgrade_compute::{
    Backend, RasterImage, RenderContext, SpatialUpscaler, available_factors, describe_backends,
};
use rawgrade_lut::Lut3D;

fn gradient(width: u32, height: u32) -> RasterImage {
    let mut data = Vec::new();
    for y in 0..height {
        for x in 0..width {
            let r = x as f32 / (width - 1).max(1) as f32;
            let g = y as f32 / (height - 1).max(1) as f32;
            data.extend_from_slice(&[r, g, 0.5 * (r + g), 0.25 + 0.5 * r]);
        }
    }
    RasterImage::from_rgba(width, height, data).unwrap()
}

fn invert() -> Lut3D {
    Lut3D::generate(17, |r, g, b| [1.0 - r, 1.0 - g, 1.0 - b]).with_name("test:invert", "Invert")
}

#[test]
fn test_cpu_backend_available() {
    assert!(Backend::Cpu.is_available());
}

#[test]
fn test_auto_backend() {
    let ctx = RenderContext::new(Backend::Auto);
    println!("Auto-selected backend: {}", ctx.backend_name());
}

#[test]
fn test_describe_backends() {
    let desc = describe_backends();
    println!("{}", desc);
    assert!(desc.contains("CPU"));
}

#[test]
fn test_lut_identity() {
    let ctx = RenderContext::cpu();
    let img = gradient(8, 8);
    let out = ctx.backend().apply_lut3d(&img, &Lut3D::identity(33), 1.0).unwrap();

    for (i, (a, b)) in out.data().iter().zip(img.data().iter()).enumerate() {
        assert!((a - b).abs() < 1e-4, "mismatch at {}: {} vs {}", i, a, b);
    }
}

#[test]
fn test_lut_full_intensity_replaces() {
    let ctx = RenderContext::cpu();
    let img = RasterImage::from_rgba(1, 1, vec![0.2, 0.4, 0.8, 0.3]).unwrap();
    let out = ctx.backend().apply_lut3d(&img, &invert(), 1.0).unwrap();
    let px = out.data();

    assert!((px[0] - 0.8).abs() < 1e-4);
    assert!((px[1] - 0.6).abs() < 1e-4);
    assert!((px[2] - 0.2).abs() < 1e-4);
    assert_eq!(px[3], 0.3, "alpha must pass through");
}

#[test]
fn test_lut_half_intensity_blends() {
    let ctx = RenderContext::cpu();
    let img = RasterImage::from_rgba(1, 1, vec![0.2, 0.4, 0.8, 1.0]).unwrap();
    let out = ctx.backend().apply_lut3d(&img, &invert(), 0.5).unwrap();
    let px = out.data();

    // Midpoint of x and 1-x is 0.5 for every channel
    for c in 0..3 {
        assert!((px[c] - 0.5).abs() < 1e-4, "channel {}: {}", c, px[c]);
    }
}

#[test]
fn test_lut_intensity_is_clamped() {
    let ctx = RenderContext::cpu();
    let img = gradient(4, 4);
    let over = ctx.backend().apply_lut3d(&img, &invert(), 3.0).unwrap();
    let full = ctx.backend().apply_lut3d(&img, &invert(), 1.0).unwrap();
    assert_eq!(over, full);

    let under = ctx.backend().apply_lut3d(&img, &invert(), -1.0).unwrap();
    assert_eq!(under, img);
}

#[test]
fn test_upscale_dimensions() {
    let ctx = RenderContext::cpu();
    let up = SpatialUpscaler::new(&ctx);
    let img = gradient(5, 3);

    let out = up.upscale(&img, 1.5).unwrap();
    assert_eq!(out.dimensions(), (7, 4));

    let out = up.upscale(&img, 3.0).unwrap();
    assert_eq!(out.dimensions(), (15, 9));
}

#[test]
fn test_upscale_preserves_range() {
    let ctx = RenderContext::cpu();
    let img = gradient(16, 16);
    let out = SpatialUpscaler::new(&ctx).upscale(&img, 2.0).unwrap();

    for px in out.data().chunks(4) {
        for &v in px {
            assert!((0.0..=1.0).contains(&v), "value out of range: {}", v);
        }
    }
}

#[test]
fn test_upscale_refused_above_ceiling() {
    let ctx = RenderContext::cpu();
    let up = SpatialUpscaler::new(&ctx);
    let img = RasterImage::new(8192, 2);

    assert!(up.upscale(&img, 3.0).is_none());
    let f = up.available_factors(8192, 2);
    assert!(f.can_scale_2x && !f.can_scale_3x);
}

#[test]
fn test_available_factors_free_fn() {
    let f = available_factors(6000, 4000, 16384);
    assert!(f.can_scale_1_5x);
    assert!(f.can_scale_2x);
    assert!(!f.can_scale_3x);
}

#[test]
fn test_gpu_matches_cpu() {
    let gpu = RenderContext::new(Backend::Wgpu);
    if !gpu.is_accelerated() {
        println!("No GPU adapter, skipping");
        return;
    }
    let cpu = RenderContext::cpu();
    let img = gradient(37, 23);
    let lut = invert();

    for t in [0.0, 0.35, 1.0] {
        let a = gpu.backend().apply_lut3d(&img, &lut, t).unwrap();
        let b = cpu.backend().apply_lut3d(&img, &lut, t).unwrap();
        for (i, (x, y)) in a.data().iter().zip(b.data().iter()).enumerate() {
            assert!((x - y).abs() < 1e-2, "lut t={} mismatch at {}: {} vs {}", t, i, x, y);
        }
    }

    let a = SpatialUpscaler::new(&gpu).upscale(&img, 2.0).unwrap();
    let b = SpatialUpscaler::new(&cpu).upscale(&img, 2.0).unwrap();
    assert_eq!(a.dimensions(), b.dimensions());
    for (i, (x, y)) in a.data().iter().zip(b.data().iter()).enumerate() {
        assert!((x - y).abs() < 1e-2, "upscale mismatch at {}: {} vs {}", i, x, y);
    }
}
