//! WGSL compute shaders.

/// 3D LUT lookup with intensity blend.
///
/// The lattice is a 3D texture sampled with a linear, clamp-to-edge sampler.
/// Coordinates are scaled by (dim-1)/dim and offset by half a texel so that
/// 0.0 and 1.0 land on texel centers of the corner entries.
///
/// Bindings:
/// - 0: source pixels (RGBA)
/// - 1: destination pixels (RGBA)
/// - 2: params
/// - 3: LUT texture (rgba16float, dim^3)
/// - 4: linear sampler
pub const LUT3D: &str = r#"
struct Params {
    pixel_count: u32,
    dimension: u32,
    intensity: f32,
    _pad: u32,
}

@group(0) @binding(0) var<storage, read> src: array<vec4<f32>>;
@group(0) @binding(1) var<storage, read_write> dst: array<vec4<f32>>;
@group(0) @binding(2) var<uniform> params: Params;
@group(0) @binding(3) var lut: texture_3d<f32>;
@group(0) @binding(4) var lut_sampler: sampler;

@compute @workgroup_size(256)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let idx = id.x;
    if (idx >= params.pixel_count) {
        return;
    }

    let color = src[idx];
    let rgb = clamp(color.rgb, vec3<f32>(0.0), vec3<f32>(1.0));

    let dim = f32(max(params.dimension, 2u));
    let scale = (dim - 1.0) / dim;
    let offset = 0.5 / dim;
    let uvw = clamp(rgb * scale + vec3<f32>(offset), vec3<f32>(0.0), vec3<f32>(1.0));

    let mapped = textureSampleLevel(lut, lut_sampler, uvw, 0.0).rgb;
    let t = clamp(params.intensity, 0.0, 1.0);

    dst[idx] = vec4<f32>(mix(color.rgb, mapped, vec3<f32>(t)), color.a);
}
"#;

/// Spatial upscale: Catmull-Rom over a 4x4 footprint, clamped to the inner
/// 2x2 range to suppress ringing.
///
/// Processes one horizontal band of the output per dispatch.
///
/// Bindings:
/// - 0: source texture (rgba16float)
/// - 1: destination band (RGBA)
/// - 2: params
pub const UPSCALE: &str = r#"
struct Params {
    src_w: u32,
    src_h: u32,
    dst_w: u32,
    dst_h: u32,
    row_offset: u32,
    row_count: u32,
    _pad0: u32,
    _pad1: u32,
}

@group(0) @binding(0) var src: texture_2d<f32>;
@group(0) @binding(1) var<storage, read_write> dst: array<vec4<f32>>;
@group(0) @binding(2) var<uniform> params: Params;

fn weights(t: f32) -> vec4<f32> {
    let t2 = t * t;
    let t3 = t2 * t;
    return vec4<f32>(
        -0.5 * t3 + t2 - 0.5 * t,
        1.5 * t3 - 2.5 * t2 + 1.0,
        -1.5 * t3 + 2.0 * t2 + 0.5 * t,
        0.5 * t3 - 0.5 * t2
    );
}

fn load(x: i32, y: i32) -> vec4<f32> {
    let cx = clamp(x, 0, i32(params.src_w) - 1);
    let cy = clamp(y, 0, i32(params.src_h) - 1);
    return textureLoad(src, vec2<i32>(cx, cy), 0);
}

@compute @workgroup_size(16, 16)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let x = id.x;
    let band_y = id.y;
    if (x >= params.dst_w || band_y >= params.row_count) {
        return;
    }
    let y = band_y + params.row_offset;

    let scale = vec2<f32>(
        f32(params.src_w) / f32(params.dst_w),
        f32(params.src_h) / f32(params.dst_h)
    );
    let s = (vec2<f32>(f32(x), f32(y)) + vec2<f32>(0.5)) * scale - vec2<f32>(0.5);
    let f = floor(s);
    let wx = weights(s.x - f.x);
    let wy = weights(s.y - f.y);
    let base = vec2<i32>(f);

    var acc = vec4<f32>(0.0);
    var lo = vec4<f32>(3.4e38);
    var hi = vec4<f32>(-3.4e38);

    for (var j: i32 = 0; j < 4; j++) {
        for (var i: i32 = 0; i < 4; i++) {
            let p = load(base.x - 1 + i, base.y - 1 + j);
            acc += p * (wx[i] * wy[j]);
            if ((i == 1 || i == 2) && (j == 1 || j == 2)) {
                lo = min(lo, p);
                hi = max(hi, p);
            }
        }
    }

    dst[band_y * params.dst_w + x] = clamp(acc, lo, hi);
}
"#;
