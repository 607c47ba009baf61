//! User-tunable adjustment parameters.

use serde::{Deserialize, Serialize};

/// Kelvin assumed for an image whose white point was not inferred.
pub const DEFAULT_TEMPERATURE: f32 = 6500.0;

/// LUT intensities at or below this are treated as off.
pub const LUT_EPSILON: f32 = 1e-4;

/// Identifier meaning "no LUT".
pub const NO_LUT: &str = "none";

/// Five fixed-x curve points at x = 0, 0.25, 0.5, 0.75, 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneCurve {
    /// y at x = 0, range [0, 0.5].
    pub blacks: f32,
    /// y at x = 0.25, range [0, 0.5].
    pub shadows: f32,
    /// y at x = 0.5, range [0.25, 0.75].
    pub mids: f32,
    /// y at x = 0.75, range [0.5, 1].
    pub highlights: f32,
    /// y at x = 1, range [0.5, 1].
    pub whites: f32,
}

impl ToneCurve {
    /// Curve x positions.
    pub const XS: [f32; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

    /// The y values in x order.
    pub fn ys(&self) -> [f32; 5] {
        [self.blacks, self.shadows, self.mids, self.highlights, self.whites]
    }

    /// True for the diagonal.
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

impl Default for ToneCurve {
    fn default() -> Self {
        Self { blacks: 0.0, shadows: 0.25, mids: 0.5, highlights: 0.75, whites: 1.0 }
    }
}

/// Every parameter a render reads. All fields default to identity.
///
/// Loaded from JSON with missing fields taking their defaults:
///
/// ```
/// use rawgrade_pipeline::AdjustmentSet;
///
/// let adj: AdjustmentSet = serde_json::from_str(r#"{"exposure": 0.5}"#).unwrap();
/// assert_eq!(adj.exposure, 0.5);
/// assert_eq!(adj.contrast, 1.0);
/// assert!(adj.needs_grading());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjustmentSet {
    /// Exposure in stops, [-2, 2].
    pub exposure: f32,
    /// Additive brightness, [-1, 1].
    pub brightness: f32,
    /// Contrast scale around mid-grey, [0.5, 2].
    pub contrast: f32,
    /// Chroma scale, [0, 2].
    pub saturation: f32,
    /// Bright-zone scale, [0, 2]; below 1 compresses.
    pub highlights: f32,
    /// Dark-zone lift, [-1, 1].
    pub shadows: f32,
    /// White point the decoded image was shot under.
    pub reference_temperature: f32,
    pub reference_tint: f32,
    /// Target white point, [2000, 10000] K.
    pub temperature: f32,
    /// Target tint, [-100, 100].
    pub tint: f32,
    /// Luminance sharpening, [0, 2].
    pub sharpness: f32,
    /// Selective saturation, [-1, 1].
    pub vibrance: f32,
    /// Hue rotation in degrees, [-180, 180].
    pub hue: f32,
    pub tone_curve: ToneCurve,
    pub noise_reduction_enabled: bool,
    /// Noise threshold, [0, 0.1].
    pub noise_level: f32,
    /// Detail restored above the threshold, [0, 2].
    pub noise_sharpness: f32,
    pub upscaling_enabled: bool,
    /// 0 = 1.5x, 1 = 2x, 2 = 3x.
    pub upscale_mode: u32,
    pub lut_enabled: bool,
    pub lut_id: String,
    /// LUT blend, [0, 1].
    pub lut_intensity: f32,
}

impl Default for AdjustmentSet {
    fn default() -> Self {
        Self {
            exposure: 0.0,
            brightness: 0.0,
            contrast: 1.0,
            saturation: 1.0,
            highlights: 1.0,
            shadows: 0.0,
            reference_temperature: DEFAULT_TEMPERATURE,
            reference_tint: 0.0,
            temperature: DEFAULT_TEMPERATURE,
            tint: 0.0,
            sharpness: 0.0,
            vibrance: 0.0,
            hue: 0.0,
            tone_curve: ToneCurve::default(),
            noise_reduction_enabled: false,
            noise_level: 0.02,
            noise_sharpness: 0.4,
            upscaling_enabled: false,
            upscale_mode: 0,
            lut_enabled: false,
            lut_id: NO_LUT.to_string(),
            lut_intensity: 1.0,
        }
    }
}

impl AdjustmentSet {
    /// Defaults with the white point anchored at the decoded image's
    /// inferred neutral.
    pub fn with_reference(temperature: f32, tint: f32) -> Self {
        Self {
            reference_temperature: temperature,
            reference_tint: tint,
            temperature,
            tint,
            ..Self::default()
        }
    }

    /// Every field at default and the target white point on the reference.
    pub fn is_default(&self) -> bool {
        let d = Self::default();
        self.exposure == d.exposure
            && self.brightness == d.brightness
            && self.contrast == d.contrast
            && self.saturation == d.saturation
            && self.highlights == d.highlights
            && self.shadows == d.shadows
            && self.reference_temperature == d.reference_temperature
            && self.reference_tint == d.reference_tint
            && self.temperature == self.reference_temperature
            && self.tint == self.reference_tint
            && self.sharpness == d.sharpness
            && self.vibrance == d.vibrance
            && self.hue == d.hue
            && self.tone_curve == d.tone_curve
            && self.noise_reduction_enabled == d.noise_reduction_enabled
            && self.noise_level == d.noise_level
            && self.noise_sharpness == d.noise_sharpness
            && self.upscaling_enabled == d.upscaling_enabled
            && self.upscale_mode == d.upscale_mode
            && self.lut_enabled == d.lut_enabled
            && self.lut_id == d.lut_id
            && self.lut_intensity == d.lut_intensity
    }

    /// True when the temperature or tint target differs from the reference.
    pub fn white_balance_changed(&self) -> bool {
        self.temperature != self.reference_temperature || self.tint != self.reference_tint
    }

    /// True when the LUT stage would run.
    pub fn lut_active(&self) -> bool {
        self.lut_enabled && self.lut_id != NO_LUT && self.lut_intensity > LUT_EPSILON
    }

    /// Whether any color stage has work to do. Upscaling is not grading.
    pub fn needs_grading(&self) -> bool {
        self.exposure != 0.0
            || self.brightness != 0.0
            || self.contrast != 1.0
            || self.saturation != 1.0
            || self.highlights != 1.0
            || self.shadows != 0.0
            || self.white_balance_changed()
            || self.sharpness != 0.0
            || self.vibrance != 0.0
            || self.hue != 0.0
            || !self.tone_curve.is_identity()
            || self.noise_reduction_enabled
            || self.lut_active()
    }

    /// Upscale factor for `upscale_mode`.
    pub fn upscale_factor(&self) -> f32 {
        match self.upscale_mode {
            0 => 1.5,
            1 => 2.0,
            2 => 3.0,
            _ => 2.0,
        }
    }

    /// Restore every default.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
