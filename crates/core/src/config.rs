//! Renderer configuration: mesh, pattern and field constants.
//!
//! Every knob has a default reproducing the classic IBFV setup (100x100
//! mesh, 32 patterns of 64x64 noise, 512x512 compute surfaces). Overrides
//! come from a JSON object; missing or wrongly typed keys fall back to the
//! default so a partial object is always usable.

use crate::error::IbfvError;
use serde::Serialize;
use serde_json::Value;

const DEFAULT_MESH_RESOLUTION: usize = 100;
const DEFAULT_PATTERN_RES: usize = 64;
const DEFAULT_NUM_PATTERNS: usize = 32;
const DEFAULT_ALPHA: f64 = 0.12;
const DEFAULT_SCALE: f64 = 4.0;
const DEFAULT_SURFACE_SIZE: u32 = 512;
/// Peak swirl strength of the field.
const DEFAULT_SWIRL_AMPLITUDE: f64 = 0.01;
/// Frames per full swirl oscillation.
const DEFAULT_SWIRL_PERIOD: f64 = 200.0;
/// Constant rightward drift added to every velocity.
const DEFAULT_BIAS: f64 = 0.02;
/// Lower bound on the squared radius around the field center.
const DEFAULT_EPSILON: f64 = 1e-4;
/// Largest surface side accepted; matches common GL texture size limits.
pub const MAX_SURFACE_SIZE: u32 = 16_384;

/// Complete renderer configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IbfvConfig {
    /// Vertices per mesh side (N).
    pub mesh_resolution: usize,
    /// Texels per noise pattern side (R).
    pub pattern_res: usize,
    /// Number of patterns in the bank (K).
    pub num_patterns: usize,
    /// Blend weight of freshly injected noise, in [0, 1].
    pub alpha: f64,
    /// Noise feature size in surface texels; also sets `dmax`.
    pub scale: f64,
    /// Side length of the square off-screen surfaces, in pixels.
    pub surface_size: u32,
    pub swirl_amplitude: f64,
    pub swirl_period: f64,
    pub bias: f64,
    pub epsilon: f64,
}

impl Default for IbfvConfig {
    fn default() -> Self {
        Self {
            mesh_resolution: DEFAULT_MESH_RESOLUTION,
            pattern_res: DEFAULT_PATTERN_RES,
            num_patterns: DEFAULT_NUM_PATTERNS,
            alpha: DEFAULT_ALPHA,
            scale: DEFAULT_SCALE,
            surface_size: DEFAULT_SURFACE_SIZE,
            swirl_amplitude: DEFAULT_SWIRL_AMPLITUDE,
            swirl_period: DEFAULT_SWIRL_PERIOD,
            bias: DEFAULT_BIAS,
            epsilon: DEFAULT_EPSILON,
        }
    }
}

impl IbfvConfig {
    /// Builds a configuration from a JSON object, falling back to defaults
    /// for missing keys. The result is not validated; call [`validate`](Self::validate).
    pub fn from_json(params: &Value) -> Self {
        let surface_size = param_usize(params, "surface_size", DEFAULT_SURFACE_SIZE as usize);
        Self {
            mesh_resolution: param_usize(params, "mesh_resolution", DEFAULT_MESH_RESOLUTION),
            pattern_res: param_usize(params, "pattern_res", DEFAULT_PATTERN_RES),
            num_patterns: param_usize(params, "num_patterns", DEFAULT_NUM_PATTERNS),
            alpha: param_f64(params, "alpha", DEFAULT_ALPHA),
            scale: param_f64(params, "scale", DEFAULT_SCALE),
            surface_size: u32::try_from(surface_size).unwrap_or(u32::MAX),
            swirl_amplitude: param_f64(params, "swirl_amplitude", DEFAULT_SWIRL_AMPLITUDE),
            swirl_period: param_f64(params, "swirl_period", DEFAULT_SWIRL_PERIOD),
            bias: param_f64(params, "bias", DEFAULT_BIAS),
            epsilon: param_f64(params, "epsilon", DEFAULT_EPSILON),
        }
    }

    /// The configuration as a JSON object, for logging.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Checks every field against its allowed range.
    pub fn validate(&self) -> Result<(), IbfvError> {
        if self.mesh_resolution < 2 {
            return Err(IbfvError::invalid_config(
                "mesh_resolution",
                "must be at least 2",
            ));
        }
        self.mesh_resolution
            .checked_mul(self.mesh_resolution)
            .filter(|&v| u32::try_from(v).is_ok())
            .ok_or_else(|| {
                IbfvError::invalid_config("mesh_resolution", "vertex count exceeds u32 indices")
            })?;
        if self.pattern_res == 0 {
            return Err(IbfvError::invalid_config("pattern_res", "must be non-zero"));
        }
        if self.num_patterns == 0 {
            return Err(IbfvError::invalid_config("num_patterns", "must be non-zero"));
        }
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(IbfvError::invalid_config("alpha", "must lie in [0, 1]"));
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(IbfvError::invalid_config("scale", "must be positive"));
        }
        if self.surface_size == 0 {
            return Err(IbfvError::invalid_config("surface_size", "must be non-zero"));
        }
        if self.surface_size > MAX_SURFACE_SIZE {
            return Err(IbfvError::invalid_config(
                "surface_size",
                format!("must not exceed {MAX_SURFACE_SIZE}"),
            ));
        }
        if !(self.swirl_period.is_finite() && self.swirl_period > 0.0) {
            return Err(IbfvError::invalid_config("swirl_period", "must be positive"));
        }
        if !self.swirl_amplitude.is_finite() || !self.bias.is_finite() {
            return Err(IbfvError::invalid_config(
                "swirl_amplitude",
                "amplitude and bias must be finite",
            ));
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(IbfvError::invalid_config("epsilon", "must be positive"));
        }
        Ok(())
    }

    /// Maximum per-frame displacement in mesh space: `scale / surface_size`.
    pub fn dmax(&self) -> f64 {
        self.scale / f64::from(self.surface_size)
    }

    /// Texture-coordinate extent of the noise quad: `surface_size / (scale * pattern_res)`.
    pub fn tmax(&self) -> f64 {
        f64::from(self.surface_size) / (self.scale * self.pattern_res as f64)
    }

    /// Pattern alpha as a byte. Rounds, so the default 0.12 becomes 31.
    pub fn alpha_byte(&self) -> u8 {
        (self.alpha.clamp(0.0, 1.0) * 255.0).round() as u8
    }
}

fn param_f64(params: &Value, name: &str, default: f64) -> f64 {
    params.get(name).and_then(Value::as_f64).unwrap_or(default)
}

fn param_usize(params: &Value, name: &str, default: usize) -> usize {
    params
        .get(name)
        .and_then(Value::as_u64)
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(default)
}
