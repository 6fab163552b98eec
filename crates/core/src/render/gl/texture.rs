//! Texture creation for surfaces and noise patterns.
//!
//! Surfaces are RGB8 with nearest filtering and clamped edges, so the
//! advection samples exactly the texel the mesh points at. Patterns are
//! RGBA8 with linear filtering and repeat wrapping, so a quad with texture
//! coordinates up to `tmax` tiles the noise smoothly.

use crate::error::IbfvError;

/// Everything needed to allocate one 2D texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureConfig {
    pub width: u32,
    pub height: u32,
    /// GL internal format (e.g. `glow::RGB8`).
    pub internal_format: u32,
    /// GL upload format matching the internal format (e.g. `glow::RGB`).
    pub format: u32,
    /// Min and mag filter.
    pub filter: u32,
    /// Wrap mode on both axes.
    pub wrap: u32,
}

impl TextureConfig {
    /// A square RGB8 accumulation surface.
    pub fn surface(size: u32) -> Self {
        Self {
            width: size,
            height: size,
            internal_format: glow::RGB8,
            format: glow::RGB,
            filter: glow::NEAREST,
            wrap: glow::CLAMP_TO_EDGE,
        }
    }

    /// A square RGBA8 tiling noise pattern.
    pub fn pattern(size: u32) -> Self {
        Self {
            width: size,
            height: size,
            internal_format: glow::RGBA8,
            format: glow::RGBA,
            filter: glow::LINEAR,
            wrap: glow::REPEAT,
        }
    }

    /// Bytes per texel of the upload format.
    pub fn bytes_per_texel(&self) -> usize {
        match self.format {
            glow::RGBA => 4,
            glow::RGB => 3,
            _ => 1,
        }
    }
}

/// Creates a texture from `config`, uploading `data` if given or leaving
/// the storage uninitialized otherwise.
///
/// # Errors
///
/// Returns `IbfvError::Allocation` if the driver refuses the texture or
/// `data` does not hold exactly one image of the configured size.
#[allow(unsafe_code)]
pub fn create_texture(
    gl: &glow::Context,
    config: &TextureConfig,
    data: Option<&[u8]>,
) -> Result<glow::Texture, IbfvError> {
    use glow::HasContext;

    if config.width == 0 || config.height == 0 {
        return Err(IbfvError::InvalidDimensions);
    }
    let expected = config.width as usize * config.height as usize * config.bytes_per_texel();
    if let Some(bytes) = data {
        if bytes.len() != expected {
            return Err(IbfvError::Allocation(format!(
                "texture upload of {} bytes, expected {expected}",
                bytes.len()
            )));
        }
    }

    // SAFETY: glow wraps raw GL calls as unsafe. The texture is created,
    // configured and filled with parameters validated above.
    let texture = unsafe { gl.create_texture() }.map_err(IbfvError::Allocation)?;

    unsafe {
        gl.bind_texture(glow::TEXTURE_2D, Some(texture));
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, config.wrap as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, config.wrap as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, config.filter as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, config.filter as i32);
        // RGB rows are not 4-byte aligned for odd widths.
        gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            config.internal_format as i32,
            config.width as i32,
            config.height as i32,
            0,
            config.format,
            glow::UNSIGNED_BYTE,
            glow::PixelUnpackData::Slice(data),
        );
        gl.bind_texture(glow::TEXTURE_2D, None);
    }

    Ok(texture)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_config_is_rgb8_nearest_clamped() {
        let c = TextureConfig::surface(512);
        assert_eq!((c.width, c.height), (512, 512));
        assert_eq!(c.internal_format, glow::RGB8);
        assert_eq!(c.format, glow::RGB);
        assert_eq!(c.filter, glow::NEAREST);
        assert_eq!(c.wrap, glow::CLAMP_TO_EDGE);
    }

    #[test]
    fn pattern_config_is_rgba8_linear_repeating() {
        let c = TextureConfig::pattern(64);
        assert_eq!((c.width, c.height), (64, 64));
        assert_eq!(c.internal_format, glow::RGBA8);
        assert_eq!(c.filter, glow::LINEAR);
        assert_eq!(c.wrap, glow::REPEAT);
    }

    #[test]
    fn bytes_per_texel_follows_format() {
        assert_eq!(TextureConfig::surface(1).bytes_per_texel(), 3);
        assert_eq!(TextureConfig::pattern(1).bytes_per_texel(), 4);
    }

    #[test]
    #[ignore = "requires GL context"]
    fn create_texture_uploads_pattern() {
        // Would test: create_texture(gl, &TextureConfig::pattern(64), Some(rgba)) succeeds.
    }
}
