//! Off-screen accumulation surface: a framebuffer with one RGB8 texture.

use super::texture::{create_texture, TextureConfig};
use crate::error::IbfvError;

/// A framebuffer object and the color texture attached to it.
///
/// The same texture is drawn into while the surface is the write target
/// and sampled once it becomes the read source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceTarget {
    fbo: glow::Framebuffer,
    texture: glow::Texture,
    size: u32,
}

impl SurfaceTarget {
    /// Allocates a `size × size` surface and verifies framebuffer completeness.
    ///
    /// # Errors
    ///
    /// Returns `IbfvError::Allocation` if the framebuffer or texture cannot
    /// be created or the framebuffer is incomplete.
    #[allow(unsafe_code)]
    pub fn new(gl: &glow::Context, size: u32) -> Result<Self, IbfvError> {
        use glow::HasContext;

        let texture = create_texture(gl, &TextureConfig::surface(size), None)?;

        // SAFETY: glow wraps raw GL calls as unsafe. The framebuffer is
        // created here and only the texture created above is attached.
        let fbo = match unsafe { gl.create_framebuffer() } {
            Ok(fbo) => fbo,
            Err(e) => {
                unsafe { gl.delete_texture(texture) };
                return Err(IbfvError::Allocation(e));
            }
        };

        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo));
            gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                Some(texture),
                0,
            );
            let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);

            if status != glow::FRAMEBUFFER_COMPLETE {
                gl.delete_framebuffer(fbo);
                gl.delete_texture(texture);
                return Err(IbfvError::Allocation(format!(
                    "framebuffer incomplete: status 0x{status:04X}"
                )));
            }
        }

        Ok(Self { fbo, texture, size })
    }

    /// Makes this surface the draw target with a viewport covering it.
    #[allow(unsafe_code)]
    pub fn bind(&self, gl: &glow::Context) {
        use glow::HasContext;

        // SAFETY: self.fbo is a live framebuffer created in new().
        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.fbo));
            gl.viewport(0, 0, self.size as i32, self.size as i32);
        }
    }

    /// Fills the surface with opaque black.
    #[allow(unsafe_code)]
    pub fn clear(&self, gl: &glow::Context) {
        use glow::HasContext;

        self.bind(gl);
        // SAFETY: the framebuffer bound above is complete.
        unsafe {
            gl.clear_color(0.0, 0.0, 0.0, 1.0);
            gl.clear(glow::COLOR_BUFFER_BIT);
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        }
    }

    /// The color texture, for sampling.
    pub fn texture(&self) -> glow::Texture {
        self.texture
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Deletes the framebuffer and its texture.
    #[allow(unsafe_code)]
    pub fn destroy(&self, gl: &glow::Context) {
        use glow::HasContext;

        // SAFETY: both handles were created in new() and are deleted once.
        unsafe {
            gl.delete_framebuffer(self.fbo);
            gl.delete_texture(self.texture);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_target_is_a_copyable_handle() {
        fn assert_handle<T: Copy + PartialEq + std::fmt::Debug>() {}
        assert_handle::<SurfaceTarget>();
    }

    #[test]
    #[ignore = "requires GL context"]
    fn new_creates_complete_framebuffer() {
        // Would test: SurfaceTarget::new(gl, 512) succeeds and size() == 512.
    }

    #[test]
    #[ignore = "requires GL context"]
    fn clear_blackens_surface() {
        // Would test: after clear(), reading back the texture yields zeros.
    }
}
