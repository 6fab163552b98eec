//! The graphics seam every draw goes through.
//!
//! `GraphicsContext` replaces implicit global API state (bound framebuffer,
//! bound texture, blend mode) with explicit arguments: each draw names its
//! target, its source and its blend mode. The compositor therefore spells
//! out the whole frame as a sequence of calls, and a backend never has to
//! remember what a previous call left bound.

use crate::error::IbfvError;
use crate::mesh::MeshGrid;
use crate::pattern::Pattern;
use glam::Mat4;

/// Where a draw call writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<S> {
    /// An off-screen surface; the viewport is the surface's full extent.
    Surface(S),
    /// The window's default framebuffer at the current screen viewport.
    Screen,
}

/// What a quad draw samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuadSource<S, T> {
    Surface(S),
    Pattern(T),
}

/// How a quad's fragments combine with the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blend {
    /// Overwrite the target.
    Replace,
    /// `src * src_alpha + dst * (1 - src_alpha)`.
    SourceOver,
}

/// A viewport size in pixels. Both sides are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Builds a viewport, bumping zero sides to 1 so a minimized window
    /// never produces a degenerate projection.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }
}

/// Orthographic projection mapping mesh space `[0, 1]²` onto the full
/// viewport in clip space.
pub fn mesh_projection() -> Mat4 {
    Mat4::orthographic_rh_gl(0.0, 1.0, 0.0, 1.0, -1.0, 1.0)
}

/// Backend for the IBFV pipeline.
///
/// Surfaces are RGB color targets that can also be sampled (nearest,
/// clamped). Pattern textures are RGBA and sampled with repeat wrapping.
/// A mesh handle owns the GPU-side copy of a [`MeshGrid`].
pub trait GraphicsContext {
    type Surface: Copy + PartialEq + std::fmt::Debug;
    type Texture: Copy + std::fmt::Debug;
    type Mesh;

    /// Allocates a square off-screen surface, cleared to black.
    fn create_surface(&mut self, size: u32) -> Result<Self::Surface, IbfvError>;

    /// Uploads a noise pattern as a repeating texture.
    fn create_pattern_texture(&mut self, pattern: &Pattern) -> Result<Self::Texture, IbfvError>;

    /// Uploads mesh topology, texture coordinates and current positions.
    fn create_mesh(&mut self, mesh: &MeshGrid) -> Result<Self::Mesh, IbfvError>;

    /// Re-uploads the displaced positions of `mesh` into `handle`.
    fn update_mesh_positions(&mut self, handle: &mut Self::Mesh, mesh: &MeshGrid);

    /// Fills a surface with black.
    fn clear_surface(&mut self, surface: Self::Surface);

    /// Sets the screen viewport used by [`Target::Screen`] draws.
    fn set_screen_viewport(&mut self, viewport: Viewport);

    /// Draws `mesh` as one indexed triangle strip into `target`, sampling
    /// `source` at the mesh's texture coordinates.
    fn draw_mesh(&mut self, target: Target<Self::Surface>, source: Self::Surface, mesh: &Self::Mesh);

    /// Draws a quad covering `target`, sampling `source` over texture
    /// coordinates `[0, tex_extent]²`.
    fn draw_quad(
        &mut self,
        target: Target<Self::Surface>,
        source: QuadSource<Self::Surface, Self::Texture>,
        tex_extent: f32,
        blend: Blend,
    );

    /// Shows the screen contents. Failure means the context is gone.
    fn present(&mut self) -> Result<(), IbfvError>;
}
