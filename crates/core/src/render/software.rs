//! CPU rasterizer backend.
//!
//! Implements [`GraphicsContext`] with plain byte buffers so the full
//! pipeline runs headless: surfaces are RGB8 images, patterns keep their
//! RGBA8 texels, and triangles are filled by testing pixel centers against
//! edge functions. Sampling is nearest-neighbour everywhere (clamped for
//! surfaces, repeating for patterns), which keeps every output texel an
//! exact function of the inputs.

use super::context::{Blend, GraphicsContext, QuadSource, Target, Viewport};
use crate::error::IbfvError;
use crate::mesh::MeshGrid;
use crate::pattern::Pattern;
use glam::Vec2;

/// Handle to a [`SoftwareContext`] surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(usize);

/// Handle to an uploaded pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(usize);

/// Mesh data copied into the backend.
#[derive(Debug, Clone)]
pub struct SoftwareMesh {
    positions: Vec<Vec2>,
    tex_coords: Vec<Vec2>,
    indices: Vec<u32>,
}

/// A row-major RGB8 image. Row 0 is the bottom row, matching GL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RgbImage {
    /// A black image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 3],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{} image",
            self.width,
            self.height
        );
        (y as usize * self.width as usize + x as usize) * 3
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = self.offset(x, y);
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        let i = self.offset(x, y);
        self.data[i..i + 3].copy_from_slice(&rgb);
    }

    pub fn fill(&mut self, rgb: [u8; 3]) {
        for px in self.data.chunks_exact_mut(3) {
            px.copy_from_slice(&rgb);
        }
    }

    /// Nearest texel at `(u, v)` with coordinates clamped to the edge.
    fn sample_clamped(&self, u: f32, v: f32) -> [u8; 3] {
        let x = ((u * self.width as f32).floor() as i64).clamp(0, i64::from(self.width) - 1);
        let y = ((v * self.height as f32).floor() as i64).clamp(0, i64::from(self.height) - 1);
        self.pixel(x as u32, y as u32)
    }
}

/// Blends one channel source-over: `src * a + dst * (1 - a)`, rounded.
pub fn blend_source_over(src: u8, dst: u8, alpha: u8) -> u8 {
    let a = f32::from(alpha) / 255.0;
    (f32::from(src) * a + f32::from(dst) * (1.0 - a)).round() as u8
}

enum Sampler<'a> {
    Surface(&'a RgbImage),
    Pattern(&'a Pattern),
}

impl Sampler<'_> {
    fn sample(&self, u: f32, v: f32) -> [u8; 4] {
        match self {
            Sampler::Surface(img) => {
                let [r, g, b] = img.sample_clamped(u, v);
                [r, g, b, 255]
            }
            Sampler::Pattern(p) => {
                let size = p.size() as i64;
                let x = ((u * size as f32).floor() as i64).rem_euclid(size);
                let y = ((v * size as f32).floor() as i64).rem_euclid(size);
                p.texel(x as usize, y as usize)
            }
        }
    }
}

/// A headless [`GraphicsContext`] backed by CPU memory.
#[derive(Debug, Clone)]
pub struct SoftwareContext {
    surfaces: Vec<RgbImage>,
    patterns: Vec<Pattern>,
    screen: RgbImage,
    presented: u64,
    lost: bool,
}

impl SoftwareContext {
    /// Creates a context whose screen has the given viewport.
    pub fn new(screen: Viewport) -> Self {
        Self {
            surfaces: Vec::new(),
            patterns: Vec::new(),
            screen: RgbImage::new(screen.width, screen.height),
            presented: 0,
            lost: false,
        }
    }

    pub fn surface(&self, id: SurfaceId) -> &RgbImage {
        &self.surfaces[id.0]
    }

    /// Direct access to a surface's pixels, e.g. to seed a known image.
    pub fn surface_mut(&mut self, id: SurfaceId) -> &mut RgbImage {
        &mut self.surfaces[id.0]
    }

    /// The screen as of the last draw.
    pub fn screen(&self) -> &RgbImage {
        &self.screen
    }

    /// Number of successful `present` calls.
    pub fn presented_frames(&self) -> u64 {
        self.presented
    }

    /// Makes every later `present` fail, as a lost device would.
    pub fn lose_context(&mut self) {
        self.lost = true;
    }

    fn resolve(
        &mut self,
        target: Target<SurfaceId>,
        source: QuadSource<SurfaceId, TextureId>,
    ) -> (&mut RgbImage, Sampler<'_>) {
        match (target, source) {
            (Target::Screen, QuadSource::Surface(s)) => {
                (&mut self.screen, Sampler::Surface(&self.surfaces[s.0]))
            }
            (Target::Screen, QuadSource::Pattern(t)) => {
                (&mut self.screen, Sampler::Pattern(&self.patterns[t.0]))
            }
            (Target::Surface(w), QuadSource::Pattern(t)) => {
                (&mut self.surfaces[w.0], Sampler::Pattern(&self.patterns[t.0]))
            }
            (Target::Surface(w), QuadSource::Surface(s)) => {
                assert_ne!(w, s, "surface cannot be sampled while it is the draw target");
                let (lo, hi) = self.surfaces.split_at_mut(w.0.max(s.0));
                if w.0 < s.0 {
                    (&mut lo[w.0], Sampler::Surface(&hi[0]))
                } else {
                    (&mut hi[0], Sampler::Surface(&lo[s.0]))
                }
            }
        }
    }
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b - a).perp_dot(p - a)
}

/// Fills one triangle given in pixel space, interpolating texture
/// coordinates barycentrically. Pixels whose centers lie on an edge are
/// filled; zero-area triangles are skipped.
fn fill_triangle(target: &mut RgbImage, sampler: &Sampler<'_>, p: [Vec2; 3], t: [Vec2; 3]) {
    let area = edge(p[0], p[1], p[2]);
    if area.abs() <= f32::EPSILON {
        return;
    }
    let lo = p[0].min(p[1]).min(p[2]);
    let hi = p[0].max(p[1]).max(p[2]);
    let x0 = (lo.x - 0.5).ceil().max(0.0) as i64;
    let y0 = (lo.y - 0.5).ceil().max(0.0) as i64;
    let x1 = ((hi.x - 0.5).floor() as i64).min(i64::from(target.width) - 1);
    let y1 = ((hi.y - 0.5).floor() as i64).min(i64::from(target.height) - 1);

    for y in y0..=y1 {
        for x in x0..=x1 {
            let c = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let w0 = edge(p[1], p[2], c) / area;
            let w1 = edge(p[2], p[0], c) / area;
            let w2 = edge(p[0], p[1], c) / area;
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }
            let uv = t[0] * w0 + t[1] * w1 + t[2] * w2;
            let [r, g, b, _] = sampler.sample(uv.x, uv.y);
            target.set_pixel(x as u32, y as u32, [r, g, b]);
        }
    }
}

impl GraphicsContext for SoftwareContext {
    type Surface = SurfaceId;
    type Texture = TextureId;
    type Mesh = SoftwareMesh;

    fn create_surface(&mut self, size: u32) -> Result<SurfaceId, IbfvError> {
        if size == 0 {
            return Err(IbfvError::InvalidDimensions);
        }
        self.surfaces.push(RgbImage::new(size, size));
        Ok(SurfaceId(self.surfaces.len() - 1))
    }

    fn create_pattern_texture(&mut self, pattern: &Pattern) -> Result<TextureId, IbfvError> {
        if pattern.size() == 0 {
            return Err(IbfvError::InvalidDimensions);
        }
        self.patterns.push(pattern.clone());
        Ok(TextureId(self.patterns.len() - 1))
    }

    fn create_mesh(&mut self, mesh: &MeshGrid) -> Result<SoftwareMesh, IbfvError> {
        let to_vec2 = |v: &[[f32; 2]]| v.iter().map(|&p| Vec2::from(p)).collect::<Vec<_>>();
        Ok(SoftwareMesh {
            positions: to_vec2(mesh.positions()),
            tex_coords: to_vec2(mesh.tex_coords()),
            indices: mesh.indices().to_vec(),
        })
    }

    fn update_mesh_positions(&mut self, handle: &mut SoftwareMesh, mesh: &MeshGrid) {
        assert_eq!(
            handle.positions.len(),
            mesh.vertex_count(),
            "mesh handle was created for a different grid"
        );
        for (dst, &src) in handle.positions.iter_mut().zip(mesh.positions()) {
            *dst = Vec2::from(src);
        }
    }

    fn clear_surface(&mut self, surface: SurfaceId) {
        self.surfaces[surface.0].fill([0, 0, 0]);
    }

    fn set_screen_viewport(&mut self, viewport: Viewport) {
        if viewport.width != self.screen.width || viewport.height != self.screen.height {
            self.screen = RgbImage::new(viewport.width, viewport.height);
        }
    }

    fn draw_mesh(&mut self, target: Target<SurfaceId>, source: SurfaceId, mesh: &SoftwareMesh) {
        let (image, sampler) = self.resolve(target, QuadSource::Surface(source));
        let scale = Vec2::new(image.width as f32, image.height as f32);
        for tri in mesh.indices.windows(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| {
                let i = i as usize;
                assert!(i < mesh.positions.len(), "mesh index {i} out of bounds");
                i
            });
            fill_triangle(
                image,
                &sampler,
                [
                    mesh.positions[a] * scale,
                    mesh.positions[b] * scale,
                    mesh.positions[c] * scale,
                ],
                [mesh.tex_coords[a], mesh.tex_coords[b], mesh.tex_coords[c]],
            );
        }
    }

    fn draw_quad(
        &mut self,
        target: Target<SurfaceId>,
        source: QuadSource<SurfaceId, TextureId>,
        tex_extent: f32,
        blend: Blend,
    ) {
        let (image, sampler) = self.resolve(target, source);
        let (w, h) = (image.width, image.height);
        for y in 0..h {
            let v = (y as f32 + 0.5) / h as f32 * tex_extent;
            for x in 0..w {
                let u = (x as f32 + 0.5) / w as f32 * tex_extent;
                let [r, g, b, a] = sampler.sample(u, v);
                let rgb = match blend {
                    Blend::Replace => [r, g, b],
                    Blend::SourceOver => {
                        let [dr, dg, db] = image.pixel(x, y);
                        [
                            blend_source_over(r, dr, a),
                            blend_source_over(g, dg, a),
                            blend_source_over(b, db, a),
                        ]
                    }
                };
                image.set_pixel(x, y, rgb);
            }
        }
    }

    fn present(&mut self) -> Result<(), IbfvError> {
        if self.lost {
            return Err(IbfvError::ContextLost("software context was lost".into()));
        }
        self.presented += 1;
        Ok(())
    }
}
