//! One IBFV frame: advect the previous image, inject noise, present.
//!
//! Each call to [`IbfvCompositor::render_frame`] runs, strictly in order:
//!
//! 1. recompute the swirl strength for the frame and rebuild the mesh;
//! 2. pick the write surface (`frame mod 2`) and the read surface;
//! 3. draw the warped mesh into the write surface, sampling the read
//!    surface at the undisplaced lattice coordinates (advection);
//! 4. blend the frame's noise pattern over the whole surface, tiled
//!    `tmax` times per side;
//! 5. copy the write surface to the screen;
//! 6. present, then advance the frame counter and the FPS clock.
//!
//! Every step reads what the previous one wrote, so nothing here may be
//! reordered.

use super::context::{Blend, GraphicsContext, QuadSource, Target, Viewport};
use super::ping_pong::PingPongSurfaces;
use crate::clock::FrameClock;
use crate::config::IbfvConfig;
use crate::displacement::{swirl_amplitude, DisplacementField};
use crate::error::IbfvError;
use crate::mesh::MeshGrid;
use crate::pattern::{pattern_index, PatternBank};
use crate::prng::Xorshift64;
use tracing::{debug, info, trace};

/// What happened during one [`IbfvCompositor::render_frame`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Number of the frame just rendered.
    pub frame: u64,
    /// Average frame rate, present only when an FPS window just closed.
    pub fps: Option<f64>,
}

/// The IBFV renderer state: mesh, noise bank, surfaces and frame counter.
pub struct IbfvCompositor<G: GraphicsContext> {
    config: IbfvConfig,
    field: DisplacementField,
    mesh: MeshGrid,
    mesh_handle: G::Mesh,
    bank: PatternBank,
    pattern_textures: Vec<G::Texture>,
    surfaces: PingPongSurfaces<G::Surface>,
    tmax: f32,
    frame: u64,
    clock: FrameClock,
}

impl<G: GraphicsContext> IbfvCompositor<G> {
    /// Validates `config`, builds the mesh and pattern bank, and allocates
    /// every GPU resource the loop needs. Both surfaces start out black.
    ///
    /// Any failure here is fatal; there is no degraded mode.
    pub fn new(ctx: &mut G, config: IbfvConfig, rng: &mut Xorshift64) -> Result<Self, IbfvError> {
        config.validate()?;

        let field = DisplacementField::from_config(&config);
        let mesh = MeshGrid::new(config.mesh_resolution)?;
        let bank = PatternBank::from_config(&config, rng)?;

        let pattern_textures = bank
            .iter()
            .map(|pattern| ctx.create_pattern_texture(pattern))
            .collect::<Result<Vec<_>, _>>()?;

        let a = ctx.create_surface(config.surface_size)?;
        let b = ctx.create_surface(config.surface_size)?;
        ctx.clear_surface(a);
        ctx.clear_surface(b);

        let mesh_handle = ctx.create_mesh(&mesh)?;

        info!(
            config = %config.to_json(),
            indices = mesh.indices().len(),
            "ibfv renderer initialized"
        );

        Ok(Self {
            tmax: config.tmax() as f32,
            surfaces: PingPongSurfaces::new(a, b, config.surface_size),
            config,
            field,
            mesh,
            mesh_handle,
            bank,
            pattern_textures,
            frame: 0,
            clock: FrameClock::new(),
        })
    }

    /// Renders and presents one frame.
    ///
    /// # Errors
    ///
    /// Returns `IbfvError::ContextLost` if presenting fails. The frame
    /// counter is not advanced in that case; callers should shut down.
    pub fn render_frame(&mut self, ctx: &mut G) -> Result<FrameReport, IbfvError> {
        let frame = self.frame;

        let sa = swirl_amplitude(frame, self.config.swirl_amplitude, self.config.swirl_period);
        self.mesh.rebuild(&self.field, sa);
        ctx.update_mesh_positions(&mut self.mesh_handle, &self.mesh);

        let read = self.surfaces.read(frame);
        let write = self.surfaces.write(frame);
        ctx.draw_mesh(Target::Surface(write), read, &self.mesh_handle);

        let pattern = self.pattern_textures[pattern_index(frame, self.pattern_textures.len())];
        ctx.draw_quad(
            Target::Surface(write),
            QuadSource::Pattern(pattern),
            self.tmax,
            Blend::SourceOver,
        );

        ctx.draw_quad(Target::Screen, QuadSource::Surface(write), 1.0, Blend::Replace);

        ctx.present()?;
        trace!(frame, sa, "frame presented");

        self.frame += 1;
        self.clock.tick();
        let fps = self.clock.fps();
        if let Some(fps) = fps {
            debug!(fps, frames = self.clock.total_frames(), "fps window closed");
        }

        Ok(FrameReport { frame, fps })
    }

    /// Updates the screen viewport after a window resize. The off-screen
    /// surfaces keep their fixed resolution.
    pub fn resize(&mut self, ctx: &mut G, width: u32, height: u32) {
        let viewport = Viewport::new(width, height);
        debug!(width = viewport.width, height = viewport.height, "screen resized");
        ctx.set_screen_viewport(viewport);
    }

    /// Frames rendered so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// The surface holding the most recent composite, if any frame has run.
    pub fn latest_surface(&self) -> Option<G::Surface> {
        self.frame
            .checked_sub(1)
            .map(|last| self.surfaces.write(last))
    }

    pub fn surfaces(&self) -> &PingPongSurfaces<G::Surface> {
        &self.surfaces
    }

    pub fn bank(&self) -> &PatternBank {
        &self.bank
    }

    pub fn mesh(&self) -> &MeshGrid {
        &self.mesh
    }

    pub fn config(&self) -> &IbfvConfig {
        &self.config
    }
}
