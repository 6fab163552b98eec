//! OpenGL backend built on glow.
//!
//! `GlContext` owns the `glow::Context`, the two shader programs and every
//! object it creates, and implements [`GraphicsContext`]. Swapping buffers
//! belongs to the windowing layer, so presentation is delegated to a
//! [`Presenter`] supplied by the caller.
//!
//! # Module overview
//!
//! - [`shader`] -- Shader compilation, linking, and error formatting.
//! - [`sources`] -- GLSL sources for the mesh and quad programs.
//! - [`texture`] -- Texture configuration and creation.
//! - [`target`] -- FBO-backed accumulation surfaces.

pub mod shader;
pub mod sources;
pub mod target;
pub mod texture;

pub use shader::{compile_program, number_source, ShaderError};
pub use target::SurfaceTarget;
pub use texture::{create_texture, TextureConfig};

use super::context::{mesh_projection, Blend, GraphicsContext, QuadSource, Target, Viewport};
use crate::error::IbfvError;
use crate::mesh::MeshGrid;
use crate::pattern::Pattern;
use glow::HasContext;
use sources::{MESH_VERTEX_SHADER, QUAD_VERTEX_SHADER, TEXTURE_FRAGMENT_SHADER};
use tracing::info;

/// Shows the default framebuffer, typically by swapping window buffers.
pub trait Presenter {
    /// # Errors
    ///
    /// Returns a description of the failure; the context is then unusable.
    fn swap_buffers(&mut self) -> Result<(), String>;
}

/// GPU copy of a [`MeshGrid`]: a VAO over position, texture-coordinate
/// and index buffers.
#[derive(Debug)]
pub struct GlMesh {
    vao: glow::VertexArray,
    positions: glow::Buffer,
    index_count: i32,
}

struct Program {
    handle: glow::Program,
    projection: Option<glow::UniformLocation>,
    texture: Option<glow::UniformLocation>,
    tex_extent: Option<glow::UniformLocation>,
}

impl Program {
    #[allow(unsafe_code)]
    fn new(gl: &glow::Context, label: &str, vertex: &str, fragment: &str) -> Result<Self, IbfvError> {
        let handle = compile_program(gl, label, vertex, fragment)?;
        // SAFETY: handle is a freshly linked program.
        unsafe {
            Ok(Self {
                projection: gl.get_uniform_location(handle, "u_projection"),
                texture: gl.get_uniform_location(handle, "u_texture"),
                tex_extent: gl.get_uniform_location(handle, "u_tex_extent"),
                handle,
            })
        }
    }
}

/// [`GraphicsContext`] implementation for OpenGL 3.3 core.
pub struct GlContext<P: Presenter> {
    gl: glow::Context,
    presenter: P,
    mesh_program: Program,
    quad_program: Program,
    quad_vao: glow::VertexArray,
    screen: Viewport,
    surfaces: Vec<SurfaceTarget>,
    textures: Vec<glow::Texture>,
    buffers: Vec<glow::Buffer>,
    vertex_arrays: Vec<glow::VertexArray>,
}

impl<P: Presenter> GlContext<P> {
    /// Wraps `gl`, checks capabilities and builds both programs.
    ///
    /// # Errors
    ///
    /// `IbfvError::MissingCapability` below OpenGL 3.0 (no framebuffer
    /// objects), `IbfvError::Shader` if a program fails to build, and
    /// `IbfvError::Allocation` if the quad VAO cannot be created.
    #[allow(unsafe_code)]
    pub fn new(gl: glow::Context, presenter: P, screen: Viewport) -> Result<Self, IbfvError> {
        let version = gl.version();
        if version.major < 3 {
            return Err(IbfvError::MissingCapability(format!(
                "framebuffer objects need OpenGL 3.0, driver reports {}.{}",
                version.major, version.minor
            )));
        }
        info!(
            major = version.major,
            minor = version.minor,
            vendor = %version.vendor_info,
            "opengl context ready"
        );

        let mesh_program = Program::new(&gl, "mesh", MESH_VERTEX_SHADER, TEXTURE_FRAGMENT_SHADER)?;
        let quad_program = Program::new(&gl, "quad", QUAD_VERTEX_SHADER, TEXTURE_FRAGMENT_SHADER)?;

        // SAFETY: creating a VAO has no preconditions beyond a current context.
        let quad_vao = unsafe { gl.create_vertex_array() }.map_err(IbfvError::Allocation)?;

        Ok(Self {
            gl,
            presenter,
            mesh_program,
            quad_program,
            quad_vao,
            screen,
            surfaces: Vec::new(),
            textures: Vec::new(),
            buffers: Vec::new(),
            vertex_arrays: Vec::new(),
        })
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    /// Deletes every object this context created. Handles held elsewhere
    /// become invalid.
    #[allow(unsafe_code)]
    pub fn destroy(&mut self) {
        for surface in self.surfaces.drain(..) {
            surface.destroy(&self.gl);
        }
        // SAFETY: every handle below was created by this context and is
        // removed from its list as it is deleted.
        unsafe {
            for texture in self.textures.drain(..) {
                self.gl.delete_texture(texture);
            }
            for buffer in self.buffers.drain(..) {
                self.gl.delete_buffer(buffer);
            }
            for vao in self.vertex_arrays.drain(..) {
                self.gl.delete_vertex_array(vao);
            }
            self.gl.delete_vertex_array(self.quad_vao);
            self.gl.delete_program(self.mesh_program.handle);
            self.gl.delete_program(self.quad_program.handle);
        }
    }

    #[allow(unsafe_code)]
    fn bind_target(&self, target: Target<SurfaceTarget>) {
        match target {
            Target::Surface(surface) => surface.bind(&self.gl),
            // SAFETY: binding the default framebuffer is always valid.
            Target::Screen => unsafe {
                self.gl.bind_framebuffer(glow::FRAMEBUFFER, None);
                self.gl
                    .viewport(0, 0, self.screen.width as i32, self.screen.height as i32);
            },
        }
    }

    #[allow(unsafe_code)]
    fn use_program(&self, program: &Program, texture: glow::Texture, tex_extent: f32) {
        let projection = mesh_projection().to_cols_array();
        // SAFETY: program and texture are live objects owned by this context.
        unsafe {
            self.gl.use_program(Some(program.handle));
            self.gl
                .uniform_matrix_4_f32_slice(program.projection.as_ref(), false, &projection);
            self.gl.uniform_1_f32(program.tex_extent.as_ref(), tex_extent);
            self.gl.uniform_1_i32(program.texture.as_ref(), 0);
            self.gl.active_texture(glow::TEXTURE0);
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
        }
    }

    #[allow(unsafe_code)]
    fn create_buffer(&mut self, target: u32, bytes: &[u8], usage: u32) -> Result<glow::Buffer, IbfvError> {
        // SAFETY: the buffer is created, bound and filled here; the caller
        // has the owning VAO bound when target is ELEMENT_ARRAY_BUFFER.
        let buffer = unsafe { self.gl.create_buffer() }.map_err(IbfvError::Allocation)?;
        unsafe {
            self.gl.bind_buffer(target, Some(buffer));
            self.gl.buffer_data_u8_slice(target, bytes, usage);
        }
        self.buffers.push(buffer);
        Ok(buffer)
    }
}

impl<P: Presenter> GraphicsContext for GlContext<P> {
    type Surface = SurfaceTarget;
    type Texture = glow::Texture;
    type Mesh = GlMesh;

    fn create_surface(&mut self, size: u32) -> Result<SurfaceTarget, IbfvError> {
        let surface = SurfaceTarget::new(&self.gl, size)?;
        self.surfaces.push(surface);
        surface.clear(&self.gl);
        Ok(surface)
    }

    fn create_pattern_texture(&mut self, pattern: &Pattern) -> Result<glow::Texture, IbfvError> {
        let size = u32::try_from(pattern.size()).map_err(|_| IbfvError::InvalidDimensions)?;
        let texture = create_texture(&self.gl, &TextureConfig::pattern(size), Some(pattern.rgba()))?;
        self.textures.push(texture);
        Ok(texture)
    }

    #[allow(unsafe_code)]
    fn create_mesh(&mut self, mesh: &MeshGrid) -> Result<GlMesh, IbfvError> {
        let index_count = i32::try_from(mesh.indices().len()).map_err(|_| {
            IbfvError::invalid_config("mesh_resolution", "index count exceeds a single draw call")
        })?;

        // SAFETY: the VAO is created and bound here; attribute pointers
        // refer to the buffers created right before them.
        let vao = unsafe { self.gl.create_vertex_array() }.map_err(IbfvError::Allocation)?;
        self.vertex_arrays.push(vao);
        unsafe { self.gl.bind_vertex_array(Some(vao)) };

        let positions = self.create_buffer(
            glow::ARRAY_BUFFER,
            bytemuck::cast_slice(mesh.positions()),
            glow::DYNAMIC_DRAW,
        )?;
        unsafe {
            self.gl.vertex_attrib_pointer_f32(0, 2, glow::FLOAT, false, 0, 0);
            self.gl.enable_vertex_attrib_array(0);
        }

        self.create_buffer(
            glow::ARRAY_BUFFER,
            bytemuck::cast_slice(mesh.tex_coords()),
            glow::STATIC_DRAW,
        )?;
        unsafe {
            self.gl.vertex_attrib_pointer_f32(1, 2, glow::FLOAT, false, 0, 0);
            self.gl.enable_vertex_attrib_array(1);
        }

        self.create_buffer(
            glow::ELEMENT_ARRAY_BUFFER,
            bytemuck::cast_slice(mesh.indices()),
            glow::STATIC_DRAW,
        )?;

        unsafe {
            self.gl.bind_vertex_array(None);
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }

        Ok(GlMesh {
            vao,
            positions,
            index_count,
        })
    }

    #[allow(unsafe_code)]
    fn update_mesh_positions(&mut self, handle: &mut GlMesh, mesh: &MeshGrid) {
        // SAFETY: handle.positions was sized for this mesh in create_mesh.
        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(handle.positions));
            self.gl.buffer_sub_data_u8_slice(
                glow::ARRAY_BUFFER,
                0,
                bytemuck::cast_slice(mesh.positions()),
            );
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }
    }

    fn clear_surface(&mut self, surface: SurfaceTarget) {
        surface.clear(&self.gl);
    }

    fn set_screen_viewport(&mut self, viewport: Viewport) {
        self.screen = viewport;
    }

    #[allow(unsafe_code)]
    fn draw_mesh(&mut self, target: Target<SurfaceTarget>, source: SurfaceTarget, mesh: &GlMesh) {
        assert_ne!(
            target,
            Target::Surface(source),
            "surface cannot be sampled while it is the draw target"
        );
        self.bind_target(target);
        self.use_program(&self.mesh_program, source.texture(), 1.0);
        // SAFETY: the VAO and its element buffer were built in create_mesh.
        unsafe {
            self.gl.bind_vertex_array(Some(mesh.vao));
            self.gl
                .draw_elements(glow::TRIANGLE_STRIP, mesh.index_count, glow::UNSIGNED_INT, 0);
            self.gl.bind_vertex_array(None);
        }
    }

    #[allow(unsafe_code)]
    fn draw_quad(
        &mut self,
        target: Target<SurfaceTarget>,
        source: QuadSource<SurfaceTarget, glow::Texture>,
        tex_extent: f32,
        blend: Blend,
    ) {
        let texture = match source {
            QuadSource::Surface(surface) => {
                assert_ne!(
                    target,
                    Target::Surface(surface),
                    "surface cannot be sampled while it is the draw target"
                );
                surface.texture()
            }
            QuadSource::Pattern(texture) => texture,
        };
        self.bind_target(target);
        self.use_program(&self.quad_program, texture, tex_extent);
        // SAFETY: quad_vao is an empty VAO; the vertex shader needs no buffers.
        unsafe {
            if blend == Blend::SourceOver {
                self.gl.enable(glow::BLEND);
                self.gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
            }
            self.gl.bind_vertex_array(Some(self.quad_vao));
            self.gl.draw_arrays(glow::TRIANGLE_STRIP, 0, 4);
            self.gl.bind_vertex_array(None);
            if blend == Blend::SourceOver {
                self.gl.disable(glow::BLEND);
            }
        }
    }

    #[allow(unsafe_code)]
    fn present(&mut self) -> Result<(), IbfvError> {
        self.presenter
            .swap_buffers()
            .map_err(IbfvError::ContextLost)?;
        // SAFETY: querying the error flag has no preconditions.
        let flag = unsafe { self.gl.get_error() };
        check_error_flag(flag)
    }
}

/// Maps a `glGetError` flag read at the end of a frame to its outcome.
///
/// # Panics
///
/// On any `INVALID_*` flag, which means the pipeline issued a malformed call.
pub fn check_error_flag(flag: u32) -> Result<(), IbfvError> {
    match flag {
        glow::NO_ERROR => Ok(()),
        glow::CONTEXT_LOST => Err(IbfvError::ContextLost(
            "driver reported GL_CONTEXT_LOST".into(),
        )),
        glow::OUT_OF_MEMORY => Err(IbfvError::Allocation(
            "driver reported GL_OUT_OF_MEMORY".into(),
        )),
        glow::INVALID_ENUM
        | glow::INVALID_VALUE
        | glow::INVALID_OPERATION
        | glow::INVALID_FRAMEBUFFER_OPERATION => {
            panic!("opengl rejected a pipeline call: error 0x{flag:04X}")
        }
        other => Err(IbfvError::ContextLost(format!(
            "unexpected opengl error 0x{other:04X}"
        ))),
    }
}
