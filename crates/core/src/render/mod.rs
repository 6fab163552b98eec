//! The IBFV render pipeline.
//!
//! # Module overview
//!
//! - [`context`] -- The `GraphicsContext` trait and its draw vocabulary.
//! - [`ping_pong`] -- Parity-driven read/write selection for the two surfaces.
//! - [`compositor`] -- The per-frame advect, inject, present sequence.
//! - [`software`] -- CPU rasterizer backend.
//! - [`gl`] -- OpenGL backend via glow (feature `gl`).

pub mod compositor;
pub mod context;
pub mod ping_pong;
pub mod software;

#[cfg(feature = "gl")]
pub mod gl;

pub use compositor::{FrameReport, IbfvCompositor};
pub use context::{mesh_projection, Blend, GraphicsContext, QuadSource, Target, Viewport};
pub use ping_pong::{roles_for_frame, PingPongSurfaces, Roles};
pub use software::{RgbImage, SoftwareContext};
