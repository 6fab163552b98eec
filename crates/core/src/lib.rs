#![deny(unsafe_code)]
//! Image-Based Flow Visualization (IBFV).
//!
//! Repeatedly warps the previous frame through a mesh displaced by a swirl
//! field and blends fresh noise on top, which approximates line integral
//! convolution imagery at interactive rates.
//!
//! Provides the `DisplacementField`, `MeshGrid` and `PatternBank` building
//! blocks, the `FrameClock`, the `IbfvConfig` configuration, and the
//! `render` pipeline with its `GraphicsContext` seam. A CPU backend is
//! always available; the OpenGL backend needs the `gl` feature.

pub mod clock;
pub mod config;
pub mod displacement;
pub mod error;
pub mod mesh;
pub mod pattern;
pub mod prng;
pub mod render;

pub use clock::FrameClock;
pub use config::IbfvConfig;
pub use displacement::{swirl_amplitude, DisplacementField};
pub use error::IbfvError;
pub use mesh::{build_strip_indices, MeshGrid};
pub use pattern::{pattern_index, Pattern, PatternBank};
pub use prng::Xorshift64;
pub use render::{FrameReport, GraphicsContext, IbfvCompositor};
