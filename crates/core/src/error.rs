//! Error types for the IBFV core.

use thiserror::Error;

/// Errors produced while configuring or initializing the renderer.
///
/// Steady-state rendering has no recoverable error paths: everything here
/// is either a startup failure or a lost graphics context, and callers are
/// expected to abort on all of them.
#[derive(Debug, Error)]
pub enum IbfvError {
    /// A surface, mesh or pattern was requested with a zero dimension.
    #[error("invalid dimensions: width and height must be non-zero")]
    InvalidDimensions,

    /// A configuration value is outside its allowed range.
    #[error("invalid configuration for '{name}': {reason}")]
    InvalidConfig { name: String, reason: String },

    /// The graphics driver lacks a capability the pipeline needs.
    #[error("missing graphics capability: {0}")]
    MissingCapability(String),

    /// A texture, framebuffer or buffer object could not be created.
    #[error("resource allocation failed: {0}")]
    Allocation(String),

    /// A shader failed to compile or link.
    #[cfg(feature = "gl")]
    #[error(transparent)]
    Shader(#[from] crate::render::gl::ShaderError),

    /// The graphics context went away mid-run (present failed, device lost).
    #[error("graphics context lost: {0}")]
    ContextLost(String),
}

impl IbfvError {
    pub(crate) fn invalid_config(name: &str, reason: impl Into<String>) -> Self {
        IbfvError::InvalidConfig {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
