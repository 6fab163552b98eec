//! Structured CLI errors with meaningful exit codes.
//!
//! Exit code scheme:
//! - 0:  success (ESC pressed or window closed)
//! - 2:  clap arg parse error (automatic, before our code runs)
//! - 10: renderer error (bad config, missing GL capability, shader failure)
//! - 11: window or platform error (event loop, display, GL context)
//! - 12: input error (bad JSON params)

use ibfv_core::IbfvError;
use std::fmt;

/// Errors produced by CLI operations, each mapped to a distinct exit code.
#[derive(Debug)]
pub enum CliError {
    /// A renderer-level error raised during setup or rendering.
    Init(IbfvError),
    /// The window, display or GL context could not be created or used.
    Window(String),
    /// A user input error (bad JSON params).
    Input(String),
}

impl CliError {
    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Init(_) => 10,
            CliError::Window(_) => 11,
            CliError::Input(_) => 12,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Init(e) => write!(f, "{e}"),
            CliError::Window(msg) => write!(f, "{msg}"),
            CliError::Input(msg) => write!(f, "{msg}"),
        }
    }
}

impl From<IbfvError> for CliError {
    fn from(e: IbfvError) -> Self {
        match e {
            IbfvError::ContextLost(msg) => CliError::Window(format!("context lost: {msg}")),
            other => CliError::Init(other),
        }
    }
}

impl From<winit::error::EventLoopError> for CliError {
    fn from(e: winit::error::EventLoopError) -> Self {
        CliError::Window(e.to_string())
    }
}
