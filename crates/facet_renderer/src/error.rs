//! Render error taxonomy.

use facet_core::ConfigError;
use thiserror::Error;

/// A fault raised inside one pixel's unit of work.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("pixel ({x}, {y}): {message}")]
pub struct PixelFault {
    pub x: u32,
    pub y: u32,
    pub message: String,
}

/// Errors that abort a render pass.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid render configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Render cancelled")]
    Cancelled,

    /// Every fault from the pass, in row-major pixel order.
    #[error("{} pixel(s) faulted during rendering", .0.len())]
    PixelFaults(Vec<PixelFault>),
}

pub type RenderResult<T> = Result<T, RenderError>;
