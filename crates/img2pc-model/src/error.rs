//! Error type for model construction and forward passes.
//!
//! # Error Categories
//!
//! | Category | Variants | When |
//! |----------|----------|------|
//! | Configuration | ConfigError, UnsupportedLayer | Construction, before any parameter is created |
//! | Shape | ShapeMismatch | Forward pass input does not match the block contract |
//! | Backend | Algebra, Tensor | Primitive or tensor backend failure |
//! | I/O | IoError | Reading configuration files |
//!
//! Errors are never retried or downgraded: every variant is a programming or
//! configuration defect and propagates to the caller unchanged.

use thiserror::Error;

use img2pc_algebra::AlgebraError;

use crate::generator::LayerKind;

/// Errors raised while building or running model blocks.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Configuration violates a block invariant.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Forward input does not match the block's declared shape.
    #[error("Shape mismatch in {component}: expected {expected}, got {actual:?}")]
    ShapeMismatch {
        component: &'static str,
        expected: String,
        actual: Vec<usize>,
    },

    /// Layer kind is declared but has no implementation.
    #[error("Unsupported generator layer: {kind:?}")]
    UnsupportedLayer { kind: LayerKind },

    /// Geometric-algebra primitive failed.
    #[error("Algebra error: {0}")]
    Algebra(#[from] AlgebraError),

    /// Tensor backend failure outside the algebra primitives.
    #[error("Tensor error: {message}")]
    Tensor { message: String },

    /// Configuration file could not be read.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result alias for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

pub(crate) fn map_candle(context: &'static str) -> impl Fn(candle_core::Error) -> ModelError {
    move |e| ModelError::Tensor {
        message: format!("{} failed: {}", context, e),
    }
}
