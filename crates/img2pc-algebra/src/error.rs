//! Error type for geometric-algebra primitives.
//!
//! Every primitive validates its operands before touching the tensor backend,
//! so shape problems surface as [`AlgebraError::ShapeMismatch`] with the name
//! of the failing operation instead of an opaque backend message.

use thiserror::Error;

/// Errors raised by the algebra primitives.
#[derive(Debug, Error)]
pub enum AlgebraError {
    /// Operand shape does not satisfy the primitive's contract.
    #[error("Shape mismatch in {op}: expected {expected}, got {actual:?}")]
    ShapeMismatch {
        /// Primitive that rejected the operand.
        op: &'static str,
        /// Human readable description of the accepted shape.
        expected: String,
        /// Shape that was actually supplied.
        actual: Vec<usize>,
    },

    /// A layer was requested with a zero channel count.
    #[error("Invalid channel count for {op}: {channels}")]
    InvalidChannels { op: &'static str, channels: usize },

    /// Tensor backend failure.
    #[error("Tensor error: {message}")]
    Tensor { message: String },
}

/// Result alias for algebra operations.
pub type AlgebraResult<T> = Result<T, AlgebraError>;

pub(crate) fn map_candle(op: &'static str) -> impl Fn(candle_core::Error) -> AlgebraError {
    move |e| AlgebraError::Tensor {
        message: format!("{} failed: {}", op, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_names_op_and_shape() {
        let err = AlgebraError::ShapeMismatch {
            op: "geometric_product",
            expected: "(..., 16)".to_string(),
            actual: vec![2, 3, 15],
        };
        let msg = err.to_string();
        assert!(msg.contains("geometric_product"));
        assert!(msg.contains("[2, 3, 15]"));
    }

    #[test]
    fn test_map_candle_keeps_context() {
        let err = map_candle("equi_join")(candle_core::Error::Msg("boom".to_string()));
        let msg = err.to_string();
        assert!(msg.contains("equi_join"));
        assert!(msg.contains("boom"));
    }

    #[test]
    fn test_algebra_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AlgebraError>();
    }
}
