//! Forward-contract checks shared by the blocks.

use candle_core::Tensor;

use img2pc_algebra::BASIS_DIM;

use crate::error::{ModelError, ModelResult};

/// Embedding tensor `(B, L, width)`; returns `(B, L)`.
pub(crate) fn expect_embedding(
    x: &Tensor,
    width: usize,
    component: &'static str,
) -> ModelResult<(usize, usize)> {
    match x.dims() {
        &[batch, seq, w] if w == width => Ok((batch, seq)),
        dims => Err(ModelError::ShapeMismatch {
            component,
            expected: format!("(B, L, {})", width),
            actual: dims.to_vec(),
        }),
    }
}

/// Hidden multi-vector tensor `(B, L, channels, 16)`; returns `(B, L)`.
pub(crate) fn expect_hidden(
    x: &Tensor,
    channels: usize,
    component: &'static str,
) -> ModelResult<(usize, usize)> {
    match x.dims() {
        &[batch, seq, c, BASIS_DIM] if c == channels => Ok((batch, seq)),
        dims => Err(ModelError::ShapeMismatch {
            component,
            expected: format!("(B, L, {}, {})", channels, BASIS_DIM),
            actual: dims.to_vec(),
        }),
    }
}

/// Reference multi-vector broadcastable onto `target` (usually a join operand
/// `(B, L, C, 16)`): trailing axis 16, rank at most the target's, and every
/// right-aligned dim equal to the target's or 1.
pub(crate) fn expect_reference(
    reference: &Tensor,
    target: &[usize],
    component: &'static str,
) -> ModelResult<()> {
    let ref_dims = reference.dims();
    let broadcastable = ref_dims.len() <= target.len()
        && ref_dims.last() == Some(&BASIS_DIM)
        && ref_dims
            .iter()
            .rev()
            .zip(target.iter().rev())
            .all(|(&r, &t)| r == t || r == 1);
    if !broadcastable {
        return Err(ModelError::ShapeMismatch {
            component,
            expected: format!("reference broadcastable to {:?}", target),
            actual: ref_dims.to_vec(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};

    fn zeros(shape: &[usize]) -> Tensor {
        Tensor::zeros(shape, DType::F32, &Device::Cpu).unwrap()
    }

    #[test]
    fn test_expect_embedding() {
        assert_eq!(expect_embedding(&zeros(&[2, 5, 32]), 32, "t").unwrap(), (2, 5));
        assert!(expect_embedding(&zeros(&[2, 5, 31]), 32, "t").is_err());
        assert!(expect_embedding(&zeros(&[10, 32]), 32, "t").is_err());
    }

    #[test]
    fn test_expect_hidden() {
        assert_eq!(expect_hidden(&zeros(&[1, 3, 4, 16]), 4, "t").unwrap(), (1, 3));
        assert!(expect_hidden(&zeros(&[1, 3, 4, 8]), 4, "t").is_err());
        assert!(expect_hidden(&zeros(&[3, 4, 16]), 4, "t").is_err());
    }

    #[test]
    fn test_expect_reference_broadcast_rules() {
        let operand = [2, 3, 4, 16];
        assert!(expect_reference(&zeros(&[2, 3, 1, 16]), &operand, "t").is_ok());
        assert!(expect_reference(&zeros(&[2, 3, 4, 16]), &operand, "t").is_ok());
        assert!(expect_reference(&zeros(&[1, 1, 1, 16]), &operand, "t").is_ok());
        assert!(expect_reference(&zeros(&[2, 2, 1, 16]), &operand, "t").is_err());
        assert!(expect_reference(&zeros(&[2, 3, 5, 16]), &operand, "t").is_err());
        assert!(expect_reference(&zeros(&[2, 3, 1, 8]), &operand, "t").is_err());
        assert!(expect_reference(&zeros(&[1, 2, 3, 4, 16]), &operand, "t").is_err());
    }

    #[test]
    fn test_expect_reference_accepts_lower_rank() {
        let operand = [2, 3, 4, 16];
        assert!(expect_reference(&zeros(&[16]), &operand, "t").is_ok());
        assert!(expect_reference(&zeros(&[4, 16]), &operand, "t").is_ok());
        assert!(expect_reference(&zeros(&[3, 1, 16]), &operand, "t").is_ok());
        assert!(expect_reference(&zeros(&[2, 16]), &operand, "t").is_err());
    }
}
