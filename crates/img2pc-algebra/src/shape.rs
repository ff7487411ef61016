//! Operand validation shared by the primitives.

use candle_core::Tensor;

use crate::basis::BASIS_DIM;
use crate::error::{AlgebraError, AlgebraResult};

/// Checks that `x` is a multi-vector tensor `(..., 16)` and returns its dims.
pub fn expect_multivector<'a>(x: &'a Tensor, op: &'static str) -> AlgebraResult<&'a [usize]> {
    let dims = x.dims();
    match dims.last() {
        Some(&BASIS_DIM) => Ok(dims),
        _ => Err(AlgebraError::ShapeMismatch {
            op,
            expected: format!("(..., {})", BASIS_DIM),
            actual: dims.to_vec(),
        }),
    }
}

/// Checks that `x` is a channelled multi-vector `(..., channels, 16)`.
pub fn expect_channels<'a>(
    x: &'a Tensor,
    channels: usize,
    op: &'static str,
) -> AlgebraResult<&'a [usize]> {
    let dims = expect_multivector(x, op)?;
    if dims.len() < 2 || dims[dims.len() - 2] != channels {
        return Err(AlgebraError::ShapeMismatch {
            op,
            expected: format!("(..., {}, {})", channels, BASIS_DIM),
            actual: dims.to_vec(),
        });
    }
    Ok(dims)
}

/// Checks that two bilinear operands are multi-vectors of identical shape.
pub fn expect_same_shape(x: &Tensor, y: &Tensor, op: &'static str) -> AlgebraResult<()> {
    let left = expect_multivector(x, op)?;
    let right = expect_multivector(y, op)?;
    if left != right {
        return Err(AlgebraError::ShapeMismatch {
            op,
            expected: format!("{:?}", left),
            actual: right.to_vec(),
        });
    }
    Ok(())
}

/// Checks that `reference` broadcasts onto `target` without enlarging it:
/// right-aligned dims equal or 1, rank at most the target's.
pub fn expect_broadcastable<'a>(
    reference: &'a Tensor,
    target: &[usize],
    op: &'static str,
) -> AlgebraResult<&'a [usize]> {
    let dims = expect_multivector(reference, op)?;
    let fits = dims.len() <= target.len()
        && dims
            .iter()
            .rev()
            .zip(target.iter().rev())
            .all(|(&r, &t)| r == t || r == 1);
    if !fits {
        return Err(AlgebraError::ShapeMismatch {
            op,
            expected: format!("reference broadcastable to {:?}", target),
            actual: dims.to_vec(),
        });
    }
    Ok(dims)
}

/// Number of multi-vectors packed in a tensor of shape `(..., 16)`.
pub(crate) fn num_multivectors(dims: &[usize]) -> usize {
    dims[..dims.len() - 1].iter().product()
}
