//! Scalar-gated nonlinearity.

use candle_core::{Tensor, D};
use serde::{Deserialize, Serialize};

use crate::error::{map_candle, AlgebraResult};
use crate::shape::expect_multivector;

/// How the GELU gate is evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeluApproximation {
    /// Exact `x * Φ(x)` via the error function.
    #[default]
    None,
    /// Tanh approximation.
    Tanh,
}

/// Gates every multi-vector by the GELU of its own scalar component.
///
/// Computes `x * gelu(x[..., 0])`. Only the scalar (grade 0) component feeds
/// the gate, so the result stays equivariant.
pub fn scalar_gated_gelu(x: &Tensor, approximation: GeluApproximation) -> AlgebraResult<Tensor> {
    expect_multivector(x, "scalar_gated_gelu")?;
    let map = map_candle("scalar_gated_gelu");

    let gate = x.narrow(D::Minus1, 0, 1).map_err(&map)?;
    let gate = match approximation {
        GeluApproximation::None => gate.gelu_erf(),
        GeluApproximation::Tanh => gate.gelu(),
    }
    .map_err(&map)?;

    x.broadcast_mul(&gate).map_err(map)
}
