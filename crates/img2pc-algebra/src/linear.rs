//! Equivariant linear map between multi-vector channel groups.

use candle_core::Tensor;
use candle_nn::{Init, VarBuilder};

use crate::basis::{self, BASIS_DIM, NUM_LINEAR_MAPS};
use crate::error::{map_candle, AlgebraError, AlgebraResult};
use crate::shape::{expect_channels, num_multivectors};

/// Channel-mixing linear layer that commutes with the algebra's symmetry group.
///
/// Every output channel is a learned combination, over input channels, of the
/// nine equivariant basis maps: the five grade projections `⟨x⟩_k` and the four
/// maps `x ↦ e0 ⟨x⟩_k` for `k = 0..3`. The optional bias only touches the
/// scalar component.
///
/// Parameters: `weight` of shape `(out_channels, in_channels, 9)` and
/// `bias` of shape `(out_channels,)`.
#[derive(Debug, Clone)]
pub struct EquiLinear {
    weight: Tensor,
    bias: Option<Tensor>,
    in_channels: usize,
    out_channels: usize,
}

impl EquiLinear {
    /// Builds the layer with a scalar bias.
    ///
    /// Weights default to `U(-1/sqrt(in), 1/sqrt(in))`, the bias to zero. When
    /// `vb` is backed by stored tensors those are used instead.
    pub fn new(in_channels: usize, out_channels: usize, vb: VarBuilder) -> AlgebraResult<Self> {
        for channels in [in_channels, out_channels] {
            if channels == 0 {
                return Err(AlgebraError::InvalidChannels {
                    op: "EquiLinear",
                    channels,
                });
            }
        }

        let bound = 1.0 / (in_channels as f64).sqrt();
        let weight = vb
            .get_with_hints(
                (out_channels, in_channels, NUM_LINEAR_MAPS),
                "weight",
                Init::Uniform {
                    lo: -bound,
                    up: bound,
                },
            )
            .map_err(map_candle("EquiLinear weight"))?;
        let bias = vb
            .get_with_hints(out_channels, "bias", Init::Const(0.0))
            .map_err(map_candle("EquiLinear bias"))?;

        tracing::trace!(
            "EquiLinear built: {} -> {} channels",
            in_channels,
            out_channels
        );

        Ok(Self {
            weight,
            bias: Some(bias),
            in_channels,
            out_channels,
        })
    }

    /// Wraps existing parameter tensors; pass `None` for a bias-free layer.
    pub fn from_weights(weight: Tensor, bias: Option<Tensor>) -> AlgebraResult<Self> {
        let (out_channels, in_channels, maps) =
            weight.dims3().map_err(|_| AlgebraError::ShapeMismatch {
                op: "EquiLinear",
                expected: format!("(out, in, {})", NUM_LINEAR_MAPS),
                actual: weight.dims().to_vec(),
            })?;
        if maps != NUM_LINEAR_MAPS {
            return Err(AlgebraError::ShapeMismatch {
                op: "EquiLinear",
                expected: format!("(out, in, {})", NUM_LINEAR_MAPS),
                actual: weight.dims().to_vec(),
            });
        }
        if let Some(bias) = &bias {
            if bias.dims() != [out_channels] {
                return Err(AlgebraError::ShapeMismatch {
                    op: "EquiLinear",
                    expected: format!("bias ({},)", out_channels),
                    actual: bias.dims().to_vec(),
                });
            }
        }
        Ok(Self {
            weight,
            bias,
            in_channels,
            out_channels,
        })
    }

    pub fn weight(&self) -> &Tensor {
        &self.weight
    }

    pub fn bias(&self) -> Option<&Tensor> {
        self.bias.as_ref()
    }

    pub fn in_channels(&self) -> usize {
        self.in_channels
    }

    pub fn out_channels(&self) -> usize {
        self.out_channels
    }

    /// Maps `(..., in_channels, 16)` to `(..., out_channels, 16)`.
    pub fn forward(&self, x: &Tensor) -> AlgebraResult<Tensor> {
        let dims = expect_channels(x, self.in_channels, "EquiLinear")?.to_vec();
        let n = num_multivectors(&dims[..dims.len() - 1]);
        let (cin, cout) = (self.in_channels, self.out_channels);
        let width = NUM_LINEAR_MAPS * BASIS_DIM;
        let map = map_candle("EquiLinear forward");

        let basis = basis::table_like(&basis::LINEAR_BASIS, (BASIS_DIM, width), x)?;
        let weight = self
            .weight
            .reshape((cout, cin * NUM_LINEAR_MAPS))
            .map_err(&map)?;

        // (n*cin, 16) -> (n*cin, 9*16): every basis map applied to every channel.
        let mapped = x
            .reshape((n * cin, BASIS_DIM))
            .and_then(|t| t.matmul(&basis))
            .and_then(|t| t.reshape((n, cin * NUM_LINEAR_MAPS, BASIS_DIM)))
            .map_err(&map)?;

        // Mix (channel, map) pairs into output channels per blade.
        let mixed = mapped
            .transpose(1, 2)
            .and_then(|t| t.contiguous())
            .and_then(|t| t.reshape((n * BASIS_DIM, cin * NUM_LINEAR_MAPS)))
            .and_then(|t| t.matmul(&weight.t()?))
            .and_then(|t| t.reshape((n, BASIS_DIM, cout)))
            .and_then(|t| t.transpose(1, 2))
            .and_then(|t| t.contiguous())
            .map_err(&map)?;

        let mixed = match &self.bias {
            Some(bias) => {
                let scalar = bias.reshape((cout, 1)).map_err(&map)?;
                let bias = basis::embed_scalar(&scalar)?;
                mixed.broadcast_add(&bias).map_err(&map)?
            }
            None => mixed,
        };

        let mut out_dims = dims;
        let channel_axis = out_dims.len() - 2;
        out_dims[channel_axis] = cout;
        mixed.reshape(out_dims).map_err(map)
    }
}
