//! Geometric bilinear sub-layer of the generator MLP.

use candle_core::Tensor;
use candle_nn::VarBuilder;

use img2pc_algebra::{equi_join, geometric_product, EquiLinear, BASIS_DIM};

use crate::config::ModelConfig;
use crate::error::{map_candle, ModelResult};
use crate::shape::{expect_hidden, expect_reference};

use super::GeneratorLayer;

/// Operand groups of the bilinear projection, in channel order.
const LEFT_GEOMETRIC: usize = 0;
const RIGHT_GEOMETRIC: usize = 1;
const LEFT_JOIN: usize = 2;
const RIGHT_JOIN: usize = 3;
const NUM_OPERAND_GROUPS: usize = 4;

/// Geometric product and equivariant join side by side.
///
/// The hidden state is projected to `2 * gnrt_dim_intermediate` channels and
/// cut into four contiguous groups of `gnrt_dim_intermediate / 2` channels:
/// left/right operands of the geometric product, then left/right operands of
/// the join. The two results are concatenated back to `gnrt_dim_intermediate`
/// channels and projected to `gnrt_dim_hidden`.
#[derive(Debug, Clone)]
pub struct GeneratorBilinear {
    proj_bili: EquiLinear,
    proj_next: EquiLinear,
    dim_hidden: usize,
    operand_width: usize,
}

impl GeneratorBilinear {
    /// Build the layer; parameters live under `proj_bili` and `proj_next`.
    ///
    /// # Errors
    /// - `ModelError::ConfigError` if `gnrt_dim_intermediate` is odd or zero,
    ///   checked before any parameter is created
    pub fn new(config: &ModelConfig, vb: VarBuilder) -> ModelResult<Self> {
        config.validate_generator()?;
        let (hidden, inter) = (config.gnrt_dim_hidden, config.gnrt_dim_intermediate);

        let proj_bili = EquiLinear::new(hidden, 2 * inter, vb.pp("proj_bili"))?;
        let proj_next = EquiLinear::new(inter, hidden, vb.pp("proj_next"))?;

        tracing::debug!(
            "GeneratorBilinear initialized: hidden={}, intermediate={} ({} channels per operand)",
            hidden,
            inter,
            inter / 2
        );

        Ok(Self {
            proj_bili,
            proj_next,
            dim_hidden: hidden,
            operand_width: inter / 2,
        })
    }

    pub fn dim_hidden(&self) -> usize {
        self.dim_hidden
    }

    pub fn dim_intermediate(&self) -> usize {
        2 * self.operand_width
    }

    pub fn proj_bili(&self) -> &EquiLinear {
        &self.proj_bili
    }

    pub fn proj_next(&self) -> &EquiLinear {
        &self.proj_next
    }

    /// Channel range `[start, start + width)` of an operand group.
    fn operand(&self, projected: &Tensor, group: usize) -> ModelResult<Tensor> {
        projected
            .narrow(2, group * self.operand_width, self.operand_width)
            .map_err(map_candle("GeneratorBilinear split"))
    }
}

impl GeneratorLayer for GeneratorBilinear {
    fn forward(&self, hidden: &Tensor, reference: Option<&Tensor>) -> ModelResult<Tensor> {
        let (batch, seq) = expect_hidden(hidden, self.dim_hidden, "GeneratorBilinear")?;
        if let Some(reference) = reference {
            // The reference only meets the join operands.
            let operand = [batch, seq, self.operand_width, BASIS_DIM];
            expect_reference(reference, &operand, "GeneratorBilinear")?;
        }
        tracing::trace!("GeneratorBilinear forward: {:?}", hidden.dims());

        let projected = self.proj_bili.forward(hidden)?;
        debug_assert_eq!(
            projected.dims()[2],
            NUM_OPERAND_GROUPS * self.operand_width
        );

        let product = geometric_product(
            &self.operand(&projected, LEFT_GEOMETRIC)?,
            &self.operand(&projected, RIGHT_GEOMETRIC)?,
        )?;
        let join = equi_join(
            &self.operand(&projected, LEFT_JOIN)?,
            &self.operand(&projected, RIGHT_JOIN)?,
            reference,
        )?;

        let combined = Tensor::cat(&[&product, &join], 2)
            .map_err(map_candle("GeneratorBilinear concat"))?;
        Ok(self.proj_next.forward(&combined)?)
    }
}
