//! Residual equivariant MLP built around the geometric bilinear layer.

use candle_core::Tensor;
use candle_nn::VarBuilder;

use img2pc_algebra::{scalar_gated_gelu, EquiLinear, EquiRmsNorm, GeluApproximation};

use crate::config::ModelConfig;
use crate::error::{map_candle, ModelResult};
use crate::shape::expect_hidden;

use super::{GeneratorBilinear, GeneratorLayer};

/// Residual multi-vector MLP of the generator.
///
/// `x + proj_next(gelu(bilinear(norm(x), reference)))`, where the GELU is
/// gated by the scalar component of each multi-vector.
#[derive(Debug, Clone)]
pub struct GeneratorMLP {
    equi_bili: GeneratorBilinear,
    proj_next: EquiLinear,
    layer_norm: EquiRmsNorm,
    dim_hidden: usize,
}

impl GeneratorMLP {
    pub fn new(config: &ModelConfig, vb: VarBuilder) -> ModelResult<Self> {
        config.validate_generator()?;
        let hidden = config.gnrt_dim_hidden;

        let equi_bili = GeneratorBilinear::new(config, vb.pp("equi_bili"))?;
        let proj_next = EquiLinear::new(hidden, hidden, vb.pp("proj_next"))?;
        let layer_norm = EquiRmsNorm::new(hidden, config.gnrt_norm_eps, vb.pp("layer_norm"))?;

        tracing::debug!("GeneratorMLP initialized: hidden={}", hidden);

        Ok(Self {
            equi_bili,
            proj_next,
            layer_norm,
            dim_hidden: hidden,
        })
    }

    pub fn dim_hidden(&self) -> usize {
        self.dim_hidden
    }

    pub fn equi_bili(&self) -> &GeneratorBilinear {
        &self.equi_bili
    }

    pub fn proj_next(&self) -> &EquiLinear {
        &self.proj_next
    }

    pub fn layer_norm(&self) -> &EquiRmsNorm {
        &self.layer_norm
    }
}

impl GeneratorLayer for GeneratorMLP {
    fn forward(&self, hidden: &Tensor, reference: Option<&Tensor>) -> ModelResult<Tensor> {
        expect_hidden(hidden, self.dim_hidden, "GeneratorMLP")?;

        let normed = self.layer_norm.forward(hidden)?;
        let mixed = self.equi_bili.forward(&normed, reference)?;
        let activated = scalar_gated_gelu(&mixed, GeluApproximation::None)?;
        let out = self.proj_next.forward(&activated)?;

        out.add(hidden).map_err(map_candle("GeneratorMLP residual"))
    }
}
