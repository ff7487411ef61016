//! Vision encoder adaptor: gated FFN blocks plus the multi-vector reshape.
//!
//! ```text
//! embeddings (B, L, H)
//!        |
//!   AdaptorBlock x adpt_num_blocks     RMSNorm -> GLU(GELU) -> Linear -> + residual
//!        |
//!   reshape (B, L, H/16, 16)           view, no data movement
//! ```

use candle_core::{Module, Tensor, D};
use candle_nn::{Linear, RmsNorm, VarBuilder};

use img2pc_algebra::BASIS_DIM;

use crate::config::ModelConfig;
use crate::error::{map_candle, ModelResult};
use crate::shape::expect_embedding;

/// One pre-norm gated feed-forward block over plain embedding vectors.
///
/// The gate projection produces `2 * adpt_dim_intermediate` channels: the
/// first half is the value, the second half goes through the exact (erf) GELU
/// and gates the value. All projections are bias-free.
#[derive(Debug, Clone)]
pub struct AdaptorBlock {
    proj_gate: Linear,
    proj_next: Linear,
    layer_norm: RmsNorm,
    dim_hidden: usize,
    dim_intermediate: usize,
}

impl AdaptorBlock {
    /// Build the block; parameters live under `proj_gate`, `proj_next` and
    /// `layer_norm` in `vb`.
    ///
    /// # Errors
    /// - `ModelError::ConfigError` if the adaptor widths are invalid
    pub fn new(config: &ModelConfig, vb: VarBuilder) -> ModelResult<Self> {
        config.validate_adaptor_block()?;
        let (hidden, inter) = (config.adpt_dim_hidden, config.adpt_dim_intermediate);

        let proj_gate = candle_nn::linear_no_bias(hidden, 2 * inter, vb.pp("proj_gate"))
            .map_err(map_candle("AdaptorBlock proj_gate init"))?;
        let proj_next = candle_nn::linear_no_bias(inter, hidden, vb.pp("proj_next"))
            .map_err(map_candle("AdaptorBlock proj_next init"))?;
        let layer_norm = candle_nn::rms_norm(hidden, config.adpt_norm_eps, vb.pp("layer_norm"))
            .map_err(map_candle("AdaptorBlock layer_norm init"))?;

        tracing::debug!(
            "AdaptorBlock initialized: hidden={}, intermediate={}",
            hidden,
            inter
        );

        Ok(Self {
            proj_gate,
            proj_next,
            layer_norm,
            dim_hidden: hidden,
            dim_intermediate: inter,
        })
    }

    pub fn dim_hidden(&self) -> usize {
        self.dim_hidden
    }

    pub fn dim_intermediate(&self) -> usize {
        self.dim_intermediate
    }

    pub fn proj_gate(&self) -> &Linear {
        &self.proj_gate
    }

    pub fn proj_next(&self) -> &Linear {
        &self.proj_next
    }

    /// Transform `(B, L, adpt_dim_hidden)` into a tensor of the same shape.
    ///
    /// # Errors
    /// - `ModelError::ShapeMismatch` if `hidden` is not `(B, L, adpt_dim_hidden)`
    pub fn forward(&self, hidden: &Tensor) -> ModelResult<Tensor> {
        expect_embedding(hidden, self.dim_hidden, "AdaptorBlock")?;
        tracing::trace!("AdaptorBlock forward: {:?}", hidden.dims());
        let map = map_candle("AdaptorBlock forward");

        let normed = self.layer_norm.forward(hidden).map_err(&map)?;
        let projected = self.proj_gate.forward(&normed).map_err(&map)?;

        let inter = self.dim_intermediate;
        let value = projected.narrow(D::Minus1, 0, inter).map_err(&map)?;
        let gate = projected.narrow(D::Minus1, inter, inter).map_err(&map)?;
        let gated = gate
            .gelu_erf()
            .and_then(|g| g.mul(&value))
            .map_err(&map)?;

        self.proj_next
            .forward(&gated)
            .and_then(|out| out.add(hidden))
            .map_err(map)
    }
}

/// Sequential stack of [`AdaptorBlock`]s followed by the multi-vector reshape.
#[derive(Debug, Clone)]
pub struct AdaptorModel {
    blocks: Vec<AdaptorBlock>,
    dim_hidden: usize,
}

impl AdaptorModel {
    /// Build `adpt_num_blocks` blocks under `blocks.{i}` in `vb`.
    ///
    /// # Errors
    /// - `ModelError::ConfigError` if `adpt_dim_hidden` is not a multiple of 16
    ///   or any other adaptor width is invalid; no block is built in that case
    pub fn new(config: &ModelConfig, vb: VarBuilder) -> ModelResult<Self> {
        config.validate_adaptor()?;

        let vb_blocks = vb.pp("blocks");
        let blocks = (0..config.adpt_num_blocks)
            .map(|i| AdaptorBlock::new(config, vb_blocks.pp(i)))
            .collect::<ModelResult<Vec<_>>>()?;

        tracing::info!(
            "AdaptorModel initialized: {} blocks, hidden={} -> {} multi-vector channels",
            blocks.len(),
            config.adpt_dim_hidden,
            config.adpt_multivector_channels()
        );

        Ok(Self {
            blocks,
            dim_hidden: config.adpt_dim_hidden,
        })
    }

    pub fn blocks(&self) -> &[AdaptorBlock] {
        &self.blocks
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Number of multi-vector channels in the output.
    pub fn out_channels(&self) -> usize {
        self.dim_hidden / BASIS_DIM
    }

    /// Map encoder embeddings `(B, L, H)` to multi-vectors `(B, L, H/16, 16)`.
    ///
    /// # Errors
    /// - `ModelError::ShapeMismatch` if `hidden` is not `(B, L, adpt_dim_hidden)`
    pub fn forward(&self, hidden: &Tensor) -> ModelResult<Tensor> {
        let (batch, seq) = expect_embedding(hidden, self.dim_hidden, "AdaptorModel")?;

        let hidden = self
            .blocks
            .iter()
            .try_fold(hidden.clone(), |h, block| block.forward(&h))?;

        hidden
            .reshape((batch, seq, self.out_channels(), BASIS_DIM))
            .map_err(map_candle("AdaptorModel reshape"))
    }
}
