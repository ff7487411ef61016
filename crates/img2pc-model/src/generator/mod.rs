//! Point cloud generator layers over multi-vector hidden states.
//!
//! Every generator layer maps `(B, L, gnrt_dim_hidden, 16)` to the same shape
//! and may consult an optional reference multi-vector (used by the equivariant
//! join). Layers are composed into a [`GeneratorBlock`] from a tagged
//! sequence of [`LayerKind`]s.

mod bilinear;
mod block;
mod mlp;

pub use bilinear::GeneratorBilinear;
pub use block::GeneratorBlock;
pub use mlp::GeneratorMLP;

use candle_core::Tensor;
use serde::{Deserialize, Serialize};

use crate::error::ModelResult;

/// A hidden-to-hidden transform of the generator.
pub trait GeneratorLayer: Send + Sync {
    /// Transform `hidden` of shape `(B, L, C, 16)` into the same shape.
    fn forward(&self, hidden: &Tensor, reference: Option<&Tensor>) -> ModelResult<Tensor>;
}

/// Tags of the layer variants a generator block can be assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    /// [`GeneratorMLP`]: norm, geometric bilinear, gated GELU, projection, residual.
    BilinearMlp,
    /// Self-attention over point tokens. Declared, not yet implemented.
    SelfAttention,
    /// Cross-attention from point tokens to prompt tokens. Declared, not yet implemented.
    CrossAttention,
}

impl LayerKind {
    /// Whether a layer of this kind can be built.
    pub fn is_supported(self) -> bool {
        matches!(self, LayerKind::BilinearMlp)
    }
}
