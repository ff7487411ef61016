//! Generator block assembled from a tagged sequence of layers.

use candle_core::Tensor;
use candle_nn::VarBuilder;

use crate::config::ModelConfig;
use crate::error::{ModelError, ModelResult};
use crate::shape::expect_hidden;

use super::{GeneratorLayer, GeneratorMLP, LayerKind};

/// A generator block assembled from a tagged sequence of layers.
///
/// Layer `i` reads its parameters from `layers.{i}`. Layers run in order, each
/// receiving the previous layer's output and the same reference.
pub struct GeneratorBlock {
    layers: Vec<Box<dyn GeneratorLayer>>,
    kinds: Vec<LayerKind>,
    dim_hidden: usize,
}

impl GeneratorBlock {
    /// Build every layer in `kinds`.
    ///
    /// # Errors
    /// - `ModelError::ConfigError` if `kinds` is empty or the generator widths are invalid
    /// - `ModelError::UnsupportedLayer` for the first kind without an implementation
    ///
    /// All kinds are checked before the first layer is built.
    pub fn new(config: &ModelConfig, kinds: &[LayerKind], vb: VarBuilder) -> ModelResult<Self> {
        if kinds.is_empty() {
            return Err(ModelError::ConfigError {
                message: "GeneratorBlock needs at least one layer".to_string(),
            });
        }
        if let Some(&kind) = kinds.iter().find(|k| !k.is_supported()) {
            return Err(ModelError::UnsupportedLayer { kind });
        }
        config.validate_generator()?;

        let vb = vb.pp("layers");
        let layers = kinds
            .iter()
            .enumerate()
            .map(|(i, kind)| -> ModelResult<Box<dyn GeneratorLayer>> {
                match kind {
                    LayerKind::BilinearMlp => Ok(Box::new(GeneratorMLP::new(config, vb.pp(i))?)),
                    other => Err(ModelError::UnsupportedLayer { kind: *other }),
                }
            })
            .collect::<ModelResult<Vec<_>>>()?;

        tracing::info!("GeneratorBlock initialized: layers={:?}", kinds);

        Ok(Self {
            layers,
            kinds: kinds.to_vec(),
            dim_hidden: config.gnrt_dim_hidden,
        })
    }

    pub fn kinds(&self) -> &[LayerKind] {
        &self.kinds
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn dim_hidden(&self) -> usize {
        self.dim_hidden
    }
}

impl GeneratorLayer for GeneratorBlock {
    fn forward(&self, hidden: &Tensor, reference: Option<&Tensor>) -> ModelResult<Tensor> {
        expect_hidden(hidden, self.dim_hidden, "GeneratorBlock")?;
        self.layers
            .iter()
            .try_fold(hidden.clone(), |x, layer| layer.forward(&x, reference))
    }
}

impl std::fmt::Debug for GeneratorBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorBlock")
            .field("kinds", &self.kinds)
            .field("dim_hidden", &self.dim_hidden)
            .finish()
    }
}
