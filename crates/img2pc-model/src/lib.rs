//! Image to point-cloud model blocks.
//!
//! Vision encoder embeddings `(B, L, adpt_dim_hidden)` pass through the
//! [`AdaptorModel`], which refines them with gated feed-forward blocks and
//! reshapes them into multi-vectors `(B, L, adpt_dim_hidden / 16, 16)`. The
//! generator then transforms multi-vector hidden states with equivariant
//! layers ([`GeneratorMLP`], assembled into a [`GeneratorBlock`]).
//!
//! # Architecture
//!
//! - **ModelConfig**: Widths and epsilons, validated by every constructor
//! - **AdaptorBlock / AdaptorModel**: Gated FFN stack over flat embeddings
//! - **GeneratorBilinear**: Geometric product and join over channel groups
//! - **GeneratorMLP**: Residual equivariant MLP
//! - **GeneratorLayer**: Trait shared by every generator layer
//!
//! Geometric algebra primitives come from `img2pc_algebra`.
//!
//! # Example
//!
//! ```rust
//! use candle_core::{DType, Device, Tensor};
//! use candle_nn::VarBuilder;
//! use img2pc_model::{AdaptorModel, ModelConfig};
//!
//! let config = ModelConfig {
//!     adpt_num_blocks: 1,
//!     adpt_dim_hidden: 32,
//!     adpt_dim_intermediate: 16,
//!     ..Default::default()
//! };
//! let vb = VarBuilder::zeros(DType::F32, &Device::Cpu);
//! let adaptor = AdaptorModel::new(&config, vb).unwrap();
//!
//! let x = Tensor::zeros((1, 4, 32), DType::F32, &Device::Cpu).unwrap();
//! assert_eq!(adaptor.forward(&x).unwrap().dims(), &[1, 4, 2, 16]);
//! ```

pub mod adaptor;
pub mod config;
pub mod error;
pub mod generator;
mod shape;

pub use adaptor::{AdaptorBlock, AdaptorModel};
pub use config::ModelConfig;
pub use error::{ModelError, ModelResult};
pub use generator::{
    GeneratorBilinear, GeneratorBlock, GeneratorLayer, GeneratorMLP, LayerKind,
};
