//! Projective geometric algebra primitives for equivariant networks.
//!
//! Multi-vectors of G(3,0,1) are stored as candle tensors whose trailing axis
//! holds the 16 blade coefficients; the axis before it indexes channels.
//!
//! # Primitives
//!
//! | Primitive | Input | Output |
//! |-----------|-------|--------|
//! | [`EquiLinear`] | `(..., c_in, 16)` | `(..., c_out, 16)` |
//! | [`EquiRmsNorm`] | `(..., c, 16)` | same shape |
//! | [`geometric_product`] | two `(..., 16)` of equal shape | same shape |
//! | [`equi_join`] | two `(..., 16)` + optional reference | same shape |
//! | [`scalar_gated_gelu`] | `(..., 16)` + [`GeluApproximation`] | same shape |
//!
//! All primitives are equivariant under the algebra's symmetry group and are
//! pure functions of their operands and parameters.
//!
//! # Example
//!
//! ```rust
//! use candle_core::{DType, Device, Tensor};
//! use img2pc_algebra::{geometric_product, BASIS_DIM};
//!
//! let x = Tensor::ones((2, 4, BASIS_DIM), DType::F32, &Device::Cpu).unwrap();
//! let y = geometric_product(&x, &x).unwrap();
//! assert_eq!(y.dims(), &[2, 4, BASIS_DIM]);
//! ```

pub mod activation;
pub mod basis;
pub mod error;
pub mod linear;
pub mod norm;
pub mod products;
pub mod shape;

pub use activation::{scalar_gated_gelu, GeluApproximation};
pub use basis::{embed_scalar, BASIS_DIM, BLADE_NAMES, GRADES, NUM_LINEAR_MAPS};
pub use error::{AlgebraError, AlgebraResult};
pub use linear::EquiLinear;
pub use norm::{EquiRmsNorm, DEFAULT_NORM_EPS};
pub use products::{equi_join, geometric_product, outer_product};
