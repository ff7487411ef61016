//! Equivariant RMS normalization over multi-vector channels.

use candle_core::{Tensor, D};
use candle_nn::{Init, VarBuilder};

use crate::basis::{self, BASIS_DIM};
use crate::error::{map_candle, AlgebraError, AlgebraResult};
use crate::shape::expect_channels;

/// Default epsilon added to the mean squared norm.
pub const DEFAULT_NORM_EPS: f64 = 0.01;

/// RMS normalization using the invariant inner product of the algebra.
///
/// The squared norm of a multi-vector only counts the 8 blades without an
/// `e0` factor, which makes it invariant under the symmetry group. Norms are
/// averaged over the channel axis, there is no mean subtraction, and every
/// channel is rescaled by a learnable weight (initialized to one).
#[derive(Debug, Clone)]
pub struct EquiRmsNorm {
    weight: Tensor,
    channels: usize,
    eps: f64,
}

impl EquiRmsNorm {
    pub fn new(channels: usize, eps: f64, vb: VarBuilder) -> AlgebraResult<Self> {
        if channels == 0 {
            return Err(AlgebraError::InvalidChannels {
                op: "EquiRmsNorm",
                channels,
            });
        }
        let weight = vb
            .get_with_hints(channels, "weight", Init::Const(1.0))
            .map_err(map_candle("EquiRmsNorm weight"))?;
        Ok(Self {
            weight,
            channels,
            eps,
        })
    }

    pub fn weight(&self) -> &Tensor {
        &self.weight
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn eps(&self) -> f64 {
        self.eps
    }

    /// Normalizes `(..., channels, 16)`; output has the input's shape.
    pub fn forward(&self, x: &Tensor) -> AlgebraResult<Tensor> {
        expect_channels(x, self.channels, "EquiRmsNorm")?;
        let map = map_candle("EquiRmsNorm forward");

        let mask = basis::table_like(&basis::INNER_PRODUCT_MASK, (1, BASIS_DIM), x)?;
        let mask = mask.flatten_all().map_err(&map)?;
        let scale = self
            .weight
            .to_dtype(x.dtype())
            .and_then(|w| w.reshape((self.channels, 1)))
            .map_err(&map)?;

        let denom = x
            .sqr()
            .and_then(|sq| sq.broadcast_mul(&mask))
            .and_then(|sq| sq.sum_keepdim(D::Minus1))
            .and_then(|norms| norms.mean_keepdim(D::Minus2))
            .and_then(|mean| mean.affine(1.0, self.eps))
            .and_then(|mean| mean.sqrt())
            .map_err(&map)?;

        x.broadcast_div(&denom)
            .and_then(|normed| normed.broadcast_mul(&scale))
            .map_err(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};

    fn values(t: &Tensor) -> Vec<f32> {
        t.flatten_all().unwrap().to_vec1().unwrap()
    }

    fn norm(channels: usize) -> EquiRmsNorm {
        let varmap = candle_nn::VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        EquiRmsNorm::new(channels, 0.0, vb).unwrap()
    }

    #[test]
    fn test_unit_mean_square_after_norm() {
        let data: Vec<f32> = (0..2 * 3 * BASIS_DIM).map(|i| (i as f32 * 0.37).sin()).collect();
        let x = Tensor::from_vec(data, (2, 3, BASIS_DIM), &Device::Cpu).unwrap();
        let out = norm(3).forward(&x).unwrap();
        assert_eq!(out.dims(), x.dims());

        let v = values(&out);
        for row in v.chunks(3 * BASIS_DIM) {
            let total: f32 = row
                .chunks(BASIS_DIM)
                .map(|mv| {
                    basis::INNER_PRODUCT_BLADES
                        .iter()
                        .map(|&i| mv[i] * mv[i])
                        .sum::<f32>()
                })
                .sum();
            assert!((total / 3.0 - 1.0).abs() < 1e-4, "mean square {}", total / 3.0);
        }
    }

    #[test]
    fn test_e0_components_do_not_contribute() {
        let mut a = vec![0.0f32; BASIS_DIM];
        a[2] = 2.0;
        let mut b = a.clone();
        b[1] = 100.0;
        let xa = Tensor::from_vec(a, (1, BASIS_DIM), &Device::Cpu).unwrap();
        let xb = Tensor::from_vec(b, (1, BASIS_DIM), &Device::Cpu).unwrap();
        let layer = norm(1);
        let va = values(&layer.forward(&xa).unwrap());
        let vb = values(&layer.forward(&xb).unwrap());
        assert!((va[2] - 1.0).abs() < 1e-6);
        assert_eq!(va[2], vb[2]);
    }

    #[test]
    fn test_zero_input_stays_zero() {
        let vb = VarBuilder::zeros(DType::F32, &Device::Cpu);
        let layer = EquiRmsNorm::new(2, DEFAULT_NORM_EPS, vb).unwrap();
        let x = Tensor::zeros((1, 4, 2, BASIS_DIM), DType::F32, &Device::Cpu).unwrap();
        let out = layer.forward(&x).unwrap();
        assert!(values(&out).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_rejects_channel_mismatch() {
        let x = Tensor::zeros((1, 4, BASIS_DIM), DType::F32, &Device::Cpu).unwrap();
        assert!(matches!(
            norm(3).forward(&x),
            Err(AlgebraError::ShapeMismatch { op: "EquiRmsNorm", .. })
        ));
    }
}
