//! Bilinear products: geometric product, outer product and equivariant join.
//!
//! Each product flattens its operands to `(N, 16)`, forms the per-row outer
//! product `x ⊗ y` of shape `(N, 256)` and contracts it against a `(256, 16)`
//! table from [`crate::basis`].

use candle_core::{Tensor, D};

use crate::basis::{self, BASIS_DIM, E123_INDEX};
use crate::error::{map_candle, AlgebraResult};
use crate::shape::{expect_broadcastable, expect_same_shape, num_multivectors};

fn contract(x: &Tensor, y: &Tensor, table: &[f32], op: &'static str) -> AlgebraResult<Tensor> {
    expect_same_shape(x, y, op)?;
    let dims = x.dims().to_vec();
    let n = num_multivectors(&dims);

    let table = basis::table_like(table, (BASIS_DIM * BASIS_DIM, BASIS_DIM), x)?;
    let x = x.reshape((n, BASIS_DIM, 1)).map_err(map_candle(op))?;
    let y = y.reshape((n, 1, BASIS_DIM)).map_err(map_candle(op))?;

    x.broadcast_mul(&y)
        .and_then(|outer| outer.reshape((n, BASIS_DIM * BASIS_DIM)))
        .and_then(|outer| outer.matmul(&table))
        .and_then(|out| out.reshape(dims))
        .map_err(map_candle(op))
}

/// Geometric product of two multi-vector tensors of identical shape `(..., 16)`.
pub fn geometric_product(x: &Tensor, y: &Tensor) -> AlgebraResult<Tensor> {
    contract(x, y, &basis::GEOMETRIC_PRODUCT, "geometric_product")
}

/// Outer (wedge) product of two multi-vector tensors of identical shape.
pub fn outer_product(x: &Tensor, y: &Tensor) -> AlgebraResult<Tensor> {
    contract(x, y, &basis::OUTER_PRODUCT, "outer_product")
}

/// Equivariant join of `x` and `y`.
///
/// Without a reference this is the plain regressive product. With a
/// reference the result is scaled by the reference's `e123` component, which
/// restores equivariance under the odd elements of the symmetry group. The
/// reference must be a multi-vector tensor broadcastable to `x`, e.g.
/// `(B, L, 1, 16)` against `(B, L, C, 16)`.
pub fn equi_join(x: &Tensor, y: &Tensor, reference: Option<&Tensor>) -> AlgebraResult<Tensor> {
    let join = contract(x, y, &basis::JOIN, "equi_join")?;
    let Some(reference) = reference else {
        return Ok(join);
    };

    expect_broadcastable(reference, x.dims(), "equi_join")?;
    let scale = reference
        .narrow(D::Minus1, E123_INDEX, 1)
        .map_err(map_candle("equi_join"))?;
    join.broadcast_mul(&scale).map_err(map_candle("equi_join"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AlgebraError;
    use candle_core::{DType, Device};
    use rand::{Rng, SeedableRng};

    fn blade(index: usize, scale: f32) -> Tensor {
        let mut data = vec![0.0f32; BASIS_DIM];
        data[index] = scale;
        Tensor::from_vec(data, (1, BASIS_DIM), &Device::Cpu).unwrap()
    }

    fn random(shape: &[usize], seed: u64) -> Tensor {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let n: usize = shape.iter().product();
        let data: Vec<f32> = (0..n).map(|_| rng.gen_range(-1.0f32..1.0)).collect();
        Tensor::from_vec(data, shape, &Device::Cpu).unwrap()
    }

    fn values(t: &Tensor) -> Vec<f32> {
        t.flatten_all().unwrap().to_vec1().unwrap()
    }

    #[test]
    fn test_geometric_product_of_basis_vectors() {
        let out = geometric_product(&blade(2, 2.0), &blade(3, 3.0)).unwrap();
        let v = values(&out);
        assert_eq!(v[8], 6.0);
        assert_eq!(v.iter().filter(|&&x| x != 0.0).count(), 1);
    }

    #[test]
    fn test_geometric_product_scalar_is_identity() {
        let x = random(&[2, 3, BASIS_DIM], 7);
        let one = Tensor::ones((2, 3, 1), DType::F32, &Device::Cpu).unwrap();
        let one = basis::embed_scalar(&one).unwrap();
        let out = geometric_product(&one, &x).unwrap();
        for (a, b) in values(&out).iter().zip(values(&x).iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_geometric_product_preserves_shape() {
        let x = random(&[2, 4, 3, BASIS_DIM], 1);
        let y = random(&[2, 4, 3, BASIS_DIM], 2);
        let out = geometric_product(&x, &y).unwrap();
        assert_eq!(out.dims(), &[2, 4, 3, BASIS_DIM]);
    }

    #[test]
    fn test_geometric_product_rejects_mismatched_operands() {
        let x = random(&[2, 3, BASIS_DIM], 1);
        let y = random(&[2, 4, BASIS_DIM], 2);
        let err = geometric_product(&x, &y).unwrap_err();
        assert!(matches!(
            err,
            AlgebraError::ShapeMismatch {
                op: "geometric_product",
                ..
            }
        ));
    }

    #[test]
    fn test_outer_product_is_antisymmetric_on_vectors() {
        let a = outer_product(&blade(2, 1.0), &blade(4, 1.0)).unwrap();
        let b = outer_product(&blade(4, 1.0), &blade(2, 1.0)).unwrap();
        for (x, y) in values(&a).iter().zip(values(&b).iter()) {
            assert_eq!(*x, -*y);
        }
    }

    #[test]
    fn test_join_with_pseudoscalar_returns_operand() {
        let y = random(&[3, BASIS_DIM], 11);
        let pseudo = Tensor::zeros((3, BASIS_DIM), DType::F32, &Device::Cpu)
            .unwrap()
            .broadcast_add(&blade(15, 1.0))
            .unwrap();
        let out = equi_join(&pseudo, &y, None).unwrap();
        for (a, b) in values(&out).iter().zip(values(&y).iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_join_is_scaled_by_reference_e123() {
        let x = random(&[1, 2, 2, BASIS_DIM], 3);
        let y = random(&[1, 2, 2, BASIS_DIM], 4);
        let plain = equi_join(&x, &y, None).unwrap();

        let mut ref_data = vec![0.5f32; BASIS_DIM];
        ref_data[E123_INDEX] = -2.0;
        let reference = Tensor::from_vec(ref_data, (1, 1, 1, BASIS_DIM), &Device::Cpu).unwrap();
        let scaled = equi_join(&x, &y, Some(&reference)).unwrap();

        for (a, b) in values(&scaled).iter().zip(values(&plain).iter()) {
            assert!((a + 2.0 * b).abs() < 1e-5);
        }
    }

    #[test]
    fn test_join_rejects_unbroadcastable_reference() {
        let x = random(&[1, 2, 2, BASIS_DIM], 3);
        let reference = random(&[1, 3, 1, BASIS_DIM], 5);
        let err = equi_join(&x, &x, Some(&reference)).unwrap_err();
        assert!(matches!(err, AlgebraError::ShapeMismatch { op: "equi_join", .. }));

        let reference = random(&[1, 2, 1, 8], 5);
        assert!(equi_join(&x, &x, Some(&reference)).is_err());

        // A reference may not enlarge the operands' batch.
        let single = random(&[1, 1, 2, BASIS_DIM], 6);
        let reference = random(&[3, 1, 1, BASIS_DIM], 7);
        assert!(equi_join(&single, &single, Some(&reference)).is_err());
    }

    #[test]
    fn test_products_are_deterministic() {
        let x = random(&[2, 5, BASIS_DIM], 21);
        let y = random(&[2, 5, BASIS_DIM], 22);
        let a = values(&geometric_product(&x, &y).unwrap());
        let b = values(&geometric_product(&x, &y).unwrap());
        assert_eq!(a, b);
    }
}
