//! Basis blades and multiplication tables of the projective algebra G(3,0,1).
//!
//! Blades are encoded as 4-bit masks over the generators `e0..e3` (bit `g`
//! set means `e_g` is present). The storage order of the 16 components is
//!
//! ```text
//! [1, e0, e1, e2, e3, e01, e02, e03, e12, e13, e23, e012, e013, e023, e123, e0123]
//! ```
//!
//! All bilinear tables are flattened to `(256, 16)` so a product reduces to a
//! single matmul of the flattened outer product `x ⊗ y` against the table.

use candle_core::Tensor;
use once_cell::sync::Lazy;

use crate::error::{map_candle, AlgebraResult};

/// Number of components of a multi-vector.
pub const BASIS_DIM: usize = 16;

/// Number of equivariant linear basis maps (5 grade projections + 4 `e0` maps).
pub const NUM_LINEAR_MAPS: usize = 9;

/// Storage index of the `e123` component, used to scale the join.
pub const E123_INDEX: usize = 14;

/// Human readable blade names in storage order.
pub const BLADE_NAMES: [&str; BASIS_DIM] = [
    "1", "e0", "e1", "e2", "e3", "e01", "e02", "e03", "e12", "e13", "e23", "e012", "e013", "e023",
    "e123", "e0123",
];

/// Grade of every blade in storage order.
pub const GRADES: [usize; BASIS_DIM] = [0, 1, 1, 1, 1, 2, 2, 2, 2, 2, 2, 3, 3, 3, 3, 4];

const E0: u8 = 0b0001;
const PSEUDOSCALAR: u8 = 0b1111;

/// Bitmask of each blade in storage order.
const BLADES: [u8; BASIS_DIM] = [
    0b0000, 0b0001, 0b0010, 0b0100, 0b1000, 0b0011, 0b0101, 0b1001, 0b0110, 0b1010, 0b1100,
    0b0111, 0b1011, 0b1101, 0b1110, 0b1111,
];

/// Inverse of [`BLADES`]: storage index for each bitmask.
const BLADE_INDEX: [usize; BASIS_DIM] = [0, 1, 2, 5, 3, 6, 8, 11, 4, 7, 9, 12, 10, 13, 14, 15];

/// Components that enter the invariant inner product (no `e0` factor).
pub const INNER_PRODUCT_BLADES: [usize; 8] = [0, 2, 3, 4, 8, 9, 10, 14];

/// Sign picked up when reordering `a * b` into canonical generator order.
fn reordering_sign(a: u8, b: u8) -> f32 {
    let mut a = a >> 1;
    let mut swaps = 0u32;
    while a != 0 {
        swaps += (a & b).count_ones();
        a >>= 1;
    }
    if swaps % 2 == 0 {
        1.0
    } else {
        -1.0
    }
}

/// Geometric product of two basis blades; `None` when the degenerate `e0` squares away.
fn blade_product(a: u8, b: u8) -> Option<(f32, u8)> {
    if a & b & E0 != 0 {
        return None;
    }
    Some((reordering_sign(a, b), a ^ b))
}

/// Outer product of two basis blades; `None` when they share a generator.
fn blade_wedge(a: u8, b: u8) -> Option<(f32, u8)> {
    if a & b != 0 {
        return None;
    }
    Some((reordering_sign(a, b), a | b))
}

/// Sign `s` such that `e_A ∧ (s e_Ā) = e0123` for the complement `Ā`.
fn complement_sign(a: u8) -> f32 {
    blade_wedge(a, PSEUDOSCALAR ^ a).map_or(0.0, |(sign, _)| sign)
}

fn bilinear_table(op: impl Fn(u8, u8) -> Option<(f32, u8)>) -> Vec<f32> {
    let mut table = vec![0.0f32; BASIS_DIM * BASIS_DIM * BASIS_DIM];
    for (j, &a) in BLADES.iter().enumerate() {
        for (k, &b) in BLADES.iter().enumerate() {
            if let Some((sign, mask)) = op(a, b) {
                table[(j * BASIS_DIM + k) * BASIS_DIM + BLADE_INDEX[mask as usize]] += sign;
            }
        }
    }
    table
}

pub(crate) static GEOMETRIC_PRODUCT: Lazy<Vec<f32>> = Lazy::new(|| bilinear_table(blade_product));

pub(crate) static OUTER_PRODUCT: Lazy<Vec<f32>> = Lazy::new(|| bilinear_table(blade_wedge));

/// Regressive product `undual(dual(x) ∧ dual(y))` folded into one table.
pub(crate) static JOIN: Lazy<Vec<f32>> = Lazy::new(|| {
    bilinear_table(|a, b| {
        let (a_bar, b_bar) = (PSEUDOSCALAR ^ a, PSEUDOSCALAR ^ b);
        let (wedge_sign, mask) = blade_wedge(a_bar, b_bar)?;
        let target = PSEUDOSCALAR ^ mask;
        let sign =
            complement_sign(a) * complement_sign(b) * wedge_sign * complement_sign(target);
        Some((sign, target))
    })
});

/// The 9 equivariant maps packed as `(16, 9 * 16)`: entry `[j, m * 16 + i]`
/// is the coefficient of output blade `i` for input blade `j` under map `m`.
pub(crate) static LINEAR_BASIS: Lazy<Vec<f32>> = Lazy::new(|| {
    let width = NUM_LINEAR_MAPS * BASIS_DIM;
    let mut basis = vec![0.0f32; BASIS_DIM * width];
    for j in 0..BASIS_DIM {
        // Grade projections.
        basis[j * width + GRADES[j] * BASIS_DIM + j] = 1.0;
        // x -> e0 <x>_k for k = 0..3
        if GRADES[j] < 4 {
            if let Some((sign, mask)) = blade_product(E0, BLADES[j]) {
                let map = 5 + GRADES[j];
                basis[j * width + map * BASIS_DIM + BLADE_INDEX[mask as usize]] = sign;
            }
        }
    }
    basis
});

pub(crate) static INNER_PRODUCT_MASK: Lazy<Vec<f32>> = Lazy::new(|| {
    let mut mask = vec![0.0f32; BASIS_DIM];
    for &i in INNER_PRODUCT_BLADES.iter() {
        mask[i] = 1.0;
    }
    mask
});

/// Materializes a table on the device and dtype of `like`.
pub(crate) fn table_like(
    table: &[f32],
    shape: (usize, usize),
    like: &Tensor,
) -> AlgebraResult<Tensor> {
    Tensor::from_slice(table, shape, like.device())
        .and_then(|t| t.to_dtype(like.dtype()))
        .map_err(map_candle("table upload"))
}

/// Embeds a scalar tensor of shape `(..., 1)` into the scalar slot of a multi-vector.
pub fn embed_scalar(scalar: &Tensor) -> AlgebraResult<Tensor> {
    scalar
        .pad_with_zeros(candle_core::D::Minus1, 0, BASIS_DIM - 1)
        .map_err(map_candle("embed_scalar"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coefficient(table: &[f32], j: usize, k: usize, i: usize) -> f32 {
        table[(j * BASIS_DIM + k) * BASIS_DIM + i]
    }

    #[test]
    fn test_blade_index_inverts_blades() {
        for (i, &mask) in BLADES.iter().enumerate() {
            assert_eq!(BLADE_INDEX[mask as usize], i, "blade {}", BLADE_NAMES[i]);
            assert_eq!(mask.count_ones() as usize, GRADES[i]);
        }
    }

    #[test]
    fn test_metric_signature() {
        let gp = &*GEOMETRIC_PRODUCT;
        // e0 is null, e1..e3 square to +1.
        assert!((0..BASIS_DIM).all(|i| coefficient(gp, 1, 1, i) == 0.0));
        for g in 2..=4 {
            assert_eq!(coefficient(gp, g, g, 0), 1.0);
        }
    }

    #[test]
    fn test_geometric_product_anticommutes_vectors() {
        let gp = &*GEOMETRIC_PRODUCT;
        // e1 e2 = e12, e2 e1 = -e12
        assert_eq!(coefficient(gp, 2, 3, 8), 1.0);
        assert_eq!(coefficient(gp, 3, 2, 8), -1.0);
        // e12 e12 = -1
        assert_eq!(coefficient(gp, 8, 8, 0), -1.0);
    }

    #[test]
    fn test_outer_product_vanishes_on_shared_generator() {
        let op = &*OUTER_PRODUCT;
        assert!((0..BASIS_DIM).all(|i| coefficient(op, 2, 8, i) == 0.0));
        assert_eq!(coefficient(op, 2, 3, 8), 1.0);
    }

    #[test]
    fn test_pseudoscalar_is_join_identity() {
        let join = &*JOIN;
        for k in 0..BASIS_DIM {
            for i in 0..BASIS_DIM {
                let expected = if i == k { 1.0 } else { 0.0 };
                assert_eq!(coefficient(join, 15, k, i), expected);
            }
        }
    }

    #[test]
    fn test_linear_basis_has_nine_maps() {
        let width = NUM_LINEAR_MAPS * BASIS_DIM;
        let basis = &*LINEAR_BASIS;
        // Summing the grade projections reproduces the identity.
        for j in 0..BASIS_DIM {
            let total: f32 = (0..5).map(|m| basis[j * width + m * BASIS_DIM + j]).sum();
            assert_eq!(total, 1.0);
        }
        // Scalar maps to e0 under the first e0 map.
        assert_eq!(basis[5 * BASIS_DIM + 1], 1.0);
        // The pseudoscalar has no e0 image.
        assert!((0..4).all(|k| basis[15 * width + (5 + k) * BASIS_DIM..][..BASIS_DIM]
            .iter()
            .all(|&v| v == 0.0)));
    }

    #[test]
    fn test_inner_product_mask_skips_e0_blades() {
        let mask = &*INNER_PRODUCT_MASK;
        for (i, &m) in mask.iter().enumerate() {
            let has_e0 = BLADES[i] & E0 != 0;
            assert_eq!(m == 0.0, has_e0, "blade {}", BLADE_NAMES[i]);
        }
    }
}
