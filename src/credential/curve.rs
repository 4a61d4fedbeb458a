// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

use ark_ec::models::CurveConfig;
use ark_ec::twisted_edwards::{Affine, MontCurveConfig, Projective, TECurveConfig};
use ark_ed_on_bn254::{Fq, Fr};
use ark_ff::MontFp;

/// Baby Jubjub in the coordinates used by circomlib:
/// `168700·x² + y² = 1 + 168696·x²·y²` over the BN254 scalar field.
///
/// `ark_ed_on_bn254` ships the same group rescaled to `a = 1`, whose points
/// have different x-coordinates.  Public keys and signatures are exchanged
/// with circuits and JavaScript verifiers, so they must be expressed in this
/// form.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct BabyJubjubConfig;

pub type Point = Affine<BabyJubjubConfig>;
pub type PointProjective = Projective<BabyJubjubConfig>;

/// Base8, the generator of the prime-order subgroup
pub const BASE8: Point = Point::new_unchecked(BASE8_X, BASE8_Y);

const BASE8_X: Fq =
    MontFp!("5299619240641551281634865583518297030282874472190772894086521144482721001553");
const BASE8_Y: Fq =
    MontFp!("16950150798460657717958625567821834550301663161624707787222815936182638968203");

impl CurveConfig for BabyJubjubConfig {
    type BaseField = Fq;
    type ScalarField = Fr;

    const COFACTOR: &'static [u64] = &[8];

    const COFACTOR_INV: Fr =
        MontFp!("2394026564107420727433200628387514462817212225638746351800188703329891451411");
}

impl TECurveConfig for BabyJubjubConfig {
    const COEFF_A: Fq = MontFp!("168700");
    const COEFF_D: Fq = MontFp!("168696");

    const GENERATOR: Point = BASE8;

    type MontCurveConfig = BabyJubjubConfig;
}

// A = 2(a + d) / (a - d), B = 4 / (a - d)
impl MontCurveConfig for BabyJubjubConfig {
    const COEFF_A: Fq = MontFp!("168698");
    const COEFF_B: Fq = MontFp!("1");

    type TECurveConfig = BabyJubjubConfig;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::encoding::field_to_hex;
    use ark_ec::{AffineRepr, CurveGroup};
    use ark_ff::{PrimeField, Zero};

    #[test]
    fn base8_is_the_circomlib_point() {
        assert!(BASE8.is_on_curve());
        assert!(BASE8.is_in_correct_subgroup_assuming_on_curve());
        assert_eq!(
            field_to_hex(&BASE8.x),
            "0x0bb77a6ad63e739b4eacb2e09d6277c12ab8d8010534e0b62893f3f6bb957051"
        );
        assert_eq!(
            field_to_hex(&BASE8.y),
            "0x25797203f7a0b24925572e1cd16bf9edfce0051fb9e133774b3c257a872d7d8b"
        );
    }

    #[test]
    fn subgroup_order() {
        let l = Fr::MODULUS;

        assert!(BASE8.mul_bigint(l).is_zero());
        assert!(!(BASE8 * Fr::from(2u64)).into_affine().is_zero());
    }

    #[test]
    fn arkworks_generator_is_not_on_this_curve() {
        let g = ark_ed_on_bn254::EdwardsAffine::generator();

        assert!(!Point::new_unchecked(g.x, g.y).is_on_curve());
    }
}
