// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

//! circomlib-compatible Poseidon over the BN254 scalar field, which is the
//! base field of Baby Jubjub.

use super::encoding::field_to_bytes;
use super::errors::Error;
use ark_bn254::Fr as HashField;
use ark_ed_on_bn254::Fq;
use ark_ff::PrimeField;
use light_poseidon::{Poseidon, PoseidonHasher};

pub fn poseidon(inputs: &[Fq]) -> Result<Fq, Error> {
    let mut hasher =
        Poseidon::<HashField>::new_circom(inputs.len()).map_err(|e| Error::Hash(e.to_string()))?;

    let field_inputs: Vec<HashField> = inputs
        .iter()
        .map(|v| HashField::from_be_bytes_mod_order(&field_to_bytes(v)))
        .collect();

    let h = hasher
        .hash(&field_inputs)
        .map_err(|e| Error::Hash(e.to_string()))?;

    Ok(Fq::from_be_bytes_mod_order(&field_to_bytes(&h)))
}

/// The message a credential signs: the hash of the caller key coordinates
pub fn poseidon_hash_2(x: &Fq, y: &Fq) -> Result<Fq, Error> {
    poseidon(&[*x, *y])
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn circomlib_vector() {
        let h = poseidon_hash_2(&Fq::from(1u64), &Fq::from(2u64)).unwrap();

        assert_eq!(
            field_to_bytes(&h),
            hex!("115cc0f5e7d690413df64c6b9662e9cf2a3617f2743245519e19607a4417189a")
        );
    }

    #[test]
    fn arity_matters() {
        let one = Fq::from(1u64);

        assert_ne!(
            poseidon(&[one, one]).unwrap(),
            poseidon(&[one, one, one]).unwrap()
        );
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(poseidon(&[]), Err(Error::Hash(_))));
    }
}
