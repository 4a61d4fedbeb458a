// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

use super::curve::{Point, BASE8};
use super::encoding::{bytes_from_hex, field_to_bytes, field_to_hex};
use super::errors::Error;
use super::hash::poseidon;
use super::signature::Credential;
use ark_ec::{AffineRepr, CurveGroup};
use ark_ed_on_bn254::{Fq, Fr};
use ark_ff::{PrimeField, Zero};
use sha2::{Digest, Sha512};
use std::fmt;

/// The signing identity of this server.
///
/// Holds the private scalar `s` and the public point `A = s·B8`, in the
/// coordinates of [`super::BabyJubjubConfig`].  Only the
/// x-coordinate of `A` is published; clients pin it and send it back with
/// every check request.
pub struct TrustedAuthority {
    secret: Fr,
    public: Point,
}

impl TrustedAuthority {
    /// Build the authority from a 32-byte big-endian private scalar,
    /// reduced modulo the subgroup order.  A scalar that reduces to zero is
    /// refused.
    pub fn from_bytes(v: &[u8; 32]) -> Result<Self, Error> {
        let secret = Fr::from_be_bytes_mod_order(v);

        if secret.is_zero() {
            return Err(Error::Key(
                "trusted authority private key is zero".to_string(),
            ));
        }

        let public = (BASE8 * secret).into_affine();

        Ok(Self { secret, public })
    }

    /// As [`TrustedAuthority::from_bytes`], from 64 hex digits with an
    /// optional `0x` prefix
    pub fn from_hex(v: &str) -> Result<Self, Error> {
        let bytes = bytes_from_hex(v.trim())
            .map_err(|e| Error::Key(format!("trusted authority private key: {e}")))?;

        Self::from_bytes(&bytes)
    }

    pub fn public_key(&self) -> Point {
        self.public
    }

    /// The pinned form of the public key: `0x` followed by the 32-byte
    /// big-endian x-coordinate in hex
    pub fn authority_key(&self) -> String {
        field_to_hex(&self.public.x)
    }

    /// Sign `message` with deterministic EdDSA.  The result satisfies
    /// circomlib's `verifyPoseidon`, `S·B8 == R8 + 8·h·A`.
    pub fn sign(&self, message: &Fq) -> Result<Credential, Error> {
        // r = H(s || m) mod l
        let mut hasher = Sha512::new();
        hasher.update(field_to_bytes(&self.secret));
        hasher.update(field_to_bytes(message));
        let r = Fr::from_le_bytes_mod_order(&hasher.finalize());

        let r8 = (BASE8 * r).into_affine();

        let h = challenge(&r8, &self.public, message)?;

        Ok(Credential {
            r8,
            s: r + cofactor() * h * self.secret,
        })
    }

    /// Check `credential` is a signature of `message` under `public`
    pub fn verify_with(
        public: &Point,
        credential: &Credential,
        message: &Fq,
    ) -> Result<bool, Error> {
        let h = challenge(&credential.r8, public, message)?;

        let lhs = BASE8 * credential.s;
        let rhs = credential.r8.into_group() + *public * (cofactor() * h);

        Ok(lhs == rhs)
    }

    pub fn verify(&self, credential: &Credential, message: &Fq) -> Result<bool, Error> {
        Self::verify_with(&self.public, credential, message)
    }
}

impl fmt::Debug for TrustedAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustedAuthority")
            .field("authority_key", &self.authority_key())
            .finish_non_exhaustive()
    }
}

fn cofactor() -> Fr {
    Fr::from(8u64)
}

/// h = Poseidon(R8.x, R8.y, A.x, A.y, m) mod l
fn challenge(r8: &Point, public: &Point, message: &Fq) -> Result<Fr, Error> {
    let h = poseidon(&[r8.x, r8.y, public.x, public.y, *message])?;

    Ok(Fr::from_be_bytes_mod_order(&field_to_bytes(&h)))
}
