// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

//! The credential module signs the caller's public key once its statement
//! has been approved.
//!
//! A [`Credential`] is an EdDSA signature over Baby Jubjub of
//! `Poseidon(x, y)`, `(x, y)` being the caller key coordinates, made by the
//! server's [`TrustedAuthority`].  Points use circomlib's coordinates (see
//! [`BabyJubjubConfig`]) so that credentials check out under circomlib's
//! `verifyPoseidon` and the matching circuits.  Issuance requires a
//! [`crate::policy::Approval`], so it cannot happen for a statement that has
//! not passed policy.

pub use self::authority::TrustedAuthority;
pub use self::curve::{BabyJubjubConfig, Point, BASE8};
pub use self::encoding::{bytes_from_hex, field_from_hex, field_to_hex};
pub use self::errors::Error;
pub use self::hash::{poseidon, poseidon_hash_2};
pub use self::issuer::{CallerPublicKey, CredentialIssuer};
pub use self::signature::Credential;

mod authority;
mod curve;
mod encoding;
mod errors;
mod hash;
mod issuer;
mod signature;
