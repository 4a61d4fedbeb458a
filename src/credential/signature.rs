// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

use super::curve::Point;
use super::encoding::{bytes_from_hex, field_from_hex, field_to_bytes, field_to_hex};
use super::errors::Error;
use ark_ed_on_bn254::Fr;
use ark_ff::PrimeField;
use serde::{Deserialize, Serialize};

/// An EdDSA signature `(R8, S)` over Baby Jubjub.
///
/// On the wire it is `{"r8": ["0x<R8.x>", "0x<R8.y>"], "s": "0x<S>"}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CredentialRepr", into = "CredentialRepr")]
pub struct Credential {
    pub r8: Point,
    pub s: Fr,
}

#[derive(Serialize, Deserialize)]
struct CredentialRepr {
    r8: [String; 2],
    s: String,
}

impl From<Credential> for CredentialRepr {
    fn from(c: Credential) -> Self {
        CredentialRepr {
            r8: [field_to_hex(&c.r8.x), field_to_hex(&c.r8.y)],
            s: field_to_hex(&c.s),
        }
    }
}

impl TryFrom<CredentialRepr> for Credential {
    type Error = Error;

    fn try_from(v: CredentialRepr) -> Result<Self, Self::Error> {
        let [x, y] = &v.r8;

        let r8 = Point::new_unchecked(field_from_hex(x)?, field_from_hex(y)?);

        if !r8.is_on_curve() || !r8.is_in_correct_subgroup_assuming_on_curve() {
            return Err(Error::Key("R8 is not a point of the signing subgroup".to_string()));
        }

        let raw = bytes_from_hex(&v.s)?;
        let s = Fr::from_be_bytes_mod_order(&raw);

        if field_to_bytes(&s) != raw {
            return Err(Error::Key("S is not below the subgroup order".to_string()));
        }

        Ok(Credential { r8, s })
    }
}
