// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use ark_ff::{BigInteger, PrimeField};

/// Length in bytes of every encoded field element
pub const FIELD_BYTES: usize = 32;

/// Decode a 32-byte big-endian hex string, with or without a `0x` prefix
pub fn bytes_from_hex(v: &str) -> Result<[u8; FIELD_BYTES], Error> {
    let digits = v.strip_prefix("0x").unwrap_or(v);

    if digits.len() != 2 * FIELD_BYTES {
        return Err(Error::Key(format!(
            "expecting {} hex digits, got {}",
            2 * FIELD_BYTES,
            digits.len()
        )));
    }

    let mut out = [0u8; FIELD_BYTES];
    hex::decode_to_slice(digits, &mut out).map_err(|e| Error::Key(e.to_string()))?;

    Ok(out)
}

/// Decode a field element from its hex form, reducing modulo the field order
pub fn field_from_hex<F: PrimeField>(v: &str) -> Result<F, Error> {
    Ok(F::from_be_bytes_mod_order(&bytes_from_hex(v)?))
}

pub fn field_to_bytes<F: PrimeField>(v: &F) -> [u8; FIELD_BYTES] {
    let be = v.into_bigint().to_bytes_be();

    // left-pad if the representation is ever shorter than a full word
    let mut out = [0u8; FIELD_BYTES];
    let n = be.len().min(FIELD_BYTES);
    out[FIELD_BYTES - n..].copy_from_slice(&be[be.len() - n..]);

    out
}

/// `0x`-prefixed, zero-padded, lowercase hex
pub fn field_to_hex<F: PrimeField>(v: &F) -> String {
    format!("0x{}", hex::encode(field_to_bytes(v)))
}
