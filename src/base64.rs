// SPDX-License-Identifier: Apache-2.0

use base64::{self, engine::general_purpose, DecodeError, Engine as _};

/// decodes bytes from a base64url-encoded string without padding
pub fn decode_str(v: &str) -> Result<Vec<u8>, DecodeError> {
    general_purpose::URL_SAFE_NO_PAD.decode(v)
}

/// decodes bytes from a base64 string in either the standard or the URL-safe
/// alphabet, with or without trailing padding
pub fn decode_any(v: &str) -> Result<Vec<u8>, DecodeError> {
    let normalised: String = v
        .trim()
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            c => c,
        })
        .collect();

    general_purpose::URL_SAFE_NO_PAD.decode(normalised)
}

/// decodes bytes from a standard, padded base64 string (the encoding used for
/// key material in configuration files)
pub fn decode_std(v: &str) -> Result<Vec<u8>, DecodeError> {
    let compact: String = v.chars().filter(|c| !c.is_whitespace()).collect();

    general_purpose::STANDARD.decode(compact)
}

/// encodes bytes as base64url without padding
pub fn encode_url(v: impl AsRef<[u8]>) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(v)
}
