// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use crate::base64;
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;
use std::fmt;

/// Default length (in characters) of a freshly generated nonce
pub const DEFAULT_NONCE_LENGTH: usize = 50;

/// A single-use challenge in its native form: a printable string over
/// `[A-Za-z0-9]`.  On the wire it travels base64url-encoded (see
/// [`Nonce::to_transport`]).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Nonce(String);

impl Nonce {
    /// Draw a new nonce of `len` characters from the OS CSPRNG
    pub fn generate(len: usize) -> Self {
        let s: String = OsRng
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect();

        Nonce(s)
    }

    /// Recover the native nonce from its transport form.  Both base64
    /// alphabets are accepted, padded or not, because the value may have
    /// been re-encoded by the attestation issuer.
    pub fn from_transport(v: &str) -> Result<Self, Error> {
        let raw = base64::decode_any(v).map_err(|e| Error::Transport(e.to_string()))?;

        let s = String::from_utf8(raw).map_err(|e| Error::Transport(e.to_string()))?;

        if s.is_empty() || !s.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::Transport(
                "decoded nonce is not alphanumeric".to_string(),
            ));
        }

        Ok(Nonce(s))
    }

    /// The base64url (unpadded) encoding handed out to clients
    pub fn to_transport(&self) -> String {
        base64::encode_url(self.0.as_bytes())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Nonce {
    fn from(v: String) -> Self {
        Nonce(v)
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nonce({})", self.0)
    }
}
