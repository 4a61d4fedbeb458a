// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

use super::authority::TrustedAuthority;
use super::encoding::{bytes_from_hex, field_from_hex, field_to_bytes};
use super::errors::Error;
use super::hash::poseidon_hash_2;
use super::signature::Credential;
use crate::policy::Approval;
use ark_ed_on_bn254::Fq;
use std::sync::Arc;
use tracing::info;

/// The public key the caller wants the credential bound to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallerPublicKey {
    pub x: Fq,
    pub y: Fq,
}

impl CallerPublicKey {
    /// Parse the coordinates from 32-byte big-endian hex, `0x` optional
    pub fn from_hex(x: &str, y: &str) -> Result<Self, Error> {
        Ok(Self {
            x: field_from_hex(x).map_err(|e| Error::Key(format!("x: {e}")))?,
            y: field_from_hex(y).map_err(|e| Error::Key(format!("y: {e}")))?,
        })
    }

    /// The message a credential for this key signs
    pub fn message(&self) -> Result<Fq, Error> {
        poseidon_hash_2(&self.x, &self.y)
    }
}

/// Issues credentials to callers whose statement passed policy
#[derive(Clone, Debug)]
pub struct CredentialIssuer {
    authority: Arc<TrustedAuthority>,
}

impl CredentialIssuer {
    pub fn new(authority: TrustedAuthority) -> Self {
        Self {
            authority: Arc::new(authority),
        }
    }

    /// See [`TrustedAuthority::authority_key`]
    pub fn authority_key(&self) -> String {
        self.authority.authority_key()
    }

    /// Check the caller expects credentials from this authority
    pub fn pin(&self, claimed: &str) -> Result<(), Error> {
        let expected = field_to_bytes(&self.authority.public_key().x);

        match bytes_from_hex(claimed.trim()) {
            Ok(b) if b == expected => Ok(()),
            Ok(_) => Err(Error::AuthorityKeyMismatch(format!(
                "claimed authority key {} is not {}",
                claimed,
                self.authority_key()
            ))),
            Err(e) => Err(Error::AuthorityKeyMismatch(format!(
                "claimed authority key is malformed: {e}"
            ))),
        }
    }

    /// Sign `Poseidon(x, y)` for `caller`.  The approval is used up whether
    /// or not issuance succeeds.
    pub fn issue(
        &self,
        _approval: Approval,
        caller: &CallerPublicKey,
        claimed: &str,
    ) -> Result<Credential, Error> {
        self.pin(claimed)?;

        let message = caller.message()?;

        let credential = self.authority.sign(&message)?;

        info!(authority_key = %self.authority_key(), "credential issued");

        Ok(credential)
    }

    /// Check `credential` was issued by this authority for `caller`
    pub fn verify(&self, credential: &Credential, caller: &CallerPublicKey) -> Result<bool, Error> {
        self.authority.verify(credential, &caller.message()?)
    }
}
