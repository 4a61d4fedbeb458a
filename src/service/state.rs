// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

use crate::config::{self, Config};
use crate::credential::CredentialIssuer;
use crate::nonce::NonceRegistry;
use crate::policy::{Policy, PolicyValidator};
use crate::token::Verifier;
use std::sync::atomic::{AtomicU64, Ordering};

/// Everything a request handler needs, shared by all requests
pub struct AppState {
    pub nonces: NonceRegistry,
    pub verifier: Verifier,
    pub validator: PolicyValidator,
    pub issuer: CredentialIssuer,
    requests: AtomicU64,
}

impl AppState {
    pub fn new(
        policy: Policy,
        nonces: NonceRegistry,
        verifier: Verifier,
        issuer: CredentialIssuer,
    ) -> Self {
        Self {
            validator: PolicyValidator::new(policy, nonces.clone()),
            nonces,
            verifier,
            issuer,
            requests: AtomicU64::new(0),
        }
    }

    /// Assemble the state described by `config`
    pub async fn from_config(config: &Config) -> Result<Self, config::Error> {
        let verifier = config.verifier()?;
        let issuer = CredentialIssuer::new(config.trusted_authority()?);

        let nonces = NonceRegistry::open(config.nonce_store())
            .await
            .with_nonce_length(config.nonce_length)
            .with_max_outstanding(config.max_outstanding_nonces);

        Ok(Self::new(config.policy(), nonces, verifier, issuer))
    }

    /// Number the next check request, for log correlation only
    pub fn next_request_id(&self) -> u64 {
        self.requests.fetch_add(1, Ordering::Relaxed) + 1
    }
}
