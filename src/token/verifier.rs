// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use super::iverificationbackend::IVerificationBackend;
use super::mode::Mode;
use super::statement::AttestationStatement;
use std::sync::Arc;
use tracing::debug;

/// Dispatches a token to the backend selected by the request's mode.
///
/// Either backend may be left unconfigured, in which case tokens sent down
/// that path fail the same way a token that does not decrypt (local) or
/// that the remote service refuses (delegated) would.
#[derive(Clone, Default)]
pub struct Verifier {
    local: Option<Arc<dyn IVerificationBackend>>,
    delegated: Option<Arc<dyn IVerificationBackend>>,
}

impl Verifier {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_local(mut self, backend: impl IVerificationBackend + 'static) -> Self {
        self.local = Some(Arc::new(backend));
        self
    }

    pub fn with_delegated(mut self, backend: impl IVerificationBackend + 'static) -> Self {
        self.delegated = Some(Arc::new(backend));
        self
    }

    pub fn supports(&self, mode: Mode) -> bool {
        match mode {
            Mode::Local => self.local.is_some(),
            Mode::Delegated => self.delegated.is_some(),
        }
    }

    /// Verify `token` using the `mode` path
    pub async fn verify(&self, token: &str, mode: Mode) -> Result<AttestationStatement, Error> {
        debug!(%mode, "verifying integrity token");

        match mode {
            Mode::Local => match &self.local {
                Some(b) => b.verify(token).await,
                None => Err(Error::Decryption(
                    "local verification keys are not configured".to_string(),
                )),
            },
            Mode::Delegated => match &self.delegated {
                Some(b) => b.verify(token).await,
                None => Err(Error::RemoteService(
                    "delegated verification credentials are not configured".to_string(),
                )),
            },
        }
    }

    /// Like [`Verifier::verify`], with the mode given by name.  An unknown
    /// name fails with [`Error::UnknownMode`] before any backend is tried.
    pub async fn verify_named(
        &self,
        token: &str,
        mode: &str,
    ) -> Result<AttestationStatement, Error> {
        let mode: Mode = mode.parse()?;

        self.verify(token, mode).await
    }
}
