// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use super::statement::AttestationStatement;
use async_trait::async_trait;

/// A strategy that turns an opaque integrity token into a verified
/// [`AttestationStatement`].  Implementations hold no per-request state and
/// may be called concurrently.
#[async_trait]
pub trait IVerificationBackend: Send + Sync {
    async fn verify(&self, token: &str) -> Result<AttestationStatement, Error>;
}
