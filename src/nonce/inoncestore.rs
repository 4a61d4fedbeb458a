// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use super::ledger::NonceLedger;
use async_trait::async_trait;

/// Interface to the durable backing of the nonce registry.
#[async_trait]
pub trait INonceStore: Send + Sync {
    /// Load the last persisted ledger.  A store that has never been written
    /// returns an empty ledger.
    async fn load(&self) -> Result<NonceLedger, Error>;

    /// Durably replace the persisted ledger with the supplied one.
    async fn save(&self, ledger: &NonceLedger) -> Result<(), Error>;
}
