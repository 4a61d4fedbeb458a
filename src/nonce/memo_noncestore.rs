// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use super::ledger::NonceLedger;
use super::INonceStore;
use async_trait::async_trait;
use std::sync::RwLock;

/// A nonce store that lives only as long as the process.  Useful for tests
/// and for deployments that accept losing outstanding nonces on restart.
#[derive(Debug, Default)]
pub struct MemoNonceStore {
    l: RwLock<NonceLedger>,
}

impl MemoNonceStore {
    /// Returns a new empty MemoNonceStore
    pub fn new() -> Self {
        Self {
            l: Default::default(),
        }
    }

    /// Returns a MemoNonceStore seeded with the given ledger
    pub fn with_ledger(l: NonceLedger) -> Self {
        Self { l: RwLock::new(l) }
    }

    /// Return a copy of what was last saved
    pub fn snapshot(&self) -> NonceLedger {
        match self.l.read() {
            Ok(l) => l.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl INonceStore for MemoNonceStore {
    async fn load(&self) -> Result<NonceLedger, Error> {
        Ok(self.snapshot())
    }

    async fn save(&self, ledger: &NonceLedger) -> Result<(), Error> {
        let mut l = self
            .l
            .write()
            .map_err(|e| Error::Io(format!("memo store lock poisoned: {e}")))?;

        *l = ledger.clone();

        Ok(())
    }
}
