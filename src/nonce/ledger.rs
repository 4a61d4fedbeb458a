// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use super::value::Nonce;
use serde::{Deserialize, Serialize};

/// The persisted state of the nonce registry: two ordered collections, the
/// nonces handed out and not yet seen back, and those already redeemed.
///
/// `issued` is bounded by the registry, oldest first out.  `consumed` is
/// never pruned, since dropping an entry would turn a replay into an unknown
/// nonce; it grows by one entry per accepted check.
///
/// The legacy key names `nonceList` / `oldNonceList` are accepted on load.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct NonceLedger {
    #[serde(default, alias = "nonceList")]
    pub issued: Vec<String>,

    #[serde(default, alias = "oldNonceList")]
    pub consumed: Vec<String>,
}

/// Where a nonce currently sits in the ledger
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NonceState {
    Issued(usize),
    Consumed,
    Unknown,
}

impl NonceLedger {
    pub fn new() -> Self {
        Default::default()
    }

    /// Parse a ledger from its JSON document form
    pub fn parse(j: &str) -> Result<Self, Error> {
        serde_json::from_str(j).map_err(|e| Error::Syntax(e.to_string()))
    }

    /// Serialise the ledger to its JSON document form
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Syntax(e.to_string()))
    }

    pub fn state_of(&self, nonce: &Nonce) -> NonceState {
        let n = nonce.as_str();

        if let Some(pos) = self.issued.iter().position(|x| x == n) {
            return NonceState::Issued(pos);
        }

        if self.consumed.iter().any(|x| x == n) {
            return NonceState::Consumed;
        }

        NonceState::Unknown
    }

    /// Return a copy of the ledger with the issued entry at `pos` moved to the
    /// consumed collection
    pub fn with_consumed(&self, pos: usize) -> Self {
        let mut next = self.clone();
        let n = next.issued.remove(pos);
        next.consumed.push(n);
        next
    }

    /// Drop the oldest issued entries until at most `keep` remain, returning
    /// how many were dropped
    pub fn evict_issued(&mut self, keep: usize) -> usize {
        let excess = self.issued.len().saturating_sub(keep);
        self.issued.drain(..excess);
        excess
    }
}
