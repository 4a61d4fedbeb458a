// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use super::ledger::{NonceLedger, NonceState};
use super::value::{Nonce, DEFAULT_NONCE_LENGTH};
use super::INonceStore;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Outcome of an attempt to redeem a nonce
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsumeResult {
    /// The nonce was outstanding and is now consumed
    Accepted,
    /// The nonce had already been consumed: a replay
    Replayed,
    /// The nonce was never issued by this server
    Unknown,
}

/// Default bound on nonces handed out and not yet redeemed
pub const DEFAULT_MAX_OUTSTANDING_NONCES: usize = 10_000;

/// Issues single-use nonces and tracks their lifecycle.
///
/// At most `max_outstanding` nonces are kept issued; past that the oldest
/// are forgotten and later redeem as [`ConsumeResult::Unknown`].  This keeps
/// the document rewritten on every issue from growing with unredeemed
/// requests.
///
/// The in-memory ledger is the source of truth; every mutation is persisted
/// through the configured [`INonceStore`] while the ledger lock is held.
/// Cloning a registry yields another handle onto the same ledger.
#[derive(Clone)]
pub struct NonceRegistry {
    ledger: Arc<Mutex<NonceLedger>>,
    store: Arc<dyn INonceStore>,
    len: usize,
    max_outstanding: usize,
}

impl NonceRegistry {
    /// Open a registry over `store`, restoring whatever it last persisted.
    /// A store that cannot be read yields an empty registry: outstanding
    /// nonces are lost but the service stays available.
    pub async fn open(store: Arc<dyn INonceStore>) -> Self {
        let ledger = match store.load().await {
            Ok(l) => {
                info!(
                    issued = l.issued.len(),
                    consumed = l.consumed.len(),
                    "nonce ledger restored"
                );
                l
            }
            Err(e) => {
                warn!(error = %e, "nonce ledger unreadable, starting empty");
                NonceLedger::new()
            }
        };

        Self {
            ledger: Arc::new(Mutex::new(ledger)),
            store,
            len: DEFAULT_NONCE_LENGTH,
            max_outstanding: DEFAULT_MAX_OUTSTANDING_NONCES,
        }
    }

    /// Override the length of generated nonces
    pub fn with_nonce_length(mut self, len: usize) -> Self {
        self.len = len;
        self
    }

    /// Override the bound on outstanding nonces.  Zero is treated as one.
    pub fn with_max_outstanding(mut self, max: usize) -> Self {
        self.max_outstanding = max.max(1);
        self
    }

    /// Generate a new nonce and record it as issued.  A failure to persist is
    /// logged and otherwise ignored: the nonce remains redeemable for the
    /// lifetime of this process.
    pub async fn issue(&self) -> Nonce {
        let nonce = Nonce::generate(self.len);

        let mut ledger = self.ledger.lock().await;
        ledger.issued.push(nonce.as_str().to_owned());

        let evicted = ledger.evict_issued(self.max_outstanding);
        if evicted > 0 {
            debug!(evicted, "outstanding nonce limit reached, oldest dropped");
        }

        if let Err(e) = self.store.save(&ledger).await {
            warn!(error = %e, "persisting issued nonce failed, continuing in memory");
        }

        info!(nonce = %nonce, "nonce issued");

        nonce
    }

    /// Redeem `nonce`.
    ///
    /// The lookup, the move from issued to consumed and its persistence form
    /// one critical section, so concurrent callers presenting the same nonce
    /// see exactly one `Accepted`.  The section runs in its own task and is
    /// not cut short if the caller goes away.  The in-memory move is only
    /// committed once the store has accepted it; on a store error the nonce
    /// stays issued and the error is returned.
    pub async fn try_consume(&self, nonce: &Nonce) -> Result<ConsumeResult, Error> {
        let ledger = Arc::clone(&self.ledger);
        let store = Arc::clone(&self.store);
        let nonce = nonce.clone();

        let handle = tokio::spawn(consume_locked(ledger, store, nonce));

        handle.await.map_err(|e| Error::Task(e.to_string()))?
    }

    /// Return a copy of the current ledger
    pub async fn snapshot(&self) -> NonceLedger {
        self.ledger.lock().await.clone()
    }
}

async fn consume_locked(
    ledger: Arc<Mutex<NonceLedger>>,
    store: Arc<dyn INonceStore>,
    nonce: Nonce,
) -> Result<ConsumeResult, Error> {
    let mut ledger = ledger.lock().await;

    match ledger.state_of(&nonce) {
        NonceState::Issued(pos) => {
            let next = ledger.with_consumed(pos);

            store.save(&next).await?;

            *ledger = next;

            debug!(nonce = %nonce, "nonce consumed");

            Ok(ConsumeResult::Accepted)
        }
        NonceState::Consumed => {
            error!(
                nonce = %nonce,
                category = "replayed-nonce",
                "duplicated use of nonce, potential replay attack"
            );
            Ok(ConsumeResult::Replayed)
        }
        NonceState::Unknown => {
            warn!(
                nonce = %nonce,
                category = "unknown-nonce",
                "nonce was not previously generated on this server"
            );
            Ok(ConsumeResult::Unknown)
        }
    }
}
