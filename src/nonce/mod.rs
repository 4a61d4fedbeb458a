// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

//! The nonce module provides the anti-replay half of the attestation check:
//! a [`NonceRegistry`] that hands out single-use challenges and later redeems
//! them, backed by a pluggable [`INonceStore`].
//!
//! # Example
//!
//! ```
//! use playattest::nonce::{ConsumeResult, MemoNonceStore, NonceRegistry};
//! use std::sync::Arc;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let registry = NonceRegistry::open(Arc::new(MemoNonceStore::new())).await;
//!
//! let nonce = registry.issue().await;
//!
//! // the client embeds nonce.to_transport() in its integrity request ...
//!
//! assert_eq!(registry.try_consume(&nonce).await.unwrap(), ConsumeResult::Accepted);
//! assert_eq!(registry.try_consume(&nonce).await.unwrap(), ConsumeResult::Replayed);
//! # });
//! ```

pub use self::errors::Error;
pub use self::file_noncestore::FileNonceStore;
pub use self::inoncestore::INonceStore;
pub use self::ledger::NonceLedger;
pub use self::memo_noncestore::MemoNonceStore;
pub use self::registry::{ConsumeResult, NonceRegistry, DEFAULT_MAX_OUTSTANDING_NONCES};
pub use self::value::{Nonce, DEFAULT_NONCE_LENGTH};

mod errors;
mod file_noncestore;
mod inoncestore;
mod ledger;
mod memo_noncestore;
mod registry;
mod value;
