// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

//! The policy module appraises a verified [`crate::token::AttestationStatement`]
//! against the operator's trust [`Policy`].
//!
//! A [`PolicyValidator`] looks at the four statement sections (request
//! details, app integrity, device integrity, account details) and reports
//! what it objects to as [`Finding`]s.  A statement with no findings earns
//! an [`Approval`], which is the only way to obtain a credential.
//!
//! # Example
//!
//! ```
//! use playattest::nonce::{MemoNonceStore, NonceRegistry};
//! use playattest::policy::{FindingKind, NonceCheck, Policy, PolicyValidator};
//! use playattest::token::AttestationStatement;
//! use std::sync::Arc;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let nonces = NonceRegistry::open(Arc::new(MemoNonceStore::new())).await;
//! let v = PolicyValidator::new(Policy::new("com.example.app", ["6a6a14"]), nonces);
//!
//! let appraisal = v
//!     .evaluate(&AttestationStatement::default(), NonceCheck::Server)
//!     .await;
//!
//! assert!(!appraisal.is_accepted());
//! assert_eq!(appraisal.findings()[0].kind, FindingKind::MissingRequestDetails);
//! # });
//! ```

pub use self::errors::Error;
pub use self::finding::{Category, Finding, FindingKind, Severity};
pub use self::trustpolicy::{ErrorLevel, Policy, DEFAULT_FRESHNESS_WINDOW_MS};
pub use self::validator::{Appraisal, Approval, NonceCheck, PolicyValidator};

mod errors;
mod finding;
mod trustpolicy;
mod validator;
