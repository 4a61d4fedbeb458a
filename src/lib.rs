// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

//! Play Integrity attestation checking and credential issuance.
//!
//! This crate verifies the attestation statements produced by the Android
//! Play Integrity service and, for statements that pass the operator's
//! policy, signs the caller's public key with the server's trusted
//! authority key.  For details about the token format, see the Play
//! Integrity [API] documentation.
//!
//! The API allows:
//! * Issuing and redeeming single-use nonces ([`nonce`])
//! * Decrypting and verifying integrity tokens locally, or having the Play
//!   Integrity service decode them ([`token`])
//! * Appraising the verified statement against a trust policy ([`policy`])
//! * Issuing EdDSA credentials over Baby Jubjub ([`credential`])
//! * Serving all of the above over HTTP ([`service`])
//!
//! [API]: https://developer.android.com/google/play/integrity/verdicts

mod base64;

pub mod config;
pub mod credential;
pub mod nonce;
pub mod policy;
pub mod service;
pub mod token;
