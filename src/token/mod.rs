// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

//! The token module turns an opaque Play Integrity token into a verified
//! [`AttestationStatement`].
//!
//! Two [`IVerificationBackend`] strategies are provided: [`LocalBackend`]
//! decrypts and verifies the token with the per-app keys held by the
//! operator, [`DelegatedBackend`] asks the Play Integrity service to decode
//! it.  A [`Verifier`] picks one of them according to the request [`Mode`].
//!
//! # Example
//!
//! ```
//! use playattest::token::{Error, Mode, Verifier};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! // nothing configured: local tokens cannot be decrypted
//! let v = Verifier::new();
//!
//! let r = v.verify("eyJhbGciOi...", Mode::Local).await;
//! assert!(matches!(r, Err(Error::Decryption(_))));
//!
//! let r = v.verify_named("eyJhbGciOi...", "carrier-pigeon").await;
//! assert!(matches!(r, Err(Error::UnknownMode(_))));
//! # });
//! ```

pub use self::delegated::{
    DelegatedBackend, ServiceAccount, DEFAULT_ENDPOINT, DEFAULT_REMOTE_TIMEOUT,
    PLAY_INTEGRITY_SCOPE,
};
pub use self::errors::Error;
pub use self::iverificationbackend::IVerificationBackend;
pub use self::local::LocalBackend;
pub use self::mode::Mode;
pub use self::statement::*;
pub use self::verifier::Verifier;

mod delegated;
mod errors;
mod iverificationbackend;
mod local;
mod mode;
mod statement;
mod verifier;
