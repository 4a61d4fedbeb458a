// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

//! Operator configuration: a camelCase JSON document turned into the policy,
//! the token verifier, the trusted authority and the nonce store.

pub use self::errors::Error;
pub use self::settings::{Config, DEFAULT_NONCE_STORE_PATH, TA_PRIVATE_KEY_ENV};

mod errors;
mod settings;
