// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

#[derive(thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("Authority key mismatch: {0}")]
    AuthorityKeyMismatch(String),
    #[error("Key error: {0}")]
    Key(String),
    #[error("Hash error: {0}")]
    Hash(String),
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::AuthorityKeyMismatch(e) | Error::Key(e) | Error::Hash(e) => {
                write!(f, "{}", e)
            }
        }
    }
}
