// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

#[derive(thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("Unknown nonce check: {0}")]
    UnknownNonceCheck(String),
    #[error("Unknown error level: {0}")]
    UnknownErrorLevel(String),
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::UnknownNonceCheck(e) | Error::UnknownErrorLevel(e) => {
                write!(f, "{}", e)
            }
        }
    }
}
