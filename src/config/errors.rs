// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

#[derive(thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Syntax error: {0}")]
    Syntax(String),
    #[error("Semantic error: {0}")]
    Sema(String),
    #[error("Key error: {0}")]
    Key(String),
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) | Error::Syntax(e) | Error::Sema(e) | Error::Key(e) => {
                write!(f, "{}", e)
            }
        }
    }
}
