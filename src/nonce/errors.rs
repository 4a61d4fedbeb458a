// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

#[derive(thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Syntax error: {0}")]
    Syntax(String),
    #[error("Transport encoding error: {0}")]
    Transport(String),
    #[error("Task error: {0}")]
    Task(String),
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) | Error::Syntax(e) | Error::Transport(e) | Error::Task(e) => {
                write!(f, "{}", e)
            }
        }
    }
}
