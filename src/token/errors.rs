// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

#[derive(thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("Unknown verification mode: {0}")]
    UnknownMode(String),
    #[error("Decryption error: {0}")]
    Decryption(String),
    #[error("Signature error: {0}")]
    Signature(String),
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
    #[error("Remote service error: {0}")]
    RemoteService(String),
    #[error("Key error: {0}")]
    Key(String),
}

impl Error {
    /// A short, stable identifier for the error class
    pub fn code(&self) -> &'static str {
        match self {
            Error::UnknownMode(_) => "unknown-mode",
            Error::Decryption(_) => "decryption-error",
            Error::Signature(_) => "signature-error",
            Error::MalformedPayload(_) => "malformed-payload",
            Error::RemoteService(_) => "remote-service-error",
            Error::Key(_) => "key-error",
        }
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::UnknownMode(e)
            | Error::Decryption(e)
            | Error::Signature(e)
            | Error::MalformedPayload(e)
            | Error::RemoteService(e)
            | Error::Key(e) => {
                write!(f, "{}", e)
            }
        }
    }
}
