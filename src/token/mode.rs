// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use std::fmt;
use std::str::FromStr;

/// How an integrity token is turned into a verified statement
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Decrypt and verify on this server with operator-held keys
    Local,
    /// Have the Play Integrity service decode the token on our behalf
    #[default]
    Delegated,
}

impl FromStr for Mode {
    type Err = Error;

    /// `server` and `google` are the names older clients send
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" | "server" => Ok(Mode::Local),
            "delegated" | "google" => Ok(Mode::Delegated),
            unknown => Err(Error::UnknownMode(unknown.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Local => f.write_str("local"),
            Mode::Delegated => f.write_str("delegated"),
        }
    }
}
