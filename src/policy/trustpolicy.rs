// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Maximum accepted age of a request, in milliseconds
pub const DEFAULT_FRESHNESS_WINDOW_MS: i64 = 10_000;

/// How the validator reacts to a finding
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorLevel {
    /// Evaluate every category and log every finding.  Any finding still
    /// rejects the statement.
    Log,
    /// Stop at the first finding
    Warn,
    /// Stop at the first finding
    #[default]
    Error,
}

impl ErrorLevel {
    pub fn is_fail_fast(&self) -> bool {
        !matches!(self, ErrorLevel::Log)
    }
}

impl FromStr for ErrorLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "log" => Ok(ErrorLevel::Log),
            "warn" => Ok(ErrorLevel::Warn),
            "error" => Ok(ErrorLevel::Error),
            unknown => Err(Error::UnknownErrorLevel(unknown.to_string())),
        }
    }
}

impl fmt::Display for ErrorLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorLevel::Log => f.write_str("log"),
            ErrorLevel::Warn => f.write_str("warn"),
            ErrorLevel::Error => f.write_str("error"),
        }
    }
}

/// The operator's trust policy.  Built once at startup and shared read-only
/// by every request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Policy {
    /// Package name the app must report, both in the request details and in
    /// the app integrity section
    pub package_name: String,

    /// Digests of the signing certificates the operator trusts
    pub trusted_digests: BTreeSet<String>,

    pub freshness_window_ms: i64,

    pub error_level: ErrorLevel,
}

impl Policy {
    pub fn new<I, S>(package_name: &str, trusted_digests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            package_name: package_name.to_string(),
            trusted_digests: trusted_digests.into_iter().map(Into::into).collect(),
            freshness_window_ms: DEFAULT_FRESHNESS_WINDOW_MS,
            error_level: ErrorLevel::default(),
        }
    }

    pub fn with_freshness_window(mut self, ms: i64) -> Self {
        self.freshness_window_ms = ms;
        self
    }

    pub fn with_error_level(mut self, level: ErrorLevel) -> Self {
        self.error_level = level;
        self
    }

    pub fn is_trusted_digest(&self, digest: &str) -> bool {
        self.trusted_digests.contains(digest)
    }
}
