// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;
use std::fmt;

/// The statement section a finding was raised against
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    RequestDetails,
    AppIntegrity,
    DeviceIntegrity,
    AccountDetails,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::RequestDetails => f.write_str("requestDetails"),
            Category::AppIntegrity => f.write_str("appIntegrity"),
            Category::DeviceIntegrity => f.write_str("deviceIntegrity"),
            Category::AccountDetails => f.write_str("accountDetails"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

/// What went wrong.  Serialises to the value of [`FindingKind::code`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingKind {
    MissingRequestDetails,
    InvalidNonce,
    PackageMismatch,
    StaleRequest,
    MissingAppIntegrity,
    AppNotRecognized,
    InvalidCertificateDigest,
    MissingDeviceIntegrity,
    EmulatorDetected,
    InsufficientDeviceIntegrity,
    MissingAccountDetails,
    UnlicensedApp,
}

impl FindingKind {
    pub fn code(&self) -> &'static str {
        match self {
            FindingKind::MissingRequestDetails => "missing-request-details",
            FindingKind::InvalidNonce => "invalid-nonce",
            FindingKind::PackageMismatch => "package-mismatch",
            FindingKind::StaleRequest => "stale-request",
            FindingKind::MissingAppIntegrity => "missing-app-integrity",
            FindingKind::AppNotRecognized => "app-not-recognized",
            FindingKind::InvalidCertificateDigest => "invalid-certificate-digest",
            FindingKind::MissingDeviceIntegrity => "missing-device-integrity",
            FindingKind::EmulatorDetected => "emulator-detected",
            FindingKind::InsufficientDeviceIntegrity => "insufficient-device-integrity",
            FindingKind::MissingAccountDetails => "missing-account-details",
            FindingKind::UnlicensedApp => "unlicensed-app",
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub category: Category,
    #[serde(rename = "code")]
    pub kind: FindingKind,
    pub severity: Severity,
    pub reason: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.category, self.reason, self.kind)
    }
}
