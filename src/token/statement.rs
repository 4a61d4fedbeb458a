// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use serde::{Deserialize, Serialize};
use serde_with::formats::PreferOne;
use serde_with::{serde_as, DefaultOnNull, DisplayFromStr, OneOrMany, PickFirst};

pub const PLAY_RECOGNIZED: &str = "PLAY_RECOGNIZED";
pub const LICENSED: &str = "LICENSED";

pub const MEETS_BASIC_INTEGRITY: &str = "MEETS_BASIC_INTEGRITY";
pub const MEETS_DEVICE_INTEGRITY: &str = "MEETS_DEVICE_INTEGRITY";
pub const MEETS_STRONG_INTEGRITY: &str = "MEETS_STRONG_INTEGRITY";
pub const MEETS_VIRTUAL_INTEGRITY: &str = "MEETS_VIRTUAL_INTEGRITY";

/// Details about the integrity request, as seen by the issuer
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetails {
    /// The package name the request was made from
    pub request_package_name: Option<String>,

    /// The nonce supplied with the request, base64 encoded
    pub nonce: Option<String>,

    /// Request time in milliseconds since the epoch.  The issuer emits it as
    /// a decimal string; a plain number is accepted too.
    #[serde(alias = "timestampMs")]
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub timestamp_millis: Option<i64>,
}

/// Information about the calling app binary
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppIntegrity {
    /// e.g., PLAY_RECOGNIZED, UNRECOGNIZED_VERSION, UNEVALUATED
    pub app_recognition_verdict: Option<String>,

    pub package_name: Option<String>,

    /// Digests of the certificates the app was signed with
    pub certificate_sha256_digest: Option<Vec<String>>,

    pub version_code: Option<String>,
}

/// Information about the device the app runs on
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceIntegrity {
    /// Integrity markers.  The issuer sends a list; some intermediaries
    /// flatten it to a single delimited string.  Both end up here, and
    /// markers are matched as substrings of each entry.  An absent or null
    /// verdict means no markers.
    #[serde(default)]
    #[serde_as(as = "DefaultOnNull<OneOrMany<_, PreferOne>>")]
    pub device_recognition_verdict: Vec<String>,
}

impl DeviceIntegrity {
    pub fn has_marker(&self, marker: &str) -> bool {
        self.device_recognition_verdict
            .iter()
            .any(|v| v.contains(marker))
    }
}

/// Licensing information about the calling account
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDetails {
    /// e.g., LICENSED, UNLICENSED, UNEVALUATED
    pub app_licensing_verdict: Option<String>,
}

/// The verified payload of an integrity token.  Each section may be absent,
/// and absence is reported on its own by the policy validator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationStatement {
    pub request_details: Option<RequestDetails>,
    pub app_integrity: Option<AppIntegrity>,
    pub device_integrity: Option<DeviceIntegrity>,
    pub account_details: Option<AccountDetails>,
}

impl AttestationStatement {
    /// Parse a statement from a JSON document
    pub fn parse(buf: &[u8]) -> Result<Self, Error> {
        serde_json::from_slice(buf).map_err(|e| Error::MalformedPayload(e.to_string()))
    }

    /// Parse a statement from an already decoded JSON value
    pub fn from_value(v: serde_json::Value) -> Result<Self, Error> {
        serde_json::from_value(v).map_err(|e| Error::MalformedPayload(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_PAYLOAD_OK: &str = r#"{
        "requestDetails": {
            "requestPackageName": "com.example.app",
            "nonce": "YWJjZA",
            "timestampMillis": "1617893780000"
        },
        "appIntegrity": {
            "appRecognitionVerdict": "PLAY_RECOGNIZED",
            "packageName": "com.example.app",
            "certificateSha256Digest": ["6a6a1474b5cbbb2b1aa57e0bc3"],
            "versionCode": "42"
        },
        "deviceIntegrity": {
            "deviceRecognitionVerdict": ["MEETS_DEVICE_INTEGRITY"]
        },
        "accountDetails": {
            "appLicensingVerdict": "LICENSED"
        },
        "environmentDetails": {
            "appAccessRiskVerdict": {}
        }
    }"#;

    #[test]
    fn parse_full_payload() {
        let s = AttestationStatement::parse(TEST_PAYLOAD_OK.as_bytes()).unwrap();

        let rd = s.request_details.unwrap();
        assert_eq!(rd.request_package_name.as_deref(), Some("com.example.app"));
        assert_eq!(rd.nonce.as_deref(), Some("YWJjZA"));
        assert_eq!(rd.timestamp_millis, Some(1617893780000));

        let ai = s.app_integrity.unwrap();
        assert_eq!(ai.app_recognition_verdict.as_deref(), Some(PLAY_RECOGNIZED));
        assert_eq!(ai.certificate_sha256_digest.unwrap().len(), 1);

        let di = s.device_integrity.unwrap();
        assert!(di.has_marker(MEETS_DEVICE_INTEGRITY));
        assert!(!di.has_marker(MEETS_VIRTUAL_INTEGRITY));

        assert_eq!(
            s.account_details.unwrap().app_licensing_verdict.as_deref(),
            Some(LICENSED)
        );
    }

    #[test]
    fn sections_are_optional() {
        let s = AttestationStatement::parse(b"{}").unwrap();

        assert_eq!(s, AttestationStatement::default());
    }

    #[test]
    fn numeric_and_legacy_timestamp() {
        let s = AttestationStatement::parse(
            br#"{ "requestDetails": { "timestampMs": 1234 } }"#,
        )
        .unwrap();

        assert_eq!(s.request_details.unwrap().timestamp_millis, Some(1234));
    }

    #[test]
    fn device_verdict_as_delimited_string() {
        let s = AttestationStatement::parse(
            br#"{ "deviceIntegrity": { "deviceRecognitionVerdict": "MEETS_VIRTUAL_INTEGRITY|MEETS_BASIC_INTEGRITY" } }"#,
        )
        .unwrap();

        let di = s.device_integrity.unwrap();
        assert!(di.has_marker(MEETS_VIRTUAL_INTEGRITY));
        assert!(di.has_marker(MEETS_BASIC_INTEGRITY));
    }

    #[test]
    fn empty_device_section() {
        let s = AttestationStatement::parse(br#"{ "deviceIntegrity": {} }"#).unwrap();

        assert!(s.device_integrity.unwrap().device_recognition_verdict.is_empty());
    }

    #[test]
    fn null_device_verdict() {
        let s = AttestationStatement::parse(
            br#"{ "deviceIntegrity": { "deviceRecognitionVerdict": null } }"#,
        )
        .unwrap();

        let di = s.device_integrity.unwrap();
        assert!(di.device_recognition_verdict.is_empty());
        assert!(!di.has_marker(MEETS_BASIC_INTEGRITY));
    }

    #[test]
    fn malformed_payloads() {
        assert!(matches!(
            AttestationStatement::parse(b"not json"),
            Err(Error::MalformedPayload(_))
        ));
        assert!(matches!(
            AttestationStatement::parse(br#"{ "requestDetails": 3 }"#),
            Err(Error::MalformedPayload(_))
        ));
        assert!(matches!(
            AttestationStatement::parse(br#"{ "requestDetails": { "timestampMillis": "soon" } }"#),
            Err(Error::MalformedPayload(_))
        ));
    }
}
