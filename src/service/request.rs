// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

use super::error::ApiError;
use crate::credential::{bytes_from_hex, CallerPublicKey};
use crate::policy::NonceCheck;
use crate::token::Mode;
use serde::Deserialize;

/// Body of a check request
#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    /// The authority key the caller expects to be signed by
    #[serde(rename = "ta-public-key")]
    pub ta_public_key: String,

    #[serde(rename = "camera-public-key")]
    pub camera_public_key: CameraPublicKey,

    #[serde(rename = "request-body")]
    pub request_body: RequestBody,
}

#[derive(Debug, Deserialize)]
pub struct CameraPublicKey {
    pub x: String,
    pub y: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RequestBody {
    pub token: Option<String>,
    pub mode: Option<String>,
    pub nonce: Option<String>,
}

impl CheckRequest {
    pub fn parse(buf: &[u8]) -> Result<Self, ApiError> {
        serde_json::from_slice(buf).map_err(|e| ApiError::RequestValidation(e.to_string()))
    }

    pub fn token(&self) -> Result<&str, ApiError> {
        match self.request_body.token.as_deref() {
            Some(t) if !t.trim().is_empty() => Ok(t.trim()),
            _ => Err(ApiError::MissingToken),
        }
    }

    /// Defaults to [`NonceCheck::Server`]
    pub fn nonce_check(&self) -> Result<NonceCheck, ApiError> {
        match self.request_body.nonce.as_deref() {
            None => Ok(NonceCheck::default()),
            Some(v) => v
                .parse()
                .map_err(|e| ApiError::RequestValidation(format!("request-body.nonce: {e}"))),
        }
    }

    /// The claimed authority key, checked to be 32 bytes of hex
    pub fn authority_key(&self) -> Result<&str, ApiError> {
        let k = self.ta_public_key.trim();

        bytes_from_hex(k)
            .map_err(|e| ApiError::RequestValidation(format!("ta-public-key: {e}")))?;

        Ok(k)
    }

    pub fn caller_key(&self) -> Result<CallerPublicKey, ApiError> {
        CallerPublicKey::from_hex(&self.camera_public_key.x, &self.camera_public_key.y)
            .map_err(|e| ApiError::RequestValidation(format!("camera-public-key: {e}")))
    }

    /// Defaults to [`Mode::Delegated`]
    pub fn mode(&self) -> Result<Mode, ApiError> {
        match self.request_body.mode.as_deref() {
            None => Ok(Mode::default()),
            Some(v) => Ok(v.parse()?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token;

    const KEY: &str = "0x1f2e3d4c5b6a79881f2e3d4c5b6a79881f2e3d4c5b6a79881f2e3d4c5b6a7988";

    fn request(body: serde_json::Value) -> CheckRequest {
        let j = serde_json::json!({
            "ta-public-key": KEY,
            "camera-public-key": { "x": KEY, "y": KEY },
            "request-body": body
        });

        CheckRequest::parse(j.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn defaults() {
        let r = request(serde_json::json!({ "token": "abc" }));

        assert_eq!(r.token().unwrap(), "abc");
        assert_eq!(r.mode().unwrap(), Mode::Delegated);
        assert_eq!(r.nonce_check().unwrap(), NonceCheck::Server);
        assert!(r.caller_key().is_ok());
        assert_eq!(r.authority_key().unwrap(), KEY);
    }

    #[test]
    fn malformed_authority_key() {
        let not_hex = format!("0x{}", "zz".repeat(32));

        for k in ["0x1234", "", not_hex.as_str()] {
            let j = serde_json::json!({
                "ta-public-key": k,
                "camera-public-key": { "x": KEY, "y": KEY },
                "request-body": { "token": "abc" }
            });
            let r = CheckRequest::parse(j.to_string().as_bytes()).unwrap();

            assert!(matches!(
                r.authority_key(),
                Err(ApiError::RequestValidation(_))
            ));
        }
    }

    #[test]
    fn explicit_options() {
        let r = request(serde_json::json!({ "token": "abc", "mode": "server", "nonce": "device" }));

        assert_eq!(r.mode().unwrap(), Mode::Local);
        assert_eq!(r.nonce_check().unwrap(), NonceCheck::Device);
    }

    #[test]
    fn missing_or_blank_token() {
        assert!(matches!(
            request(serde_json::json!({})).token(),
            Err(ApiError::MissingToken)
        ));
        assert!(matches!(
            request(serde_json::json!({ "token": "  " })).token(),
            Err(ApiError::MissingToken)
        ));
    }

    #[test]
    fn invalid_options() {
        let r = request(serde_json::json!({ "token": "abc", "mode": "apple", "nonce": "client" }));

        assert!(matches!(
            r.nonce_check(),
            Err(ApiError::RequestValidation(_))
        ));
        assert!(matches!(
            r.mode(),
            Err(ApiError::Token(token::Error::UnknownMode(_)))
        ));
    }

    #[test]
    fn malformed_bodies() {
        assert!(matches!(
            CheckRequest::parse(b"nope"),
            Err(ApiError::RequestValidation(_))
        ));
        assert!(matches!(
            CheckRequest::parse(br#"{ "ta-public-key": "0x00" }"#),
            Err(ApiError::RequestValidation(_))
        ));
    }
}
