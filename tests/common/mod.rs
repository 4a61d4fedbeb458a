// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use openssl::aes::{wrap_key, AesKey};
use openssl::ec::{EcGroup, EcKey};
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::symm::{encrypt_aead, Cipher};
use playattest::config::Config;
use playattest::service::{self, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const PACKAGE: &str = "com.example.app";
pub const DIGEST: &str = "6a6a1474b5cbbb2b1aa57e0bc3";
pub const TA_KEY: &str = "0x0001020304050607080900010203040506070809000102030405060708090001";

pub const CALLER_X: &str = "0x1f2e3d4c5b6a79881f2e3d4c5b6a79881f2e3d4c5b6a79881f2e3d4c5b6a7988";
pub const CALLER_Y: &str = "0x2a3b4c5d6e7f80912a3b4c5d6e7f80912a3b4c5d6e7f80912a3b4c5d6e7f8091";

/// Operator keys for local verification, and the means to mint tokens
/// that they accept
pub struct LocalKeys {
    pub kek: [u8; 32],
    pub signer: PKey<Private>,
}

impl LocalKeys {
    pub fn generate() -> Self {
        let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();

        Self {
            kek: rand::random(),
            signer: PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap(),
        }
    }

    pub fn encoded_decryption_key(&self) -> String {
        STANDARD.encode(self.kek)
    }

    pub fn encoded_verification_key(&self) -> String {
        STANDARD.encode(self.signer.public_key_to_der().unwrap())
    }

    pub fn mint(&self, payload: &Value) -> String {
        mint_with(payload, &self.signer, &self.kek)
    }
}

/// Sign `payload` as an ES256 JWS with `signer`, then wrap it in an
/// A256KW/A256GCM JWE under `kek`
pub fn mint_with(payload: &Value, signer: &PKey<Private>, kek: &[u8; 32]) -> String {
    let pem = signer.private_key_to_pem_pkcs8().unwrap();
    let jws = jsonwebtoken::encode(
        &Header::new(Algorithm::ES256),
        payload,
        &EncodingKey::from_ec_pem(&pem).unwrap(),
    )
    .unwrap();

    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"A256KW","enc":"A256GCM"}"#);
    let cek: [u8; 32] = rand::random();
    let iv: [u8; 12] = rand::random();

    let mut wrapped = [0u8; 40];
    wrap_key(&AesKey::new_encrypt(kek).unwrap(), None, &mut wrapped, &cek).unwrap();

    let mut tag = [0u8; 16];
    let ct = encrypt_aead(
        Cipher::aes_256_gcm(),
        &cek,
        Some(&iv),
        header.as_bytes(),
        jws.as_bytes(),
        &mut tag,
    )
    .unwrap();

    [
        header,
        URL_SAFE_NO_PAD.encode(wrapped),
        URL_SAFE_NO_PAD.encode(iv),
        URL_SAFE_NO_PAD.encode(ct),
        URL_SAFE_NO_PAD.encode(tag),
    ]
    .join(".")
}

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// A statement that satisfies the test policy
pub fn good_payload(nonce: &str) -> Value {
    json!({
        "requestDetails": {
            "requestPackageName": PACKAGE,
            "nonce": nonce,
            "timestampMillis": now_ms().to_string()
        },
        "appIntegrity": {
            "appRecognitionVerdict": "PLAY_RECOGNIZED",
            "packageName": PACKAGE,
            "certificateSha256Digest": [DIGEST],
            "versionCode": "42"
        },
        "deviceIntegrity": {
            "deviceRecognitionVerdict": ["MEETS_STRONG_INTEGRITY"]
        },
        "accountDetails": {
            "appLicensingVerdict": "LICENSED"
        }
    })
}

pub fn base_config() -> Value {
    json!({
        "errorLevel": "error",
        "validCertificateSha256Digest": [DIGEST],
        "packageName": PACKAGE,
        "trustedAuthorityPrivateKey": TA_KEY,
        "ephemeralNonces": true
    })
}

pub fn local_config(keys: &LocalKeys) -> Value {
    let mut c = base_config();
    c["encodedDecryptionKey"] = json!(keys.encoded_decryption_key());
    c["encodedVerificationKey"] = json!(keys.encoded_verification_key());
    c
}

pub async fn app(config: &Value) -> (Router, Arc<AppState>) {
    let config = Config::from_json(&config.to_string()).unwrap();
    let state = Arc::new(AppState::from_config(&config).await.unwrap());

    (service::router(Arc::clone(&state)), state)
}

pub fn check_body(ta_key: &str, request_body: Value) -> Value {
    json!({
        "ta-public-key": ta_key,
        "camera-public-key": { "x": CALLER_X, "y": CALLER_Y },
        "request-body": request_body
    })
}

pub async fn get_nonce(app: &Router) -> String {
    let rsp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(service::NONCE_PATH)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(rsp.status(), StatusCode::OK);

    let body = axum::body::to_bytes(rsp.into_body(), usize::MAX)
        .await
        .unwrap();

    String::from_utf8(body.to_vec()).unwrap()
}

pub async fn post_raw(app: &Router, body: impl Into<Body>) -> (StatusCode, Value) {
    let rsp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(service::CHECK_PATH)
                .header("content-type", "application/json")
                .body(body.into())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = rsp.status();
    let body = axum::body::to_bytes(rsp.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, serde_json::from_slice(&body).unwrap())
}

pub async fn post_check(app: &Router, body: &Value) -> (StatusCode, Value) {
    post_raw(app, body.to_string()).await
}
