// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use super::iverificationbackend::IVerificationBackend;
use super::statement::AttestationStatement;
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_ENDPOINT: &str = "https://playintegrity.googleapis.com";
pub const PLAY_INTEGRITY_SCOPE: &str = "https://www.googleapis.com/auth/playintegrity";
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_millis(5000);

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const GRANT_LIFETIME_SECS: i64 = 3600;

/// Service account credentials, in the layout of the JSON key file the
/// cloud console hands out.  Only `private_key`, `private_key_id`,
/// `client_email` and `token_uri` take part in the exchange.
#[derive(Clone, Default, Deserialize, Serialize)]
pub struct ServiceAccount {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub project_id: String,
    pub private_key_id: String,
    pub private_key: String,
    pub client_email: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub auth_uri: String,
    pub token_uri: String,
    #[serde(default)]
    pub auth_provider_x509_cert_url: String,
    #[serde(default)]
    pub client_x509_cert_url: String,
    #[serde(default)]
    pub universe_domain: String,
}

impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct GrantClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct AccessToken {
    access_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DecodeRequest<'a> {
    integrity_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DecodeResponse {
    token_payload_external: Option<Value>,
}

/// Has the Play Integrity service decode tokens on our behalf.
///
/// Each call performs a fresh OAuth2 JWT-bearer exchange followed by a
/// `decodeIntegrityToken` request.  Nothing is cached between calls and
/// failures are not retried.
pub struct DelegatedBackend {
    client: reqwest::Client,
    account: ServiceAccount,
    signing_key: EncodingKey,
    package_name: String,
    endpoint: String,
}

impl DelegatedBackend {
    pub fn new(
        account: ServiceAccount,
        package_name: &str,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let signing_key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())
            .map_err(|e| Error::Key(format!("service account private key: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::RemoteService(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            account,
            signing_key,
            package_name: package_name.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        })
    }

    /// Talk to a different Play Integrity endpoint
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    fn grant_assertion(&self) -> Result<String, Error> {
        let iat = chrono::Utc::now().timestamp();

        let claims = GrantClaims {
            iss: &self.account.client_email,
            scope: PLAY_INTEGRITY_SCOPE,
            aud: &self.account.token_uri,
            iat,
            exp: iat + GRANT_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.account.private_key_id.clone());

        jsonwebtoken::encode(&header, &claims, &self.signing_key)
            .map_err(|e| Error::RemoteService(format!("signing grant assertion: {e}")))
    }

    async fn access_token(&self) -> Result<String, Error> {
        let assertion = self.grant_assertion()?;

        let rsp = self
            .client
            .post(&self.account.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| Error::RemoteService(format!("token exchange: {e}")))?;

        if !rsp.status().is_success() {
            return Err(remote_failure("token exchange", rsp).await);
        }

        let token: AccessToken = rsp
            .json()
            .await
            .map_err(|e| Error::RemoteService(format!("token exchange reply: {e}")))?;

        Ok(token.access_token)
    }

    fn decode_url(&self) -> String {
        format!(
            "{}/v1/{}:decodeIntegrityToken",
            self.endpoint, self.package_name
        )
    }
}

#[async_trait]
impl IVerificationBackend for DelegatedBackend {
    async fn verify(&self, token: &str) -> Result<AttestationStatement, Error> {
        let access_token = self.access_token().await?;

        let rsp = self
            .client
            .post(self.decode_url())
            .bearer_auth(access_token)
            .json(&DecodeRequest {
                integrity_token: token,
            })
            .send()
            .await
            .map_err(|e| Error::RemoteService(format!("decodeIntegrityToken: {e}")))?;

        if !rsp.status().is_success() {
            return Err(remote_failure("decodeIntegrityToken", rsp).await);
        }

        let reply: DecodeResponse = rsp
            .json()
            .await
            .map_err(|e| Error::RemoteService(format!("decodeIntegrityToken reply: {e}")))?;

        let payload = reply.token_payload_external.ok_or_else(|| {
            Error::RemoteService("decodeIntegrityToken reply has no payload".to_string())
        })?;

        let statement = AttestationStatement::from_value(payload)?;

        debug!(?statement, "token decoded remotely");

        Ok(statement)
    }
}

/// Turn an unsuccessful reply into an error, surfacing the message the
/// remote end put in the body when there is one
async fn remote_failure(what: &str, rsp: reqwest::Response) -> Error {
    let status = rsp.status();
    let body = rsp.text().await.unwrap_or_default();

    let detail = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| error_message(&v))
        .unwrap_or(body);

    Error::RemoteService(format!("{what}: {status}: {detail}"))
}

fn error_message(v: &Value) -> Option<String> {
    v.pointer("/error/message")
        .or_else(|| v.get("error_description"))
        .or_else(|| v.get("error"))
        .and_then(Value::as_str)
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use openssl::pkey::PKey;
    use openssl::rsa::Rsa;

    fn account() -> ServiceAccount {
        let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
        let pem = key.private_key_to_pem_pkcs8().unwrap();

        ServiceAccount {
            kind: "service_account".to_string(),
            private_key_id: "k1".to_string(),
            private_key: String::from_utf8(pem).unwrap(),
            client_email: "verifier@example.iam.gserviceaccount.com".to_string(),
            token_uri: "https://oauth2.example.com/token".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn decode_url_layout() {
        let b = DelegatedBackend::new(account(), "com.example.app", DEFAULT_REMOTE_TIMEOUT)
            .unwrap()
            .with_endpoint("http://127.0.0.1:9/");

        assert_eq!(
            b.decode_url(),
            "http://127.0.0.1:9/v1/com.example.app:decodeIntegrityToken"
        );
    }

    #[test]
    fn grant_assertion_is_signed_rs256() {
        let b = DelegatedBackend::new(account(), "com.example.app", DEFAULT_REMOTE_TIMEOUT)
            .unwrap();

        let assertion = b.grant_assertion().unwrap();
        let header = jsonwebtoken::decode_header(&assertion).unwrap();

        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.kid.as_deref(), Some("k1"));
    }

    #[test]
    fn bad_private_key() {
        let mut a = account();
        a.private_key = "not a key".to_string();

        assert!(matches!(
            DelegatedBackend::new(a, "com.example.app", DEFAULT_REMOTE_TIMEOUT),
            Err(Error::Key(_))
        ));
    }

    #[test]
    fn debug_hides_private_key() {
        let a = account();
        let s = format!("{a:?}");

        assert!(!s.contains("PRIVATE KEY"));
        assert!(s.contains("verifier@example.iam.gserviceaccount.com"));
    }

    #[test]
    fn remote_error_messages() {
        let google = serde_json::json!({
            "error": { "code": 400, "message": "Integrity token cannot be decoded", "status": "INVALID_ARGUMENT" }
        });
        assert_eq!(
            error_message(&google).as_deref(),
            Some("Integrity token cannot be decoded")
        );

        let oauth = serde_json::json!({ "error": "invalid_grant", "error_description": "bad jwt" });
        assert_eq!(error_message(&oauth).as_deref(), Some("bad jwt"));

        assert_eq!(error_message(&serde_json::json!({})), None);
    }

    #[tokio::test]
    async fn unreachable_remote() {
        let mut a = account();
        // port 9 (discard) is not served on the loopback in test environments
        a.token_uri = "http://127.0.0.1:9/token".to_string();

        let b = DelegatedBackend::new(a, "com.example.app", Duration::from_millis(500)).unwrap();

        assert!(matches!(
            b.verify("token").await,
            Err(Error::RemoteService(_))
        ));
    }
}
