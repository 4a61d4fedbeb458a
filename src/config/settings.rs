// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use crate::credential::TrustedAuthority;
use crate::nonce::{
    FileNonceStore, INonceStore, MemoNonceStore, DEFAULT_MAX_OUTSTANDING_NONCES,
    DEFAULT_NONCE_LENGTH,
};
use crate::policy::{ErrorLevel, Policy, DEFAULT_FRESHNESS_WINDOW_MS};
use crate::token::{
    DelegatedBackend, LocalBackend, ServiceAccount, Verifier, DEFAULT_REMOTE_TIMEOUT,
};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Environment variable holding the trusted authority private key.  It takes
/// precedence over `trustedAuthorityPrivateKey`.
pub const TA_PRIVATE_KEY_ENV: &str = "PLAYATTEST_TA_PRIVATE_KEY";

fn default_freshness_window_ms() -> i64 {
    DEFAULT_FRESHNESS_WINDOW_MS
}

fn default_nonce_length() -> usize {
    DEFAULT_NONCE_LENGTH
}

/// Nonce ledger location when `nonceStorePath` is not given.  Relative paths
/// are taken from the directory of the configuration file.
pub const DEFAULT_NONCE_STORE_PATH: &str = "nonces.json";

fn default_nonce_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_NONCE_STORE_PATH)
}

fn default_max_outstanding_nonces() -> usize {
    DEFAULT_MAX_OUTSTANDING_NONCES
}

fn default_remote_timeout_ms() -> u64 {
    DEFAULT_REMOTE_TIMEOUT.as_millis() as u64
}

/// The operator configuration, read once at startup.
///
/// Malformed configuration is fatal: every accessor that builds a runtime
/// component reports what is wrong instead of falling back to a default.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub error_level: ErrorLevel,

    /// Signing certificate digests of trusted app builds
    pub valid_certificate_sha256_digest: Vec<String>,

    pub package_name: String,

    /// AES-256 key for local decryption, base64
    pub encoded_decryption_key: Option<String>,

    /// DER SubjectPublicKeyInfo of the ES256 key for local verification,
    /// base64
    pub encoded_verification_key: Option<String>,

    /// Service account for delegated verification
    pub google_credentials: Option<ServiceAccount>,

    /// 32-byte hex scalar
    pub trusted_authority_private_key: Option<String>,

    #[serde(default = "default_freshness_window_ms")]
    pub freshness_window_ms: i64,

    #[serde(default = "default_nonce_length")]
    pub nonce_length: usize,

    /// Where nonces are persisted
    #[serde(default = "default_nonce_store_path")]
    pub nonce_store_path: PathBuf,

    /// Keep nonces in memory only, losing them on restart
    #[serde(default)]
    pub ephemeral_nonces: bool,

    #[serde(default = "default_max_outstanding_nonces")]
    pub max_outstanding_nonces: usize,

    #[serde(default = "default_remote_timeout_ms")]
    pub remote_timeout_ms: u64,

    pub play_integrity_endpoint: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("error_level", &self.error_level)
            .field(
                "valid_certificate_sha256_digest",
                &self.valid_certificate_sha256_digest,
            )
            .field("package_name", &self.package_name)
            .field("local", &self.encoded_decryption_key.is_some())
            .field("google_credentials", &self.google_credentials)
            .field("freshness_window_ms", &self.freshness_window_ms)
            .field("nonce_length", &self.nonce_length)
            .field("nonce_store_path", &self.nonce_store_path)
            .field("ephemeral_nonces", &self.ephemeral_nonces)
            .field("max_outstanding_nonces", &self.max_outstanding_nonces)
            .field("remote_timeout_ms", &self.remote_timeout_ms)
            .field("play_integrity_endpoint", &self.play_integrity_endpoint)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Read and validate the JSON configuration file at `path`.  A relative
    /// `nonceStorePath` is resolved against the directory holding the file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let j = std::fs::read_to_string(path)
            .map_err(|e| Error::Io(format!("{}: {e}", path.display())))?;

        let mut c = Self::from_json(&j)?;

        if c.nonce_store_path.is_relative() {
            if let Some(dir) = path.parent() {
                c.nonce_store_path = dir.join(&c.nonce_store_path);
            }
        }

        Ok(c)
    }

    pub fn from_json(j: &str) -> Result<Self, Error> {
        let c: Config = serde_json::from_str(j).map_err(|e| Error::Syntax(e.to_string()))?;

        c.validate()?;

        Ok(c)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.package_name.is_empty() {
            return Err(Error::Sema("packageName is empty".to_string()));
        }

        if self.freshness_window_ms <= 0 {
            return Err(Error::Sema(format!(
                "freshnessWindowMs must be positive, got {}",
                self.freshness_window_ms
            )));
        }

        if self.nonce_length == 0 {
            return Err(Error::Sema("nonceLength must be positive".to_string()));
        }

        if self.max_outstanding_nonces == 0 {
            return Err(Error::Sema(
                "maxOutstandingNonces must be positive".to_string(),
            ));
        }

        if !self.ephemeral_nonces && self.nonce_store_path.as_os_str().is_empty() {
            return Err(Error::Sema("nonceStorePath is empty".to_string()));
        }

        if self.remote_timeout_ms == 0 {
            return Err(Error::Sema("remoteTimeoutMs must be positive".to_string()));
        }

        match (&self.encoded_decryption_key, &self.encoded_verification_key) {
            (Some(_), None) | (None, Some(_)) => {
                return Err(Error::Sema(
                    "encodedDecryptionKey and encodedVerificationKey must be given together"
                        .to_string(),
                ))
            }
            _ => {}
        }

        if !self.has_local() && self.google_credentials.is_none() {
            return Err(Error::Sema(
                "no verification path configured: set the local key pair, googleCredentials, or both"
                    .to_string(),
            ));
        }

        Ok(())
    }

    fn has_local(&self) -> bool {
        self.encoded_decryption_key.is_some() && self.encoded_verification_key.is_some()
    }

    pub fn policy(&self) -> Policy {
        Policy::new(&self.package_name, self.valid_certificate_sha256_digest.iter().cloned())
            .with_freshness_window(self.freshness_window_ms)
            .with_error_level(self.error_level)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }

    /// Build the token verifier from whichever key material is present
    pub fn verifier(&self) -> Result<Verifier, Error> {
        let mut v = Verifier::new();

        if let (Some(dk), Some(vk)) = (&self.encoded_decryption_key, &self.encoded_verification_key)
        {
            let local =
                LocalBackend::from_encoded(dk, vk).map_err(|e| Error::Key(e.to_string()))?;
            v = v.with_local(local);
        }

        if let Some(account) = &self.google_credentials {
            let mut delegated =
                DelegatedBackend::new(account.clone(), &self.package_name, self.remote_timeout())
                    .map_err(|e| Error::Key(e.to_string()))?;

            if let Some(endpoint) = &self.play_integrity_endpoint {
                delegated = delegated.with_endpoint(endpoint);
            }

            v = v.with_delegated(delegated);
        }

        Ok(v)
    }

    /// Load the trusted authority key from the environment, or failing that
    /// from the configuration
    pub fn trusted_authority(&self) -> Result<TrustedAuthority, Error> {
        self.trusted_authority_with(std::env::var(TA_PRIVATE_KEY_ENV).ok())
    }

    pub(crate) fn trusted_authority_with(
        &self,
        from_env: Option<String>,
    ) -> Result<TrustedAuthority, Error> {
        let key = from_env
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.trusted_authority_private_key.clone())
            .ok_or_else(|| {
                Error::Key(format!(
                    "trusted authority private key not set: use {TA_PRIVATE_KEY_ENV} or trustedAuthorityPrivateKey"
                ))
            })?;

        TrustedAuthority::from_hex(&key).map_err(|e| Error::Key(e.to_string()))
    }

    /// The nonce store: the file at `nonceStorePath`, or memory when
    /// `ephemeralNonces` is set
    pub fn nonce_store(&self) -> Arc<dyn INonceStore> {
        if self.ephemeral_nonces {
            Arc::new(MemoNonceStore::new())
        } else {
            Arc::new(FileNonceStore::new(&self.nonce_store_path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nonce::{ConsumeResult, NonceRegistry};
    use crate::token::Mode;
    use openssl::ec::{EcGroup, EcKey};
    use openssl::nid::Nid;
    use openssl::pkey::PKey;
    use serde_json::json;

    const TA_KEY: &str = "0x0001020304050607080900010203040506070809000102030405060708090001";

    fn local_keys() -> (String, String) {
        let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
        let key = PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap();

        let engine = ::base64::engine::general_purpose::STANDARD;
        (
            ::base64::Engine::encode(&engine, [3u8; 32]),
            ::base64::Engine::encode(&engine, key.public_key_to_der().unwrap()),
        )
    }

    fn local_config() -> serde_json::Value {
        let (dk, vk) = local_keys();

        json!({
            "errorLevel": "error",
            "validCertificateSha256Digest": ["6a6a1474b5cbbb2b1aa57e0bc3"],
            "packageName": "com.example.app",
            "encodedDecryptionKey": dk,
            "encodedVerificationKey": vk,
            "trustedAuthorityPrivateKey": TA_KEY
        })
    }

    #[test]
    fn load_local_only() {
        let c = Config::from_json(&local_config().to_string()).unwrap();

        assert_eq!(c.freshness_window_ms, 10_000);
        assert_eq!(c.nonce_length, 50);
        assert_eq!(c.max_outstanding_nonces, 10_000);
        assert_eq!(c.remote_timeout(), Duration::from_millis(5000));

        let p = c.policy();
        assert_eq!(p.package_name, "com.example.app");
        assert!(p.is_trusted_digest("6a6a1474b5cbbb2b1aa57e0bc3"));

        let v = c.verifier().unwrap();
        assert!(v.supports(Mode::Local));
        assert!(!v.supports(Mode::Delegated));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, local_config().to_string()).unwrap();

        assert!(Config::load(&path).is_ok());
        assert!(matches!(
            Config::load(&dir.path().join("missing.json")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn half_a_key_pair() {
        let mut j = local_config();
        j.as_object_mut().unwrap().remove("encodedVerificationKey");

        assert!(matches!(
            Config::from_json(&j.to_string()),
            Err(Error::Sema(_))
        ));
    }

    #[test]
    fn no_verification_path() {
        let mut j = local_config();
        let o = j.as_object_mut().unwrap();
        o.remove("encodedVerificationKey");
        o.remove("encodedDecryptionKey");

        assert!(matches!(
            Config::from_json(&j.to_string()),
            Err(Error::Sema(_))
        ));
    }

    #[test]
    fn bad_values() {
        let mut j = local_config();
        j["errorLevel"] = json!("panic");
        assert!(matches!(
            Config::from_json(&j.to_string()),
            Err(Error::Syntax(_))
        ));

        let mut j = local_config();
        j["freshnessWindowMs"] = json!(0);
        assert!(matches!(
            Config::from_json(&j.to_string()),
            Err(Error::Sema(_))
        ));

        assert!(matches!(Config::from_json("{"), Err(Error::Syntax(_))));
    }

    #[test]
    fn bad_key_material() {
        let mut j = local_config();
        j["encodedDecryptionKey"] = json!("AAAA");

        let c = Config::from_json(&j.to_string()).unwrap();
        assert!(matches!(c.verifier(), Err(Error::Key(_))));
    }

    #[test]
    fn trusted_authority_sources() {
        let c = Config::from_json(&local_config().to_string()).unwrap();

        let from_config = c.trusted_authority_with(None).unwrap();
        let from_env = c
            .trusted_authority_with(Some(format!("{}02", "00".repeat(31))))
            .unwrap();
        assert_ne!(from_config.authority_key(), from_env.authority_key());

        let mut j = local_config();
        j.as_object_mut().unwrap().remove("trustedAuthorityPrivateKey");
        let c = Config::from_json(&j.to_string()).unwrap();
        assert!(matches!(c.trusted_authority_with(None), Err(Error::Key(_))));
        assert!(matches!(
            c.trusted_authority_with(Some("00".repeat(32))),
            Err(Error::Key(_))
        ));
    }

    #[tokio::test]
    async fn nonces_survive_restart_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, local_config().to_string()).unwrap();

        let c = Config::load(&path).unwrap();
        assert!(!c.ephemeral_nonces);
        assert_eq!(c.nonce_store_path, dir.path().join(DEFAULT_NONCE_STORE_PATH));

        let n = NonceRegistry::open(c.nonce_store()).await.issue().await;

        let c = Config::load(&path).unwrap();
        let reopened = NonceRegistry::open(c.nonce_store()).await;

        assert_eq!(reopened.try_consume(&n).await.unwrap(), ConsumeResult::Accepted);
        assert!(dir.path().join(DEFAULT_NONCE_STORE_PATH).exists());
    }

    #[tokio::test]
    async fn ephemeral_nonces_opt_in() {
        let mut j = local_config();
        j["ephemeralNonces"] = json!(true);
        let c = Config::from_json(&j.to_string()).unwrap();

        let n = NonceRegistry::open(c.nonce_store()).await.issue().await;
        let reopened = NonceRegistry::open(c.nonce_store()).await;

        assert_eq!(reopened.try_consume(&n).await.unwrap(), ConsumeResult::Unknown);
    }

    #[test]
    fn absolute_store_path_kept() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("elsewhere").join("ledger.json");
        let mut j = local_config();
        j["nonceStorePath"] = json!(store);
        j["maxOutstandingNonces"] = json!(3);

        let path = dir.path().join("config.json");
        std::fs::write(&path, j.to_string()).unwrap();

        let c = Config::load(&path).unwrap();
        assert_eq!(c.nonce_store_path, store);
        assert_eq!(c.max_outstanding_nonces, 3);

        j["maxOutstandingNonces"] = json!(0);
        assert!(matches!(
            Config::from_json(&j.to_string()),
            Err(Error::Sema(_))
        ));
    }

    #[test]
    fn debug_hides_secrets() {
        let c = Config::from_json(&local_config().to_string()).unwrap();
        let s = format!("{c:?}");

        assert!(!s.contains(TA_KEY));
        assert!(!s.contains(c.encoded_decryption_key.as_deref().unwrap()));
    }
}
