// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use super::iverificationbackend::IVerificationBackend;
use super::statement::AttestationStatement;
use crate::base64;
use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use openssl::aes::{unwrap_key, AesKey};
use openssl::pkey::{Id, PKey};
use openssl::symm::{decrypt_aead, Cipher};
use serde::Deserialize;
use tracing::debug;

const KEY_WRAP_ALG: &str = "A256KW";
const CONTENT_ENC_ALG: &str = "A256GCM";

const AES_256_KEY_LEN: usize = 32;
const WRAPPED_CEK_LEN: usize = AES_256_KEY_LEN + 8;
const GCM_TAG_LEN: usize = 16;

#[derive(Debug, Deserialize)]
struct JweHeader {
    alg: String,
    enc: String,
}

/// Verifies integrity tokens on this server.
///
/// The token is a JWE (compact serialisation, A256KW + A256GCM) wrapping a
/// JWS (ES256) whose payload is the statement.  The AES key and the EC
/// public key are the per-app keys the operator downloaded from the Play
/// console.
pub struct LocalBackend {
    decryption_key: Vec<u8>,
    verification_key: DecodingKey,
}

impl LocalBackend {
    /// Build a backend from a raw 32-byte AES key and a DER-encoded
    /// SubjectPublicKeyInfo holding a P-256 key
    pub fn new(decryption_key: &[u8], verification_key_der: &[u8]) -> Result<Self, Error> {
        if decryption_key.len() != AES_256_KEY_LEN {
            return Err(Error::Key(format!(
                "decryption key: expecting {AES_256_KEY_LEN} bytes, got {}",
                decryption_key.len()
            )));
        }

        let pkey = PKey::public_key_from_der(verification_key_der)
            .map_err(|e| Error::Key(format!("verification key: {e}")))?;

        if pkey.id() != Id::EC {
            return Err(Error::Key(format!(
                "verification key: expecting an EC key, got {:?}",
                pkey.id()
            )));
        }

        let pem = pkey
            .public_key_to_pem()
            .map_err(|e| Error::Key(format!("verification key: {e}")))?;

        let verification_key = DecodingKey::from_ec_pem(&pem)
            .map_err(|e| Error::Key(format!("verification key: {e}")))?;

        Ok(Self {
            decryption_key: decryption_key.to_vec(),
            verification_key,
        })
    }

    /// Build a backend from the base64 encodings found in the configuration
    pub fn from_encoded(decryption_key: &str, verification_key: &str) -> Result<Self, Error> {
        let dk = base64::decode_std(decryption_key)
            .map_err(|e| Error::Key(format!("decryption key: {e}")))?;

        let vk = base64::decode_std(verification_key)
            .map_err(|e| Error::Key(format!("verification key: {e}")))?;

        Self::new(&dk, &vk)
    }

    /// Undo the JWE envelope and return the enclosed JWS
    fn decrypt(&self, token: &str) -> Result<Vec<u8>, Error> {
        let segments: Vec<&str> = token.trim().split('.').collect();

        let (header_b64, ek_b64, iv_b64, ct_b64, tag_b64) = match segments.as_slice() {
            [h, ek, iv, ct, tag] => (*h, *ek, *iv, *ct, *tag),
            s => {
                return Err(Error::Decryption(format!(
                    "expecting 5 JWE segments, got {}",
                    s.len()
                )))
            }
        };

        let header: JweHeader = serde_json::from_slice(&decode_segment(header_b64, "header")?)
            .map_err(|e| Error::Decryption(format!("header: {e}")))?;

        if header.alg != KEY_WRAP_ALG {
            return Err(Error::Decryption(format!(
                "unsupported key management algorithm {}",
                header.alg
            )));
        }

        if header.enc != CONTENT_ENC_ALG {
            return Err(Error::Decryption(format!(
                "unsupported content encryption algorithm {}",
                header.enc
            )));
        }

        let wrapped = decode_segment(ek_b64, "encrypted key")?;
        let iv = decode_segment(iv_b64, "iv")?;
        let ciphertext = decode_segment(ct_b64, "ciphertext")?;
        let tag = decode_segment(tag_b64, "tag")?;

        if wrapped.len() != WRAPPED_CEK_LEN {
            return Err(Error::Decryption(format!(
                "encrypted key: expecting {WRAPPED_CEK_LEN} bytes, got {}",
                wrapped.len()
            )));
        }

        if tag.len() != GCM_TAG_LEN {
            return Err(Error::Decryption(format!(
                "tag: expecting {GCM_TAG_LEN} bytes, got {}",
                tag.len()
            )));
        }

        let kek = AesKey::new_decrypt(&self.decryption_key)
            .map_err(|e| Error::Decryption(format!("key encryption key: {e:?}")))?;

        let mut cek = vec![0u8; AES_256_KEY_LEN];

        unwrap_key(&kek, None, &mut cek, &wrapped).map_err(|_| {
            Error::Decryption("unwrapping the content encryption key failed".to_string())
        })?;

        // the AAD is the ASCII of the encoded protected header
        decrypt_aead(
            Cipher::aes_256_gcm(),
            &cek,
            Some(&iv),
            header_b64.as_bytes(),
            &ciphertext,
            &tag,
        )
        .map_err(|e| Error::Decryption(format!("content decryption failed: {e}")))
    }

    /// Check the JWS signature and decode its payload
    fn verify_signature(&self, jws: &[u8]) -> Result<AttestationStatement, Error> {
        let jws = std::str::from_utf8(jws)
            .map_err(|e| Error::MalformedPayload(format!("JWS is not UTF-8: {e}")))?;

        // the payload carries no registered claims
        let mut validation = Validation::new(Algorithm::ES256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_aud = false;

        let data =
            jsonwebtoken::decode::<AttestationStatement>(jws.trim(), &self.verification_key, &validation)
                .map_err(classify_jws_error)?;

        Ok(data.claims)
    }
}

#[async_trait]
impl IVerificationBackend for LocalBackend {
    async fn verify(&self, token: &str) -> Result<AttestationStatement, Error> {
        let jws = self.decrypt(token)?;

        let statement = self.verify_signature(&jws)?;

        debug!(?statement, "token verified locally");

        Ok(statement)
    }
}

fn decode_segment(v: &str, what: &str) -> Result<Vec<u8>, Error> {
    base64::decode_str(v).map_err(|e| Error::Decryption(format!("{what}: {e}")))
}

fn classify_jws_error(e: jsonwebtoken::errors::Error) -> Error {
    match e.kind() {
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidEcdsaKey
        | ErrorKind::InvalidKeyFormat => Error::Signature(e.to_string()),
        _ => Error::MalformedPayload(e.to_string()),
    }
}
