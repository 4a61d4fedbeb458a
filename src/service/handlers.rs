// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

use super::error::ApiError;
use super::request::CheckRequest;
use super::state::AppState;
use crate::credential::Credential;
use axum::body::Bytes;
use axum::extract::State;
use axum::response::Json;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339()
    }))
}

/// Issue a nonce, returned in transport form as the plain-text body
pub async fn nonce(State(state): State<Arc<AppState>>) -> String {
    state.nonces.issue().await.to_transport()
}

pub async fn check(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Credential>, ApiError> {
    let span = info_span!("check", request = state.next_request_id());

    async move {
        match run_check(&state, &body).await {
            Ok(credential) => {
                info!("check accepted");
                Ok(Json(credential))
            }
            Err(e) => {
                warn!(code = e.code(), error = %e, "check rejected");
                Err(e)
            }
        }
    }
    .instrument(span)
    .await
}

/// Validate the request, verify the token, appraise the statement and sign
/// the caller key, stopping at the first failure.  Request validation and
/// authority pinning happen before any token work.
async fn run_check(state: &AppState, body: &[u8]) -> Result<Credential, ApiError> {
    let req = CheckRequest::parse(body)?;

    let token = req.token()?;
    let nonce_check = req.nonce_check()?;
    let caller = req.caller_key()?;
    let claimed = req.authority_key()?;

    state.issuer.pin(claimed)?;

    let mode = req.mode()?;

    let statement = state.verifier.verify(token, mode).await?;

    let approval = state
        .validator
        .evaluate(&statement, nonce_check)
        .await
        .into_result()
        .map_err(ApiError::PolicyViolation)?;

    Ok(state.issuer.issue(approval, &caller, claimed)?)
}
