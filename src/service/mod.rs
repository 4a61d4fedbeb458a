// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

//! The HTTP surface: a nonce endpoint, a check endpoint and a health check.
//!
//! Rejected checks get a `400` with a JSON body of the form
//! `{"error": "<code>", "message": "...", "reasons": [...]}`, where
//! `reasons` lists the policy findings, if any.

pub use self::error::ApiError;
pub use self::request::{CameraPublicKey, CheckRequest, RequestBody};
pub use self::state::AppState;

mod error;
mod handlers;
mod request;
mod state;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

pub const NONCE_PATH: &str = "/api/playintegrity/nonce";
pub const CHECK_PATH: &str = "/api/playintegrity/check";
pub const HEALTH_PATH: &str = "/health";

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(handlers::health))
        .route(NONCE_PATH, get(handlers::nonce))
        .route(CHECK_PATH, post(handlers::check))
        .with_state(state)
}
