// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

use crate::credential;
use crate::policy::Finding;
use crate::token;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

/// Why a check request did not yield a credential
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Request validation error: {0}")]
    RequestValidation(String),
    #[error("Request carries no integrity token")]
    MissingToken,
    #[error(transparent)]
    Token(#[from] token::Error),
    #[error(transparent)]
    Credential(#[from] credential::Error),
    #[error("Statement rejected by policy")]
    PolicyViolation(Vec<Finding>),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::RequestValidation(_) => "request-validation-error",
            ApiError::MissingToken => "missing-token",
            ApiError::Token(e) => e.code(),
            ApiError::Credential(credential::Error::AuthorityKeyMismatch(_)) => {
                "authority-key-mismatch"
            }
            ApiError::Credential(_) => "internal-error",
            ApiError::PolicyViolation(_) => "policy-violation",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Credential(credential::Error::AuthorityKeyMismatch(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Credential(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn reasons(&self) -> &[Finding] {
        match self {
            ApiError::PolicyViolation(f) => f,
            _ => &[],
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.code(),
            "message": self.to_string(),
            "reasons": self.reasons(),
        });

        (self.status(), Json(body)).into_response()
    }
}
