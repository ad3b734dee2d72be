/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use storefront_protocol::ResponseEnvelope;
use thiserror::Error;

/// Failures the relay answers itself. Everything the backend says is relayed
/// verbatim and never becomes a `RelayError`.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("{0}")]
    BadRequest(&'static str),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    PayloadTooLarge(&'static str),

    /// Backend answered with a failure status that the relay reshapes into an
    /// envelope instead of passing through (login).
    #[error("{message}")]
    Upstream { status: StatusCode, message: String },

    #[error("Internal server error")]
    Transport(#[source] reqwest::Error),

    #[error("{message}")]
    Internal { message: String, detail: Option<String> },
}

impl RelayError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            detail: None,
        }
    }

    pub fn internal_with(message: impl Into<String>, detail: impl ToString) -> Self {
        Self::Internal {
            message: message.into(),
            detail: Some(detail.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Upstream { status, .. } => *status,
            Self::Transport(_) | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn envelope(&self) -> ResponseEnvelope {
        let env = ResponseEnvelope::failure(self.to_string());
        match self {
            Self::Transport(e) => env.with_error(e.to_string()),
            Self::Internal {
                detail: Some(detail),
                ..
            } => env.with_error(detail.clone()),
            _ => env,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.envelope())).into_response()
    }
}
