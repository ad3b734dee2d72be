/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! The one forwarding path every backend relay goes through:
//! resolve the caller's token, issue a single backend call, then relay the
//! backend's answer untouched or turn a transport failure into an envelope.

use axum::{
    http::{header, HeaderMap, HeaderValue, Method},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use reqwest::multipart::Form;
use serde_json::Value;
use tracing::error;

use crate::{error::RelayError, AppState};

pub const TOKEN_REQUIRED: &str = "Authorization token required";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthPolicy {
    /// Reject with 401 before anything else happens when no token is present.
    Required,
    /// Never send `Authorization` to the backend.
    Anonymous,
}

impl AuthPolicy {
    pub fn resolve(self, headers: &HeaderMap) -> Result<Option<String>, RelayError> {
        match self {
            AuthPolicy::Required => bearer_token(headers)
                .map(Some)
                .ok_or(RelayError::Unauthorized(TOKEN_REQUIRED)),
            AuthPolicy::Anonymous => Ok(None),
        }
    }
}

pub enum Outgoing {
    Empty,
    Json(Value),
    Multipart(Form),
    /// Body bytes sent as-is under the caller's content type.
    Raw { content_type: HeaderValue, body: Bytes },
}

pub struct Forward {
    method: Method,
    path: String,
    auth: AuthPolicy,
    body: Outgoing,
}

impl Forward {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            auth: AuthPolicy::Required,
            body: Outgoing::Empty,
        }
    }

    pub fn auth(mut self, auth: AuthPolicy) -> Self {
        self.auth = auth;
        self
    }

    pub fn body(mut self, body: Outgoing) -> Self {
        self.body = body;
        self
    }

    pub fn json(self, value: Value) -> Self {
        self.body(Outgoing::Json(value))
    }

    /// Full relay: auth check, backend call, verbatim passthrough.
    pub async fn run(self, state: &AppState, headers: &HeaderMap) -> Result<Response, RelayError> {
        let token = self.auth.resolve(headers)?;
        let resp = self.send(state, token.as_deref()).await?;
        passthrough(resp).await
    }

    /// Issues the backend call and hands back the raw response, for relays
    /// that reshape the backend's answer.
    pub async fn send(self, state: &AppState, token: Option<&str>) -> Result<reqwest::Response, RelayError> {
        let url = format!("{}{}", state.cfg.backend_url, self.path);
        let mut req = state.http.request(self.method.clone(), &url);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req = match self.body {
            Outgoing::Empty => req,
            Outgoing::Json(value) => req.json(&value),
            Outgoing::Multipart(form) => req.multipart(form),
            Outgoing::Raw { content_type, body } => req
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(body),
        };
        req.send().await.map_err(|e| {
            error!(method = %self.method, path = %self.path, "backend call failed: {e}");
            RelayError::Transport(e)
        })
    }
}

/// Relays status, content type and body exactly as the backend sent them.
pub async fn passthrough(resp: reqwest::Response) -> Result<Response, RelayError> {
    let status = resp.status();
    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));
    let body = resp.bytes().await.map_err(|e| {
        error!("reading backend body failed: {e}");
        RelayError::Transport(e)
    })?;
    Ok((status, [(header::CONTENT_TYPE, content_type)], body).into_response())
}

pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let v = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, rest) = v.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Percent-encodes every segment of an identifier that may itself contain `/`.
pub fn encode_path(id: &str) -> String {
    id.split('/')
        .map(|seg| urlencoding::encode(seg).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

pub fn parse_json_body(body: &Bytes) -> Result<Value, RelayError> {
    if body.is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(body).map_err(|_| RelayError::BadRequest("Invalid JSON body"))
}
