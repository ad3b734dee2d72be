/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde_json::{json, Value};
use storefront_protocol::{Credentials, LoginResponse, ResponseEnvelope};
use tracing::{error, info};

use crate::{
    error::RelayError,
    forward::{AuthPolicy, Forward},
    AppState,
};

/// Cookies the admin UI may hold; logout always expires both.
pub const ADMIN_COOKIES: [&str; 2] = ["admin_token", "admin_user"];

const CREDENTIALS_REQUIRED: &str = "Username and password are required";

pub async fn admin_login(State(state): State<AppState>, body: Bytes) -> Result<Response, RelayError> {
    let creds: Credentials =
        serde_json::from_slice(&body).map_err(|_| RelayError::BadRequest(CREDENTIALS_REQUIRED))?;
    let (username, password) = creds
        .require()
        .ok_or(RelayError::BadRequest(CREDENTIALS_REQUIRED))?;

    let resp = Forward::new(Method::POST, "/api/admin/login")
        .auth(AuthPolicy::Anonymous)
        .json(json!({ "username": username, "password": password }))
        .send(&state, None)
        .await?;
    let status = resp.status();
    let raw = resp.bytes().await.map_err(|e| {
        error!("reading login response failed: {e}");
        RelayError::Transport(e)
    })?;
    let parsed: Option<Value> = serde_json::from_slice(&raw).ok();

    if !status.is_success() {
        return Err(RelayError::Upstream {
            status,
            message: backend_message(parsed.as_ref()).unwrap_or_else(|| "Login failed".to_string()),
        });
    }
    let Some(body) = parsed else {
        error!(%status, "login response was not json");
        return Err(RelayError::internal("Internal server error"));
    };

    info!(%username, "admin login relayed");
    let out = LoginResponse {
        message: "Login successful".to_string(),
        admin: body.get("admin").cloned().unwrap_or(Value::Null),
        token: body
            .get("token")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
    };
    Ok((StatusCode::OK, Json(out)).into_response())
}

pub async fn admin_logout() -> Response {
    let mut headers = HeaderMap::new();
    for name in ADMIN_COOKIES {
        let cookie = expired_cookie(name);
        match HeaderValue::from_str(&cookie) {
            Ok(v) => {
                headers.append(header::SET_COOKIE, v);
            }
            Err(e) => {
                error!("building logout cookie failed: {e}");
                return RelayError::internal("Internal server error").into_response();
            }
        }
    }
    (
        StatusCode::OK,
        headers,
        Json(ResponseEnvelope::ok("Logout successful")),
    )
        .into_response()
}

fn expired_cookie(name: &str) -> String {
    format!("{name}=; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; SameSite=Lax")
}

fn backend_message(body: Option<&Value>) -> Option<String> {
    let body = body?;
    ["message", "error"]
        .iter()
        .find_map(|k| body.get(*k).and_then(|v| v.as_str()))
        .map(|s| s.to_string())
}
