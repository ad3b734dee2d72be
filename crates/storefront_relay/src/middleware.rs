/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use axum::{
    extract::State,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::AppState;

static REQ_ID: AtomicU64 = AtomicU64::new(1);

pub fn next_request_id() -> String {
    let id = REQ_ID.fetch_add(1, Ordering::Relaxed);
    format!("req-{id}")
}

/// Gives every inbound request an `x-request-id`, reusing the caller's when
/// present, and a matching `x-correlation-id` unless one was sent.
pub async fn ensure_request_ids(mut req: Request<axum::body::Body>, next: Next) -> Response {
    let headers = req.headers_mut();
    if headers.get("x-request-id").is_none() {
        let request_id = next_request_id();
        headers.insert(
            "x-request-id",
            HeaderValue::from_str(&request_id).unwrap_or_else(|_| HeaderValue::from_static("req")),
        );
    }
    if headers.get("x-correlation-id").is_none() {
        if let Some(req_id) = headers.get("x-request-id").cloned() {
            headers.insert("x-correlation-id", req_id);
        }
    }
    next.run(req).await
}

/// Echoes the request ids onto every response, including relayed backend
/// answers and relay-generated envelopes, and adds the fixed hardening headers.
pub async fn add_security_headers(
    State(state): State<AppState>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let request_id = req.headers().get("x-request-id").cloned();
    let correlation = req.headers().get("x-correlation-id").cloned();
    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();
    if let Some(request_id) = request_id {
        headers.insert("X-Request-Id", request_id);
    }
    if let Some(correlation) = correlation {
        headers.insert("X-Correlation-Id", correlation);
    }
    headers.entry("X-Content-Type-Options").or_insert(HeaderValue::from_static("nosniff"));
    headers.entry("X-Frame-Options").or_insert(HeaderValue::from_static("DENY"));
    headers.entry("Referrer-Policy").or_insert(HeaderValue::from_static("no-referrer"));
    if state.cfg.hsts_max_age_secs > 0 {
        let value = format!("max-age={}; includeSubDomains", state.cfg.hsts_max_age_secs);
        headers.insert(
            "Strict-Transport-Security",
            HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("max-age=0")),
        );
    }
    resp
}
