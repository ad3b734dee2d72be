/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use axum::{
    extract::{Path, State},
    http::{HeaderMap, Method},
    response::Response,
};
use bytes::Bytes;

use crate::{
    error::RelayError,
    forward::{encode_path, parse_json_body, passthrough, AuthPolicy, Forward},
    AppState,
};

pub async fn support_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, RelayError> {
    Forward::new(Method::GET, "/api/support/stats")
        .run(&state, &headers)
        .await
}

/// Customers leave feedback without an account, so no token is required or
/// forwarded.
pub async fn ticket_feedback(
    State(state): State<AppState>,
    Path(ticket_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, RelayError> {
    let payload = parse_json_body(&body)?;
    Forward::new(Method::POST, ticket_path(&ticket_id, "feedback")?)
        .auth(AuthPolicy::Anonymous)
        .json(payload)
        .run(&state, &headers)
        .await
}

pub async fn ticket_seen(
    State(state): State<AppState>,
    Path(ticket_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, RelayError> {
    let token = AuthPolicy::Required.resolve(&headers)?;
    let payload = parse_json_body(&body)?;
    let resp = Forward::new(Method::POST, ticket_path(&ticket_id, "seen")?)
        .json(payload)
        .send(&state, token.as_deref())
        .await?;
    passthrough(resp).await
}

fn ticket_path(ticket_id: &str, action: &str) -> Result<String, RelayError> {
    let id = ticket_id.trim();
    if id.is_empty() {
        return Err(RelayError::BadRequest("Ticket ID is required"));
    }
    Ok(format!("/api/support/tickets/{}/{action}", encode_path(id)))
}
