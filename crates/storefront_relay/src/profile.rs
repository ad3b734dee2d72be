/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use axum::{
    extract::State,
    http::{HeaderMap, Method},
    response::Response,
};
use bytes::Bytes;

use crate::{
    error::RelayError,
    forward::{parse_json_body, passthrough, AuthPolicy, Forward},
    AppState,
};

pub async fn update_profile_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, RelayError> {
    let token = AuthPolicy::Required.resolve(&headers)?;
    let payload = parse_json_body(&body)?;
    let resp = Forward::new(Method::PUT, "/api/users/profile-image")
        .json(payload)
        .send(&state, token.as_deref())
        .await?;
    passthrough(resp).await
}
