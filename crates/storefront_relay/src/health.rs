/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::AppState;

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn readyz(State(state): State<AppState>) -> Response {
    if let Err(e) = state.asset_host.health_check().await {
        warn!(host = state.asset_host.name(), "asset host not ready: {e:#}");
        return (StatusCode::SERVICE_UNAVAILABLE, format!("asset host not ready: {e}")).into_response();
    }
    (StatusCode::OK, "ready").into_response()
}
