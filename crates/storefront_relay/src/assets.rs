/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use axum::{
    body::to_bytes,
    extract::{multipart::MultipartRejection, Multipart, Path, Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use storefront_protocol::AssetDeleted;
use tracing::{error, info, warn};

use crate::{
    asset_host::{sanitize_public_id, DestroyOutcome},
    config::AdminDeletePolicy,
    error::RelayError,
    forward::{bearer_token, encode_path, passthrough, AuthPolicy, Forward, Outgoing},
    AppState,
};

/// Multipart field carrying the file for single uploads.
pub const UPLOAD_FIELD: &str = "image";

const NO_FILE: &str = "No file uploaded";
const NO_FILES: &str = "No files uploaded";
const DELETE_FAILED: &str = "Failed to delete image";
const BODY_TOO_LARGE: &str = "Upload too large";

pub async fn admin_delete_asset(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, RelayError> {
    let public_id = sanitize_public_id(&raw_id);
    if public_id.is_empty() {
        return Err(RelayError::BadRequest("Public ID is required"));
    }
    // The backend authorizes with the caller's own bearer token; the admin
    // token only guards the direct provider call below.
    if state.cfg.admin_delete_via == AdminDeletePolicy::Backend {
        return delete_via_backend(&state, &headers, &public_id).await;
    }

    if let Some(expected) = &state.cfg.admin_token {
        if bearer_token(&headers).as_deref() != Some(expected.as_str()) {
            return Err(RelayError::Unauthorized("Admin token required"));
        }
    }

    match state.asset_host.destroy(&public_id).await {
        Ok(DestroyOutcome::Deleted) => {
            info!(%public_id, host = state.asset_host.name(), "asset deleted");
            Ok((
                StatusCode::OK,
                Json(AssetDeleted {
                    success: true,
                    message: "Image deleted successfully".to_string(),
                    public_id,
                }),
            )
                .into_response())
        }
        Ok(DestroyOutcome::NotFound) => {
            warn!(%public_id, "asset host reports asset not found");
            Err(RelayError::internal_with(DELETE_FAILED, "not found"))
        }
        Ok(DestroyOutcome::Rejected(reason)) => {
            warn!(%public_id, %reason, "asset host rejected delete");
            Err(RelayError::internal_with(DELETE_FAILED, reason))
        }
        Err(e) => {
            error!(%public_id, "asset host delete failed: {e:#}");
            Err(RelayError::internal_with(DELETE_FAILED, format!("{e:#}")))
        }
    }
}

pub async fn delete_upload(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, RelayError> {
    let public_id = sanitize_public_id(&raw_id);
    delete_via_backend(&state, &headers, &public_id).await
}

/// `DELETE /api/uploads/single` and `/api/uploads/multiple`. Those paths are
/// taken by the upload routes, so their public ids never reach the catch-all.
pub async fn delete_reserved_upload(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, RelayError> {
    let public_id = uri.path().rsplit('/').next().unwrap_or_default();
    delete_via_backend(&state, &headers, public_id).await
}

async fn delete_via_backend(
    state: &AppState,
    headers: &HeaderMap,
    public_id: &str,
) -> Result<Response, RelayError> {
    let token = AuthPolicy::Required.resolve(headers)?;
    if public_id.is_empty() {
        return Err(RelayError::BadRequest("Public ID is required"));
    }
    let resp = Forward::new(Method::DELETE, format!("/api/upload/{}", encode_path(public_id)))
        .send(state, token.as_deref())
        .await?;
    passthrough(resp).await
}

pub async fn upload_single(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, RelayError> {
    let token = AuthPolicy::Required.resolve(&headers)?;
    let mut multipart = multipart.map_err(|_| RelayError::BadRequest(NO_FILE))?;

    // First `image` field wins; the rest of the body is still drained.
    let mut part = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("malformed multipart upload: {e}");
                return Err(RelayError::BadRequest(NO_FILE));
            }
        };
        if part.is_some() || field.name() != Some(UPLOAD_FIELD) {
            field
                .bytes()
                .await
                .map_err(|_| RelayError::BadRequest(NO_FILE))?;
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload.bin").to_string();
        let content_type = field.content_type().map(|s| s.to_string());
        let data = field
            .bytes()
            .await
            .map_err(|_| RelayError::BadRequest(NO_FILE))?;
        part = Some(rewrap_part(data, file_name, content_type)?);
    }
    let part = part.ok_or(RelayError::BadRequest(NO_FILE))?;

    let resp = Forward::new(Method::POST, "/api/upload/single")
        .body(Outgoing::Multipart(Form::new().part(UPLOAD_FIELD, part)))
        .send(&state, token.as_deref())
        .await?;
    passthrough(resp).await
}

// Takes the raw request so the token and content type are checked before any
// of the body is read.
pub async fn upload_multiple(State(state): State<AppState>, req: Request) -> Result<Response, RelayError> {
    let token = AuthPolicy::Required.resolve(req.headers())?;
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .filter(|v| is_multipart(v))
        .cloned()
        .ok_or(RelayError::BadRequest(NO_FILES))?;
    let body = to_bytes(req.into_body(), state.cfg.max_body_bytes)
        .await
        .map_err(|e| {
            warn!("multiple upload body rejected: {e}");
            RelayError::PayloadTooLarge(BODY_TOO_LARGE)
        })?;
    if body.is_empty() {
        return Err(RelayError::BadRequest(NO_FILES));
    }
    let resp = Forward::new(Method::POST, "/api/upload/multiple")
        .body(Outgoing::Raw { content_type, body })
        .send(&state, token.as_deref())
        .await?;
    passthrough(resp).await
}

// Fresh part, so reqwest computes a new boundary and content type.
fn rewrap_part(data: Bytes, file_name: String, content_type: Option<String>) -> Result<Part, RelayError> {
    let part = Part::bytes(data.to_vec()).file_name(file_name);
    match content_type {
        Some(ct) => part
            .mime_str(&ct)
            .map_err(|_| RelayError::BadRequest("Invalid file content type")),
        None => Ok(part),
    }
}

fn is_multipart(v: &HeaderValue) -> bool {
    v.to_str()
        .map(|s| s.trim().to_ascii_lowercase().starts_with("multipart/form-data"))
        .unwrap_or(false)
}
