/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! HTTP relay sitting between the storefront UI and its backend API.
//!
//! Every route follows the same linear flow: validate what the caller sent,
//! make exactly one outbound call, then either relay the backend's answer
//! verbatim or answer with a `ResponseEnvelope` when the relay itself had to
//! stop the request. Nothing is cached, retried or kept between requests.

use anyhow::{Context, Result};
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
    Router,
};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, info_span};

pub mod asset_host;
pub mod assets;
pub mod auth;
pub mod config;
pub mod error;
pub mod forward;
pub mod health;
pub mod middleware;
pub mod profile;
pub mod support;

use asset_host::{build_asset_host, AssetHost};
use config::RelayConfig;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<RelayConfig>,
    pub http: reqwest::Client,
    pub asset_host: Arc<dyn AssetHost>,
}

impl AppState {
    pub fn new(cfg: RelayConfig) -> Result<Self> {
        let http = build_http_client(&cfg)?;
        let asset_host = build_asset_host(&cfg.asset_host, http.clone()).context("asset host init")?;
        Ok(Self {
            cfg: Arc::new(cfg),
            http,
            asset_host: Arc::from(asset_host),
        })
    }
}

pub fn build_http_client(cfg: &RelayConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(cfg.http_connect_timeout_secs.max(1)))
        .pool_idle_timeout(Duration::from_secs(cfg.http_pool_idle_timeout_secs));
    if cfg.http_timeout_secs > 0 {
        builder = builder.timeout(Duration::from_secs(cfg.http_timeout_secs));
    }
    builder.build().context("http client init")
}

pub fn build_router(state: AppState) -> Router {
    let max_body = state.cfg.max_body_bytes;
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .route("/api/admin/login", post(auth::admin_login))
        .route("/api/admin/logout", post(auth::admin_logout))
        .route("/api/admin/assets/*public_id", delete(assets::admin_delete_asset))
        .route(
            "/api/uploads/single",
            post(assets::upload_single).delete(assets::delete_reserved_upload),
        )
        .route(
            "/api/uploads/multiple",
            post(assets::upload_multiple).delete(assets::delete_reserved_upload),
        )
        .route("/api/uploads/*public_id", delete(assets::delete_upload))
        .route("/api/profile/image", put(profile::update_profile_image))
        .route("/api/support/stats", get(support::support_stats))
        .route("/api/support/tickets/:ticket_id/feedback", post(support::ticket_feedback))
        .route("/api/support/tickets/:ticket_id/seen", post(support::ticket_seen))
        .layer(axum::extract::DefaultBodyLimit::max(max_body))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
                let request_id = req
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("req");
                info_span!(
                    "http",
                    method = %req.method(),
                    uri = %req.uri(),
                    request_id = %request_id
                )
            }),
        )
        .layer(from_fn_with_state(state.clone(), middleware::add_security_headers))
        .layer(from_fn(middleware::ensure_request_ids))
        .with_state(state)
}

/// Binds `cfg.bind` and serves until Ctrl+C or SIGTERM.
pub async fn serve(cfg: RelayConfig) -> Result<()> {
    let addr = cfg.bind;
    let state = AppState::new(cfg)?;
    info!(
        backend = %state.cfg.backend_url,
        asset_host = state.asset_host.name(),
        "storefront relay configured"
    );
    let app = build_router(state);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!("storefront_relay listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve")?;
    info!("storefront_relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received Ctrl+C, shutting down");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
