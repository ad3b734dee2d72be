/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use anyhow::{Context, Result};
use std::{net::SocketAddr, str::FromStr};
use tracing::warn;

use crate::asset_host::AssetHostConfig;

/// Who performs privileged asset deletions requested from the admin UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdminDeletePolicy {
    /// Call the asset host directly with the server-held secret.
    Provider,
    /// Route through the backend, same as end-user deletions.
    Backend,
}

impl FromStr for AdminDeletePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "provider" | "direct" => Ok(Self::Provider),
            "backend" => Ok(Self::Backend),
            other => anyhow::bail!("unsupported admin delete policy: {other}"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RelayConfig {
    pub bind: SocketAddr,
    pub backend_url: String,
    pub max_body_bytes: usize,
    pub http_timeout_secs: u64,
    pub http_connect_timeout_secs: u64,
    pub http_pool_idle_timeout_secs: u64,
    pub hsts_max_age_secs: u64,
    pub admin_token: Option<String>,
    pub admin_delete_via: AdminDeletePolicy,
    pub asset_host: AssetHostConfig,
}

impl RelayConfig {
    /// Minimal configuration pointing at `backend_url`, everything else at its
    /// default. Used by `from_env` as the base and by tests.
    pub fn new(backend_url: &str) -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            backend_url: normalize_base_url(backend_url),
            max_body_bytes: 10 * 1024 * 1024,
            http_timeout_secs: 0,
            http_connect_timeout_secs: 10,
            http_pool_idle_timeout_secs: 90,
            hsts_max_age_secs: 0,
            admin_token: None,
            admin_delete_via: AdminDeletePolicy::Provider,
            asset_host: AssetHostConfig::default(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let backend_url = env_opt("STOREFRONT_BACKEND_URL")
            .context("STOREFRONT_BACKEND_URL must be set to the backend base url")?;
        let mut cfg = Self::new(&backend_url);

        cfg.bind = env_parse("STOREFRONT_RELAY_BIND", cfg.bind)?;
        cfg.max_body_bytes = env_parse("STOREFRONT_RELAY_MAX_BODY_BYTES", cfg.max_body_bytes)?;
        cfg.http_timeout_secs = env_parse("STOREFRONT_RELAY_HTTP_TIMEOUT_SECS", cfg.http_timeout_secs)?;
        cfg.http_connect_timeout_secs = env_parse(
            "STOREFRONT_RELAY_HTTP_CONNECT_TIMEOUT_SECS",
            cfg.http_connect_timeout_secs,
        )?;
        cfg.http_pool_idle_timeout_secs = env_parse(
            "STOREFRONT_RELAY_HTTP_POOL_IDLE_TIMEOUT_SECS",
            cfg.http_pool_idle_timeout_secs,
        )?;
        cfg.hsts_max_age_secs = env_parse("STOREFRONT_RELAY_HSTS_MAX_AGE_SECS", cfg.hsts_max_age_secs)?;
        cfg.admin_token = env_opt("STOREFRONT_ADMIN_TOKEN");
        cfg.admin_delete_via = env_parse("STOREFRONT_ADMIN_DELETE_VIA", cfg.admin_delete_via)?;

        cfg.asset_host = AssetHostConfig {
            backend: env_opt("STOREFRONT_ASSET_BACKEND").unwrap_or_else(|| "none".to_string()),
            cloudinary_cloud_name: env_opt("STOREFRONT_CLOUDINARY_CLOUD_NAME"),
            cloudinary_api_key: env_opt("STOREFRONT_CLOUDINARY_API_KEY"),
            cloudinary_api_secret: env_opt("STOREFRONT_CLOUDINARY_API_SECRET"),
            cloudinary_api_base_url: env_opt("STOREFRONT_CLOUDINARY_API_BASE_URL")
                .map(|v| normalize_base_url(&v))
                .unwrap_or_else(|| cfg.asset_host.cloudinary_api_base_url.clone()),
            s3_region: env_opt("STOREFRONT_S3_REGION"),
            s3_bucket: env_opt("STOREFRONT_S3_BUCKET"),
            s3_endpoint: env_opt("STOREFRONT_S3_ENDPOINT"),
            s3_access_key: env_opt("STOREFRONT_S3_ACCESS_KEY"),
            s3_secret_key: env_opt("STOREFRONT_S3_SECRET_KEY"),
            s3_path_style: env_bool("STOREFRONT_S3_PATH_STYLE", false),
        };

        if cfg.admin_delete_via == AdminDeletePolicy::Provider && cfg.admin_token.is_none() {
            warn!("STOREFRONT_ADMIN_TOKEN not set, admin asset deletion is open to any caller");
        }
        Ok(cfg)
    }
}

pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_opt(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("{key} invalid ({raw}): {e}")),
        None => Ok(default),
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    env_opt(key)
        .map(|v| parse_bool(&v))
        .unwrap_or(default)
}

fn parse_bool(v: &str) -> bool {
    v == "1" || v.eq_ignore_ascii_case("true")
}
