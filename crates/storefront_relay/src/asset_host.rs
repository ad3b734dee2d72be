/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::{
    config::{Credentials, Region},
    Client as S3Client, Config as S3Config,
};
use reqwest::Client as HttpClient;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone)]
pub struct AssetHostConfig {
    pub backend: String,
    pub cloudinary_cloud_name: Option<String>,
    pub cloudinary_api_key: Option<String>,
    pub cloudinary_api_secret: Option<String>,
    pub cloudinary_api_base_url: String,
    pub s3_region: Option<String>,
    pub s3_bucket: Option<String>,
    pub s3_endpoint: Option<String>,
    pub s3_access_key: Option<String>,
    pub s3_secret_key: Option<String>,
    pub s3_path_style: bool,
}

impl Default for AssetHostConfig {
    fn default() -> Self {
        Self {
            backend: "none".to_string(),
            cloudinary_cloud_name: None,
            cloudinary_api_key: None,
            cloudinary_api_secret: None,
            cloudinary_api_base_url: "https://api.cloudinary.com".to_string(),
            s3_region: None,
            s3_bucket: None,
            s3_endpoint: None,
            s3_access_key: None,
            s3_secret_key: None,
            s3_path_style: false,
        }
    }
}

/// What the provider said about a destroy call that reached it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestroyOutcome {
    Deleted,
    NotFound,
    Rejected(String),
}

#[async_trait]
pub trait AssetHost: Send + Sync {
    async fn destroy(&self, public_id: &str) -> Result<DestroyOutcome>;
    async fn health_check(&self) -> Result<()>;
    fn name(&self) -> &'static str;
}

pub struct DisabledAssetHost;

#[async_trait]
impl AssetHost for DisabledAssetHost {
    async fn destroy(&self, _public_id: &str) -> Result<DestroyOutcome> {
        anyhow::bail!("no asset host configured (STOREFRONT_ASSET_BACKEND=none)")
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

pub struct CloudinaryAssetHost {
    base_url: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    http: HttpClient,
}

#[derive(Debug, serde::Deserialize)]
struct CloudinaryDestroyResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<CloudinaryError>,
}

#[derive(Debug, serde::Deserialize)]
struct CloudinaryError {
    message: String,
}

impl CloudinaryAssetHost {
    pub fn new(
        base_url: String,
        cloud_name: String,
        api_key: String,
        api_secret: String,
        http: HttpClient,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            cloud_name,
            api_key,
            api_secret,
            http,
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/v1_1/{}/{}", self.base_url, self.cloud_name, action)
    }
}

/// Signs `params` the way the upload API expects: sorted `k=v` pairs joined
/// by `&`, secret appended, SHA-256 hex.
///
/// Only SHA-256 is produced. The request carries `signature_algorithm=sha256`,
/// so accounts still pinned to SHA-1 signatures reject every destroy; those
/// show up as `Rejected` with the provider's message.
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<_> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hasher.finalize().iter().map(|b| format!("{b:02x}")).collect()
}

#[async_trait]
impl AssetHost for CloudinaryAssetHost {
    async fn destroy(&self, public_id: &str) -> Result<DestroyOutcome> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("public_id", public_id), ("timestamp", &timestamp)],
            &self.api_secret,
        );
        let form = [
            ("public_id", public_id),
            ("timestamp", timestamp.as_str()),
            ("api_key", self.api_key.as_str()),
            ("signature", signature.as_str()),
            ("signature_algorithm", "sha256"),
        ];
        let resp = self
            .http
            .post(self.endpoint("image/destroy"))
            .form(&form)
            .send()
            .await
            .context("cloudinary destroy")?;
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        let parsed: Option<CloudinaryDestroyResponse> = serde_json::from_str(&text).ok();
        if !status.is_success() {
            let message = parsed
                .and_then(|p| p.error)
                .map(|e| e.message)
                .unwrap_or(text);
            return Ok(DestroyOutcome::Rejected(format!("{status} {message}")));
        }
        let result = parsed.and_then(|p| p.result).unwrap_or_default();
        Ok(match result.as_str() {
            "ok" => DestroyOutcome::Deleted,
            "not found" => DestroyOutcome::NotFound,
            other => DestroyOutcome::Rejected(other.to_string()),
        })
    }

    async fn health_check(&self) -> Result<()> {
        let resp = self
            .http
            .get(self.endpoint("ping"))
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .send()
            .await
            .context("cloudinary ping")?;
        if !resp.status().is_success() {
            anyhow::bail!("cloudinary health failed: {}", resp.status());
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "cloudinary"
    }
}

pub struct S3AssetHost {
    client: S3Client,
    bucket: String,
}

impl S3AssetHost {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl AssetHost for S3AssetHost {
    // S3 deletes are idempotent and never report a missing key.
    async fn destroy(&self, public_id: &str) -> Result<DestroyOutcome> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(public_id)
            .send()
            .await
            .context("s3 delete")?;
        Ok(DestroyOutcome::Deleted)
    }

    async fn health_check(&self) -> Result<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .context("s3 head_bucket")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "s3"
    }
}

pub fn build_asset_host(cfg: &AssetHostConfig, http: HttpClient) -> Result<Box<dyn AssetHost>> {
    match cfg.backend.trim().to_ascii_lowercase().as_str() {
        "" | "none" => Ok(Box::new(DisabledAssetHost)),
        "cloudinary" => {
            let cloud = cfg.cloudinary_cloud_name.clone().ok_or_else(|| {
                anyhow::anyhow!("asset backend cloudinary requires STOREFRONT_CLOUDINARY_CLOUD_NAME")
            })?;
            let key = cfg.cloudinary_api_key.clone().ok_or_else(|| {
                anyhow::anyhow!("asset backend cloudinary requires STOREFRONT_CLOUDINARY_API_KEY")
            })?;
            let secret = cfg.cloudinary_api_secret.clone().ok_or_else(|| {
                anyhow::anyhow!("asset backend cloudinary requires STOREFRONT_CLOUDINARY_API_SECRET")
            })?;
            Ok(Box::new(CloudinaryAssetHost::new(
                cfg.cloudinary_api_base_url.clone(),
                cloud,
                key,
                secret,
                http,
            )))
        }
        "s3" => {
            let region = cfg.s3_region.clone().ok_or_else(|| {
                anyhow::anyhow!("asset backend s3 requires STOREFRONT_S3_REGION")
            })?;
            let bucket = cfg.s3_bucket.clone().ok_or_else(|| {
                anyhow::anyhow!("asset backend s3 requires STOREFRONT_S3_BUCKET")
            })?;
            let access = cfg.s3_access_key.clone().ok_or_else(|| {
                anyhow::anyhow!("asset backend s3 requires STOREFRONT_S3_ACCESS_KEY")
            })?;
            let secret = cfg.s3_secret_key.clone().ok_or_else(|| {
                anyhow::anyhow!("asset backend s3 requires STOREFRONT_S3_SECRET_KEY")
            })?;
            let credentials = Credentials::new(access, secret, None, None, "storefront");
            let mut builder = S3Config::builder()
                .region(Region::new(region))
                .credentials_provider(credentials)
                .force_path_style(cfg.s3_path_style);
            if let Some(endpoint) = cfg.s3_endpoint.clone() {
                builder = builder.endpoint_url(endpoint);
            }
            let client = S3Client::from_conf(builder.build());
            Ok(Box::new(S3AssetHost::new(client, bucket)))
        }
        other => anyhow::bail!("unsupported asset backend: {other}"),
    }
}

/// Public ids arrive as the tail of a URL path; strip stray slashes and
/// normalize separators.
pub fn sanitize_public_id(raw: &str) -> String {
    raw.trim().trim_matches('/').replace('\\', "/")
}
