/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Uniform JSON body returned whenever the relay answers on its own behalf
/// (validation failures, transport failures, stateless endpoints).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ResponseEnvelope {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseEnvelope {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Login form as sent by the admin UI. Both fields are optional on the wire so
/// that a missing field is reported as a validation error instead of a
/// deserialization failure.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Credentials {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl Credentials {
    /// Returns `(username, password)` when both are present and non-blank.
    pub fn require(&self) -> Option<(&str, &str)> {
        let username = self.username.as_deref().filter(|v| !v.trim().is_empty())?;
        let password = self.password.as_deref().filter(|v| !v.trim().is_empty())?;
        Some((username, password))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoginResponse {
    pub message: String,
    pub admin: Value,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AssetDeleted {
    pub success: bool,
    pub message: String,
    #[serde(rename = "publicId")]
    pub public_id: String,
}
