// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Configuration loaded from environment variables, plus the validated
//! reconciliation target built from command-line arguments.

use crate::error::AppError;
use crate::models::{Role, SubscriptionTier};
use crate::services::credentials::Credentials;
use std::env;
use validator::Validate;

/// Domain used for generated admin emails when none is configured.
pub const DEFAULT_EMAIL_DOMAIN: &str = "example.com";

/// Service configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// GCP / Firebase project ID
    pub gcp_project_id: String,
    /// Web API key, only needed for password sign-in
    pub firebase_api_key: Option<String>,
    /// Domain for generated admin emails
    pub admin_email_domain: String,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            gcp_project_id: env::var("GCP_PROJECT_ID")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GCP_PROJECT_ID"))?,
            firebase_api_key: env::var("FIREBASE_API_KEY")
                .ok()
                .map(|v| v.trim().to_string()),
            admin_email_domain: admin_email_domain(),
        })
    }

    /// Config for testing only.
    pub fn test_default() -> Self {
        Self {
            gcp_project_id: "test-project".to_string(),
            firebase_api_key: Some("test-api-key".to_string()),
            admin_email_domain: DEFAULT_EMAIL_DOMAIN.to_string(),
        }
    }
}

/// Domain for generated admin emails, from ADMIN_EMAIL_DOMAIN.
///
/// Usable without the rest of [`Config`], which needs a project ID.
pub fn admin_email_domain() -> String {
    env::var("ADMIN_EMAIL_DOMAIN")
        .map(|v| v.trim().to_string())
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_EMAIL_DOMAIN.to_string())
}

/// Desired state of the admin account and its profile.
#[derive(Clone, Validate)]
pub struct TargetConfig {
    #[validate(email)]
    pub email: String,
    /// Identity Toolkit rejects passwords shorter than six characters.
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(length(min = 1))]
    pub display_name: String,
    pub role: Role,
    pub tier: SubscriptionTier,
}

impl TargetConfig {
    /// Build and validate a target from resolved credentials.
    pub fn new(
        credentials: Credentials,
        role: Role,
        tier: SubscriptionTier,
    ) -> Result<Self, AppError> {
        let target = Self {
            email: credentials.email,
            password: credentials.password,
            display_name: credentials.display_name,
            role,
            tier,
        };
        target
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        Ok(target)
    }
}

impl std::fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetConfig")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("display_name", &self.display_name)
            .field("role", &self.role)
            .field("tier", &self.tier)
            .finish()
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
