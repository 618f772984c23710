// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types shared by the identity and document store clients.

use crate::config::ConfigError;

/// Application error type.
///
/// Every fallible operation in the crate returns this; only `main` turns it
/// into a process exit code.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Account already exists: {0}")]
    AccountExists(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Identity service error: {0}")]
    IdentityService(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid configuration: {0}")]
    Validation(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Identity Toolkit error code for a duplicate email.
    pub const EMAIL_EXISTS: &'static str = "EMAIL_EXISTS";
    /// Identity Toolkit error code for a missing account.
    pub const USER_NOT_FOUND: &'static str = "USER_NOT_FOUND";

    /// Map a Firestore client error, separating permission failures from the rest.
    pub fn from_firestore(err: impl std::fmt::Display) -> Self {
        let msg = err.to_string();
        if is_permission_message(&msg) {
            AppError::PermissionDenied(msg)
        } else {
            AppError::Database(msg)
        }
    }

    /// Operator-facing hint printed alongside fatal errors, if one applies.
    pub fn remediation_hint(&self) -> Option<&'static str> {
        match self {
            AppError::PermissionDenied(_) => Some(
                "Check the Firestore security rules and the IAM roles granted to the \
                 credentials in GOOGLE_APPLICATION_CREDENTIALS",
            ),
            AppError::AuthenticationFailed(_) => {
                Some("Verify the email and password, or re-run `ensure --reset-password`")
            }
            AppError::Config(_) => Some("Set the missing variable in the environment or .env"),
            _ => None,
        }
    }
}

/// Firestore surfaces gRPC codes as `PermissionDenied`, the REST APIs as `PERMISSION_DENIED`.
fn is_permission_message(msg: &str) -> bool {
    msg.contains("PermissionDenied")
        || msg.contains("PERMISSION_DENIED")
        || msg.contains("Missing or insufficient permissions")
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AppError>;
