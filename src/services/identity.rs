// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity Toolkit (Firebase Auth) REST client.
//!
//! Handles:
//! - Account lookup by email
//! - Account creation with the email pre-verified
//! - Password / display name updates
//! - Idempotent deletion
//! - Password sign-in, to confirm the stored credentials work

use crate::error::AppError;
use crate::models::{Account, AccountUpdate, NewAccount};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const PRODUCTION_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const IDENTITY_TOOLKIT_SCOPE: &str = "https://www.googleapis.com/auth/identitytoolkit";
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
/// Token the Auth emulator accepts for admin calls.
const EMULATOR_TOKEN: &str = "owner";

/// Account operations against the identity provider.
#[allow(async_fn_in_trait)]
pub trait IdentityService {
    /// Find an account by email, `None` if no account is registered.
    async fn lookup_by_email(&self, email: &str) -> Result<Option<Account>, AppError>;

    /// Create an account. Fails with [`AppError::AccountExists`] on a duplicate email.
    async fn create_account(&self, account: &NewAccount) -> Result<Account, AppError>;

    /// Change password, display name or verification flag.
    async fn update_account(&self, uid: &str, update: &AccountUpdate) -> Result<(), AppError>;

    /// Delete an account. Deleting a missing account succeeds.
    async fn delete_account(&self, uid: &str) -> Result<(), AppError>;

    /// Sign in with email and password.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Account, AppError>;
}

/// Look up an account by email, creating it if absent.
///
/// Returns the account and whether this call created it. A duplicate-email
/// failure on create means another writer got there first, so the account is
/// looked up again instead of failing.
pub async fn ensure_account<I: IdentityService>(
    identity: &I,
    email: &str,
    password: &str,
    display_name: &str,
) -> Result<(Account, bool), AppError> {
    if let Some(account) = identity.lookup_by_email(email).await? {
        return Ok((account, false));
    }

    match identity
        .create_account(&NewAccount::verified(email, password, display_name))
        .await
    {
        Ok(account) => {
            tracing::info!(uid = %account.uid, email, "Account created");
            Ok((account, true))
        }
        Err(AppError::AccountExists(_)) => {
            tracing::warn!(email, "Account appeared during creation, using existing record");
            let account = identity
                .lookup_by_email(email)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("account {}", email)))?;
            Ok((account, false))
        }
        Err(e) => Err(e),
    }
}

enum AuthMode {
    /// Fixed bearer token (emulator, tests).
    Static(String),
    /// OAuth access token from application default credentials.
    Google(Arc<gcloud_sdk::GoogleAuthTokenGenerator>),
}

/// Identity Toolkit v1 REST client.
pub struct IdentityToolkitClient {
    http: reqwest::Client,
    base_url: String,
    project_id: String,
    api_key: Option<String>,
    auth: AuthMode,
}

impl IdentityToolkitClient {
    /// Create a client for the project.
    ///
    /// For local development with emulator, set FIREBASE_AUTH_EMULATOR_HOST.
    pub async fn new(project_id: &str, api_key: Option<String>) -> Result<Self, AppError> {
        if let Ok(host) = std::env::var("FIREBASE_AUTH_EMULATOR_HOST") {
            tracing::info!(host = %host, "Using Firebase Auth Emulator");
            let base_url = format!("http://{}/identitytoolkit.googleapis.com/v1", host);
            return Self::with_base_url(&base_url, project_id, api_key);
        }

        let mut scopes: Vec<String> = gcloud_sdk::GCP_DEFAULT_SCOPES.clone();
        scopes.push(IDENTITY_TOOLKIT_SCOPE.to_string());

        let generator =
            gcloud_sdk::GoogleAuthTokenGenerator::new(gcloud_sdk::TokenSourceType::Default, scopes)
                .await
                .map_err(|e| {
                    AppError::IdentityService(format!("Failed to load Google credentials: {}", e))
                })?;

        tracing::info!(project = project_id, "Identity Toolkit client initialized");

        Ok(Self {
            http: build_http_client()?,
            base_url: PRODUCTION_BASE_URL.to_string(),
            project_id: project_id.to_string(),
            api_key,
            auth: AuthMode::Google(Arc::new(generator)),
        })
    }

    /// Create a client against an explicit base URL using the emulator token.
    pub fn with_base_url(
        base_url: &str,
        project_id: &str,
        api_key: Option<String>,
    ) -> Result<Self, AppError> {
        Ok(Self {
            http: build_http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
            api_key,
            auth: AuthMode::Static(format!("Bearer {}", EMULATOR_TOKEN)),
        })
    }

    fn project_url(&self, method: &str) -> String {
        format!(
            "{}/projects/{}/accounts{}",
            self.base_url, self.project_id, method
        )
    }

    async fn authorization(&self) -> Result<String, AppError> {
        match &self.auth {
            AuthMode::Static(value) => Ok(value.clone()),
            AuthMode::Google(generator) => generator
                .create_token()
                .await
                .map(|token| token.header_value())
                .map_err(|e| AppError::IdentityService(format!("Failed to obtain token: {}", e))),
        }
    }

    /// POST an admin request and parse the JSON response.
    async fn admin_post<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, AppError> {
        let response = self
            .http
            .post(url)
            .header(reqwest::header::AUTHORIZATION, self.authorization().await?)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::IdentityService(e.to_string()))?;

        check_response_json(response).await
    }
}

impl IdentityService for IdentityToolkitClient {
    async fn lookup_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let body = serde_json::json!({ "email": [email] });
        let response: LookupResponse = self
            .admin_post(&self.project_url(":lookup"), &body)
            .await?;
        Ok(response.users.into_iter().next())
    }

    async fn create_account(&self, account: &NewAccount) -> Result<Account, AppError> {
        let created: CreateResponse = self
            .admin_post(&self.project_url(""), account)
            .await
            .map_err(|e| match e {
                AppError::IdentityService(msg) if msg.starts_with(AppError::EMAIL_EXISTS) => {
                    AppError::AccountExists(account.email.clone())
                }
                other => other,
            })?;

        Ok(Account {
            uid: created.local_id,
            email: created.email.unwrap_or_else(|| account.email.clone()),
            display_name: created
                .display_name
                .or_else(|| Some(account.display_name.clone())),
            email_verified: account.email_verified,
        })
    }

    async fn update_account(&self, uid: &str, update: &AccountUpdate) -> Result<(), AppError> {
        if update.is_empty() {
            return Ok(());
        }

        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct UpdateRequest<'a> {
            local_id: &'a str,
            #[serde(flatten)]
            update: &'a AccountUpdate,
        }

        let _: serde_json::Value = self
            .admin_post(
                &self.project_url(":update"),
                &UpdateRequest {
                    local_id: uid,
                    update,
                },
            )
            .await?;
        tracing::info!(uid, "Account updated");
        Ok(())
    }

    async fn delete_account(&self, uid: &str) -> Result<(), AppError> {
        let body = serde_json::json!({ "localId": uid });
        match self
            .admin_post::<_, serde_json::Value>(&self.project_url(":delete"), &body)
            .await
        {
            Ok(_) => {
                tracing::info!(uid, "Account deleted");
                Ok(())
            }
            Err(AppError::IdentityService(msg)) if msg.starts_with(AppError::USER_NOT_FOUND) => {
                tracing::debug!(uid, "Account already absent");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Account, AppError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AppError::Validation("FIREBASE_API_KEY is required for sign-in".to_string())
        })?;

        let response = self
            .http
            .post(format!("{}/accounts:signInWithPassword", self.base_url))
            .query(&[("key", api_key)])
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await
            .map_err(|e| AppError::IdentityService(e.to_string()))?;

        let signed_in: SignInResponse =
            check_response_json(response).await.map_err(|e| match e {
                AppError::IdentityService(msg) if is_credential_error(&msg) => {
                    AppError::AuthenticationFailed(msg)
                }
                other => other,
            })?;

        Ok(Account {
            uid: signed_in.local_id,
            email: signed_in.email,
            display_name: signed_in.display_name.filter(|name| !name.is_empty()),
            email_verified: true,
        })
    }
}

fn build_http_client() -> Result<reqwest::Client, AppError> {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e)))
}

fn is_credential_error(msg: &str) -> bool {
    ["INVALID_PASSWORD", "EMAIL_NOT_FOUND", "INVALID_LOGIN_CREDENTIALS", "USER_DISABLED"]
        .iter()
        .any(|code| msg.starts_with(code))
}

/// Check response status and parse the JSON body.
///
/// Error bodies look like `{"error": {"code": 400, "message": "EMAIL_EXISTS"}}`;
/// the message (the error code) leads the resulting error text.
async fn check_response_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    let status = response.status();
    if status.is_success() {
        return response.json().await.map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Unreadable Identity Toolkit response: {}", e))
        });
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| format!("HTTP {}: {}", status, body));

    if status.as_u16() == 403 || message.starts_with("PERMISSION_DENIED") {
        return Err(AppError::PermissionDenied(message));
    }

    Err(AppError::IdentityService(message))
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<Account>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateResponse {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    email: String,
    display_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_error_codes() {
        assert!(is_credential_error("INVALID_PASSWORD"));
        assert!(is_credential_error("INVALID_LOGIN_CREDENTIALS"));
        assert!(is_credential_error("EMAIL_NOT_FOUND : There is no user record"));
        assert!(!is_credential_error("TOO_MANY_ATTEMPTS_TRY_LATER"));
    }

    #[test]
    fn test_project_url_layout() {
        let client =
            IdentityToolkitClient::with_base_url("http://localhost:9099/", "demo", None).unwrap();
        assert_eq!(
            client.project_url(":lookup"),
            "http://localhost:9099/projects/demo/accounts:lookup"
        );
        assert_eq!(
            client.project_url(""),
            "http://localhost:9099/projects/demo/accounts"
        );
    }
}
