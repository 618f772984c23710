//! Identity provider account model.

use serde::{Deserialize, Serialize};

/// Account as returned by the identity service.
///
/// The password is write-only and never part of this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Identity provider user ID (also the Profile document ID)
    #[serde(rename = "localId")]
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
}

/// Parameters for creating an account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub email_verified: bool,
}

impl NewAccount {
    /// New account with the email already marked verified.
    pub fn verified(email: &str, password: &str, display_name: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
            display_name: display_name.to_string(),
            email_verified: true,
        }
    }
}

/// Account changes applied to an existing account. `None` leaves the value unchanged.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl AccountUpdate {
    pub fn is_empty(&self) -> bool {
        self.password.is_none()
    }
}
