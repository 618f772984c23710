// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile model stored in Firestore.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Access level gating administrative capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// Subscription level gating content access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Premium,
    Vip,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Premium => "premium",
            SubscriptionTier::Vip => "vip",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}' (expected user or admin)", other)),
        }
    }
}

impl FromStr for SubscriptionTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(SubscriptionTier::Free),
            "premium" => Ok(SubscriptionTier::Premium),
            "vip" => Ok(SubscriptionTier::Vip),
            other => Err(format!(
                "unknown tier '{}' (expected free, premium or vip)",
                other
            )),
        }
    }
}

/// Free-form profile settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileMetadata {
    #[serde(default)]
    pub onboarding_completed: bool,
    #[serde(default = "default_language")]
    pub preferred_language: String,
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for ProfileMetadata {
    fn default() -> Self {
        Self {
            onboarding_completed: false,
            preferred_language: default_language(),
        }
    }
}

/// Profile document, stored at `users/{uid}`.
///
/// The document ID is always the identity account's `uid`; it is read back
/// from the document name and never written as a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(alias = "_firestore_id", skip_serializing, default)]
    pub uid: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub display_name: String,
    #[serde(rename = "photoURL", default)]
    pub photo_url: Option<String>,
    /// `None` when the stored value is absent or not a known tier
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub subscription_tier: Option<SubscriptionTier>,
    /// `None` when the stored value is absent or not a known role
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub role: Option<Role>,
    /// When the profile was created (ISO 8601)
    #[serde(default)]
    pub created_at: String,
    /// Last sign-in (ISO 8601)
    #[serde(default)]
    pub last_login_at: String,
    #[serde(default)]
    pub notifications_enabled: bool,
    #[serde(default)]
    pub push_tokens: Vec<String>,
    #[serde(default)]
    pub streak_days: u32,
    #[serde(default)]
    pub completed_lessons: Vec<String>,
    #[serde(default)]
    pub metadata: ProfileMetadata,
}

impl Profile {
    /// Fresh profile for an account, with the default field set.
    pub fn new(
        uid: &str,
        email: &str,
        display_name: &str,
        role: Role,
        tier: SubscriptionTier,
        now: &str,
    ) -> Self {
        Self {
            uid: uid.to_string(),
            email: email.to_string(),
            phone: None,
            display_name: display_name.to_string(),
            photo_url: None,
            subscription_tier: Some(tier),
            role: Some(role),
            created_at: now.to_string(),
            last_login_at: now.to_string(),
            notifications_enabled: true,
            push_tokens: Vec::new(),
            streak_days: 0,
            completed_lessons: Vec::new(),
            metadata: ProfileMetadata {
                onboarding_completed: true,
                preferred_language: default_language(),
            },
        }
    }

    /// Fields that differ from the desired role and tier, or `None` if in sync.
    pub fn drift(&self, role: Role, tier: SubscriptionTier) -> Option<ProfilePatch> {
        let patch = ProfilePatch {
            role: (self.role != Some(role)).then_some(role),
            subscription_tier: (self.subscription_tier != Some(tier)).then_some(tier),
        };
        (!patch.is_empty()).then_some(patch)
    }

    /// Merge a patch in place.
    pub fn apply(&mut self, patch: &ProfilePatch) {
        if let Some(role) = patch.role {
            self.role = Some(role);
        }
        if let Some(tier) = patch.subscription_tier {
            self.subscription_tier = Some(tier);
        }
    }
}

/// Parse a stored enum string, mapping unknown values to `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| value.parse().ok()))
}

/// Partial profile update. Only present fields are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_tier: Option<SubscriptionTier>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.role.is_none() && self.subscription_tier.is_none()
    }

    /// Stored field names covered by this patch (the Firestore update mask).
    pub fn field_paths(&self) -> Vec<&'static str> {
        let mut paths = Vec::with_capacity(2);
        if self.role.is_some() {
            paths.push("role");
        }
        if self.subscription_tier.is_some() {
            paths.push("subscriptionTier");
        }
        paths
    }
}
