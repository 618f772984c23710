// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin account reconciliation.
//!
//! Walks `NoAccount → AccountNoProfile → ProfileWrongRole → ProfileOk`,
//! always starting from the account check and skipping ahead as each check
//! passes. Every step is a single awaited call; nothing is retried and
//! nothing is rolled back, so a failed run is fixed by running it again.

use crate::config::TargetConfig;
use crate::db::ProfileStore;
use crate::error::AppError;
use crate::models::{Account, AccountUpdate, Profile};
use crate::services::identity::{ensure_account, IdentityService};
use crate::time_utils::format_utc_rfc3339;
use chrono::{DateTime, Utc};
use std::fmt;

/// Shown in place of a uid the identity service has not assigned yet.
pub const UNASSIGNED_UID: &str = "<unassigned>";

/// Reconciliation states, in the order they are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileState {
    NoAccount,
    AccountNoProfile,
    ProfileWrongRole,
    ProfileOk,
}

impl fmt::Display for ReconcileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReconcileState::NoAccount => "NO_ACCOUNT",
            ReconcileState::AccountNoProfile => "ACCOUNT_NO_PROFILE",
            ReconcileState::ProfileWrongRole => "PROFILE_WRONG_ROLE",
            ReconcileState::ProfileOk => "PROFILE_OK",
        })
    }
}

/// Whether corrective writes are performed or only reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcileMode {
    #[default]
    Apply,
    DryRun,
}

/// Per-run switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOptions {
    pub mode: ReconcileMode,
    /// Set the configured password on an account that already exists.
    pub reset_password: bool,
}

/// Outcome of a reconciliation run.
#[derive(Debug, Clone)]
pub struct ReconcileReport {
    /// `None` only for a dry run against a missing account.
    pub account: Option<Account>,
    /// Final profile state (as it would be, for a dry run). Its `uid` is
    /// empty when [`ReconcileReport::uid`] is `None`.
    pub profile: Profile,
    /// States entered, ending in `ProfileOk`.
    pub states: Vec<ReconcileState>,
    pub account_created: bool,
    pub profile_created: bool,
    pub profile_patched: bool,
    pub password_reset: bool,
    /// Writes performed, or that would be performed in a dry run.
    pub writes: usize,
    pub mode: ReconcileMode,
}

impl ReconcileReport {
    /// Account uid, `None` until a dry run's account would be created.
    pub fn uid(&self) -> Option<&str> {
        self.account.as_ref().map(|a| a.uid.as_str())
    }

    /// True when the target was already in the desired state.
    pub fn is_noop(&self) -> bool {
        self.writes == 0
    }
}

/// Brings the admin account and profile to the target state.
pub struct Reconciler<I, S> {
    identity: I,
    store: S,
}

impl<I: IdentityService, S: ProfileStore> Reconciler<I, S> {
    pub fn new(identity: I, store: S) -> Self {
        Self { identity, store }
    }

    pub fn identity(&self) -> &I {
        &self.identity
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run the flow with the current time as the profile timestamp.
    pub async fn run(
        &self,
        target: &TargetConfig,
        options: ReconcileOptions,
    ) -> Result<ReconcileReport, AppError> {
        self.run_at(target, options, Utc::now()).await
    }

    /// Run the flow, stamping any new profile with `now`.
    pub async fn run_at(
        &self,
        target: &TargetConfig,
        options: ReconcileOptions,
        now: DateTime<Utc>,
    ) -> Result<ReconcileReport, AppError> {
        let dry_run = options.mode == ReconcileMode::DryRun;
        let mut states = Vec::with_capacity(3);
        let mut writes = 0;
        let mut password_reset = false;

        // ─── Account ─────────────────────────────────────────────────
        let (account, account_created) = if dry_run {
            match self.identity.lookup_by_email(&target.email).await? {
                Some(account) => (Some(account), false),
                None => {
                    states.push(ReconcileState::NoAccount);
                    writes += 1;
                    (None, true)
                }
            }
        } else {
            let (account, created) = ensure_account(
                &self.identity,
                &target.email,
                &target.password,
                &target.display_name,
            )
            .await
            .inspect_err(|e| {
                tracing::error!(error = %e, email = %target.email, "Account step failed")
            })?;
            if created {
                states.push(ReconcileState::NoAccount);
                writes += 1;
            }
            (Some(account), created)
        };

        if options.reset_password && !account_created {
            if let Some(account) = &account {
                if !dry_run {
                    let update = AccountUpdate {
                        password: Some(target.password.clone()),
                    };
                    self.identity
                        .update_account(&account.uid, &update)
                        .await
                        .inspect_err(|e| {
                            tracing::error!(error = %e, uid = %account.uid, "Password reset failed")
                        })?;
                }
                writes += 1;
                password_reset = true;
            }
        }

        // ─── Profile ─────────────────────────────────────────────────
        let uid = account.as_ref().map(|a| a.uid.clone()).unwrap_or_default();
        let existing = match &account {
            Some(_) => self
                .store
                .get_profile(&uid)
                .await
                .inspect_err(|e| tracing::error!(error = %e, uid = %uid, "Profile read failed"))?,
            None => None,
        };

        let mut profile_created = false;
        let mut profile_patched = false;

        let profile = match existing {
            None => {
                states.push(ReconcileState::AccountNoProfile);
                let display_name = account
                    .as_ref()
                    .and_then(|a| a.display_name.as_deref())
                    .filter(|name| !name.is_empty())
                    .unwrap_or(&target.display_name);
                let profile = Profile::new(
                    &uid,
                    &target.email,
                    display_name,
                    target.role,
                    target.tier,
                    &format_utc_rfc3339(now),
                );
                if !dry_run {
                    self.store
                        .create_profile(&uid, &profile)
                        .await
                        .inspect_err(|e| {
                            tracing::error!(error = %e, uid = %uid, "Profile create failed")
                        })?;
                    tracing::info!(
                        uid = %uid,
                        role = %target.role,
                        tier = %target.tier,
                        "Profile created"
                    );
                }
                writes += 1;
                profile_created = true;
                profile
            }
            Some(mut profile) => {
                // The document ID is the account uid, whatever the stored body says.
                profile.uid = uid.clone();
                if let Some(patch) = profile.drift(target.role, target.tier) {
                    states.push(ReconcileState::ProfileWrongRole);
                    if !dry_run {
                        self.store
                            .patch_profile(&uid, &patch)
                            .await
                            .inspect_err(|e| {
                                tracing::error!(error = %e, uid = %uid, "Profile patch failed")
                            })?;
                        tracing::info!(
                            uid = %uid,
                            from_role = ?profile.role,
                            from_tier = ?profile.subscription_tier,
                            "Profile role/tier corrected"
                        );
                    }
                    profile.apply(&patch);
                    writes += 1;
                    profile_patched = true;
                }
                profile
            }
        };

        states.push(ReconcileState::ProfileOk);

        tracing::info!(
            email = %target.email,
            uid = account.as_ref().map_or(UNASSIGNED_UID, |a| a.uid.as_str()),
            writes,
            dry_run,
            "Reconciliation complete"
        );

        Ok(ReconcileReport {
            account,
            profile,
            states,
            account_created,
            profile_created,
            profile_patched,
            password_reset,
            writes,
            mode: options.mode,
        })
    }

    /// Delete the profile and then the account. Missing records are not errors.
    ///
    /// Returns `false` if there was no account for `email`.
    pub async fn teardown_by_email(&self, email: &str) -> Result<bool, AppError> {
        match self.identity.lookup_by_email(email).await? {
            Some(account) => {
                self.teardown(&account.uid).await?;
                Ok(true)
            }
            None => {
                tracing::info!(email, "No account to delete");
                Ok(false)
            }
        }
    }

    /// Delete the profile and account for `uid`.
    pub async fn teardown(&self, uid: &str) -> Result<(), AppError> {
        self.store
            .delete_profile(uid)
            .await
            .inspect_err(|e| tracing::error!(error = %e, uid, "Profile delete failed"))?;
        self.identity
            .delete_account(uid)
            .await
            .inspect_err(|e| tracing::error!(error = %e, uid, "Account delete failed"))?;
        tracing::info!(uid, "Account and profile deleted");
        Ok(())
    }

    /// Confirm the target credentials sign in to the expected account.
    pub async fn verify_sign_in(&self, target: &TargetConfig) -> Result<Account, AppError> {
        let account = self
            .identity
            .sign_in(&target.email, &target.password)
            .await?;
        tracing::info!(uid = %account.uid, email = %account.email, "Sign-in succeeded");
        Ok(account)
    }

    /// Account and profile for an email, without modifying anything.
    pub async fn inspect(&self, email: &str) -> Result<(Account, Option<Profile>), AppError> {
        let account = self
            .identity
            .lookup_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("account {}", email)))?;
        let profile = self.store.get_profile(&account.uid).await?;
        Ok((account, profile))
    }
}
