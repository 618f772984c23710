// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use admin_provisioner::config::TargetConfig;
use admin_provisioner::db::{FirestoreDb, ProfileStore};
use admin_provisioner::error::AppError;
use admin_provisioner::models::{
    Account, AccountUpdate, NewAccount, Profile, ProfilePatch, Role, SubscriptionTier,
};
use admin_provisioner::services::{Credentials, IdentityService};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Generate a unique uid for test isolation.
#[allow(dead_code)]
pub fn unique_uid() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("test-{}", nanos)
}

/// Standard admin target used across tests.
#[allow(dead_code)]
pub fn admin_target() -> TargetConfig {
    TargetConfig::new(
        Credentials {
            email: "admin@example.com".to_string(),
            password: "Sup3r$ecretPw".to_string(),
            display_name: "Site Admin".to_string(),
        },
        Role::Admin,
        SubscriptionTier::Vip,
    )
    .expect("valid target")
}

// ─── In-memory identity service ─────────────────────────────────────────

/// Identity service backed by a map, counting every write call.
#[derive(Default)]
pub struct InMemoryIdentity {
    accounts: Mutex<HashMap<String, (Account, String)>>,
    next_id: AtomicUsize,
    writes: AtomicUsize,
    /// Simulate a concurrent writer: the next create registers the account
    /// itself and then reports a duplicate email.
    race_next_create: AtomicBool,
}

#[allow(dead_code)]
impl InMemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn account_count(&self) -> usize {
        self.accounts.lock().unwrap().len()
    }

    pub fn password_of(&self, uid: &str) -> Option<String> {
        self.accounts
            .lock()
            .unwrap()
            .get(uid)
            .map(|(_, password)| password.clone())
    }

    /// Register an account directly, bypassing the write counter.
    pub fn seed(&self, email: &str, password: &str, display_name: &str) -> Account {
        self.insert(email, password, display_name)
    }

    pub fn race_next_create(&self) {
        self.race_next_create.store(true, Ordering::SeqCst);
    }

    fn insert(&self, email: &str, password: &str, display_name: &str) -> Account {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let account = Account {
            uid: format!("uid-{}", n),
            email: email.to_string(),
            display_name: Some(display_name.to_string()),
            email_verified: true,
        };
        self.accounts.lock().unwrap().insert(
            account.uid.clone(),
            (account.clone(), password.to_string()),
        );
        account
    }

    fn find(&self, email: &str) -> Option<Account> {
        self.accounts
            .lock()
            .unwrap()
            .values()
            .find(|(account, _)| account.email == email)
            .map(|(account, _)| account.clone())
    }
}

impl IdentityService for InMemoryIdentity {
    async fn lookup_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        Ok(self.find(email))
    }

    async fn create_account(&self, account: &NewAccount) -> Result<Account, AppError> {
        if self.race_next_create.swap(false, Ordering::SeqCst) {
            self.insert(&account.email, &account.password, &account.display_name);
            return Err(AppError::AccountExists(account.email.clone()));
        }
        if self.find(&account.email).is_some() {
            return Err(AppError::AccountExists(account.email.clone()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(self.insert(&account.email, &account.password, &account.display_name))
    }

    async fn update_account(&self, uid: &str, update: &AccountUpdate) -> Result<(), AppError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut accounts = self.accounts.lock().unwrap();
        let (_, password) = accounts
            .get_mut(uid)
            .ok_or_else(|| AppError::IdentityService(AppError::USER_NOT_FOUND.to_string()))?;
        if let Some(new_password) = &update.password {
            *password = new_password.clone();
        }
        Ok(())
    }

    async fn delete_account(&self, uid: &str) -> Result<(), AppError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.accounts.lock().unwrap().remove(uid);
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Account, AppError> {
        self.accounts
            .lock()
            .unwrap()
            .values()
            .find(|(account, stored)| account.email == email && stored == password)
            .map(|(account, _)| account.clone())
            .ok_or_else(|| AppError::AuthenticationFailed("INVALID_LOGIN_CREDENTIALS".to_string()))
    }
}

// ─── In-memory profile store ────────────────────────────────────────────

/// Profile store backed by a map, counting every write call.
#[derive(Default)]
pub struct InMemoryProfileStore {
    docs: Mutex<HashMap<String, Profile>>,
    writes: AtomicUsize,
    deny_writes: AtomicBool,
}

#[allow(dead_code)]
impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.docs.lock().unwrap().len()
    }

    pub fn get(&self, uid: &str) -> Option<Profile> {
        self.docs.lock().unwrap().get(uid).cloned()
    }

    /// Store a profile directly, bypassing the write counter.
    pub fn seed(&self, uid: &str, profile: Profile) {
        self.docs.lock().unwrap().insert(uid.to_string(), profile);
    }

    /// Make every subsequent write fail as a security-rules rejection would.
    pub fn deny_writes(&self) {
        self.deny_writes.store(true, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), AppError> {
        if self.deny_writes.load(Ordering::SeqCst) {
            return Err(AppError::PermissionDenied(
                "Missing or insufficient permissions.".to_string(),
            ));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl ProfileStore for InMemoryProfileStore {
    async fn get_profile(&self, uid: &str) -> Result<Option<Profile>, AppError> {
        Ok(self.get(uid).map(|mut profile| {
            profile.uid = uid.to_string();
            profile
        }))
    }

    async fn create_profile(&self, uid: &str, profile: &Profile) -> Result<(), AppError> {
        self.check_writable()?;
        self.docs
            .lock()
            .unwrap()
            .insert(uid.to_string(), profile.clone());
        Ok(())
    }

    async fn patch_profile(&self, uid: &str, patch: &ProfilePatch) -> Result<(), AppError> {
        self.check_writable()?;
        let mut docs = self.docs.lock().unwrap();
        let profile = docs
            .get_mut(uid)
            .ok_or_else(|| AppError::NotFound(format!("profile {}", uid)))?;
        profile.apply(patch);
        Ok(())
    }

    async fn delete_profile(&self, uid: &str) -> Result<(), AppError> {
        self.check_writable()?;
        self.docs.lock().unwrap().remove(uid);
        Ok(())
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, AppError> {
        Ok(self
            .docs
            .lock()
            .unwrap()
            .iter()
            .map(|(uid, profile)| Profile {
                uid: uid.clone(),
                ..profile.clone()
            })
            .collect())
    }
}
