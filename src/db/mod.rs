//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

use crate::error::AppError;
use crate::models::{Profile, ProfilePatch};

/// Collection names as constants.
pub mod collections {
    /// Profiles, keyed by identity account uid
    pub const USERS: &str = "users";
}

/// Profile document operations used by reconciliation.
///
/// Writes are last-writer-wins; no operation takes a lock or a transaction.
#[allow(async_fn_in_trait)]
pub trait ProfileStore {
    /// Fetch a profile, `None` if the document does not exist.
    async fn get_profile(&self, uid: &str) -> Result<Option<Profile>, AppError>;

    /// Write a full profile, replacing any existing document.
    async fn create_profile(&self, uid: &str, profile: &Profile) -> Result<(), AppError>;

    /// Merge only the fields present in `patch`.
    async fn patch_profile(&self, uid: &str, patch: &ProfilePatch) -> Result<(), AppError>;

    /// Delete a profile. Deleting a missing document succeeds.
    async fn delete_profile(&self, uid: &str) -> Result<(), AppError>;

    /// List every profile in the collection.
    async fn list_profiles(&self) -> Result<Vec<Profile>, AppError>;
}
