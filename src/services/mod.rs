// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod credentials;
pub mod identity;
pub mod reconcile;

pub use credentials::{CredentialResolver, Credentials};
pub use identity::{ensure_account, IdentityService, IdentityToolkitClient};
pub use reconcile::{
    ReconcileMode, ReconcileOptions, ReconcileReport, ReconcileState, Reconciler, UNASSIGNED_UID,
};
