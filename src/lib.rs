// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Admin provisioner: keeps the application's administrator account and its
//! Firestore profile in the desired state.
//!
//! The account lives in Firebase Auth (Identity Toolkit), the profile in the
//! `users` collection keyed by the account uid.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod time_utils;

use db::FirestoreDb;
use services::{IdentityToolkitClient, Reconciler};

/// Reconciler wired to the production clients.
pub type AppReconciler = Reconciler<IdentityToolkitClient, FirestoreDb>;
