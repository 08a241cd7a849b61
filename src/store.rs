// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Profile and wallet store contracts, with in-memory implementations.
//!
//! The stores are the persistence collaborators of account provisioning.
//! A database-backed service implements these traits over its own
//! repositories; the in-memory variants back tests and embedded use.
//!
//! ## Uniqueness
//!
//! `ProfileStore::create` MUST enforce email uniqueness and report a
//! violation as [`StoreError::AlreadyExists`]. Provisioning relies on
//! that to resolve concurrent sign-ups for the same email; a store that
//! silently overwrites would yield duplicate accounts. Likewise
//! `WalletStore::create_for_owner` refuses a second wallet per owner.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use uuid::Uuid;

use crate::models::{Profile, ProfileDraft, Wallet};

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Entity already exists (uniqueness violation)
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Backend failure (connection, lock, serialization)
    #[error("Store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence contract for profiles, keyed by email.
pub trait ProfileStore: Send + Sync {
    /// Look up a profile by its email.
    fn find_by_email(&self, email: &str) -> StoreResult<Option<Profile>>;

    /// Create a profile from a draft as a single atomic commit.
    ///
    /// Returns `AlreadyExists` if a profile with the same email exists;
    /// on any error no profile is persisted.
    fn create(&self, draft: ProfileDraft) -> StoreResult<Profile>;

    /// Persist changes to an existing profile.
    fn save(&self, profile: &Profile) -> StoreResult<()>;
}

/// Persistence contract for wallets, owned by exactly one profile.
pub trait WalletStore: Send + Sync {
    /// Create a wallet for the given owner.
    ///
    /// Returns `AlreadyExists` if the owner already has a wallet.
    fn create_for_owner(&self, owner: &Profile) -> StoreResult<Wallet>;
}

/// In-memory profile store.
#[derive(Default)]
pub struct InMemoryProfileStore {
    /// Profiles keyed by email (the unique provisioning identity)
    profiles: RwLock<HashMap<String, Profile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored profiles.
    pub fn len(&self) -> usize {
        self.profiles.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProfileStore for InMemoryProfileStore {
    fn find_by_email(&self, email: &str) -> StoreResult<Option<Profile>> {
        let profiles = self
            .profiles
            .read()
            .map_err(|_| StoreError::Backend("profile store lock poisoned".to_string()))?;
        Ok(profiles.get(email).cloned())
    }

    fn create(&self, draft: ProfileDraft) -> StoreResult<Profile> {
        let mut profiles = self
            .profiles
            .write()
            .map_err(|_| StoreError::Backend("profile store lock poisoned".to_string()))?;

        // Uniqueness check and insert under one write lock.
        if profiles.contains_key(&draft.email) {
            return Err(StoreError::AlreadyExists(format!("Profile {}", draft.email)));
        }

        let profile = draft.into_profile();
        profiles.insert(profile.email.clone(), profile.clone());
        Ok(profile)
    }

    fn save(&self, profile: &Profile) -> StoreResult<()> {
        let mut profiles = self
            .profiles
            .write()
            .map_err(|_| StoreError::Backend("profile store lock poisoned".to_string()))?;

        match profiles.get_mut(&profile.email) {
            Some(stored) => {
                *stored = profile.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("Profile {}", profile.email))),
        }
    }
}

/// In-memory wallet store.
#[derive(Default)]
pub struct InMemoryWalletStore {
    /// Wallets keyed by owner profile id
    wallets: RwLock<HashMap<String, Wallet>>,
}

impl InMemoryWalletStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the wallet owned by a profile.
    pub fn find_by_owner(&self, owner_id: &str) -> Option<Wallet> {
        self.wallets
            .read()
            .ok()
            .and_then(|w| w.get(owner_id).cloned())
    }
}

impl WalletStore for InMemoryWalletStore {
    fn create_for_owner(&self, owner: &Profile) -> StoreResult<Wallet> {
        let mut wallets = self
            .wallets
            .write()
            .map_err(|_| StoreError::Backend("wallet store lock poisoned".to_string()))?;

        if wallets.contains_key(&owner.id) {
            return Err(StoreError::AlreadyExists(format!(
                "Wallet for profile {}",
                owner.id
            )));
        }

        let wallet = Wallet {
            id: Uuid::new_v4().to_string(),
            owner_id: owner.id.clone(),
            created_at: Utc::now(),
        };
        wallets.insert(owner.id.clone(), wallet.clone());
        Ok(wallet)
    }
}
