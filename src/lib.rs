// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Social Identity - Sign-in Verification & Account Provisioning
//!
//! This crate verifies third-party identity tokens (Google OIDC ID
//! tokens, Apple identity tokens) and provisions local accounts with
//! their wallet records. It is a library consumed by the HTTP-facing
//! service layer; it exposes no transport of its own.
//!
//! ## Modules
//!
//! - `auth` - Token verification (JWKS resolution, Google/Apple
//!   verifiers, authorization-code exchange)
//! - `provision` - Account provisioning from verified claims
//! - `store` - Profile/wallet store contracts and in-memory impls
//! - `models` - Domain types (Profile, Wallet, Provider, Role)
//! - `config` - Provider configuration
//!
//! ## Typical Flow
//!
//! ```rust,ignore
//! let config = SocialAuthConfig::from_env()?;
//! let google = GoogleVerifier::new(&config);
//! let provisioner = AccountProvisioner::new(profiles, wallets);
//!
//! let claims = google.verify(&raw_token).await?;
//! let account = provisioner.get_or_create(Provider::Google, &claims, None)?;
//! ```

pub mod auth;
pub mod config;
pub mod models;
pub mod provision;
pub mod store;

pub use auth::{
    AppleVerifier, AuthError, CodeExchanger, GoogleVerifier, IdentityClaims, JwksResolver,
};
pub use config::SocialAuthConfig;
pub use models::{AppleName, AppleSignupPayload, Profile, ProfileDraft, Provider, Role, Wallet};
pub use provision::{AccountProvisioner, ProvisionError, ProvisionedAccount, WalletAttachment};
pub use store::{
    InMemoryProfileStore, InMemoryWalletStore, ProfileStore, StoreError, StoreResult, WalletStore,
};
