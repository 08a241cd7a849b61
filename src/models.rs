// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Account Data Models
//!
//! This module defines the domain types shared between token verification
//! and account provisioning: the identity provider tag, user roles, the
//! [`Profile`] account record, its financial [`Wallet`], and the
//! out-of-band name payload Apple delivers on first sign-in.
//!
//! ## Profile Identity
//!
//! A profile's `email` is its provisioning identity: it is the unique
//! lookup key and never changes after creation. Social accounts carry no
//! usable password (`password_hash` is `None`), so they cannot
//! authenticate through the password login path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Identity Providers
// =============================================================================

/// Supported social identity providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Google OIDC (ID tokens and the authorization-code flow)
    Google,
    /// Apple Sign In (identity tokens)
    Apple,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Google => write!(f, "google"),
            Provider::Apple => write!(f, "apple"),
        }
    }
}

// =============================================================================
// Roles
// =============================================================================

/// Account roles for authorization.
///
/// Social sign-in always provisions `User`; `Admin` is only ever assigned
/// through the administrative surface outside this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Normal account (owns a wallet)
    User,
    /// Full administrative access
    Admin,
}

impl Role {
    /// Parse role from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Role> {
        match s.to_lowercase().as_str() {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl Default for Role {
    /// Default role is User (least privilege).
    fn default() -> Self {
        Role::User
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

// =============================================================================
// Profile Models
// =============================================================================

/// A local user account created from verified social identity claims.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    /// Unique profile identifier (UUID)
    pub id: String,
    /// Email address - the unique provisioning identity, never changes
    pub email: String,
    /// Family name
    pub surname: String,
    /// Given name(s)
    pub other_names: String,
    /// Whether the email has been verified by an identity provider.
    /// Monotonic: transitions false to true only, never reversed.
    pub email_verified: bool,
    /// Account role
    pub role: Role,
    /// Whether the account is active
    pub active: bool,
    /// Password hash. Always `None` for social accounts: they have no
    /// usable credential and cannot authenticate via password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    /// When the profile was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new profile.
///
/// The store assigns the id and creation timestamp on commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileDraft {
    /// Email address (unique key)
    pub email: String,
    /// Family name
    pub surname: String,
    /// Given name(s)
    pub other_names: String,
    /// Initial email verification state
    pub email_verified: bool,
    /// Account role
    pub role: Role,
    /// Whether the account starts active
    pub active: bool,
}

impl ProfileDraft {
    /// Materialize a draft into a profile with a fresh id and timestamp.
    pub fn into_profile(self) -> Profile {
        Profile {
            id: Uuid::new_v4().to_string(),
            email: self.email,
            surname: self.surname,
            other_names: self.other_names,
            email_verified: self.email_verified,
            role: self.role,
            active: self.active,
            password_hash: None,
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// Wallet Models
// =============================================================================

/// A financial wallet owned by exactly one profile.
///
/// Created at most once per profile. A profile may transiently exist
/// without a wallet when attachment fails during provisioning; the
/// provisioning result reports that state so it can be repaired later.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Wallet {
    /// Unique wallet identifier (UUID)
    pub id: String,
    /// Profile id of the owner
    pub owner_id: String,
    /// When the wallet was created
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Apple First-Sign-In Payload
// =============================================================================

/// User name as supplied by Apple's sign-in sheet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppleName {
    /// Given name
    #[serde(default, rename = "firstName")]
    pub first_name: String,
    /// Family name
    #[serde(default, rename = "lastName")]
    pub last_name: String,
}

/// Extra data Apple delivers out-of-band on the first sign-in only.
///
/// Apple identity tokens do not reliably carry name fields; repeat
/// sign-ins never include them. Callers forward this payload to
/// provisioning when the client supplied it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppleSignupPayload {
    /// User name, present on first sign-in if the user shared it
    #[serde(default)]
    pub name: Option<AppleName>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_display_is_lowercase() {
        assert_eq!(Provider::Google.to_string(), "google");
        assert_eq!(Provider::Apple.to_string(), "apple");
    }

    #[test]
    fn role_from_str_parses_correctly() {
        assert_eq!(Role::from_str("user"), Some(Role::User));
        assert_eq!(Role::from_str("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::from_str("unknown"), None);
    }

    #[test]
    fn default_role_is_user() {
        assert_eq!(Role::default(), Role::User);
    }

    #[test]
    fn draft_into_profile_has_no_usable_password() {
        let draft = ProfileDraft {
            email: "a@example.com".to_string(),
            surname: "B".to_string(),
            other_names: "A".to_string(),
            email_verified: true,
            role: Role::default(),
            active: true,
        };

        let profile = draft.into_profile();
        assert_eq!(profile.email, "a@example.com");
        assert!(profile.password_hash.is_none());
        assert!(profile.active);
        assert_eq!(profile.role, Role::User);
        assert!(!profile.id.is_empty());
    }

    #[test]
    fn apple_payload_deserializes_client_field_names() {
        let payload: AppleSignupPayload =
            serde_json::from_str(r#"{"name":{"firstName":"Ada","lastName":"Lovelace"}}"#).unwrap();
        let name = payload.name.unwrap();
        assert_eq!(name.first_name, "Ada");
        assert_eq!(name.last_name, "Lovelace");
    }

    #[test]
    fn apple_payload_tolerates_missing_name() {
        let payload: AppleSignupPayload = serde_json::from_str("{}").unwrap();
        assert!(payload.name.is_none());
    }
}
