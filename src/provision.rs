// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account provisioning from verified identity claims.
//!
//! Turns [`IdentityClaims`] into a durable [`Profile`] plus an attached
//! [`crate::models::Wallet`], creating the profile if absent.
//!
//! ## Partial Failure
//!
//! The profile commit is the atomicity boundary: if it fails, nothing
//! exists and the error propagates. Wallet attachment is best-effort -
//! a failure leaves a valid profile without a wallet, reported as
//! [`WalletAttachment::Pending`] so a reconciliation job can repair it.
//!
//! ## Concurrency
//!
//! Lookup-then-create races between concurrent sign-ins for the same
//! email are resolved through the store's uniqueness constraint: a
//! creation that loses the race re-reads the winner's profile and
//! returns it as an existing account.

use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::IdentityClaims;
use crate::models::{AppleSignupPayload, Profile, ProfileDraft, Provider, Role};
use crate::store::{ProfileStore, StoreError, WalletStore};

/// Error type for provisioning.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// Claims carry no email; no account is touched
    #[error("Email is required for social authentication")]
    MissingEmail,

    /// Profile store failure during lookup, creation, or update
    #[error("Profile store failure: {0}")]
    StoreFailure(#[from] StoreError),
}

/// Wallet state of a provisioned account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletAttachment {
    /// The profile has a wallet (created now, or already present)
    Attached,
    /// Wallet creation failed; the profile exists without one and the
    /// wallet should be created by a later reconciliation pass
    Pending,
    /// Lookup path: wallet creation was not attempted
    NotAttempted,
}

/// Result of a provisioning call.
#[derive(Debug, Clone)]
pub struct ProvisionedAccount {
    /// The existing or newly created profile
    pub profile: Profile,
    /// True only when this call created the profile
    pub created: bool,
    /// Wallet state, queryable for reconciliation
    pub wallet: WalletAttachment,
}

/// Provisions local accounts from verified social identity claims.
pub struct AccountProvisioner {
    profiles: Arc<dyn ProfileStore>,
    wallets: Arc<dyn WalletStore>,
}

impl AccountProvisioner {
    /// Create a provisioner over the given stores.
    pub fn new(profiles: Arc<dyn ProfileStore>, wallets: Arc<dyn WalletStore>) -> Self {
        Self { profiles, wallets }
    }

    /// Return the existing account for the claims' email, or create it.
    ///
    /// `apple_payload` is the out-of-band name data Apple sends on first
    /// sign-in; it is ignored for Google.
    pub fn get_or_create(
        &self,
        provider: Provider,
        claims: &IdentityClaims,
        apple_payload: Option<&AppleSignupPayload>,
    ) -> Result<ProvisionedAccount, ProvisionError> {
        let email = claims.email.trim();
        if email.is_empty() {
            return Err(ProvisionError::MissingEmail);
        }

        if let Some(profile) = self.profiles.find_by_email(email)? {
            info!(email = %email, "Existing profile found");
            return self.finish_existing(profile, claims);
        }

        let (surname, other_names) = derive_names(provider, claims, apple_payload, email);

        let draft = ProfileDraft {
            email: email.to_string(),
            surname,
            other_names,
            email_verified: claims.email_verified,
            role: Role::default(),
            active: true,
        };

        let profile = match self.profiles.create(draft) {
            Ok(profile) => profile,
            // Lost the check-then-act race: a concurrent sign-in created
            // this email between lookup and commit. The winner's profile
            // is the account; re-read it instead of failing.
            Err(StoreError::AlreadyExists(_)) => {
                let existing = self.profiles.find_by_email(email)?.ok_or_else(|| {
                    StoreError::Backend(format!(
                        "profile for {email} vanished after creation conflict"
                    ))
                })?;
                info!(email = %email, "Profile was concurrently created");
                return self.finish_existing(existing, claims);
            }
            Err(e) => return Err(e.into()),
        };

        info!(email = %profile.email, provider = %provider, "Created new profile");

        let wallet = self.attach_wallet(&profile);
        Ok(ProvisionedAccount {
            profile,
            created: true,
            wallet,
        })
    }

    /// Lookup path: apply the monotonic verification update and return.
    fn finish_existing(
        &self,
        mut profile: Profile,
        claims: &IdentityClaims,
    ) -> Result<ProvisionedAccount, ProvisionError> {
        // Monotonic: false -> true only, never reset.
        if !profile.email_verified && claims.email_verified {
            profile.email_verified = true;
            self.profiles.save(&profile)?;
        }

        Ok(ProvisionedAccount {
            profile,
            created: false,
            wallet: WalletAttachment::NotAttempted,
        })
    }

    /// Best-effort wallet creation for a freshly created profile.
    fn attach_wallet(&self, profile: &Profile) -> WalletAttachment {
        match self.wallets.create_for_owner(profile) {
            Ok(_) => {
                info!(email = %profile.email, "Created wallet for new profile");
                WalletAttachment::Attached
            }
            // A concurrent attach already created it; the profile has
            // its wallet either way.
            Err(StoreError::AlreadyExists(_)) => WalletAttachment::Attached,
            Err(e) => {
                warn!(email = %profile.email, error = %e, "Wallet creation failed; profile provisioned without wallet");
                WalletAttachment::Pending
            }
        }
    }
}

/// Derive profile name fields from provider claims.
///
/// Google supplies names in the token; Apple only in the first-sign-in
/// payload. When neither yields a name, the email local-part stands in
/// for the given name.
fn derive_names(
    provider: Provider,
    claims: &IdentityClaims,
    apple_payload: Option<&AppleSignupPayload>,
    email: &str,
) -> (String, String) {
    let (surname, mut other_names) = match provider {
        Provider::Google => (claims.family_name.clone(), claims.given_name.clone()),
        Provider::Apple => match apple_payload.and_then(|p| p.name.as_ref()) {
            Some(name) => (name.last_name.clone(), name.first_name.clone()),
            None => (String::new(), String::new()),
        },
    };

    if surname.is_empty() && other_names.is_empty() {
        other_names = email.split('@').next().unwrap_or("").to_string();
    }

    (surname, other_names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppleName, Wallet};
    use crate::store::{InMemoryProfileStore, InMemoryWalletStore, StoreResult};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn claims(email: &str, verified: bool, given: &str, family: &str) -> IdentityClaims {
        IdentityClaims {
            subject: "subject-1".to_string(),
            email: email.to_string(),
            email_verified: verified,
            given_name: given.to_string(),
            family_name: family.to_string(),
            picture: String::new(),
            issuer: "https://accounts.google.com".to_string(),
            audience: "client-id".to_string(),
            expires_at: 4_102_444_800,
        }
    }

    fn provisioner() -> (AccountProvisioner, Arc<InMemoryProfileStore>, Arc<InMemoryWalletStore>) {
        let profiles = Arc::new(InMemoryProfileStore::new());
        let wallets = Arc::new(InMemoryWalletStore::new());
        let provisioner = AccountProvisioner::new(profiles.clone(), wallets.clone());
        (provisioner, profiles, wallets)
    }

    /// Wallet store whose creations always fail at the backend.
    struct FailingWalletStore;

    impl WalletStore for FailingWalletStore {
        fn create_for_owner(&self, _owner: &Profile) -> StoreResult<Wallet> {
            Err(StoreError::Backend("wallet table unavailable".to_string()))
        }
    }

    /// Wallet store that reports the wallet as already present.
    struct DuplicateWalletStore;

    impl WalletStore for DuplicateWalletStore {
        fn create_for_owner(&self, owner: &Profile) -> StoreResult<Wallet> {
            Err(StoreError::AlreadyExists(format!("Wallet for profile {}", owner.id)))
        }
    }

    /// Profile store simulating a lost lookup-then-create race: the
    /// first lookup misses, creation conflicts, the re-read hits.
    struct RacingProfileStore {
        inner: InMemoryProfileStore,
        first_lookup_done: AtomicBool,
    }

    impl RacingProfileStore {
        fn seeded_with(email: &str) -> Self {
            let inner = InMemoryProfileStore::new();
            inner
                .create(ProfileDraft {
                    email: email.to_string(),
                    surname: "Winner".to_string(),
                    other_names: "Race".to_string(),
                    email_verified: false,
                    role: Role::default(),
                    active: true,
                })
                .unwrap();
            Self {
                inner,
                first_lookup_done: AtomicBool::new(false),
            }
        }
    }

    impl ProfileStore for RacingProfileStore {
        fn find_by_email(&self, email: &str) -> StoreResult<Option<Profile>> {
            if !self.first_lookup_done.swap(true, Ordering::SeqCst) {
                return Ok(None);
            }
            self.inner.find_by_email(email)
        }

        fn create(&self, draft: ProfileDraft) -> StoreResult<Profile> {
            self.inner.create(draft)
        }

        fn save(&self, profile: &Profile) -> StoreResult<()> {
            self.inner.save(profile)
        }
    }

    #[test]
    fn google_first_call_creates_profile() {
        let (provisioner, _, wallets) = provisioner();
        let claims = claims("a@x.com", true, "A", "B");

        let account = provisioner
            .get_or_create(Provider::Google, &claims, None)
            .unwrap();

        assert!(account.created);
        assert_eq!(account.profile.surname, "B");
        assert_eq!(account.profile.other_names, "A");
        assert!(account.profile.email_verified);
        assert_eq!(account.profile.role, Role::User);
        assert!(account.profile.active);
        assert!(account.profile.password_hash.is_none());
        assert_eq!(account.wallet, WalletAttachment::Attached);
        assert!(wallets.find_by_owner(&account.profile.id).is_some());
    }

    #[test]
    fn second_call_returns_existing_unchanged() {
        let (provisioner, _, _) = provisioner();
        let claims = claims("a@x.com", true, "A", "B");

        let first = provisioner
            .get_or_create(Provider::Google, &claims, None)
            .unwrap();
        let second = provisioner
            .get_or_create(Provider::Google, &claims, None)
            .unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(second.profile, first.profile);
        assert_eq!(second.wallet, WalletAttachment::NotAttempted);
    }

    #[test]
    fn apple_without_payload_falls_back_to_email_local_part() {
        let (provisioner, _, _) = provisioner();
        let claims = claims("c@y.com", false, "", "");

        let account = provisioner
            .get_or_create(Provider::Apple, &claims, None)
            .unwrap();

        assert!(account.created);
        assert_eq!(account.profile.surname, "");
        assert_eq!(account.profile.other_names, "c");
        assert!(!account.profile.email_verified);
    }

    #[test]
    fn apple_first_sign_in_payload_supplies_names() {
        let (provisioner, _, _) = provisioner();
        let claims = claims("c@y.com", true, "", "");
        let payload = AppleSignupPayload {
            name: Some(AppleName {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
            }),
        };

        let account = provisioner
            .get_or_create(Provider::Apple, &claims, Some(&payload))
            .unwrap();

        assert_eq!(account.profile.surname, "Lovelace");
        assert_eq!(account.profile.other_names, "Ada");
    }

    #[test]
    fn google_names_ignore_apple_payload() {
        let (provisioner, _, _) = provisioner();
        let claims = claims("a@x.com", true, "A", "B");
        let payload = AppleSignupPayload {
            name: Some(AppleName {
                first_name: "X".to_string(),
                last_name: "Y".to_string(),
            }),
        };

        let account = provisioner
            .get_or_create(Provider::Google, &claims, Some(&payload))
            .unwrap();

        assert_eq!(account.profile.surname, "B");
        assert_eq!(account.profile.other_names, "A");
    }

    #[test]
    fn missing_email_creates_nothing() {
        let (provisioner, profiles, _) = provisioner();
        let claims = claims("", true, "A", "B");

        let err = provisioner
            .get_or_create(Provider::Google, &claims, None)
            .unwrap_err();

        assert!(matches!(err, ProvisionError::MissingEmail));
        assert!(profiles.is_empty());
    }

    #[test]
    fn wallet_failure_still_provisions_profile() {
        let profiles = Arc::new(InMemoryProfileStore::new());
        let provisioner =
            AccountProvisioner::new(profiles.clone(), Arc::new(FailingWalletStore));
        let claims = claims("a@x.com", true, "A", "B");

        let account = provisioner
            .get_or_create(Provider::Google, &claims, None)
            .unwrap();

        assert!(account.created);
        assert_eq!(account.wallet, WalletAttachment::Pending);
        // The profile persisted despite the wallet failure.
        assert!(profiles.find_by_email("a@x.com").unwrap().is_some());
    }

    #[test]
    fn duplicate_wallet_counts_as_attached() {
        let profiles = Arc::new(InMemoryProfileStore::new());
        let provisioner =
            AccountProvisioner::new(profiles, Arc::new(DuplicateWalletStore));
        let claims = claims("a@x.com", true, "A", "B");

        let account = provisioner
            .get_or_create(Provider::Google, &claims, None)
            .unwrap();

        assert!(account.created);
        assert_eq!(account.wallet, WalletAttachment::Attached);
    }

    #[test]
    fn verification_flag_is_monotonic() {
        let (provisioner, profiles, _) = provisioner();

        // Created unverified.
        let unverified = claims("a@x.com", false, "A", "B");
        let first = provisioner
            .get_or_create(Provider::Google, &unverified, None)
            .unwrap();
        assert!(!first.profile.email_verified);

        // A verified sign-in flips the flag and persists it.
        let verified = claims("a@x.com", true, "A", "B");
        let second = provisioner
            .get_or_create(Provider::Google, &verified, None)
            .unwrap();
        assert!(!second.created);
        assert!(second.profile.email_verified);
        assert!(profiles.find_by_email("a@x.com").unwrap().unwrap().email_verified);

        // A later unverified sign-in never resets it.
        let third = provisioner
            .get_or_create(Provider::Google, &unverified, None)
            .unwrap();
        assert!(!third.created);
        assert!(third.profile.email_verified);
    }

    #[test]
    fn lost_creation_race_returns_concurrent_profile() {
        let store = Arc::new(RacingProfileStore::seeded_with("a@x.com"));
        let provisioner =
            AccountProvisioner::new(store, Arc::new(InMemoryWalletStore::new()));
        let claims = claims("a@x.com", true, "A", "B");

        let account = provisioner
            .get_or_create(Provider::Google, &claims, None)
            .unwrap();

        // The winner's profile comes back as an existing account, with
        // the monotonic verification update applied.
        assert!(!account.created);
        assert_eq!(account.profile.surname, "Winner");
        assert!(account.profile.email_verified);
        assert_eq!(account.wallet, WalletAttachment::NotAttempted);
    }

    #[test]
    fn email_is_trimmed_before_lookup() {
        let (provisioner, profiles, _) = provisioner();
        let padded = claims("  a@x.com  ", true, "A", "B");

        let account = provisioner
            .get_or_create(Provider::Google, &padded, None)
            .unwrap();

        assert_eq!(account.profile.email, "a@x.com");
        assert!(profiles.find_by_email("a@x.com").unwrap().is_some());
    }
}
