// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Social Token Verification
//!
//! This module verifies third-party identity tokens and produces
//! normalized [`IdentityClaims`] for account provisioning.
//!
//! ## Verification Flow
//!
//! 1. Client signs in with Google or Apple and sends the raw token
//! 2. The provider verifier:
//!    - Resolves the signing key from the provider's JWKS endpoint
//!    - Verifies signature, expiry, issuer, audience
//!    - Extracts `sub`, `email`, and profile claims
//! 3. Verified claims flow into [`crate::provision::AccountProvisioner`]
//!
//! The Google authorization-code flow ([`CodeExchanger`]) redeems a code
//! at Google's token endpoint first, then joins the same pipeline.
//!
//! ## Security
//!
//! - JWKS is fetched via HTTPS only and cached with a TTL
//! - Clock skew tolerance is 60 seconds
//! - Every failure is a typed error; verification never panics and
//!   unexpected failures surface with a generic message only

pub mod apple;
pub mod claims;
pub mod error;
pub mod exchange;
pub mod google;
pub mod jwks;

pub use apple::AppleVerifier;
pub use claims::IdentityClaims;
pub use error::AuthError;
pub use exchange::CodeExchanger;
pub use google::GoogleVerifier;
pub use jwks::JwksResolver;
