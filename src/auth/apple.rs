// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Apple identity token verification.
//!
//! ## Verification Flow
//!
//! 1. Parse the token header (no signature check) for the declared `kid`
//! 2. Resolve the matching key from Apple's JWKS endpoint; an unknown
//!    kid fails here, before any signature work
//! 3. Verify RS256 signature, expiry, audience, and issuer
//! 4. Extract and normalize claims
//!
//! Apple does not reliably return name fields in the token; they arrive
//! out-of-band on the first sign-in only and flow into provisioning as
//! [`crate::models::AppleSignupPayload`].

use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use tracing::info;

use super::claims::{AppleIdClaims, IdentityClaims};
use super::error::AuthError;
use super::jwks::JwksResolver;
use crate::config::SocialAuthConfig;

/// The only issuer Apple identity tokens may carry.
const APPLE_ISSUER: &str = "https://appleid.apple.com";

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Verifier for Apple identity tokens.
#[derive(Clone)]
pub struct AppleVerifier {
    /// Expected token audience (Apple service id)
    client_id: String,
    /// Resolver for Apple's signing keys
    resolver: JwksResolver,
}

impl AppleVerifier {
    /// Create a verifier from the provider configuration.
    pub fn new(config: &SocialAuthConfig) -> Self {
        Self {
            client_id: config.apple_client_id.clone(),
            resolver: JwksResolver::new(&config.apple_jwks_url),
        }
    }

    /// Create a verifier with an explicit resolver (shared cache or test
    /// endpoint).
    pub fn with_resolver(client_id: impl Into<String>, resolver: JwksResolver) -> Self {
        Self {
            client_id: client_id.into(),
            resolver,
        }
    }

    /// Verify an Apple identity token and extract its claims.
    pub async fn verify(&self, token: &str) -> Result<IdentityClaims, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;
        let kid = header.kid.ok_or(AuthError::MalformedToken)?;

        let decoding_key = self.resolver.get_decoding_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.set_audience(&[self.client_id.as_str()]);
        validation.set_issuer(&[APPLE_ISSUER]);

        let token_data =
            decode::<AppleIdClaims>(token, &decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AuthError::InvalidSignature
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
                    jsonwebtoken::errors::ErrorKind::InvalidAudience => AuthError::InvalidAudience,
                    jsonwebtoken::errors::ErrorKind::ImmatureSignature => {
                        AuthError::TokenNotYetValid
                    }
                    _ => AuthError::MalformedToken,
                }
            })?;

        let claims = IdentityClaims::from_apple(token_data.claims);
        info!(email = %claims.email, "Successfully verified Apple identity token");
        Ok(claims)
    }
}
