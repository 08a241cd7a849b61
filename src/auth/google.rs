// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Google ID token verification.
//!
//! ## Verification Flow
//!
//! 1. Decode the token header to get the key id (`kid`)
//! 2. Resolve the signing key from Google's JWKS endpoint
//! 3. Verify signature, expiry, and audience (RS256, 60s leeway)
//! 4. Re-check the issuer against the allowed set
//! 5. Extract and normalize claims

use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use tracing::{error, info};

use super::claims::{GoogleIdClaims, IdentityClaims};
use super::error::AuthError;
use super::jwks::JwksResolver;
use crate::config::SocialAuthConfig;

/// Issuers Google is allowed to use in ID tokens.
const ALLOWED_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Verifier for Google OIDC ID tokens.
#[derive(Clone)]
pub struct GoogleVerifier {
    /// Expected token audience (OAuth2 client id)
    client_id: String,
    /// Resolver for Google's signing keys
    resolver: JwksResolver,
}

impl GoogleVerifier {
    /// Create a verifier from the provider configuration.
    pub fn new(config: &SocialAuthConfig) -> Self {
        Self {
            client_id: config.google_client_id.clone(),
            resolver: JwksResolver::new(&config.google_jwks_url),
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

    /// Verify a Google ID token and extract its claims.
    ///
    /// Every failure becomes a typed error; this function never panics
    /// and never lets an unverified token through.
    pub async fn verify(&self, token: &str) -> Result<IdentityClaims, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;
        let kid = header.kid.ok_or(AuthError::MalformedToken)?;

        let decoding_key = self.resolver.get_decoding_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.set_audience(&[self.client_id.as_str()]);
        validation.set_issuer(&ALLOWED_ISSUERS);

        let token_data =
            decode::<GoogleIdClaims>(token, &decoding_key, &validation).map_err(|e| {
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

        let raw = token_data.claims;

        // The validation above already constrains iss; check it again so
        // an issuer outside the allowed set can never surface as success.
        if !issuer_allowed(&raw.iss) {
            error!(issuer = %raw.iss, "Invalid issuer in Google ID token");
            return Err(AuthError::InvalidIssuer);
        }

        let claims = IdentityClaims::from_google(raw);
        info!(email = %claims.email, "Successfully verified Google ID token");
        Ok(claims)
    }
}

fn issuer_allowed(issuer: &str) -> bool {
    ALLOWED_ISSUERS.contains(&issuer)
}
