// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Provider Configuration
//!
//! Configuration for the social identity providers, loaded from the
//! environment at startup by the embedding service.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `GOOGLE_CLIENT_ID` | OAuth2 client id expected in Google token audiences | Required |
//! | `GOOGLE_CLIENT_SECRET` | Client secret for the authorization-code flow | Optional |
//! | `APPLE_CLIENT_ID` | Service id expected in Apple token audiences | Required |
//! | `GOOGLE_JWKS_URL` | Google signing key endpoint | `https://www.googleapis.com/oauth2/v3/certs` |
//! | `APPLE_JWKS_URL` | Apple signing key endpoint | `https://appleid.apple.com/auth/keys` |
//! | `GOOGLE_TOKEN_URL` | Google token exchange endpoint | `https://oauth2.googleapis.com/token` |
//!
//! The URL overrides exist for test doubles; production deployments leave
//! them unset.

use crate::auth::AuthError;

/// Google's published JWKS endpoint.
pub const DEFAULT_GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";

/// Apple's published JWKS endpoint.
pub const DEFAULT_APPLE_JWKS_URL: &str = "https://appleid.apple.com/auth/keys";

/// Google's OAuth2 token exchange endpoint.
pub const DEFAULT_GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Provider client identifiers and endpoints.
///
/// Read-only input to the verifiers and the code exchanger. The client
/// secret is optional: only the authorization-code flow needs it, and its
/// absence is reported there as a configuration error rather than here.
#[derive(Debug, Clone)]
pub struct SocialAuthConfig {
    /// OAuth2 client id that Google tokens must carry as audience
    pub google_client_id: String,
    /// Client secret for the Google authorization-code flow
    pub google_client_secret: Option<String>,
    /// Service id that Apple tokens must carry as audience
    pub apple_client_id: String,
    /// Google JWKS endpoint
    pub google_jwks_url: String,
    /// Apple JWKS endpoint
    pub apple_jwks_url: String,
    /// Google token exchange endpoint
    pub google_token_url: String,
}

impl SocialAuthConfig {
    /// Check whether the required provider ids are present in the
    /// environment, without constructing a config.
    pub fn is_configured() -> bool {
        required_env_present("GOOGLE_CLIENT_ID") && required_env_present("APPLE_CLIENT_ID")
    }

    /// Load configuration from the environment.
    ///
    /// Missing required variables are a fatal configuration error; the
    /// caller is expected to abort startup, not retry.
    pub fn from_env() -> Result<Self, AuthError> {
        let google_client_id = env_required("GOOGLE_CLIENT_ID")?;
        let google_client_secret = env_optional("GOOGLE_CLIENT_SECRET");
        let apple_client_id = env_required("APPLE_CLIENT_ID")?;
        let google_jwks_url = env_or_default("GOOGLE_JWKS_URL", DEFAULT_GOOGLE_JWKS_URL);
        let apple_jwks_url = env_or_default("APPLE_JWKS_URL", DEFAULT_APPLE_JWKS_URL);
        let google_token_url = env_or_default("GOOGLE_TOKEN_URL", DEFAULT_GOOGLE_TOKEN_URL);

        Ok(Self {
            google_client_id,
            google_client_secret,
            apple_client_id,
            google_jwks_url,
            apple_jwks_url,
            google_token_url,
        })
    }

    /// Construct a config directly (tests and embedding callers that do
    /// not use environment variables).
    pub fn new(
        google_client_id: impl Into<String>,
        google_client_secret: Option<String>,
        apple_client_id: impl Into<String>,
    ) -> Self {
        Self {
            google_client_id: google_client_id.into(),
            google_client_secret,
            apple_client_id: apple_client_id.into(),
            google_jwks_url: DEFAULT_GOOGLE_JWKS_URL.to_string(),
            apple_jwks_url: DEFAULT_APPLE_JWKS_URL.to_string(),
            google_token_url: DEFAULT_GOOGLE_TOKEN_URL.to_string(),
        }
    }
}

fn required_env_present(name: &str) -> bool {
    std::env::var(name).map(|v| !v.trim().is_empty()).unwrap_or(false)
}

fn env_required(name: &str) -> Result<String, AuthError> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AuthError::MissingConfig(name.to_string()))
}

fn env_optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    env_optional(name).unwrap_or_else(|| default.to_string())
}
