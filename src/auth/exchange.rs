// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Google authorization-code exchange (server-side flow).
//!
//! Exchanges an OAuth2 authorization code for tokens at Google's token
//! endpoint, then verifies the returned ID token with the same
//! verification path used for directly-submitted tokens.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info};

use super::claims::IdentityClaims;
use super::error::AuthError;
use super::google::GoogleVerifier;
use crate::config::SocialAuthConfig;

/// Token endpoint success response. Only the ID token is consumed.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    id_token: Option<String>,
}

/// Token endpoint error body (RFC 6749 error response).
#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Exchanger for the Google authorization-code flow.
#[derive(Clone)]
pub struct CodeExchanger {
    client_id: String,
    client_secret: Option<String>,
    token_url: String,
    verifier: GoogleVerifier,
    http: Client,
}

impl CodeExchanger {
    /// Create an exchanger from the provider configuration.
    ///
    /// The verifier is passed in so the exchanger shares the caller's
    /// key cache instead of fetching Google's JWKS independently.
    pub fn new(config: &SocialAuthConfig, verifier: GoogleVerifier) -> Self {
        Self {
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            token_url: config.google_token_url.clone(),
            verifier,
            http: Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Exchange an authorization code for verified identity claims.
    ///
    /// Requires a configured client secret; its absence is a fatal
    /// configuration error reported before any network call.
    pub async fn exchange(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<IdentityClaims, AuthError> {
        let client_secret = self.client_secret.as_deref().ok_or_else(|| {
            error!("GOOGLE_CLIENT_SECRET is not configured");
            AuthError::MissingConfig("GOOGLE_CLIENT_SECRET".to_string())
        })?;

        let params = [
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", client_secret),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::TokenExchangeFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = exchange_error_detail(status.as_u16(), &body);
            error!(status = %status, detail = %detail, "Google token exchange failed");
            return Err(AuthError::TokenExchangeFailed(detail));
        }

        let tokens: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::TokenExchangeFailed(format!("invalid token response: {e}")))?;

        let id_token = tokens
            .id_token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingIdToken)?;

        match self.verifier.verify(&id_token).await {
            Ok(claims) => {
                info!(email = %claims.email, "Successfully exchanged authorization code");
                Ok(claims)
            }
            Err(inner) => {
                error!(error = %inner, "ID token received after exchange failed verification");
                Err(AuthError::ExchangeVerificationFailed(inner.to_string()))
            }
        }
    }
}

/// Extract the most useful error detail from a token endpoint rejection.
///
/// Prefers the provider's `error_description`, falls back to the bare
/// `error` code, then to the HTTP status.
fn exchange_error_detail(status: u16, body: &str) -> String {
    serde_json::from_str::<TokenErrorBody>(body)
        .ok()
        .and_then(|b| b.error_description.or(b.error))
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| format!("HTTP {status}"))
}
