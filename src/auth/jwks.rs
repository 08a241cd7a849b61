// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching, caching, and key selection.
//!
//! ## Security
//!
//! - JWKS is fetched via HTTPS only
//! - Keys are cached with a configurable TTL
//! - An unknown key id against a fresh cache triggers exactly one
//!   refresh before failing (provider key rotation)
//!
//! ## Usage
//!
//! One resolver per provider endpoint: the Google verifier holds one for
//! Google's certs URL, the Apple verifier one for Apple's auth keys URL.

use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet};
use jsonwebtoken::DecodingKey;
use tokio::sync::RwLock;

use super::error::AuthError;

/// Default JWKS cache TTL (5 minutes).
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// JWKS cache entry.
struct CacheEntry {
    jwks: JwkSet,
    fetched_at: Instant,
}

/// JWKS resolver with caching.
///
/// Fetches a provider's published key set and selects the key matching a
/// token's declared key id. Reads share the cache; a refresh takes the
/// write lock, and concurrent refreshes are benign (last write wins).
#[derive(Clone)]
pub struct JwksResolver {
    /// Provider JWKS endpoint
    jwks_url: String,
    /// Cache TTL
    cache_ttl: Duration,
    /// Cached key set
    cache: Arc<RwLock<Option<CacheEntry>>>,
    /// HTTP client
    client: reqwest::Client,
}

impl JwksResolver {
    /// Create a new resolver for a provider's JWKS endpoint.
    pub fn new(jwks_url: impl Into<String>) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            cache_ttl: DEFAULT_CACHE_TTL,
            cache: Arc::new(RwLock::new(None)),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Create with custom cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Get the JWKS URL.
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Get a decoding key for the given key id.
    ///
    /// Serves from the cache when it is fresh. If the key id is absent
    /// from a cached set the resolver refreshes once and retries the
    /// lookup, so a provider key rotation inside the TTL window does not
    /// fail verification. An id still absent after refresh is
    /// `NoMatchingKey`; a failed fetch is terminal for this attempt.
    pub async fn get_decoding_key(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        if let Some(jwks) = self.cached_jwks().await {
            if let Some(jwk) = find_key(&jwks, kid) {
                return jwk_to_decoding_key(jwk);
            }
        }

        let jwks = self.refresh().await?;
        match find_key(&jwks, kid) {
            Some(jwk) => jwk_to_decoding_key(jwk),
            None => Err(AuthError::NoMatchingKey),
        }
    }

    /// Force refresh the cached key set, returning the fresh set.
    pub async fn refresh(&self) -> Result<JwkSet, AuthError> {
        let jwks = self.fetch_jwks().await?;

        let mut cache = self.cache.write().await;
        *cache = Some(CacheEntry {
            jwks: jwks.clone(),
            fetched_at: Instant::now(),
        });

        Ok(jwks)
    }

    /// Check if a key set is currently cached and fresh.
    pub async fn is_cached(&self) -> bool {
        let cache = self.cache.read().await;
        if let Some(entry) = &*cache {
            entry.fetched_at.elapsed() < self.cache_ttl
        } else {
            false
        }
    }

    /// Return the cached key set if it is still within the TTL.
    async fn cached_jwks(&self) -> Option<JwkSet> {
        let cache = self.cache.read().await;
        match &*cache {
            Some(entry) if entry.fetched_at.elapsed() < self.cache_ttl => {
                Some(entry.jwks.clone())
            }
            _ => None,
        }
    }

    /// Fetch the key set from the endpoint.
    async fn fetch_jwks(&self) -> Result<JwkSet, AuthError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::JwksFetchError(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        let jwks: JwkSet = response
            .json()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?;

        Ok(jwks)
    }
}

fn find_key<'a>(jwks: &'a JwkSet, kid: &str) -> Option<&'a Jwk> {
    jwks.keys
        .iter()
        .find(|k| k.common.key_id.as_deref() == Some(kid))
}

/// Convert a JWK to a DecodingKey.
///
/// Google and Apple both publish RSA keys; any other key type in the set
/// is unexpected.
fn jwk_to_decoding_key(jwk: &Jwk) -> Result<DecodingKey, AuthError> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => {
            DecodingKey::from_rsa_components(&rsa.n, &rsa.e).map_err(|e| {
                tracing::error!(error = %e, "Failed to build RSA key from JWK");
                AuthError::InternalError(format!("Failed to create RSA key: {e}"))
            })
        }
        _ => {
            tracing::error!(kid = ?jwk.common.key_id, "Unsupported key type in JWKS");
            Err(AuthError::InternalError(
                "Unsupported key type in JWKS".to_string(),
            ))
        }
    }
}
