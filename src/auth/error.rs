// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Verification and configuration errors.

/// Error type for token verification and the code-exchange flow.
///
/// Every failure of a verification entry point becomes one of these
/// variants; no error escapes a verifier undifferentiated. The
/// `InternalError` message shown to callers is deliberately generic -
/// full detail is recorded in the logs at the failure site.
#[derive(Debug)]
pub enum AuthError {
    /// Required configuration is missing (named variable or field).
    /// Fatal: callers must not retry.
    MissingConfig(String),
    /// Token could not be parsed (header, structure, or encoding)
    MalformedToken,
    /// Token signature is invalid
    InvalidSignature,
    /// Token has expired
    TokenExpired,
    /// Token is not yet valid
    TokenNotYetValid,
    /// Token issuer is outside the provider's allowed set
    InvalidIssuer,
    /// Token audience does not match the configured client id
    InvalidAudience,
    /// JWKS fetch failed (network, HTTP status, or parse)
    JwksFetchError(String),
    /// No key in the provider's JWKS matches the token's key id
    NoMatchingKey,
    /// Authorization-code exchange was rejected by the provider
    TokenExchangeFailed(String),
    /// Token exchange succeeded but the response carried no ID token
    MissingIdToken,
    /// The ID token returned by a code exchange failed verification
    ExchangeVerificationFailed(String),
    /// Unexpected internal failure; generic message, detail in logs
    InternalError(String),
}

impl AuthError {
    /// Get the stable error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingConfig(_) => "missing_config",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::TokenNotYetValid => "token_not_yet_valid",
            AuthError::InvalidIssuer => "invalid_issuer",
            AuthError::InvalidAudience => "invalid_audience",
            AuthError::JwksFetchError(_) => "jwks_fetch_error",
            AuthError::NoMatchingKey => "no_matching_key",
            AuthError::TokenExchangeFailed(_) => "token_exchange_failed",
            AuthError::MissingIdToken => "missing_id_token",
            AuthError::ExchangeVerificationFailed(_) => "exchange_verification_failed",
            AuthError::InternalError(_) => "internal_error",
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingConfig(name) => write!(f, "Missing configuration: {name}"),
            AuthError::MalformedToken => write!(f, "Token is malformed"),
            AuthError::InvalidSignature => write!(f, "Token signature is invalid"),
            AuthError::TokenExpired => write!(f, "Token has expired"),
            AuthError::TokenNotYetValid => write!(f, "Token is not yet valid"),
            AuthError::InvalidIssuer => write!(f, "Token issuer is invalid"),
            AuthError::InvalidAudience => write!(f, "Token audience is invalid"),
            AuthError::JwksFetchError(msg) => write!(f, "Failed to fetch JWKS: {msg}"),
            AuthError::NoMatchingKey => write!(f, "No matching key found in JWKS"),
            AuthError::TokenExchangeFailed(msg) => {
                write!(f, "Failed to exchange authorization code: {msg}")
            }
            AuthError::MissingIdToken => {
                write!(f, "Token exchange succeeded but no ID token was returned")
            }
            AuthError::ExchangeVerificationFailed(msg) => {
                write!(f, "Authentication failed after exchange: {msg}")
            }
            // Generic on purpose; the failure site logs the detail.
            AuthError::InternalError(_) => write!(f, "Authentication failed unexpectedly"),
        }
    }
}

impl std::error::Error for AuthError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(AuthError::MissingConfig("X".into()).error_code(), "missing_config");
        assert_eq!(AuthError::MalformedToken.error_code(), "malformed_token");
        assert_eq!(AuthError::InvalidSignature.error_code(), "invalid_signature");
        assert_eq!(AuthError::TokenExpired.error_code(), "token_expired");
        assert_eq!(AuthError::TokenNotYetValid.error_code(), "token_not_yet_valid");
        assert_eq!(AuthError::InvalidIssuer.error_code(), "invalid_issuer");
        assert_eq!(AuthError::InvalidAudience.error_code(), "invalid_audience");
        assert_eq!(
            AuthError::JwksFetchError("timeout".into()).error_code(),
            "jwks_fetch_error"
        );
        assert_eq!(AuthError::NoMatchingKey.error_code(), "no_matching_key");
        assert_eq!(
            AuthError::TokenExchangeFailed("denied".into()).error_code(),
            "token_exchange_failed"
        );
        assert_eq!(AuthError::MissingIdToken.error_code(), "missing_id_token");
        assert_eq!(
            AuthError::ExchangeVerificationFailed("bad".into()).error_code(),
            "exchange_verification_failed"
        );
        assert_eq!(
            AuthError::InternalError("detail".into()).error_code(),
            "internal_error"
        );
    }

    #[test]
    fn internal_error_display_never_leaks_detail() {
        let err = AuthError::InternalError("rsa key parse failed: bad modulus".into());
        let shown = err.to_string();
        assert_eq!(shown, "Authentication failed unexpectedly");
        assert!(!shown.contains("modulus"));
    }

    #[test]
    fn exchange_failure_preserves_provider_detail() {
        let err = AuthError::TokenExchangeFailed("invalid_grant: code expired".into());
        assert!(err.to_string().contains("invalid_grant"));
    }
}
