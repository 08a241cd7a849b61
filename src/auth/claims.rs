// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Normalized identity claims and raw provider claim structs.

use serde::{Deserialize, Serialize};

/// Verified claims extracted from a provider identity token.
///
/// Instances are immutable and constructed only by a successful
/// verification; the constructors are crate-private so callers cannot
/// fabricate claims.
///
/// Name fields are Google-only: Apple delivers names out-of-band on the
/// first sign-in (see [`crate::models::AppleSignupPayload`]), never in
/// the token.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IdentityClaims {
    /// Provider-unique user id (`sub`)
    pub subject: String,
    /// Email address
    pub email: String,
    /// Whether the provider has verified the email
    pub email_verified: bool,
    /// Given name (Google only, empty otherwise)
    pub given_name: String,
    /// Family name (Google only, empty otherwise)
    pub family_name: String,
    /// Profile picture URL (Google only, empty otherwise)
    pub picture: String,
    /// Token issuer (`iss`)
    pub issuer: String,
    /// Token audience (`aud`)
    pub audience: String,
    /// Expiry as a Unix timestamp (`exp`)
    pub expires_at: i64,
}

/// Raw claims decoded from a Google ID token.
#[derive(Debug, Deserialize)]
pub(crate) struct GoogleIdClaims {
    /// Google's unique user id
    pub sub: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub family_name: String,
    #[serde(default)]
    pub picture: String,
    #[serde(default)]
    pub iss: String,
    #[serde(default)]
    pub aud: String,
    #[serde(default)]
    pub exp: i64,
}

/// Raw claims decoded from an Apple identity token.
#[derive(Debug, Deserialize)]
pub(crate) struct AppleIdClaims {
    /// Apple's unique user id
    pub sub: String,
    #[serde(default)]
    pub email: String,
    /// Apple serializes this as a bool or as "true"/"false".
    #[serde(default, deserialize_with = "bool_or_string")]
    pub email_verified: bool,
    #[serde(default)]
    pub iss: String,
    #[serde(default)]
    pub aud: String,
    #[serde(default)]
    pub exp: i64,
}

impl IdentityClaims {
    pub(crate) fn from_google(claims: GoogleIdClaims) -> Self {
        Self {
            subject: claims.sub,
            email: claims.email,
            email_verified: claims.email_verified,
            given_name: claims.given_name,
            family_name: claims.family_name,
            picture: claims.picture,
            issuer: claims.iss,
            audience: claims.aud,
            expires_at: claims.exp,
        }
    }

    pub(crate) fn from_apple(claims: AppleIdClaims) -> Self {
        Self {
            subject: claims.sub,
            email: claims.email,
            email_verified: claims.email_verified,
            given_name: String::new(),
            family_name: String::new(),
            picture: String::new(),
            issuer: claims.iss,
            audience: claims.aud,
            expires_at: claims.exp,
        }
    }
}

fn bool_or_string<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        Str(String),
    }

    match BoolOrString::deserialize(deserializer)? {
        BoolOrString::Bool(b) => Ok(b),
        BoolOrString::Str(s) => Ok(s == "true"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn google_claims_default_optional_fields() {
        let raw: GoogleIdClaims = serde_json::from_str(
            r#"{"sub":"g-123","email":"a@x.com","aud":"client","iss":"accounts.google.com","exp":1700000000}"#,
        )
        .unwrap();

        let claims = IdentityClaims::from_google(raw);
        assert_eq!(claims.subject, "g-123");
        assert_eq!(claims.email, "a@x.com");
        assert!(!claims.email_verified);
        assert_eq!(claims.given_name, "");
        assert_eq!(claims.family_name, "");
        assert_eq!(claims.picture, "");
    }

    #[test]
    fn google_claims_carry_names_and_picture() {
        let raw: GoogleIdClaims = serde_json::from_str(
            r#"{"sub":"g-123","email":"a@x.com","email_verified":true,
                "given_name":"A","family_name":"B","picture":"https://p.example/x.png",
                "aud":"client","iss":"https://accounts.google.com","exp":1700000000}"#,
        )
        .unwrap();

        let claims = IdentityClaims::from_google(raw);
        assert!(claims.email_verified);
        assert_eq!(claims.given_name, "A");
        assert_eq!(claims.family_name, "B");
        assert_eq!(claims.picture, "https://p.example/x.png");
    }

    #[test]
    fn apple_email_verified_parses_bool_form() {
        let raw: AppleIdClaims = serde_json::from_str(
            r#"{"sub":"apple-1","email":"c@y.com","email_verified":true,
                "iss":"https://appleid.apple.com","aud":"svc","exp":1700000000}"#,
        )
        .unwrap();
        assert!(raw.email_verified);
    }

    #[test]
    fn apple_email_verified_parses_string_form() {
        let raw: AppleIdClaims = serde_json::from_str(
            r#"{"sub":"apple-1","email":"c@y.com","email_verified":"true",
                "iss":"https://appleid.apple.com","aud":"svc","exp":1700000000}"#,
        )
        .unwrap();
        assert!(raw.email_verified);

        let raw: AppleIdClaims = serde_json::from_str(
            r#"{"sub":"apple-1","email_verified":"false","exp":1700000000}"#,
        )
        .unwrap();
        assert!(!raw.email_verified);
    }

    #[test]
    fn apple_claims_never_carry_names() {
        let raw: AppleIdClaims = serde_json::from_str(
            r#"{"sub":"apple-1","email":"c@y.com","exp":1700000000}"#,
        )
        .unwrap();

        let claims = IdentityClaims::from_apple(raw);
        assert_eq!(claims.given_name, "");
        assert_eq!(claims.family_name, "");
        assert_eq!(claims.picture, "");
    }
}
