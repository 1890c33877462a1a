// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the fintrack-auth project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Token Codec
//!
//! Stateless minting and verification of the signed tokens this crate
//! issues. The codec holds one HMAC key pair per [`TokenPurpose`], so access
//! and refresh tokens live in disjoint trust domains: a signature produced
//! with one secret never verifies under the other.
//!
//! The codec knows nothing about the ledger. Whether a structurally valid
//! refresh token is still *usable* is decided by the
//! [`RotationEngine`](crate::auth::RotationEngine).
//!
//! ## Usage
//!
//! ```
//! use fintrack_auth::auth::{TokenCodec, TokenPurpose};
//! use fintrack_auth::config::SecurityConfig;
//!
//! let codec = TokenCodec::new(&SecurityConfig::default());
//! let token = codec.mint_access_token("user-1", "alice@example.com").unwrap();
//! let claims = codec.verify(&token, TokenPurpose::Access).unwrap();
//! assert_eq!(claims.sub, "user-1");
//! ```

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use super::claims::{Claims, TokenPurpose};
use crate::config::SecurityConfig;

/// Token-level failures reported by [`TokenCodec::verify`].
///
/// These distinctions exist for internal logging only. Callers on the
/// gateway surface see them collapsed into
/// [`AuthError::AccessDenied`](crate::error::AuthError::AccessDenied).
#[derive(Error, Debug)]
pub enum TokenError {
    /// The string is not a well-formed signed token, or its claim set does
    /// not match the shape this crate mints.
    #[error("token is not well-formed")]
    Malformed,

    /// The signature does not verify under the secret for the requested
    /// purpose.
    #[error("token signature verification failed")]
    InvalidSignature,

    /// The `exp` claim lies in the past.
    #[error("token has expired")]
    Expired,

    /// The signature verified but the embedded purpose claim names the
    /// other token family.
    #[error("token purpose mismatch")]
    WrongPurpose,

    /// Signing failed while minting.
    #[error("token could not be signed: {reason}")]
    Signing { reason: String },
}

/// A freshly minted refresh token together with the expiry baked into it.
///
/// `expires_at` mirrors the `exp` claim exactly (second precision) so the
/// ledger record and the signed token can never disagree about when the
/// token dies.
#[derive(Debug, Clone)]
pub struct MintedRefresh {
    /// The full signed compact token.
    pub token: String,
    /// The moment the `exp` claim names.
    pub expires_at: DateTime<Utc>,
}

/// Key material and lifetime for one token purpose.
struct PurposeKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_seconds: u64,
}

impl PurposeKeys {
    fn from_secret(secret: &str, ttl_seconds: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds,
        }
    }
}

/// Stateless signer and verifier for access and refresh tokens.
///
/// Construct one per process from the loaded [`SecurityConfig`]; secrets are
/// immutable for the process lifetime.
pub struct TokenCodec {
    access: PurposeKeys,
    refresh: PurposeKeys,
    issuer: String,
}

impl TokenCodec {
    /// Build a codec from the security section of the configuration.
    pub fn new(security: &SecurityConfig) -> Self {
        Self {
            access: PurposeKeys::from_secret(
                &security.access_secret,
                security.access_ttl_seconds,
            ),
            refresh: PurposeKeys::from_secret(
                &security.refresh_secret,
                security.refresh_ttl_seconds,
            ),
            issuer: security.issuer.clone(),
        }
    }

    fn keys(&self, purpose: TokenPurpose) -> &PurposeKeys {
        match purpose {
            TokenPurpose::Access => &self.access,
            TokenPurpose::Refresh => &self.refresh,
        }
    }

    /// Mint a short-lived access token for `user_id`.
    ///
    /// Access tokens are pure bearer credentials: nothing about them is
    /// persisted and they stay valid until their expiry claim passes.
    pub fn mint_access_token(&self, user_id: &str, email: &str) -> Result<String, TokenError> {
        let (token, _) = self.mint(TokenPurpose::Access, user_id, email, None)?;
        Ok(token)
    }

    /// Mint a long-lived refresh token for `user_id`.
    ///
    /// `token_id` is the caller-generated ledger record id; it is embedded
    /// as the `jti` claim so rotation can find the record without a scan.
    ///
    /// # Returns
    ///
    /// The signed token plus the expiry instant of its `exp` claim, which
    /// the caller copies into the ledger record.
    pub fn mint_refresh_token(
        &self,
        user_id: &str,
        email: &str,
        token_id: &str,
    ) -> Result<MintedRefresh, TokenError> {
        let (token, expires_at) = self.mint(
            TokenPurpose::Refresh,
            user_id,
            email,
            Some(token_id.to_string()),
        )?;
        Ok(MintedRefresh { token, expires_at })
    }

    fn mint(
        &self,
        purpose: TokenPurpose,
        user_id: &str,
        email: &str,
        token_id: Option<String>,
    ) -> Result<(String, DateTime<Utc>), TokenError> {
        let keys = self.keys(purpose);
        let issued_at = Utc::now().timestamp();
        // Lifetimes outside i64 or the calendar range fail the mint
        let expires_ts = i64::try_from(keys.ttl_seconds)
            .ok()
            .and_then(|ttl| issued_at.checked_add(ttl))
            .ok_or_else(|| TokenError::Signing {
                reason: format!("token lifetime {} seconds out of range", keys.ttl_seconds),
            })?;
        let expires_at =
            DateTime::from_timestamp(expires_ts, 0).ok_or_else(|| TokenError::Signing {
                reason: format!("expiry timestamp {} out of range", expires_ts),
            })?;

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            purpose,
            jti: token_id,
            iat: issued_at,
            exp: expires_ts,
            iss: self.issuer.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .map_err(|err| TokenError::Signing {
                reason: err.to_string(),
            })?;
        Ok((token, expires_at))
    }

    /// Verify a token against the secret of `expected` and return its claims.
    ///
    /// The check covers, in order: token structure, signature, expiry (with
    /// zero leeway), issuer, and the embedded purpose claim. Refresh tokens
    /// must carry a `jti` claim to count as well-formed.
    ///
    /// # Errors
    ///
    /// * [`TokenError::Malformed`] - not a token this crate could have minted
    /// * [`TokenError::InvalidSignature`] - signature check failed
    /// * [`TokenError::Expired`] - the expiry claim has passed
    /// * [`TokenError::WrongPurpose`] - minted for the other token family
    pub fn verify(&self, token: &str, expected: TokenPurpose) -> Result<Claims, TokenError> {
        let keys = self.keys(expected);

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);

        let data = decode::<Claims>(token, &keys.decoding, &validation).map_err(|err| {
            match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            }
        })?;

        let claims = data.claims;
        if claims.purpose != expected {
            return Err(TokenError::WrongPurpose);
        }
        if expected == TokenPurpose::Refresh && claims.jti.is_none() {
            return Err(TokenError::Malformed);
        }
        Ok(claims)
    }
}
