// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the fintrack-auth project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! JWT claim structures for authentication tokens
//!
//! This module defines the claim set carried by the signed tokens this
//! crate mints, for both the short-lived access tokens and the long-lived
//! refresh tokens.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two token families this crate mints.
///
/// Each purpose is signed with its own secret, and the purpose is also
/// embedded as a claim, so a token issued for one purpose can never be
/// accepted for the other even if an operator misconfigures both secrets
/// to the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenPurpose {
    /// Short-lived bearer credential presented on API requests.
    Access,
    /// Long-lived credential exchanged for a new pair via rotation.
    Refresh,
}

impl fmt::Display for TokenPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenPurpose::Access => write!(f, "access"),
            TokenPurpose::Refresh => write!(f, "refresh"),
        }
    }
}

/// Claim set carried by every token minted by this crate.
///
/// Follows the standard JWT claims of RFC 7519 where applicable, plus the
/// custom `email` and `purpose` fields. Refresh tokens additionally carry
/// `jti`, the identifier of their ledger record, which gives rotation an
/// O(1) lookup without scanning per-user records.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject: the authenticated user's id.
    pub sub: String,

    /// Email of the subject at issuance time.
    pub email: String,

    /// Which family this token belongs to.
    pub purpose: TokenPurpose,

    /// Ledger record id. Present on refresh tokens, absent on access tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// Issued at, as Unix time (seconds since 1970-01-01T00:00:00Z UTC).
    pub iat: i64,

    /// Expiration, as Unix time. Tokens are rejected once this passes,
    /// with no leeway.
    pub exp: i64,

    /// Issuer, from the `security.issuer` configuration value.
    pub iss: String,
}
