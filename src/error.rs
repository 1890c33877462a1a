// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the fintrack-auth project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Error Taxonomy
//!
//! Domain errors surfaced by the credential lifecycle core. Transport layers
//! map these onto their own status codes (409 for [`AuthError::AlreadyExists`],
//! 401 for [`AuthError::InvalidCredentials`], 403 for
//! [`AuthError::AccessDenied`], and so on).
//!
//! The deliberate coarseness of [`AuthError::AccessDenied`] is part of the
//! design: every refresh rotation rejection collapses into this single
//! variant so a caller probing with stolen or replayed tokens learns nothing
//! about which check failed. The specific reason is logged server-side only.

use thiserror::Error;

/// Errors returned by the credential gateway and its collaborators.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Registration with an email that already has an account.
    #[error("Email already in use")]
    AlreadyExists,

    /// Login failed. Unknown email and wrong password produce this same
    /// value so the two cases cannot be told apart by a caller.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Refresh rotation or access token verification was rejected.
    /// Intentionally carries no detail.
    #[error("Access Denied")]
    AccessDenied,

    /// An entity lookup came up empty where one was required.
    #[error("{entity} not found")]
    NotFound { entity: String },

    /// A ledger insert collided with an existing record id. Record ids are
    /// freshly generated UUIDs, so this is fatal and never retried.
    #[error("duplicate ledger record id: {id}")]
    DuplicateId { id: String },

    /// The digest backend failed to produce a hash.
    #[error("digest operation failed: {reason}")]
    Digest { reason: String },

    /// A backing store failed. Propagated unchanged to the caller.
    #[error("storage operation failed: {reason}")]
    Storage { reason: String },

    /// Token signing failed while minting a new pair.
    #[error("token issuing failed: {reason}")]
    TokenIssuing { reason: String },
}

impl AuthError {
    /// Lookup-miss constructor used by stores and the gateway.
    pub fn not_found(entity: impl Into<String>) -> Self {
        AuthError::NotFound {
            entity: entity.into(),
        }
    }
}
