// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the fintrack-auth project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Rotation Engine
//!
//! One-time-use refresh rotation. A presented refresh token buys exactly one
//! new access/refresh pair; the moment it is spent it can never be spent
//! again, including by a concurrent request racing the same token.
//!
//! ## Rejection ladder
//!
//! A presented token is checked in a fixed order: well-formedness,
//! signature, expiry, purpose, subject binding, ledger record existence,
//! revocation state, and finally the stored digest. Every failure is logged
//! with its specific reason and then collapsed into the single
//! [`AuthError::AccessDenied`] value, so a caller probing the endpoint
//! cannot map which check it tripped.
//!
//! ## Commit point
//!
//! The conditional [`TokenLedger::revoke`] is the transaction boundary.
//! Only the request whose revoke call reports the flag flip may mint the
//! replacement pair; every other interleaving ends with the session denied.
//! If minting or persisting fails *after* the flip, the old record stays
//! revoked and no new one exists: the session ends, but two live sessions
//! can never result.

use log::{debug, warn};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use super::claims::{Claims, TokenPurpose};
use super::codec::{TokenCodec, TokenError};
use super::digest::DigestStore;
use super::ledger::{RefreshTokenRecord, TokenLedger};
use crate::error::AuthError;

/// One freshly issued access/refresh pair.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// Short-lived bearer token for API requests.
    pub access_token: String,
    /// Long-lived token to exchange for the next pair.
    pub refresh_token: String,
}

/// Why a presented refresh token was turned away. Logged, never returned.
#[derive(Debug)]
enum RejectionReason {
    Malformed,
    SignatureInvalid,
    Expired,
    WrongPurpose,
    SubjectMismatch,
    RecordNotFound,
    RecordRevoked,
    SecretMismatch,
    LostRace,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            RejectionReason::Malformed => "malformed token",
            RejectionReason::SignatureInvalid => "invalid signature",
            RejectionReason::Expired => "expired token",
            RejectionReason::WrongPurpose => "wrong token purpose",
            RejectionReason::SubjectMismatch => "subject does not match the requesting user",
            RejectionReason::RecordNotFound => "no ledger record for token id",
            RejectionReason::RecordRevoked => "record already revoked",
            RejectionReason::SecretMismatch => "token does not match the recorded digest",
            RejectionReason::LostRace => "concurrent rotation won by another request",
        };
        write!(f, "{}", reason)
    }
}

impl From<TokenError> for RejectionReason {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Malformed => RejectionReason::Malformed,
            TokenError::InvalidSignature => RejectionReason::SignatureInvalid,
            TokenError::Expired => RejectionReason::Expired,
            TokenError::WrongPurpose => RejectionReason::WrongPurpose,
            // verify never yields Signing; treat it as a shape failure
            TokenError::Signing { .. } => RejectionReason::Malformed,
        }
    }
}

/// Outcome of the read-only half of rotation.
enum Inspection {
    Valid {
        claims: Claims,
        record: RefreshTokenRecord,
    },
    Rejected(RejectionReason),
}

/// Issues token pairs and rotates refresh tokens.
///
/// The engine owns pair issuance for the whole crate: the gateway calls
/// [`RotationEngine::issue_pair`] for the first pair at registration and
/// login, and [`RotationEngine::rotate`] mints every replacement pair
/// through the same path.
pub struct RotationEngine {
    codec: Arc<TokenCodec>,
    ledger: Arc<dyn TokenLedger>,
    digest: Arc<dyn DigestStore>,
}

impl RotationEngine {
    pub fn new(
        codec: Arc<TokenCodec>,
        ledger: Arc<dyn TokenLedger>,
        digest: Arc<dyn DigestStore>,
    ) -> Self {
        Self {
            codec,
            ledger,
            digest,
        }
    }

    /// Mint a fresh access/refresh pair for `user_id` and persist the
    /// refresh side in the ledger.
    ///
    /// The refresh token and its ledger record share a freshly generated
    /// UUID (the token's `jti` claim, the record's id), and the record's
    /// `expires_at` equals the token's `exp` claim.
    ///
    /// # Errors
    ///
    /// * [`AuthError::TokenIssuing`] - signing failed
    /// * [`AuthError::Digest`] - the token digest could not be produced
    /// * [`AuthError::DuplicateId`] - the generated id collided (fatal)
    pub async fn issue_pair(&self, user_id: &str, email: &str) -> Result<TokenPair, AuthError> {
        let token_id = Uuid::new_v4().to_string();

        let access_token = self
            .codec
            .mint_access_token(user_id, email)
            .map_err(|err| AuthError::TokenIssuing {
                reason: err.to_string(),
            })?;
        let minted = self
            .codec
            .mint_refresh_token(user_id, email, &token_id)
            .map_err(|err| AuthError::TokenIssuing {
                reason: err.to_string(),
            })?;

        let hashed_secret = self.digest.hash(&minted.token)?;
        let record =
            RefreshTokenRecord::new(token_id.clone(), user_id, hashed_secret, minted.expires_at);
        self.ledger.record(record).await?;

        debug!("issued refresh token {} for user {}", token_id, user_id);
        Ok(TokenPair {
            access_token,
            refresh_token: minted.token,
        })
    }

    /// Exchange a refresh token for a new pair, spending it.
    ///
    /// `user_id` is the caller the transport layer believes it is talking
    /// to; a token whose subject differs is rejected no matter how valid it
    /// is otherwise.
    ///
    /// Every rejection surfaces as [`AuthError::AccessDenied`] with no
    /// detail. Infrastructure failures (ledger I/O, digest backend)
    /// propagate unchanged.
    pub async fn rotate(
        &self,
        user_id: &str,
        presented_token: &str,
    ) -> Result<TokenPair, AuthError> {
        let (claims, record) = match self.inspect(user_id, presented_token).await? {
            Inspection::Valid { claims, record } => (claims, record),
            Inspection::Rejected(reason) => return Self::deny(user_id, reason),
        };

        // Commit point. Only the call that flips the flag may mint.
        match self.ledger.revoke(&record.id).await {
            Ok(true) => {}
            Ok(false) => return Self::deny(user_id, RejectionReason::LostRace),
            Err(AuthError::NotFound { .. }) => {
                return Self::deny(user_id, RejectionReason::LostRace)
            }
            Err(other) => return Err(other),
        }

        debug!("refresh token {} spent by user {}", record.id, user_id);
        self.issue_pair(user_id, &claims.email).await
    }

    /// The read-only checks of the rejection ladder, in order.
    async fn inspect(
        &self,
        user_id: &str,
        presented_token: &str,
    ) -> Result<Inspection, AuthError> {
        let claims = match self.codec.verify(presented_token, TokenPurpose::Refresh) {
            Ok(claims) => claims,
            Err(err) => return Ok(Inspection::Rejected(RejectionReason::from(err))),
        };

        if claims.sub != user_id {
            return Ok(Inspection::Rejected(RejectionReason::SubjectMismatch));
        }

        let token_id = match claims.jti.as_deref() {
            Some(token_id) => token_id,
            None => return Ok(Inspection::Rejected(RejectionReason::Malformed)),
        };

        let record = match self.ledger.find(token_id).await? {
            Some(record) => record,
            None => return Ok(Inspection::Rejected(RejectionReason::RecordNotFound)),
        };

        if record.revoked {
            return Ok(Inspection::Rejected(RejectionReason::RecordRevoked));
        }

        if !self.digest.verify(presented_token, &record.hashed_secret) {
            return Ok(Inspection::Rejected(RejectionReason::SecretMismatch));
        }

        Ok(Inspection::Valid { claims, record })
    }

    fn deny(user_id: &str, reason: RejectionReason) -> Result<TokenPair, AuthError> {
        warn!("refresh rotation denied for user {}: {}", user_id, reason);
        Err(AuthError::AccessDenied)
    }
}
