// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the fintrack-auth project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Token Ledger
//!
//! The durable source of truth for which refresh tokens are still usable.
//! Every issued refresh token gets exactly one [`RefreshTokenRecord`], keyed
//! by the id that the token itself carries as its `jti` claim. A record is
//! mutated only one way: its `revoked` flag flips from `false` to `true`,
//! once.
//!
//! [`TokenLedger::revoke`] is deliberately a *conditional* update, reporting
//! whether the calling operation performed the flip. That report is the
//! linearization point of refresh rotation: when two requests race to rotate
//! the same token, exactly one sees `Ok(true)` and wins.
//!
//! [`InMemoryLedger`] is the reference implementation. A database-backed
//! ledger implements the same trait with
//! `UPDATE ... SET revoked = TRUE WHERE id = $1 AND revoked = FALSE`
//! and a rows-affected check.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::AuthError;

/// One issued refresh token, as the ledger sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
    /// Record id, equal to the `jti` claim of the signed token. The binding
    /// is established at mint time and never changes.
    pub id: String,

    /// The user the token was issued to.
    pub user_id: String,

    /// One-way digest of the full signed token. The ledger never stores the
    /// token itself.
    pub hashed_secret: String,

    /// When the token dies, mirroring its `exp` claim. Records past this
    /// instant may be garbage-collected whether or not they were revoked.
    pub expires_at: DateTime<Utc>,

    /// Set once, by rotation, logout, or an explicit revoke. A revoked
    /// record never rotates again.
    pub revoked: bool,

    /// Issuance timestamp.
    pub created_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    /// Build a live (non-revoked) record stamped with the current time.
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        hashed_secret: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            hashed_secret: hashed_secret.into(),
            expires_at,
            revoked: false,
            created_at: Utc::now(),
        }
    }

    /// Whether the token this record tracks is past its expiry.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Storage seam for refresh token records.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TokenLedger: Send + Sync {
    /// Persist a freshly issued record.
    ///
    /// # Errors
    ///
    /// [`AuthError::DuplicateId`] if a record with this id already exists.
    /// Ids are freshly generated UUIDs, so a collision is fatal and is
    /// never retried.
    async fn record(&self, record: RefreshTokenRecord) -> Result<(), AuthError>;

    /// Look up a record by id.
    async fn find(&self, id: &str) -> Result<Option<RefreshTokenRecord>, AuthError>;

    /// Conditionally revoke one record.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - this call flipped `revoked` from `false` to `true`
    /// * `Ok(false)` - the record was already revoked; idempotent, not an error
    ///
    /// # Errors
    ///
    /// [`AuthError::NotFound`] if no record has this id.
    async fn revoke(&self, id: &str) -> Result<bool, AuthError>;

    /// Revoke every live record belonging to `user_id`.
    ///
    /// # Returns
    ///
    /// How many records this call flipped. Zero is a valid outcome.
    async fn revoke_all_for_user(&self, user_id: &str) -> Result<u64, AuthError>;

    /// Drop records whose expiry has passed, revoked or not.
    ///
    /// # Returns
    ///
    /// How many records were removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AuthError>;
}

type RecordMap = HashMap<String, RefreshTokenRecord>;

/// [`TokenLedger`] held entirely in process memory.
///
/// All mutations run under a single write lock with no await inside the
/// critical section, so `revoke` is atomic: of any number of concurrent
/// calls for the same id, exactly one observes the `false` to `true`
/// transition.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    records: RwLock<RecordMap>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_guard(&self) -> Result<RwLockReadGuard<'_, RecordMap>, AuthError> {
        self.records.read().map_err(|_| AuthError::Storage {
            reason: "refresh token ledger lock poisoned".to_string(),
        })
    }

    fn write_guard(&self) -> Result<RwLockWriteGuard<'_, RecordMap>, AuthError> {
        self.records.write().map_err(|_| AuthError::Storage {
            reason: "refresh token ledger lock poisoned".to_string(),
        })
    }
}

#[async_trait]
impl TokenLedger for InMemoryLedger {
    async fn record(&self, record: RefreshTokenRecord) -> Result<(), AuthError> {
        let mut records = self.write_guard()?;
        if records.contains_key(&record.id) {
            return Err(AuthError::DuplicateId {
                id: record.id.clone(),
            });
        }
        records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn find(&self, id: &str) -> Result<Option<RefreshTokenRecord>, AuthError> {
        let records = self.read_guard()?;
        Ok(records.get(id).cloned())
    }

    async fn revoke(&self, id: &str) -> Result<bool, AuthError> {
        let mut records = self.write_guard()?;
        match records.get_mut(id) {
            None => Err(AuthError::not_found(format!("refresh token record {}", id))),
            Some(record) if record.revoked => Ok(false),
            Some(record) => {
                record.revoked = true;
                Ok(true)
            }
        }
    }

    async fn revoke_all_for_user(&self, user_id: &str) -> Result<u64, AuthError> {
        let mut records = self.write_guard()?;
        let mut flipped = 0;
        for record in records.values_mut() {
            if record.user_id == user_id && !record.revoked {
                record.revoked = true;
                flipped += 1;
            }
        }
        Ok(flipped)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AuthError> {
        let mut records = self.write_guard()?;
        let before = records.len();
        records.retain(|_, record| !record.is_expired(now));
        Ok((before - records.len()) as u64)
    }
}
