// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the fintrack-auth project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # User Store
//!
//! Account records and the storage seam the gateway consumes. The finance
//! tracker keeps users in its own database; this crate only defines the
//! operations it needs (create, find by email, find by id) and ships
//! [`InMemoryUserStore`] as the reference implementation.
//!
//! A [`User`] carries its password digest and is never handed to callers;
//! gateway responses expose the sanitized [`UserProfile`] instead.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::error::AuthError;

/// One account, as stored.
#[derive(Debug, Clone)]
pub struct User {
    /// Opaque account id (UUID v4 string).
    pub id: String,
    /// Unique login email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Salted one-way digest of the password. Never serialized.
    pub password_hash: String,
    /// Account creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// The caller-facing view of this account, without the password digest.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
        }
    }
}

/// Sanitized account view returned by the gateway.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Input for [`UserStore::create`]. The id and timestamp are assigned by
/// the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

/// Storage seam for account records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a new account.
    ///
    /// # Errors
    ///
    /// [`AuthError::AlreadyExists`] if the email is taken.
    async fn create(&self, new_user: NewUser) -> Result<User, AuthError>;

    /// Look up an account by its login email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;

    /// Look up an account by id.
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AuthError>;
}

type UserMap = HashMap<String, User>;

/// [`UserStore`] held entirely in process memory, keyed by user id.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<UserMap>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_guard(&self) -> Result<RwLockReadGuard<'_, UserMap>, AuthError> {
        self.users.read().map_err(|_| AuthError::Storage {
            reason: "user store lock poisoned".to_string(),
        })
    }

    fn write_guard(&self) -> Result<RwLockWriteGuard<'_, UserMap>, AuthError> {
        self.users.write().map_err(|_| AuthError::Storage {
            reason: "user store lock poisoned".to_string(),
        })
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User, AuthError> {
        let mut users = self.write_guard()?;
        // Uniqueness is enforced at insert, like a database unique index
        if users.values().any(|user| user.email == new_user.email) {
            return Err(AuthError::AlreadyExists);
        }
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: new_user.email,
            name: new_user.name,
            password_hash: new_user.password_hash,
            created_at: Utc::now(),
        };
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let users = self.read_guard()?;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AuthError> {
        let users = self.read_guard()?;
        Ok(users.get(id).cloned())
    }
}
