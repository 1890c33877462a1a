// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the fintrack-auth project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Credential Gateway
//!
//! The transport-agnostic surface of the credential lifecycle core. An HTTP
//! layer (or a test) calls these operations with already-validated plain
//! values; everything token- and digest-shaped happens behind this facade.
//!
//! ## Operations
//!
//! | Operation      | Success                      | Failure                                  |
//! |----------------|------------------------------|------------------------------------------|
//! | `register`     | profile + first token pair   | `AlreadyExists`                          |
//! | `login`        | profile + fresh token pair   | `InvalidCredentials` (both failure legs) |
//! | `rotate`       | replacement token pair       | `AccessDenied`                           |
//! | `logout`       | all sessions revoked         | (storage errors only)                    |
//! | `authenticate` | verified access claims       | `AccessDenied`                           |
//! | `current_user` | profile for a bearer token   | `AccessDenied`, `NotFound`               |
//!
//! ## Usage
//!
//! ```no_run
//! use fintrack_auth::auth::CredentialGateway;
//! use fintrack_auth::config::Config;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let gateway = CredentialGateway::with_memory_stores(&Config::default());
//!
//! let session = gateway
//!     .register("alice@example.com", "correct-horse-battery", "Alice")
//!     .await?;
//! let rotated = gateway
//!     .rotate(&session.user.id, &session.tokens.refresh_token)
//!     .await?;
//! println!("new access token: {}", rotated.access_token);
//! # Ok(())
//! # }
//! ```

use log::{debug, info};
use serde::Serialize;
use std::sync::Arc;

use super::claims::{Claims, TokenPurpose};
use super::codec::TokenCodec;
use super::digest::{DigestStore, ShaCryptDigest};
use super::ledger::{InMemoryLedger, TokenLedger};
use super::rotation::{RotationEngine, TokenPair};
use crate::config::Config;
use crate::error::AuthError;
use crate::users::{InMemoryUserStore, NewUser, UserProfile, UserStore};

/// What a successful `register` or `login` hands back: the sanitized account
/// plus its first token pair.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedSession {
    /// The account, without its password digest.
    pub user: UserProfile,
    /// Access and refresh tokens, serialized inline as
    /// `accessToken`/`refreshToken`.
    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// Facade over the codec, ledger, digest store, and user store.
pub struct CredentialGateway {
    users: Arc<dyn UserStore>,
    digest: Arc<dyn DigestStore>,
    ledger: Arc<dyn TokenLedger>,
    codec: Arc<TokenCodec>,
    engine: RotationEngine,
}

impl CredentialGateway {
    /// Wire a gateway onto existing collaborators.
    pub fn new(
        config: &Config,
        users: Arc<dyn UserStore>,
        ledger: Arc<dyn TokenLedger>,
        digest: Arc<dyn DigestStore>,
    ) -> Self {
        let codec = Arc::new(TokenCodec::new(&config.security));
        let engine = RotationEngine::new(
            Arc::clone(&codec),
            Arc::clone(&ledger),
            Arc::clone(&digest),
        );
        Self {
            users,
            digest,
            ledger,
            codec,
            engine,
        }
    }

    /// A gateway over in-memory stores and the crypt(3) digest backend.
    /// Suited to tests and single-process development setups.
    pub fn with_memory_stores(config: &Config) -> Self {
        Self::new(
            config,
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemoryLedger::new()),
            Arc::new(ShaCryptDigest::new()),
        )
    }

    /// Create an account and issue its first token pair.
    ///
    /// # Errors
    ///
    /// [`AuthError::AlreadyExists`] if the email is taken.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthenticatedSession, AuthError> {
        if self.users.find_by_email(email).await?.is_some() {
            return Err(AuthError::AlreadyExists);
        }

        let password_hash = self.digest.hash(password)?;
        let user = self
            .users
            .create(NewUser {
                email: email.to_string(),
                name: name.to_string(),
                password_hash,
            })
            .await?;
        info!("registered user {}", user.id);

        let tokens = self.engine.issue_pair(&user.id, &user.email).await?;
        Ok(AuthenticatedSession {
            user: user.profile(),
            tokens,
        })
    }

    /// Verify a password and issue a fresh token pair.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidCredentials`] for an unknown email *and* for a
    /// wrong password; the two legs return the identical value so callers
    /// cannot probe which emails have accounts.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedSession, AuthError> {
        let user = match self.users.find_by_email(email).await? {
            Some(user) => user,
            None => {
                debug!("login rejected: unknown email");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !self.digest.verify(password, &user.password_hash) {
            debug!("login rejected: wrong password for user {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.engine.issue_pair(&user.id, &user.email).await?;
        info!("user {} logged in", user.id);
        Ok(AuthenticatedSession {
            user: user.profile(),
            tokens,
        })
    }

    /// Exchange a refresh token for a new pair, spending it.
    pub async fn rotate(
        &self,
        user_id: &str,
        presented_token: &str,
    ) -> Result<TokenPair, AuthError> {
        self.engine.rotate(user_id, presented_token).await
    }

    /// Revoke every live refresh token of `user_id`.
    ///
    /// Idempotent: logging out with no live sessions succeeds and revokes
    /// nothing.
    pub async fn logout(&self, user_id: &str) -> Result<(), AuthError> {
        let revoked = self.ledger.revoke_all_for_user(user_id).await?;
        info!("user {} logged out, {} refresh tokens revoked", user_id, revoked);
        Ok(())
    }

    /// Verify an access token and return its claims.
    ///
    /// This is the request-guard path: transports call it once per bearer
    /// request. Purely stateless, no ledger involved.
    ///
    /// # Errors
    ///
    /// [`AuthError::AccessDenied`] for anything but a live, well-formed
    /// access token.
    pub fn authenticate(&self, access_token: &str) -> Result<Claims, AuthError> {
        match self.codec.verify(access_token, TokenPurpose::Access) {
            Ok(claims) => Ok(claims),
            Err(err) => {
                debug!("access token rejected: {}", err);
                Err(AuthError::AccessDenied)
            }
        }
    }

    /// Resolve the account behind a bearer access token.
    ///
    /// # Errors
    ///
    /// * [`AuthError::AccessDenied`] - the token did not verify
    /// * [`AuthError::NotFound`] - the account no longer exists
    pub async fn current_user(&self, access_token: &str) -> Result<UserProfile, AuthError> {
        let claims = self.authenticate(access_token)?;
        let user = self
            .users
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(|| AuthError::not_found(format!("user {}", claims.sub)))?;
        Ok(user.profile())
    }
}
