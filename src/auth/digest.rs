// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the fintrack-auth project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Digest Store
//!
//! One-way digests for secrets at rest. Two kinds of secret pass through
//! here: user passwords, and the full signed refresh tokens whose digests
//! the ledger stores so a leaked ledger cannot be replayed as live tokens.
//!
//! The crate treats the hash construction as a black box behind the
//! [`DigestStore`] trait. The shipped implementation uses the crypt(3)
//! SHA-512 scheme (`$6$` hashes) from the `pwhash` crate: salted, slow by
//! construction, and without the input length cap that would truncate a
//! signed token.

#[cfg(test)]
use mockall::automock;

use crate::error::AuthError;

/// Salted one-way hashing of secrets.
///
/// `hash` must produce a self-describing digest string (scheme and salt
/// included) that `verify` alone can check later. Two calls to `hash` with
/// the same input produce different digests.
#[cfg_attr(test, automock)]
pub trait DigestStore: Send + Sync {
    /// Digest a secret for storage.
    fn hash(&self, secret: &str) -> Result<String, AuthError>;

    /// Check a candidate secret against a stored digest.
    fn verify(&self, secret: &str, digest: &str) -> bool;
}

/// [`DigestStore`] backed by crypt(3) SHA-512 (`$6$`) hashes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShaCryptDigest;

impl ShaCryptDigest {
    pub fn new() -> Self {
        Self
    }
}

impl DigestStore for ShaCryptDigest {
    fn hash(&self, secret: &str) -> Result<String, AuthError> {
        pwhash::sha512_crypt::hash(secret).map_err(|err| AuthError::Digest {
            reason: err.to_string(),
        })
    }

    fn verify(&self, secret: &str, digest: &str) -> bool {
        pwhash::unix::verify(secret, digest)
    }
}
