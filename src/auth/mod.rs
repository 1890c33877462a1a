// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the fintrack-auth project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Credential Lifecycle
//!
//! Issuance, rotation, and revocation of paired access/refresh credentials.
//!
//! ## Key Components
//!
//! - [`TokenCodec`]: stateless minting and verification of signed tokens,
//!   one secret per purpose
//! - [`TokenLedger`]: durable records of issued refresh tokens, with the
//!   conditional revoke that makes rotation one-time-use
//! - [`DigestStore`]: salted slow hashing for passwords and stored tokens
//! - [`RotationEngine`]: the rotation protocol and its rejection ladder
//! - [`CredentialGateway`]: the register/login/logout/rotate surface that
//!   transports call
//! - [`RefreshCookie`]: `Set-Cookie` rendering for the refresh transport
//!   convention
//!
//! ## Trust Model
//!
//! Access tokens are pure bearer credentials; nothing about them is stored
//! and they die only by expiry. Refresh tokens are accountable: each one is
//! mirrored by a ledger record and is spent the moment it rotates. Stolen
//! refresh tokens therefore stop working as soon as their legitimate owner
//! rotates or logs out, and a leaked ledger alone reveals only one-way
//! digests.

pub mod claims;
pub mod codec;
pub mod cookie;
pub mod digest;
pub mod gateway;
pub mod ledger;
pub mod rotation;

pub use claims::{Claims, TokenPurpose};
pub use codec::{MintedRefresh, TokenCodec, TokenError};
pub use cookie::RefreshCookie;
pub use digest::{DigestStore, ShaCryptDigest};
pub use gateway::{AuthenticatedSession, CredentialGateway};
pub use ledger::{InMemoryLedger, RefreshTokenRecord, TokenLedger};
pub use rotation::{RotationEngine, TokenPair};
