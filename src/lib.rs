// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the fintrack-auth project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! FinTrack credential lifecycle library
//!
//! This library issues, persists, rotates, and revokes the paired
//! access/refresh credentials of the FinTrack personal finance tracker.
//! It is transport-agnostic: the HTTP layer lives elsewhere and talks to
//! the [`auth::CredentialGateway`] with plain values.

pub mod auth;
pub mod config;
pub mod error;
pub mod users;
