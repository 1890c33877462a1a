// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the fintrack-auth project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Refresh Cookie
//!
//! The conventional transport for refresh tokens is an HttpOnly cookie
//! scoped to the refresh endpoint, so scripts never see the token and it
//! rides along only where rotation happens. This module renders the
//! `Set-Cookie` header values for that convention without pulling a web
//! framework into the crate.

use crate::config::Config;

/// Builds `Set-Cookie` header values for the refresh token.
///
/// The cookie's Max-Age equals the refresh token lifetime from the
/// configuration, so cookie and token die together.
///
/// # Examples
///
/// ```
/// use fintrack_auth::auth::RefreshCookie;
/// use fintrack_auth::config::Config;
///
/// let cookie = RefreshCookie::from_config(&Config::default());
/// let header = cookie.issue("token-value");
/// assert!(header.starts_with("refresh_token=token-value;"));
/// assert!(header.contains("HttpOnly"));
/// ```
#[derive(Debug, Clone)]
pub struct RefreshCookie {
    name: String,
    path: String,
    secure: bool,
    max_age_seconds: u64,
}

impl RefreshCookie {
    /// Read the cookie attributes and refresh lifetime from the
    /// configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            name: config.cookie.name.clone(),
            path: config.cookie.path.clone(),
            secure: config.cookie.secure,
            max_age_seconds: config.security.refresh_ttl_seconds,
        }
    }

    /// Header value installing `refresh_token` on the client.
    ///
    /// Signed tokens are compact base64url segments and never contain the
    /// characters a cookie value forbids, so the token is embedded as-is.
    pub fn issue(&self, refresh_token: &str) -> String {
        let mut header = format!(
            "{}={}; Max-Age={}; Path={}; HttpOnly; SameSite=Lax",
            self.name, refresh_token, self.max_age_seconds, self.path
        );
        if self.secure {
            header.push_str("; Secure");
        }
        header
    }

    /// Header value removing the cookie, for logout responses.
    pub fn clear(&self) -> String {
        let mut header = format!(
            "{}=; Max-Age=0; Path={}; HttpOnly; SameSite=Lax",
            self.name, self.path
        );
        if self.secure {
            header.push_str("; Secure");
        }
        header
    }
}
