// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the fintrack-auth project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Configuration Management
//!
//! This module implements configuration handling for the credential
//! lifecycle core. It supports loading, validating, and saving configuration
//! from YAML files using JSON Schema validation for robust error checking.
//!
//! ## Configuration Structure
//!
//! The configuration is organized as a nested structure with sections:
//! - `security`: Signing secrets and lifetimes for issued tokens
//! - `cookie`: Attributes of the refresh token cookie handed to transports
//!
//! ## Security Notes
//!
//! Access and refresh tokens are signed with two independent HMAC secrets so
//! a token minted for one purpose can never verify as the other. Validation
//! refuses a configuration where the two secrets are identical.
//!
//! ## Usage
//!
//! ```no_run
//! use fintrack_auth::config::Config;
//! use std::path::Path;
//!
//! // Load config from file, creates a default if not found
//! let config = Config::from_file(Path::new("config.yaml")).unwrap();
//!
//! println!("Token issuer: {}", config.security.issuer);
//! println!("Access tokens live for {} seconds", config.security.access_ttl_seconds);
//! ```

use anyhow::{Context, Result};
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::Write,
    path::Path,
};

/// Minimum byte length accepted for either signing secret.
pub const MIN_SECRET_LEN: usize = 32;

/// Signing secrets and lifetimes for issued tokens.
///
/// Both secrets are loaded once at startup and are immutable for the
/// process lifetime. Defaults exist so a development instance starts
/// without a config file; production deployments must override them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// HMAC secret used to sign and verify access tokens.
    ///
    /// Must be at least [`MIN_SECRET_LEN`] bytes and must differ from
    /// `refresh_secret`.
    #[serde(default = "default_access_secret")]
    pub access_secret: String,

    /// HMAC secret used to sign and verify refresh tokens.
    ///
    /// Kept separate from `access_secret` so a refresh token can never be
    /// replayed as an access token or vice versa.
    #[serde(default = "default_refresh_secret")]
    pub refresh_secret: String,

    /// Value of the `iss` claim stamped into every issued token.
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// Access token lifetime in seconds. Default is 900 (15 minutes).
    #[serde(default = "default_access_ttl")]
    pub access_ttl_seconds: u64,

    /// Refresh token lifetime in seconds. Default is 604800 (7 days).
    ///
    /// This value also bounds the refresh cookie's Max-Age and the
    /// `expires_at` column of ledger records.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_seconds: u64,
}

/// Attributes of the refresh token cookie.
///
/// The core never speaks HTTP itself; these settings feed the
/// [`RefreshCookie`](crate::auth::RefreshCookie) header builder that
/// transport layers use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieConfig {
    /// Cookie name. Default is "refresh_token".
    #[serde(default = "default_cookie_name")]
    pub name: String,

    /// Path attribute scoping the cookie to the refresh endpoint, so the
    /// refresh token rides along only where it is needed.
    /// Default is "/api/auth/refresh".
    #[serde(default = "default_cookie_path")]
    pub path: String,

    /// Emit the Secure attribute. Default is `true`; disable only for
    /// plain-HTTP development setups.
    #[serde(default = "default_cookie_secure")]
    pub secure: bool,
}

/// Root configuration structure for the credential lifecycle core.
///
/// Deserialized from and serialized to YAML using serde, and validated
/// against the JSON schema embedded from `resources/config.schema.json`
/// before deserialization. Each section falls back to defaults when not
/// present in the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Token signing secrets and lifetimes.
    #[serde(default)]
    pub security: SecurityConfig,

    /// Refresh cookie attributes.
    #[serde(default)]
    pub cookie: CookieConfig,
}

/// Development-only access token secret; replace it in production.
fn default_access_secret() -> String {
    "fintrack-dev-access-secret-change-me-in-production".to_string()
}

/// Development-only refresh token secret; replace it in production.
///
/// Deliberately different from the access default so even an untouched
/// development config keeps the two token purposes separated.
fn default_refresh_secret() -> String {
    "fintrack-dev-refresh-secret-change-me-in-production".to_string()
}

/// Default `iss` claim, derived from the package version.
fn default_issuer() -> String {
    format!("FinTrackAuth/{}", env!("CARGO_PKG_VERSION"))
}

/// Default access token lifetime: 15 minutes.
fn default_access_ttl() -> u64 {
    900
}

/// Default refresh token lifetime: 7 days.
fn default_refresh_ttl() -> u64 {
    604_800
}

/// Default refresh cookie name.
fn default_cookie_name() -> String {
    "refresh_token".to_string()
}

/// Default refresh cookie path, matching the conventional refresh endpoint.
fn default_cookie_path() -> String {
    "/api/auth/refresh".to_string()
}

/// Cookies are Secure unless explicitly disabled.
fn default_cookie_secure() -> bool {
    true
}

// implement Default for SecurityConfig
impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            access_secret: default_access_secret(),
            refresh_secret: default_refresh_secret(),
            issuer: default_issuer(),
            access_ttl_seconds: default_access_ttl(),
            refresh_ttl_seconds: default_refresh_ttl(),
        }
    }
}

// implement Default for CookieConfig
impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: default_cookie_name(),
            path: default_cookie_path(),
            secure: default_cookie_secure(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            security: SecurityConfig::default(),
            cookie: CookieConfig::default(),
        }
    }
}

impl Config {
    /// Helper method to create a sample config file when validation fails
    fn create_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let sample_path = path.with_extension("sample.yaml");
        debug!("Creating sample configuration file at {:?}", sample_path);

        // Create parent directories if they don't exist
        if let Some(parent) = sample_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).with_context(|| {
                    format!(
                        "Failed to create directory for sample config at {:?}",
                        parent
                    )
                })?;
            }
        }

        let sample_config = Self::default();
        sample_config
            .save_to_file(&sample_path)
            .with_context(|| format!("Failed to save sample config to {:?}", sample_path))?;

        error!(
            "Sample configuration file created at {:?}\nPlease edit and rename it",
            sample_path
        );
        Ok(())
    }

    /// Load configuration from a file
    ///
    /// If the file does not exist a default configuration is written there
    /// and returned. Otherwise the YAML content is validated against the
    /// embedded JSON schema, deserialized, and checked against the rules
    /// the schema cannot express (see [`Config::validate`]).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(
                "Configuration file not found at {:?}, creating default",
                path
            );
            let default_config = Self::default();
            default_config.save_to_file(path)?;
            return Ok(default_config);
        }

        debug!("Loading configuration from {:?}", path);
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file at {:?}", path))?;

        // First step: convert YAML to a generic Value
        let yaml_value: serde_yml::Value = serde_yml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML configuration from {:?}", path))?;

        // Convert to JSON Value for validation
        let json_value = serde_json::to_value(&yaml_value)
            .context("Failed to convert YAML to JSON for validation")?;

        // Load and validate with the schema
        let schema_str = include_str!("../resources/config.schema.json");
        let schema: serde_json::Value =
            serde_json::from_str(schema_str).context("Failed to parse JSON schema")?;

        // Create the validator
        let validator = jsonschema::draft202012::options()
            .should_validate_formats(true)
            .build(&schema)?;

        // Validate before deserializing to Config
        debug!("Validating {} configuration against schema", path.display());
        if let Err(validation_error) = validator.validate(&json_value) {
            error!("Configuration validation error before deserialization");
            // Generate a config.sample.yaml file with the default values
            // for the user to edit
            Self::create_sample_config(path)?;
            anyhow::bail!("Configuration validation failed: {}", validation_error);
        }

        // Now that YAML has been validated, deserialize to Config
        debug!("Schema validation passed, deserializing into Config structure");
        let config: Config = match serde_yml::from_str(&contents) {
            Ok(config) => config,
            Err(err) => {
                error!("Configuration deserialization error: {}", err);
                Self::create_sample_config(path)?;
                return Err(anyhow::anyhow!(
                    "Failed to deserialize configuration from {}: {}",
                    path.display(),
                    err
                ));
            }
        };

        // Perform additional specific validations
        if let Err(err) = config.validate() {
            error!("Configuration specific validation error: {}", err);
            Self::create_sample_config(path)?;
            return Err(err);
        }

        Ok(config)
    }

    /// Save the configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml =
            serde_yml::to_string(self).context("Failed to serialize configuration to YAML")?;

        let mut file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create config file at {:?}", path.as_ref()))?;

        file.write_all(yaml.as_bytes())
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Validates the configuration against rules the JSON schema cannot express.
    ///
    /// # Returns
    ///
    /// * `Ok(())` if all validations pass
    /// * `Err(anyhow::Error)` with a descriptive message if any validation fails
    ///
    /// # Validation Rules
    ///
    /// - Both signing secrets are at least [`MIN_SECRET_LEN`] bytes
    /// - The access and refresh secrets are not identical
    /// - Token lifetimes are non-zero and the refresh lifetime exceeds the
    ///   access lifetime
    /// - The cookie name contains no separator characters and the cookie
    ///   path is absolute
    pub fn validate(&self) -> Result<()> {
        debug!("Performing additional validation checks");

        if self.security.access_secret.len() < MIN_SECRET_LEN {
            anyhow::bail!(
                "Access token secret must be at least {} bytes",
                MIN_SECRET_LEN
            );
        }
        if self.security.refresh_secret.len() < MIN_SECRET_LEN {
            anyhow::bail!(
                "Refresh token secret must be at least {} bytes",
                MIN_SECRET_LEN
            );
        }

        // One secret per purpose, or refresh tokens could be replayed as
        // access tokens
        if self.security.access_secret == self.security.refresh_secret {
            anyhow::bail!("Access and refresh token secrets must differ");
        }

        if self.security.access_ttl_seconds == 0 || self.security.refresh_ttl_seconds == 0 {
            anyhow::bail!("Token lifetimes must be greater than zero");
        }
        if self.security.refresh_ttl_seconds <= self.security.access_ttl_seconds {
            anyhow::bail!(
                "Refresh token lifetime ({}s) must exceed access token lifetime ({}s)",
                self.security.refresh_ttl_seconds,
                self.security.access_ttl_seconds
            );
        }

        if self.cookie.name.is_empty()
            || self.cookie.name.contains([';', '=', ' ', ',', '\n', '\r'])
        {
            anyhow::bail!("Invalid cookie name: {:?}", self.cookie.name);
        }
        if !self.cookie.path.starts_with('/') {
            anyhow::bail!("Cookie path must be absolute: {:?}", self.cookie.path);
        }

        Ok(())
    }
}
