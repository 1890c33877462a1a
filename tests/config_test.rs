// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the fintrack-auth project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use anyhow::Result;
use fintrack_auth::config::Config;
use tempfile::tempdir;

#[test]
fn test_config_load_and_save() -> Result<()> {
    // Create a temporary directory
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");

    // Create a custom config
    let mut config = Config::default();
    config.security.issuer = "FinTrackAuth/test".to_string();
    config.security.access_ttl_seconds = 600;
    config.cookie.secure = false;

    // Save config to file
    config.save_to_file(&config_path)?;

    // Load config from file
    let loaded_config = Config::from_file(&config_path)?;

    // Verify loaded config matches original
    assert_eq!(loaded_config.security.issuer, "FinTrackAuth/test");
    assert_eq!(loaded_config.security.access_ttl_seconds, 600);
    assert!(!loaded_config.cookie.secure);
    assert_eq!(loaded_config.cookie.path, "/api/auth/refresh");

    // Test loading default config for non-existent file
    let non_existent_path = temp_dir.path().join("non_existent.yaml");
    let default_config = Config::from_file(&non_existent_path)?;

    // Verify default config was created
    assert!(non_existent_path.exists());
    assert_eq!(default_config.security.access_ttl_seconds, 900);
    assert_eq!(default_config.security.refresh_ttl_seconds, 604_800);
    assert_eq!(default_config.cookie.name, "refresh_token");

    Ok(())
}

#[test]
fn test_config_validation() {
    // The default config passes every rule
    assert!(Config::default().validate().is_ok());

    // Identical secrets would let a refresh token verify as an access token
    let mut same_secrets = Config::default();
    same_secrets.security.refresh_secret = same_secrets.security.access_secret.clone();
    assert!(same_secrets.validate().is_err());

    // Secrets below the minimum length are refused
    let mut short_secret = Config::default();
    short_secret.security.access_secret = "too-short".to_string();
    assert!(short_secret.validate().is_err());

    // The refresh lifetime must exceed the access lifetime
    let mut inverted_ttls = Config::default();
    inverted_ttls.security.refresh_ttl_seconds = inverted_ttls.security.access_ttl_seconds;
    assert!(inverted_ttls.validate().is_err());

    // Cookie paths must be absolute
    let mut bad_path = Config::default();
    bad_path.cookie.path = "relative/path".to_string();
    assert!(bad_path.validate().is_err());

    // Cookie names must survive header syntax
    let mut bad_name = Config::default();
    bad_name.cookie.name = "refresh;token".to_string();
    assert!(bad_name.validate().is_err());
}

#[test]
fn test_schema_rejection_writes_sample_file() -> Result<()> {
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");

    // A type the schema refuses: ttl as a string
    std::fs::write(
        &config_path,
        "security:\n  access_ttl_seconds: \"not a number\"\n",
    )?;

    assert!(Config::from_file(&config_path).is_err());
    assert!(
        temp_dir.path().join("config.sample.yaml").exists(),
        "A sample config should be written for the user to edit"
    );

    Ok(())
}

#[test]
fn test_unknown_section_rejected_by_schema() -> Result<()> {
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");

    std::fs::write(&config_path, "unknown_section:\n  key: value\n")?;

    assert!(Config::from_file(&config_path).is_err());

    Ok(())
}
