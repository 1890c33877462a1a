// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the fintrack-auth project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Mint a short-lived access token from the command line.
//!
//! Access tokens are stateless, so one can be minted out-of-band for
//! support and debugging without touching the token ledger. Refresh tokens
//! are deliberately NOT mintable here: a refresh token without a ledger
//! record would never rotate.

use anyhow::Result;
use clap::Parser;
use fintrack_auth::auth::TokenCodec;
use fintrack_auth::config::Config;
use std::path::PathBuf;
use std::process;

/// Mint a FinTrack access token for support and debugging
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML format)
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// User id to embed as the token subject
    #[arg(short, long)]
    user_id: String,

    /// Email to embed alongside the subject
    #[arg(short, long)]
    email: String,

    /// Enable verbose logging (debug level)
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Suppress output messages, only the token is printed
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.quiet {
        log::LevelFilter::Off
    } else if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    let config = Config::from_file(&args.config)?;
    let codec = TokenCodec::new(&config.security);
    let token = codec.mint_access_token(&args.user_id, &args.email)?;

    if args.quiet {
        print!("{}", token);
    } else {
        println!("✅ Access token created");
        println!("👤 Subject: {} <{}>", args.user_id, args.email);
        println!("⏱️  Valid for: {} seconds", config.security.access_ttl_seconds);
        println!("🎫 Token: {}", token);
    }

    Ok(())
}
