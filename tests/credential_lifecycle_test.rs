// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the fintrack-auth project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use chrono::{Duration, Utc};
use fintrack_auth::auth::{
    Claims, CredentialGateway, DigestStore, InMemoryLedger, RefreshTokenRecord, RotationEngine,
    ShaCryptDigest, TokenCodec, TokenLedger, TokenPurpose,
};
use fintrack_auth::config::Config;
use fintrack_auth::error::AuthError;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use log::debug;
use std::sync::Arc;
use std::sync::Once;

static INIT: Once = Once::new();

/// Setup logger for tests
fn setup() {
    INIT.call_once(|| {
        env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .is_test(true)
            .init();
    });
}

fn gateway() -> CredentialGateway {
    CredentialGateway::with_memory_stores(&Config::default())
}

#[tokio::test]
async fn full_lifecycle_for_one_account() {
    setup();
    let gateway = gateway();

    // Register: account plus the first pair (A1, R1)
    let session = gateway
        .register("alice@example.com", "a-strong-password", "Alice")
        .await
        .expect("registration should succeed");
    let user_id = session.user.id.clone();
    let r1 = session.tokens.refresh_token.clone();
    assert_eq!(session.user.email, "alice@example.com");

    // R1 buys a replacement pair (A2, R2)
    let second = gateway
        .rotate(&user_id, &r1)
        .await
        .expect("a fresh refresh token should rotate");
    assert_ne!(second.refresh_token, r1, "rotation issues a new token");

    // The new access token authenticates
    let claims = gateway
        .authenticate(&second.access_token)
        .expect("rotated access token should authenticate");
    assert_eq!(claims.sub, user_id);

    // Replaying the spent R1 is denied
    let replay = gateway.rotate(&user_id, &r1).await;
    assert!(
        matches!(replay, Err(AuthError::AccessDenied)),
        "a spent refresh token must never rotate again"
    );

    // The replacement R2 still works after the replay attempt
    let third = gateway
        .rotate(&user_id, &second.refresh_token)
        .await
        .expect("the replacement token should still rotate");

    // Logout revokes everything outstanding
    gateway.logout(&user_id).await.expect("logout succeeds");
    let after_logout = gateway.rotate(&user_id, &third.refresh_token).await;
    assert!(
        matches!(after_logout, Err(AuthError::AccessDenied)),
        "no refresh token survives logout"
    );

    debug!("lifecycle completed for user {}", user_id);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_rotations_have_one_winner() {
    setup();
    let gateway = Arc::new(gateway());
    let session = gateway
        .register("alice@example.com", "a-strong-password", "Alice")
        .await
        .unwrap();
    let user_id = session.user.id.clone();
    let refresh = session.tokens.refresh_token.clone();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let gateway = Arc::clone(&gateway);
        let user_id = user_id.clone();
        let token = refresh.clone();
        handles.push(tokio::spawn(async move {
            gateway.rotate(&user_id, &token).await
        }));
    }

    let mut winners = 0;
    let mut denied = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(AuthError::AccessDenied) => denied += 1,
            Err(other) => panic!("unexpected error under contention: {}", other),
        }
    }
    assert_eq!(winners, 1, "exactly one rotation may succeed");
    assert_eq!(denied, 7, "every loser gets the undifferentiated denial");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn engine_over_shared_stores_spends_a_token_exactly_once() {
    setup();
    let config = Config::default();
    let codec = Arc::new(TokenCodec::new(&config.security));
    let ledger = Arc::new(InMemoryLedger::new());
    let digest = Arc::new(ShaCryptDigest::new());
    let engine = Arc::new(RotationEngine::new(
        Arc::clone(&codec),
        Arc::clone(&ledger) as Arc<dyn TokenLedger>,
        Arc::clone(&digest) as Arc<dyn DigestStore>,
    ));

    let first = engine
        .issue_pair("user-1", "alice@example.com")
        .await
        .expect("issuing the first pair succeeds");

    let mut handles = Vec::new();
    for _ in 0..16 {
        let engine = Arc::clone(&engine);
        let token = first.refresh_token.clone();
        handles.push(tokio::spawn(
            async move { engine.rotate("user-1", &token).await },
        ));
    }

    let mut replacements = Vec::new();
    let mut denied = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(pair) => replacements.push(pair),
            Err(AuthError::AccessDenied) => denied += 1,
            Err(other) => panic!("unexpected error under contention: {}", other),
        }
    }
    assert_eq!(replacements.len(), 1, "exactly one rotation may succeed");
    assert_eq!(denied, 15, "every loser gets the undifferentiated denial");

    // The spent token stays dead once the contention is over
    assert!(matches!(
        engine.rotate("user-1", &first.refresh_token).await,
        Err(AuthError::AccessDenied)
    ));

    // The winner's replacement is the single live continuation
    let winner = replacements.pop().unwrap();
    engine
        .rotate("user-1", &winner.refresh_token)
        .await
        .expect("the winning chain continues");
}

#[tokio::test]
async fn logout_revokes_every_outstanding_session() {
    setup();
    let gateway = gateway();
    let session = gateway
        .register("alice@example.com", "a-strong-password", "Alice")
        .await
        .unwrap();
    let user_id = session.user.id.clone();

    // Two more devices log in, then one of them rotates
    let phone = gateway
        .login("alice@example.com", "a-strong-password")
        .await
        .unwrap();
    let laptop = gateway
        .login("alice@example.com", "a-strong-password")
        .await
        .unwrap();
    let rotated_phone = gateway
        .rotate(&user_id, &phone.tokens.refresh_token)
        .await
        .unwrap();

    gateway.logout(&user_id).await.unwrap();

    for token in [
        session.tokens.refresh_token,
        laptop.tokens.refresh_token,
        rotated_phone.refresh_token,
    ] {
        assert!(
            matches!(
                gateway.rotate(&user_id, &token).await,
                Err(AuthError::AccessDenied)
            ),
            "every session must be dead after logout"
        );
    }

    // Logout with nothing left to revoke still succeeds
    gateway.logout(&user_id).await.unwrap();
}

#[tokio::test]
async fn expired_token_rejected_even_with_live_record() {
    setup();
    let config = Config::default();
    let codec = Arc::new(TokenCodec::new(&config.security));
    let ledger = Arc::new(InMemoryLedger::new());
    let digest = Arc::new(ShaCryptDigest::new());
    let engine = RotationEngine::new(
        Arc::clone(&codec),
        Arc::clone(&ledger) as Arc<dyn TokenLedger>,
        Arc::clone(&digest) as Arc<dyn DigestStore>,
    );

    // Hand-craft a refresh token whose exp claim passed an hour ago
    let now = Utc::now();
    let claims = Claims {
        sub: "user-1".to_string(),
        email: "alice@example.com".to_string(),
        purpose: TokenPurpose::Refresh,
        jti: Some("stale-record".to_string()),
        iat: (now - Duration::hours(2)).timestamp(),
        exp: (now - Duration::hours(1)).timestamp(),
        iss: config.security.issuer.clone(),
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.security.refresh_secret.as_bytes()),
    )
    .unwrap();

    // Its ledger record exists and was never revoked
    let hashed = digest.hash(&token).unwrap();
    ledger
        .record(RefreshTokenRecord::new(
            "stale-record",
            "user-1",
            hashed,
            now - Duration::hours(1),
        ))
        .await
        .unwrap();

    let result = engine.rotate("user-1", &token).await;
    assert!(
        matches!(result, Err(AuthError::AccessDenied)),
        "the expiry claim alone must kill the rotation"
    );

    // The rejection happened before the commit point
    let record = ledger.find("stale-record").await.unwrap().unwrap();
    assert!(!record.revoked, "an expired token must not spend its record");
}

#[tokio::test]
async fn rotation_is_bound_to_the_subject() {
    setup();
    let gateway = gateway();
    let alice = gateway
        .register("alice@example.com", "a-strong-password", "Alice")
        .await
        .unwrap();
    let bob = gateway
        .register("bob@example.com", "another-password-ok", "Bob")
        .await
        .unwrap();

    // Bob presenting Alice's refresh token is denied
    let stolen = gateway
        .rotate(&bob.user.id, &alice.tokens.refresh_token)
        .await;
    assert!(matches!(stolen, Err(AuthError::AccessDenied)));

    // The failed attempt did not spend Alice's token
    gateway
        .rotate(&alice.user.id, &alice.tokens.refresh_token)
        .await
        .expect("the subject-mismatch rejection must leave the token live");
}

#[tokio::test]
async fn access_tokens_never_rotate() {
    setup();
    let gateway = gateway();
    let session = gateway
        .register("alice@example.com", "a-strong-password", "Alice")
        .await
        .unwrap();

    let result = gateway
        .rotate(&session.user.id, &session.tokens.access_token)
        .await;
    assert!(
        matches!(result, Err(AuthError::AccessDenied)),
        "an access token presented for rotation is denied"
    );
}

#[tokio::test]
async fn parallel_sessions_rotate_independently() {
    setup();
    let gateway = gateway();
    let first = gateway
        .register("alice@example.com", "a-strong-password", "Alice")
        .await
        .unwrap();
    let second = gateway
        .login("alice@example.com", "a-strong-password")
        .await
        .unwrap();
    let user_id = first.user.id.clone();

    // Spending one device's token leaves the other device alone
    gateway
        .rotate(&user_id, &first.tokens.refresh_token)
        .await
        .expect("first session rotates");
    gateway
        .rotate(&user_id, &second.tokens.refresh_token)
        .await
        .expect("second session is unaffected");
}
