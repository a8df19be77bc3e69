// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT session token tests.
//!
//! These tests verify that tokens issued at login are accepted by the auth
//! middleware, catching Claims or algorithm mismatches early.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::time::{SystemTime, UNIX_EPOCH};
use travel_buddy::middleware::auth::{create_jwt, verify_jwt, SESSION_DAYS};

mod common;

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    exp: usize,
    iat: usize,
}

const SIGNING_KEY: &[u8] = b"test_signing_key_32_bytes_long!!";

#[test]
fn test_jwt_roundtrip() {
    let user_id = 12345678u64;

    let token = create_jwt(user_id, SIGNING_KEY).unwrap();

    assert_eq!(verify_jwt(&token, SIGNING_KEY), Some(user_id));
}

#[test]
fn test_test_helper_matches_issued_tokens() {
    let token = common::create_test_jwt(98765432, SIGNING_KEY);

    assert_eq!(verify_jwt(&token, SIGNING_KEY), Some(98765432));
}

#[test]
fn test_jwt_wrong_key_rejected() {
    let token = create_jwt(1, SIGNING_KEY).unwrap();

    assert_eq!(verify_jwt(&token, b"another_signing_key_32_bytes!!!!"), None);
    assert_eq!(verify_jwt("not-a-jwt", SIGNING_KEY), None);
}

#[test]
fn test_jwt_expiration_matches_session_length() {
    let token = create_jwt(12345, SIGNING_KEY).unwrap();

    let key = DecodingKey::from_secret(SIGNING_KEY);
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    let token_data = decode::<Claims>(&token, &key, &validation).unwrap();

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;
    let session = 86400 * SESSION_DAYS as usize;

    assert_eq!(token_data.claims.sub, "12345");
    assert!(token_data.claims.iat <= now);
    assert!(token_data.claims.exp > now + session - 86400);
    assert!(token_data.claims.exp <= now + session);
}
