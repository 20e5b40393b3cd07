use jsonwebtoken::Algorithm;
use std::time::Duration;

use rusty_sessions::auth::token::{Claims, TokenCodec};
use rusty_sessions::error::RustySessionsError;

const SECRET: &str = "5e6r7t68yp9uhvycrd67890ijbhvgucftrd6y5789";

fn hs256() -> TokenCodec {
    TokenCodec::new(SECRET, Algorithm::HS256, vec![Algorithm::HS256], None).unwrap()
}

fn claims() -> Claims {
    Claims::new(
        "1".to_string(),
        "hello@newworld.codes".to_string(),
        "multicolour".to_string(),
    )
}

#[test]
fn test_sign_and_verify() {
    let codec = hs256();
    let token = codec.sign(&claims()).unwrap();
    assert_eq!(token.split('.').count(), 3);

    let decoded = codec.verify(&token).unwrap();
    assert_eq!(decoded.id, "1");
    assert_eq!(decoded.email, "hello@newworld.codes");
    assert_eq!(decoded.username, "multicolour");
    assert!(decoded.exp.is_none());
}

#[test]
fn test_same_second_logins_get_distinct_tokens() {
    let codec = hs256();
    let first = codec.sign(&claims()).unwrap();
    let second = codec.sign(&claims()).unwrap();
    assert_ne!(first, second);
}

#[test]
fn test_token_under_unaccepted_algorithm_rejected() {
    // Same secret, so the signature itself would verify
    let hs512 = TokenCodec::new(SECRET, Algorithm::HS512, vec![Algorithm::HS512], None).unwrap();
    let token = hs512.sign(&claims()).unwrap();

    let result = hs256().verify(&token);
    assert!(matches!(result, Err(RustySessionsError::AlgorithmRejected(_))));
}

#[test]
fn test_multiple_accepted_algorithms() {
    let both = TokenCodec::new(
        SECRET,
        Algorithm::HS256,
        vec![Algorithm::HS256, Algorithm::HS512],
        None,
    )
    .unwrap();
    let hs512 = TokenCodec::new(SECRET, Algorithm::HS512, vec![Algorithm::HS512], None).unwrap();

    let token = hs512.sign(&claims()).unwrap();
    assert_eq!(both.verify(&token).unwrap().id, "1");
    assert_eq!(both.accepted_algorithms().len(), 2);
}

#[test]
fn test_wrong_secret_is_invalid() {
    let other = TokenCodec::new(
        "a-completely-different-signing-key-0192837465",
        Algorithm::HS256,
        vec![Algorithm::HS256],
        None,
    )
    .unwrap();
    let token = other.sign(&claims()).unwrap();

    assert!(matches!(hs256().verify(&token), Err(RustySessionsError::TokenInvalid(_))));
}

#[test]
fn test_garbage_is_malformed() {
    let codec = hs256();
    assert!(matches!(codec.verify("not-a-token"), Err(RustySessionsError::TokenMalformed(_))));
    assert!(matches!(codec.verify(""), Err(RustySessionsError::TokenMalformed(_))));
    assert!(matches!(
        codec.verify(&"a".repeat(10_000)),
        Err(RustySessionsError::TokenMalformed(_))
    ));
}

#[test]
fn test_tampered_payload_is_rejected() {
    let codec = hs256();
    let token = codec.sign(&claims()).unwrap();
    let forged = codec
        .sign(&Claims::new("2".to_string(), "x@y.z".to_string(), "x".to_string()))
        .unwrap();

    // Header and signature from one token, payload from another
    let parts: Vec<&str> = token.split('.').collect();
    let forged_parts: Vec<&str> = forged.split('.').collect();
    let spliced = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);

    assert!(codec.verify(&spliced).is_err());
}

#[test]
fn test_ttl_stamps_and_enforces_expiry() {
    let codec = TokenCodec::new(
        SECRET,
        Algorithm::HS256,
        vec![Algorithm::HS256],
        Some(Duration::from_secs(3600)),
    )
    .unwrap();

    let fresh = codec.verify(&codec.sign(&claims()).unwrap()).unwrap();
    assert_eq!(fresh.exp, Some(fresh.iat + 3600));

    // Issued two hours ago, expired one hour ago
    let mut old = claims();
    old.iat -= 7200;
    let token = codec.sign(&old).unwrap();
    assert!(matches!(codec.verify(&token), Err(RustySessionsError::TokenInvalid(_))));
}

#[test]
fn test_ttl_codec_requires_exp() {
    let with_ttl = TokenCodec::new(
        SECRET,
        Algorithm::HS256,
        vec![Algorithm::HS256],
        Some(Duration::from_secs(60)),
    )
    .unwrap();
    let token = hs256().sign(&claims()).unwrap();

    assert!(matches!(with_ttl.verify(&token), Err(RustySessionsError::TokenMalformed(_))));
}
