use chrono::Utc;
use dispatch_portal::{
    Role,
    auth::{JwtVerifier, TokenError, TokenVerifier},
};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::{Value, json};

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

fn claims(role: &str, exp_offset: i64) -> Value {
    let now = Utc::now().timestamp();
    json!({
        "id": "64f1c0de",
        "email": "user@example.com",
        "role": role,
        "iat": now,
        "exp": now + exp_offset,
    })
}

fn sign(header: &Header, claims: &Value, secret: &str) -> String {
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(header, claims, &key).unwrap()
}

fn create_token(role: &str, exp_offset: i64) -> String {
    sign(&Header::default(), &claims(role, exp_offset), TEST_JWT_SECRET)
}

// --- Tests ---

#[tokio::test]
async fn test_valid_token_yields_claims() {
    let verifier = JwtVerifier::new(TEST_JWT_SECRET);
    let token = create_token("SUPERVISOR", 3600);

    let claims = verifier.verify(&token).await.unwrap();

    assert_eq!(claims.role, Role::Supervisor);
    assert_eq!(claims.id, "64f1c0de");
    assert_eq!(claims.email, "user@example.com");
    assert_eq!(claims.es_id, None);
}

#[tokio::test]
async fn test_es_id_claim_is_read() {
    let verifier = JwtVerifier::new(TEST_JWT_SECRET);
    let mut payload = claims("DELIVERY_MAN", 3600);
    payload["esId"] = json!("ES-0042");
    let token = sign(&Header::default(), &payload, TEST_JWT_SECRET);

    let claims = verifier.verify(&token).await.unwrap();

    assert_eq!(claims.role, Role::DeliveryMan);
    assert_eq!(claims.es_id.as_deref(), Some("ES-0042"));
}

#[tokio::test]
async fn test_secret_whitespace_is_significant() {
    let padded = " padded-secret\n";
    let token = sign(&Header::default(), &claims("ADMIN", 3600), padded);

    assert!(JwtVerifier::new(padded).verify(&token).await.is_ok());
    assert_eq!(
        JwtVerifier::new(padded.trim())
            .verify(&token)
            .await
            .unwrap_err(),
        TokenError::InvalidSignature
    );
}

#[tokio::test]
async fn test_wrong_secret_is_rejected() {
    let verifier = JwtVerifier::new(TEST_JWT_SECRET);
    let token = sign(&Header::default(), &claims("ADMIN", 3600), "another-secret");

    assert_eq!(
        verifier.verify(&token).await.unwrap_err(),
        TokenError::InvalidSignature
    );
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let verifier = JwtVerifier::new(TEST_JWT_SECRET);
    // Well past the default validation leeway.
    let token = create_token("ADMIN", -3600);

    assert_eq!(verifier.verify(&token).await.unwrap_err(), TokenError::Expired);
}

#[tokio::test]
async fn test_other_algorithm_is_rejected() {
    let verifier = JwtVerifier::new(TEST_JWT_SECRET);
    let token = sign(
        &Header::new(Algorithm::HS512),
        &claims("ADMIN", 3600),
        TEST_JWT_SECRET,
    );

    assert!(verifier.verify(&token).await.is_err());
}

#[tokio::test]
async fn test_token_without_expiry_is_rejected() {
    let verifier = JwtVerifier::new(TEST_JWT_SECRET);
    let payload = json!({ "id": "1", "email": "a@b.c", "role": "ADMIN" });
    let token = sign(&Header::default(), &payload, TEST_JWT_SECRET);

    assert!(matches!(
        verifier.verify(&token).await,
        Err(TokenError::Malformed(_))
    ));
}

#[tokio::test]
async fn test_unknown_role_is_rejected() {
    let verifier = JwtVerifier::new(TEST_JWT_SECRET);
    let token = create_token("GUEST", 3600);

    assert!(matches!(
        verifier.verify(&token).await,
        Err(TokenError::Malformed(_))
    ));
}

#[tokio::test]
async fn test_garbage_is_rejected() {
    let verifier = JwtVerifier::new(TEST_JWT_SECRET);

    for token in ["", "not-a-token", "a.b.c", "eyJhbGciOiJIUzI1NiJ9.e30"] {
        assert!(verifier.verify(token).await.is_err(), "accepted {token:?}");
    }
}
