use std::{convert::Infallible, sync::Arc};

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

/// Name of the HTTP-only cookie carrying the signed access token.
pub const TOKEN_COOKIE: &str = "token";
/// Name of the companion refresh-token cookie. Opaque to this service.
pub const REFRESH_COOKIE: &str = "refreshToken";
/// Lifetime of the `token` cookie, in seconds (12 hours).
pub const TOKEN_MAX_AGE_SECS: i64 = 60 * 60 * 12;
/// Lifetime of the `refreshToken` cookie, in seconds (7 days).
pub const REFRESH_MAX_AGE_SECS: i64 = 60 * 60 * 24 * 7;

/// Role
///
/// The single role carried by a credential. Each role owns one area of the
/// dashboard (its scope) and has one landing page (its home).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum Role {
    Admin,
    Supervisor,
    DeliveryMan,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Supervisor, Role::DeliveryMan];

    /// Path segment under `/dashboard` reserved for this role.
    pub const fn scope_segment(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Supervisor => "supervisor",
            Role::DeliveryMan => "deliveryman",
        }
    }

    /// Landing page for this role.
    pub const fn home(self) -> &'static str {
        match self {
            Role::Admin => "/dashboard/admin",
            Role::Supervisor => "/dashboard/supervisor",
            Role::DeliveryMan => "/dashboard/deliveryman",
        }
    }

    pub fn from_scope_segment(segment: &str) -> Option<Role> {
        Role::ALL
            .into_iter()
            .find(|role| role.scope_segment() == segment)
    }
}

/// Claims
///
/// Payload of the access token issued by the external authentication service
/// at login. The service only ever reads it; it never issues or mutates tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Opaque user identifier.
    pub id: String,
    pub email: String,
    pub role: Role,
    /// External-system identifier, only present for some roles.
    #[serde(rename = "esId", default, skip_serializing_if = "Option::is_none")]
    pub es_id: Option<String>,
    /// Expiration Time (exp). Mandatory: tokens without it are rejected.
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<usize>,
}

impl Claims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.exp)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

/// TokenError
///
/// Why a credential was refused. Callers on the request path never surface
/// the distinction to the user; it exists for logging and tests.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token signature does not verify")]
    InvalidSignature,
    #[error("token is malformed: {0}")]
    Malformed(String),
    #[error("token rejected: {0}")]
    Other(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::MissingRequiredClaim(_) => TokenError::Malformed(err.to_string()),
            _ => TokenError::Other(err.to_string()),
        }
    }
}

/// TokenVerifier Contract
///
/// Verifies a raw token string and returns its decoded claims. The access gate
/// depends only on this trait, so tests can inject verifiers built from their
/// own secrets.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Claims, TokenError>;
}

/// JwtVerifier
///
/// HMAC-SHA256 verification against the shared secret from `AppConfig`.
/// The algorithm is pinned: a token whose header names any other algorithm
/// is refused even if it is otherwise well formed.
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl TokenVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)?;
        Ok(data.claims)
    }
}

/// VerifierState
///
/// The shared handle to the verifier held in the application state.
pub type VerifierState = Arc<dyn TokenVerifier>;

/// SessionToken Extractor
///
/// The raw value of the `token` cookie, if present and non-empty. The proxy
/// handlers forward it to the backend as a bearer credential without
/// verifying it themselves; the backend is the authority for API calls.
#[derive(Debug, Clone)]
pub struct SessionToken(pub Option<String>);

impl SessionToken {
    pub fn from_jar(jar: &CookieJar) -> Self {
        Self(
            jar.get(TOKEN_COOKIE)
                .map(|cookie| cookie.value().to_string())
                .filter(|value| !value.is_empty()),
        )
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_jar(&CookieJar::from_headers(&parts.headers)))
    }
}
