//! Session authorizer gating the mutating routes.
//!
//! The token travels in a `token` cookie. Signature and expiry checking is
//! delegated to a [`TokenVerifier`]; the authorizer adds no policy beyond
//! "valid token means allow" and does not do per-resource ownership checks.

use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::AppError;

/// Default session-token validity window (1 hour).
pub const SESSION_TOKEN_TTL_SECONDS: i64 = 60 * 60;

/// Identity established by a verified session token.
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    pub sub: String,
    pub username: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    exp: usize,
}

/// Answers "is this token currently valid, and for which principal".
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Principal, AppError>;
}

/// HS256 JWT verifier backed by the shared session secret.
pub struct JwtVerifier {
    secret: String,
}

impl JwtVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<Principal, AppError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| AppError::Auth(format!("invalid session token: {e}")))?;
        Ok(Principal {
            sub: data.claims.sub,
            username: data.claims.username,
        })
    }
}

/// Sign a session token for the given principal.
pub fn issue_session_token(
    secret: &str,
    sub: &str,
    username: Option<&str>,
    ttl_seconds: i64,
) -> Result<String, AppError> {
    let expiration = (Utc::now() + chrono::Duration::seconds(ttl_seconds)).timestamp();
    let claims = Claims {
        sub: sub.to_string(),
        username: username.map(str::to_string),
        exp: expiration.max(0) as usize,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Auth(format!("failed to sign session token: {e}")))
}

/// Extract the session token from a raw `Cookie` header value.
pub fn session_token(cookie_header: &str) -> Option<&str> {
    cookie_header.split(';').find_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        (name.trim() == "token").then_some(value.trim())
    })
}

/// Authorization decision for a mutating request.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthDecision {
    Allow(Principal),
    Deny,
}

struct CachedDecision {
    principal: Principal,
    verified_at: Instant,
}

/// Gate invoked ahead of the mutating handlers.
///
/// Allow decisions can be cached per token for a configurable window. The
/// deployed window is zero, so every invocation re-verifies.
pub struct SessionAuthorizer<V> {
    verifier: V,
    cache_ttl: Duration,
    cache: Mutex<HashMap<String, CachedDecision>>,
}

impl<V: TokenVerifier> SessionAuthorizer<V> {
    pub fn new(verifier: V) -> Self {
        Self::with_cache_ttl(verifier, Duration::ZERO)
    }

    pub fn with_cache_ttl(verifier: V, cache_ttl: Duration) -> Self {
        Self {
            verifier,
            cache_ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Decide whether the request presenting this `Cookie` header may mutate.
    pub fn authorize(&self, cookie_header: Option<&str>) -> AuthDecision {
        let Some(token) = cookie_header.and_then(session_token) else {
            warn!("mutating request without session token cookie");
            return AuthDecision::Deny;
        };

        if !self.cache_ttl.is_zero() {
            let cache = self.cache.lock().expect("authorizer cache poisoned");
            if let Some(cached) = cache.get(token) {
                if cached.verified_at.elapsed() < self.cache_ttl {
                    return AuthDecision::Allow(cached.principal.clone());
                }
            }
        }

        match self.verifier.verify(token) {
            Ok(principal) => {
                if !self.cache_ttl.is_zero() {
                    let mut cache = self.cache.lock().expect("authorizer cache poisoned");
                    cache.insert(
                        token.to_string(),
                        CachedDecision {
                            principal: principal.clone(),
                            verified_at: Instant::now(),
                        },
                    );
                }
                AuthDecision::Allow(principal)
            }
            Err(err) => {
                warn!(category = err.category(), error = %err, "session token rejected");
                AuthDecision::Deny
            }
        }
    }
}
