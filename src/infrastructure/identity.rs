// Identity - Verifies identity-provider session tokens
//
// The provider issues signed JWTs whose `sub` claim is the user's external id.
// Tokens arrive either as a bearer token or in the `__session` cookie.

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::config::AuthConfig;
use crate::error::{AppError, AppResult};

pub const SESSION_COOKIE: &str = "__session";

/// Identity proven by a valid session token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub clerk_id: String,
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> AppResult<VerifiedIdentity>;
}

#[derive(Debug, Deserialize)]
struct SessionClaims {
    sub: String,
}

/// Verifies session JWTs with a fixed key: the provider's RSA public key
/// (RS256) or a shared secret (HS256)
pub struct JwtIdentityVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityVerifier {
    pub fn from_config(config: &AuthConfig) -> AppResult<Self> {
        let (key, algorithm) = match (&config.jwt_public_key, &config.jwt_secret) {
            (Some(pem), _) => {
                let key = DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| {
                    AppError::ConfigurationError(format!("Invalid CLERK_JWT_KEY: {}", e))
                })?;
                (key, Algorithm::RS256)
            }
            (None, Some(secret)) => (DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256),
            (None, None) => {
                return Err(AppError::ConfigurationError(
                    "No session token key configured".to_string(),
                ))
            }
        };

        let mut validation = Validation::new(algorithm);
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }

        Ok(Self { key, validation })
    }

    pub fn with_secret(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn verify(&self, token: &str) -> AppResult<VerifiedIdentity> {
        let data = decode::<SessionClaims>(token, &self.key, &self.validation)
            .map_err(|e| AppError::Unauthorized(format!("Invalid session token: {}", e)))?;

        if data.claims.sub.is_empty() {
            return Err(AppError::Unauthorized("Session token has no subject".to_string()));
        }
        Ok(VerifiedIdentity {
            clerk_id: data.claims.sub,
        })
    }
}

/// Session token from `Authorization: Bearer ...` or the session cookie
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        if let Some(token) = value.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestClaims<'a> {
        sub: &'a str,
        exp: i64,
    }

    fn token(secret: &str, sub: &str, exp: i64) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &TestClaims { sub, exp },
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn in_an_hour() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[tokio::test]
    async fn test_verifies_valid_token() {
        let verifier = JwtIdentityVerifier::with_secret("s3cret");
        let identity = verifier.verify(&token("s3cret", "user_abc", in_an_hour())).await.unwrap();
        assert_eq!(identity.clerk_id, "user_abc");
    }

    #[tokio::test]
    async fn test_rejects_wrong_key_and_expired_tokens() {
        let verifier = JwtIdentityVerifier::with_secret("s3cret");

        let forged = verifier.verify(&token("other", "user_abc", in_an_hour())).await;
        assert!(matches!(forged, Err(AppError::Unauthorized(_))));

        let expired = verifier.verify(&token("s3cret", "user_abc", 1_000)).await;
        assert!(matches!(expired, Err(AppError::Unauthorized(_))));

        assert!(verifier.verify("not-a-jwt").await.is_err());
    }

    #[test]
    fn test_session_token_sources() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);

        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; __session=abc.def.ghi"));
        assert_eq!(session_token(&headers).as_deref(), Some("abc.def.ghi"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(session_token(&headers).as_deref(), Some("xyz"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        assert_eq!(session_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_from_config_requires_a_key() {
        let config = AuthConfig {
            jwt_public_key: None,
            jwt_secret: None,
            issuer: None,
        };
        assert!(matches!(
            JwtIdentityVerifier::from_config(&config),
            Err(AppError::ConfigurationError(_))
        ));
    }
}
