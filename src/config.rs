use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub webhook: WebhookConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_allow_origin: Option<String>,
}

/// How session tokens from the identity provider are verified
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// PEM encoded RSA public key (RS256)
    pub jwt_public_key: Option<String>,
    /// Shared secret (HS256)
    pub jwt_secret: Option<String>,
    pub issuer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// `whsec_` prefixed signing secret
    pub signing_secret: Option<String>,
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite:tanka.db".to_string()),
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
            },
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .unwrap_or(3000),
                cors_allow_origin: non_empty_var("CORS_ALLOW_ORIGIN"),
            },
            auth: AuthConfig {
                jwt_public_key: non_empty_var("CLERK_JWT_KEY"),
                jwt_secret: non_empty_var("SESSION_JWT_SECRET"),
                issuer: non_empty_var("SESSION_JWT_ISSUER"),
            },
            webhook: WebhookConfig {
                signing_secret: non_empty_var("CLERK_WEBHOOK_SECRET"),
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.auth.jwt_public_key.is_none() && self.auth.jwt_secret.is_none() {
            return Err(AppError::ConfigurationError(
                "either CLERK_JWT_KEY or SESSION_JWT_SECRET must be set".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(AppError::ConfigurationError(
                "DATABASE_MAX_CONNECTIONS must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8788,
                cors_allow_origin: None,
            },
            auth: AuthConfig {
                jwt_public_key: None,
                jwt_secret: Some("secret".to_string()),
                issuer: None,
            },
            webhook: WebhookConfig { signing_secret: None },
        }
    }

    #[test]
    fn test_server_address() {
        assert_eq!(config().server_address(), "127.0.0.1:8788");
    }

    #[test]
    fn test_validate_requires_a_session_key() {
        let mut config = config();
        assert!(config.validate().is_ok());

        config.auth.jwt_secret = None;
        assert!(matches!(config.validate(), Err(AppError::ConfigurationError(_))));
    }
}
