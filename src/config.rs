use std::{env, net::SocketAddr, str::FromStr};

use thiserror::Error;

use crate::utils::jwt::{JwtSecret, JwtSecretError};

pub const DEFAULT_BACKEND_HOST: &str = "http://127.0.0.1:8000";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Where the gate gets the signed-in user from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentitySource {
    /// Decode the access token locally.
    #[default]
    Token,
    /// Ask the backend via `GET /users/me`.
    Backend,
}

impl FromStr for IdentitySource {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "token" | "local" => Ok(IdentitySource::Token),
            "backend" | "remote" => Ok(IdentitySource::Backend),
            _ => Err(ConfigError::Invalid {
                key: "IDENTITY_SOURCE",
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    JwtSecret(#[from] JwtSecretError),
    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend_host: String,
    /// `None` means access tokens are decoded without signature verification.
    pub jwt_secret: Option<JwtSecret>,
    pub auth_cookie_secure: bool,
    pub identity_source: IdentitySource,
    pub bind_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok(); // Load .env file

        let backend_host = non_empty_var("BACKEND_HOST")
            .unwrap_or_else(|| DEFAULT_BACKEND_HOST.to_string());

        let jwt_secret = non_empty_var("JWT_SECRET")
            .map(JwtSecret::from_secret)
            .transpose()?;

        let auth_cookie_secure = match non_empty_var("AUTH_COOKIE_SECURE") {
            Some(value) => parse_bool("AUTH_COOKIE_SECURE", &value)?,
            None => true,
        };

        let identity_source = match non_empty_var("IDENTITY_SOURCE") {
            Some(value) => value.parse()?,
            None => IdentitySource::default(),
        };

        let bind_addr_raw =
            non_empty_var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr_raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::Invalid {
                key: "BIND_ADDR",
                value: bind_addr_raw.clone(),
            })?;

        Ok(Config {
            backend_host,
            jwt_secret,
            auth_cookie_secure,
            identity_source,
            bind_addr,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
impl Config {
    pub fn test_default() -> Self {
        Config {
            backend_host: DEFAULT_BACKEND_HOST.to_string(),
            jwt_secret: Some(
                JwtSecret::from_secret(crate::utils::jwt::test_support::TEST_SECRET)
                    .expect("test JWT secret should be valid"),
            ),
            auth_cookie_secure: true,
            identity_source: IdentitySource::Token,
            bind_addr: ([127, 0, 0, 1], 3000).into(),
        }
    }
}
