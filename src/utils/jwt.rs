use std::collections::HashSet;

use chrono::{DateTime, Utc};
use jsonwebtoken::{
    decode, errors::Error, errors::ErrorKind, Algorithm, DecodingKey, Validation,
};
use serde_json::Value;
use thiserror::Error;

use crate::routes::auth::claims::{validate_claims, AccessTokenClaims, ClaimsRejection};

/// Minimum acceptable size for the JWT secret in bytes.
pub const MIN_JWT_SECRET_LENGTH: usize = 32;
/// Minimum number of unique bytes expected for the JWT secret to avoid trivially guessable values.
const MIN_UNIQUE_JWT_BYTES: usize = 8;

#[derive(Debug, Error)]
pub enum JwtSecretError {
    #[error("JWT_SECRET must be at least {required} bytes, but {actual} bytes were provided")]
    TooShort { actual: usize, required: usize },
    #[error(
        "JWT_SECRET must contain sufficient entropy (at least {required} unique bytes); only {actual} unique bytes found"
    )]
    LowEntropy { actual: usize, required: usize },
}

/// HS256 verification key shared with the backend API.
#[derive(Clone)]
pub struct JwtSecret {
    decoding: DecodingKey,
}

impl std::fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSecret").finish_non_exhaustive()
    }
}

impl JwtSecret {
    pub fn from_secret(secret: impl AsRef<[u8]>) -> Result<Self, JwtSecretError> {
        let bytes = secret.as_ref();
        validate_secret(bytes)?;

        Ok(Self {
            decoding: DecodingKey::from_secret(bytes),
        })
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }
}

fn validate_secret(secret: &[u8]) -> Result<(), JwtSecretError> {
    if secret.len() < MIN_JWT_SECRET_LENGTH {
        return Err(JwtSecretError::TooShort {
            actual: secret.len(),
            required: MIN_JWT_SECRET_LENGTH,
        });
    }

    let unique = secret.iter().copied().collect::<HashSet<_>>().len();
    if unique < MIN_UNIQUE_JWT_BYTES {
        return Err(JwtSecretError::LowEntropy {
            actual: unique,
            required: MIN_UNIQUE_JWT_BYTES,
        });
    }

    Ok(())
}

/// Decodes an access token and checks the shape of its payload.
///
/// With a secret the HS256 signature is verified; without one the payload is
/// read as-is. Expiry is not checked here; see [`is_expired`].
pub fn decode_access_token(
    token: &str,
    secret: Option<&JwtSecret>,
) -> Result<AccessTokenClaims, ClaimsRejection> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = match secret {
        Some(secret) => decode::<Value>(token, secret.decoding_key(), &validation),
        None => {
            validation.insecure_disable_signature_validation();
            decode::<Value>(token, &DecodingKey::from_secret(&[]), &validation)
        }
    }
    .map_err(rejection_from_jwt_error)?;

    validate_claims(&data.claims)
}

fn rejection_from_jwt_error(err: Error) -> ClaimsRejection {
    match err.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
            ClaimsRejection::InvalidSignature
        }
        _ => ClaimsRejection::Malformed,
    }
}

/// Missing `exp` counts as expired.
pub fn is_expired(claims: &AccessTokenClaims, now: DateTime<Utc>) -> bool {
    match claims.exp {
        Some(exp) => exp <= now.timestamp(),
        None => true,
    }
}

pub fn verify_access_token(
    token: &str,
    secret: Option<&JwtSecret>,
    now: DateTime<Utc>,
) -> Result<AccessTokenClaims, ClaimsRejection> {
    let claims = decode_access_token(token, secret)?;
    if is_expired(&claims, now) {
        return Err(ClaimsRejection::Expired);
    }
    Ok(claims)
}
