use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Payload of an access token minted by the backend API.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct AccessTokenClaims {
    pub sub: String, // subject email
    pub id: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub full_name: Option<String>,
    // Entries are filtered to strings when the session is materialized
    pub scopes: Vec<Value>,
    pub exp: Option<i64>,
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ClaimsRejection {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature does not match")]
    InvalidSignature,
    #[error("token is missing the `{0}` claim")]
    MissingClaim(&'static str),
    #[error("token claim `{0}` has an unexpected type")]
    InvalidClaim(&'static str),
    #[error("token has expired")]
    Expired,
}

/// Checks a decoded payload for the claims a session needs.
pub fn validate_claims(payload: &Value) -> Result<AccessTokenClaims, ClaimsRejection> {
    let object = payload.as_object().ok_or(ClaimsRejection::Malformed)?;

    let sub = required_str(object, "sub")?;
    let id = required_str(object, "id")?;
    let is_active = required_bool(object, "is_active")?;
    let is_superuser = required_bool(object, "is_superuser")?;
    let scopes = match object.get("scopes") {
        Some(Value::Array(items)) => items.clone(),
        Some(_) => return Err(ClaimsRejection::InvalidClaim("scopes")),
        None => return Err(ClaimsRejection::MissingClaim("scopes")),
    };

    let full_name = object
        .get("full_name")
        .and_then(Value::as_str)
        .map(str::to_owned);
    let exp = object.get("exp").and_then(|value| {
        value
            .as_i64()
            .or_else(|| value.as_f64().map(|secs| secs as i64))
    });

    Ok(AccessTokenClaims {
        sub,
        id,
        is_active,
        is_superuser,
        full_name,
        scopes,
        exp,
    })
}

fn required_str(object: &Map<String, Value>, key: &'static str) -> Result<String, ClaimsRejection> {
    match object.get(key) {
        Some(Value::String(value)) if !value.is_empty() => Ok(value.clone()),
        Some(Value::String(_)) | None | Some(Value::Null) => Err(ClaimsRejection::MissingClaim(key)),
        Some(_) => Err(ClaimsRejection::InvalidClaim(key)),
    }
}

fn required_bool(object: &Map<String, Value>, key: &'static str) -> Result<bool, ClaimsRejection> {
    match object.get(key) {
        Some(Value::Bool(value)) => Ok(*value),
        None | Some(Value::Null) => Err(ClaimsRejection::MissingClaim(key)),
        Some(_) => Err(ClaimsRejection::InvalidClaim(key)),
    }
}
