use std::future::Future;

use tracing::{debug, warn};

use super::{errors::BackendError, models::TokenPair, service::AuthBackend};

#[derive(Debug)]
pub struct Fetched<T> {
    pub result: Result<T, BackendError>,
    /// Set when the call was retried with freshly issued credentials.
    pub rotated: Option<TokenPair>,
}

/// Runs a bearer-authenticated backend call. A 401 triggers one refresh and
/// one retry with the new access token; any other outcome is returned as-is.
pub async fn fetch_with_refresh<T, F, Fut>(
    backend: &dyn AuthBackend,
    access_token: Option<String>,
    refresh_token: Option<&str>,
    mut call: F,
) -> Fetched<T>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<T, BackendError>>,
{
    let first = call(access_token).await;
    if !matches!(&first, Err(err) if err.is_unauthorized()) {
        return Fetched {
            result: first,
            rotated: None,
        };
    }

    let Some(refresh_token) = refresh_token else {
        return Fetched {
            result: first,
            rotated: None,
        };
    };

    match backend.refresh(refresh_token).await {
        Ok(pair) => {
            debug!("retrying backend call with refreshed access token");
            let result = call(Some(pair.access_token.clone())).await;
            Fetched {
                result,
                rotated: Some(pair),
            }
        }
        Err(err) => {
            warn!(%err, "token refresh after 401 failed");
            Fetched {
                result: first,
                rotated: None,
            }
        }
    }
}
