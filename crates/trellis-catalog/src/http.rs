//! Shared HTTP response helpers for catalog requests.
//!
//! Centralizes status-code checks (404 → [`CatalogError::NotFound`], 401/403 →
//! [`CatalogError::Unauthorized`], 429 with `Retry-After` parsing, other
//! non-success → [`CatalogError::Api`]) and body decoding, so endpoint modules
//! stay focused on request construction.

use serde::de::DeserializeOwned;

use crate::error::CatalogError;

/// Check an HTTP response for error statuses.
///
/// Returns the response unchanged on success.
pub async fn check_response(
    resp: reqwest::Response,
    path: &str,
) -> Result<reqwest::Response, CatalogError> {
    let status = resp.status().as_u16();
    match status {
        404 => Err(CatalogError::NotFound {
            path: path.to_string(),
        }),
        401 | 403 => Err(CatalogError::Unauthorized(format!(
            "{status} returned for {path}"
        ))),
        429 => Err(CatalogError::RateLimited {
            retry_after_secs: parse_retry_after(&resp),
        }),
        _ if !resp.status().is_success() => Err(CatalogError::Api {
            status,
            message: resp.text().await.unwrap_or_default(),
        }),
        _ => Ok(resp),
    }
}

/// Decode a checked response body.
///
/// Decoding goes through `serde_json` directly so shape mismatches surface as
/// [`CatalogError::Parse`] with the request path attached.
pub async fn decode<T: DeserializeOwned>(
    resp: reqwest::Response,
    path: &str,
) -> Result<T, CatalogError> {
    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| CatalogError::Parse(format!("{path}: {e}")))
}

/// Parse the `Retry-After` header as seconds, falling back to 60 s.
fn parse_retry_after(resp: &reqwest::Response) -> u64 {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(60)
}
