//! Bearer token acquisition.
//!
//! A pre-minted token from configuration is used as-is. Otherwise the
//! username/password pair is exchanged at the logon service with the OAuth
//! password grant. Any failure here is reported as
//! [`CatalogError::Unauthorized`], which callers treat as fatal.

use base64::Engine as _;
use trellis_config::CatalogConfig;

use crate::error::CatalogError;

pub(crate) const TOKEN_PATH: &str = "/SASLogon/oauth/token";

#[derive(serde::Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// `Authorization` header value for the OAuth client (empty secret).
pub(crate) fn client_basic_auth(client_id: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{client_id}:"));
    format!("Basic {encoded}")
}

/// URL-encoded password-grant form body.
pub(crate) fn password_grant_form(username: &str, password: &str) -> String {
    format!(
        "grant_type=password&username={}&password={}",
        urlencoding::encode(username),
        urlencoding::encode(password)
    )
}

/// Resolve the bearer token for `config`.
pub(crate) async fn acquire_token(
    http: &reqwest::Client,
    config: &CatalogConfig,
) -> Result<String, CatalogError> {
    if config.has_token() {
        return Ok(config.access_token.clone());
    }
    if !config.has_password() {
        return Err(CatalogError::Unauthorized(
            "no access token or username/password configured".into(),
        ));
    }

    let url = format!("{}{TOKEN_PATH}", config.base_url());
    tracing::debug!(%url, user = %config.username, "exchanging password for access token");
    let resp = http
        .post(&url)
        .header(
            reqwest::header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        )
        .header(
            reqwest::header::AUTHORIZATION,
            client_basic_auth(&config.client_id),
        )
        .body(password_grant_form(&config.username, &config.password))
        .send()
        .await?;

    if !resp.status().is_success() {
        return Err(CatalogError::Unauthorized(format!(
            "token exchange returned {}",
            resp.status().as_u16()
        )));
    }

    let body = resp.text().await?;
    let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
        CatalogError::Unauthorized(format!("token response had no access_token: {e}"))
    })?;
    Ok(token.access_token)
}
