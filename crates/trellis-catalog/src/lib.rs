//! # trellis-catalog
//!
//! Typed read access to the external graph-shaped catalog.
//!
//! [`CatalogApi`] is the interface the resolvers consume; [`CatalogClient`]
//! is the reqwest-backed implementation. Every payload is decoded into the
//! `trellis_core::catalog` types here, at the boundary.
//!
//! Calls are awaited one at a time by the resolvers. There is no retry and no
//! response caching at this layer.

mod auth;
mod error;
mod http;
mod instances;
mod reports;
mod tables;

pub use error::CatalogError;

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use trellis_config::CatalogConfig;
use trellis_core::catalog::{
    CatalogNode, CatalogResource, RelatedResource, ViewQuery, ViewResult, VisualElement,
};

use crate::http::{check_response, decode};

// ── Interface ──────────────────────────────────────────────────────

/// Sample rows and their column names, as returned by [`CatalogApi::get_rows_cols`].
pub type RowsCols = (Vec<Vec<Value>>, Vec<String>);

/// Read operations against the catalog.
///
/// Implemented by [`CatalogClient`] and by in-memory fakes in tests.
#[allow(async_fn_in_trait)]
pub trait CatalogApi {
    /// Fetch one catalog instance by id.
    async fn get_instance(&self, id: &str) -> Result<CatalogNode, CatalogError>;

    /// List every instance matching a catalog filter expression.
    async fn list_instances(&self, filter: &str) -> Result<Vec<CatalogNode>, CatalogError>;

    /// Fetch a resource (e.g. a table) by its host-relative path.
    async fn get_resource(&self, path: &str) -> Result<CatalogResource, CatalogError>;

    /// Fetch a data store by its host-relative path.
    async fn get_data_source(&self, path: &str) -> Result<CatalogResource, CatalogError>;

    /// Run a relationship-graph query.
    async fn get_views(&self, query: &ViewQuery) -> Result<ViewResult, CatalogError>;

    /// Visual elements of the report at `report_uri`.
    async fn get_report_elements(
        &self,
        report_uri: &str,
    ) -> Result<Vec<VisualElement>, CatalogError>;

    /// Resources a report depends on. Accepts a bare report id or a report URI.
    async fn get_report_relationships(
        &self,
        report: &str,
    ) -> Result<Vec<RelatedResource>, CatalogError>;

    /// Up to `limit` sample rows of the table resource at `resource_path`.
    async fn get_rows_cols(&self, resource_path: &str, limit: u32)
    -> Result<RowsCols, CatalogError>;
}

// ── Wire types ─────────────────────────────────────────────────────

/// A paged collection response.
#[derive(Debug, Deserialize)]
pub(crate) struct Page<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(default)]
    count: Option<u64>,
}

// ── Client ─────────────────────────────────────────────────────────

/// HTTP client for the catalog REST API.
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    page_limit: u32,
    table_filter: String,
}

impl CatalogClient {
    /// Validate `config`, build the HTTP client and acquire a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Config`] for unusable settings and
    /// [`CatalogError::Unauthorized`] if the token exchange fails.
    pub async fn connect(config: &CatalogConfig) -> Result<Self, CatalogError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("trellis/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()?;
        let token = auth::acquire_token(&http, config).await?;
        tracing::info!(host = config.base_url(), "connected to catalog");

        Ok(Self {
            http,
            base_url: config.base_url().to_string(),
            token,
            page_limit: config.page_limit.max(1),
            table_filter: config.table_filter.clone(),
        })
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Connectivity probe: one authorized listing call with the table filter.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`CatalogError`] if the listing fails.
    pub async fn check_access(&self) -> Result<(), CatalogError> {
        let path = instances::list_path(&self.table_filter, 1, 0);
        let _: Page<Value> = self.get_json(&path).await?;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, CatalogError> {
        tracing::debug!(path, "GET");
        let resp = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        decode(check_response(resp, path).await?, path).await
    }

    async fn post_json<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        content_type: &str,
        body: &B,
    ) -> Result<T, CatalogError> {
        tracing::debug!(path, "POST");
        let payload =
            serde_json::to_vec(body).map_err(|e| CatalogError::Parse(format!("{path}: {e}")))?;
        let resp = self
            .http
            .post(self.url(path))
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header(reqwest::header::ACCEPT, "application/json")
            .body(payload)
            .send()
            .await?;
        decode(check_response(resp, path).await?, path).await
    }
}

impl CatalogApi for CatalogClient {
    async fn get_instance(&self, id: &str) -> Result<CatalogNode, CatalogError> {
        self.fetch_instance(id).await
    }

    async fn list_instances(&self, filter: &str) -> Result<Vec<CatalogNode>, CatalogError> {
        self.fetch_instances(filter).await
    }

    async fn get_resource(&self, path: &str) -> Result<CatalogResource, CatalogError> {
        self.fetch_resource(path).await
    }

    async fn get_data_source(&self, path: &str) -> Result<CatalogResource, CatalogError> {
        self.fetch_data_source(path).await
    }

    async fn get_views(&self, query: &ViewQuery) -> Result<ViewResult, CatalogError> {
        self.run_view_query(query).await
    }

    async fn get_report_elements(
        &self,
        report_uri: &str,
    ) -> Result<Vec<VisualElement>, CatalogError> {
        self.fetch_report_elements(report_uri).await
    }

    async fn get_report_relationships(
        &self,
        report: &str,
    ) -> Result<Vec<RelatedResource>, CatalogError> {
        self.fetch_report_relationships(report).await
    }

    async fn get_rows_cols(
        &self,
        resource_path: &str,
        limit: u32,
    ) -> Result<RowsCols, CatalogError> {
        self.fetch_rows_cols(resource_path, limit).await
    }
}

/// Join a base URL and a host-relative path with exactly one slash.
fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
