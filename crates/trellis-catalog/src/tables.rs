//! Resource endpoints: table resources, data stores, and sample rows.

use serde::Deserialize;
use serde_json::Value;
use trellis_core::catalog::CatalogResource;

use crate::{CatalogClient, Page, RowsCols, error::CatalogError};

const DATA_TABLES_PREFIX: &str = "/dataTables/";
const ROW_SETS_PREFIX: &str = "/rowSets/";

#[derive(Deserialize)]
struct ColumnItem {
    name: String,
}

#[derive(Deserialize)]
struct RowItem {
    #[serde(default)]
    cells: Vec<Value>,
}

/// Row-set path mirroring a data-table path.
pub(crate) fn rows_path(resource_path: &str, limit: u32) -> String {
    let base = resource_path
        .strip_prefix(DATA_TABLES_PREFIX)
        .map_or_else(
            || format!("{}/rows", resource_path.trim_end_matches('/')),
            |rest| format!("{ROW_SETS_PREFIX}{}/rows", rest.trim_end_matches('/')),
        );
    format!("{base}?limit={limit}")
}

pub(crate) fn columns_path(resource_path: &str, limit: u32) -> String {
    format!("{}/columns?limit={limit}", resource_path.trim_end_matches('/'))
}

impl CatalogClient {
    /// Fetch a resource by host-relative path.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if nothing lives at `path`, or
    /// another [`CatalogError`] on transport, status, or parse failures.
    pub async fn fetch_resource(&self, path: &str) -> Result<CatalogResource, CatalogError> {
        self.get_json(path).await
    }

    /// Fetch a data store by host-relative path.
    ///
    /// # Errors
    ///
    /// Same as [`Self::fetch_resource`].
    pub async fn fetch_data_source(&self, path: &str) -> Result<CatalogResource, CatalogError> {
        self.get_json(path).await
    }

    /// Fetch column names and up to `limit` rows for a table resource.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if either request fails.
    pub async fn fetch_rows_cols(
        &self,
        resource_path: &str,
        limit: u32,
    ) -> Result<RowsCols, CatalogError> {
        let columns: Page<ColumnItem> = self
            .get_json(&columns_path(resource_path, self.page_limit))
            .await?;
        let rows: Page<RowItem> = self.get_json(&rows_path(resource_path, limit)).await?;
        Ok((
            rows.items.into_iter().map(|r| r.cells).collect(),
            columns.items.into_iter().map(|c| c.name).collect(),
        ))
    }
}
