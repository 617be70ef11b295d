//! Catalog instance endpoints: lookup, filtered listing, graph views.

use serde_json::Value;
use trellis_core::catalog::{CatalogNode, ViewQuery, ViewResult};

use crate::{CatalogClient, Page, error::CatalogError};

const INSTANCES_PATH: &str = "/catalog/instances";
const VIEW_QUERY_MEDIA_TYPE: &str = "application/vnd.sas.metadata.instance.query+json";

/// Listing path for one page of instances matching `filter`.
pub(crate) fn list_path(filter: &str, limit: u32, start: u64) -> String {
    format!(
        "{INSTANCES_PATH}?filter={}&limit={limit}&start={start}",
        urlencoding::encode(filter)
    )
}

/// Decode listed items one by one; malformed items are logged and dropped so
/// one bad instance does not hide the rest of the page.
fn decode_items(items: Vec<Value>) -> Vec<CatalogNode> {
    items
        .into_iter()
        .filter_map(|item| match CatalogNode::from_value(item) {
            Ok(node) => Some(node),
            Err(error) => {
                tracing::warn!(%error, "skipping malformed catalog instance");
                None
            }
        })
        .collect()
}

/// Whether a listing is complete after a page of `fetched` items.
///
/// A reported `count` is authoritative: servers may cap pages below the
/// requested limit. Without one, a short page ends the listing.
fn listing_exhausted(fetched: u64, page_limit: u32, start: u64, count: Option<u64>) -> bool {
    if fetched == 0 {
        return true;
    }
    match count {
        Some(total) => start >= total,
        None => fetched < u64::from(page_limit),
    }
}

impl CatalogClient {
    /// Fetch one instance by id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if the id is unknown, or another
    /// [`CatalogError`] on transport, status, or parse failures.
    pub async fn fetch_instance(&self, id: &str) -> Result<CatalogNode, CatalogError> {
        let path = format!("{INSTANCES_PATH}/{}", urlencoding::encode(id));
        self.get_json(&path).await
    }

    /// List all instances matching `filter`, following pages until exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if any page request fails.
    pub async fn fetch_instances(&self, filter: &str) -> Result<Vec<CatalogNode>, CatalogError> {
        let mut nodes = Vec::new();
        let mut start = 0u64;
        loop {
            let path = list_path(filter, self.page_limit, start);
            let page: Page<Value> = self.get_json(&path).await?;
            let fetched = page.items.len() as u64;
            nodes.extend(decode_items(page.items));
            start += fetched;

            if listing_exhausted(fetched, self.page_limit, start, page.count) {
                break;
            }
        }
        tracing::debug!(filter, count = nodes.len(), "listed catalog instances");
        Ok(nodes)
    }

    /// Run a relationship-graph query.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] on transport, status, or parse failures.
    pub async fn run_view_query(&self, query: &ViewQuery) -> Result<ViewResult, CatalogError> {
        self.post_json(INSTANCES_PATH, VIEW_QUERY_MEDIA_TYPE, query)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const FIXTURE: &str = r#"{
        "count": 2,
        "items": [
            {
                "id": "0f2b6c3e",
                "name": "CARS",
                "type": "casTable",
                "resourceId": "/dataTables/dataSources/cas~fs~cas-shared-default~fs~Public/tables/CARS",
                "attributes": {"rowCount": 428},
                "relationships": []
            },
            {"name": "no id here"}
        ]
    }"#;

    #[test]
    fn list_path_encodes_filter() {
        assert_eq!(
            list_path("contains(name,'Table')", 100, 200),
            "/catalog/instances?filter=contains%28name%2C%27Table%27%29&limit=100&start=200"
        );
    }

    #[test]
    fn page_items_decode_and_skip_malformed() {
        let page: Page<Value> = serde_json::from_str(FIXTURE).unwrap();
        assert_eq!(page.count, Some(2));
        let nodes = decode_items(page.items);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].name, "CARS");
        assert!(nodes[0].has_type("casTable"));
    }

    #[test]
    fn capped_pages_keep_listing_while_count_remains() {
        // Server caps pages at 100 while 250 instances exist.
        let mut start = 0;
        let mut requests = 0;
        loop {
            let fetched = (250 - start).min(100);
            start += fetched;
            requests += 1;
            if listing_exhausted(fetched, 1000, start, Some(250)) {
                break;
            }
        }
        assert_eq!(start, 250);
        assert_eq!(requests, 3);
    }

    #[test]
    fn listing_stops_on_empty_page_even_if_count_is_higher() {
        assert!(listing_exhausted(0, 1000, 40, Some(90)));
    }

    #[test]
    fn short_page_ends_listing_without_count() {
        assert!(listing_exhausted(12, 1000, 12, None));
        assert!(!listing_exhausted(1000, 1000, 1000, None));
    }

    #[test]
    fn view_result_decodes_entities() {
        let result: ViewResult = serde_json::from_value(json!({
            "entities": [
                {"id": "c1", "name": "Make", "type": ["dataField"], "attributes": {"casDataType": "varchar"}}
            ],
            "links": []
        }))
        .unwrap();
        assert_eq!(result.entities.len(), 1);
        assert!(result.entities[0].has_type("dataField"));
    }
}
