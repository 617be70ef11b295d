//! Report endpoints: visual elements and report → resource relationships.

use trellis_core::catalog::{RelatedResource, VisualElement};

use crate::{CatalogClient, Page, error::CatalogError};

const REPORTS_PREFIX: &str = "/reports/reports/";
const RELATIONSHIPS_PATH: &str = "/reports/commons/relationships";

/// Report URI for a bare report id; URIs pass through unchanged.
pub(crate) fn report_uri(report: &str) -> String {
    if report.starts_with('/') {
        report.to_string()
    } else {
        format!("{REPORTS_PREFIX}{report}")
    }
}

pub(crate) fn relationships_path(report: &str) -> String {
    format!(
        "{RELATIONSHIPS_PATH}?resourceUri={}",
        urlencoding::encode(&report_uri(report))
    )
}

pub(crate) fn elements_path(report: &str) -> String {
    format!(
        "{}/content/elements?characteristics=visualElement",
        report_uri(report).trim_end_matches('/')
    )
}

impl CatalogClient {
    /// Visual elements of a report.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if the report is gone, or another
    /// [`CatalogError`] on transport, status, or parse failures.
    pub async fn fetch_report_elements(
        &self,
        report: &str,
    ) -> Result<Vec<VisualElement>, CatalogError> {
        let page: Page<VisualElement> = self.get_json(&elements_path(report)).await?;
        Ok(page.items)
    }

    /// Resources the report reads from.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] on transport, status, or parse failures.
    pub async fn fetch_report_relationships(
        &self,
        report: &str,
    ) -> Result<Vec<RelatedResource>, CatalogError> {
        let page: Page<RelatedResource> = self.get_json(&relationships_path(report)).await?;
        Ok(page.items)
    }
}
