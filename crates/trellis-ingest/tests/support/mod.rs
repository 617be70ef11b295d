//! In-memory catalog shared by the ingest integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use serde_json::json;
use trellis_catalog::{CatalogApi, CatalogError, RowsCols};
use trellis_config::{DATA_PLAN_INPUT, DATA_PLAN_OUTPUT, DATA_STORE_MEMBERSHIP};
use trellis_core::catalog::{
    CatalogNode, CatalogResource, RelatedResource, ViewQuery, ViewResult, VisualElement,
};

pub const STORE_URI: &str = "/dataSources/providers/cas/sources/cas-shared-default~fs~Public";
pub const PARENT_URI: &str = "/dataSources/providers/cas/sources/cas-shared-default";
pub const STORE_INSTANCE: &str = "store-public";
pub const TABLE_FILTER: &str = "contains(name,'Table')";
pub const REPORT_FILTER: &str = "eq(type,'report')";
pub const DATA_PLAN_FILTER: &str = "eq(type,'dataPlan')";

pub fn table_path(name: &str) -> String {
    format!("/dataTables/dataSources/cas~fs~cas-shared-default~fs~Public/tables/{name}")
}

pub fn node(value: serde_json::Value) -> CatalogNode {
    CatalogNode::from_value(value).unwrap()
}

fn resource(value: serde_json::Value) -> CatalogResource {
    serde_json::from_value(value).unwrap()
}

/// Catalog fake. Anything not registered answers with `NotFound`.
#[derive(Default)]
pub struct FakeCatalog {
    pub instances: HashMap<String, CatalogNode>,
    pub resources: HashMap<String, CatalogResource>,
    pub listings: HashMap<String, Vec<CatalogNode>>,
    pub columns: HashMap<String, Vec<CatalogNode>>,
    pub elements: HashMap<String, Vec<VisualElement>>,
    pub related: HashMap<String, Vec<RelatedResource>>,
    pub rows: HashMap<String, RowsCols>,
    /// Listing filters answered with `NotFound`.
    pub failing_listings: HashSet<String>,
    pub reject_auth: bool,
    calls: RefCell<Vec<String>>,
}

impl FakeCatalog {
    /// A catalog with the Public data store of `cas-shared-default`,
    /// reachable both through resource links and as an instance.
    pub fn with_public_store() -> Self {
        let mut catalog = Self::default();
        catalog.resources.insert(
            STORE_URI.into(),
            resource(json!({
                "id": "cas-shared-default~fs~Public",
                "name": "Public",
                "providerId": "cas",
                "links": [{"rel": "parent", "uri": PARENT_URI}]
            })),
        );
        catalog.resources.insert(
            PARENT_URI.into(),
            resource(json!({"id": "cas-shared-default", "name": "cas-shared-default", "providerId": "cas"})),
        );
        catalog.instances.insert(
            STORE_INSTANCE.into(),
            node(json!({
                "id": STORE_INSTANCE,
                "name": "Public",
                "type": "casLibrary",
                "attributes": {"providerId": "cas"},
                "links": [{"rel": "parent", "uri": PARENT_URI}]
            })),
        );
        catalog
    }

    /// Register a table instance with two columns. With `linked`, its
    /// resource carries a `dataSource` link; otherwise the resource is
    /// missing and only the membership edge leads to the data store.
    pub fn add_table(&mut self, id: &str, name: &str, linked: bool) -> CatalogNode {
        let path = table_path(name);
        let table = node(json!({
            "id": id,
            "name": name,
            "type": "casTable",
            "resourceId": path,
            "attributes": {"rowCount": 100, "columnCount": 2},
            "relationships": [
                {"definitionId": DATA_STORE_MEMBERSHIP, "endpointId": STORE_INSTANCE, "endpointName": "Public"}
            ]
        }));
        if linked {
            self.resources.insert(
                path.clone(),
                resource(json!({
                    "id": id,
                    "name": name,
                    "links": [{"rel": "dataSource", "uri": STORE_URI}]
                })),
            );
        }
        self.columns.insert(
            id.into(),
            vec![
                node(json!({
                    "id": format!("{id}-c1"),
                    "name": "Make",
                    "type": "dataField",
                    "attributes": {"casDataType": "varchar(20)", "ordinalPosition": 1, "distinctCount": 25}
                })),
                node(json!({
                    "id": format!("{id}-c2"),
                    "name": "MSRP",
                    "type": "dataField",
                    "attributes": {"casDataType": "num", "ordinalPosition": 2, "mean": 42.5, "uniquenessPercent": 80}
                })),
            ],
        );
        self.instances.insert(id.into(), table.clone());
        self.listings
            .entry(format!("eq(resourceId,'{path}')"))
            .or_default()
            .push(table.clone());
        self.listings
            .entry(format!("eq(name,'{name}')"))
            .or_default()
            .push(table.clone());
        self.listings
            .entry(TABLE_FILTER.into())
            .or_default()
            .push(table.clone());
        table
    }

    pub fn add_report(
        &mut self,
        id: &str,
        name: &str,
        elements: &[(&str, &str)],
        tables: &[&str],
    ) -> CatalogNode {
        let uri = format!("/reports/reports/{id}");
        let report = node(json!({"id": id, "name": name, "type": "report", "resourceId": uri}));
        self.elements.insert(
            uri.clone(),
            elements
                .iter()
                .map(|(kind, label)| VisualElement {
                    name: format!("ve-{label}"),
                    kind: (*kind).to_string(),
                    label: Some((*label).to_string()),
                })
                .collect(),
        );
        self.related.insert(
            uri,
            tables
                .iter()
                .map(|table| RelatedResource {
                    related_resource_uri: table_path(table),
                    kind: Some("Dependent".into()),
                })
                .collect(),
        );
        self.listings
            .entry(REPORT_FILTER.into())
            .or_default()
            .push(report.clone());
        report
    }

    pub fn add_data_plan(&mut self, id: &str, inputs: &[&str], outputs: &[&str]) -> CatalogNode {
        let edges = inputs
            .iter()
            .map(|asset| json!({"definitionId": DATA_PLAN_INPUT, "endpointId": asset}))
            .chain(
                outputs
                    .iter()
                    .map(|asset| json!({"definitionId": DATA_PLAN_OUTPUT, "endpointId": asset})),
            )
            .collect::<Vec<_>>();
        let plan = node(json!({"id": id, "name": format!("Plan {id}"), "type": "dataPlan", "relationships": edges}));
        self.listings
            .entry(DATA_PLAN_FILTER.into())
            .or_default()
            .push(plan.clone());
        plan
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn calls_to(&self, operation: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.split(' ').next() == Some(operation))
            .count()
    }

    fn record(&self, call: String) -> Result<(), CatalogError> {
        self.calls.borrow_mut().push(call);
        if self.reject_auth {
            return Err(CatalogError::Unauthorized("token rejected".into()));
        }
        Ok(())
    }
}

fn missing(path: &str) -> CatalogError {
    CatalogError::NotFound {
        path: path.to_string(),
    }
}

impl CatalogApi for FakeCatalog {
    async fn get_instance(&self, id: &str) -> Result<CatalogNode, CatalogError> {
        self.record(format!("get_instance {id}"))?;
        self.instances.get(id).cloned().ok_or_else(|| missing(id))
    }

    async fn list_instances(&self, filter: &str) -> Result<Vec<CatalogNode>, CatalogError> {
        self.record(format!("list_instances {filter}"))?;
        if self.failing_listings.contains(filter) {
            return Err(missing(filter));
        }
        Ok(self.listings.get(filter).cloned().unwrap_or_default())
    }

    async fn get_resource(&self, path: &str) -> Result<CatalogResource, CatalogError> {
        self.record(format!("get_resource {path}"))?;
        self.resources.get(path).cloned().ok_or_else(|| missing(path))
    }

    async fn get_data_source(&self, path: &str) -> Result<CatalogResource, CatalogError> {
        self.record(format!("get_data_source {path}"))?;
        self.resources.get(path).cloned().ok_or_else(|| missing(path))
    }

    async fn get_views(&self, query: &ViewQuery) -> Result<ViewResult, CatalogError> {
        let id = query
            .parameters
            .get("id")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default();
        self.record(format!("get_views {id}"))?;
        Ok(ViewResult {
            entities: self.columns.get(id).cloned().unwrap_or_default(),
        })
    }

    async fn get_report_elements(
        &self,
        report_uri: &str,
    ) -> Result<Vec<VisualElement>, CatalogError> {
        self.record(format!("get_report_elements {report_uri}"))?;
        self.elements
            .get(report_uri)
            .cloned()
            .ok_or_else(|| missing(report_uri))
    }

    async fn get_report_relationships(
        &self,
        report: &str,
    ) -> Result<Vec<RelatedResource>, CatalogError> {
        self.record(format!("get_report_relationships {report}"))?;
        Ok(self.related.get(report).cloned().unwrap_or_default())
    }

    async fn get_rows_cols(
        &self,
        resource_path: &str,
        limit: u32,
    ) -> Result<RowsCols, CatalogError> {
        self.record(format!("get_rows_cols {resource_path} {limit}"))?;
        self.rows
            .get(resource_path)
            .cloned()
            .ok_or_else(|| missing(resource_path))
    }
}
