//! Lineage resolution for reports and data plans.
//!
//! Each report or data plan is resolved with a fresh [`TraversalState`].
//! Tables that cannot be resolved do not fail the traversal: they become
//! notes in the dashboard description.

use trellis_catalog::{CatalogApi, CatalogError};
use trellis_config::RelationshipIds;
use trellis_core::catalog::{CatalogNode, Relationship, VisualElement};
use trellis_core::entities::{ChartRecord, DashboardRecord, EntityRecord};
use trellis_core::fqn;
use trellis_core::lineage::{EntityRef, LineageEdge};

use crate::error::{IngestError, SinkError};
use crate::sink::EntitySink;
use crate::table::TableIngestor;

/// Visual element kinds emitted as charts.
pub const CHART_KINDS: [&str; 3] = ["Graph", "Text", "Table"];

const REPORTS_PREFIX: &str = "/reports/reports/";
const TABLE_SEGMENT: &str = "/tables/";

/// Strip a trailing parenthesized index: `"Revenue (2)"` → `"Revenue"`.
#[must_use]
pub fn normalize_chart_label(label: &str) -> &str {
    let label = label.trim();
    let Some(open) = label.rfind('(') else {
        return label;
    };
    let head = label[..open].trim_end();
    let is_index = label[open + 1..]
        .strip_suffix(')')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()));
    if is_index && !head.is_empty() { head } else { label }
}

/// Normalize labels and drop repeats, keeping first-seen order.
#[must_use]
pub fn dedupe_chart_labels<'l>(labels: impl IntoIterator<Item = &'l str>) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for label in labels {
        let name = normalize_chart_label(label);
        if !name.is_empty() && !names.iter().any(|seen| seen == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Per-traversal accumulator: resolved tables, chart names, and notes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TraversalState {
    pub table_fqns: Vec<String>,
    pub chart_names: Vec<String>,
    pub notes: Vec<String>,
}

impl TraversalState {
    fn add_table(&mut self, fqn: String) {
        if !self.table_fqns.contains(&fqn) {
            self.table_fqns.push(fqn);
        }
    }

    fn note(&mut self, note: String) {
        self.notes.push(note);
    }

    /// Human-readable description listing what could not be resolved.
    #[must_use]
    pub fn description(&self) -> Option<String> {
        if self.notes.is_empty() {
            None
        } else {
            Some(format!("Unresolved lineage: {}", self.notes.join("; ")))
        }
    }
}

/// Everything emitted for one report or data plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardLineage {
    pub dashboard: DashboardRecord,
    pub charts: Vec<ChartRecord>,
    pub edges: Vec<LineageEdge>,
    pub state: TraversalState,
}

/// Upsert charts, then the dashboard, then its edges.
///
/// # Errors
///
/// Returns the first [`SinkError`].
pub fn emit_lineage<S: EntitySink>(lineage: &DashboardLineage, sink: &mut S) -> Result<(), SinkError> {
    for chart in &lineage.charts {
        sink.upsert(EntityRecord::Chart(chart.clone()))?;
    }
    sink.upsert(EntityRecord::Dashboard(lineage.dashboard.clone()))?;
    for edge in &lineage.edges {
        sink.upsert(EntityRecord::Lineage(edge.clone()))?;
    }
    tracing::info!(
        dashboard = %lineage.dashboard.fqn,
        charts = lineage.charts.len(),
        edges = lineage.edges.len(),
        unresolved = lineage.state.notes.len(),
        "emitted lineage"
    );
    Ok(())
}

#[derive(Clone, Copy)]
enum Flow {
    Input,
    Output,
}

/// Resolves reports and data plans into dashboards and lineage edges.
pub struct LineageResolver<'a, C> {
    catalog: &'a C,
    relationships: RelationshipIds,
    service: String,
    base_url: Option<String>,
}

impl<'a, C: CatalogApi> LineageResolver<'a, C> {
    /// `service` owns the emitted dashboards and charts.
    #[must_use]
    pub fn new(catalog: &'a C, relationships: &RelationshipIds, service: &str) -> Self {
        Self {
            catalog,
            relationships: relationships.clone(),
            service: service.to_string(),
            base_url: None,
        }
    }

    /// Host used to build dashboard source links.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.trim_end_matches('/').to_string());
        self
    }

    /// Resolve a report: supported charts and a table → dashboard edge per
    /// table the report reads.
    ///
    /// # Errors
    ///
    /// Catalog errors from the element and relationship listings, fatal
    /// errors from table ingestion, and fqn failures.
    pub async fn report_lineage<S: EntitySink>(
        &self,
        report: &CatalogNode,
        tables: &mut TableIngestor<'_, C>,
        sink: &mut S,
    ) -> Result<DashboardLineage, IngestError> {
        let report_uri = report
            .resource_path
            .clone()
            .unwrap_or_else(|| format!("{REPORTS_PREFIX}{}", report.id));
        let dashboard_fqn = fqn::build(&[self.service.as_str(), report.id.as_str()])?;
        let mut state = TraversalState::default();
        tracing::debug!(node_id = %report.id, uri = %report_uri, "resolving report lineage");

        let elements = match self.catalog.get_report_elements(&report_uri).await {
            Ok(elements) => elements,
            Err(CatalogError::NotFound { path }) => {
                state.note(format!("report content not found at {path}"));
                Vec::new()
            }
            Err(error) => return Err(error.into()),
        };
        let charts = self.charts(&report.id, &elements, &mut state)?;

        for related in self.catalog.get_report_relationships(&report_uri).await? {
            let uri = related.related_resource_uri;
            if !uri.contains(TABLE_SEGMENT) {
                tracing::debug!(node_id = %report.id, %uri, "related resource is not a table");
                continue;
            }
            match self.table_for_uri(&uri, tables, sink).await {
                Ok(Some(fqn)) => state.add_table(fqn),
                Ok(None) => state.note(format!("table {uri} not found")),
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => {
                    tracing::warn!(node_id = %report.id, %uri, %error, "report table unresolved");
                    state.note(format!("table {uri}: {error}"));
                }
            }
        }

        let edges = state
            .table_fqns
            .iter()
            .map(|table| LineageEdge::new(EntityRef::table(table), EntityRef::dashboard(&dashboard_fqn)))
            .collect();
        let dashboard = DashboardRecord {
            name: report.id.clone(),
            display_name: report.name.clone(),
            service: self.service.clone(),
            charts: charts.iter().map(|chart| chart.fqn.clone()).collect(),
            description: state.description(),
            source_url: self
                .base_url
                .as_ref()
                .map(|base| format!("{base}/links/resources/report?uri={report_uri}")),
            fqn: dashboard_fqn,
        };
        Ok(DashboardLineage {
            dashboard,
            charts,
            edges,
            state,
        })
    }

    /// Resolve a data plan: table → dashboard for each input asset and
    /// dashboard → table for each output asset.
    ///
    /// # Errors
    ///
    /// Fatal errors from table ingestion and fqn failures.
    pub async fn data_plan_lineage<S: EntitySink>(
        &self,
        plan: &CatalogNode,
        tables: &mut TableIngestor<'_, C>,
        sink: &mut S,
    ) -> Result<DashboardLineage, IngestError> {
        let dashboard_fqn = fqn::build(&[self.service.as_str(), plan.id.as_str()])?;
        let dashboard = EntityRef::dashboard(&dashboard_fqn);
        let mut state = TraversalState::default();
        let mut edges = Vec::new();

        let assets = plan
            .relationships_of(&self.relationships.data_plan_input)
            .map(|edge| (edge, Flow::Input))
            .chain(
                plan.relationships_of(&self.relationships.data_plan_output)
                    .map(|edge| (edge, Flow::Output)),
            );
        for (asset, flow) in assets {
            let fqn = match self.table_for_asset(asset, tables, sink).await {
                Ok(Some(fqn)) => fqn,
                Ok(None) => {
                    state.note(format!("asset {} not found", asset.endpoint_node_id));
                    continue;
                }
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => {
                    tracing::warn!(
                        node_id = %plan.id,
                        asset = %asset.endpoint_node_id,
                        %error,
                        "data plan asset unresolved"
                    );
                    state.note(format!("asset {}: {error}", asset.endpoint_node_id));
                    continue;
                }
            };
            let edge = match flow {
                Flow::Input => LineageEdge::new(EntityRef::table(&fqn), dashboard.clone()),
                Flow::Output => LineageEdge::new(dashboard.clone(), EntityRef::table(&fqn)),
            };
            if !edges.contains(&edge) {
                edges.push(edge);
            }
            state.add_table(fqn);
        }

        let dashboard = DashboardRecord {
            name: plan.id.clone(),
            display_name: plan.name.clone(),
            service: self.service.clone(),
            charts: Vec::new(),
            description: state.description(),
            source_url: None,
            fqn: dashboard_fqn,
        };
        Ok(DashboardLineage {
            dashboard,
            charts: Vec::new(),
            edges,
            state,
        })
    }

    fn charts(
        &self,
        report_id: &str,
        elements: &[VisualElement],
        state: &mut TraversalState,
    ) -> Result<Vec<ChartRecord>, IngestError> {
        let supported: Vec<(&str, &str)> = elements
            .iter()
            .filter(|element| CHART_KINDS.contains(&element.kind.as_str()))
            .filter_map(|element| {
                element
                    .label
                    .as_deref()
                    .map(str::trim)
                    .filter(|label| !label.is_empty())
                    .map(|label| (label, element.kind.as_str()))
            })
            .collect();

        state.chart_names = dedupe_chart_labels(supported.iter().map(|(label, _)| *label));
        state
            .chart_names
            .iter()
            .map(|name| -> Result<ChartRecord, IngestError> {
                let chart_type = supported
                    .iter()
                    .find(|(label, _)| normalize_chart_label(label) == name.as_str())
                    .map_or("Graph", |&(_, kind)| kind);
                Ok(ChartRecord {
                    name: name.clone(),
                    display_name: name.clone(),
                    chart_type: chart_type.to_string(),
                    service: self.service.clone(),
                    fqn: fqn::build(&[self.service.as_str(), report_id, name.as_str()])?,
                })
            })
            .collect()
    }

    /// Table behind a related-resource URI: cache, then lookup by resource
    /// id, then lookup by the last path segment as a name.
    async fn table_for_uri<S: EntitySink>(
        &self,
        uri: &str,
        tables: &mut TableIngestor<'_, C>,
        sink: &mut S,
    ) -> Result<Option<String>, IngestError> {
        if let Some(fqn) = tables.fqn_for_resource(uri) {
            return Ok(Some(fqn.to_string()));
        }
        match self.catalog.list_instances(&eq_filter("resourceId", uri)).await {
            Ok(candidates) => {
                if let Some(node) = candidates.first() {
                    return tables.ingest(node, sink).await.map(Some);
                }
            }
            Err(error) => {
                let error = IngestError::from(error);
                if error.is_fatal() {
                    return Err(error);
                }
                tracing::warn!(%uri, %error, "lookup by resource id failed; trying name");
            }
        }
        match uri.rsplit('/').next().filter(|name| !name.is_empty()) {
            Some(name) => self.table_by_name(name, tables, sink).await,
            None => Ok(None),
        }
    }

    /// Table behind a data-plan asset edge: cache, then the instance itself,
    /// then lookup by the edge's endpoint name.
    async fn table_for_asset<S: EntitySink>(
        &self,
        asset: &Relationship,
        tables: &mut TableIngestor<'_, C>,
        sink: &mut S,
    ) -> Result<Option<String>, IngestError> {
        let id = asset.endpoint_node_id.as_str();
        if let Some(fqn) = tables.fqn_for_id(id) {
            return Ok(Some(fqn.to_string()));
        }
        match self.catalog.get_instance(id).await {
            Ok(node) => tables.ingest(&node, sink).await.map(Some),
            Err(CatalogError::NotFound { .. }) => match asset.endpoint_name.as_deref() {
                Some(name) => self.table_by_name(name, tables, sink).await,
                None => Ok(None),
            },
            Err(error) => Err(error.into()),
        }
    }

    async fn table_by_name<S: EntitySink>(
        &self,
        name: &str,
        tables: &mut TableIngestor<'_, C>,
        sink: &mut S,
    ) -> Result<Option<String>, IngestError> {
        tracing::debug!(name, "looking up table by name");
        let candidates = self.catalog.list_instances(&eq_filter("name", name)).await?;
        if candidates.len() > 1 {
            tracing::warn!(name, count = candidates.len(), "several tables share this name; using the first");
        }
        match candidates.first() {
            Some(node) => tables.ingest(node, sink).await.map(Some),
            None => Ok(None),
        }
    }
}

/// `eq(field,'value')` with backslashes and single quotes in `value` escaped.
fn eq_filter(field: &str, value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("eq({field},'{escaped}')")
}
