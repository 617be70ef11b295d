//! The ingestion run: tables first, then report and data-plan lineage.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use trellis_catalog::CatalogApi;
use trellis_config::TrellisConfig;
use trellis_core::catalog::CatalogNode;
use trellis_core::entities::{EntityRecord, ServiceKind, ServiceRecord};

use crate::error::IngestError;
use crate::hierarchy::HierarchyResolver;
use crate::lineage::{DashboardLineage, LineageResolver, emit_lineage};
use crate::sink::EntitySink;
use crate::table::{TableIngestor, TableOptions};

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub tables_ingested: usize,
    pub tables_skipped: usize,
    pub dashboards: usize,
    pub dashboards_skipped: usize,
    pub lineage_edges: usize,
    pub unresolved: usize,
    pub cancelled: bool,
}

#[derive(Clone, Copy)]
enum LineageSource {
    Report,
    DataPlan,
}

impl LineageSource {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Report => "report",
            Self::DataPlan => "data plan",
        }
    }
}

/// One ingestion run against a catalog.
///
/// Entities are processed one at a time. A failing entity is logged and
/// skipped; only fatal errors (authentication, sink) end the run early.
pub struct IngestRun<'a, C> {
    catalog: &'a C,
    config: &'a TrellisConfig,
    base_url: Option<String>,
    cancel: Arc<AtomicBool>,
}

impl<'a, C: CatalogApi> IngestRun<'a, C> {
    #[must_use]
    pub fn new(catalog: &'a C, config: &'a TrellisConfig) -> Self {
        Self {
            catalog,
            config,
            base_url: None,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Host used for dashboard source links.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.to_string());
        self
    }

    /// Share an externally owned cancellation flag.
    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Flag checked between top-level entities; set it to stop the run.
    #[must_use]
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Run to completion (or cancellation) and flush the sink.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`IngestError`]; the sink is not flushed then.
    pub async fn execute<S: EntitySink>(&self, sink: &mut S) -> Result<RunSummary, IngestError> {
        let mut summary = RunSummary::default();
        let hierarchy = HierarchyResolver::new(
            self.catalog,
            &self.config.relationships,
            &self.config.sink.database_service,
        );
        let mut tables =
            TableIngestor::new(self.catalog, hierarchy, TableOptions::from(&self.config.ingest));

        let table_nodes = self.list(&self.config.catalog.table_filter, "tables").await?;
        tracing::info!(count = table_nodes.len(), "discovered tables");
        for node in &table_nodes {
            if self.cancelled() {
                summary.cancelled = true;
                break;
            }
            match tables.ingest(node, sink).await {
                Ok(_) => {}
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => {
                    tracing::warn!(node_id = %node.id, %error, "skipping table");
                    summary.tables_skipped += 1;
                }
            }
        }

        if self.config.ingest.include_lineage && !summary.cancelled {
            self.resolve_lineage(&mut tables, sink, &mut summary).await?;
        }
        summary.tables_ingested = tables.ingested();

        sink.flush()?;
        tracing::info!(
            tables = summary.tables_ingested,
            skipped = summary.tables_skipped,
            dashboards = summary.dashboards,
            edges = summary.lineage_edges,
            cancelled = summary.cancelled,
            "ingestion finished"
        );
        Ok(summary)
    }

    async fn resolve_lineage<S: EntitySink>(
        &self,
        tables: &mut TableIngestor<'a, C>,
        sink: &mut S,
        summary: &mut RunSummary,
    ) -> Result<(), IngestError> {
        let service = &self.config.sink.dashboard_service;
        let mut resolver = LineageResolver::new(self.catalog, &self.config.relationships, service);
        if let Some(base_url) = &self.base_url {
            resolver = resolver.with_base_url(base_url);
        }
        sink.upsert(EntityRecord::Service(ServiceRecord {
            name: service.clone(),
            kind: ServiceKind::Dashboard,
        }))?;

        let sources = [
            (LineageSource::Report, &self.config.catalog.report_filter),
            (LineageSource::DataPlan, &self.config.catalog.data_plan_filter),
        ];
        for (source, filter) in sources {
            let nodes = self.list(filter, source.as_str()).await?;
            tracing::info!(count = nodes.len(), kind = source.as_str(), "discovered lineage sources");
            for node in &nodes {
                if self.cancelled() {
                    summary.cancelled = true;
                    return Ok(());
                }
                match self.lineage_for(&resolver, source, node, tables, sink).await {
                    Ok(lineage) => {
                        emit_lineage(&lineage, sink)?;
                        summary.dashboards += 1;
                        summary.lineage_edges += lineage.edges.len();
                        summary.unresolved += lineage.state.notes.len();
                    }
                    Err(error) if error.is_fatal() => return Err(error),
                    Err(error) => {
                        tracing::warn!(node_id = %node.id, kind = source.as_str(), %error, "skipping lineage source");
                        summary.dashboards_skipped += 1;
                    }
                }
            }
        }
        Ok(())
    }

    async fn lineage_for<S: EntitySink>(
        &self,
        resolver: &LineageResolver<'a, C>,
        source: LineageSource,
        node: &CatalogNode,
        tables: &mut TableIngestor<'a, C>,
        sink: &mut S,
    ) -> Result<DashboardLineage, IngestError> {
        match source {
            LineageSource::Report => resolver.report_lineage(node, tables, sink).await,
            LineageSource::DataPlan => resolver.data_plan_lineage(node, tables, sink).await,
        }
    }

    /// List instances; a non-fatal listing failure is logged and yields nothing.
    async fn list(&self, filter: &str, what: &str) -> Result<Vec<CatalogNode>, IngestError> {
        match self.catalog.list_instances(filter).await {
            Ok(nodes) => Ok(nodes),
            Err(error) => {
                let error = IngestError::from(error);
                if error.is_fatal() {
                    return Err(error);
                }
                tracing::warn!(filter, what, %error, "listing failed");
                Ok(Vec::new())
            }
        }
    }
}
