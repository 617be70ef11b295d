//! Report and data-plan lineage against an in-memory catalog.

mod support;

use pretty_assertions::assert_eq;
use serde_json::json;
use support::{FakeCatalog, node};
use trellis_config::RelationshipIds;
use trellis_core::catalog::RelatedResource;
use trellis_core::entities::RecordKind;
use trellis_core::lineage::{EntityRef, LineageEdge};
use trellis_ingest::lineage::emit_lineage;
use trellis_ingest::{HierarchyResolver, LineageResolver, MemorySink, TableIngestor, TableOptions};

const OPTIONS: TableOptions = TableOptions {
    include_profiles: true,
    include_sample_data: false,
    sample_rows: 10,
};

fn tables(catalog: &FakeCatalog) -> TableIngestor<'_, FakeCatalog> {
    let hierarchy = HierarchyResolver::new(catalog, &RelationshipIds::default(), "sas_catalog");
    TableIngestor::new(catalog, hierarchy, OPTIONS)
}

fn lineage(catalog: &FakeCatalog) -> LineageResolver<'_, FakeCatalog> {
    LineageResolver::new(catalog, &RelationshipIds::default(), "sas_reports")
}

#[tokio::test]
async fn data_plan_inputs_and_outputs_point_opposite_ways() {
    let mut catalog = FakeCatalog::with_public_store();
    catalog.add_table("t1", "SOURCE", true);
    catalog.add_table("t2", "TARGET", true);
    let plan = catalog.add_data_plan("plan-1", &["t1"], &["t2"]);
    let mut sink = MemorySink::new();
    let mut tables = tables(&catalog);

    let resolved = lineage(&catalog)
        .data_plan_lineage(&plan, &mut tables, &mut sink)
        .await
        .unwrap();

    let dashboard = EntityRef::dashboard("sas_reports.plan-1");
    assert_eq!(
        resolved.edges,
        vec![
            LineageEdge::new(
                EntityRef::table("cas.cas-shared-default.Public.SOURCE"),
                dashboard.clone()
            ),
            LineageEdge::new(
                dashboard,
                EntityRef::table("cas.cas-shared-default.Public.TARGET")
            ),
        ]
    );
    assert_eq!(resolved.dashboard.description, None);
    assert_eq!(sink.count(RecordKind::Table), 2);
}

#[tokio::test]
async fn data_plan_reuses_tables_ingested_earlier() {
    let mut catalog = FakeCatalog::with_public_store();
    let source = catalog.add_table("t1", "SOURCE", true);
    let plan = catalog.add_data_plan("plan-1", &["t1"], &[]);
    let mut sink = MemorySink::new();
    let mut tables = tables(&catalog);
    tables.ingest(&source, &mut sink).await.unwrap();
    let before = catalog.calls().len();

    let resolved = lineage(&catalog)
        .data_plan_lineage(&plan, &mut tables, &mut sink)
        .await
        .unwrap();

    assert_eq!(resolved.edges.len(), 1);
    assert_eq!(catalog.calls().len(), before);
    assert_eq!(sink.upsert_calls(RecordKind::Table), 1);
}

#[tokio::test]
async fn unresolved_assets_become_notes() {
    let mut catalog = FakeCatalog::with_public_store();
    catalog.add_table("t1", "SOURCE", true);
    let plan = catalog.add_data_plan("plan-1", &["t1", "t-gone"], &[]);
    let mut tables = tables(&catalog);

    let resolved = lineage(&catalog)
        .data_plan_lineage(&plan, &mut tables, &mut MemorySink::new())
        .await
        .unwrap();

    assert_eq!(resolved.edges.len(), 1);
    assert_eq!(
        resolved.dashboard.description.as_deref(),
        Some("Unresolved lineage: asset t-gone not found")
    );
}

#[tokio::test]
async fn missing_asset_is_found_by_endpoint_name() {
    let mut catalog = FakeCatalog::with_public_store();
    catalog.add_table("t-real", "SOURCE", true);
    let plan = node(json!({
        "id": "plan-2",
        "name": "Renamed inputs",
        "relationships": [
            {"definitionId": trellis_config::DATA_PLAN_INPUT, "endpointId": "t-stale", "endpointName": "SOURCE"}
        ]
    }));
    let mut tables = tables(&catalog);

    let resolved = lineage(&catalog)
        .data_plan_lineage(&plan, &mut tables, &mut MemorySink::new())
        .await
        .unwrap();

    assert_eq!(
        resolved.state.table_fqns,
        vec!["cas.cas-shared-default.Public.SOURCE".to_string()]
    );
    assert!(resolved.state.notes.is_empty());
}

#[tokio::test]
async fn report_charts_are_deduplicated_and_filtered() {
    let mut catalog = FakeCatalog::with_public_store();
    catalog.add_table("t-cars", "CARS", true);
    let report = catalog.add_report(
        "rep-1",
        "Sales Overview",
        &[
            ("Graph", "Revenue (1)"),
            ("Graph", "Revenue (2)"),
            ("Text", "Cost"),
            ("Button", "Refresh"),
            ("Table", "  "),
        ],
        &["CARS"],
    );
    let mut tables = tables(&catalog);

    let resolved = lineage(&catalog)
        .with_base_url("https://viya.example.com/")
        .report_lineage(&report, &mut tables, &mut MemorySink::new())
        .await
        .unwrap();

    assert_eq!(resolved.state.chart_names, vec!["Revenue".to_string(), "Cost".to_string()]);
    let kinds: Vec<_> = resolved.charts.iter().map(|c| c.chart_type.as_str()).collect();
    assert_eq!(kinds, vec!["Graph", "Text"]);
    assert_eq!(
        resolved.dashboard.charts,
        vec![
            "sas_reports.rep-1.Revenue".to_string(),
            "sas_reports.rep-1.Cost".to_string()
        ]
    );
    assert_eq!(
        resolved.edges,
        vec![LineageEdge::new(
            EntityRef::table("cas.cas-shared-default.Public.CARS"),
            EntityRef::dashboard("sas_reports.rep-1"),
        )]
    );
    assert_eq!(
        resolved.dashboard.source_url.as_deref(),
        Some("https://viya.example.com/links/resources/report?uri=/reports/reports/rep-1")
    );
}

#[tokio::test]
async fn report_falls_back_to_lookup_by_name() {
    let mut catalog = FakeCatalog::with_public_store();
    catalog.add_table("t-cars", "CARS", true);
    let report = catalog.add_report("rep-2", "Moved", &[], &[]);
    catalog.related.insert(
        "/reports/reports/rep-2".into(),
        vec![RelatedResource {
            related_resource_uri: "/dataTables/dataSources/elsewhere/tables/CARS".into(),
            kind: None,
        }],
    );
    let mut tables = tables(&catalog);

    let resolved = lineage(&catalog)
        .report_lineage(&report, &mut tables, &mut MemorySink::new())
        .await
        .unwrap();

    assert_eq!(resolved.edges.len(), 1);
    assert_eq!(catalog.calls_to("list_instances"), 2);
}

#[tokio::test]
async fn failed_resource_id_lookup_still_tries_the_name() {
    let mut catalog = FakeCatalog::with_public_store();
    let table = catalog.add_table("t-ob", "O'BRIEN", true);
    let report = catalog.add_report("rep-4", "Accounts", &[], &[]);
    let moved = "/dataTables/dataSources/elsewhere/tables/O'BRIEN";
    catalog.related.insert(
        "/reports/reports/rep-4".into(),
        vec![RelatedResource {
            related_resource_uri: moved.into(),
            kind: None,
        }],
    );
    catalog
        .failing_listings
        .insert(r"eq(resourceId,'/dataTables/dataSources/elsewhere/tables/O\'BRIEN')".into());
    catalog
        .listings
        .insert(r"eq(name,'O\'BRIEN')".into(), vec![table]);
    let mut tables = tables(&catalog);

    let resolved = lineage(&catalog)
        .report_lineage(&report, &mut tables, &mut MemorySink::new())
        .await
        .unwrap();

    assert_eq!(
        resolved.edges,
        vec![LineageEdge::new(
            EntityRef::table("cas.cas-shared-default.Public.O'BRIEN"),
            EntityRef::dashboard("sas_reports.rep-4"),
        )]
    );
    assert_eq!(resolved.dashboard.description, None);
    assert_eq!(catalog.calls_to("list_instances"), 2);
}

#[tokio::test]
async fn unresolvable_report_table_is_noted_not_fatal() {
    let mut catalog = FakeCatalog::with_public_store();
    let report = catalog.add_report("rep-3", "Broken", &[("Graph", "Trend")], &["NOWHERE"]);
    let mut tables = tables(&catalog);
    let mut sink = MemorySink::new();

    let resolved = lineage(&catalog)
        .report_lineage(&report, &mut tables, &mut sink)
        .await
        .unwrap();
    emit_lineage(&resolved, &mut sink).unwrap();

    assert!(resolved.edges.is_empty());
    let description = resolved.dashboard.description.unwrap_or_default();
    assert!(description.contains("tables/NOWHERE not found"), "{description}");
    assert_eq!(sink.count(RecordKind::Dashboard), 1);
    assert_eq!(sink.count(RecordKind::Chart), 1);
    assert_eq!(sink.count(RecordKind::Lineage), 0);
}
