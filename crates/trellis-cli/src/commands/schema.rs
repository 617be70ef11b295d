use anyhow::bail;
use schemars::{Schema, schema_for};
use trellis_core::entities::{
    ChartRecord, DashboardRecord, DatabaseRecord, EntityRecord, RecordKind, SampleDataRecord,
    SchemaRecord, ServiceRecord, TableProfileRecord, TableRecord,
};
use trellis_core::lineage::LineageEdge;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::SchemaArgs;
use crate::output::output;

/// Handle `trl schema`.
pub fn handle(args: &SchemaArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let schema = schema_for_record(&args.record)?;
    output(&schema, flags.format)
}

fn schema_for_record(name: &str) -> anyhow::Result<Schema> {
    if name == "entity" {
        return Ok(schema_for!(EntityRecord));
    }
    let Some(kind) = RecordKind::ALL.into_iter().find(|k| k.as_str() == name) else {
        let known: Vec<&str> = RecordKind::ALL.iter().map(|k| k.as_str()).collect();
        bail!(
            "unknown record type '{name}' (expected one of: {}, entity)",
            known.join(", ")
        );
    };
    Ok(match kind {
        RecordKind::Service => schema_for!(ServiceRecord),
        RecordKind::Database => schema_for!(DatabaseRecord),
        RecordKind::Schema => schema_for!(SchemaRecord),
        RecordKind::Table => schema_for!(TableRecord),
        RecordKind::TableProfile => schema_for!(TableProfileRecord),
        RecordKind::SampleData => schema_for!(SampleDataRecord),
        RecordKind::Chart => schema_for!(ChartRecord),
        RecordKind::Dashboard => schema_for!(DashboardRecord),
        RecordKind::Lineage => schema_for!(LineageEdge),
    })
}
