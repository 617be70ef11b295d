//! Entity records handed to the emission sink.
//!
//! Every record is upserted by its fully-qualified name, so re-emitting the
//! same record is a no-op for the metadata repository.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::column::{ColumnDescriptor, TableProfile};
use crate::lineage::LineageEdge;

/// Which side of the metadata repository a service belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    Database,
    Dashboard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ServiceRecord {
    pub name: String,
    pub kind: ServiceKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DatabaseRecord {
    pub name: String,
    pub service: String,
    pub fqn: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchemaRecord {
    pub name: String,
    pub database_fqn: String,
    pub fqn: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableRecord {
    pub name: String,
    pub fqn: String,
    pub schema_fqn: String,
    /// Catalog instance id the table was ingested from.
    pub catalog_id: String,
    pub columns: Vec<ColumnDescriptor>,
    /// Scalar catalog attributes carried over as custom properties.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extension: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableProfileRecord {
    pub table_fqn: String,
    pub profile: TableProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SampleDataRecord {
    pub table_fqn: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChartRecord {
    pub name: String,
    pub display_name: String,
    pub chart_type: String,
    pub service: String,
    pub fqn: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardRecord {
    pub name: String,
    pub display_name: String,
    pub service: String,
    pub fqn: String,
    #[serde(default)]
    pub charts: Vec<String>,
    /// Human-readable notes, including tables that could not be resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

// ── EntityRecord ───────────────────────────────────────────────────

/// Discriminant of [`EntityRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Service,
    Database,
    Schema,
    Table,
    TableProfile,
    SampleData,
    Chart,
    Dashboard,
    Lineage,
}

impl RecordKind {
    pub const ALL: [Self; 9] = [
        Self::Service,
        Self::Database,
        Self::Schema,
        Self::Table,
        Self::TableProfile,
        Self::SampleData,
        Self::Chart,
        Self::Dashboard,
        Self::Lineage,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Service => "service",
            Self::Database => "database",
            Self::Schema => "schema",
            Self::Table => "table",
            Self::TableProfile => "table_profile",
            Self::SampleData => "sample_data",
            Self::Chart => "chart",
            Self::Dashboard => "dashboard",
            Self::Lineage => "lineage",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any record the sink accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum EntityRecord {
    Service(ServiceRecord),
    Database(DatabaseRecord),
    Schema(SchemaRecord),
    Table(TableRecord),
    TableProfile(TableProfileRecord),
    SampleData(SampleDataRecord),
    Chart(ChartRecord),
    Dashboard(DashboardRecord),
    Lineage(LineageEdge),
}

impl EntityRecord {
    #[must_use]
    pub const fn kind(&self) -> RecordKind {
        match self {
            Self::Service(_) => RecordKind::Service,
            Self::Database(_) => RecordKind::Database,
            Self::Schema(_) => RecordKind::Schema,
            Self::Table(_) => RecordKind::Table,
            Self::TableProfile(_) => RecordKind::TableProfile,
            Self::SampleData(_) => RecordKind::SampleData,
            Self::Chart(_) => RecordKind::Chart,
            Self::Dashboard(_) => RecordKind::Dashboard,
            Self::Lineage(_) => RecordKind::Lineage,
        }
    }

    /// The upsert key within the record's kind.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Service(r) => r.name.clone(),
            Self::Database(r) => r.fqn.clone(),
            Self::Schema(r) => r.fqn.clone(),
            Self::Table(r) => r.fqn.clone(),
            Self::TableProfile(r) => r.table_fqn.clone(),
            Self::SampleData(r) => r.table_fqn.clone(),
            Self::Chart(r) => r.fqn.clone(),
            Self::Dashboard(r) => r.fqn.clone(),
            Self::Lineage(edge) => edge.key(),
        }
    }
}
