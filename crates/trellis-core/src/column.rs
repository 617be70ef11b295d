//! Canonical column descriptors and statistical profiles.
//!
//! Raw catalog attributes differ by table engine. The ingest normalizer maps
//! them onto these types, so everything downstream sees one shape.

use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ── DataType ───────────────────────────────────────────────────────

/// Canonical column data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Numeric,
    Decimal,
    Double,
    Float,
    Bigint,
    Int,
    Smallint,
    Tinyint,
    Boolean,
    Char,
    Varchar,
    String,
    Text,
    Date,
    Time,
    Datetime,
    Timestamp,
    Binary,
    Varbinary,
    Blob,
    Json,
    Unknown,
}

impl DataType {
    /// Whether numeric-only statistics apply to this type.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Numeric
                | Self::Decimal
                | Self::Double
                | Self::Float
                | Self::Bigint
                | Self::Int
                | Self::Smallint
                | Self::Tinyint
        )
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Decimal => "decimal",
            Self::Double => "double",
            Self::Float => "float",
            Self::Bigint => "bigint",
            Self::Int => "int",
            Self::Smallint => "smallint",
            Self::Tinyint => "tinyint",
            Self::Boolean => "boolean",
            Self::Char => "char",
            Self::Varchar => "varchar",
            Self::String => "string",
            Self::Text => "text",
            Self::Date => "date",
            Self::Time => "time",
            Self::Datetime => "datetime",
            Self::Timestamp => "timestamp",
            Self::Binary => "binary",
            Self::Varbinary => "varbinary",
            Self::Blob => "blob",
            Self::Json => "json",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── ColumnDescriptor ───────────────────────────────────────────────

/// One column of a table, normalized from engine-specific attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    /// Identifier-safe name (embedded double quotes replaced by single quotes).
    pub name: String,
    pub data_type: DataType,
    /// The type string as the catalog reported it, e.g. `varchar(32)`.
    pub data_type_display: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    pub ordinal_position: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<StatProfile>,
}

impl ColumnDescriptor {
    /// Best-effort descriptor used when a column's attributes cannot be normalized.
    #[must_use]
    pub fn unknown(name: impl Into<String>, ordinal_position: u32) -> Self {
        Self {
            name: name.into(),
            data_type: DataType::Unknown,
            data_type_display: DataType::Unknown.as_str().to_string(),
            length: None,
            precision: None,
            scale: None,
            ordinal_position,
            description: None,
            profile: None,
        }
    }
}

// ── Profiles ───────────────────────────────────────────────────────

/// A non-standard metric carried alongside the canonical statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CustomMetric {
    pub name: String,
    pub value: f64,
}

/// Column statistics. Every field is optional: it is populated only when the
/// catalog supplied the attributes it derives from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatProfile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values_count: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stddev: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_quartile: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub median: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub third_quartile: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub null_count: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub null_proportion: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinct_count: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinct_proportion: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_count: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_proportion: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_count: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_count: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_metrics: Vec<CustomMetric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl StatProfile {
    /// True when no statistic at all was derived.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let Self {
            name: _,
            timestamp: _,
            values_count,
            mean,
            stddev,
            min,
            max,
            first_quartile,
            median,
            third_quartile,
            null_count,
            null_proportion,
            distinct_count,
            distinct_proportion,
            unique_count,
            unique_proportion,
            missing_count,
            missing_percentage,
            valid_count,
            custom_metrics,
        } = self;
        [
            values_count,
            mean,
            stddev,
            min,
            max,
            first_quartile,
            median,
            third_quartile,
            null_count,
            null_proportion,
            distinct_count,
            distinct_proportion,
            unique_count,
            unique_proportion,
            missing_count,
            missing_percentage,
            valid_count,
        ]
        .iter()
        .all(|v| v.is_none())
            && custom_metrics.is_empty()
    }
}

/// Table-level statistics plus the per-column profiles.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_count: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub columns: Vec<StatProfile>,
}
