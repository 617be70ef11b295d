//! Attribute normalization: engine-specific column attributes → canonical
//! [`ColumnDescriptor`] and [`StatProfile`].
//!
//! Everything here is a pure function of its inputs. Profile fields are only
//! populated when the attributes they derive from are present.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use trellis_core::catalog::value_as_f64;
use trellis_core::column::{ColumnDescriptor, CustomMetric, DataType, StatProfile, TableProfile};
use trellis_core::fqn;

use crate::error::IngestError;

type Attributes = Map<String, Value>;

const CAS_DATA_TYPE: &str = "casDataType";
const DATA_TYPE: &str = "dataType";
const SAS_NUMERIC_TOKEN: &str = "num";

/// Non-standard metrics and whether each applies only to numeric columns.
const CUSTOM_METRICS: &[(&str, bool)] = &[
    ("skewness", true),
    ("kurtosis", true),
    ("sum", true),
    ("variance", true),
    ("coefficientOfVariation", true),
    ("standardError", true),
    ("mostCommonValueCount", false),
    ("patternCount", false),
    ("minLength", false),
    ("maxLength", false),
    ("averageLength", false),
];

// ── Data types ─────────────────────────────────────────────────────

/// Base type plus size arguments extracted from a datatype string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedType {
    pub data_type: DataType,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
}

impl ParsedType {
    const fn bare(data_type: DataType) -> Self {
        Self {
            data_type,
            length: None,
            precision: None,
            scale: None,
        }
    }
}

fn base_type(base: &str) -> Option<DataType> {
    Some(match base {
        "numeric" | "number" => DataType::Numeric,
        "decimal" | "dec" => DataType::Decimal,
        "double" | "double precision" | "float8" => DataType::Double,
        "float" | "real" | "float4" => DataType::Float,
        "bigint" | "int64" => DataType::Bigint,
        "int" | "integer" | "int32" => DataType::Int,
        "smallint" | "int16" => DataType::Smallint,
        "tinyint" | "int8" => DataType::Tinyint,
        "bool" | "boolean" => DataType::Boolean,
        "char" | "character" | "nchar" => DataType::Char,
        "varchar" | "character varying" | "nvarchar" => DataType::Varchar,
        "string" => DataType::String,
        "text" | "clob" => DataType::Text,
        "date" => DataType::Date,
        "time" => DataType::Time,
        "datetime" => DataType::Datetime,
        "binary" => DataType::Binary,
        "varbinary" => DataType::Varbinary,
        "blob" => DataType::Blob,
        "json" => DataType::Json,
        b if b.starts_with("timestamp") => DataType::Timestamp,
        _ => return None,
    })
}

/// Parse a datatype string such as `varchar(32)` or `decimal(10, 2)`.
///
/// # Errors
///
/// Returns [`IngestError::TypeParse`] for an unknown base type, unbalanced
/// parentheses, or size arguments that are not unsigned integers.
pub fn parse_data_type(raw: &str) -> Result<ParsedType, IngestError> {
    let fail = |reason: String| IngestError::TypeParse {
        raw: raw.to_string(),
        reason,
    };

    let text = raw.trim();
    if text.is_empty() {
        return Err(fail("empty type string".into()));
    }

    let (base, args) = match text.find('(') {
        None if text.contains(')') => return Err(fail("unbalanced parentheses".into())),
        None => (text, Vec::new()),
        Some(open) => {
            let inner = text[open + 1..]
                .strip_suffix(')')
                .filter(|inner| !inner.contains(['(', ')']))
                .ok_or_else(|| fail("unbalanced parentheses".into()))?;
            let args = inner
                .split(',')
                .map(|arg| {
                    let arg = arg.trim();
                    arg.parse::<u32>()
                        .map_err(|_| fail(format!("invalid size argument '{arg}'")))
                })
                .collect::<Result<Vec<_>, _>>()?;
            (text[..open].trim_end(), args)
        }
    };

    let data_type = base_type(&base.to_ascii_lowercase())
        .ok_or_else(|| fail(format!("unknown base type '{base}'")))?;

    let mut parsed = ParsedType::bare(data_type);
    match (data_type, args.as_slice()) {
        (_, []) => {}
        (
            DataType::Char
            | DataType::Varchar
            | DataType::String
            | DataType::Binary
            | DataType::Varbinary,
            [length],
        ) => parsed.length = Some(*length),
        (DataType::Numeric | DataType::Decimal, [precision]) => {
            parsed.precision = Some(*precision);
        }
        (DataType::Numeric | DataType::Decimal, [precision, scale]) => {
            parsed.precision = Some(*precision);
            parsed.scale = Some(*scale);
        }
        (_, [precision]) => parsed.precision = Some(*precision),
        (_, args) => {
            return Err(fail(format!(
                "{data_type} does not take {} size arguments",
                args.len()
            )));
        }
    }
    Ok(parsed)
}

// ── Attribute access ───────────────────────────────────────────────

fn first_f64(attributes: &Attributes, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .find_map(|key| attributes.get(*key).and_then(value_as_f64))
}

fn first_str<'a>(attributes: &'a Attributes, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| attributes.get(*key).and_then(Value::as_str))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn attribute_u32(attributes: &Attributes, key: &str) -> Option<u32> {
    value_as_f64(attributes.get(key)?)
        .filter(|n| n.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(n))
        .map(|n| n as u32)
}

/// Catalog-reported ordinal position of a column.
pub(crate) fn ordinal_position(attributes: &Attributes) -> Option<u32> {
    attribute_u32(attributes, "ordinalPosition")
}

/// RFC 3339 string or epoch milliseconds.
pub(crate) fn attribute_timestamp(attributes: &Attributes, keys: &[&str]) -> Option<DateTime<Utc>> {
    keys.iter().find_map(|key| match attributes.get(*key)? {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    })
}

fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d > 0.0 => Some(n / d),
        _ => None,
    }
}

// ── Columns ────────────────────────────────────────────────────────

/// Normalize one column's raw attributes.
///
/// `table_extension` holds the owning table's attributes; it supplies the
/// row count when the column carries no `valuesCount`, and the analysis
/// timestamp. The ordinal is 0 when the catalog does not report one.
///
/// # Errors
///
/// [`IngestError::MissingType`] when neither `casDataType` nor `dataType` is
/// present, [`IngestError::TypeParse`] when the type string is malformed.
pub fn normalize_column(
    name: &str,
    raw: &Attributes,
    table_extension: &Attributes,
) -> Result<ColumnDescriptor, IngestError> {
    let name = fqn::identifier_safe(name).into_owned();
    let type_token = first_str(raw, &[CAS_DATA_TYPE, DATA_TYPE]).ok_or_else(|| {
        IngestError::MissingType {
            column: name.clone(),
        }
    })?;

    let parsed = if type_token.trim().eq_ignore_ascii_case(SAS_NUMERIC_TOKEN) {
        ParsedType::bare(DataType::Numeric)
    } else {
        parse_data_type(type_token)?
    };

    let length = attribute_u32(raw, "rawLength")
        .or_else(|| attribute_u32(raw, "length"))
        .or(parsed.length);

    let profile = derive_profile(&name, parsed.data_type, raw, table_extension);

    Ok(ColumnDescriptor {
        data_type_display: type_token.to_string(),
        data_type: parsed.data_type,
        length,
        precision: parsed.precision,
        scale: parsed.scale,
        ordinal_position: ordinal_position(raw).unwrap_or(0),
        description: first_str(raw, &["description"]).map(str::to_string),
        profile: (!profile.is_empty()).then_some(profile),
        name,
    })
}

/// Build the column's statistical profile from whatever attributes exist.
#[must_use]
pub fn derive_profile(
    name: &str,
    data_type: DataType,
    raw: &Attributes,
    table_extension: &Attributes,
) -> StatProfile {
    let values_count =
        first_f64(raw, &["valuesCount"]).or_else(|| first_f64(table_extension, &["rowCount"]));
    let has_rows = values_count.is_none_or(|n| n > 0.0);

    let null_count = first_f64(raw, &["nullCount"]);
    let distinct_count = first_f64(raw, &["distinctCount"]);
    let missing_count = first_f64(raw, &["missingCount"]);

    let valid_count = match (values_count, missing_count) {
        (Some(values), Some(missing)) if values > 0.0 => Some(values - missing),
        _ => None,
    };

    let mut profile = StatProfile {
        name: name.to_string(),
        values_count,
        mean: first_f64(raw, &["mean"]),
        stddev: first_f64(raw, &["standardDeviation", "stdDev"]),
        min: first_f64(raw, &["minimum", "min"]),
        max: first_f64(raw, &["maximum", "max"]),
        first_quartile: first_f64(raw, &["firstQuartile", "q1"]),
        median: first_f64(raw, &["median"]),
        third_quartile: first_f64(raw, &["thirdQuartile", "q3"]),
        null_count,
        null_proportion: ratio(null_count, values_count),
        distinct_count,
        distinct_proportion: ratio(distinct_count, values_count),
        unique_count: first_f64(raw, &["uniqueCount"]),
        unique_proportion: first_f64(raw, &["uniquenessPercent"])
            .filter(|_| has_rows)
            .map(|percent| percent / 100.0),
        missing_count,
        missing_percentage: ratio(missing_count, values_count),
        valid_count,
        custom_metrics: custom_metrics(data_type, raw),
        timestamp: None,
    };
    if !profile.is_empty() {
        profile.timestamp = attribute_timestamp(raw, &["analysisTimeStamp"])
            .or_else(|| attribute_timestamp(table_extension, &["analysisTimeStamp"]));
    }
    profile
}

/// Metrics whose applicability matches the column type: categorical metrics
/// for non-numeric columns, numeric-only metrics for numeric columns.
fn custom_metrics(data_type: DataType, raw: &Attributes) -> Vec<CustomMetric> {
    let non_numeric_column = !data_type.is_numeric();
    CUSTOM_METRICS
        .iter()
        .filter(|(_, numeric_only)| non_numeric_column ^ numeric_only)
        .filter_map(|(metric, _)| {
            raw.get(*metric).and_then(value_as_f64).map(|value| CustomMetric {
                name: (*metric).to_string(),
                value,
            })
        })
        .collect()
}

// ── Tables ─────────────────────────────────────────────────────────

/// Table-level statistics plus the profiles of already-normalized columns.
#[must_use]
pub fn table_profile(attributes: &Attributes, columns: &[ColumnDescriptor]) -> TableProfile {
    TableProfile {
        row_count: first_f64(attributes, &["rowCount"]),
        column_count: first_f64(attributes, &["columnCount"]),
        size_bytes: first_f64(attributes, &["dataSize"]),
        timestamp: attribute_timestamp(attributes, &["analysisTimeStamp"]),
        columns: columns.iter().filter_map(|c| c.profile.clone()).collect(),
    }
}
