//! Table assembly: columns, profile, and sample rows for a resolved table.

use std::collections::HashMap;

use serde_json::{Map, Value};
use trellis_catalog::CatalogApi;
use trellis_config::IngestConfig;
use trellis_core::catalog::{CatalogNode, ViewQuery};
use trellis_core::column::ColumnDescriptor;
use trellis_core::entities::{EntityRecord, SampleDataRecord, TableProfileRecord, TableRecord};
use trellis_core::fqn;

use crate::error::IngestError;
use crate::hierarchy::{HierarchyResolver, ResolvedHierarchy};
use crate::normalize::{normalize_column, ordinal_position, table_profile};
use crate::sink::EntitySink;

/// Graph query returning a table and its data fields.
pub const COLUMNS_QUERY: &str =
    "match (t:dataSet)-[r:dataSetDataFields]->(c:dataField) where t.id = $id return t, r, c";
const DATA_FIELD_TYPE: &str = "dataField";

/// What gets emitted alongside each table record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableOptions {
    pub include_profiles: bool,
    pub include_sample_data: bool,
    pub sample_rows: u32,
}

impl From<&IngestConfig> for TableOptions {
    fn from(config: &IngestConfig) -> Self {
        Self {
            include_profiles: config.include_profiles,
            include_sample_data: config.include_sample_data,
            sample_rows: config.sample_rows,
        }
    }
}

/// Records built for one table before emission.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledTable {
    pub table: TableRecord,
    pub profile: TableProfileRecord,
}

/// Build the table record and profile from the table node and its column nodes.
///
/// Columns that fail normalization are kept with an `unknown` type. Columns
/// are ordered by ordinal position; a column without one takes its position
/// in the catalog response. A column count that differs from the table's
/// `columnCount` attribute is logged and tolerated.
///
/// # Errors
///
/// Returns [`IngestError::Core`] if the table's fully-qualified name cannot
/// be built.
#[allow(clippy::cast_precision_loss)]
pub fn assemble_table(
    table: &CatalogNode,
    columns: &[CatalogNode],
    hierarchy: &ResolvedHierarchy,
) -> Result<AssembledTable, IngestError> {
    let mut descriptors: Vec<ColumnDescriptor> = columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let position = u32::try_from(index + 1).unwrap_or(u32::MAX);
            let mut descriptor =
                normalize_column(&column.name, &column.attributes, &table.attributes)
                    .unwrap_or_else(|error| {
                        tracing::warn!(
                            node_id = %column.id,
                            table_id = %table.id,
                            %error,
                            "column recorded with unknown type"
                        );
                        ColumnDescriptor::unknown(
                            fqn::identifier_safe(&column.name),
                            ordinal_position(&column.attributes).unwrap_or(position),
                        )
                    });
            if descriptor.ordinal_position == 0 {
                descriptor.ordinal_position = position;
            }
            descriptor
        })
        .collect();
    descriptors.sort_by_key(|column| column.ordinal_position);

    if let Some(reported) = table.attribute_f64("columnCount") {
        if (reported - descriptors.len() as f64).abs() > f64::EPSILON {
            tracing::warn!(
                node_id = %table.id,
                reported,
                found = descriptors.len(),
                "column count differs from catalog"
            );
        }
    }

    let table_fqn = hierarchy.table_fqn(&table.name)?;
    let extension: Map<String, Value> = table
        .attributes
        .iter()
        .filter(|(_, value)| matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_)))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let profile = TableProfileRecord {
        table_fqn: table_fqn.clone(),
        profile: table_profile(&table.attributes, &descriptors),
    };
    let record = TableRecord {
        name: fqn::identifier_safe(&table.name).into_owned(),
        schema_fqn: hierarchy.schema_fqn()?,
        catalog_id: table.id.clone(),
        columns: descriptors,
        description: table.attribute_str("description").map(str::to_string),
        extension,
        fqn: table_fqn,
    };
    Ok(AssembledTable {
        table: record,
        profile,
    })
}

/// Ingests tables once per run and remembers their fully-qualified names.
pub struct TableIngestor<'a, C> {
    catalog: &'a C,
    hierarchy: HierarchyResolver<'a, C>,
    options: TableOptions,
    by_id: HashMap<String, String>,
    by_resource: HashMap<String, String>,
}

impl<'a, C: CatalogApi> TableIngestor<'a, C> {
    #[must_use]
    pub fn new(catalog: &'a C, hierarchy: HierarchyResolver<'a, C>, options: TableOptions) -> Self {
        Self {
            catalog,
            hierarchy,
            options,
            by_id: HashMap::new(),
            by_resource: HashMap::new(),
        }
    }

    /// Fully-qualified name of an already-ingested table, by instance id.
    #[must_use]
    pub fn fqn_for_id(&self, id: &str) -> Option<&str> {
        self.by_id.get(id).map(String::as_str)
    }

    /// Fully-qualified name of an already-ingested table, by resource path.
    #[must_use]
    pub fn fqn_for_resource(&self, resource_path: &str) -> Option<&str> {
        self.by_resource.get(resource_path).map(String::as_str)
    }

    /// Number of distinct tables ingested so far.
    #[must_use]
    pub fn ingested(&self) -> usize {
        self.by_id.len()
    }

    /// Resolve, assemble, and emit `table`, returning its fully-qualified
    /// name. A table already ingested in this run is not fetched again.
    ///
    /// # Errors
    ///
    /// [`IngestError::AmbiguousLineage`] when no data store is reachable,
    /// catalog errors from resolution or the column query, and sink failures.
    pub async fn ingest<S: EntitySink>(
        &mut self,
        table: &CatalogNode,
        sink: &mut S,
    ) -> Result<String, IngestError> {
        if let Some(fqn) = self.by_id.get(&table.id) {
            return Ok(fqn.clone());
        }

        let hierarchy = self.hierarchy.resolve(table, sink).await?.into_hierarchy()?;
        let columns = self.fetch_columns(table).await?;
        let AssembledTable { table: record, profile } = assemble_table(table, &columns, &hierarchy)?;
        let fqn = record.fqn.clone();
        let column_count = record.columns.len();

        sink.upsert(EntityRecord::Table(record))?;
        if self.options.include_profiles {
            sink.upsert(EntityRecord::TableProfile(profile))?;
        }
        if self.options.include_sample_data {
            self.emit_sample(table, &fqn, sink).await?;
        }
        tracing::info!(node_id = %table.id, %fqn, columns = column_count, "ingested table");

        self.by_id.insert(table.id.clone(), fqn.clone());
        if let Some(path) = &table.resource_path {
            self.by_resource.insert(path.clone(), fqn.clone());
        }
        Ok(fqn)
    }

    async fn fetch_columns(&self, table: &CatalogNode) -> Result<Vec<CatalogNode>, IngestError> {
        let query = ViewQuery::with_param(COLUMNS_QUERY, "id", table.id.as_str());
        let result = self.catalog.get_views(&query).await?;
        Ok(result
            .entities
            .into_iter()
            .filter(|node| node.has_type(DATA_FIELD_TYPE))
            .collect())
    }

    async fn emit_sample<S: EntitySink>(
        &self,
        table: &CatalogNode,
        fqn: &str,
        sink: &mut S,
    ) -> Result<(), IngestError> {
        let Some(path) = table.resource_path.as_deref() else {
            tracing::debug!(node_id = %table.id, "no resource path; sample rows skipped");
            return Ok(());
        };
        match self.catalog.get_rows_cols(path, self.options.sample_rows).await {
            Ok((rows, columns)) => sink.upsert(EntityRecord::SampleData(SampleDataRecord {
                table_fqn: fqn.to_string(),
                columns,
                rows,
            }))?,
            Err(error) => {
                let error = IngestError::from(error);
                if error.is_fatal() {
                    return Err(error);
                }
                tracing::warn!(node_id = %table.id, %error, "sample rows unavailable");
            }
        }
        Ok(())
    }
}
