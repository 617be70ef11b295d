//! Hierarchy resolution: table → data store → database → service.
//!
//! Two strategies, tried in order:
//!
//! - **Primary**: fetch the table resource, follow its `dataSource` link to
//!   the data store, then the store's `parent` link to the database.
//! - **Fallback**: entered only when the primary walk hits a missing
//!   resource. Looks for a data-store membership edge on the table node and
//!   reads the data store instance directly.
//!
//! Results are memoized by data-store identity for the lifetime of the
//! resolver, and each service/database/schema record is emitted at most once.

use std::collections::{HashMap, HashSet};

use trellis_catalog::CatalogApi;
use trellis_config::RelationshipIds;
use trellis_core::catalog::{CatalogNode, DATA_SOURCE_REL, PARENT_REL};
use trellis_core::entities::{
    DatabaseRecord, EntityRecord, RecordKind, SchemaRecord, ServiceKind, ServiceRecord,
};
use trellis_core::errors::CoreError;
use trellis_core::fqn;

use crate::error::IngestError;
use crate::sink::EntitySink;

/// Service, database, and schema owning a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedHierarchy {
    pub service_name: String,
    pub database_name: String,
    pub schema_name: String,
}

impl ResolvedHierarchy {
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidFqn`] if a segment is empty.
    pub fn database_fqn(&self) -> Result<String, CoreError> {
        fqn::build(&[&self.service_name, &self.database_name])
    }

    /// # Errors
    ///
    /// Returns [`CoreError::InvalidFqn`] if a segment is empty.
    pub fn schema_fqn(&self) -> Result<String, CoreError> {
        fqn::build(&[&self.service_name, &self.database_name, &self.schema_name])
    }

    /// # Errors
    ///
    /// Returns [`CoreError::InvalidFqn`] if a segment is empty.
    pub fn table_fqn(&self, table: &str) -> Result<String, CoreError> {
        fqn::build(&[
            self.service_name.as_str(),
            self.database_name.as_str(),
            self.schema_name.as_str(),
            table,
        ])
    }
}

/// Which strategy produced a hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Primary,
    Fallback,
}

impl Strategy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Fallback => "fallback",
        }
    }
}

/// Outcome of resolving one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved {
        hierarchy: ResolvedHierarchy,
        strategy: Strategy,
    },
    /// Neither strategy reached a data store.
    Ambiguous { table_id: String },
}

impl Resolution {
    /// # Errors
    ///
    /// Returns [`IngestError::AmbiguousLineage`] for [`Resolution::Ambiguous`].
    pub fn into_hierarchy(self) -> Result<ResolvedHierarchy, IngestError> {
        match self {
            Self::Resolved { hierarchy, .. } => Ok(hierarchy),
            Self::Ambiguous { table_id } => Err(IngestError::AmbiguousLineage { table_id }),
        }
    }
}

fn not_found(path: String) -> IngestError {
    IngestError::ResourceNotFound { path }
}

/// Resolves table ancestry and emits the service/database/schema records.
pub struct HierarchyResolver<'a, C> {
    catalog: &'a C,
    membership_type_id: String,
    default_service: String,
    /// Keyed by every identity a data store was reached through: link URI,
    /// resource id, and instance id.
    by_store: HashMap<String, ResolvedHierarchy>,
    emitted: HashSet<(RecordKind, String)>,
}

impl<'a, C: CatalogApi> HierarchyResolver<'a, C> {
    /// `default_service` names the database service when a data store
    /// reports no provider.
    #[must_use]
    pub fn new(catalog: &'a C, relationships: &RelationshipIds, default_service: &str) -> Self {
        Self {
            catalog,
            membership_type_id: relationships.data_store_membership.clone(),
            default_service: default_service.to_string(),
            by_store: HashMap::new(),
            emitted: HashSet::new(),
        }
    }

    /// Resolve `table` and upsert any service/database/schema record not
    /// yet emitted by this resolver.
    ///
    /// # Errors
    ///
    /// Returns catalog errors other than not-found from the primary walk,
    /// any error from the fallback fetches, and sink failures.
    pub async fn resolve<S: EntitySink>(
        &mut self,
        table: &CatalogNode,
        sink: &mut S,
    ) -> Result<Resolution, IngestError> {
        let (hierarchy, strategy) = match self.resolve_primary(table).await {
            Ok(hierarchy) => (hierarchy, Strategy::Primary),
            Err(IngestError::ResourceNotFound { path }) => {
                tracing::debug!(
                    node_id = %table.id,
                    strategy = Strategy::Fallback.as_str(),
                    missing = %path,
                    "primary walk found no data store"
                );
                match self.resolve_fallback(table).await? {
                    Some(hierarchy) => (hierarchy, Strategy::Fallback),
                    None => {
                        return Ok(Resolution::Ambiguous {
                            table_id: table.id.clone(),
                        });
                    }
                }
            }
            Err(error) => return Err(error),
        };

        self.emit(&hierarchy, sink)?;
        tracing::debug!(
            node_id = %table.id,
            strategy = strategy.as_str(),
            schema = %hierarchy.schema_name,
            "resolved hierarchy"
        );
        Ok(Resolution::Resolved {
            hierarchy,
            strategy,
        })
    }

    async fn resolve_primary(&mut self, table: &CatalogNode) -> Result<ResolvedHierarchy, IngestError> {
        let path = table
            .resource_path
            .as_deref()
            .ok_or_else(|| not_found(format!("instance {} has no resource path", table.id)))?;

        let resource = self.catalog.get_resource(path).await?;
        let store_uri = resource
            .link(DATA_SOURCE_REL)
            .map(|link| link.uri.clone())
            .ok_or_else(|| not_found(format!("{path} has no {DATA_SOURCE_REL} link")))?;
        if let Some(hierarchy) = self.by_store.get(&store_uri) {
            return Ok(hierarchy.clone());
        }

        let store = self.catalog.get_data_source(&store_uri).await?;
        let hierarchy = match self.by_store.get(&store.id) {
            Some(hierarchy) => hierarchy.clone(),
            None => {
                self.from_store(
                    &store.name,
                    store.provider_id.as_deref(),
                    store.link(PARENT_REL).map(|link| link.uri.as_str()),
                )
                .await?
            }
        };
        self.remember([store_uri, store.id], &hierarchy);
        Ok(hierarchy)
    }

    async fn resolve_fallback(
        &mut self,
        table: &CatalogNode,
    ) -> Result<Option<ResolvedHierarchy>, IngestError> {
        let Some(edge) = table.first_relationship(&self.membership_type_id) else {
            return Ok(None);
        };
        let store_id = edge.endpoint_node_id.clone();
        if let Some(hierarchy) = self.by_store.get(&store_id) {
            return Ok(Some(hierarchy.clone()));
        }

        let store = self.catalog.get_instance(&store_id).await?;
        let cached = store
            .resource_path
            .as_ref()
            .and_then(|path| self.by_store.get(path))
            .cloned();
        let hierarchy = match cached {
            Some(hierarchy) => hierarchy,
            None => {
                self.from_store(
                    &store.name,
                    store.attribute_str("providerId"),
                    store.link(PARENT_REL).map(|link| link.uri.as_str()),
                )
                .await?
            }
        };

        let mut keys = vec![store_id, store.id];
        keys.extend(store.resource_path);
        self.remember(keys, &hierarchy);
        Ok(Some(hierarchy))
    }

    /// Identity of a data store: provider → service, parent id → database,
    /// store name → schema.
    async fn from_store(
        &self,
        store_name: &str,
        provider_id: Option<&str>,
        parent_uri: Option<&str>,
    ) -> Result<ResolvedHierarchy, IngestError> {
        let parent_uri = parent_uri
            .ok_or_else(|| not_found(format!("data store {store_name} has no {PARENT_REL} link")))?;
        let parent = self.catalog.get_data_source(parent_uri).await?;

        Ok(ResolvedHierarchy {
            service_name: provider_id
                .filter(|provider| !provider.is_empty())
                .unwrap_or(&self.default_service)
                .to_string(),
            database_name: parent.id,
            schema_name: store_name.to_string(),
        })
    }

    fn remember(&mut self, keys: impl IntoIterator<Item = String>, hierarchy: &ResolvedHierarchy) {
        for key in keys {
            self.by_store.entry(key).or_insert_with(|| hierarchy.clone());
        }
    }

    fn emit<S: EntitySink>(
        &mut self,
        hierarchy: &ResolvedHierarchy,
        sink: &mut S,
    ) -> Result<(), IngestError> {
        let database_fqn = hierarchy.database_fqn()?;
        let records = [
            EntityRecord::Service(ServiceRecord {
                name: hierarchy.service_name.clone(),
                kind: ServiceKind::Database,
            }),
            EntityRecord::Database(DatabaseRecord {
                name: hierarchy.database_name.clone(),
                service: hierarchy.service_name.clone(),
                fqn: database_fqn.clone(),
            }),
            EntityRecord::Schema(SchemaRecord {
                name: hierarchy.schema_name.clone(),
                database_fqn,
                fqn: hierarchy.schema_fqn()?,
            }),
        ];
        for record in records {
            if self.emitted.insert((record.kind(), record.key())) {
                tracing::info!(kind = %record.kind(), key = %record.key(), "emitting");
                sink.upsert(record)?;
            }
        }
        Ok(())
    }
}
