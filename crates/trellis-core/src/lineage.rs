//! Directed lineage edges between resolved entities.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The kinds of entity a lineage edge may connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Table,
    Dashboard,
}

impl EntityKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Dashboard => "dashboard",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference to an emitted entity by kind and fully-qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub fqn: String,
}

impl EntityRef {
    #[must_use]
    pub fn table(fqn: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::Table,
            fqn: fqn.into(),
        }
    }

    #[must_use]
    pub fn dashboard(fqn: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::Dashboard,
            fqn: fqn.into(),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.fqn)
    }
}

/// A producer → consumer edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineageEdge {
    pub from_entity: EntityRef,
    pub to_entity: EntityRef,
}

impl LineageEdge {
    #[must_use]
    pub const fn new(from_entity: EntityRef, to_entity: EntityRef) -> Self {
        Self {
            from_entity,
            to_entity,
        }
    }

    /// Stable upsert key.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}->{}", self.from_entity, self.to_entity)
    }
}
