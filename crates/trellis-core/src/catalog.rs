//! Typed snapshots of catalog payloads.
//!
//! The catalog speaks loosely-typed JSON. Payloads are decoded into these
//! structs once, at the client boundary, and the resolvers only ever see the
//! typed form.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::errors::CoreError;

/// Relation name of the link from a table resource to its data store.
pub const DATA_SOURCE_REL: &str = "dataSource";

/// Relation name of the link from a data store to its owning parent.
pub const PARENT_REL: &str = "parent";

// ── CatalogNode ────────────────────────────────────────────────────

/// An immutable snapshot of one catalog instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogNode {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// The catalog reports `type` either as a single string or as a list.
    #[serde(rename = "type", default, deserialize_with = "one_or_many")]
    pub types: BTreeSet<String>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(rename = "resourceId", default, skip_serializing_if = "Option::is_none")]
    pub resource_path: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

impl CatalogNode {
    /// Decode a raw catalog instance.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Json`] if the payload does not carry at least an `id`.
    pub fn from_value(value: Value) -> Result<Self, CoreError> {
        serde_json::from_value(value).map_err(CoreError::from)
    }

    /// Whether the node carries the given type tag.
    #[must_use]
    pub fn has_type(&self, kind: &str) -> bool {
        self.types.contains(kind)
    }

    /// Relationships of one type, in catalog order.
    pub fn relationships_of<'a>(
        &'a self,
        type_id: &'a str,
    ) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.relationships
            .iter()
            .filter(move |r| r.relationship_type_id == type_id)
    }

    /// The first relationship of the given type.
    #[must_use]
    pub fn first_relationship(&self, type_id: &str) -> Option<&Relationship> {
        self.relationships
            .iter()
            .find(|r| r.relationship_type_id == type_id)
    }

    /// The first link with relation `rel`.
    #[must_use]
    pub fn link(&self, rel: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.rel == rel)
    }

    /// String attribute, if present and a string.
    #[must_use]
    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// Numeric attribute. Accepts JSON numbers and numeric strings.
    #[must_use]
    pub fn attribute_f64(&self, key: &str) -> Option<f64> {
        self.attributes.get(key).and_then(value_as_f64)
    }
}

/// Read a JSON value as a float, accepting numeric strings.
#[must_use]
pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => BTreeSet::new(),
        Some(OneOrMany::One(kind)) => BTreeSet::from([kind]),
        Some(OneOrMany::Many(kinds)) => kinds.into_iter().collect(),
    })
}

// ── Relationship / Link ────────────────────────────────────────────

/// A directional edge from the owning node to another catalog instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(rename = "definitionId")]
    pub relationship_type_id: String,
    #[serde(rename = "endpointId")]
    pub endpoint_node_id: String,
    /// Display name of the endpoint, when the catalog includes it.
    #[serde(rename = "endpointName", default, skip_serializing_if = "Option::is_none")]
    pub endpoint_name: Option<String>,
}

/// A hypermedia link on a catalog resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub uri: String,
}

// ── Resources ──────────────────────────────────────────────────────

/// A resource fetched by path (a table resource or a data store).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogResource {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "providerId", default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CatalogResource {
    /// The first link with relation `rel`.
    #[must_use]
    pub fn link(&self, rel: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.rel == rel)
    }
}

/// One visual element of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualElement {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub label: Option<String>,
}

/// A resource related to a report, as listed by the report relationship API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedResource {
    #[serde(rename = "relatedResourceUri")]
    pub related_resource_uri: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// A relationship-graph query sent to the catalog's view endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewQuery {
    pub query: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl ViewQuery {
    /// Build a query with a single string parameter.
    #[must_use]
    pub fn with_param(query: impl Into<String>, key: &str, value: impl Into<String>) -> Self {
        let mut parameters = Map::new();
        parameters.insert(key.to_string(), Value::String(value.into()));
        Self {
            query: query.into(),
            parameters,
        }
    }
}

/// Result of a relationship-graph query.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewResult {
    #[serde(default)]
    pub entities: Vec<CatalogNode>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn decodes_instance_with_string_type() {
        let node = CatalogNode::from_value(json!({
            "id": "t-1",
            "name": "CARS",
            "type": "casTable",
            "resourceId": "/dataTables/dataSources/cas~fs~cas-shared-default~fs~Public/tables/CARS",
            "attributes": {"rowCount": 428, "columnCount": "15"},
            "relationships": [
                {"definitionId": "ds-member", "endpointId": "store-1", "endpointName": "Public"},
                {"definitionId": "other", "endpointId": "x"}
            ]
        }))
        .unwrap();

        assert!(node.has_type("casTable"));
        assert_eq!(node.attribute_f64("rowCount"), Some(428.0));
        assert_eq!(node.attribute_f64("columnCount"), Some(15.0));
        assert_eq!(
            node.first_relationship("ds-member").map(|r| r.endpoint_node_id.as_str()),
            Some("store-1")
        );
        assert_eq!(node.relationships_of("other").count(), 1);
    }

    #[test]
    fn decodes_instance_with_type_list_and_missing_fields() {
        let node = CatalogNode::from_value(json!({
            "id": "r-1",
            "type": ["report", "reference"]
        }))
        .unwrap();

        assert!(node.has_type("report"));
        assert!(node.has_type("reference"));
        assert!(node.name.is_empty());
        assert!(node.resource_path.is_none());
        assert!(node.relationships.is_empty());
    }

    #[test]
    fn rejects_instance_without_id() {
        let result = CatalogNode::from_value(json!({"name": "nameless"}));
        assert!(matches!(result, Err(CoreError::Json(_))));
    }

    #[test]
    fn resource_keeps_unknown_fields() {
        let resource: CatalogResource = serde_json::from_value(json!({
            "id": "cas-shared-default~fs~Public",
            "name": "Public",
            "providerId": "cas",
            "links": [{"rel": "parent", "uri": "/dataSources/providers/cas/sources/cas-shared-default"}],
            "description": "public caslib"
        }))
        .unwrap();

        assert_eq!(resource.provider_id.as_deref(), Some("cas"));
        assert_eq!(
            resource.link(PARENT_REL).map(|l| l.uri.as_str()),
            Some("/dataSources/providers/cas/sources/cas-shared-default")
        );
        assert_eq!(resource.extra.get("description"), Some(&json!("public caslib")));
    }

    #[test]
    fn view_query_serializes_parameters() {
        let query = ViewQuery::with_param("match (t) where t.id = $id return t", "id", "t-1");
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(value["parameters"]["id"], json!("t-1"));
    }
}
