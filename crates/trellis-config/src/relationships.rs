//! Relationship-type identifiers used by the resolvers.
//!
//! The catalog distinguishes edge semantics by fixed definition ids. The
//! defaults are the ids shipped with the catalog; deployments with custom
//! definitions can override them.

use serde::{Deserialize, Serialize};

pub const DATA_STORE_MEMBERSHIP: &str = "4b114f6e-1c2a-4060-9184-6809a612f27b";
pub const DATA_PLAN_INPUT: &str = "6179884b-91ec-4236-ad6b-52c7f454f217";
pub const DATA_PLAN_OUTPUT: &str = "e1349270-fdbb-4231-9841-79917a307471";

fn default_data_store_membership() -> String {
    DATA_STORE_MEMBERSHIP.to_string()
}

fn default_data_plan_input() -> String {
    DATA_PLAN_INPUT.to_string()
}

fn default_data_plan_output() -> String {
    DATA_PLAN_OUTPUT.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RelationshipIds {
    /// Table → data store.
    #[serde(default = "default_data_store_membership")]
    pub data_store_membership: String,

    /// Data plan → input asset.
    #[serde(default = "default_data_plan_input")]
    pub data_plan_input: String,

    /// Data plan → output asset.
    #[serde(default = "default_data_plan_output")]
    pub data_plan_output: String,
}

impl Default for RelationshipIds {
    fn default() -> Self {
        Self {
            data_store_membership: default_data_store_membership(),
            data_plan_input: default_data_plan_input(),
            data_plan_output: default_data_plan_output(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_distinct() {
        let ids = RelationshipIds::default();
        assert_ne!(ids.data_plan_input, ids.data_plan_output);
        assert_ne!(ids.data_store_membership, ids.data_plan_input);
        assert_eq!(ids.data_store_membership, DATA_STORE_MEMBERSHIP);
    }
}
