//! What an ingestion run emits.

use serde::{Deserialize, Serialize};

const fn default_true() -> bool {
    true
}

const fn default_sample_rows() -> u32 {
    50
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestConfig {
    /// Resolve report and data-plan lineage after tables.
    #[serde(default = "default_true")]
    pub include_lineage: bool,

    /// Emit table and column statistical profiles.
    #[serde(default = "default_true")]
    pub include_profiles: bool,

    /// Fetch and emit sample rows for each table.
    #[serde(default)]
    pub include_sample_data: bool,

    #[serde(default = "default_sample_rows")]
    pub sample_rows: u32,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            include_lineage: default_true(),
            include_profiles: default_true(),
            include_sample_data: false,
            sample_rows: default_sample_rows(),
        }
    }
}
