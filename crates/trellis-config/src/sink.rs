//! Emission sink configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_output_dir() -> PathBuf {
    PathBuf::from(".trellis/out")
}

fn default_database_service() -> String {
    "sas_catalog".to_string()
}

fn default_dashboard_service() -> String {
    "sas_reports".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SinkConfig {
    /// Directory holding the `entities.jsonl` snapshot.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Fallback database service name when a data store reports no provider.
    #[serde(default = "default_database_service")]
    pub database_service: String,

    /// Service that owns emitted dashboards and charts.
    #[serde(default = "default_dashboard_service")]
    pub dashboard_service: String,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            database_service: default_database_service(),
            dashboard_service: default_dashboard_service(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = SinkConfig::default();
        assert_eq!(config.output_dir, PathBuf::from(".trellis/out"));
        assert_eq!(config.database_service, "sas_catalog");
        assert_eq!(config.dashboard_service, "sas_reports");
    }
}
