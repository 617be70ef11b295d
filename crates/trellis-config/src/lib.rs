//! # trellis-config
//!
//! Layered configuration loading for Trellis using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`TRELLIS_*` prefix, `__` as separator)
//! 2. Project-level `.trellis/config.toml`
//! 3. User-level `~/.config/trellis/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `TRELLIS_CATALOG__SERVER_HOST` -> `catalog.server_host`,
//! `TRELLIS_SINK__OUTPUT_DIR` -> `sink.output_dir`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use trellis_config::TrellisConfig;
//!
//! let config = TrellisConfig::load().expect("config");
//! if config.catalog.is_configured() {
//!     println!("catalog: {}", config.catalog.server_host);
//! }
//! ```

mod catalog;
mod error;
mod ingest;
mod relationships;
mod sink;

pub use catalog::CatalogConfig;
pub use error::ConfigError;
pub use ingest::IngestConfig;
pub use relationships::{
    DATA_PLAN_INPUT, DATA_PLAN_OUTPUT, DATA_STORE_MEMBERSHIP, RelationshipIds,
};
pub use sink::SinkConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TrellisConfig {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub sink: SinkConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub relationships: RelationshipIds,
}

const ENV_PREFIX: &str = "TRELLIS_";
const ENV_NESTING: &str = "__";
const PROJECT_DIR: &str = ".trellis";
const CONFIG_FILE: &str = "config.toml";

impl TrellisConfig {
    /// Load configuration from defaults, config files, and `TRELLIS_*`
    /// variables. `.env` is not read here; the binary loads it first.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Figment`] if a source cannot be parsed or a
    /// value has the wrong type.
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self::figment().extract()?)
    }

    /// Provider chain, lowest priority first. Public so tests can merge
    /// extra providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        Self::config_files()
            .into_iter()
            .filter(|path| path.is_file())
            .fold(
                Figment::from(Serialized::defaults(Self::default())),
                |figment, path| figment.merge(Toml::file(path)),
            )
            .merge(Env::prefixed(ENV_PREFIX).split(ENV_NESTING))
    }

    /// Candidate config files in merge order: user-level, then project-level.
    fn config_files() -> Vec<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("trellis").join(CONFIG_FILE))
            .into_iter()
            .chain(std::iter::once(Path::new(PROJECT_DIR).join(CONFIG_FILE)))
            .collect()
    }
}
