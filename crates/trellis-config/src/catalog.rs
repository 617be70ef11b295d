//! Catalog connection configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn default_client_id() -> String {
    "sas.cli".to_string()
}

const fn default_verify_tls() -> bool {
    true
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_page_limit() -> u32 {
    1000
}

fn default_table_filter() -> String {
    "contains(name,'Table')".to_string()
}

fn default_report_filter() -> String {
    "eq(type,'report')".to_string()
}

fn default_data_plan_filter() -> String {
    "eq(type,'dataPlan')".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// Base URL of the catalog server (e.g., `https://viya.example.com`).
    #[serde(default)]
    pub server_host: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Pre-minted bearer token. Takes precedence over the password grant.
    #[serde(default)]
    pub access_token: String,

    /// OAuth client used for the password grant.
    #[serde(default = "default_client_id")]
    pub client_id: String,

    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Page size for instance listings.
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,

    /// Catalog filter expression selecting tables.
    #[serde(default = "default_table_filter")]
    pub table_filter: String,

    #[serde(default = "default_report_filter")]
    pub report_filter: String,

    #[serde(default = "default_data_plan_filter")]
    pub data_plan_filter: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            server_host: String::new(),
            username: String::new(),
            password: String::new(),
            access_token: String::new(),
            client_id: default_client_id(),
            verify_tls: default_verify_tls(),
            timeout_secs: default_timeout_secs(),
            page_limit: default_page_limit(),
            table_filter: default_table_filter(),
            report_filter: default_report_filter(),
            data_plan_filter: default_data_plan_filter(),
        }
    }
}

impl CatalogConfig {
    /// Whether a host and some form of credentials are present.
    pub fn is_configured(&self) -> bool {
        !self.server_host.is_empty() && (self.has_token() || self.has_password())
    }

    pub fn has_token(&self) -> bool {
        !self.access_token.is_empty()
    }

    pub fn has_password(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    /// Host without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.server_host.trim_end_matches('/')
    }

    /// Fail unless the section is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotConfigured`] when host or credentials are
    /// missing, and [`ConfigError::InvalidValue`] for a non-HTTP host.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.is_configured() {
            return Err(ConfigError::NotConfigured {
                section: "catalog".into(),
            });
        }
        if !self.server_host.starts_with("http://") && !self.server_host.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                field: "catalog.server_host".into(),
                reason: format!("expected an http(s) URL, got '{}'", self.server_host),
            });
        }
        Ok(())
    }
}
