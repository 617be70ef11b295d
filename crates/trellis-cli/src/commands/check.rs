use anyhow::Context;
use serde::Serialize;
use trellis_catalog::CatalogClient;
use trellis_config::TrellisConfig;

use crate::cli::GlobalFlags;
use crate::output::output;

#[derive(Debug, Serialize)]
struct CheckResponse<'a> {
    host: &'a str,
    access: &'static str,
}

/// Handle `trl check`.
pub async fn handle(config: &TrellisConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let client = CatalogClient::connect(&config.catalog)
        .await
        .context("failed to connect to catalog")?;
    client
        .check_access()
        .await
        .context("catalog access check failed")?;

    output(
        &CheckResponse {
            host: client.base_url(),
            access: "ok",
        },
        flags.format,
    )
}
