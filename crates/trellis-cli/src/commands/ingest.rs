use std::path::PathBuf;
use std::sync::atomic::Ordering;

use anyhow::Context;
use serde::Serialize;
use trellis_catalog::CatalogClient;
use trellis_config::TrellisConfig;
use trellis_ingest::{IngestRun, JsonlSink, MemorySink, RunSummary};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::IngestArgs;
use crate::output::output;
use crate::progress::Progress;

#[derive(Debug, Serialize)]
struct IngestResponse {
    #[serde(flatten)]
    summary: RunSummary,
    dry_run: bool,
    records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    snapshot: Option<PathBuf>,
}

/// Handle `trl ingest`.
pub async fn handle(
    args: &IngestArgs,
    mut config: TrellisConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    apply_overrides(args, &mut config);

    let client = CatalogClient::connect(&config.catalog)
        .await
        .context("failed to connect to catalog")?;
    let run = IngestRun::new(&client, &config).with_base_url(client.base_url());

    let cancel = run.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; stopping after the current entity");
            cancel.store(true, Ordering::Relaxed);
        }
    });

    let progress = Progress::spinner("ingesting catalog", flags.quiet);
    let response = if args.dry_run {
        let mut sink = MemorySink::new();
        let summary = run.execute(&mut sink).await;
        let summary = finish(&progress, summary)?;
        IngestResponse {
            summary,
            dry_run: true,
            records: sink.len(),
            snapshot: None,
        }
    } else {
        let mut sink = JsonlSink::open(&config.sink.output_dir).with_context(|| {
            format!(
                "failed to open output directory {}",
                config.sink.output_dir.display()
            )
        })?;
        let summary = run.execute(&mut sink).await;
        let summary = finish(&progress, summary)?;
        IngestResponse {
            summary,
            dry_run: false,
            records: sink.len(),
            snapshot: Some(sink.path().to_path_buf()),
        }
    };

    output(&response, flags.format)
}

fn apply_overrides(args: &IngestArgs, config: &mut TrellisConfig) {
    if args.no_lineage {
        config.ingest.include_lineage = false;
    }
    if let Some(dir) = &args.output {
        config.sink.output_dir.clone_from(dir);
    }
}

fn finish(
    progress: &Progress,
    result: Result<RunSummary, trellis_ingest::IngestError>,
) -> anyhow::Result<RunSummary> {
    match result {
        Ok(summary) => {
            progress.finish_clear();
            Ok(summary)
        }
        Err(error) => {
            progress.finish_err("ingestion failed");
            Err(error).context("ingestion stopped")
        }
    }
}
