use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Ingest tables, hierarchy, profiles and lineage from the catalog.
    Ingest(IngestArgs),
    /// Verify catalog connectivity and credentials.
    Check,
    /// Print the JSON schema of an emitted record type.
    Schema(SchemaArgs),
}

#[derive(Clone, Debug, Args)]
pub struct IngestArgs {
    /// Resolve everything but keep records in memory instead of writing them.
    #[arg(long)]
    pub dry_run: bool,
    /// Skip report and data-plan lineage.
    #[arg(long)]
    pub no_lineage: bool,
    /// Output directory for the entity snapshot (overrides `sink.output_dir`).
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Clone, Debug, Args)]
pub struct SchemaArgs {
    /// Record type: service, database, schema, table, table_profile,
    /// sample_data, chart, dashboard, lineage, or entity for the envelope.
    pub record: String,
}
