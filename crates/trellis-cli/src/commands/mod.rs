pub mod check;
pub mod ingest;
pub mod schema;

use trellis_config::TrellisConfig;

use crate::cli::{Commands, GlobalFlags};

/// Route a parsed command to its handler.
pub async fn dispatch(
    command: Commands,
    config: TrellisConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match command {
        Commands::Ingest(args) => ingest::handle(&args, config, flags).await,
        Commands::Check => check::handle(&config, flags).await,
        Commands::Schema(args) => schema::handle(&args, flags),
    }
}
