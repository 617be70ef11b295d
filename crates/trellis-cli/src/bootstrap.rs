use anyhow::Context;
use trellis_config::TrellisConfig;

/// Load `.env` from the working directory (if any), then the layered config.
pub fn load_config() -> anyhow::Result<TrellisConfig> {
    load_dotenv()?;
    TrellisConfig::load().context("failed to load trellis configuration")
}

fn load_dotenv() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let env_path = cwd.join(".env");
    if env_path.exists() {
        dotenvy::from_path(&env_path)
            .with_context(|| format!("failed to load dotenv file at {}", env_path.display()))?;
        tracing::debug!(path = %env_path.display(), "loaded dotenv");
    }
    Ok(())
}
