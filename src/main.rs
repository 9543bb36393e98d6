use anyhow::Result;
use ssascraper::{DataConfig, SsaData};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();
    info!("startup");

    // ─── 2) fetch (or reuse) the three caches and load them ──────────
    let config = DataConfig::default();
    let data = SsaData::new(&config)?;
    info!(
        totals = data.totals.len(),
        national = data.national.len(),
        state = data.state.len(),
        dir = %config.data_dir.display(),
        "caches ready"
    );
    Ok(())
}
