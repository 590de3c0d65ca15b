use air_quality_meter::{SkillConfig, logging, web};
use anyhow::{Context, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let config = SkillConfig::load().context("Failed to load configuration")?;
    logging::init(&config.logging)?;

    tracing::info!(
        "Starting Air Quality Meter {} (provider {})",
        air_quality_meter::VERSION,
        config.provider.endpoint
    );

    web::run(config).await
}
