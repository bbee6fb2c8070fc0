//! Alpha Research - factor research runner.
//!
//! Loads the panel for the configured symbols, evaluates the price reversal,
//! volume-price ratio and volatility breakout factors, and prints the report.

use alpha_common::config::Config;
use alpha_common::logging::init_logging_with_exclusions;
use alpha_research::ResearchService;
use anyhow::Result;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let started = std::time::Instant::now();

    // Load and validate configuration
    let config = Config::load_and_validate()?;

    // Initialize logging
    init_logging_with_exclusions(
        &config.observability.log_level,
        &config.observability.log_format,
        &config.observability.excluded_targets,
    );

    tracing::info!("Alpha Research v{}", env!("CARGO_PKG_VERSION"));

    let service = ResearchService::new(config);
    let run = service.run().await?;

    println!("{}", run.report.text_report);

    tracing::info!(
        duration_ms = started.elapsed().as_millis() as u64,
        "Finished in {:?}",
        started.elapsed()
    );
    Ok(())
}
