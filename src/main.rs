//! Cross-Venue Arbitrage Bot - Main Entry Point

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use xvenue_arb_bot::{
    engine::{Pipeline, PipelineEvent, Runtime},
    execution::SimulatedGateway,
    feeds::PriceFeedIngestor,
    network::HttpPriceClient,
    utils, CONFIG,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config = CONFIG.clone();
    let output_dir = config.runtime.output_dir.clone();

    utils::setup_output_directories(&output_dir)?;
    let _logging_guard = utils::setup_logging(&output_dir)?;

    info!("🔀 Cross-Venue Arbitrage Bot v{}", env!("CARGO_PKG_VERSION"));
    info!("📋 Configuration:");
    info!("   Assets: {}", config.feed.tracked_assets.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "));
    info!("   Venues: {}", config.feed.venues.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "));
    info!("   Min Spread: {}%", config.detector.min_spread_percent);
    info!("   Execution Threshold: {}", config.scorer.execution_threshold);
    info!("   Initial Capital: ${}", config.risk.initial_capital);
    info!("   Max Exposure: {}%", config.risk.max_portfolio_exposure * rust_decimal_macros::dec!(100));
    info!("   ⚠️  SIMULATED EXECUTION - fill rate {:.0}%", config.runtime.simulated_fill_rate * 100.0);

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    let source = Arc::new(HttpPriceClient::from_config(&config.feed)?);
    let gateway = Arc::new(SimulatedGateway::new(
        config.runtime.simulated_fill_rate,
        Duration::from_millis(config.runtime.simulated_latency_ms),
    ));

    let pipeline = Pipeline::new(&config).with_output_dir(&output_dir);
    let ingestor = PriceFeedIngestor::from_config(&config.feed);
    let runtime = Runtime::new(pipeline, ingestor, source, gateway, &config.runtime);

    let shutdown_tx = runtime.sender();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("\n📛 Received shutdown signal (Ctrl+C)..."),
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
        let _ = shutdown_tx.send(PipelineEvent::Shutdown).await;
    });

    info!("\n🚀 Starting pipeline...\n");
    let (pipeline, ingestor) = runtime.run().await;

    info!("\n🛑 Shutting down gracefully...");
    utils::print_session_stats(pipeline.stats(), ingestor.stats(), pipeline.breaker());
    utils::print_risk_status(&pipeline.risk_status());

    Ok(())
}
