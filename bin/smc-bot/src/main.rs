use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use common::Config;
use engine::{BitgetClient, Engine, MarketDataFetcher};
use strategy::{OpenAiClient, SignalGenerator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env().context("invalid configuration")?;
    cfg.log_credentials();
    info!(
        symbol = %cfg.symbol,
        interval = %cfg.interval,
        model = %cfg.openai_model,
        "SmcBot starting"
    );

    // ── Clients ───────────────────────────────────────────────────────────────
    let exchange = BitgetClient::new(&cfg.bitget_base_url).context("building exchange client")?;
    let llm = OpenAiClient::new(
        &cfg.openai_api_key,
        &cfg.openai_model,
        &cfg.openai_base_url,
        cfg.llm_timeout,
    )
    .context("building completion client")?;
    info!(model = %llm.model(), timeout_secs = cfg.llm_timeout.as_secs(), "Completion client ready");

    // ── Engine ────────────────────────────────────────────────────────────────
    let fetcher = MarketDataFetcher::new(
        Arc::new(exchange),
        cfg.symbol.clone(),
        cfg.interval,
        cfg.candle_limit,
    );
    let generator = SignalGenerator::new(Arc::new(llm), cfg.llm_timeout);
    let (engine, handle) = Engine::new(fetcher, generator, cfg.poll_interval);

    let task = tokio::spawn(engine.run());

    // Keep main alive
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received. Stopping engine.");
            handle.stop();
        }
        Err(e) => warn!("Cannot listen for ctrl-c, running until killed: {e}"),
    }
    task.await.context("engine task panicked")?;
    info!(state = %handle.state().await, "Exiting.");
    Ok(())
}
