use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, RwLock};
use tracing::info;

use common::{CycleOutcome, DriverState, Signal};
use strategy::{interpret, SignalGenerator};

use crate::fetcher::MarketDataFetcher;

/// Cloneable handle for observing and stopping a running [`Engine`].
#[derive(Clone)]
pub struct EngineHandle {
    state: Arc<RwLock<DriverState>>,
    shutdown_tx: Arc<watch::Sender<bool>>,
}

impl EngineHandle {
    /// Ask the engine to stop. A cycle in flight is abandoned; a sleep is cut short.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn state(&self) -> DriverState {
        *self.state.read().await
    }
}

/// The polling loop: fetch → generate → interpret → log, then sleep.
///
/// Cycles share nothing but the injected clients and read-only settings, so a
/// failed cycle has no effect on the next one. Dropping every
/// [`EngineHandle`] counts as a stop request.
pub struct Engine {
    fetcher: MarketDataFetcher,
    generator: SignalGenerator,
    poll_interval: Duration,
    state: Arc<RwLock<DriverState>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Engine {
    pub fn new(
        fetcher: MarketDataFetcher,
        generator: SignalGenerator,
        poll_interval: Duration,
    ) -> (Self, EngineHandle) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let state = Arc::new(RwLock::new(DriverState::Idle));

        let handle = EngineHandle {
            state: state.clone(),
            shutdown_tx: Arc::new(shutdown_tx),
        };

        let engine = Engine {
            fetcher,
            generator,
            poll_interval,
            state,
            shutdown_rx,
        };

        (engine, handle)
    }

    /// Run one fetch → generate → interpret pass.
    ///
    /// Never fails: an unavailable price skips the completion call, and a
    /// failed completion is already folded into the `"no signal"` sentinel.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let price = match self.fetcher.fetch_price().await {
            Ok(price) => price,
            Err(_) => {
                info!("Price not available.");
                return CycleOutcome::PriceUnavailable;
            }
        };

        let text = self.generator.generate(&price).await;
        let signal = interpret(&text);
        execute(signal);

        CycleOutcome::Decided {
            price,
            text,
            signal,
        }
    }

    /// Run cycles until stopped. Call from `tokio::spawn`.
    pub async fn run(self) {
        let mut shutdown = self.shutdown_rx.clone();
        info!(
            symbol = %self.fetcher.symbol(),
            every_secs = self.poll_interval.as_secs(),
            "Starting trading bot with Smart Money strategy..."
        );

        loop {
            self.set_state(DriverState::Running).await;
            info!("--- NEW CYCLE ---");

            let completed = tokio::select! {
                biased;
                _ = stop_requested(&mut shutdown) => false,
                _ = self.run_cycle() => true,
            };
            if !completed {
                break;
            }

            self.set_state(DriverState::Idle).await;
            info!("Waiting {} seconds...", self.poll_interval.as_secs());

            tokio::select! {
                biased;
                _ = stop_requested(&mut shutdown) => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        self.set_state(DriverState::Stopped).await;
        info!("Engine stopped");
    }

    async fn set_state(&self, next: DriverState) {
        *self.state.write().await = next;
    }
}

/// Log the decision. No order is placed.
fn execute(signal: Signal) {
    info!(signal = %signal, "{}", signal.action_label());
}

/// Resolves once a stop is requested or every handle is gone.
async fn stop_requested(rx: &mut watch::Receiver<bool>) {
    loop {
        let stop = *rx.borrow_and_update();
        if stop {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}
