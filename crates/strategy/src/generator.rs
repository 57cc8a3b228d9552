use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use common::{CompletionClient, Error, PriceSample, Result, SignalText};

use crate::prompt::render_prompt;

/// Turns a price into model output via the smart-money prompt.
pub struct SignalGenerator {
    client: Arc<dyn CompletionClient>,
    timeout: Duration,
}

impl SignalGenerator {
    pub fn new(client: Arc<dyn CompletionClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// One completion attempt, bounded by the configured timeout.
    pub async fn request(&self, price: &PriceSample) -> Result<SignalText> {
        let prompt = render_prompt(price.value);
        info!(price = price.value, "Sending prompt to completion service...");

        let raw = tokio::time::timeout(self.timeout, self.client.complete(&prompt))
            .await
            .map_err(|_| Error::Timeout(self.timeout.as_secs()))??;

        Ok(SignalText::new(&raw))
    }

    /// Like [`request`](Self::request) but never fails: any error is logged
    /// and replaced by the `"no signal"` sentinel.
    pub async fn generate(&self, price: &PriceSample) -> SignalText {
        match self.request(price).await {
            Ok(text) => {
                info!("Model response: {text}");
                text
            }
            Err(e) => {
                warn!("Completion error: {}", e.sanitized());
                SignalText::no_signal()
            }
        }
    }
}
