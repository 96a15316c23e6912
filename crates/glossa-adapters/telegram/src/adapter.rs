//! Telegram adapter implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use glossa_core::{
    Adapter, AdapterError, AdapterResult, BoxedSender, ConfigurableAdapter, InboundMessage,
    TransportError,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::TelegramClient;
use crate::config::{Backoff, TelegramConfig};
use crate::model::Update;

/// Telegram Bot API adapter using long polling.
#[derive(Debug)]
pub struct TelegramAdapter {
    config: TelegramConfig,
    client: Arc<TelegramClient>,
}

impl TelegramAdapter {
    /// Creates an adapter, validating the configuration first.
    pub fn new(config: TelegramConfig) -> AdapterResult<Self> {
        config.validate()?;
        let client = Arc::new(TelegramClient::new(&config)?);
        Ok(Self { config, client })
    }

    /// Returns the API client.
    pub fn client(&self) -> &Arc<TelegramClient> {
        &self.client
    }
}

/// Errors that retrying cannot fix.
fn is_fatal(error: &TransportError) -> bool {
    matches!(error, TransportError::Api { code: 401 | 404, .. })
}

/// Forwards one `getUpdates` batch, moving `offset` past every update,
/// including the ones that are not text messages.
///
/// Returns `false` once the event channel is closed.
async fn forward_updates(
    updates: Vec<Update>,
    offset: &mut Option<i64>,
    events: &mpsc::Sender<InboundMessage>,
) -> bool {
    for update in updates {
        *offset = Some(update.update_id + 1);
        let Some(message) = update.into_inbound() else {
            continue;
        };
        if events.send(message).await.is_err() {
            return false;
        }
    }
    true
}

/// The delay before polling again, or the error that ends polling.
fn retry_delay(error: TransportError, backoff: &mut Backoff) -> Result<Duration, TransportError> {
    if is_fatal(&error) {
        return Err(error);
    }
    match backoff.next_delay() {
        Some(delay) => {
            warn!(error = %error, delay = ?delay, "Polling failed, retrying");
            Ok(delay)
        }
        None => {
            warn!(error = %error, "Retry budget exhausted");
            Err(error)
        }
    }
}

#[async_trait]
impl Adapter for TelegramAdapter {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn connect(&self) -> AdapterResult<()> {
        let me = self
            .client
            .get_me()
            .await
            .map_err(|e| AdapterError::Startup(format!("getMe failed: {e}")))?;

        info!(
            username = me.username.as_deref().unwrap_or("unknown"),
            bot_id = me.id,
            "Telegram bot authenticated"
        );
        Ok(())
    }

    fn sender(&self) -> BoxedSender {
        self.client.clone()
    }

    async fn run(
        self: Arc<Self>,
        events: mpsc::Sender<InboundMessage>,
        shutdown: CancellationToken,
    ) -> AdapterResult<()> {
        let mut offset = None;
        let mut backoff = Backoff::new(self.config.retry.clone());

        info!(
            poll_timeout_secs = self.config.poll_timeout_secs,
            "Telegram polling loop started"
        );

        loop {
            let polled = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                polled = self.client.get_updates(offset) => polled,
            };

            match polled {
                Ok(updates) => {
                    backoff.reset();
                    if !updates.is_empty() {
                        debug!(count = updates.len(), "Received updates");
                    }
                    if !forward_updates(updates, &mut offset, &events).await {
                        info!("Event channel closed, stopping polling");
                        return Ok(());
                    }
                }
                Err(e) => {
                    let delay = retry_delay(e, &mut backoff)?;
                    tokio::select! {
                        biased;
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        info!("Telegram polling loop stopped");
        Ok(())
    }
}

impl ConfigurableAdapter for TelegramAdapter {
    type Config = TelegramConfig;

    fn config_key() -> &'static str {
        "telegram"
    }

    fn from_config(config: Self::Config) -> AdapterResult<Arc<Self>> {
        Ok(Arc::new(Self::new(config)?))
    }
}
