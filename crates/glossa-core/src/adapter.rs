//! Transport-facing traits.
//!
//! An [`Adapter`] owns the connection to one messaging platform. It pushes
//! [`InboundMessage`]s into the runtime's event channel and hands out a
//! [`MessageSender`] for replies.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{AdapterResult, TransportResult};
use crate::message::{ChatId, InboundMessage, SendOptions};

/// Performs a single outbound send.
///
/// Implementations must not split or reformat `text`; chunking is the
/// [`ReplyDispatcher`](crate::dispatcher::ReplyDispatcher)'s job.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Sends `text` to `chat_id`.
    async fn send(&self, chat_id: ChatId, text: &str, options: SendOptions)
    -> TransportResult<()>;
}

/// A boxed message sender.
pub type BoxedSender = Arc<dyn MessageSender>;

/// A messaging platform integration.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Short adapter name used in logs and configuration.
    fn name(&self) -> &'static str;

    /// Verifies credentials and reachability before serving.
    ///
    /// A failure here is fatal for the process.
    async fn connect(&self) -> AdapterResult<()>;

    /// Returns the sender used to deliver replies.
    fn sender(&self) -> BoxedSender;

    /// Receives events until `shutdown` is cancelled or `events` is closed.
    async fn run(
        self: Arc<Self>,
        events: mpsc::Sender<InboundMessage>,
        shutdown: CancellationToken,
    ) -> AdapterResult<()>;
}

/// A boxed adapter.
pub type BoxedAdapter = Arc<dyn Adapter>;

/// An adapter that can be built from its own configuration section.
///
/// The runtime looks the section up under `adapters.<name>` and falls back
/// to `Config::default()` when it is absent.
pub trait ConfigurableAdapter: Adapter + Sized {
    /// Adapter-specific configuration.
    type Config: DeserializeOwned + Default + Send;

    /// Configuration key and adapter name.
    fn config_key() -> &'static str;

    /// Builds the adapter.
    fn from_config(config: Self::Config) -> AdapterResult<Arc<Self>>;
}
