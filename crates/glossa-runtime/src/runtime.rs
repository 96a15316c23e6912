//! Runtime orchestration.
//!
//! The runtime owns the knowledge base and the registered adapters. On
//! [`run`](GlossaRuntime::run) it connects every adapter, then gives each
//! one an event channel and a router bound to that adapter's sender.
//! Every inbound message is handled on its own task, so a slow send never
//! blocks the next message.
//!
//! ```rust,ignore
//! use glossa_runtime::GlossaRuntime;
//! use glossa_adapter_telegram::TelegramAdapter;
//!
//! let runtime = GlossaRuntime::builder()
//!     .config_file("glossa.toml")
//!     .build()
//!     .await?;
//! runtime.register_adapter::<TelegramAdapter>().await?;
//! runtime.run().await?;
//! ```

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;

use glossa_core::{
    Acknowledge, AdapterResult, BoxedAdapter, BoxedSender, ConfigurableAdapter, InboundMessage,
    KnowledgeStore, Matcher, MessageRouter, ReplyDispatcher, RouteOutcome,
};
use tokio::signal;
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::config::{ConfigError, ConfigLoader, GlossaConfig, validate_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::{knowledge, logging};

/// The Glossa runtime.
pub struct GlossaRuntime {
    config: GlossaConfig,
    store: Arc<dyn KnowledgeStore>,
    adapters: RwLock<Vec<BoxedAdapter>>,
}

impl GlossaRuntime {
    /// Creates a runtime builder.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Validates `config`, initializes logging and opens the knowledge base.
    pub async fn from_config(config: &GlossaConfig) -> RuntimeResult<Self> {
        validate_config(config)?;
        logging::init_from_config(&config.logging);

        let store = knowledge::load(&config.knowledge).await?;

        info!(
            log_level = %config.logging.level,
            max_results = config.matcher.max_results,
            max_message_len = config.reply.max_message_len,
            "Runtime initialized from configuration"
        );

        Ok(Self::with_store(config.clone(), store))
    }

    /// Creates a runtime around an already opened store.
    ///
    /// Neither validates the configuration nor touches logging.
    pub fn with_store(config: GlossaConfig, store: Arc<dyn KnowledgeStore>) -> Self {
        Self {
            config,
            store,
            adapters: RwLock::new(Vec::new()),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &GlossaConfig {
        &self.config
    }

    /// Returns the knowledge base.
    pub fn store(&self) -> &Arc<dyn KnowledgeStore> {
        &self.store
    }

    /// Builds a router that replies through `sender`.
    pub fn router_for(&self, sender: BoxedSender) -> MessageRouter {
        let matcher =
            Matcher::new(Arc::clone(&self.store)).max_results(self.config.matcher.max_results);
        let dispatcher =
            ReplyDispatcher::new(sender).max_message_len(self.config.reply.max_message_len);
        MessageRouter::with_config(matcher, dispatcher, self.config.router.clone())
    }

    /// Registers an adapter built from its `adapters.<key>` section.
    ///
    /// Falls back to the adapter's default configuration when the section
    /// is absent.
    pub async fn register_adapter<A>(&self) -> RuntimeResult<()>
    where
        A: ConfigurableAdapter + 'static,
    {
        let key = A::config_key();

        let config: A::Config = match self.config.adapters.get(key) {
            Some(value) => value.deserialize().map_err(|e| ConfigError::AdapterConfig {
                adapter: key.to_string(),
                reason: e.to_string(),
            })?,
            None => {
                warn!(
                    adapter = key,
                    "No configuration found for adapter, using default"
                );
                Default::default()
            }
        };

        let adapter: BoxedAdapter = A::from_config(config)?;
        self.add_adapter(adapter).await;
        Ok(())
    }

    /// Registers an already built adapter.
    pub async fn add_adapter(&self, adapter: BoxedAdapter) {
        info!(adapter = adapter.name(), "Registered adapter");
        self.adapters.write().await.push(adapter);
    }

    /// Returns the number of registered adapters.
    pub async fn adapter_count(&self) -> usize {
        self.adapters.read().await.len()
    }

    /// Runs until Ctrl+C or SIGTERM.
    pub async fn run(&self) -> RuntimeResult<()> {
        info!("Glossa runtime is starting. Press Ctrl+C to stop.");
        self.run_until(wait_for_shutdown()).await
    }

    /// Runs until `shutdown` resolves or an adapter fails.
    ///
    /// Adapter connection failures are returned before any event is
    /// served. After shutdown, in-flight messages are allowed to finish.
    pub async fn run_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        let adapters = self.adapters.read().await.clone();
        if adapters.is_empty() {
            return Err(RuntimeError::NoAdapters);
        }

        for adapter in &adapters {
            adapter.connect().await?;
            info!(adapter = adapter.name(), "Adapter connected");
        }

        let token = CancellationToken::new();
        let mut tasks: JoinSet<(&'static str, AdapterResult<()>)> = JoinSet::new();

        for adapter in adapters {
            let name = adapter.name();
            let (events_tx, events_rx) = mpsc::channel(self.config.runtime.event_buffer);
            let router = self.router_for(adapter.sender());

            tasks.spawn(
                serve_events(router, events_rx, token.clone())
                    .instrument(info_span!("events", adapter = name)),
            );

            let adapter_token = token.clone();
            tasks.spawn(
                async move { (name, adapter.run(events_tx, adapter_token).await) }
                    .instrument(info_span!("adapter", adapter = name)),
            );
        }

        info!("Runtime started");

        let mut failure: Option<RuntimeError> = None;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown, if !token.is_cancelled() => {
                    info!("Shutdown requested");
                    token.cancel();
                }
                joined = tasks.join_next() => match joined {
                    None => break,
                    Some(Ok((name, Ok(())))) => debug!(adapter = name, "Task finished"),
                    Some(Ok((name, Err(e)))) => {
                        error!(adapter = name, error = %e, "Adapter stopped with an error");
                        failure.get_or_insert(e.into());
                        token.cancel();
                    }
                    Some(Err(e)) => {
                        error!(error = %e, "Runtime task panicked");
                        failure.get_or_insert(RuntimeError::TaskFailed(e.to_string()));
                        token.cancel();
                    }
                },
            }
        }

        info!("Runtime stopped");
        failure.map_or(Ok(()), Err)
    }
}

type Handlers = JoinSet<Result<RouteOutcome, Infallible>>;

/// Handles events from one adapter until the channel closes or `shutdown`
/// is cancelled, then waits for in-flight messages.
///
/// Messages still buffered at shutdown are handled too: the adapter has
/// already acknowledged them upstream.
async fn serve_events(
    router: MessageRouter,
    mut events: mpsc::Receiver<InboundMessage>,
    shutdown: CancellationToken,
) -> (&'static str, AdapterResult<()>) {
    let service = Acknowledge::new(router);
    let mut handlers = JoinSet::new();
    let spawn = |handlers: &mut Handlers, message: InboundMessage| {
        let span = info_span!("message", chat_id = %message.chat_id);
        handlers.spawn(service.clone().oneshot(message).instrument(span));
    };

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                events.close();
                let mut drained = 0usize;
                while let Ok(message) = events.try_recv() {
                    spawn(&mut handlers, message);
                    drained += 1;
                }
                if drained > 0 {
                    debug!(drained, "Handling buffered messages before shutdown");
                }
                break;
            }
            event = events.recv() => match event {
                Some(message) => spawn(&mut handlers, message),
                None => break,
            },
            Some(joined) = handlers.join_next(), if !handlers.is_empty() => {
                if let Err(e) = joined {
                    error!(error = %e, "Message handler panicked");
                }
            }
        }
    }

    if !handlers.is_empty() {
        debug!(in_flight = handlers.len(), "Waiting for in-flight messages");
    }
    while let Some(joined) = handlers.join_next().await {
        if let Err(e) = joined {
            error!(error = %e, "Message handler panicked");
        }
    }

    ("events", Ok(()))
}

/// Waits for Ctrl+C or, on Unix, SIGTERM.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
                return;
            }
            Err(e) => warn!(error = %e, "Failed to register SIGTERM handler"),
        }
    }

    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            error!(error = %e, "Failed to listen for Ctrl+C, running until killed");
            std::future::pending::<()>().await;
        }
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder that loads configuration and opens the runtime.
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: GlossaConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Loads configuration and builds the runtime.
    pub async fn build(self) -> RuntimeResult<GlossaRuntime> {
        let config = self.config_loader.load()?;
        GlossaRuntime::from_config(&config).await
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use glossa_core::{
        Adapter, AdapterError, ChatId, Entry, MemoryStore, MessageSender, SendOptions,
        TransportResult,
    };
    use parking_lot::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Outbox {
        sent: Mutex<Vec<(ChatId, String)>>,
    }

    #[async_trait]
    impl MessageSender for Outbox {
        async fn send(
            &self,
            chat_id: ChatId,
            text: &str,
            _options: SendOptions,
        ) -> TransportResult<()> {
            self.sent.lock().push((chat_id, text.to_string()));
            Ok(())
        }
    }

    struct ScriptedAdapter {
        outbox: Arc<Outbox>,
        script: Vec<InboundMessage>,
        fail_connect: bool,
        fail_run: bool,
    }

    impl ScriptedAdapter {
        fn new(script: Vec<InboundMessage>) -> Self {
            Self {
                outbox: Arc::default(),
                script,
                fail_connect: false,
                fail_run: false,
            }
        }
    }

    #[async_trait]
    impl Adapter for ScriptedAdapter {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn connect(&self) -> AdapterResult<()> {
            if self.fail_connect {
                return Err(AdapterError::Startup("bad credentials".into()));
            }
            Ok(())
        }

        fn sender(&self) -> BoxedSender {
            self.outbox.clone()
        }

        async fn run(
            self: Arc<Self>,
            events: mpsc::Sender<InboundMessage>,
            shutdown: CancellationToken,
        ) -> AdapterResult<()> {
            for message in self.script.clone() {
                if events.send(message).await.is_err() {
                    return Ok(());
                }
            }
            if self.fail_run {
                return Err(AdapterError::internal("connection lost"));
            }
            shutdown.cancelled().await;
            Ok(())
        }
    }

    fn runtime() -> GlossaRuntime {
        let store = Arc::new(MemoryStore::new([
            Entry::new("Incidence", "Rate of new cases."),
            Entry::new("Prevalence", "Proportion of existing cases."),
        ]));
        GlossaRuntime::with_store(GlossaConfig::default(), store)
    }

    #[tokio::test]
    async fn test_run_without_adapters_fails() {
        let result = runtime().run_until(async {}).await;
        assert!(matches!(result, Err(RuntimeError::NoAdapters)));
    }

    #[tokio::test]
    async fn test_messages_are_answered() {
        let runtime = runtime();
        let adapter = Arc::new(ScriptedAdapter::new(vec![
            InboundMessage::new(1, "incidence"),
            InboundMessage::new(2, "/settings"),
            InboundMessage::new(3, "/start").with_sender("Ada"),
        ]));
        let outbox = Arc::clone(&adapter.outbox);
        runtime.add_adapter(adapter).await;

        let wait_outbox = Arc::clone(&outbox);
        runtime
            .run_until(async move {
                for _ in 0..200 {
                    if wait_outbox.sent.lock().len() >= 2 {
                        break;
                    }
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            })
            .await
            .unwrap();

        let mut sent = outbox.sent.lock().clone();
        sent.sort_by_key(|(chat, _)| chat.0);
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], (ChatId(1), "Rate of new cases.".to_string()));
        assert_eq!(sent[1].0, ChatId(3));
        assert!(sent[1].1.starts_with("Hello, Ada!"));
    }

    #[tokio::test]
    async fn test_connect_failure_is_fatal() {
        let runtime = runtime();
        let mut adapter = ScriptedAdapter::new(Vec::new());
        adapter.fail_connect = true;
        runtime.add_adapter(Arc::new(adapter)).await;

        let result = runtime.run_until(std::future::pending()).await;
        assert!(matches!(
            result,
            Err(RuntimeError::Adapter(AdapterError::Startup(_)))
        ));
    }

    #[tokio::test]
    async fn test_adapter_error_stops_runtime() {
        let runtime = runtime();
        let mut adapter = ScriptedAdapter::new(Vec::new());
        adapter.fail_run = true;
        runtime.add_adapter(Arc::new(adapter)).await;

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            runtime.run_until(std::future::pending()),
        )
        .await
        .unwrap();
        assert!(matches!(
            result,
            Err(RuntimeError::Adapter(AdapterError::Internal(_)))
        ));
    }

    #[tokio::test]
    async fn test_buffered_messages_handled_on_shutdown() {
        let runtime = runtime();
        let outbox = Arc::new(Outbox::default());
        let router = runtime.router_for(outbox.clone());

        let (tx, rx) = mpsc::channel(8);
        tx.send(InboundMessage::new(1, "incidence")).await.unwrap();
        tx.send(InboundMessage::new(2, "prevalence")).await.unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let (_, result) = serve_events(router, rx, token).await;
        assert!(result.is_ok());

        let mut sent = outbox.sent.lock().clone();
        sent.sort_by_key(|(chat, _)| chat.0);
        assert_eq!(
            sent,
            [
                (ChatId(1), "Rate of new cases.".to_string()),
                (ChatId(2), "Proportion of existing cases.".to_string()),
            ]
        );
        // The sender half stays open; closing the receiver rejects late sends.
        assert!(tx.send(InboundMessage::new(3, "bias")).await.is_err());
    }

    #[tokio::test]
    async fn test_router_uses_configured_limits() {
        let mut config = GlossaConfig::default();
        config.reply.max_message_len = 7;
        let store = Arc::new(MemoryStore::new([Entry::new("Bias", "Systematic error.")]));
        let runtime = GlossaRuntime::with_store(config, store);

        let outbox = Arc::new(Outbox::default());
        let router = runtime.router_for(outbox.clone());
        router.route(&InboundMessage::new(9, "bias")).await.unwrap();

        let texts: Vec<_> = outbox.sent.lock().iter().map(|(_, t)| t.clone()).collect();
        assert_eq!(texts, ["Systema", "tic err", "or."]);
    }
}
