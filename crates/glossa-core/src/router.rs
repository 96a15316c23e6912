//! Inbound message routing.
//!
//! Every inbound message ends in one of three states:
//!
//! - **ignored**: empty after trimming, or a command other than help/start
//! - **welcomed**: `/start` or `/help`; the reply lists every known term
//! - **routed**: anything else; the text goes through the [`Matcher`] and
//!   the outcome is delivered by the [`ReplyDispatcher`]
//!
//! [`MessageRouter`] also implements `tower::Service<InboundMessage>`, so
//! middleware such as timeouts or concurrency limits can be layered on top.

use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tower::Service;
use tracing::{debug, trace};

use crate::dispatcher::{DeliveryReport, ReplyDispatcher};
use crate::error::{StoreError, StoreResult};
use crate::matcher::{MatchOutcome, Matcher};
use crate::message::{InboundMessage, Reply};

/// Commands that trigger the welcome reply.
const WELCOME_COMMANDS: [&str; 2] = ["start", "help"];

/// User-facing texts and command syntax.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Prefix that marks a message as a command (default: `/`).
    pub command_prefix: String,

    /// First line of the welcome reply. `{name}` is replaced by the sender's
    /// display name.
    pub welcome_header: String,

    /// Sent when a message holds no usable keywords.
    pub no_keywords: String,

    /// Sent when nothing in the knowledge base matches.
    pub no_information: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            command_prefix: "/".to_string(),
            welcome_header: "Hello, {name}! Send me a term or a few keywords and I will look up \
                             the definition.\n\nKnown terms:"
                .to_string(),
            no_keywords: "Please provide keywords.".to_string(),
            no_information: "Sorry, I have no information on that topic.".to_string(),
        }
    }
}

/// What the router did with one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Nothing was sent.
    Ignored,
    /// The welcome reply was delivered.
    Welcomed(DeliveryReport),
    /// The match outcome was delivered.
    Routed(DeliveryReport),
}

/// Classification of raw text before any lookup happens.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Intent<'a> {
    Ignore,
    Welcome,
    Lookup(&'a str),
}

/// Connects the matcher to the reply dispatcher.
#[derive(Clone)]
pub struct MessageRouter {
    matcher: Matcher,
    dispatcher: ReplyDispatcher,
    config: Arc<RouterConfig>,
}

impl MessageRouter {
    /// Creates a router with default texts.
    pub fn new(matcher: Matcher, dispatcher: ReplyDispatcher) -> Self {
        Self::with_config(matcher, dispatcher, RouterConfig::default())
    }

    /// Creates a router with custom texts.
    pub fn with_config(matcher: Matcher, dispatcher: ReplyDispatcher, config: RouterConfig) -> Self {
        Self {
            matcher,
            dispatcher,
            config: Arc::new(config),
        }
    }

    /// Returns the matcher.
    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Returns the router configuration.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    fn classify<'a>(&self, text: &'a str) -> Intent<'a> {
        let text = text.trim();
        if text.is_empty() {
            return Intent::Ignore;
        }

        let Some(command) = text.strip_prefix(self.config.command_prefix.as_str()) else {
            return Intent::Lookup(text);
        };

        // "/help@glossa_bot extra" -> "help"
        let name = command
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .split('@')
            .next()
            .unwrap_or_default()
            .to_lowercase();

        if WELCOME_COMMANDS.contains(&name.as_str()) {
            Intent::Welcome
        } else {
            Intent::Ignore
        }
    }

    /// Builds the welcome text for `sender`.
    pub async fn welcome_text(&self, sender: Option<&str>) -> StoreResult<String> {
        let name = sender.filter(|s| !s.trim().is_empty()).unwrap_or("there");
        let mut text = self.config.welcome_header.replace("{name}", name);
        for term in self.matcher.store().list_terms().await? {
            text.push_str("\n• ");
            text.push_str(&term);
        }
        Ok(text)
    }

    /// Converts a match outcome to reply payloads.
    pub fn replies_for(&self, outcome: MatchOutcome) -> Vec<Reply> {
        match outcome {
            MatchOutcome::Empty => Vec::new(),
            MatchOutcome::Definitions(defs) => defs.into_iter().map(Reply::markup).collect(),
            MatchOutcome::NoKeywords => vec![Reply::plain(self.config.no_keywords.clone())],
            MatchOutcome::NoInformation => vec![Reply::plain(self.config.no_information.clone())],
        }
    }

    /// Handles one inbound message to completion.
    ///
    /// Send failures are absorbed by the dispatcher; only store failures are
    /// returned.
    pub async fn route(&self, message: &InboundMessage) -> StoreResult<RouteOutcome> {
        match self.classify(&message.text) {
            Intent::Ignore => {
                trace!(chat_id = %message.chat_id, "Message ignored");
                Ok(RouteOutcome::Ignored)
            }
            Intent::Welcome => {
                debug!(chat_id = %message.chat_id, "Sending welcome");
                let text = self.welcome_text(message.sender_name.as_deref()).await?;
                let report = self
                    .dispatcher
                    .deliver(message.chat_id, &[Reply::plain(text)])
                    .await;
                Ok(RouteOutcome::Welcomed(report))
            }
            Intent::Lookup(text) => {
                let outcome = self.matcher.find(text).await?;
                let replies = self.replies_for(outcome);
                if replies.is_empty() {
                    return Ok(RouteOutcome::Ignored);
                }
                let report = self.dispatcher.deliver(message.chat_id, &replies).await;
                Ok(RouteOutcome::Routed(report))
            }
        }
    }
}

impl std::fmt::Debug for MessageRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageRouter")
            .field("matcher", &self.matcher)
            .field("dispatcher", &self.dispatcher)
            .field("command_prefix", &self.config.command_prefix)
            .finish()
    }
}

// ============================================================================
// Tower Service Implementation
// ============================================================================

impl Service<InboundMessage> for MessageRouter {
    type Response = RouteOutcome;
    type Error = StoreError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, message: InboundMessage) -> Self::Future {
        let router = self.clone();
        Box::pin(async move { router.route(&message).await })
    }
}

/// A service that never fails, wrapping [`MessageRouter`] errors into logs.
///
/// Useful for transports that only need an acknowledgment.
#[derive(Clone, Debug)]
pub struct Acknowledge<S> {
    inner: S,
}

impl<S> Acknowledge<S> {
    /// Wraps `inner`.
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S> Service<InboundMessage> for Acknowledge<S>
where
    S: Service<InboundMessage, Response = RouteOutcome, Error = StoreError>,
    S::Future: Send + 'static,
{
    type Response = RouteOutcome;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        match self.inner.poll_ready(cx) {
            Poll::Ready(_) => Poll::Ready(Ok(())),
            Poll::Pending => Poll::Pending,
        }
    }

    fn call(&mut self, message: InboundMessage) -> Self::Future {
        let chat_id = message.chat_id;
        let fut = self.inner.call(message);
        Box::pin(async move {
            match fut.await {
                Ok(outcome) => Ok(outcome),
                Err(e) => {
                    tracing::error!(chat_id = %chat_id, error = %e, "Knowledge lookup failed");
                    Ok(RouteOutcome::Ignored)
                }
            }
        })
    }
}
