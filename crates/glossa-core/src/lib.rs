//! # Glossa Core
//!
//! The matching and reply-delivery pipeline of the Glossa glossary bot.
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────┐     ┌────────────┐     ┌─────────┐     ┌─────────────────┐
//! │   Adapter   │────▶│   Router   │────▶│ Matcher │────▶│ ReplyDispatcher │──▶ MessageSender
//! │ (Telegram)  │     │ (commands) │     │(2-phase)│     │   (chunking)    │
//! └─────────────┘     └────────────┘     └────┬────┘     └─────────────────┘
//!                                             │
//!                                      ┌──────▼───────┐
//!                                      │KnowledgeStore│
//!                                      └──────────────┘
//! ```
//!
//! - **Knowledge Store**: immutable term → definition mapping ([`KnowledgeStore`], [`MemoryStore`])
//! - **Matcher**: term-substring match, falling back to keyword scoring ([`Matcher`])
//! - **Reply Dispatcher**: ordered, size-limited, best-effort sends ([`ReplyDispatcher`])
//! - **Message Router**: command filtering and welcome replies ([`MessageRouter`])
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use glossa_core::{Entry, Matcher, MemoryStore, MessageRouter, ReplyDispatcher};
//!
//! let store = Arc::new(MemoryStore::new([
//!     Entry::new("Incidence", "Incidence is the rate of new cases."),
//! ]));
//! let router = MessageRouter::new(
//!     Matcher::new(store),
//!     ReplyDispatcher::new(my_sender),
//! );
//! router.route(&InboundMessage::new(42, "incidence")).await?;
//! ```

pub mod adapter;
pub mod dispatcher;
pub mod error;
pub mod matcher;
pub mod message;
pub mod router;
pub mod store;

pub use adapter::{Adapter, BoxedAdapter, BoxedSender, ConfigurableAdapter, MessageSender};
pub use dispatcher::{DEFAULT_MAX_MESSAGE_LEN, DeliveryReport, ReplyDispatcher, split_chunks};
pub use error::{
    AdapterError, AdapterResult, StoreError, StoreResult, TransportError, TransportResult,
};
pub use matcher::{DEFAULT_MAX_RESULTS, MatchOutcome, Matcher, normalize, tokenize};
pub use message::{ChatId, InboundMessage, RenderMode, Reply, SendOptions};
pub use router::{Acknowledge, MessageRouter, RouteOutcome, RouterConfig};
pub use store::{
    Entry, KnowledgeStore, MemoryStore, ScoredTerm, fold, score_definition, sort_terms,
};

/// Prelude for common imports.
pub mod prelude {
    pub use super::{
        ChatId, Entry, InboundMessage, KnowledgeStore, Matcher, MemoryStore, MessageRouter,
        MessageSender, Reply, ReplyDispatcher, SendOptions,
    };
}
