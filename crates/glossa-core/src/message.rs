//! Inbound and outbound message shapes.
//!
//! The core never sees a transport envelope. Adapters reduce whatever the
//! platform delivers to an [`InboundMessage`], and receive [`Reply`] payloads
//! back through [`MessageSender`](crate::adapter::MessageSender).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies the conversation a message came from and replies go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A user message handed to the router by an adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Chat the message was posted in.
    pub chat_id: ChatId,
    /// Display name of the sender, if the platform supplied one.
    pub sender_name: Option<String>,
    /// Raw message text.
    pub text: String,
}

impl InboundMessage {
    /// Creates an inbound message without a sender name.
    pub fn new(chat_id: impl Into<ChatId>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            sender_name: None,
            text: text.into(),
        }
    }

    /// Sets the sender display name.
    pub fn with_sender(mut self, name: impl Into<String>) -> Self {
        self.sender_name = Some(name.into());
        self
    }
}

/// How the transport should render outbound text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderMode {
    /// Send the text verbatim.
    #[default]
    Plain,
    /// Interpret lightweight markup (bold, italics, links).
    LightMarkup,
}

/// Per-send formatting options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendOptions {
    /// Render mode for the text.
    pub render_mode: RenderMode,
}

impl SendOptions {
    /// Plain text, no markup.
    pub const PLAIN: Self = Self {
        render_mode: RenderMode::Plain,
    };

    /// Lightweight markup rendering.
    pub const MARKUP: Self = Self {
        render_mode: RenderMode::LightMarkup,
    };
}

/// One outbound payload. May be split into several sends by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Payload text.
    pub text: String,
    /// Formatting options applied to every chunk of this payload.
    pub options: SendOptions,
}

impl Reply {
    /// A plain-text reply.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            options: SendOptions::PLAIN,
        }
    }

    /// A reply rendered with lightweight markup.
    pub fn markup(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            options: SendOptions::MARKUP,
        }
    }
}
