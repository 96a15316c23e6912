//! Bot API wire types.
//!
//! Only the fields the adapter reads are modelled; serde ignores the rest.

use glossa_core::{InboundMessage, TransportError};
use serde::Deserialize;

/// The envelope every Bot API method returns.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
}

impl<T> ApiResponse<T> {
    /// Unwraps `result`, turning `ok = false` into [`TransportError::Api`].
    pub fn into_result(self) -> Result<T, TransportError> {
        if !self.ok {
            return Err(TransportError::Api {
                code: self.error_code.unwrap_or_default(),
                description: self.description.unwrap_or_default(),
            });
        }
        self.result
            .ok_or_else(|| TransportError::InvalidResponse("missing result".into()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl User {
    /// First name, followed by the last name when present.
    pub fn display_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {last}", self.first_name),
            None => self.first_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

impl Update {
    /// Converts a text message from a human into an [`InboundMessage`].
    ///
    /// Returns `None` for other update kinds, non-text messages and
    /// messages sent by bots.
    pub fn into_inbound(self) -> Option<InboundMessage> {
        let message = self.message?;
        let text = message.text?;

        if message.from.as_ref().is_some_and(|u| u.is_bot) {
            return None;
        }

        let inbound = InboundMessage::new(message.chat.id, text);
        Some(match message.from {
            Some(user) => inbound.with_sender(user.display_name()),
            None => inbound,
        })
    }
}
