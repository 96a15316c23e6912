//! Telegram Bot API adapter for Glossa.
//!
//! Receives messages by long-polling `getUpdates` and replies with
//! `sendMessage`. Definitions are sent with `parse_mode = "Markdown"`;
//! every other reply is plain text.
//!
//! ```rust,ignore
//! runtime.register_adapter::<TelegramAdapter>().await?;
//! ```

mod adapter;
pub mod client;
pub mod config;
pub mod model;

pub use adapter::TelegramAdapter;
pub use client::TelegramClient;
pub use config::{RetryConfig, TelegramConfig};
