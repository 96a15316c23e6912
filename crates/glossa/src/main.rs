//! The `glossa` command-line interface.
//!
//! ```bash
//! glossa run --config glossa.toml     # serve on Telegram (default command)
//! glossa lookup odds ratio            # query the knowledge base offline
//! glossa terms                        # list every known term
//! glossa check                        # validate configuration and knowledge
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use glossa_adapter_telegram::TelegramAdapter;
use glossa_core::{
    ChatId, InboundMessage, MessageSender, RouteOutcome, SendOptions, TransportResult,
};
use glossa_runtime::GlossaRuntime;
use glossa_runtime::config::{ConfigLoader, GlossaConfig, LogOutput};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "glossa", version, about = "Glossary lookup chat bot")]
struct Cli {
    /// Configuration file; searched in the working and user config directories when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Configuration profile, e.g. `production`. Defaults to `GLOSSA_PROFILE`.
    #[arg(short, long, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect to Telegram and answer messages until stopped.
    Run,
    /// Answer one message offline and print the replies as they would be sent.
    Lookup {
        /// Message text.
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Print every known term.
    Terms,
    /// Validate configuration and knowledge base, then print a summary.
    Check,
}

/// Prints each outbound chunk to stdout.
struct ConsoleSender;

#[async_trait]
impl MessageSender for ConsoleSender {
    async fn send(
        &self,
        _chat_id: ChatId,
        text: &str,
        _options: SendOptions,
    ) -> TransportResult<()> {
        println!("{text}\n");
        Ok(())
    }
}

fn load_config(cli: &Cli, offline: bool) -> Result<GlossaConfig> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.file(path);
    }
    if let Some(profile) = &cli.profile {
        loader = loader.profile(profile);
    }

    let mut config = loader.load().context("failed to load configuration")?;
    // Offline commands print results on stdout.
    if offline && config.logging.output == LogOutput::Stdout {
        config.logging.output = LogOutput::Stderr;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();
    let command = cli.command.take().unwrap_or(Command::Run);
    let offline = !matches!(command, Command::Run);

    let config = load_config(&cli, offline)?;
    let runtime = GlossaRuntime::from_config(&config)
        .await
        .context("failed to start runtime")?;

    match command {
        Command::Run => {
            runtime.register_adapter::<TelegramAdapter>().await?;
            runtime.run().await?;
        }
        Command::Lookup { text } => {
            let router = runtime.router_for(Arc::new(ConsoleSender));
            let message = InboundMessage::new(0, text.join(" "));
            if router.route(&message).await? == RouteOutcome::Ignored {
                eprintln!("(no reply)");
            }
        }
        Command::Terms => {
            for term in runtime.store().list_terms().await? {
                println!("{term}");
            }
        }
        Command::Check => {
            runtime
                .register_adapter::<TelegramAdapter>()
                .await
                .context("telegram adapter configuration is invalid")?;
            let entries = runtime.store().len().await?;
            info!("Configuration is valid");
            println!(
                "knowledge: {} ({}), {entries} entries",
                config.knowledge.kind(),
                config.knowledge.path().display()
            );
            println!(
                "matcher: max_results = {}; reply: max_message_len = {}",
                config.matcher.max_results, config.reply.max_message_len
            );
            println!("adapters: {}", runtime.adapter_count().await);
        }
    }

    Ok(())
}
