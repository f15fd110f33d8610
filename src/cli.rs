/// # q2-mapbot CLI Interface (Module)
///
/// Command parsing and the async entrypoint. All protocol and ingestion logic lives in
/// [`q2-mapbot-core`]; this module only wires config, dispatcher and stdout together.
///
/// - `status` queries one server directly, no config needed.
/// - `message` and `attach` feed a simulated chat message through the [`Dispatcher`],
///   applying the channel rules from the config file, and print every reply.
///
/// [`q2-mapbot-core`]: ../../q2_mapbot_core/
use crate::dispatch::{Dispatcher, IncomingAttachment, Message};
use crate::load_config::load_config;
use anyhow::Result;
use clap::{Parser, Subcommand};
use q2_mapbot_core::classify::file_name_from_url;
use q2_mapbot_core::status::StatusClient;
use std::path::PathBuf;
use std::time::Duration;

/// CLI for q2-mapbot: Quake 2 server status and map repository uploads.
#[derive(Parser)]
#[clap(
    name = "q2-mapbot",
    version,
    about = "Query Quake 2 servers and publish uploaded maps to a git repository"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Query a server and print its status report
    Status {
        /// Server address, host:port
        address: String,
        /// Read deadline in milliseconds
        #[clap(long, default_value_t = 2000)]
        timeout_ms: u64,
    },
    /// Handle a chat message as if it had been posted to a channel
    Message {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        #[clap(long)]
        channel: String,
        #[clap(long, default_value = "cli")]
        author: String,
        /// Message text, e.g. "!q2 example.com:27910"
        text: String,
    },
    /// Ingest an attachment URL as if it had been posted to a channel
    Attach {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        #[clap(long)]
        channel: String,
        #[clap(long, default_value = "cli")]
        author: String,
        #[clap(long)]
        url: String,
        /// File name of the attachment; defaults to the last URL segment
        #[clap(long)]
        filename: Option<String>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Status {
            address,
            timeout_ms,
        } => {
            let client = StatusClient::new(Duration::from_millis(timeout_ms));
            println!("{}", client.report(&address).await);
        }
        Commands::Message {
            config,
            channel,
            author,
            text,
        } => {
            let dispatcher = Dispatcher::from_config(load_config(config)?);
            let message = Message {
                channel_id: channel,
                author,
                content: text,
                attachments: Vec::new(),
            };
            print_replies(dispatcher.handle_message(&message).await);
        }
        Commands::Attach {
            config,
            channel,
            author,
            url,
            filename,
        } => {
            let dispatcher = Dispatcher::from_config(load_config(config)?);
            let filename = filename.unwrap_or_else(|| file_name_from_url(&url).to_string());
            let message = Message {
                channel_id: channel,
                author,
                content: String::new(),
                attachments: vec![IncomingAttachment { url, filename }],
            };
            print_replies(dispatcher.handle_message(&message).await);
        }
    }
    Ok(())
}

fn print_replies(replies: Vec<String>) {
    if replies.is_empty() {
        tracing::info!("No reply for this message");
    }
    for reply in replies {
        println!("{reply}");
    }
}
