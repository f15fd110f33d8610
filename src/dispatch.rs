//! Routes chat messages to the status client and the ingestion pipeline.
//!
//! This is the seam where a chat platform plugs in: it hands over a [`Message`] and posts
//! every returned string back to the channel.

use q2_mapbot_core::ingest::{Attachment, IngestPipeline};
use q2_mapbot_core::status::StatusClient;
use tracing::{debug, info};

use crate::channels::ChannelRules;
use crate::load_config::BotConfig;

pub const STATUS_COMMAND: &str = "!q2";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingAttachment {
    pub url: String,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub channel_id: String,
    pub author: String,
    pub content: String,
    pub attachments: Vec<IncomingAttachment>,
}

/// The address argument of a `!q2 <address>` message.
pub fn status_command(content: &str) -> Option<&str> {
    let mut fields = content.split_whitespace();
    if fields.next()? != STATUS_COMMAND {
        return None;
    }
    fields.next()
}

pub struct Dispatcher {
    status: StatusClient,
    status_channels: ChannelRules,
    pipeline: Option<IngestPipeline>,
    map_channels: ChannelRules,
}

impl Dispatcher {
    pub fn new(
        status: StatusClient,
        status_channels: ChannelRules,
        pipeline: Option<IngestPipeline>,
        map_channels: ChannelRules,
    ) -> Self {
        Self {
            status,
            status_channels,
            pipeline,
            map_channels,
        }
    }

    pub fn from_config(config: BotConfig) -> Self {
        let status = StatusClient::from_config(&config.status.client);
        let (pipeline, map_channels) = match config.ingest {
            Some(ingest) => (
                Some(IngestPipeline::from_config(ingest.pipeline)),
                ingest.channels,
            ),
            None => (None, ChannelRules::default()),
        };
        Self::new(status, config.status.channels, pipeline, map_channels)
    }

    /// Returns the replies to post, in order. Empty when the message is not for us.
    pub async fn handle_message(&self, message: &Message) -> Vec<String> {
        let mut replies = Vec::new();

        if let Some(address) = status_command(&message.content) {
            if self.status_channels.allows(&message.channel_id) {
                info!(
                    author = %message.author,
                    channel = %message.channel_id,
                    address,
                    "Requesting server status"
                );
                replies.push(self.status.report(address).await);
                return replies;
            }
            // Attachments on the same message are still considered.
            debug!(channel = %message.channel_id, "Status command in channel without access");
        }

        if message.attachments.is_empty() {
            return replies;
        }
        let Some(pipeline) = &self.pipeline else {
            debug!("Ingestion not configured, ignoring attachments");
            return replies;
        };
        if !self.map_channels.allows(&message.channel_id) {
            debug!(channel = %message.channel_id, "Attachments in channel without access");
            return replies;
        }

        for incoming in &message.attachments {
            let attachment = Attachment::new(&incoming.url, &incoming.filename, &message.author);
            if let Some(reply) = pipeline.on_attachment(&attachment).await {
                replies.push(reply);
            }
        }
        replies
    }
}
