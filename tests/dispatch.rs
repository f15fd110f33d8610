// Integration tests for message routing: status commands and attachment ingestion,
// each gated by its channel rules.

use std::sync::Arc;
use std::time::Duration;

use q2_mapbot::channels::ChannelRules;
use q2_mapbot::dispatch::{Dispatcher, IncomingAttachment, Message};
use q2_mapbot_core::bsp::{self, BspValidator};
use q2_mapbot_core::config::PipelineConfig;
use q2_mapbot_core::contract::{MockDownloader, MockRepository, PublishTransaction};
use q2_mapbot_core::ingest::IngestPipeline;
use q2_mapbot_core::status::StatusClient;
use tempfile::{tempdir, TempDir};
use tokio::net::UdpSocket;

const REPLY: &[u8] = b"\xff\xff\xff\xffprint\n\\hostname\\MyServer\\mapname\\q2dm1\\maxclients\\8\n3 120 \"Alice\"\n";

async fn serve_once() -> String {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let address = socket.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        let mut buf = [0u8; 64];
        let (_, peer) = socket.recv_from(&mut buf).await.unwrap();
        socket.send_to(REPLY, peer).await.unwrap();
    });
    address
}

fn text(channel: &str, content: &str) -> Message {
    Message {
        channel_id: channel.into(),
        author: "alice".into(),
        content: content.into(),
        attachments: Vec::new(),
    }
}

fn upload(channel: &str, filename: &str) -> Message {
    Message {
        channel_id: channel.into(),
        author: "alice".into(),
        content: String::new(),
        attachments: vec![IncomingAttachment {
            url: format!("https://cdn.example.com/attachments/1/2/{filename}"),
            filename: filename.into(),
        }],
    }
}

fn status_only(channels: &str) -> Dispatcher {
    Dispatcher::new(
        StatusClient::new(Duration::from_secs(2)),
        ChannelRules::parse(channels),
        None,
        ChannelRules::default(),
    )
}

#[tokio::test]
async fn status_command_in_allowed_channel_gets_report() {
    let address = serve_once().await;
    let dispatcher = status_only("all,-9");

    let replies = dispatcher
        .handle_message(&text("1", &format!("!q2 {address}")))
        .await;

    assert_eq!(replies, vec!["MyServer\nq2dm1 - 1/8\n[`Alice`]".to_string()]);
}

#[tokio::test]
async fn status_command_in_denied_channel_is_ignored() {
    let address = serve_once().await;
    let dispatcher = status_only("all,-9");

    let replies = dispatcher
        .handle_message(&text("9", &format!("!q2 {address}")))
        .await;

    assert!(replies.is_empty());
}

#[tokio::test]
async fn chatter_is_ignored() {
    let dispatcher = status_only("all");

    assert!(dispatcher.handle_message(&text("1", "gg wp")).await.is_empty());
    assert!(dispatcher.handle_message(&text("1", "!q2")).await.is_empty());
}

#[tokio::test]
async fn attachments_without_ingestion_are_ignored() {
    let dispatcher = status_only("all");

    assert!(dispatcher
        .handle_message(&upload("1", "q2dm1.bsp"))
        .await
        .is_empty());
}

struct Workspace {
    repo: TempDir,
    scratch: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            repo: tempdir().unwrap(),
            scratch: tempdir().unwrap(),
        }
    }

    fn dispatcher(
        &self,
        map_channels: &str,
        downloader: MockDownloader,
        repository: MockRepository,
    ) -> Dispatcher {
        let mut config = PipelineConfig::new(self.repo.path());
        config.temp_dir = self.scratch.path().to_path_buf();
        let pipeline = IngestPipeline::new(
            config,
            Arc::new(downloader),
            Arc::new(BspValidator::new()),
            Arc::new(repository),
        );
        Dispatcher::new(
            StatusClient::new(Duration::from_secs(2)),
            ChannelRules::default(),
            Some(pipeline),
            ChannelRules::parse(map_channels),
        )
    }
}

#[tokio::test]
async fn map_upload_in_map_channel_is_published() {
    let workspace = Workspace::new();
    let map = bsp::build("{\n\"classname\" \"worldspawn\"\n}\n", &["e1u1/floor1_3"]);
    let size = map.len();
    let mut downloader = MockDownloader::new();
    downloader
        .expect_download()
        .times(1)
        .returning(move |_| Ok(map.clone()));
    let mut repository = MockRepository::new();
    repository
        .expect_publish()
        .times(1)
        .withf(|tx: &PublishTransaction| tx.message == "Added q2dm1.bsp, submitted by alice")
        .returning(|_| Ok(()));
    let dispatcher = workspace.dispatcher("5", downloader, repository);

    let replies = dispatcher.handle_message(&upload("5", "q2dm1.bsp")).await;

    assert_eq!(replies.len(), 1);
    assert!(replies[0].starts_with("Added `q2dm1.bsp`"), "{}", replies[0]);
    assert!(replies[0].contains(&format!("{size} bytes")), "{}", replies[0]);
    assert!(workspace.repo.path().join("maps/q2dm1.bsp").exists());
}

#[tokio::test]
async fn map_upload_outside_map_channels_is_ignored() {
    let workspace = Workspace::new();
    let mut downloader = MockDownloader::new();
    downloader.expect_download().never();
    let mut repository = MockRepository::new();
    repository.expect_publish().never();
    let dispatcher = workspace.dispatcher("5", downloader, repository);

    let replies = dispatcher.handle_message(&upload("6", "q2dm1.bsp")).await;

    assert!(replies.is_empty());
}

#[tokio::test]
async fn unrecognized_attachment_gets_no_reply() {
    let workspace = Workspace::new();
    let mut downloader = MockDownloader::new();
    downloader.expect_download().never();
    let mut repository = MockRepository::new();
    repository.expect_publish().never();
    let dispatcher = workspace.dispatcher("all", downloader, repository);

    let replies = dispatcher.handle_message(&upload("6", "screenshot.png")).await;

    assert!(replies.is_empty());
}

#[tokio::test]
async fn status_text_outside_status_channels_still_ingests_attachments() {
    let workspace = Workspace::new();
    let map = bsp::build("{\n}\n", &["sky"]);
    let mut downloader = MockDownloader::new();
    downloader
        .expect_download()
        .times(1)
        .returning(move |_| Ok(map.clone()));
    let mut repository = MockRepository::new();
    repository.expect_publish().times(1).returning(|_| Ok(()));
    // No status channels at all; map uploads allowed in channel 5.
    let dispatcher = workspace.dispatcher("5", downloader, repository);
    let mut message = upload("5", "q2dm1.bsp");
    message.content = "!q2 127.0.0.1:27910".into();

    let replies = dispatcher.handle_message(&message).await;

    assert_eq!(replies.len(), 1);
    assert!(replies[0].starts_with("Added `q2dm1.bsp`"), "{}", replies[0]);
}
