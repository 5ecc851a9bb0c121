//! Common test utilities for integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use riftlog_core::{DirectoryObserver, DirectorySubscription, Result, RiftlogError};
use riftlog_types::DirectoryEvent;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Directory observer fed by the test through a channel.
pub struct ChannelDirectoryObserver {
    events: Mutex<Option<mpsc::UnboundedReceiver<DirectoryEvent>>>,
}

impl ChannelDirectoryObserver {
    pub fn new() -> (Self, mpsc::UnboundedSender<DirectoryEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                events: Mutex::new(Some(rx)),
            },
            tx,
        )
    }
}

impl DirectoryObserver for ChannelDirectoryObserver {
    fn subscribe(&self, directory: &Path) -> Result<DirectorySubscription> {
        self.events
            .lock()
            .unwrap()
            .take()
            .map(DirectorySubscription::from_channel)
            .ok_or_else(|| RiftlogError::DirectoryNotFound(directory.to_path_buf()))
    }
}

/// A timestamp `secs_ago` in the past, truncated to whole seconds.
pub fn recent(secs_ago: i64) -> DateTime<Utc> {
    let at = Utc::now() - Duration::seconds(secs_ago);
    at - Duration::nanoseconds(at.timestamp_subsec_nanos() as i64)
}

pub fn log_file_name(channel: &str, started: DateTime<Utc>, character_id: u64) -> String {
    format!("{}_{}_{}.txt", channel, started.format("%Y%m%d_%H%M%S"), character_id)
}

pub fn message_line(at: DateTime<Utc>, author: &str, text: &str) -> String {
    format!("[ {} ] {} > {}\r\n", at.format("%Y.%m.%d %H:%M:%S"), author, text)
}

/// Write a chat log the way the game client does (UTF-16LE with BOM).
pub fn write_log(
    dir: &Path,
    channel: &str,
    started: DateTime<Utc>,
    character_id: u64,
    lines: &[String],
) -> PathBuf {
    let path = dir.join(log_file_name(channel, started, character_id));
    let text = format!(
        "\r\n\r\n        ---------------------------------------------------------------\r\n\r\n\
         \x20         Channel ID:      -1\r\n\
         \x20         Channel Name:    {}\r\n\
         \x20         Listener:        Test Pilot\r\n\
         \x20         Session started: {}\r\n\
         \x20       ---------------------------------------------------------------\r\n{}",
        channel,
        started.format("%Y.%m.%d %H:%M:%S"),
        lines.concat()
    );
    std::fs::write(&path, riftlog_core::parser::encode_utf16le(&text)).unwrap();
    path
}
