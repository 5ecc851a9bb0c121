//! Chat log file descriptors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::SystemTime;

/// A chat log file discovered in the watched directory.
///
/// Everything here comes from the file name and file system metadata; the
/// header has not been read yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLogFile {
    pub path: PathBuf,
    /// Final path component, used as the identity of the file
    pub file_name: String,
    /// Channel name as encoded in the file name
    pub channel_name: String,
    /// Character that wrote this log
    pub character_id: u64,
    /// Session start encoded in the file name (UTC)
    pub date_time: DateTime<Utc>,
    /// Last-modified time at the moment the file was matched
    pub last_modified: SystemTime,
}

impl ChatLogFile {
    /// Whether the file is still present on disk.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

/// Header information of a chat log file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogFileMetadata {
    pub character_id: u64,
    pub channel_id: String,
    pub channel_name: String,
    /// Name of the character the log was written for
    pub listener: String,
    pub session_started: DateTime<Utc>,
}
