//! Parser for the game client's chat log format.
//!
//! A log starts with a header block framed by dashed lines:
//!
//! ```text
//! ---------------------------------------------------------------
//!   Channel ID:      -1
//!   Channel Name:    Delve Intel
//!   Listener:        Some Pilot
//!   Session started: 2024.01.01 12:00:00
//! ---------------------------------------------------------------
//! [ 2024.01.01 12:00:05 ] Alice > Hostile spotted
//! ```
//!
//! Files are written as UTF-16LE with a byte order mark.

use crate::{Result, RiftlogError};
use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use riftlog_types::{ChatMessage, LogFileMetadata};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::trace;

/// Bytes read when only the header is needed. The header is a few hundred
/// characters, so this leaves plenty of room even in UTF-16.
const HEADER_READ_BYTES: u64 = 4096;

const TIMESTAMP_FORMAT: &str = "%Y.%m.%d %H:%M:%S";

static MESSAGE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[\s*(?P<ts>\d{4}\.\d{2}\.\d{2} \d{2}:\d{2}:\d{2})\s*\]\s(?P<author>.+?) >(?: (?P<text>.*))?$")
        .expect("Invalid chat message regex")
});

/// Read and parse only the header of a chat log.
pub fn parse_header(character_id: u64, path: &Path) -> Result<LogFileMetadata> {
    let mut bytes = Vec::new();
    File::open(path)?
        .take(HEADER_READ_BYTES)
        .read_to_end(&mut bytes)?;
    parse_header_text(character_id, path, &decode(&bytes))
}

/// Read the whole file and return every message in it, in file order.
pub fn parse(path: &Path) -> Result<Vec<ChatMessage>> {
    let bytes = std::fs::read(path)?;
    Ok(parse_messages(&decode(&bytes)))
}

fn parse_header_text(character_id: u64, path: &Path, text: &str) -> Result<LogFileMetadata> {
    let mut channel_id = None;
    let mut channel_name = None;
    let mut listener = None;
    let mut session_started = None;

    for line in text.lines().map(clean_line) {
        if line.starts_with('[') {
            break;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().to_string();
        match key.trim() {
            "Channel ID" => channel_id = Some(value),
            "Channel Name" => channel_name = Some(value),
            "Listener" => listener = Some(value),
            "Session started" => session_started = parse_timestamp(&value),
            _ => {}
        }
    }

    let invalid = |reason: &str| RiftlogError::InvalidHeader {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let channel_name = channel_name
        .filter(|name| !name.is_empty())
        .ok_or_else(|| invalid("missing channel name"))?;
    let listener = listener
        .filter(|name| !name.is_empty())
        .ok_or_else(|| invalid("missing listener"))?;
    let session_started = session_started.ok_or_else(|| invalid("missing session start"))?;

    Ok(LogFileMetadata {
        character_id,
        channel_id: channel_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| channel_name.clone()),
        channel_name,
        listener,
        session_started,
    })
}

fn parse_messages(text: &str) -> Vec<ChatMessage> {
    let mut messages: Vec<ChatMessage> = Vec::new();

    for line in text.lines().map(clean_line) {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(captures) = MESSAGE_REGEX.captures(line) {
            if let Some(timestamp) = parse_timestamp(&captures["ts"]) {
                messages.push(ChatMessage {
                    timestamp,
                    author: captures["author"].trim().to_string(),
                    message: captures
                        .name("text")
                        .map(|m| m.as_str().trim_end().to_string())
                        .unwrap_or_default(),
                });
                continue;
            }
        }
        // Multi-line message body; anything before the first message is header
        match messages.last_mut() {
            Some(previous) => {
                previous.message.push('\n');
                previous.message.push_str(line.trim_end());
            }
            None => trace!(target: "riftlog::parser", "Skipping header line: {}", line),
        }
    }

    messages
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT)
        .ok()
        .map(|dt| dt.and_utc())
}

fn clean_line(line: &str) -> &str {
    line.trim_start_matches('\u{feff}').trim_end_matches('\r')
}

/// Decode a chat log, detecting UTF-16LE (with or without BOM) and UTF-8.
fn decode(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        return decode_utf16le(rest);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).into_owned();
    }
    if looks_like_utf16le(bytes) {
        return decode_utf16le(bytes);
    }
    String::from_utf8_lossy(bytes).into_owned()
}

fn decode_utf16le(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

/// ASCII text encoded as UTF-16LE has a zero in every odd byte.
fn looks_like_utf16le(bytes: &[u8]) -> bool {
    let sample = &bytes[..bytes.len().min(64)];
    sample.len() >= 4 && sample.chunks_exact(2).all(|pair| pair[0] != 0 && pair[1] == 0)
}

/// Encode text the way the game client writes it. Used by tests.
#[doc(hidden)]
pub fn encode_utf16le(text: &str) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::path::PathBuf;

    const HEADER: &str = "\r\n\r\n\
        \x20       ---------------------------------------------------------------\r\n\
        \r\n\
        \x20         Channel ID:      -2107\r\n\
        \x20         Channel Name:    Delve Intel\r\n\
        \x20         Listener:        Some Pilot\r\n\
        \x20         Session started: 2024.01.01 12:00:00\r\n\
        \x20       ---------------------------------------------------------------\r\n";

    fn log(body: &str) -> String {
        format!("{HEADER}{body}")
    }

    #[test]
    fn test_parse_header_text() {
        let metadata = parse_header_text(42, &PathBuf::from("x.txt"), &log("")).unwrap();
        assert_eq!(metadata.character_id, 42);
        assert_eq!(metadata.channel_id, "-2107");
        assert_eq!(metadata.channel_name, "Delve Intel");
        assert_eq!(metadata.listener, "Some Pilot");
        assert_eq!(metadata.session_started, Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_header_missing_channel_name() {
        let text = "  Listener:        Some Pilot\r\n  Session started: 2024.01.01 12:00:00\r\n";
        let err = parse_header_text(42, &PathBuf::from("x.txt"), text).unwrap_err();
        assert!(matches!(err, RiftlogError::InvalidHeader { .. }));
    }

    #[test]
    fn test_parse_header_channel_id_falls_back_to_name() {
        let text = "  Channel Name:    Local\r\n  Listener:        Some Pilot\r\n  Session started: 2024.01.01 12:00:00\r\n";
        let metadata = parse_header_text(42, &PathBuf::from("x.txt"), text).unwrap();
        assert_eq!(metadata.channel_id, "Local");
    }

    #[test]
    fn test_parse_messages() {
        let text = log(
            "[ 2024.01.01 12:00:05 ] Alice > Hostile spotted\r\n\
             [ 2024.01.01 12:00:07 ] Bob Two > 1-SMEB clr\r\n",
        );
        let messages = parse_messages(&text);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].author, "Alice");
        assert_eq!(messages[0].message, "Hostile spotted");
        assert_eq!(messages[0].timestamp, Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 5).unwrap());
        assert_eq!(messages[1].author, "Bob Two");
        assert_eq!(messages[1].message, "1-SMEB clr");
    }

    #[test]
    fn test_parse_messages_multiline_and_empty() {
        let text = log(
            "[ 2024.01.01 12:00:05 ] Alice > first line\r\n\
             second line\r\n\
             [ 2024.01.01 12:00:06 ] Bob >\r\n",
        );
        let messages = parse_messages(&text);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].message, "first line\nsecond line");
        assert_eq!(messages[1].author, "Bob");
        assert_eq!(messages[1].message, "");
    }

    #[test]
    fn test_text_containing_separator() {
        let messages = parse_messages(&log("[ 2024.01.01 12:00:05 ] Alice > a > b\r\n"));
        assert_eq!(messages[0].author, "Alice");
        assert_eq!(messages[0].message, "a > b");
    }

    #[test]
    fn test_decode_variants() {
        let text = "[ 2024.01.01 12:00:05 ] Alice > hi";
        assert_eq!(decode(&encode_utf16le(text)), text);
        assert_eq!(decode(&encode_utf16le(text)[2..]), text);
        assert_eq!(decode(text.as_bytes()), text);

        let mut with_bom = vec![0xEF, 0xBB, 0xBF];
        with_bom.extend_from_slice(text.as_bytes());
        assert_eq!(decode(&with_bom), text);
    }

    #[test]
    fn test_parse_files_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Delve Intel_20240101_120000_42.txt");
        std::fs::write(&path, encode_utf16le(&log("[ 2024.01.01 12:00:05 ] Alice > Hostile spotted\r\n"))).unwrap();

        let metadata = parse_header(42, &path).unwrap();
        assert_eq!(metadata.channel_name, "Delve Intel");

        let messages = parse(&path).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message, "Hostile spotted");
    }

    #[test]
    fn test_parse_missing_file_is_io_error() {
        let err = parse(Path::new("/nonexistent/riftlog/file.txt")).unwrap_err();
        assert!(matches!(err, RiftlogError::IoError(_)));
    }
}
