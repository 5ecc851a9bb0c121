//! Recognises chat log files by name.
//!
//! The game client names its chat logs
//! `<Channel Name>_<YYYYMMDD>_<HHMMSS>_<characterId>.txt`, where the date and
//! time are the session start in UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use riftlog_types::ChatLogFile;
use std::path::Path;
use tracing::trace;

static FILE_NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<channel>.+)_(?P<date>\d{8})_(?P<time>\d{6})_(?P<character>\d+)\.txt$")
        .expect("Invalid chat log file name regex")
});

/// Fields encoded in a chat log file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFileName {
    pub channel_name: String,
    pub date_time: DateTime<Utc>,
    pub character_id: u64,
}

/// Parse a chat log file name without touching the file system.
pub fn parse_file_name(file_name: &str) -> Option<ParsedFileName> {
    let captures = FILE_NAME_REGEX.captures(file_name)?;

    let date = NaiveDate::parse_from_str(&captures["date"], "%Y%m%d").ok()?;
    let time = NaiveTime::parse_from_str(&captures["time"], "%H%M%S").ok()?;
    let character_id = captures["character"].parse::<u64>().ok()?;

    Some(ParsedFileName {
        channel_name: captures["channel"].to_string(),
        date_time: NaiveDateTime::new(date, time).and_utc(),
        character_id,
    })
}

/// Match a path against the chat log naming convention and stat it.
///
/// Returns `None` for names that don't match and for files whose metadata
/// can't be read, which usually means they were deleted in the meantime.
pub async fn match_path(path: &Path) -> Option<ChatLogFile> {
    let file_name = path.file_name()?.to_str()?;
    let Some(parsed) = parse_file_name(file_name) else {
        trace!(target: "riftlog::matcher", "Ignoring non chat log file: {}", file_name);
        return None;
    };

    let metadata = match tokio::fs::metadata(path).await {
        Ok(m) => m,
        Err(e) => {
            trace!(target: "riftlog::matcher", "Could not stat {}: {}", path.display(), e);
            return None;
        }
    };
    if !metadata.is_file() {
        return None;
    }
    let last_modified = metadata.modified().ok()?;

    Some(ChatLogFile {
        path: path.to_path_buf(),
        file_name: file_name.to_string(),
        channel_name: parsed.channel_name,
        character_id: parsed.character_id,
        date_time: parsed.date_time,
        last_modified,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_file_name() {
        let parsed = parse_file_name("Local_20240101_120000_90000001.txt").unwrap();
        assert_eq!(parsed.channel_name, "Local");
        assert_eq!(parsed.character_id, 90000001);
        assert_eq!(parsed.date_time, Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_file_name_channel_with_separators() {
        let parsed = parse_file_name("Delve_Intel Channel_20231201_235959_2112000001.txt").unwrap();
        assert_eq!(parsed.channel_name, "Delve_Intel Channel");
        assert_eq!(parsed.character_id, 2112000001);
        assert_eq!(parsed.date_time, Utc.with_ymd_and_hms(2023, 12, 1, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_parse_file_name_rejects_other_files() {
        assert!(parse_file_name("Local_20240101_120000.txt").is_none());
        assert!(parse_file_name("Local_20240101_120000_90000001.log").is_none());
        assert!(parse_file_name("Local_20241301_120000_90000001.txt").is_none());
        assert!(parse_file_name("Local_20240101_250000_90000001.txt").is_none());
        assert!(parse_file_name("notes.txt").is_none());
    }

    #[tokio::test]
    async fn test_match_path_reads_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Local_20240101_120000_90000001.txt");
        std::fs::write(&path, b"x").unwrap();

        let file = match_path(&path).await.unwrap();
        assert_eq!(file.file_name, "Local_20240101_120000_90000001.txt");
        assert_eq!(file.channel_name, "Local");
        assert_eq!(file.path, path);
        assert!(file.exists());
    }

    #[tokio::test]
    async fn test_match_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Local_20240101_120000_90000001.txt");
        assert!(match_path(&path).await.is_none());
    }

    #[tokio::test]
    async fn test_match_path_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Local_20240101_120000_90000001.txt");
        std::fs::create_dir(&path).unwrap();
        assert!(match_path(&path).await.is_none());
    }
}
