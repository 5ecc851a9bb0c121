//! Detects game accounts that have chat logging switched off.
//!
//! The client keeps per-account settings in
//! `<settings dir>/settings_<profile>/core_user_<accountId>.dat`. When the
//! "log chat to file" option is off, the byte three positions before the
//! first `logchat` key is `8`. A file without the key uses the default,
//! which is enabled.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const LOG_CHAT_KEY: &[u8] = b"logchat";
const DISABLED_BYTE_OFFSET: usize = 3;
const DISABLED_BYTE_VALUE: u8 = 8;

static USER_SETTINGS_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^core_user_[0-9]+$").expect("Invalid user settings regex"));

/// Whether any account under `settings_dir` has chat logging disabled.
pub fn has_chat_logs_disabled(settings_dir: &Path) -> bool {
    !accounts_with_chat_logs_disabled(settings_dir).is_empty()
}

/// User settings files whose account has chat logging disabled.
pub fn accounts_with_chat_logs_disabled(settings_dir: &Path) -> Vec<PathBuf> {
    user_settings_files(settings_dir)
        .into_iter()
        .filter(|file| match fs::read(file) {
            Ok(bytes) => is_chat_logging_disabled(&bytes),
            Err(e) => {
                warn!(
                    target: "riftlog::settings",
                    "Could not read settings file to determine if chat logs are enabled: {}",
                    e
                );
                false
            }
        })
        .collect()
}

fn user_settings_files(settings_dir: &Path) -> Vec<PathBuf> {
    let profiles = match list_dir(settings_dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(target: "riftlog::settings", "Could not list {}: {}", settings_dir.display(), e);
            return Vec::new();
        }
    };

    let mut files = Vec::new();
    for profile in profiles {
        let is_profile = profile.is_dir()
            && profile
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("settings_"));
        if !is_profile {
            continue;
        }

        let Ok(entries) = list_dir(&profile) else {
            debug!(target: "riftlog::settings", "Skipping unreadable profile {}", profile.display());
            continue;
        };
        files.extend(entries.into_iter().filter(|file| is_user_settings_file(file)));
    }
    files.sort();
    files
}

fn is_user_settings_file(path: &Path) -> bool {
    path.is_file()
        && path.extension().and_then(|ext| ext.to_str()) == Some("dat")
        && path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .is_some_and(|stem| USER_SETTINGS_REGEX.is_match(stem))
}

fn is_chat_logging_disabled(bytes: &[u8]) -> bool {
    bytes
        .windows(LOG_CHAT_KEY.len())
        .position(|window| window == LOG_CHAT_KEY)
        .and_then(|index| index.checked_sub(DISABLED_BYTE_OFFSET))
        .is_some_and(|flag_index| bytes[flag_index] == DISABLED_BYTE_VALUE)
}

fn list_dir(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect()
}
