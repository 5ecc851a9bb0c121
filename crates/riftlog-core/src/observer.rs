//! Tails a directory of chat logs and surfaces new messages.
//!
//! For every (character, channel) pair only the most recently modified log
//! is followed. Each modification re-parses that file, drops messages that
//! were already handled and suppresses near-duplicate lines before handing
//! the rest to the registered callback.

use crate::config::ObserverConfig;
use crate::directory_observer::{DirectoryObserver, NotifyDirectoryObserver};
use crate::history::MessageHistory;
use crate::{matcher, parser, Result};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use riftlog_types::{ChannelChatMessage, ChatLogFile, ChatMessage, DirectoryEvent, FileEventType, LogFileMetadata};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, trace, warn};

/// A log file currently followed for its (character, channel) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveLogFile {
    pub file: ChatLogFile,
    pub metadata: LogFileMetadata,
}

/// Watches a chat logs directory and delivers new messages to a callback.
pub struct ChatLogsObserver {
    config: ObserverConfig,
    directory_observer: Arc<dyn DirectoryObserver>,
    /// Bumped on every `stop()`
    stop_tx: watch::Sender<u64>,
}

impl ChatLogsObserver {
    pub fn new(config: ObserverConfig, directory_observer: Arc<dyn DirectoryObserver>) -> Self {
        let (stop_tx, _) = watch::channel(0);
        Self {
            config,
            directory_observer,
            stop_tx,
        }
    }

    /// Observer using the platform file system watcher.
    pub fn with_notify(config: ObserverConfig) -> Self {
        Self::new(config, Arc::new(NotifyDirectoryObserver::new()))
    }

    /// Observe `directory` until [`stop`](Self::stop) is called or the watch ends.
    ///
    /// All state from a previous run is discarded. Per-file failures are
    /// logged and skipped; only a failure to establish the directory watch is
    /// returned.
    ///
    /// Stop requests count from the moment this is called, so a `stop()`
    /// issued before the returned future is first polled still ends it.
    pub fn observe<'a, F>(&'a self, directory: &'a Path, on_message: F) -> impl Future<Output = Result<()>> + 'a
    where
        F: FnMut(ChannelChatMessage) + Send + 'a,
    {
        let stop_rx = self.stop_tx.subscribe();
        self.run(directory, on_message, stop_rx)
    }

    async fn run<F>(&self, directory: &Path, on_message: F, mut stop_rx: watch::Receiver<u64>) -> Result<()>
    where
        F: FnMut(ChannelChatMessage) + Send,
    {
        info!(target: "riftlog::observer", "Observing chat logs: {}", directory.display());
        let mut subscription = self.directory_observer.subscribe(directory)?;

        let mut state = ObserverState::new(directory, self.config.clone(), on_message);
        state.reload_log_files().await;

        debug!(target: "riftlog::observer", "Starting directory observer for chat logs: {}", directory.display());
        loop {
            tokio::select! {
                event = subscription.recv() => {
                    match event {
                        Some(event) => state.handle_event(event).await,
                        None => {
                            debug!(target: "riftlog::observer", "Directory subscription ended");
                            break;
                        }
                    }
                }
                _ = stop_rx.changed() => break,
            }
        }

        info!(target: "riftlog::observer", "Stopped observing");
        Ok(())
    }

    /// Ask a running [`observe`](Self::observe) call to return. Idempotent.
    pub fn stop(&self) {
        self.stop_tx.send_modify(|generation| *generation = generation.wrapping_add(1));
    }

    /// Scan `directory` once and return the files that would be followed,
    /// without reading any messages.
    pub async fn scan(&self, directory: &Path) -> Vec<ActiveLogFile> {
        let mut state = ObserverState::new(directory, self.config.clone(), |_| {});
        state.log_files = list_log_files(directory).await;
        state.recompute_active_log_files();

        let mut active: Vec<ActiveLogFile> = state.active_log_files.into_values().collect();
        active.sort_by(|a, b| {
            (a.file.character_id, &a.file.channel_name).cmp(&(b.file.character_id, &b.file.channel_name))
        });
        active
    }
}

/// Mutable state of one `observe` run.
pub(crate) struct ObserverState<F> {
    directory: PathBuf,
    config: ObserverConfig,
    /// Every recognised log file in the directory
    log_files: Vec<ChatLogFile>,
    /// Followed files keyed by file name
    active_log_files: HashMap<String, ActiveLogFile>,
    /// Parsed headers keyed by file name
    metadata_cache: HashMap<String, LogFileMetadata>,
    history: MessageHistory,
    on_message: F,
}

impl<F> ObserverState<F>
where
    F: FnMut(ChannelChatMessage),
{
    pub(crate) fn new(directory: &Path, config: ObserverConfig, on_message: F) -> Self {
        let history = MessageHistory::new(&config);
        Self {
            directory: directory.to_path_buf(),
            config,
            log_files: Vec::new(),
            active_log_files: HashMap::new(),
            metadata_cache: HashMap::new(),
            history,
            on_message,
        }
    }

    pub(crate) fn active_log_files(&self) -> &HashMap<String, ActiveLogFile> {
        &self.active_log_files
    }

    pub(crate) async fn handle_event(&mut self, event: DirectoryEvent) {
        match event {
            DirectoryEvent::File { path, kind } => match kind {
                FileEventType::Created => {
                    if let Some(file) = matcher::match_path(&path).await {
                        debug!(target: "riftlog::observer", "Chat log created: {}", file.file_name);
                        self.log_files.retain(|known| known.file_name != file.file_name);
                        self.log_files.push(file);
                        self.update_active_log_files();
                    }
                }
                FileEventType::Deleted => {
                    let Some(file_name) = chat_log_file_name(&path) else {
                        return;
                    };
                    debug!(target: "riftlog::observer", "Chat log deleted: {}", file_name);
                    self.log_files.retain(|known| known.file_name != file_name);
                    self.update_active_log_files();
                }
                FileEventType::Modified => {
                    let Some(file_name) = chat_log_file_name(&path) else {
                        return;
                    };
                    if self.active_log_files.contains_key(file_name) {
                        self.read_log_file(file_name);
                    } else if self.awaiting_header(file_name) {
                        // Created empty; the header may be readable now
                        self.update_active_log_files();
                    } else {
                        trace!(target: "riftlog::observer", "Ignoring modification of inactive log: {}", file_name);
                    }
                }
            },
            DirectoryEvent::Overflow => {
                warn!(target: "riftlog::observer", "Directory events overflowed, reloading chat logs");
                self.reload_log_files().await;
            }
        }
    }

    /// Known file whose header has never been parsed successfully.
    fn awaiting_header(&self, file_name: &str) -> bool {
        !self.metadata_cache.contains_key(file_name)
            && self.log_files.iter().any(|known| known.file_name == file_name)
    }

    /// Forget the known files and rescan the directory from scratch.
    pub(crate) async fn reload_log_files(&mut self) {
        self.log_files = list_log_files(&self.directory).await;
        self.update_active_log_files();
    }

    /// Recompute the active set and catch up on files that just became active.
    fn update_active_log_files(&mut self) {
        for file_name in self.recompute_active_log_files() {
            self.read_log_file(&file_name);
        }
    }

    /// Pick the latest existing file per (character, channel) and return the
    /// names of files that were not active before.
    fn recompute_active_log_files(&mut self) -> Vec<String> {
        debug!(target: "riftlog::observer", "Updating active chat log files: {}", self.log_files.len());
        let min_time = Utc::now()
            .checked_sub_signed(to_chrono(self.config.recency_window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let mut groups: BTreeMap<(u64, &str), Vec<&ChatLogFile>> = BTreeMap::new();
        for file in self.log_files.iter().filter(|file| file.date_time > min_time) {
            groups
                .entry((file.character_id, file.channel_name.as_str()))
                .or_default()
                .push(file);
        }
        if groups.is_empty() {
            info!(target: "riftlog::observer", "No chat log files within the recency window");
        }

        let selected: Vec<ChatLogFile> = groups
            .into_values()
            .filter_map(|mut candidates| {
                candidates.sort_by(|a, b| {
                    (b.last_modified, b.date_time, &b.file_name).cmp(&(a.last_modified, a.date_time, &a.file_name))
                });
                candidates.into_iter().find(|file| file.exists()).cloned()
            })
            .collect();

        let mut current = HashMap::with_capacity(selected.len());
        for file in selected {
            let metadata = match self.metadata_cache.get(&file.file_name) {
                Some(metadata) => metadata.clone(),
                None => match parser::parse_header(file.character_id, &file.path) {
                    Ok(metadata) => {
                        self.metadata_cache.insert(file.file_name.clone(), metadata.clone());
                        metadata
                    }
                    Err(e) => {
                        error!(target: "riftlog::observer", "Could not parse metadata for {}: {}", file.file_name, e);
                        continue;
                    }
                },
            };
            current.insert(file.file_name.clone(), ActiveLogFile { file, metadata });
        }

        let newly_active: Vec<String> = current
            .keys()
            .filter(|name| !self.active_log_files.contains_key(*name))
            .cloned()
            .collect();
        self.active_log_files = current;
        debug!(target: "riftlog::observer", "New active chat log files: {}", newly_active.len());

        newly_active
    }

    /// Parse the whole file and handle every message not seen before.
    fn read_log_file(&mut self, file_name: &str) {
        let Some(active) = self.active_log_files.get(file_name) else {
            return;
        };
        let metadata = active.metadata.clone();

        let messages = match parser::parse(&active.file.path) {
            Ok(messages) => messages,
            Err(e) => {
                error!(target: "riftlog::observer", "Could not read chat log file {}: {}", file_name, e);
                return;
            }
        };

        let now = Utc::now();
        let new_messages: Vec<ChatMessage> = messages
            .into_iter()
            .filter(|message| self.history.is_retained(message, now) && !self.history.is_seen(message))
            .collect();
        if new_messages.is_empty() {
            return;
        }
        trace!(target: "riftlog::observer", "{} new messages in {}", new_messages.len(), file_name);

        for message in new_messages {
            self.handle_new_message(message, &metadata);
        }
    }

    fn handle_new_message(&mut self, message: ChatMessage, metadata: &LogFileMetadata) {
        if self.history.record(&message) {
            debug!(
                target: "riftlog::observer",
                "Suppressing duplicate message from {} in {}",
                message.author,
                metadata.channel_name
            );
            return;
        }
        (self.on_message)(ChannelChatMessage::new(message, metadata.clone()));
    }
}

/// List the directory and match every entry concurrently.
async fn list_log_files(directory: &Path) -> Vec<ChatLogFile> {
    let entries = match read_dir_paths(directory).await {
        Ok(entries) => entries,
        Err(e) => {
            error!(target: "riftlog::observer", "Failed reloading chat log files: {}", e);
            return Vec::new();
        }
    };

    join_all(entries.iter().map(|path| matcher::match_path(path)))
        .await
        .into_iter()
        .flatten()
        .collect()
}

async fn read_dir_paths(directory: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(directory).await?;
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        paths.push(entry.path());
    }
    Ok(paths)
}

/// File name of `path` if it follows the chat log naming convention.
fn chat_log_file_name(path: &Path) -> Option<&str> {
    let file_name = path.file_name()?.to_str()?;
    matcher::parse_file_name(file_name).map(|_| file_name)
}

fn to_chrono(duration: std::time::Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}
