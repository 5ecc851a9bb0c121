//! Directory watching on top of `notify`.
//!
//! Raw backend events are folded into [`DirectoryEvent`]s: created, modified
//! and deleted files, plus an overflow marker whenever the backend reports
//! that it lost track of the directory.

use crate::{Result, RiftlogError};
use notify::{
    event::{AccessKind, AccessMode, ModifyKind, RenameMode},
    Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use riftlog_types::DirectoryEvent;
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Source of file system events for a single directory.
pub trait DirectoryObserver: Send + Sync {
    /// Start watching `directory`. Events flow until the subscription is dropped.
    fn subscribe(&self, directory: &Path) -> Result<DirectorySubscription>;
}

/// A live directory watch.
pub struct DirectorySubscription {
    events: mpsc::UnboundedReceiver<DirectoryEvent>,
    _backend: Option<RecommendedWatcher>,
}

impl DirectorySubscription {
    /// Subscription fed by an arbitrary channel, with nothing else to keep alive.
    pub fn from_channel(events: mpsc::UnboundedReceiver<DirectoryEvent>) -> Self {
        Self {
            events,
            _backend: None,
        }
    }

    fn with_backend(events: mpsc::UnboundedReceiver<DirectoryEvent>, backend: RecommendedWatcher) -> Self {
        Self {
            events,
            _backend: Some(backend),
        }
    }

    /// Next event, or `None` once the backend has shut down.
    pub async fn recv(&mut self) -> Option<DirectoryEvent> {
        self.events.recv().await
    }
}

/// Directory observer backed by the platform's recommended `notify` watcher.
#[derive(Debug, Default, Clone, Copy)]
pub struct NotifyDirectoryObserver;

impl NotifyDirectoryObserver {
    pub fn new() -> Self {
        Self
    }
}

impl DirectoryObserver for NotifyDirectoryObserver {
    fn subscribe(&self, directory: &Path) -> Result<DirectorySubscription> {
        if !directory.is_dir() {
            return Err(RiftlogError::DirectoryNotFound(directory.to_path_buf()));
        }

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<Event, notify::Error>| {
                let events = match res {
                    Ok(event) => translate_event(event),
                    Err(e) => {
                        warn!(target: "riftlog::watcher", "Directory watch error, rescanning: {}", e);
                        vec![DirectoryEvent::Overflow]
                    }
                };
                for event in events {
                    let _ = event_tx.send(event);
                }
            },
        )?;

        watcher.watch(directory, RecursiveMode::NonRecursive)?;
        debug!(target: "riftlog::watcher", "Watching {}", directory.display());

        Ok(DirectorySubscription::with_backend(event_rx, watcher))
    }
}

/// Map a raw `notify` event onto zero or more directory events.
fn translate_event(event: Event) -> Vec<DirectoryEvent> {
    if event.need_rescan() {
        return vec![DirectoryEvent::Overflow];
    }

    let mut paths = event.paths.into_iter();
    match event.kind {
        EventKind::Create(_) => paths.map(DirectoryEvent::created).collect(),
        EventKind::Remove(_) => paths.map(DirectoryEvent::deleted).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            paths.map(DirectoryEvent::deleted).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            paths.map(DirectoryEvent::created).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let mut events = Vec::new();
            if let Some(from) = paths.next() {
                events.push(DirectoryEvent::deleted(from));
            }
            if let Some(to) = paths.next() {
                events.push(DirectoryEvent::created(to));
            }
            events
        }
        EventKind::Modify(ModifyKind::Data(_))
        | EventKind::Modify(ModifyKind::Any)
        | EventKind::Access(AccessKind::Close(AccessMode::Write)) => {
            paths.map(DirectoryEvent::modified).collect()
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, Flag, RemoveKind};
    use std::path::PathBuf;

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        let mut event = Event::new(kind);
        for path in paths {
            event = event.add_path(PathBuf::from(path));
        }
        event
    }

    #[test]
    fn test_translate_create_modify_remove() {
        assert_eq!(
            translate_event(event(EventKind::Create(CreateKind::File), &["/a.txt"])),
            vec![DirectoryEvent::created("/a.txt")]
        );
        assert_eq!(
            translate_event(event(EventKind::Modify(ModifyKind::Data(DataChange::Content)), &["/a.txt"])),
            vec![DirectoryEvent::modified("/a.txt")]
        );
        assert_eq!(
            translate_event(event(EventKind::Access(AccessKind::Close(AccessMode::Write)), &["/a.txt"])),
            vec![DirectoryEvent::modified("/a.txt")]
        );
        assert_eq!(
            translate_event(event(EventKind::Remove(RemoveKind::File), &["/a.txt"])),
            vec![DirectoryEvent::deleted("/a.txt")]
        );
    }

    #[test]
    fn test_translate_rename() {
        assert_eq!(
            translate_event(event(EventKind::Modify(ModifyKind::Name(RenameMode::Both)), &["/a.txt", "/b.txt"])),
            vec![DirectoryEvent::deleted("/a.txt"), DirectoryEvent::created("/b.txt")]
        );
        assert_eq!(
            translate_event(event(EventKind::Modify(ModifyKind::Name(RenameMode::From)), &["/a.txt"])),
            vec![DirectoryEvent::deleted("/a.txt")]
        );
    }

    #[test]
    fn test_translate_rescan_is_overflow() {
        let rescan = event(EventKind::Other, &[]).set_flag(Flag::Rescan);
        assert_eq!(translate_event(rescan), vec![DirectoryEvent::Overflow]);
    }

    #[test]
    fn test_translate_ignores_reads() {
        assert!(translate_event(event(EventKind::Access(AccessKind::Read), &["/a.txt"])).is_empty());
    }

    #[test]
    fn test_subscribe_missing_directory() {
        let err = NotifyDirectoryObserver::new()
            .subscribe(Path::new("/nonexistent/riftlog/dir"))
            .err()
            .unwrap();
        assert!(matches!(err, RiftlogError::DirectoryNotFound(_)));
    }
}
