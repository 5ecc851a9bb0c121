//! File system events consumed by the chat logs observer.

use std::path::PathBuf;

/// Kind of change observed for a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileEventType {
    Created,
    Modified,
    Deleted,
}

/// Event delivered by a directory observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryEvent {
    /// A file in the directory changed
    File { path: PathBuf, kind: FileEventType },
    /// The backend dropped events; nothing about the directory can be trusted
    Overflow,
}

impl DirectoryEvent {
    pub fn created(path: impl Into<PathBuf>) -> Self {
        Self::File {
            path: path.into(),
            kind: FileEventType::Created,
        }
    }

    pub fn modified(path: impl Into<PathBuf>) -> Self {
        Self::File {
            path: path.into(),
            kind: FileEventType::Modified,
        }
    }

    pub fn deleted(path: impl Into<PathBuf>) -> Self {
        Self::File {
            path: path.into(),
            kind: FileEventType::Deleted,
        }
    }
}
