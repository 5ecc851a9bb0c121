//! Chat log tailing for the game client's `Chatlogs` directory.

pub mod config;
mod directory_observer;
mod error;
mod history;
pub mod matcher;
mod observer;
pub mod parser;
pub mod settings_check;

pub use config::ObserverConfig;
pub use directory_observer::{DirectoryObserver, DirectorySubscription, NotifyDirectoryObserver};
pub use error::RiftlogError;
pub use history::MessageHistory;
pub use observer::{ActiveLogFile, ChatLogsObserver};

/// Result type for Riftlog operations.
pub type Result<T> = std::result::Result<T, RiftlogError>;
