//! Shared types for the Riftlog chat log tailer.

mod chat;
mod event;
mod log_file;

pub use chat::*;
pub use event::*;
pub use log_file::*;
