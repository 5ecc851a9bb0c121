//! Rendering of delivered messages on stdout.

use riftlog_core::ActiveLogFile;
use riftlog_types::ChannelChatMessage;

/// Message output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid output format: '{}'. Use 'text' or 'json'.", s)),
        }
    }
}

/// One line per message; multi-line bodies are indented in text mode.
pub fn format_message(message: &ChannelChatMessage, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let chat = &message.chat_message;
            format!(
                "[{}] {} | {} > {}",
                chat.timestamp.format("%Y-%m-%d %H:%M:%S"),
                message.metadata.channel_name,
                chat.author,
                chat.message.replace('\n', "\n    ")
            )
        }
        OutputFormat::Json => serde_json::to_string(message).unwrap_or_default(),
    }
}

pub fn format_active_file(active: &ActiveLogFile) -> String {
    format!(
        "{:<24} {:<12} {:<24} {}",
        active.metadata.channel_name,
        active.file.character_id,
        active.metadata.listener,
        active.file.file_name
    )
}
