//! Riftlog - tails the game client's chat logs and prints new messages.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use riftlog_cli::{config, logging, output};
use riftlog_core::{settings_check, ChatLogsObserver};
use std::path::PathBuf;
use std::sync::Arc;

use config::Config;
use logging::{LogConfig, LogFormat};
use output::OutputFormat;

/// Riftlog - chat log tailer with duplicate suppression.
#[derive(Parser, Debug)]
#[command(name = "riftlog")]
#[command(about = "Tail game chat logs and print new messages")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// More log output: -v for file activity, -vv for everything
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (WARN and ERROR only)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Set log level for specific targets (e.g., "observer=debug").
    /// Targets are prefixed with "riftlog::" automatically.
    #[arg(long = "log", value_name = "TARGET=LEVEL", global = true)]
    log_overrides: Vec<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Follow the chat logs directory and print new messages
    Watch {
        /// Chat logs directory (overrides config)
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,

        /// Only print messages from this channel; repeatable
        #[arg(long = "channel", value_name = "NAME")]
        channels: Vec<String>,

        /// Message output format
        #[arg(short, long, default_value = "text")]
        output: OutputFormat,
    },

    /// Print the log files that would be followed and exit
    Scan {
        /// Chat logs directory (overrides config)
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// Check whether any account has chat logging disabled
    CheckSettings {
        /// Game client settings directory (overrides config)
        #[arg(long, value_name = "DIR")]
        settings_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (log_config, rejected) = LogConfig::from_cli(cli.verbose, cli.quiet, &cli.log_overrides, cli.log_format);
    logging::init(&log_config);
    for directive in rejected {
        tracing::warn!(target: "riftlog::startup", "Ignoring malformed --log value: {}", directive);
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    tracing::debug!(target: "riftlog::startup", "Loaded configuration: {:?}", config);

    match cli.command {
        Commands::Watch { dir, channels, output } => {
            if let Some(dir) = dir {
                config.chat_logs_dir = dir;
            }
            if !channels.is_empty() {
                config.channels = channels;
            }
            watch(config, output).await
        }
        Commands::Scan { dir } => {
            if let Some(dir) = dir {
                config.chat_logs_dir = dir;
            }
            scan(config).await
        }
        Commands::CheckSettings { settings_dir } => {
            let Some(settings_dir) = settings_dir.or(config.settings_dir) else {
                bail!("No settings directory given. Use --settings-dir or set settings_dir in the config file.");
            };
            check_settings(&settings_dir);
            Ok(())
        }
    }
}

async fn watch(config: Config, format: OutputFormat) -> Result<()> {
    if let Some(settings_dir) = &config.settings_dir {
        if settings_check::has_chat_logs_disabled(settings_dir) {
            tracing::warn!(
                target: "riftlog::startup",
                "Chat logging is disabled for at least one account; its messages will not appear"
            );
        }
    }

    let observer = Arc::new(ChatLogsObserver::with_notify(config.observer_config()));

    tracing::info!(target: "riftlog::startup", "Watching {}", config.chat_logs_dir.display());
    let observing = observer.observe(&config.chat_logs_dir, |message| {
        if config.accepts_channel(message.channel_name()) {
            println!("{}", output::format_message(&message, format));
        }
    });

    let ctrl_c = {
        let observer = observer.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!(target: "riftlog::startup", "Interrupted, stopping");
                observer.stop();
            }
        })
    };

    let result = observing.await;

    ctrl_c.abort();
    result?;
    Ok(())
}

async fn scan(config: Config) -> Result<()> {
    let observer = ChatLogsObserver::with_notify(config.observer_config());
    let active = observer.scan(&config.chat_logs_dir).await;

    if active.is_empty() {
        println!("No active chat logs in {}", config.chat_logs_dir.display());
        return Ok(());
    }
    for file in &active {
        println!("{}", output::format_active_file(file));
    }
    Ok(())
}

fn check_settings(settings_dir: &std::path::Path) {
    let disabled = settings_check::accounts_with_chat_logs_disabled(settings_dir);
    if disabled.is_empty() {
        println!("Chat logging is enabled for all accounts.");
        return;
    }
    println!("Chat logging is disabled in:");
    for file in disabled {
        println!("  {}", file.display());
    }
}
