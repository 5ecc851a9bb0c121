//! Logging setup for the `riftlog` binary.
//!
//! Verbosity comes from `-v`/`-vv`/`--quiet`, per-target overrides from
//! `--log target=level`, and `RUST_LOG` wins over both. Logs go to stderr so
//! stdout carries only chat messages.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{filter::Directive, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: '{}'. Use 'text' or 'json'.", s)),
        }
    }
}

/// How much the observer reports about itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogPreset {
    /// Warnings and errors only
    Quiet,
    /// Startup, watched directory and problems
    #[default]
    Normal,
    /// File activity: activations, deletions, suppressed duplicates
    Verbose,
    /// Every event, including ignored files and skipped lines
    Trace,
}

impl LogPreset {
    /// Preset for `-v` repeated `verbosity` times; `--quiet` wins.
    pub fn from_flags(verbosity: u8, quiet: bool) -> Self {
        match (quiet, verbosity) {
            (true, _) => LogPreset::Quiet,
            (false, 0) => LogPreset::Normal,
            (false, 1) => LogPreset::Verbose,
            (false, _) => LogPreset::Trace,
        }
    }

    fn directives(self) -> &'static str {
        match self {
            LogPreset::Quiet => "warn,riftlog=warn",
            LogPreset::Normal => "warn,riftlog::startup=info,riftlog::observer=info",
            LogPreset::Verbose => "warn,riftlog=debug",
            LogPreset::Trace => "info,riftlog=trace,notify=debug",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub preset: LogPreset,
    /// Extra directives from `--log`, applied after the preset
    pub overrides: Vec<Directive>,
    pub format: LogFormat,
}

impl LogConfig {
    /// Build from CLI flags. Malformed `--log` entries are returned so the
    /// caller can report them once logging is up.
    pub fn from_cli(verbosity: u8, quiet: bool, log_overrides: &[String], format: LogFormat) -> (Self, Vec<String>) {
        let mut overrides = Vec::new();
        let mut rejected = Vec::new();

        for part in log_overrides.iter().flat_map(|value| value.split(',')) {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            match qualify_target(part).and_then(|directive| directive.parse::<Directive>().ok()) {
                Some(directive) => overrides.push(directive),
                None => rejected.push(part.to_string()),
            }
        }

        let config = Self {
            preset: LogPreset::from_flags(verbosity, quiet),
            overrides,
            format,
        };
        (config, rejected)
    }

    pub fn build_filter(&self) -> EnvFilter {
        if let Ok(env_filter) = EnvFilter::try_from_default_env() {
            return env_filter;
        }

        self.overrides
            .iter()
            .cloned()
            .fold(EnvFilter::new(self.preset.directives()), EnvFilter::add_directive)
    }
}

/// "observer=debug" -> "riftlog::observer=debug". Full paths, `notify` and
/// bare levels pass through; an unknown level yields `None`.
fn qualify_target(part: &str) -> Option<String> {
    let Some((target, level)) = part.split_once('=') else {
        return Some(part.to_string());
    };
    let (target, level) = (target.trim(), level.trim());
    level.parse::<LevelFilter>().ok()?;

    if target.starts_with("riftlog") || target == "notify" {
        Some(format!("{}={}", target, level))
    } else {
        Some(format!("riftlog::{}={}", target, level))
    }
}

pub fn init(config: &LogConfig) {
    let registry = tracing_subscriber::registry().with(config.build_filter());
    let layer = fmt::layer().with_writer(std::io::stderr).with_target(true);

    match config.format {
        LogFormat::Text => registry.with(layer).init(),
        LogFormat::Json => registry.with(layer.json()).init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_preset_from_flags() {
        assert_eq!(LogPreset::from_flags(0, false), LogPreset::Normal);
        assert_eq!(LogPreset::from_flags(1, false), LogPreset::Verbose);
        assert_eq!(LogPreset::from_flags(2, false), LogPreset::Trace);
        assert_eq!(LogPreset::from_flags(5, false), LogPreset::Trace);
        assert_eq!(LogPreset::from_flags(2, true), LogPreset::Quiet);
    }

    #[test]
    fn test_overrides_are_qualified() {
        let (config, rejected) = LogConfig::from_cli(
            0,
            false,
            &["observer=debug".into(), "parser=trace, notify=info".into(), "riftlog::settings=warn".into()],
            LogFormat::Text,
        );

        let expected: Vec<Directive> = ["riftlog::observer=debug", "riftlog::parser=trace", "notify=info", "riftlog::settings=warn"]
            .iter()
            .map(|directive| directive.parse().unwrap())
            .collect();
        assert_eq!(config.overrides, expected);
        assert!(rejected.is_empty());
    }

    #[test]
    fn test_malformed_overrides_are_rejected() {
        let (config, rejected) = LogConfig::from_cli(1, false, &["history=loud".into()], LogFormat::Json);

        assert!(config.overrides.is_empty());
        assert_eq!(rejected, vec!["history=loud"]);
        assert_eq!(config.preset, LogPreset::Verbose);
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn test_qualify_target() {
        assert_eq!(qualify_target("watcher=info").as_deref(), Some("riftlog::watcher=info"));
        assert_eq!(qualify_target("riftlog=debug").as_deref(), Some("riftlog=debug"));
        assert_eq!(qualify_target("debug").as_deref(), Some("debug"));
        assert_eq!(qualify_target("watcher=loud"), None);
    }
}
