//! Logging setup for embedding hosts.
//!
//! Everything under the `gatewatch::` target prefix is tuned through a
//! preset plus optional per-target overrides. `RUST_LOG`, when set, wins
//! over both. Output is plain text or JSON.

use std::collections::HashMap;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

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

/// Baseline verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogPreset {
    /// Lifecycle and preference events; per-page noise suppressed.
    #[default]
    Production,
    /// Info across all targets, per-tick monitor output still off.
    Verbose,
    /// Debug across all targets, per-tick monitor output still off.
    Debug,
    /// Everything, including each monitor tick and classifier match.
    Trace,
    /// Warnings and errors only.
    Quiet,
}

/// Logging configuration for an embedding host.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub preset: LogPreset,
    /// Per-target level overrides, e.g. `gatewatch::monitor` -> DEBUG.
    pub overrides: HashMap<String, Level>,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            preset: LogPreset::Production,
            overrides: HashMap::new(),
            format: LogFormat::Text,
        }
    }
}

impl LogConfig {
    /// Build a config from a preset, override specs, and a format.
    ///
    /// Override specs look like "monitor=debug" or
    /// "monitor::tick=trace,prefs=info". Bare targets get the `gatewatch::`
    /// prefix; targets already containing `::` pass through unchanged so
    /// dependency targets can be tuned too. Malformed parts are dropped.
    pub fn new(preset: LogPreset, override_specs: &[String], format: LogFormat) -> Self {
        let mut overrides = HashMap::new();
        for spec in override_specs {
            for part in spec.split(',') {
                if let Some((target, level_str)) = part.split_once('=') {
                    let target = target.trim();

                    let full_target = if target.contains("::") {
                        target.to_string()
                    } else {
                        format!("gatewatch::{}", target)
                    };

                    if let Ok(level) = parse_level(level_str.trim()) {
                        overrides.insert(full_target, level);
                    }
                }
            }
        }

        Self {
            preset,
            overrides,
            format,
        }
    }

    /// Build an EnvFilter from this configuration.
    pub fn build_filter(&self) -> EnvFilter {
        // RUST_LOG replaces the preset and overrides entirely.
        if let Ok(env_filter) = EnvFilter::try_from_default_env() {
            return env_filter;
        }

        let mut directives: Vec<String> = match self.preset {
            LogPreset::Production => vec![
                "gatewatch::host=info".into(),
                "gatewatch::plugin=info".into(),
                "gatewatch::prefs=info".into(),
                "gatewatch::panel=info".into(),
                "gatewatch::ipc=warn".into(),
                "gatewatch::monitor=warn".into(),
                "gatewatch::monitor::tick=off".into(),
                "gatewatch::classify=off".into(),
            ],
            LogPreset::Verbose => vec![
                "gatewatch=info".into(),
                "gatewatch::monitor::tick=off".into(),
            ],
            LogPreset::Debug => vec![
                "gatewatch=debug".into(),
                "gatewatch::monitor::tick=off".into(),
            ],
            LogPreset::Trace => vec!["gatewatch=trace".into()],
            LogPreset::Quiet => vec!["gatewatch=warn".into()],
        };

        // Later directives win, so overrides go last.
        for (target, level) in &self.overrides {
            directives.push(format!("{}={}", target, level_to_str(*level)));
        }

        let filter_str = directives.join(",");
        EnvFilter::try_new(&filter_str).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

fn parse_level(s: &str) -> Result<Level, ()> {
    match s.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(()),
    }
}

fn level_to_str(level: Level) -> &'static str {
    match level {
        Level::TRACE => "trace",
        Level::DEBUG => "debug",
        Level::INFO => "info",
        Level::WARN => "warn",
        Level::ERROR => "error",
    }
}

/// Installs the global tracing subscriber. Call once at host startup.
pub fn init(config: &LogConfig) {
    let filter = config.build_filter();

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_thread_ids(false)
                        .with_file(false)
                        .with_line_number(false),
                )
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE),
                )
                .init();
        }
    }
}
