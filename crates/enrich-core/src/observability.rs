use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

static INIT: OnceCell<bool> = OnceCell::new();

const DEFAULT_FILTER: &str = "info";
const DEFAULT_LOG_FILE: &str = "enrich.logs.jsonl";

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutput {
    /// Compact text on stderr, leaving stdout to the program's output.
    Console,
    /// One JSON object per line, appended to this file.
    JsonFile(PathBuf),
}

/// Logging settings resolved from `ENRICH_*` variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityConfig {
    pub enabled: bool,
    /// `EnvFilter` directives such as `info,enrich_harness=debug`.
    pub filter: String,
    pub output: LogOutput,
}

impl ObservabilityConfig {
    /// Reads:
    /// - `ENRICH_OBSERVABILITY_ENABLED` / `ENRICH_OBSERVABILITY`: on/off (default on).
    /// - `ENRICH_LOG_LEVEL`, then `RUST_LOG`: filter directives (default `info`).
    /// - `ENRICH_JSON_LOG_PATH`: JSONL log file instead of the console.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let enabled = ["ENRICH_OBSERVABILITY_ENABLED", "ENRICH_OBSERVABILITY"]
            .into_iter()
            .find_map(|key| lookup(key))
            .map(|value| parse_bool_env(&value).unwrap_or(true))
            .unwrap_or(true);
        let filter = ["ENRICH_LOG_LEVEL", "RUST_LOG"]
            .into_iter()
            .filter_map(|key| lookup(key))
            .find(|directives| EnvFilter::try_new(directives).is_ok())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());
        let output = lookup("ENRICH_JSON_LOG_PATH")
            .filter(|path| !path.trim().is_empty())
            .map_or(LogOutput::Console, |path| LogOutput::JsonFile(PathBuf::from(path)));
        Self {
            enabled,
            filter,
            output,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

fn parse_bool_env(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "enabled" => Some(true),
        "0" | "false" | "no" | "off" | "disabled" => Some(false),
        _ => None,
    }
}

fn split_log_path(path: &Path) -> (PathBuf, String) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(DEFAULT_LOG_FILE)
        .to_string();
    (dir, file_name)
}

/// Installs the global subscriber from the environment, once per process.
pub fn init_observability() {
    init_with(ObservabilityConfig::from_env());
}

/// Installs the global subscriber for `config`. Later calls are no-ops.
/// Returns whether this process has a subscriber installed by this module.
pub fn init_with(config: ObservabilityConfig) -> bool {
    *INIT.get_or_init(|| {
        if !config.enabled {
            return false;
        }
        let registry = tracing_subscriber::registry().with(config.env_filter());
        match &config.output {
            LogOutput::JsonFile(path) => {
                let (dir, file_name) = split_log_path(path);
                let _ = std::fs::create_dir_all(&dir);
                let json = tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_target(false)
                    .with_writer(tracing_appender::rolling::never(dir, file_name));
                registry.with(json).try_init().is_ok()
            }
            LogOutput::Console => {
                let console = tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr);
                registry.with(console).try_init().is_ok()
            }
        }
    })
}
