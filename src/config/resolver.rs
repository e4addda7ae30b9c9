//! Precedence resolution for the config file path, with source tracking.

use std::path::PathBuf;

use serde::Serialize;

/// Where Nickel keeps its settings on the device.
pub const DEFAULT_CONFIG_PATH: &str = "/mnt/onboard/.kobo/Kobo/Kobo eReader.conf";

/// Environment variable overriding the config file path.
pub const CONFIG_PATH_ENV: &str = "NICKELCONF_PATH";

/// Environment variable holding the tracing filter (e.g. `debug`).
pub const LOG_FILTER_ENV: &str = "NICKELCONF_LOG";

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from environment variable
    EnvVar(String),
    /// Value from CLI flag
    CliFlag,
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

impl Serialize for ValueSource {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    /// The resolved value
    pub value: T,
    /// Where the value came from
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    /// Create a new resolved value.
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Resolve the config path from the CLI flag, then the process environment.
pub fn resolve_config_path(cli_path: Option<PathBuf>) -> Resolved<PathBuf> {
    resolve_config_path_with_env(cli_path, std::env::var(CONFIG_PATH_ENV).ok())
}

/// Resolve the config path with an explicit environment value.
///
/// Empty values are ignored so `NICKELCONF_PATH=` falls through to the default.
pub fn resolve_config_path_with_env(
    cli_path: Option<PathBuf>,
    env_path: Option<String>,
) -> Resolved<PathBuf> {
    if let Some(path) = cli_path.filter(|p| !p.as_os_str().is_empty()) {
        return Resolved::new(path, ValueSource::CliFlag);
    }
    if let Some(path) = env_path.filter(|p| !p.is_empty()) {
        return Resolved::new(
            PathBuf::from(path),
            ValueSource::EnvVar(CONFIG_PATH_ENV.to_string()),
        );
    }
    Resolved::new(PathBuf::from(DEFAULT_CONFIG_PATH), ValueSource::Default)
}
