//! Resolution of the config file path.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. `--config` CLI flag
//! 2. `NICKELCONF_PATH` environment variable
//! 3. The on-device default, [`DEFAULT_CONFIG_PATH`]
//!
//! The resolved path is handed to the engine explicitly; nothing here is
//! process-wide mutable state.

pub mod resolver;

pub use resolver::{
    CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH, LOG_FILTER_ENV, Resolved, ValueSource,
    resolve_config_path, resolve_config_path_with_env,
};
