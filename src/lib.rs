//! nickelconf - section-aware access to the Kobo `eReader.conf` file.
//!
//! This library provides the core functionality for the `nickelconf` CLI:
//! a line-oriented engine that reads and rewrites one `key=value` entry
//! inside a named `[Section]` while preserving the rest of the file, and
//! typed accessors for the front light and colour keys under
//! `[PowerOptions]`.

pub mod cli;
pub mod commands;
pub mod config;
pub mod engine;
pub mod settings;
pub mod store;

pub use engine::{SectionEngine, SetOutcome};
pub use settings::{PowerOptions, PowerSnapshot, Setting, SettingValue};

/// Library-level error type for nickelconf operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{key} must be between {min} and {max}, got {value}")]
    OutOfRange {
        key: String,
        value: i64,
        min: i64,
        max: i64,
    },
}

/// Result type alias for nickelconf operations.
pub type Result<T> = std::result::Result<T, Error>;
