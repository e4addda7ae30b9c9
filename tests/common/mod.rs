//! Common test utilities for nickelconf integration tests.
//!
//! Provides `TestEnv` for isolated test environments that never touch the
//! on-device config path.

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
pub use tempfile::TempDir;

/// A test environment with its own config file location.
///
/// The `nickelconf()` method returns a `Command` that sets `NICKELCONF_PATH`
/// per-invocation, making tests parallel-safe.
pub struct TestEnv {
    pub dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with no config file yet.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// Create a new test environment with the given config file content.
    pub fn with_config(content: &str) -> Self {
        let env = Self::new();
        env.write_config(content);
        env
    }

    /// Get a Command for the nickelconf binary pointed at this env's config.
    pub fn nickelconf(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_nickelconf"));
        cmd.current_dir(self.dir.path());
        cmd.env("NICKELCONF_PATH", self.config_path());
        cmd.env_remove("NICKELCONF_LOG");
        cmd
    }

    /// Path of the config file (may not exist).
    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("Kobo eReader.conf")
    }

    pub fn write_config(&self, content: &str) {
        fs::write(self.config_path(), content).expect("Failed to write config file");
    }

    pub fn read_config(&self) -> String {
        fs::read_to_string(self.config_path()).expect("Failed to read config file")
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
