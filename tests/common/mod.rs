//! Common test utilities for windlass integration tests.
//!
//! Provides `TestEnv` for isolated test environments that do not read the
//! user's real `~/.config/windlass/config.toml` or WINDLASS_* variables.

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
pub use tempfile::TempDir;

/// A test environment with isolated configuration and data storage.
///
/// Each `TestEnv` creates two temporary directories:
/// - `config_dir`: Substitutes for XDG config (via `XDG_CONFIG_HOME`)
/// - `data_dir`: Holds work logs and the program (via `WINDLASS_DATA_DIR`)
///
/// The `wl()` method returns a `Command` with the tracker environment
/// variables cleared, so tests are deterministic regardless of the host
/// environment, and parallel-safe.
pub struct TestEnv {
    pub config_dir: TempDir,
    pub data_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with isolated directories.
    pub fn new() -> Self {
        Self {
            config_dir: TempDir::new().unwrap(),
            data_dir: TempDir::new().unwrap(),
        }
    }

    /// Create an environment with a complete config file already written.
    ///
    /// The base URL points at a closed local port, so any command that
    /// reaches the tracker fails fast instead of hanging.
    pub fn with_config() -> Self {
        let env = Self::new();
        let dir = env.config_dir.path().join("windlass");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("config.toml"),
            concat!(
                "base_url = \"http://127.0.0.1:9\"\n",
                "email = \"dev@example.com\"\n",
                "api_token = \"token\"\n",
                "project_key = \"WL\"\n",
            ),
        )
        .unwrap();
        env
    }

    /// Get a Command for the wl binary with isolated config and data.
    pub fn wl(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_wl"));
        cmd.env("XDG_CONFIG_HOME", self.config_dir.path());
        cmd.env("WINDLASS_DATA_DIR", self.data_dir.path());
        cmd.env_remove("WINDLASS_BASE_URL");
        cmd.env_remove("WINDLASS_EMAIL");
        cmd.env_remove("WINDLASS_API_TOKEN");
        cmd.env_remove("WINDLASS_PROJECT_KEY");
        cmd
    }

    /// Get the path to the data directory.
    pub fn data_path(&self) -> &std::path::Path {
        self.data_dir.path()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
