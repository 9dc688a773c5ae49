//! Windlass - a task lifecycle engine for an external issue tracker.
//!
//! This library provides the core functionality for the `wl` CLI tool:
//! status transition validation, work log management, dependency tracking,
//! and attention scanning over a tracked working set of tasks.

pub mod cli;
pub mod commands;
pub mod config;
pub mod models;
pub mod program;
pub mod scanner;
pub mod tracker;
pub mod transition;
pub mod workflow;
pub mod worklog;


/// Library-level error type for Windlass operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Invalid transition for {task_id}: {reason} (current status: {current_status})")]
    InvalidTransition {
        task_id: String,
        current_status: String,
        reason: String,
    },

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Tracker request failed: {0}")]
    Transport(String),

    #[error("Cycle detected in dependencies")]
    CycleDetected,
}

/// Result type alias for Windlass operations.
pub type Result<T> = std::result::Result<T, Error>;
