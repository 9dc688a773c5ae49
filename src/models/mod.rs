//! Data models for Windlass entities.
//!
//! This module defines the core data structures:
//! - `TaskState` - The closed workflow state machine vocabulary
//! - `StatusMap` - Mapping from free-text tracker statuses to `TaskState`
//! - `AttentionItem` - A computed "this task needs a next action" signal
//! - `ReviewDecision` - The three-way outcome of a review

pub mod graph;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Workflow state as reasoned about by the state machine.
///
/// The tracker's status vocabulary is open-ended free text; this enum is the
/// closed set the lifecycle logic works with. Conversion from tracker
/// strings goes through [`StatusMap`] so no lifecycle code compares raw
/// status strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Queued for active work
    Selected,
    InProgress,
    Testing,
    Review,
    /// Terminal: completed
    Done,
    /// Terminal: discarded
    WontDo,
}

impl TaskState {
    /// Returns true for terminal states (`Done`, `WontDo`).
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Done | TaskState::WontDo)
    }

    /// Returns true for states that mean active development work.
    pub fn is_active_work(&self) -> bool {
        matches!(
            self,
            TaskState::InProgress | TaskState::Testing | TaskState::Review
        )
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Selected => "selected",
            TaskState::InProgress => "in_progress",
            TaskState::Testing => "testing",
            TaskState::Review => "review",
            TaskState::Done => "done",
            TaskState::WontDo => "wont_do",
        };
        write!(f, "{}", s)
    }
}

/// Canonical tracker status name for "ready to start development".
pub const STATUS_SELECTED: &str = "Selected for Development";
/// Canonical tracker status name for active development.
pub const STATUS_IN_PROGRESS: &str = "In Progress";
/// Canonical tracker status name for the testing phase.
pub const STATUS_TESTING: &str = "Testing";
/// Canonical tracker status name for the review phase.
pub const STATUS_REVIEW: &str = "Review";
/// Canonical tracker status name for completed work.
pub const STATUS_DONE: &str = "Done";
/// Canonical tracker status name for discarded work.
pub const STATUS_WONT_DO: &str = "Won't Do";

/// Injectable mapping table from tracker status strings to [`TaskState`].
///
/// Lookup is case-insensitive. Unknown statuses map to `None`; callers
/// decide whether that means "ignore" (scanner) or "error" (controller).
#[derive(Debug, Clone)]
pub struct StatusMap {
    entries: Vec<(String, TaskState)>,
}

impl StatusMap {
    /// Build a map from explicit (tracker status, state) pairs.
    pub fn new(entries: Vec<(String, TaskState)>) -> Self {
        Self { entries }
    }

    /// Classify a tracker status string.
    pub fn classify(&self, status: &str) -> Option<TaskState> {
        self.entries
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(status))
            .map(|(_, state)| *state)
    }

    /// Canonical tracker status name for a state, if the map has one.
    pub fn status_name(&self, state: TaskState) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, s)| *s == state)
            .map(|(name, _)| name.as_str())
    }
}

impl Default for StatusMap {
    fn default() -> Self {
        Self::new(vec![
            (STATUS_SELECTED.to_string(), TaskState::Selected),
            (STATUS_IN_PROGRESS.to_string(), TaskState::InProgress),
            (STATUS_TESTING.to_string(), TaskState::Testing),
            (STATUS_REVIEW.to_string(), TaskState::Review),
            (STATUS_DONE.to_string(), TaskState::Done),
            (STATUS_WONT_DO.to_string(), TaskState::WontDo),
        ])
    }
}

/// The concrete next action an attention item calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttentionAction {
    StartDevelopment,
    CreateWorkLog,
    UpdateWorkLog,
}

impl fmt::Display for AttentionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AttentionAction::StartDevelopment => "Start Development",
            AttentionAction::CreateWorkLog => "Create Work Log",
            AttentionAction::UpdateWorkLog => "Update Work Log",
        };
        write!(f, "{}", s)
    }
}

/// A task flagged by the attention scanner as needing a next step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttentionItem {
    /// Tracker task id
    pub task_id: String,

    /// Task summary
    pub summary: String,

    /// Raw tracker status at scan time
    pub status: String,

    /// Human-readable explanation of why this task was flagged
    pub reason: String,

    /// The action the scanner recommends
    pub action: AttentionAction,
}

/// Outcome of a review, supplied explicitly by the caller.
///
/// Reasons travel with the decision so the controller is callable headlessly
/// with no embedded prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewDecision {
    /// Approve and move to Done. When `update_brief` is set and the task has
    /// a parent story, a story entry is appended to the project brief.
    Approve { update_brief: bool },
    /// Send back to In Progress with feedback.
    ReturnToDevelopment { reason: String },
    /// Discard the task entirely.
    Discard { reason: String },
}
