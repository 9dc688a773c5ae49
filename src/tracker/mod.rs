//! Issue tracker interface.
//!
//! The tracker owns task state; this crate only ever holds read-derived
//! snapshots for the duration of one operation. [`IssueTracker`] is the seam
//! between the lifecycle engine and the wire: the HTTP client in
//! [`http`] implements it for real, and tests swap in [`fake::FakeTracker`].

pub mod http;

#[cfg(test)]
pub mod fake;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Read-derived snapshot of a tracker task.
///
/// Link data is flattened into blocker/blocked id lists; everything else the
/// tracker reports about links is dropped at the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerTask {
    /// Tracker-assigned id (e.g. "WL-123")
    pub id: String,

    /// One-line summary
    pub summary: String,

    /// Longer description, if set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Raw tracker status name (open vocabulary)
    pub status: String,

    /// Parent task, for sub-tasks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentRef>,

    /// Assigned user, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,

    /// Ids of tasks that block this one
    #[serde(default)]
    pub blocked_by: Vec<String>,

    /// Ids of tasks this one blocks
    #[serde(default)]
    pub blocks: Vec<String>,
}

/// Minimal reference to a parent task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentRef {
    pub id: String,
    pub summary: String,
}

/// A transition currently available from a task's status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// Target status name as the tracker reports it
    pub name: String,
    /// Tracker-internal transition id, required to execute it
    pub handle: String,
}

/// Fields for creating a new task.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub summary: String,
    pub description: Option<String>,
    /// Tracker issue type name (e.g. "Task", "Sub-task")
    pub issue_type: String,
    /// Parent id, for sub-tasks
    pub parent: Option<String>,
}

/// Operations the external tracker provides.
///
/// All calls are blocking and unretried; a per-call failure surfaces as a
/// structured error so batch callers can record it and continue.
pub trait IssueTracker {
    /// Fetch one task by id. Fails with `Error::NotFound` if it does not
    /// resolve.
    fn get_task(&self, id: &str) -> Result<TrackerTask>;

    /// List the transitions currently available from the task's status.
    fn list_transitions(&self, id: &str) -> Result<Vec<Transition>>;

    /// Execute a transition by its tracker-internal handle.
    fn apply_transition(&self, id: &str, handle: &str) -> Result<()>;

    /// Add a comment to a task.
    fn add_comment(&self, id: &str, body: &str) -> Result<()>;

    /// Create a directed "Blocks" link: `blocker` must finish before
    /// `blocked` is unblocked.
    fn create_link(&self, blocker: &str, blocked: &str) -> Result<()>;

    /// Query tasks by a tracker filter expression.
    fn search(&self, filter: &str) -> Result<Vec<TrackerTask>>;

    /// Create a task, returning its tracker-assigned id.
    fn create_task(&self, spec: &NewTask) -> Result<String>;
}
