//! Command implementations for the Windlass CLI.
//!
//! Each command is a function over the tracker and the on-disk stores that
//! returns a result struct. Results serialize to JSON by default and render
//! a human-readable form behind `-H`.

use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::models::graph::DependencyGraph;
use crate::models::{AttentionItem, StatusMap, TaskState};
use crate::scanner::{AttentionScanner, ScanConfig};
use crate::tracker::{IssueTracker, NewTask, TrackerTask, Transition};
use crate::transition::{self, TransitionOutcome};
use crate::workflow::{
    BatchFailure, CompleteReport, ProgramReport, ProgramTaskStatus, ReviewReport, StartReport,
    SubtaskReport, SubtaskSpec, Workflow,
};
use crate::worklog::WorkLogStore;
use crate::{Error, Result};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn json_of<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

fn render_failures(out: &mut String, failures: &[BatchFailure]) {
    for f in failures {
        out.push_str(&format!("  FAILED {}: {}\n", f.item, f.error));
    }
}

// ---------------------------------------------------------------------------
// Task CRUD

#[derive(Debug, Serialize)]
pub struct TaskCreated {
    pub id: String,
    pub summary: String,
}

impl Output for TaskCreated {
    fn to_json(&self) -> String {
        json_of(self)
    }

    fn to_human(&self) -> String {
        format!("Created {}: {}", self.id, self.summary)
    }
}

pub fn task_create(
    tracker: &dyn IssueTracker,
    summary: &str,
    description: Option<String>,
    issue_type: &str,
    parent: Option<String>,
) -> Result<TaskCreated> {
    let spec = NewTask {
        summary: summary.to_string(),
        description,
        issue_type: issue_type.to_string(),
        parent,
    };
    let id = tracker.create_task(&spec)?;
    Ok(TaskCreated {
        id,
        summary: summary.to_string(),
    })
}

#[derive(Debug, Serialize)]
pub struct TaskList {
    pub tasks: Vec<TrackerTask>,
}

impl Output for TaskList {
    fn to_json(&self) -> String {
        json_of(self)
    }

    fn to_human(&self) -> String {
        if self.tasks.is_empty() {
            return "No tasks found".to_string();
        }
        let mut out = String::new();
        for t in &self.tasks {
            out.push_str(&format!("{}  [{}]  {}\n", t.id, t.status, t.summary));
        }
        out.trim_end().to_string()
    }
}

pub fn task_list(
    tracker: &dyn IssueTracker,
    project_key: &str,
    status: Option<&str>,
) -> Result<TaskList> {
    let filter = match status {
        Some(s) => format!(
            "project = \"{}\" AND status = \"{}\" ORDER BY created DESC",
            project_key, s
        ),
        None => format!("project = \"{}\" ORDER BY created DESC", project_key),
    };
    Ok(TaskList {
        tasks: tracker.search(&filter)?,
    })
}

#[derive(Debug, Serialize)]
pub struct TaskDetail {
    pub task: TrackerTask,
    /// Transitions available from the current status
    pub transitions: Vec<Transition>,
}

impl Output for TaskDetail {
    fn to_json(&self) -> String {
        json_of(self)
    }

    fn to_human(&self) -> String {
        let t = &self.task;
        let mut out = format!("{}: {}\nStatus: {}\n", t.id, t.summary, t.status);
        if let Some(parent) = &t.parent {
            out.push_str(&format!("Parent: {} - {}\n", parent.id, parent.summary));
        }
        if let Some(assignee) = &t.assignee {
            out.push_str(&format!("Assignee: {}\n", assignee));
        }
        if let Some(desc) = &t.description {
            out.push_str(&format!("\n{}\n", desc));
        }
        if !t.blocked_by.is_empty() {
            out.push_str(&format!("Blocked by: {}\n", t.blocked_by.join(", ")));
        }
        if !t.blocks.is_empty() {
            out.push_str(&format!("Blocks: {}\n", t.blocks.join(", ")));
        }
        let names: Vec<&str> = self.transitions.iter().map(|tr| tr.name.as_str()).collect();
        out.push_str(&format!("Available transitions: {}", names.join(", ")));
        out
    }
}

pub fn task_show(tracker: &dyn IssueTracker, id: &str) -> Result<TaskDetail> {
    Ok(TaskDetail {
        task: tracker.get_task(id)?,
        transitions: tracker.list_transitions(id)?,
    })
}

#[derive(Debug, Serialize)]
pub struct Commented {
    pub id: String,
}

impl Output for Commented {
    fn to_json(&self) -> String {
        json_of(self)
    }

    fn to_human(&self) -> String {
        format!("Comment added to {}", self.id)
    }
}

pub fn comment(tracker: &dyn IssueTracker, id: &str, body: &str) -> Result<Commented> {
    tracker.add_comment(id, body)?;
    Ok(Commented { id: id.to_string() })
}

// ---------------------------------------------------------------------------
// Status moves

#[derive(Debug, Serialize)]
pub struct MoveReport {
    pub target_status: String,
    /// Tasks actually transitioned
    pub moved: Vec<String>,
    /// Tasks already in the target status (success, nothing applied)
    pub already_there: Vec<String>,
    pub failures: Vec<BatchFailure>,
}

impl Output for MoveReport {
    fn to_json(&self) -> String {
        json_of(self)
    }

    fn to_human(&self) -> String {
        let mut out = format!(
            "Move to {}: {} moved, {} already there, {} failed\n",
            self.target_status,
            self.moved.len(),
            self.already_there.len(),
            self.failures.len()
        );
        for id in &self.moved {
            out.push_str(&format!("  moved {}\n", id));
        }
        for id in &self.already_there {
            out.push_str(&format!("  {} already in {}\n", id, self.target_status));
        }
        render_failures(&mut out, &self.failures);
        out.trim_end().to_string()
    }
}

/// Move a batch of tasks to one target status. Per-task semantics: a task
/// already in the target counts as success, an unavailable transition is a
/// recorded failure, and neither stops the rest of the batch.
pub fn move_tasks(tracker: &dyn IssueTracker, ids: &[String], status: &str) -> Result<MoveReport> {
    let mut report = MoveReport {
        target_status: status.to_string(),
        moved: Vec::new(),
        already_there: Vec::new(),
        failures: Vec::new(),
    };
    for id in ids {
        match transition::perform(tracker, id, status) {
            Ok(TransitionOutcome::Applied) => report.moved.push(id.clone()),
            Ok(TransitionOutcome::NoOp) => report.already_there.push(id.clone()),
            Err(e) => report.failures.push(BatchFailure {
                item: id.clone(),
                error: e.to_string(),
            }),
        }
    }
    Ok(report)
}

// ---------------------------------------------------------------------------
// Lifecycle operations

impl Output for StartReport {
    fn to_json(&self) -> String {
        json_of(self)
    }

    fn to_human(&self) -> String {
        let verb = if self.transitioned {
            "moved to In Progress"
        } else {
            "already In Progress"
        };
        format!(
            "{} {}\nWork log: {}",
            self.task_id,
            verb,
            self.work_log.display()
        )
    }
}

impl Output for CompleteReport {
    fn to_json(&self) -> String {
        json_of(self)
    }

    fn to_human(&self) -> String {
        format!("{} moved to {}", self.task_id, self.next_status)
    }
}

impl Output for ReviewReport {
    fn to_json(&self) -> String {
        json_of(self)
    }

    fn to_human(&self) -> String {
        let mut out = format!("{} moved to {}", self.task_id, self.new_status);
        if self.brief_updated {
            out.push_str("\nProject brief updated");
        }
        if !self.unblocked.is_empty() {
            out.push_str(&format!("\nNow unblocked: {}", self.unblocked.join(", ")));
        }
        out
    }
}

impl Output for SubtaskReport {
    fn to_json(&self) -> String {
        json_of(self)
    }

    fn to_human(&self) -> String {
        let mut out = format!(
            "Created {} sub-tasks, {} links, {} failures\n",
            self.created.len(),
            self.linked.len(),
            self.failures.len()
        );
        for (summary, id) in &self.created {
            out.push_str(&format!("  {}  {}\n", id, summary));
        }
        for (blocker, blocked) in &self.linked {
            out.push_str(&format!("  link: {} blocks {}\n", blocker, blocked));
        }
        render_failures(&mut out, &self.failures);
        out.trim_end().to_string()
    }
}

impl Output for ProgramReport {
    fn to_json(&self) -> String {
        json_of(self)
    }

    fn to_human(&self) -> String {
        let mut out = format!(
            "Program created with {} tasks ({} failures)\n",
            self.entries.len(),
            self.failures.len()
        );
        for e in &self.entries {
            out.push_str(&format!("  {}. {}  {}\n", e.priority, e.id, e.summary));
        }
        render_failures(&mut out, &self.failures);
        out.trim_end().to_string()
    }
}

/// Read sub-task specs from a JSON file and create them under a parent.
pub fn subtasks_from_file(
    workflow: &Workflow<'_>,
    parent: &str,
    file: &Path,
) -> Result<SubtaskReport> {
    let text = std::fs::read_to_string(file)?;
    let specs: Vec<SubtaskSpec> = serde_json::from_str(&text)?;
    if specs.is_empty() {
        return Err(Error::Precondition(format!(
            "no sub-task specs in {}",
            file.display()
        )));
    }
    workflow.create_subtasks(parent, &specs)
}

#[derive(Debug, Serialize)]
pub struct ProgramStatusOutput {
    pub tasks: Vec<ProgramTaskStatus>,
}

impl Output for ProgramStatusOutput {
    fn to_json(&self) -> String {
        json_of(self)
    }

    fn to_human(&self) -> String {
        if self.tasks.is_empty() {
            return "No development program found".to_string();
        }
        let mut out = String::new();
        for t in &self.tasks {
            let status = t.entry.status.as_str();
            let live = t.live_status.as_deref().unwrap_or("unknown");
            let log = if t.has_work_log { "log" } else { "no log" };
            out.push_str(&format!(
                "{}. {}  {}  [{}]  ({})\n",
                t.entry.priority, t.entry.id, t.entry.summary, live, log
            ));
            if live != status {
                out.push_str(&format!("     (program snapshot was {})\n", status));
            }
        }
        out.trim_end().to_string()
    }
}

pub fn program_status(workflow: &Workflow<'_>) -> Result<ProgramStatusOutput> {
    Ok(ProgramStatusOutput {
        tasks: workflow.program_status()?,
    })
}

// ---------------------------------------------------------------------------
// Attention scan

#[derive(Debug, Serialize)]
pub struct ScanOutput {
    pub items: Vec<AttentionItem>,
    pub failures: Vec<BatchFailure>,
}

impl Output for ScanOutput {
    fn to_json(&self) -> String {
        json_of(self)
    }

    fn to_human(&self) -> String {
        if self.items.is_empty() && self.failures.is_empty() {
            return "Nothing needs attention".to_string();
        }
        let mut out = String::new();
        let mut current_status: Option<&str> = None;
        for item in &self.items {
            if current_status != Some(item.status.as_str()) {
                current_status = Some(item.status.as_str());
                out.push_str(&format!("{}:\n", item.status));
            }
            out.push_str(&format!(
                "  {}  {}\n      {} ({})\n",
                item.task_id, item.summary, item.reason, item.action
            ));
        }
        render_failures(&mut out, &self.failures);
        out.trim_end().to_string()
    }
}

pub fn scan(
    tracker: &dyn IssueTracker,
    worklogs: &WorkLogStore,
    project_key: &str,
) -> Result<ScanOutput> {
    let scanner = AttentionScanner::new(tracker, worklogs, ScanConfig::for_project(project_key));
    let report = scanner.scan()?;
    Ok(ScanOutput {
        items: report.items,
        failures: report.failures,
    })
}

// ---------------------------------------------------------------------------
// Dependency state

#[derive(Debug, Serialize)]
pub struct DepRow {
    pub id: String,
    pub status: String,
    pub done: bool,
}

#[derive(Debug, Serialize)]
pub struct DepsOutput {
    pub id: String,
    pub blocked_by: Vec<DepRow>,
    pub blocks: Vec<String>,
    /// True when every blocker is Done
    pub ready: bool,
}

impl Output for DepsOutput {
    fn to_json(&self) -> String {
        json_of(self)
    }

    fn to_human(&self) -> String {
        let mut out = format!("{}:\n", self.id);
        if self.blocked_by.is_empty() {
            out.push_str("  No blockers\n");
        } else {
            for dep in &self.blocked_by {
                let mark = if dep.done { "done" } else { "open" };
                out.push_str(&format!("  blocked by {} [{}] ({})\n", dep.id, dep.status, mark));
            }
        }
        for id in &self.blocks {
            out.push_str(&format!("  blocks {}\n", id));
        }
        out.push_str(if self.ready {
            "Ready: all blockers complete"
        } else {
            "Not ready: open blockers remain"
        });
        out
    }
}

/// Report blocker and dependent state for one task. Fails with
/// `Error::CycleDetected` if the link data reaches back to the task itself.
pub fn deps(tracker: &dyn IssueTracker, id: &str) -> Result<DepsOutput> {
    let task = tracker.get_task(id)?;
    let graph = DependencyGraph::from_links(id, &task.blocked_by, &task.blocks);
    let status_map = StatusMap::default();

    let mut statuses = HashMap::new();
    let mut rows = Vec::new();
    for blocker_id in graph.predecessors(id) {
        let blocker = tracker.get_task(&blocker_id)?;
        let state = status_map.classify(&blocker.status);
        if let Some(state) = state {
            statuses.insert(blocker_id.clone(), state);
        }
        rows.push(DepRow {
            id: blocker_id,
            status: blocker.status,
            done: state == Some(TaskState::Done),
        });
    }
    let ready = graph.predecessors_done(id, &statuses)?;

    Ok(DepsOutput {
        id: id.to_string(),
        blocked_by: rows,
        blocks: task.blocks,
        ready,
    })
}

// ---------------------------------------------------------------------------
// Work logs

#[derive(Debug, Serialize)]
pub struct LogShow {
    pub id: String,
    pub path: PathBuf,
    pub content: String,
}

impl Output for LogShow {
    fn to_json(&self) -> String {
        json_of(self)
    }

    fn to_human(&self) -> String {
        self.content.clone()
    }
}

pub fn log_show(worklogs: &WorkLogStore, id: &str) -> Result<LogShow> {
    let path = worklogs.path(id);
    if !worklogs.exists(id) {
        return Err(Error::NotFound(format!("no work log for {}", id)));
    }
    Ok(LogShow {
        id: id.to_string(),
        content: std::fs::read_to_string(&path)?,
        path,
    })
}

#[derive(Debug, Serialize)]
pub struct LogEntryAdded {
    pub id: String,
    pub path: PathBuf,
}

impl Output for LogEntryAdded {
    fn to_json(&self) -> String {
        json_of(self)
    }

    fn to_human(&self) -> String {
        format!("Added work log entry for {} at {}", self.id, self.path.display())
    }
}

pub fn log_entry(worklogs: &WorkLogStore, id: &str) -> Result<LogEntryAdded> {
    worklogs.append_entry(id)?;
    Ok(LogEntryAdded {
        id: id.to_string(),
        path: worklogs.path(id),
    })
}
