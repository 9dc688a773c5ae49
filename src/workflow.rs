//! Task lifecycle orchestration.
//!
//! The controller wires the transition validator, the work log store, the
//! dependency graph, and the tracker together to implement the lifecycle
//! operations: start, complete development, complete review, unconditional
//! complete, sub-task batches, and development program management.
//!
//! Batch operations have partial-failure semantics throughout: one bad item
//! is recorded and the rest of the batch proceeds.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::models::graph::{DependencyGraph, EndpointRef};
use crate::models::{
    ReviewDecision, STATUS_DONE, STATUS_IN_PROGRESS, STATUS_REVIEW, STATUS_SELECTED,
    STATUS_TESTING, STATUS_WONT_DO, StatusMap, TaskState,
};
use crate::program::{ProgramEntry, ProgramStore};
use crate::tracker::{IssueTracker, NewTask};
use crate::transition::{self, TransitionOutcome};
use crate::worklog::{
    SECTION_DEV_COMPLETED, SECTION_DISCARDED, SECTION_REVIEW_COMPLETED, SECTION_REVIEW_FEEDBACK,
    WorkLogStore,
};
use crate::{Error, Result};

/// File name of the project-level running brief.
const BRIEF_FILE: &str = "PROJECT_BRIEF.md";

/// Decides whether a completed task routes to Review or Testing.
///
/// The default is a summary-keyword heuristic; it lives behind a predicate
/// so a task-type field can replace it without touching the controller.
#[derive(Debug, Clone)]
pub struct ReviewRoute {
    keywords: Vec<String>,
}

impl ReviewRoute {
    pub fn new(keywords: Vec<String>) -> Self {
        Self {
            keywords: keywords.into_iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    /// Next state after development completes for a task with this summary.
    pub fn next_state(&self, summary: &str) -> TaskState {
        let lower = summary.to_lowercase();
        if self.keywords.iter().any(|k| lower.contains(k.as_str())) {
            TaskState::Review
        } else {
            TaskState::Testing
        }
    }
}

impl Default for ReviewRoute {
    fn default() -> Self {
        Self::new(vec!["test".to_string(), "testing".to_string()])
    }
}

/// One failure inside a batch operation.
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    /// The item the failure belongs to (task id, symbolic key, or edge)
    pub item: String,
    pub error: String,
}

/// Declarative sub-task to create under a parent.
///
/// `key` is a symbolic name other specs in the same batch may reference in
/// `blocks` before the task exists; `depends_on` names already-existing
/// tracker ids that must finish first.
#[derive(Debug, Clone, Deserialize)]
pub struct SubtaskSpec {
    #[serde(default)]
    pub key: Option<String>,
    pub summary: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Targets this sub-task blocks: symbolic keys within the batch or
    /// real tracker ids
    #[serde(default)]
    pub blocks: Vec<String>,
    /// Real tracker ids that block this sub-task
    #[serde(default)]
    pub depends_on: Vec<String>,
}

/// Outcome of a sub-task batch.
#[derive(Debug, Clone, Serialize)]
pub struct SubtaskReport {
    /// Created (summary, tracker id) pairs in creation order
    pub created: Vec<(String, String)>,
    /// Registered (blocker, blocked) links
    pub linked: Vec<(String, String)>,
    pub failures: Vec<BatchFailure>,
}

/// Outcome of starting a task.
#[derive(Debug, Clone, Serialize)]
pub struct StartReport {
    pub task_id: String,
    /// False when the task was already In Progress
    pub transitioned: bool,
    pub work_log: PathBuf,
}

/// Outcome of completing development.
#[derive(Debug, Clone, Serialize)]
pub struct CompleteReport {
    pub task_id: String,
    /// Status the task was routed to (Testing or Review)
    pub next_status: String,
}

/// Outcome of a review or an unconditional completion.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewReport {
    pub task_id: String,
    pub new_status: String,
    /// Dependents whose blockers are now all Done (informational)
    pub unblocked: Vec<String>,
    pub brief_updated: bool,
}

/// Outcome of creating the development program.
#[derive(Debug, Clone, Serialize)]
pub struct ProgramReport {
    pub entries: Vec<ProgramEntry>,
    pub failures: Vec<BatchFailure>,
}

/// Live status of one program entry.
#[derive(Debug, Clone, Serialize)]
pub struct ProgramTaskStatus {
    pub entry: ProgramEntry,
    /// Freshly-read tracker status; `None` when the lookup failed
    pub live_status: Option<String>,
    pub has_work_log: bool,
}

/// The lifecycle controller.
pub struct Workflow<'a> {
    tracker: &'a dyn IssueTracker,
    worklogs: WorkLogStore,
    programs: ProgramStore,
    brief_path: PathBuf,
    status_map: StatusMap,
    route: ReviewRoute,
}

impl<'a> Workflow<'a> {
    /// Controller over a tracker with artifacts rooted at `data_dir`.
    pub fn new(tracker: &'a dyn IssueTracker, data_dir: &Path) -> Self {
        Self {
            tracker,
            worklogs: WorkLogStore::new(data_dir),
            programs: ProgramStore::new(data_dir),
            brief_path: data_dir.join(BRIEF_FILE),
            status_map: StatusMap::default(),
            route: ReviewRoute::default(),
        }
    }

    /// Replace the status vocabulary mapping.
    pub fn with_status_map(mut self, map: StatusMap) -> Self {
        self.status_map = map;
        self
    }

    /// Replace the review-routing predicate.
    pub fn with_route(mut self, route: ReviewRoute) -> Self {
        self.route = route;
        self
    }

    /// Access to the work log store (read paths for display).
    pub fn worklogs(&self) -> &WorkLogStore {
        &self.worklogs
    }

    fn status_name(&self, state: TaskState) -> &str {
        self.status_map.status_name(state).unwrap_or(match state {
            TaskState::Selected => STATUS_SELECTED,
            TaskState::InProgress => STATUS_IN_PROGRESS,
            TaskState::Testing => STATUS_TESTING,
            TaskState::Review => STATUS_REVIEW,
            TaskState::Done => STATUS_DONE,
            TaskState::WontDo => STATUS_WONT_DO,
        })
    }

    /// Start development: move to In Progress unless already there, then
    /// create the work log. Idempotent on repeated calls.
    pub fn start(&self, task_id: &str) -> Result<StartReport> {
        let task = self.tracker.get_task(task_id)?;

        let outcome = transition::perform(
            self.tracker,
            task_id,
            self.status_name(TaskState::InProgress),
        )?;

        let parent = task
            .parent
            .as_ref()
            .map(|p| (p.id.as_str(), p.summary.as_str()));
        let work_log = self.worklogs.create(task_id, &task.summary, parent)?;

        Ok(StartReport {
            task_id: task_id.to_string(),
            transitioned: outcome == TransitionOutcome::Applied,
            work_log,
        })
    }

    /// Complete the development phase.
    ///
    /// Requires an existing work log; without one this fails before any
    /// tracker mutation. Routes to Review or Testing per the configured
    /// predicate.
    pub fn complete_development(&self, task_id: &str) -> Result<CompleteReport> {
        if !self.worklogs.exists(task_id) {
            return Err(Error::Precondition(format!(
                "work log must exist before completing {}",
                task_id
            )));
        }

        let task = self.tracker.get_task(task_id)?;
        let next = self.route.next_state(&task.summary);
        let next_status = self.status_name(next).to_string();

        self.worklogs
            .append_section(task_id, SECTION_DEV_COMPLETED, &[])?;
        transition::perform(self.tracker, task_id, &next_status)?;

        Ok(CompleteReport {
            task_id: task_id.to_string(),
            next_status,
        })
    }

    /// Resolve a review with an explicit decision.
    pub fn complete_review(&self, task_id: &str, decision: &ReviewDecision) -> Result<ReviewReport> {
        let task = self.tracker.get_task(task_id)?;

        match decision {
            ReviewDecision::Approve { update_brief } => {
                self.worklogs.append_section(
                    task_id,
                    SECTION_REVIEW_COMPLETED,
                    &["Status: Approved".to_string()],
                )?;
                let done = self.status_name(TaskState::Done).to_string();
                transition::perform(self.tracker, task_id, &done)?;

                let mut brief_updated = false;
                if *update_brief {
                    if let Some(parent) = &task.parent {
                        self.append_brief_entry(&parent.id, task_id, &task.summary)?;
                        brief_updated = true;
                    }
                }

                Ok(ReviewReport {
                    task_id: task_id.to_string(),
                    new_status: done,
                    unblocked: self.unblocked_dependents(task_id),
                    brief_updated,
                })
            }
            ReviewDecision::ReturnToDevelopment { reason } => {
                self.worklogs.append_section(
                    task_id,
                    SECTION_REVIEW_FEEDBACK,
                    &[
                        "Status: Returned to Development".to_string(),
                        format!("Reason: {}", reason),
                    ],
                )?;
                let in_progress = self.status_name(TaskState::InProgress).to_string();
                transition::perform(self.tracker, task_id, &in_progress)?;
                Ok(ReviewReport {
                    task_id: task_id.to_string(),
                    new_status: in_progress,
                    unblocked: Vec::new(),
                    brief_updated: false,
                })
            }
            ReviewDecision::Discard { reason } => {
                self.worklogs.append_section(
                    task_id,
                    SECTION_DISCARDED,
                    &[format!("Reason: {}", reason)],
                )?;
                let wont_do = self.status_name(TaskState::WontDo).to_string();
                transition::perform(self.tracker, task_id, &wont_do)?;
                Ok(ReviewReport {
                    task_id: task_id.to_string(),
                    new_status: wont_do,
                    unblocked: Vec::new(),
                    brief_updated: false,
                })
            }
        }
    }

    /// Administrative completion: straight to Done, no work-log
    /// precondition. Distinct from [`Workflow::complete_development`] by
    /// design; used for marking already-finished work.
    pub fn complete_unconditional(&self, task_id: &str) -> Result<ReviewReport> {
        let done = self.status_name(TaskState::Done).to_string();
        transition::perform(self.tracker, task_id, &done)?;
        Ok(ReviewReport {
            task_id: task_id.to_string(),
            new_status: done,
            unblocked: self.unblocked_dependents(task_id),
            brief_updated: false,
        })
    }

    /// Which of the tasks blocked by `task_id` now have every blocker Done.
    ///
    /// Informational only: nothing is auto-transitioned. Per-dependent
    /// lookup failures (including cyclic link data) drop that dependent
    /// from the report rather than failing the operation.
    pub fn unblocked_dependents(&self, task_id: &str) -> Vec<String> {
        let task = match self.tracker.get_task(task_id) {
            Ok(t) => t,
            Err(_) => return Vec::new(),
        };

        let mut unblocked = Vec::new();
        for dependent_id in &task.blocks {
            let dependent = match self.tracker.get_task(dependent_id) {
                Ok(t) => t,
                Err(_) => continue,
            };
            let graph =
                DependencyGraph::from_links(dependent_id, &dependent.blocked_by, &dependent.blocks);

            let mut statuses = HashMap::new();
            for pred in graph.predecessors(dependent_id) {
                if let Ok(pred_task) = self.tracker.get_task(&pred) {
                    if let Some(state) = self.status_map.classify(&pred_task.status) {
                        statuses.insert(pred, state);
                    }
                }
            }

            if let Ok(true) = graph.predecessors_done(dependent_id, &statuses) {
                unblocked.push(dependent_id.clone());
            }
        }
        unblocked
    }

    /// Create sub-tasks under a parent with two-phase dependency wiring:
    /// create every task first, then resolve symbolic references and
    /// register links. Partial failures never abort the batch.
    pub fn create_subtasks(&self, parent_id: &str, specs: &[SubtaskSpec]) -> Result<SubtaskReport> {
        // Parent must resolve before anything is created.
        self.tracker.get_task(parent_id)?;

        let mut report = SubtaskReport {
            created: Vec::new(),
            linked: Vec::new(),
            failures: Vec::new(),
        };
        let symbolic: Vec<&str> = specs.iter().filter_map(|s| s.key.as_deref()).collect();
        let mut graph = DependencyGraph::new();

        // Phase 1: declare edges, create tasks, resolve placeholders.
        for spec in specs {
            let self_ref = |real: &Option<String>| match (&spec.key, real) {
                (_, Some(id)) => EndpointRef::Id(id.clone()),
                (Some(key), None) => EndpointRef::Placeholder(key.clone()),
                (None, None) => EndpointRef::Placeholder(spec.summary.clone()),
            };

            let new_task = NewTask {
                summary: spec.summary.clone(),
                description: spec.description.clone(),
                issue_type: "Sub-task".to_string(),
                parent: Some(parent_id.to_string()),
            };
            let created = match self.tracker.create_task(&new_task) {
                Ok(id) => {
                    report.created.push((spec.summary.clone(), id.clone()));
                    Some(id)
                }
                Err(e) => {
                    report.failures.push(BatchFailure {
                        item: spec.summary.clone(),
                        error: e.to_string(),
                    });
                    None
                }
            };

            for target in &spec.blocks {
                let blocked = if symbolic.contains(&target.as_str()) {
                    EndpointRef::Placeholder(target.clone())
                } else {
                    EndpointRef::Id(target.clone())
                };
                graph.add_pending(self_ref(&created), blocked);
            }
            for blocker in &spec.depends_on {
                graph.add_pending(EndpointRef::Id(blocker.clone()), self_ref(&created));
            }

            if let (Some(key), Some(id)) = (&spec.key, &created) {
                graph.resolve(key, id);
            }
        }

        // Phase 2: promote resolved edges and register the links.
        let (promoted, unresolved) = graph.commit();
        for (blocker, blocked) in promoted {
            match self.tracker.create_link(&blocker, &blocked) {
                Ok(()) => report.linked.push((blocker, blocked)),
                Err(e) => report.failures.push(BatchFailure {
                    item: format!("{} blocks {}", blocker, blocked),
                    error: e.to_string(),
                }),
            }
        }
        for edge in unresolved {
            report.failures.push(BatchFailure {
                item: format!("{:?} blocks {:?}", edge.blocker, edge.blocked),
                error: "dependency target was never created".to_string(),
            });
        }

        Ok(report)
    }

    /// Build the development program from an ordered id list.
    ///
    /// Priorities are assigned in input order. Tasks not already queued or
    /// in active work are moved to the ready-to-start status. Per-item
    /// failures are collected; failed items do not enter the program.
    pub fn create_program(&self, task_ids: &[String]) -> Result<ProgramReport> {
        let mut entries = Vec::new();
        let mut failures = Vec::new();

        for task_id in task_ids {
            let task = match self.tracker.get_task(task_id) {
                Ok(t) => t,
                Err(e) => {
                    failures.push(BatchFailure {
                        item: task_id.clone(),
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            let state = self.status_map.classify(&task.status);
            let queued_or_active =
                matches!(state, Some(s) if s == TaskState::Selected || s.is_active_work());
            if !queued_or_active {
                if let Err(e) = transition::perform(
                    self.tracker,
                    task_id,
                    self.status_name(TaskState::Selected),
                ) {
                    failures.push(BatchFailure {
                        item: task_id.clone(),
                        error: e.to_string(),
                    });
                    continue;
                }
            }

            entries.push(ProgramEntry {
                id: task_id.clone(),
                summary: task.summary,
                status: task.status,
                priority: entries.len() as u32 + 1,
            });
        }

        if !entries.is_empty() {
            self.programs.save(&entries)?;
        }
        Ok(ProgramReport { entries, failures })
    }

    /// Current state of the program: live tracker status plus work-log
    /// existence per entry. The persisted status snapshot is only a hint.
    pub fn program_status(&self) -> Result<Vec<ProgramTaskStatus>> {
        let entries = self.programs.load()?.unwrap_or_default();
        Ok(entries
            .into_iter()
            .map(|entry| {
                let live_status = self.tracker.get_task(&entry.id).ok().map(|t| t.status);
                let has_work_log = self.worklogs.exists(&entry.id);
                ProgramTaskStatus {
                    entry,
                    live_status,
                    has_work_log,
                }
            })
            .collect())
    }

    /// Append a story entry to the project brief, creating the file on
    /// first use.
    fn append_brief_entry(&self, story_id: &str, task_id: &str, summary: &str) -> Result<()> {
        use std::io::Write;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.brief_path)?;
        write!(
            file,
            "\n## Story Update ({}) - {}\nTask Completed: {} - {}\n",
            story_id,
            Utc::now().format("%Y-%m-%d"),
            task_id,
            summary
        )?;
        Ok(())
    }
}
