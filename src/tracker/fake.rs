//! In-memory tracker used by unit tests.
//!
//! Backs the [`IssueTracker`] trait with `RefCell` state (the engine is
//! single-threaded) and records every mutating call so tests can assert on
//! side effects, including their absence.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::tracker::{IssueTracker, NewTask, TrackerTask, Transition};
use crate::{Error, Result};

#[derive(Default)]
struct State {
    tasks: HashMap<String, TrackerTask>,
    /// status name -> transitions available from it
    transitions: HashMap<String, Vec<Transition>>,
    applied: Vec<(String, String)>,
    comments: Vec<(String, String)>,
    links: Vec<(String, String)>,
    created: Vec<String>,
    next_key: u32,
}

/// Scriptable in-memory [`IssueTracker`].
#[derive(Default)]
pub struct FakeTracker {
    state: RefCell<State>,
}

impl FakeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a task snapshot.
    pub fn put_task(&self, task: TrackerTask) {
        self.state.borrow_mut().tasks.insert(task.id.clone(), task);
    }

    /// Shorthand: a task with just id, summary, and status.
    pub fn add_task(&self, id: &str, summary: &str, status: &str) {
        self.put_task(TrackerTask {
            id: id.to_string(),
            summary: summary.to_string(),
            description: None,
            status: status.to_string(),
            parent: None,
            assignee: None,
            blocked_by: Vec::new(),
            blocks: Vec::new(),
        });
    }

    /// Declare the transitions available from a status.
    pub fn set_transitions(&self, from_status: &str, targets: &[(&str, &str)]) {
        self.state.borrow_mut().transitions.insert(
            from_status.to_string(),
            targets
                .iter()
                .map(|(name, handle)| Transition {
                    name: name.to_string(),
                    handle: handle.to_string(),
                })
                .collect(),
        );
    }

    /// Transitions applied so far, as `(task_id, handle)` pairs.
    pub fn applied_transitions(&self) -> Vec<(String, String)> {
        self.state.borrow().applied.clone()
    }

    /// Links created so far, as `(blocker, blocked)` pairs.
    pub fn created_links(&self) -> Vec<(String, String)> {
        self.state.borrow().links.clone()
    }

    /// Comments added so far, as `(task_id, body)` pairs.
    pub fn comments(&self) -> Vec<(String, String)> {
        self.state.borrow().comments.clone()
    }

    /// Ids of tasks created through `create_task`, in order.
    pub fn created_tasks(&self) -> Vec<String> {
        self.state.borrow().created.clone()
    }

    /// Current status of a task, panicking if absent (test helper).
    pub fn status_of(&self, id: &str) -> String {
        self.state.borrow().tasks[id].status.clone()
    }
}

impl IssueTracker for FakeTracker {
    fn get_task(&self, id: &str) -> Result<TrackerTask> {
        self.state
            .borrow()
            .tasks
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    fn list_transitions(&self, id: &str) -> Result<Vec<Transition>> {
        let state = self.state.borrow();
        let task = state
            .tasks
            .get(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        Ok(state
            .transitions
            .get(&task.status)
            .cloned()
            .unwrap_or_default())
    }

    fn apply_transition(&self, id: &str, handle: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let target = {
            let task = state
                .tasks
                .get(id)
                .ok_or_else(|| Error::NotFound(id.to_string()))?;
            state
                .transitions
                .get(&task.status)
                .and_then(|ts| ts.iter().find(|t| t.handle == handle))
                .map(|t| t.name.clone())
                .ok_or_else(|| Error::Transport(format!("unknown transition handle {}", handle)))?
        };
        if let Some(task) = state.tasks.get_mut(id) {
            task.status = target;
        }
        state.applied.push((id.to_string(), handle.to_string()));
        Ok(())
    }

    fn add_comment(&self, id: &str, body: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if !state.tasks.contains_key(id) {
            return Err(Error::NotFound(id.to_string()));
        }
        state.comments.push((id.to_string(), body.to_string()));
        Ok(())
    }

    fn create_link(&self, blocker: &str, blocked: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if !state.tasks.contains_key(blocker) {
            return Err(Error::NotFound(blocker.to_string()));
        }
        if !state.tasks.contains_key(blocked) {
            return Err(Error::NotFound(blocked.to_string()));
        }
        state.links.push((blocker.to_string(), blocked.to_string()));
        // Mirror the link into both snapshots, as the tracker would.
        if let Some(task) = state.tasks.get_mut(blocker) {
            task.blocks.push(blocked.to_string());
        }
        if let Some(task) = state.tasks.get_mut(blocked) {
            task.blocked_by.push(blocker.to_string());
        }
        Ok(())
    }

    fn search(&self, filter: &str) -> Result<Vec<TrackerTask>> {
        // Filter support is limited to what the scanner emits: a status list.
        let state = self.state.borrow();
        let mut matches: Vec<TrackerTask> = state
            .tasks
            .values()
            .filter(|t| filter.contains(&format!("\"{}\"", t.status)))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(matches)
    }

    fn create_task(&self, spec: &NewTask) -> Result<String> {
        if spec.summary.contains("[fail-create]") {
            return Err(Error::Transport("create rejected by tracker".to_string()));
        }
        let mut state = self.state.borrow_mut();
        state.next_key += 1;
        let id = format!("WL-{}", 100 + state.next_key);
        state.tasks.insert(
            id.clone(),
            TrackerTask {
                id: id.clone(),
                summary: spec.summary.clone(),
                description: spec.description.clone(),
                status: "To Do".to_string(),
                parent: spec.parent.as_ref().map(|p| crate::tracker::ParentRef {
                    id: p.clone(),
                    summary: String::new(),
                }),
                assignee: None,
                blocked_by: Vec::new(),
                blocks: Vec::new(),
            },
        );
        state.created.push(id.clone());
        Ok(id)
    }
}
