//! Dependency graph between tracker tasks.
//!
//! Directed "blocks" edges: `(blocker, blocked)` means the blocker must
//! reach Done before the blocked task counts as unblocked. Raw tracker link
//! data is not validated at the source, so nothing here assumes acyclicity;
//! readiness queries run a cycle check first.
//!
//! Batch creation may declare edges against tasks that do not exist yet.
//! Those are recorded as pending edges keyed by symbolic placeholders and
//! promoted in a second phase once every placeholder has a real id.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::models::TaskState;
use crate::{Error, Result};

/// An edge endpoint that is either a real tracker id or a symbolic
/// placeholder to be resolved later in the same batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EndpointRef {
    /// A task id known to exist in the tracker
    Id(String),
    /// A symbolic forward reference within a batch
    Placeholder(String),
}

impl EndpointRef {
    fn resolved(&self) -> Option<&str> {
        match self {
            EndpointRef::Id(id) => Some(id),
            EndpointRef::Placeholder(_) => None,
        }
    }
}

/// A declared edge whose endpoints may still be symbolic.
#[derive(Debug, Clone)]
pub struct PendingEdge {
    pub blocker: EndpointRef,
    pub blocked: EndpointRef,
}

/// In-memory directed graph of blocks/blocked-by relations.
///
/// Edges are set-backed, so re-adding an existing edge is a no-op.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// blocked id -> set of blocker ids
    blockers: HashMap<String, BTreeSet<String>>,
    /// blocker id -> set of blocked ids
    dependents: HashMap<String, BTreeSet<String>>,
    /// Declared edges awaiting placeholder resolution
    pending: Vec<PendingEdge>,
}

impl DependencyGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from one task's link data as reported by the tracker.
    pub fn from_links(task_id: &str, blocked_by: &[String], blocks: &[String]) -> Self {
        let mut graph = Self::new();
        for blocker in blocked_by {
            graph.add_edge(blocker, task_id);
        }
        for blocked in blocks {
            graph.add_edge(task_id, blocked);
        }
        graph
    }

    /// Register a directed edge. Idempotent: duplicates are ignored.
    pub fn add_edge(&mut self, blocker: &str, blocked: &str) {
        self.blockers
            .entry(blocked.to_string())
            .or_default()
            .insert(blocker.to_string());
        self.dependents
            .entry(blocker.to_string())
            .or_default()
            .insert(blocked.to_string());
    }

    /// Declare an edge whose endpoints may be symbolic placeholders.
    pub fn add_pending(&mut self, blocker: EndpointRef, blocked: EndpointRef) {
        self.pending.push(PendingEdge { blocker, blocked });
    }

    /// Substitute a placeholder with the real id it resolved to.
    pub fn resolve(&mut self, placeholder: &str, real_id: &str) {
        for edge in &mut self.pending {
            if edge.blocker == EndpointRef::Placeholder(placeholder.to_string()) {
                edge.blocker = EndpointRef::Id(real_id.to_string());
            }
            if edge.blocked == EndpointRef::Placeholder(placeholder.to_string()) {
                edge.blocked = EndpointRef::Id(real_id.to_string());
            }
        }
    }

    /// Promote fully-resolved pending edges into the graph.
    ///
    /// Returns the promoted `(blocker, blocked)` pairs; edges that still
    /// contain an unresolved placeholder are left in the pending list and
    /// reported in the second element so callers can surface per-edge
    /// failures without losing the rest of the batch.
    pub fn commit(&mut self) -> (Vec<(String, String)>, Vec<PendingEdge>) {
        let mut promoted = Vec::new();
        let mut unresolved = Vec::new();

        for edge in self.pending.drain(..) {
            match (edge.blocker.resolved(), edge.blocked.resolved()) {
                (Some(blocker), Some(blocked)) => {
                    promoted.push((blocker.to_string(), blocked.to_string()));
                }
                _ => unresolved.push(edge),
            }
        }

        for (blocker, blocked) in &promoted {
            self.add_edge(blocker, blocked);
        }
        self.pending = unresolved.clone();
        (promoted, unresolved)
    }

    /// Direct predecessors: tasks that block `task_id`.
    pub fn predecessors(&self, task_id: &str) -> Vec<String> {
        self.blockers
            .get(task_id)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Direct successors: tasks blocked by `task_id`.
    pub fn dependents(&self, task_id: &str) -> Vec<String> {
        self.dependents
            .get(task_id)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// True iff every predecessor of `task_id` is Done.
    ///
    /// `statuses` supplies each predecessor's classified state; a
    /// predecessor missing from the map counts as not done. Fails with
    /// [`Error::CycleDetected`] if the predecessor closure contains a
    /// cycle, since "fully unblocked" is meaningless in that case.
    pub fn predecessors_done(
        &self,
        task_id: &str,
        statuses: &HashMap<String, TaskState>,
    ) -> Result<bool> {
        self.check_acyclic_from(task_id)?;

        Ok(self.predecessors(task_id).iter().all(|pred| {
            statuses
                .get(pred)
                .map(|state| *state == TaskState::Done)
                .unwrap_or(false)
        }))
    }

    /// DFS over the blocker relation starting at `task_id`, failing on a
    /// back edge.
    fn check_acyclic_from(&self, task_id: &str) -> Result<()> {
        let mut visiting = HashSet::new();
        let mut visited = HashSet::new();
        self.dfs(task_id, &mut visiting, &mut visited)
    }

    fn dfs(
        &self,
        node: &str,
        visiting: &mut HashSet<String>,
        visited: &mut HashSet<String>,
    ) -> Result<()> {
        if visited.contains(node) {
            return Ok(());
        }
        if !visiting.insert(node.to_string()) {
            return Err(Error::CycleDetected);
        }
        if let Some(preds) = self.blockers.get(node) {
            for pred in preds {
                if visiting.contains(pred) {
                    return Err(Error::CycleDetected);
                }
                self.dfs(pred, visiting, visited)?;
            }
        }
        visiting.remove(node);
        visited.insert(node.to_string());
        Ok(())
    }

    /// Number of pending (unpromoted) edges.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
