//! Attention scanning over the tracked working set.
//!
//! Classifies every task in the working set into "ready to start", "missing
//! work log", "work log needs updating", or "no action needed", based on
//! status and work log content. Read-only and idempotent: scanning twice
//! with no intervening state change yields the same result.

use crate::models::{
    AttentionAction, AttentionItem, STATUS_IN_PROGRESS, STATUS_REVIEW, STATUS_SELECTED,
    STATUS_TESTING,
};
use crate::tracker::{IssueTracker, TrackerTask};
use crate::workflow::BatchFailure;
use crate::worklog::WorkLogStore;
use crate::Result;

/// Which statuses the scanner considers, and in what presentation order.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Project key scoping the search
    pub project_key: String,
    /// Statuses meaning "ready to start development"
    pub ready_statuses: Vec<String>,
    /// Statuses meaning active work, in fixed presentation order
    pub working_statuses: Vec<String>,
}

impl ScanConfig {
    /// Canonical configuration for a project key.
    pub fn for_project(project_key: &str) -> Self {
        Self {
            project_key: project_key.to_string(),
            ready_statuses: vec![STATUS_SELECTED.to_string()],
            working_statuses: vec![
                STATUS_IN_PROGRESS.to_string(),
                STATUS_TESTING.to_string(),
                STATUS_REVIEW.to_string(),
            ],
        }
    }

    /// All statuses in presentation order: ready group first, then each
    /// working status.
    pub fn ordered_statuses(&self) -> Vec<&str> {
        self.ready_statuses
            .iter()
            .chain(self.working_statuses.iter())
            .map(String::as_str)
            .collect()
    }

    fn jql_for(&self, statuses: &[String]) -> String {
        let quoted: Vec<String> = statuses.iter().map(|s| format!("\"{}\"", s)).collect();
        format!(
            "project = \"{}\" AND issuetype = Task AND status in ({}) ORDER BY created DESC",
            self.project_key,
            quoted.join(", ")
        )
    }
}

/// Result of one scan: grouped attention items plus any tasks whose work
/// log could not be classified.
#[derive(Debug)]
pub struct ScanReport {
    pub items: Vec<AttentionItem>,
    pub failures: Vec<BatchFailure>,
}

/// Read-only scanner pairing the tracker with the work log store.
pub struct AttentionScanner<'a> {
    tracker: &'a dyn IssueTracker,
    worklogs: &'a WorkLogStore,
    config: ScanConfig,
}

impl<'a> AttentionScanner<'a> {
    pub fn new(
        tracker: &'a dyn IssueTracker,
        worklogs: &'a WorkLogStore,
        config: ScanConfig,
    ) -> Self {
        Self {
            tracker,
            worklogs,
            config,
        }
    }

    /// Scan the working set and return attention items grouped by status:
    /// ready-to-start tasks first, then each working status in configured
    /// order, tracker-native ordering within a group.
    ///
    /// A classification failure on one task is recorded in the report and
    /// that task is skipped; the scan itself is not aborted.
    pub fn scan(&self) -> Result<ScanReport> {
        let ready_jql = self.config.jql_for(&self.config.ready_statuses);
        let working_jql = self.config.jql_for(&self.config.working_statuses);
        let ready = self.tracker.search(&ready_jql)?;
        let working = self.tracker.search(&working_jql)?;

        let mut items = Vec::new();
        let mut failures = Vec::new();
        for task in &ready {
            items.push(AttentionItem {
                task_id: task.id.clone(),
                summary: task.summary.clone(),
                status: task.status.clone(),
                reason: "Ready to start development".to_string(),
                action: AttentionAction::StartDevelopment,
            });
        }
        for task in &working {
            match self.classify_working(task) {
                Ok(Some(item)) => items.push(item),
                Ok(None) => {}
                Err(e) => failures.push(BatchFailure {
                    item: task.id.clone(),
                    error: e.to_string(),
                }),
            }
        }

        // Group by status in the configured presentation order.
        let order = self.config.ordered_statuses();
        let mut grouped = Vec::with_capacity(items.len());
        for status in order {
            grouped.extend(
                items
                    .iter()
                    .filter(|i| i.status.eq_ignore_ascii_case(status))
                    .cloned(),
            );
        }
        Ok(ScanReport {
            items: grouped,
            failures,
        })
    }

    fn classify_working(&self, task: &TrackerTask) -> Result<Option<AttentionItem>> {
        if !self.worklogs.exists(&task.id) {
            return Ok(Some(AttentionItem {
                task_id: task.id.clone(),
                summary: task.summary.clone(),
                status: task.status.clone(),
                reason: format!("Missing work log for {} task", task.status.to_lowercase()),
                action: AttentionAction::CreateWorkLog,
            }));
        }
        if self.worklogs.needs_update(&task.id)? {
            Ok(Some(AttentionItem {
                task_id: task.id.clone(),
                summary: task.summary.clone(),
                status: task.status.clone(),
                reason: format!(
                    "Work log needs updating for {} task",
                    task.status.to_lowercase()
                ),
                action: AttentionAction::UpdateWorkLog,
            }))
        } else {
            // Filled log, nothing to flag.
            Ok(None)
        }
    }
}
