//! Per-task work log artifacts.
//!
//! One Markdown file per task id, append-only: created when a task enters
//! active development, appended to on every lifecycle transition, never
//! truncated or deleted. Layout:
//!
//! ```text
//! # Task Work Log - WL-123
//!
//! Parent Story: WL-100 - Observability
//!
//! ## Configure logger
//!
//! ### 2026-08-29 14:03
//! #### Work Done
//! -
//! #### Technical Details
//! -
//! ...
//! ```
//!
//! Terminal sections (`Development Completed`, `Review Completed`,
//! `Review Feedback`, `Task Discarded`) are appended with a timestamp and,
//! where applicable, a `Reason:` line.

use chrono::{DateTime, Utc};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Timestamp format used in log entries.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// The H4 subsections scaffolded into every new entry.
pub const ENTRY_SECTIONS: [&str; 5] = [
    "Work Done",
    "Technical Details",
    "Verification Steps",
    "Next Steps",
    "Related Tasks",
];

/// Heading for the development-completed terminal section.
pub const SECTION_DEV_COMPLETED: &str = "Development Completed";
/// Heading for the approved-review terminal section.
pub const SECTION_REVIEW_COMPLETED: &str = "Review Completed";
/// Heading for the returned-to-development terminal section.
pub const SECTION_REVIEW_FEEDBACK: &str = "Review Feedback";
/// Heading for the discarded-task terminal section.
pub const SECTION_DISCARDED: &str = "Task Discarded";

/// One parsed section of a work log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Heading text without the leading hashes
    pub heading: String,
    /// Heading level (1 for H1, 4 for H4)
    pub level: u8,
    /// Body lines between this heading and the next
    pub body: Vec<String>,
}

/// True when a section was scaffolded but never filled in: its body is
/// exactly one empty placeholder bullet. This predicate is the single
/// place the "unfilled" rule lives; staleness detection elsewhere must go
/// through it.
pub fn section_is_unfilled(section: &Section) -> bool {
    let meaningful: Vec<&str> = section
        .body
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();
    meaningful == ["-"]
}

/// Keyed store of work log artifacts under one directory.
#[derive(Debug, Clone)]
pub struct WorkLogStore {
    root: PathBuf,
}

impl WorkLogStore {
    /// Store rooted at `dir/task_work_logs`.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            root: data_dir.join("task_work_logs"),
        }
    }

    /// Path of the log for a task id.
    pub fn path(&self, task_id: &str) -> PathBuf {
        self.root.join(format!("{}_work_log.md", task_id))
    }

    /// Whether a log exists for the task.
    pub fn exists(&self, task_id: &str) -> bool {
        self.path(task_id).exists()
    }

    /// Create a work log with a scaffolded first entry.
    ///
    /// Idempotent: if the log already exists it is returned untouched;
    /// existing logs are never overwritten.
    pub fn create(
        &self,
        task_id: &str,
        summary: &str,
        parent: Option<(&str, &str)>,
    ) -> Result<PathBuf> {
        let path = self.path(task_id);
        if path.exists() {
            return Ok(path);
        }
        std::fs::create_dir_all(&self.root)?;

        let mut contents = format!("# Task Work Log - {}\n\n", task_id);
        if let Some((parent_id, parent_summary)) = parent {
            contents.push_str(&format!("Parent Story: {} - {}\n\n", parent_id, parent_summary));
        }
        contents.push_str(&format!("## {}\n\n", summary));
        contents.push_str(&Self::entry_block(Utc::now()));

        std::fs::write(&path, contents)?;
        Ok(path)
    }

    /// Append a fresh scaffolded entry to an existing log.
    pub fn append_entry(&self, task_id: &str) -> Result<()> {
        self.append_raw(task_id, &Self::entry_block(Utc::now()))
    }

    /// Append a terminal section with a timestamp and optional extra lines
    /// (e.g. `Status:` or `Reason:`).
    ///
    /// Fails with `Error::NotFound` if no log exists: callers must create
    /// before appending.
    pub fn append_section(&self, task_id: &str, heading: &str, lines: &[String]) -> Result<()> {
        let mut block = format!(
            "\n### {}: {}\n",
            heading,
            Utc::now().format(TIMESTAMP_FORMAT)
        );
        for line in lines {
            block.push_str(line);
            block.push('\n');
        }
        self.append_raw(task_id, &block)
    }

    fn append_raw(&self, task_id: &str, block: &str) -> Result<()> {
        let path = self.path(task_id);
        if !path.exists() {
            return Err(Error::NotFound(format!("work log for {}", task_id)));
        }
        let mut file = OpenOptions::new().append(true).open(&path)?;
        file.write_all(block.as_bytes())?;
        Ok(())
    }

    /// Read and parse a log into its ordered section list.
    pub fn read(&self, task_id: &str) -> Result<Vec<Section>> {
        let path = self.path(task_id);
        if !path.exists() {
            return Err(Error::NotFound(format!("work log for {}", task_id)));
        }
        let text = std::fs::read_to_string(&path)?;
        Ok(parse_sections(&text))
    }

    /// Whether the log's most recent required sections (`Work Done`,
    /// `Technical Details`) are still unfilled placeholders.
    pub fn needs_update(&self, task_id: &str) -> Result<bool> {
        let sections = self.read(task_id)?;
        let last_unfilled = |heading: &str| {
            sections
                .iter()
                .rev()
                .find(|s| s.level == 4 && s.heading.eq_ignore_ascii_case(heading))
                .map(section_is_unfilled)
                .unwrap_or(false)
        };
        Ok(last_unfilled("Work Done") || last_unfilled("Technical Details"))
    }

    fn entry_block(now: DateTime<Utc>) -> String {
        let mut block = format!("### {}\n", now.format(TIMESTAMP_FORMAT));
        for heading in ENTRY_SECTIONS {
            block.push_str(&format!("#### {}\n- \n\n", heading));
        }
        block
    }
}

/// Split Markdown text into heading-delimited sections. Text before the
/// first heading is ignored (the artifact always starts with its H1).
fn parse_sections(text: &str) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    for line in text.lines() {
        let hashes = line.chars().take_while(|c| *c == '#').count();
        if (1..=6).contains(&hashes) && line.chars().nth(hashes) == Some(' ') {
            sections.push(Section {
                heading: line[hashes + 1..].trim().to_string(),
                level: hashes as u8,
                body: Vec::new(),
            });
        } else if let Some(current) = sections.last_mut() {
            current.body.push(line.to_string());
        }
    }
    sections
}
