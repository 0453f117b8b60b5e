//! Result formatting
//!
//! Renders backend records into the text the agent reads. Output is
//! deterministic so reports can be compared and diffed.

use crate::domain::{ErrorKind, IssueRecord, PageAction, PageRecord, SubtaskEntry};
use std::fmt::Write;

/// Render an issue and its children as the canonical plain-text report.
pub fn format_issue(issue: &IssueRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Jira Ticket: {}", issue.key);
    let _ = writeln!(out, "Summary: {}", issue.summary);
    let _ = writeln!(out, "Status: {}", issue.status);
    let _ = writeln!(out, "Reporter: {}", issue.reporter);
    let _ = writeln!(out, "Description: {}", issue.description);
    out.push('\n');

    if issue.subtasks.is_empty() {
        out.push_str("No child stories or subtasks found.\n");
        return out;
    }

    out.push_str("Child Stories/Subtasks:\n");
    for entry in &issue.subtasks {
        write_subtask_line(&mut out, entry, 1);
    }
    out
}

fn write_subtask_line(out: &mut String, entry: &SubtaskEntry, depth: usize) {
    let indent = "  ".repeat(depth);
    match entry {
        SubtaskEntry::Resolved(child) => {
            let _ = writeln!(
                out,
                "{indent}- {}: {} | Status: {} | Reporter: {} | Description: {}",
                child.key, child.summary, child.status, child.reporter, child.description
            );
            for nested in &child.subtasks {
                write_subtask_line(out, nested, depth + 1);
            }
        }
        SubtaskEntry::Unresolved { key, reason } => {
            let _ = writeln!(out, "{indent}- {key}: {reason}");
        }
    }
}

/// Confirmation string returned after a successful page write.
pub fn format_success(page: &PageRecord, action: PageAction) -> String {
    format!("Page {} successfully: {}", action.as_str(), page.url)
}

/// Diagnostic string returned for a failed invocation.
pub fn format_error(kind: ErrorKind, detail: &str) -> String {
    let detail = detail.trim();
    if detail.is_empty() {
        format!("Error ({}): {}", kind.as_str(), kind.label())
    } else {
        format!("Error ({}): {detail}", kind.as_str())
    }
}
