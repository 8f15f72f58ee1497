use chrono::{DateTime, Duration, Utc};

use super::{CheckOutcome, SignalLabel};
use crate::application::ports::{RepoId, WorkflowFile};

pub const DEFAULT_ACTIVITY_WINDOW_DAYS: i64 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowActivity {
    Yes,
    No,
}

impl SignalLabel for WorkflowActivity {
    fn label(&self) -> &'static str {
        match self {
            WorkflowActivity::Yes => "Yes",
            WorkflowActivity::No => "No",
        }
    }

    fn absent() -> Self {
        WorkflowActivity::No
    }
}

/// Parse an RFC 2822 timestamp such as `Wed, 21 Oct 2015 07:28:00 GMT`
pub fn parse_last_modified(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc2822(value.trim()).map(|dt| dt.with_timezone(&Utc))
}

/// `Yes` when any workflow changed within `window_days` of `now`.
///
/// Every timestamp is parsed before deciding: one unparseable value degrades
/// the whole check.
pub fn check_workflow_activity(
    repo: &RepoId,
    workflows: &[WorkflowFile],
    now: DateTime<Utc>,
    window_days: i64,
) -> CheckOutcome<WorkflowActivity> {
    let cutoff = match Duration::try_days(window_days).and_then(|window| now.checked_sub_signed(window)) {
        Some(cutoff) => cutoff,
        None => {
            return CheckOutcome::degraded(
                "workflow-activity",
                repo,
                format!("Activity window of {} days is out of range", window_days),
            )
        }
    };

    let mut active = false;
    for workflow in workflows {
        match parse_last_modified(&workflow.last_modified) {
            Ok(modified) => active |= modified >= cutoff,
            Err(e) => {
                return CheckOutcome::degraded(
                    "workflow-activity",
                    repo,
                    format!("Unparseable timestamp '{}' on {}: {}", workflow.last_modified, workflow.path, e),
                )
            }
        }
    }

    CheckOutcome::Confirmed(if active {
        WorkflowActivity::Yes
    } else {
        WorkflowActivity::No
    })
}
