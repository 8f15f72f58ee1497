pub mod dependency_automation;
pub mod package_manager;
pub mod semantic_release;
pub mod workflow_activity;

use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::application::ports::RepoId;

pub use dependency_automation::check_dependency_automation;
pub use package_manager::check_package_manager;
pub use semantic_release::check_semantic_release;
pub use workflow_activity::check_workflow_activity;

/// A categorical check result rendered into one sheet cell
pub trait SignalLabel: Copy + fmt::Debug {
    /// Label written to the sheet
    fn label(&self) -> &'static str;

    /// Label used when the check could not run
    fn absent() -> Self;
}

/// Result of one check.
///
/// `Degraded` carries the check's "no" label plus the reason the check could
/// not run. Both variants write the same cell text; only logs tell them apart.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome<L> {
    Confirmed(L),
    Degraded { label: L, reason: String },
}

impl<L: SignalLabel> CheckOutcome<L> {
    pub fn degraded(check: &str, repo: &RepoId, reason: impl fmt::Display) -> Self {
        let reason = reason.to_string();
        warn!(repo = %repo, check = %check, reason = %reason, "Check degraded to '{}'", L::absent().label());
        Self::Degraded {
            label: L::absent(),
            reason,
        }
    }

    pub fn value(&self) -> L {
        match self {
            Self::Confirmed(label) => *label,
            Self::Degraded { label, .. } => *label,
        }
    }

    pub fn label(&self) -> &'static str {
        self.value().label()
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

/// Selectable checks (per-check runs only write their own columns)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CheckKind {
    PackageManager,
    DependencyAutomation,
    SemanticRelease,
    WorkflowActivity,
    WorkflowMetadata,
}

impl CheckKind {
    pub const ALL: [CheckKind; 5] = [
        CheckKind::PackageManager,
        CheckKind::DependencyAutomation,
        CheckKind::SemanticRelease,
        CheckKind::WorkflowActivity,
        CheckKind::WorkflowMetadata,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::PackageManager => "package-manager",
            CheckKind::DependencyAutomation => "dependency-automation",
            CheckKind::SemanticRelease => "semantic-release",
            CheckKind::WorkflowActivity => "workflow-activity",
            CheckKind::WorkflowMetadata => "workflow-metadata",
        }
    }

    /// Checks that need the workflow listing
    pub fn needs_workflows(&self) -> bool {
        matches!(self, CheckKind::WorkflowActivity | CheckKind::WorkflowMetadata)
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CheckKind::ALL
            .iter()
            .find(|kind| kind.as_str() == s)
            .copied()
            .ok_or_else(|| {
                let names: Vec<&str> = CheckKind::ALL.iter().map(|k| k.as_str()).collect();
                format!("Unknown check '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::semantic_release::SemanticRelease;
    use super::*;

    #[test]
    fn test_check_kind_round_trips_through_str() {
        for kind in CheckKind::ALL {
            assert_eq!(kind.as_str().parse::<CheckKind>().unwrap(), kind);
        }
        assert!("lint".parse::<CheckKind>().is_err());
    }

    #[test]
    fn test_degraded_outcome_uses_absent_label() {
        let repo = RepoId::new("acme", "widgets");
        let outcome: CheckOutcome<SemanticRelease> =
            CheckOutcome::degraded("semantic-release", &repo, "boom");

        assert!(outcome.is_degraded());
        assert_eq!(outcome.value(), SemanticRelease::No);
        assert_eq!(outcome.label(), "No");
    }
}
