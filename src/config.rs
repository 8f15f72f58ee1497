use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::checks::workflow_activity::DEFAULT_ACTIVITY_WINDOW_DAYS;
use crate::github::workflow_parser::DEFAULT_MEND_STEP;

pub const DEFAULT_WORKBOOK: &str = "LP_GitHub_Repos.xlsx";

// =============================================================================
// Sheet columns
// =============================================================================

/// Columns this tool owns (besides the identity column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SheetColumn {
    PackageManager,
    DependencyManagement,
    SemanticRelease,
    GitHubActions,
    IntegrationSuite,
    ConcurrencyRule,
    Mend,
}

impl SheetColumn {
    pub fn header(&self) -> &'static str {
        match self {
            SheetColumn::PackageManager => "Package Manager",
            SheetColumn::DependencyManagement => "Dependency Management",
            SheetColumn::SemanticRelease => "Semantic Release",
            SheetColumn::GitHubActions => "GitHub Actions",
            SheetColumn::IntegrationSuite => "Integration Suite",
            SheetColumn::ConcurrencyRule => "Concurrency Rule",
            SheetColumn::Mend => "Mend",
        }
    }
}

impl fmt::Display for SheetColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

pub const IDENTITY_HEADER: &str = "Repository";

/// Fixed 1-based column positions of the inventory sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    pub header_row: u32,
    pub identity: u32,
    pub package_manager: u32,
    pub dependency_management: u32,
    pub semantic_release: u32,
    pub github_actions: u32,
    pub integration_suite: u32,
    pub concurrency_rule: u32,
    pub mend: u32,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            header_row: 1,
            identity: 1,
            package_manager: 2,
            dependency_management: 3,
            semantic_release: 4,
            github_actions: 5,
            integration_suite: 6,
            concurrency_rule: 7,
            mend: 8,
        }
    }
}

impl ColumnLayout {
    pub fn column(&self, column: SheetColumn) -> u32 {
        match column {
            SheetColumn::PackageManager => self.package_manager,
            SheetColumn::DependencyManagement => self.dependency_management,
            SheetColumn::SemanticRelease => self.semantic_release,
            SheetColumn::GitHubActions => self.github_actions,
            SheetColumn::IntegrationSuite => self.integration_suite,
            SheetColumn::ConcurrencyRule => self.concurrency_rule,
            SheetColumn::Mend => self.mend,
        }
    }

    pub fn first_data_row(&self) -> u32 {
        self.header_row + 1
    }

    /// Header cells for a freshly created sheet, as (column, text)
    pub fn headers(&self) -> Vec<(u32, &'static str)> {
        let owned = [
            SheetColumn::PackageManager,
            SheetColumn::DependencyManagement,
            SheetColumn::SemanticRelease,
            SheetColumn::GitHubActions,
            SheetColumn::IntegrationSuite,
            SheetColumn::ConcurrencyRule,
            SheetColumn::Mend,
        ];

        let mut headers = vec![(self.identity, IDENTITY_HEADER)];
        headers.extend(owned.iter().map(|c| (self.column(*c), c.header())));
        headers
    }

    /// Parse eight comma-separated 1-based indices:
    /// identity, package manager, dependency management, semantic release,
    /// GitHub Actions, integration suite, concurrency rule, mend
    pub fn parse(value: &str) -> Result<Self, String> {
        let indices = value
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<u32>()
                    .map_err(|_| format!("Invalid column index '{}'", part.trim()))
            })
            .collect::<Result<Vec<u32>, String>>()?;

        if indices.len() != 8 {
            return Err(format!("Expected 8 column indices, got {}", indices.len()));
        }
        if indices.contains(&0) {
            return Err("Column indices are 1-based".to_string());
        }

        let mut sorted = indices.clone();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.len() != indices.len() {
            return Err("Column indices must be distinct".to_string());
        }

        Ok(Self {
            header_row: 1,
            identity: indices[0],
            package_manager: indices[1],
            dependency_management: indices[2],
            semantic_release: indices[3],
            github_actions: indices[4],
            integration_suite: indices[5],
            concurrency_rule: indices[6],
            mend: indices[7],
        })
    }
}

// =============================================================================
// Run configuration
// =============================================================================

/// How several workflows of one repository map onto the workflow columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowMerge {
    /// One reconcile per workflow; the last workflow's values stay
    LastWins,
    /// One reconcile with `name: value` lists across all workflows
    Aggregate,
}

#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub workbook: PathBuf,
    pub columns: ColumnLayout,
    pub activity_window_days: i64,
    pub mend_step: String,
    pub workflow_merge: WorkflowMerge,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            workbook: PathBuf::from(DEFAULT_WORKBOOK),
            columns: ColumnLayout::default(),
            activity_window_days: DEFAULT_ACTIVITY_WINDOW_DAYS,
            mend_step: DEFAULT_MEND_STEP.to_string(),
            workflow_merge: WorkflowMerge::LastWins,
        }
    }
}

impl AuditConfig {
    /// Defaults overridden by `AUDIT_COLUMNS` and `AUDIT_MEND_STEP`
    pub fn from_env() -> Result<Self, String> {
        let mut config = Self::default();

        if let Ok(columns) = env::var("AUDIT_COLUMNS") {
            config.columns = ColumnLayout::parse(&columns).map_err(|e| format!("AUDIT_COLUMNS: {}", e))?;
        }
        if let Ok(step) = env::var("AUDIT_MEND_STEP") {
            if !step.trim().is_empty() {
                config.mend_step = step;
            }
        }

        Ok(config)
    }
}
