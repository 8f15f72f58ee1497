use std::collections::BTreeSet;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use super::reconciler::{FieldValue, ReconcileOutcome, RowReconciler};
use crate::application::ports::{RepoHandle, RepoId, RepositoryDataSource, SheetStore, SourceError, WorkflowFile};
use crate::checks::{
    check_dependency_automation, check_package_manager, check_semantic_release,
    check_workflow_activity, CheckKind, CheckOutcome, SignalLabel,
};
use crate::config::{AuditConfig, SheetColumn, WorkflowMerge};
use crate::github::{WorkflowMetadata, WorkflowParser};
use crate::infrastructure::logging::{BoundaryLogger, Timer};

/// Summary of one audit run
#[derive(Debug, Default, Clone)]
pub struct AuditReport {
    pub processed: usize,
    pub skipped: Vec<(RepoId, String)>,
    pub rows_appended: usize,
    pub rows_updated: usize,
    /// Per-column failures reported while appending rows
    pub missing_columns: Vec<(RepoId, SheetColumn)>,
    /// Checks that fell back to their "no" label because they could not run
    pub degraded_checks: usize,
    pub invalid_workflows: usize,
}

/// AuditService - drives one audit run
///
/// Responsibilities:
/// - run the selected checks per repository, strictly one repository at a time
/// - parse workflow metadata
/// - hand results to the row reconciler
/// - skip repositories whose data cannot be acquired
/// - save the sheet once at the end
pub struct AuditService<'a> {
    source: &'a dyn RepositoryDataSource,
    config: &'a AuditConfig,
    checks: BTreeSet<CheckKind>,
    logger: BoundaryLogger,
    trace_id: String,
    now: DateTime<Utc>,
}

impl<'a> AuditService<'a> {
    pub fn new(
        source: &'a dyn RepositoryDataSource,
        config: &'a AuditConfig,
        checks: BTreeSet<CheckKind>,
        trace_id: String,
    ) -> Self {
        Self {
            source,
            config,
            checks,
            logger: BoundaryLogger::new(),
            trace_id,
            now: Utc::now(),
        }
    }

    /// Fix the instant the activity window is measured from
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn run(&self, sheet: &mut dyn SheetStore, repos: &[RepoId]) -> Result<AuditReport> {
        let timer = Timer::start();
        self.logger.run_entry(&self.trace_id, repos.len(), self.source.kind());

        let reconciler = RowReconciler::new(&self.config.columns);
        let mut report = AuditReport::default();

        for (i, repo) in repos.iter().enumerate() {
            let repo_timer = Timer::start();
            self.logger.repo_entry(&self.trace_id, &repo.full_name(), i + 1, repos.len());

            match self.process_repo(sheet, &reconciler, repo, &mut report) {
                Ok(outcomes) => {
                    report.processed += 1;
                    for outcome in outcomes {
                        self.record_outcome(&mut report, repo, &outcome);
                    }
                    self.logger.repo_done(&self.trace_id, &repo.full_name(), repo_timer.elapsed_ms());
                }
                Err(e) => {
                    self.logger.repo_skipped(&self.trace_id, &repo.full_name(), &e);
                    report.skipped.push((repo.clone(), e.to_string()));
                }
            }
        }

        sheet.save().context("Failed to save the inventory sheet")?;

        self.logger.run_exit(&self.trace_id, timer.elapsed_ms(), report.processed, report.skipped.len());
        Ok(report)
    }

    /// Run the checks for one repository and write its row(s).
    ///
    /// Nothing is written when workflow acquisition fails.
    fn process_repo(
        &self,
        sheet: &mut dyn SheetStore,
        reconciler: &RowReconciler<'_>,
        repo: &RepoId,
        report: &mut AuditReport,
    ) -> Result<Vec<ReconcileOutcome>, SourceError> {
        let handle = RepoHandle::new(self.source, repo);
        let mut signals: Vec<FieldValue> = Vec::new();

        if self.selected(CheckKind::PackageManager) {
            let outcome = check_package_manager(handle);
            signals.push(self.signal_field(SheetColumn::PackageManager, &outcome, report));
        }
        if self.selected(CheckKind::DependencyAutomation) {
            let outcome = check_dependency_automation(handle);
            signals.push(self.signal_field(SheetColumn::DependencyManagement, &outcome, report));
        }
        if self.selected(CheckKind::SemanticRelease) {
            let outcome = check_semantic_release(handle);
            signals.push(self.signal_field(SheetColumn::SemanticRelease, &outcome, report));
        }

        if !self.checks.iter().any(CheckKind::needs_workflows) {
            return Ok(vec![reconciler.reconcile(sheet, &repo.full_name(), &signals)]);
        }

        let timer = Timer::start();
        self.logger.external_call(&self.trace_id, "AuditService", self.source.kind(), "list_workflows");
        let workflows = handle.list_workflows().map_err(|e| {
            self.logger.external_error(&self.trace_id, "AuditService", self.source.kind(), "list_workflows", &e);
            e
        })?;
        self.logger.external_done(&self.trace_id, "AuditService", self.source.kind(), "list_workflows", timer.elapsed_ms());

        if self.selected(CheckKind::WorkflowActivity) {
            let outcome = check_workflow_activity(repo, &workflows, self.now, self.config.activity_window_days);
            signals.push(self.signal_field(SheetColumn::GitHubActions, &outcome, report));
        }

        if !self.selected(CheckKind::WorkflowMetadata) {
            return Ok(vec![reconciler.reconcile(sheet, &repo.full_name(), &signals)]);
        }

        let records = self.parse_workflows(repo, &workflows, report);
        if records.is_empty() {
            return Ok(vec![reconciler.reconcile(sheet, &repo.full_name(), &signals)]);
        }

        let mut outcomes = Vec::new();
        match self.config.workflow_merge {
            // One reconcile per workflow: the last workflow's values stay
            WorkflowMerge::LastWins => {
                for (_, metadata) in &records {
                    let mut fields = signals.clone();
                    fields.extend(workflow_fields(metadata));
                    outcomes.push(reconciler.reconcile(sheet, &repo.full_name(), &fields));
                }
            }
            WorkflowMerge::Aggregate => {
                let mut fields = signals;
                fields.extend(aggregate_workflow_fields(&records));
                outcomes.push(reconciler.reconcile(sheet, &repo.full_name(), &fields));
            }
        }

        Ok(outcomes)
    }

    fn parse_workflows(
        &self,
        repo: &RepoId,
        workflows: &[WorkflowFile],
        report: &mut AuditReport,
    ) -> Vec<(String, WorkflowMetadata)> {
        workflows
            .iter()
            .filter_map(|workflow| match WorkflowParser::parse_bytes(&workflow.content, &self.config.mend_step) {
                Ok(metadata) => Some((workflow.name.clone(), metadata)),
                Err(e) => {
                    self.logger.workflow_invalid(&self.trace_id, &repo.full_name(), &workflow.path, &e);
                    report.invalid_workflows += 1;
                    None
                }
            })
            .collect()
    }

    fn signal_field<L: SignalLabel>(
        &self,
        column: SheetColumn,
        outcome: &CheckOutcome<L>,
        report: &mut AuditReport,
    ) -> FieldValue {
        if outcome.is_degraded() {
            report.degraded_checks += 1;
        }
        (column, Some(outcome.label().to_string()))
    }

    fn selected(&self, kind: CheckKind) -> bool {
        self.checks.contains(&kind)
    }

    fn record_outcome(&self, report: &mut AuditReport, repo: &RepoId, outcome: &ReconcileOutcome) {
        let appended = matches!(outcome, ReconcileOutcome::Appended { .. });
        if appended {
            report.rows_appended += 1;
        } else {
            report.rows_updated += 1;
        }

        self.logger.sheet_row(&self.trace_id, &repo.full_name(), outcome.row(), appended);
        report
            .missing_columns
            .extend(outcome.missing().iter().map(|column| (repo.clone(), *column)));
    }
}

fn workflow_fields(metadata: &WorkflowMetadata) -> [FieldValue; 3] {
    [
        (SheetColumn::IntegrationSuite, metadata.integration_suite.clone()),
        (SheetColumn::ConcurrencyRule, metadata.concurrency_rule.clone()),
        (SheetColumn::Mend, metadata.mend.clone()),
    ]
}

fn aggregate_workflow_fields(records: &[(String, WorkflowMetadata)]) -> [FieldValue; 3] {
    [
        (SheetColumn::IntegrationSuite, join_field(records, |m| m.integration_suite.as_ref())),
        (SheetColumn::ConcurrencyRule, join_field(records, |m| m.concurrency_rule.as_ref())),
        (SheetColumn::Mend, join_field(records, |m| m.mend.as_ref())),
    ]
}

/// `name: value; name: value` over the workflows that have a value
fn join_field<F>(records: &[(String, WorkflowMetadata)], pick: F) -> Option<String>
where
    F: Fn(&WorkflowMetadata) -> Option<&String>,
{
    let parts: Vec<String> = records
        .iter()
        .filter_map(|(name, metadata)| pick(metadata).map(|value| format!("{}: {}", name, value)))
        .collect();

    (!parts.is_empty()).then(|| parts.join("; "))
}
