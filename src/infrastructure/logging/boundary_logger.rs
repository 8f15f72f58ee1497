use std::time::Instant;
use tracing::{error, info, warn};

/// BoundaryLogger - logs every crossing of a module boundary
///
/// Format: [trace_id] [caller→callee] operation [STAGE] details
#[derive(Clone)]
pub struct BoundaryLogger;

impl BoundaryLogger {
    pub fn new() -> Self {
        Self
    }

    /// Audit run start
    /// e.g. [CLI→AuditService] run [ENTRY] repos=42 source=github-api
    pub fn run_entry(&self, trace_id: &str, repos: usize, source: &str) {
        info!(
            trace_id = %trace_id,
            flow = "CLI→AuditService",
            stage = "ENTRY",
            repos = repos,
            source = %source,
            "[{}] [CLI→AuditService] run [ENTRY] repos={} source={}",
            trace_id, repos, source
        );
    }

    /// Audit run finished
    /// e.g. [CLI→AuditService] run [←DONE] 81234ms processed=40 skipped=2
    pub fn run_exit(&self, trace_id: &str, duration_ms: f64, processed: usize, skipped: usize) {
        info!(
            trace_id = %trace_id,
            flow = "CLI→AuditService",
            stage = "←DONE",
            duration_ms = %duration_ms,
            processed = processed,
            skipped = skipped,
            "[{}] [CLI→AuditService] run [←DONE] {:.2}ms processed={} skipped={}",
            trace_id, duration_ms, processed, skipped
        );
    }

    /// Repository processing start
    /// e.g. [AuditService→Repo] acme/widgets [ENTRY] 3/42
    pub fn repo_entry(&self, trace_id: &str, repo: &str, index: usize, total: usize) {
        info!(
            trace_id = %trace_id,
            repo = %repo,
            flow = "AuditService→Repo",
            stage = "ENTRY",
            progress = %format!("{}/{}", index, total),
            "[{}] [AuditService→Repo] {} [ENTRY] {}/{}",
            trace_id, repo, index, total
        );
    }

    /// Repository processed
    pub fn repo_done(&self, trace_id: &str, repo: &str, duration_ms: f64) {
        info!(
            trace_id = %trace_id,
            repo = %repo,
            flow = "AuditService→Repo",
            stage = "←DONE",
            duration_ms = %duration_ms,
            "[{}] [AuditService→Repo] {} [←DONE] {:.2}ms",
            trace_id, repo, duration_ms
        );
    }

    /// Repository skipped after a data-source failure
    pub fn repo_skipped<E: std::fmt::Display>(&self, trace_id: &str, repo: &str, error: &E) {
        error!(
            trace_id = %trace_id,
            repo = %repo,
            flow = "AuditService→Repo",
            stage = "←SKIP",
            error = %error,
            "[{}] [AuditService→Repo] Error processing repo {}: {}",
            trace_id, repo, error
        );
    }

    /// External system call start (GitHub, Git)
    /// e.g. [AuditService→github-api] list_workflows [EXT→]
    pub fn external_call(&self, trace_id: &str, from: &str, system: &str, operation: &str) {
        info!(
            trace_id = %trace_id,
            from = %from,
            system = %system,
            operation = %operation,
            flow = format!("{}→{}", from, system),
            stage = "EXT→",
            "[{}] [{}→{}] {} [EXT→]",
            trace_id, from, system, operation
        );
    }

    /// External system call finished
    pub fn external_done(&self, trace_id: &str, from: &str, system: &str, operation: &str, duration_ms: f64) {
        info!(
            trace_id = %trace_id,
            from = %from,
            system = %system,
            operation = %operation,
            flow = format!("{}→{}", from, system),
            stage = "←DONE",
            duration_ms = %duration_ms,
            "[{}] [{}→{}] {} [←DONE] {:.2}ms",
            trace_id, from, system, operation, duration_ms
        );
    }

    /// External system call failed
    pub fn external_error<E: std::fmt::Display>(&self, trace_id: &str, from: &str, system: &str, operation: &str, error: &E) {
        error!(
            trace_id = %trace_id,
            from = %from,
            system = %system,
            operation = %operation,
            flow = format!("{}→{}", from, system),
            stage = "←FAIL",
            error = %error,
            "[{}] [{}→{}] {} [←FAIL] error={}",
            trace_id, from, system, operation, error
        );
    }

    /// Row written to the sheet
    /// e.g. [AuditService→Sheet] acme/widgets [ROW] row=12 appended
    pub fn sheet_row(&self, trace_id: &str, repo: &str, row: u32, appended: bool) {
        info!(
            trace_id = %trace_id,
            repo = %repo,
            flow = "AuditService→Sheet",
            stage = "ROW",
            row = row,
            appended = appended,
            "[{}] [AuditService→Sheet] {} [ROW] row={} {}",
            trace_id, repo, row, if appended { "appended" } else { "updated" }
        );
    }

    /// Workflow document that could not be parsed
    pub fn workflow_invalid<E: std::fmt::Display>(&self, trace_id: &str, repo: &str, path: &str, error: &E) {
        warn!(
            trace_id = %trace_id,
            repo = %repo,
            path = %path,
            flow = "AuditService→WorkflowParser",
            stage = "←FAIL",
            error = %error,
            "[{}] [AuditService→WorkflowParser] {} {} [←FAIL] error={}",
            trace_id, repo, path, error
        );
    }
}

impl Default for BoundaryLogger {
    fn default() -> Self {
        Self::new()
    }
}

/// Wall-clock timer for duration fields
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Elapsed milliseconds
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}
