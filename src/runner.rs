use std::collections::BTreeSet;
use std::env;
use std::io;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use tracing::{info, warn};

use crate::application::ports::{RepoId, RepositoryDataSource};
use crate::application::services::{AuditReport, AuditService};
use crate::checks::CheckKind;
use crate::cli::{self, AuditArgs, Cli, CloneArgs, Command, MenuChoice, TargetArgs};
use crate::config::{AuditConfig, WorkflowMerge};
use crate::github::{list_repositories, GitHubApiSource, GitHubClient, GitHubError};
use crate::infrastructure::logging::TraceContext;
use crate::infrastructure::spreadsheet::XlsxSheetStore;
use crate::local::{CloneStatus, LocalCloneSource, LocalDirSource, TeamCloner};

/// Which repositories one run covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoSelection {
    Explicit(Vec<RepoId>),
    /// Every immediate subdirectory of a directory of clones
    LocalDir { root: PathBuf, owner: String },
    Organization(String),
    Team { org: String, team: String },
}

impl RepoSelection {
    /// Explicit repositories win, then a local directory, then a team, then the organization
    pub fn from_target(target: &TargetArgs, org: &str) -> Result<Self> {
        if !target.repos.is_empty() {
            let repos = target
                .repos
                .iter()
                .map(|value| RepoId::parse_qualified(value, org).map_err(|e| anyhow!(e)))
                .collect::<Result<Vec<_>>>()?;
            return Ok(RepoSelection::Explicit(repos));
        }

        if let Some(root) = &target.local_dir {
            return Ok(RepoSelection::LocalDir {
                root: root.clone(),
                owner: org.to_string(),
            });
        }

        Ok(match &target.team {
            Some(team) => RepoSelection::Team {
                org: org.to_string(),
                team: team.clone(),
            },
            None => RepoSelection::Organization(org.to_string()),
        })
    }

    pub fn needs_api(&self) -> bool {
        matches!(self, RepoSelection::Organization(_) | RepoSelection::Team { .. })
    }

    pub fn resolve(&self, client: Option<&GitHubClient>) -> Result<Vec<RepoId>> {
        let require_client = || client.ok_or_else(|| anyhow!("A GitHub token is required to list repositories"));

        let repos = match self {
            RepoSelection::Explicit(repos) => repos.clone(),
            RepoSelection::LocalDir { root, owner } => LocalDirSource::new(root.clone())
                .enumerate(owner)
                .with_context(|| format!("Failed to list repositories in {}", root.display()))?,
            RepoSelection::Organization(org) => list_repositories(require_client()?, org, None)
                .with_context(|| format!("Failed to list repositories of '{}'", org))?,
            RepoSelection::Team { org, team } => list_repositories(require_client()?, org, Some(team))
                .with_context(|| format!("Failed to list repositories of team '{}'", team))?,
        };

        info!(count = repos.len(), "Resolved repositories");
        Ok(repos)
    }
}

/// Entry point after argument parsing
pub fn run(cli: Cli) -> Result<()> {
    let mut config = AuditConfig::from_env().map_err(|e| anyhow!(e))?;
    config.workbook = cli.workbook.clone();
    config.activity_window_days = cli.activity_days;

    match &cli.command {
        Command::Audit(args) => run_audit(&cli, &config, args),
        Command::Menu(target) => run_menu(&cli, &config, target),
        Command::Clone(args) => run_clone(&cli, args),
    }
}

fn run_audit(cli: &Cli, config: &AuditConfig, args: &AuditArgs) -> Result<()> {
    let prepared = prepare(cli, config, &args.target)?;
    let checks = cli::check_selection(&args.only);
    audit_once(&prepared, checks)?;
    Ok(())
}

fn run_menu(cli: &Cli, config: &AuditConfig, target: &TargetArgs) -> Result<()> {
    let prepared = prepare(cli, config, target)?;
    let stdin = io::stdin();
    let stdout = io::stdout();

    loop {
        let choice = cli::read_menu_choice(&mut stdin.lock(), &mut stdout.lock())?;
        match choice {
            MenuChoice::Run(checks) => {
                // A failed run (e.g. the workbook is open elsewhere) returns to the menu
                if let Err(e) = audit_once(&prepared, checks) {
                    warn!(error = %format!("{:#}", e), "Audit run failed");
                    println!("Run failed: {:#}", e);
                }
            }
            MenuChoice::Quit => return Ok(()),
        }
    }
}

fn run_clone(cli: &Cli, args: &CloneArgs) -> Result<()> {
    let client = authenticate(cli)?;
    let repos = RepoSelection::Team {
        org: args.org.clone(),
        team: args.team.clone(),
    }
    .resolve(Some(&client))?;

    let cloner = TeamCloner::new(
        cli.clone_base.clone(),
        Some(client.token().to_string()),
        args.dest.clone(),
    );
    let results = cloner.clone_all(&repos).context("Failed to clone team repositories")?;

    let failed = results.iter().filter(|r| r.status == CloneStatus::Failed).count();
    for result in &results {
        println!("{:<40} {}", result.repo.name, result.status.as_str());
    }
    println!(
        "Cloned {} of {} repositories into {}",
        results.len() - failed,
        results.len(),
        cloner.dest().display()
    );
    println!("Clone status written to {}", cloner.status_path().display());
    Ok(())
}

/// Everything a run needs, resolved once
struct Prepared {
    config: AuditConfig,
    source: Box<dyn RepositoryDataSource>,
    repos: Vec<RepoId>,
}

fn prepare(cli: &Cli, config: &AuditConfig, target: &TargetArgs) -> Result<Prepared> {
    let org = match &target.org {
        Some(org) => org.clone(),
        None => cli::prompt("Organization").context("Failed to read the organization")?,
    };
    if org.is_empty() {
        bail!("An organization is required");
    }

    let selection = RepoSelection::from_target(target, &org)?;
    let client = if target.local_dir.is_none() || selection.needs_api() {
        Some(authenticate(cli)?)
    } else {
        None
    };
    let repos = selection.resolve(client.as_ref())?;

    let source: Box<dyn RepositoryDataSource> = match (&target.local_dir, client) {
        (Some(root), _) => Box::new(LocalDirSource::new(root.clone())),
        (None, Some(client)) if target.clone => Box::new(LocalCloneSource::new(
            cli.clone_base.clone(),
            Some(client.token().to_string()),
        )),
        (None, Some(client)) => Box::new(GitHubApiSource::new(client)),
        (None, None) => bail!("A GitHub token is required"),
    };

    let mut config = config.clone();
    if target.aggregate_workflows {
        config.workflow_merge = WorkflowMerge::Aggregate;
    }

    Ok(Prepared { config, source, repos })
}

fn audit_once(prepared: &Prepared, checks: BTreeSet<CheckKind>) -> Result<AuditReport> {
    let config = &prepared.config;
    let mut sheet = XlsxSheetStore::open_or_create(&config.workbook, &config.columns)?;

    let trace_id = TraceContext::new_trace_id();
    let service = AuditService::new(prepared.source.as_ref(), config, checks, trace_id.clone());
    let report = service.run(&mut sheet, &prepared.repos)?;

    print_report(&report, TraceContext::short(&trace_id), &sheet);
    Ok(report)
}

fn print_report(report: &AuditReport, trace: &str, sheet: &XlsxSheetStore) {
    println!();
    println!("Run {} saved to {}", trace, sheet.path().display());
    println!(
        "  processed: {}  appended: {}  updated: {}  skipped: {}",
        report.processed,
        report.rows_appended,
        report.rows_updated,
        report.skipped.len()
    );
    if report.degraded_checks > 0 || report.invalid_workflows > 0 {
        println!(
            "  degraded checks: {}  unreadable workflows: {}",
            report.degraded_checks, report.invalid_workflows
        );
    }
    for (repo, column) in &report.missing_columns {
        println!("  Failed to update '{}' for {}", column, repo);
    }
    for (repo, reason) in &report.skipped {
        println!("  Error processing repo {}: {}", repo, reason);
    }
}

/// Token from the command line, `GITHUB_TOKEN` or a prompt, checked against `GET /user`
fn authenticate(cli: &Cli) -> Result<GitHubClient> {
    let token = match cli.token.clone().or_else(|| env::var("GITHUB_TOKEN").ok()) {
        Some(token) => token,
        None => cli::prompt("GitHub access token").context("Failed to read the access token")?,
    };
    if token.trim().is_empty() {
        bail!("A GitHub access token is required");
    }

    let client = GitHubClient::with_base_url(token.trim().to_string(), cli.api_url.clone());
    match client.get_user() {
        Ok(user) => {
            info!(login = %user.login, "Authenticated with GitHub");
            Ok(client)
        }
        Err(GitHubError::Unauthorized) => bail!("GitHub rejected the access token"),
        Err(e) => Err(e).context("Failed to validate the access token"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> TargetArgs {
        TargetArgs {
            org: Some("acme".to_string()),
            team: None,
            repos: Vec::new(),
            local_dir: None,
            clone: false,
            aggregate_workflows: false,
        }
    }

    #[test]
    fn test_explicit_repositories_take_precedence() {
        let target = TargetArgs {
            repos: vec!["widgets".to_string(), "other/gadgets".to_string()],
            team: Some("platform".to_string()),
            ..target()
        };

        let selection = RepoSelection::from_target(&target, "acme").unwrap();

        assert_eq!(
            selection,
            RepoSelection::Explicit(vec![
                RepoId::new("acme", "widgets"),
                RepoId::new("other", "gadgets"),
            ])
        );
        assert!(!selection.needs_api());
    }

    #[test]
    fn test_invalid_explicit_repository_is_rejected() {
        let target = TargetArgs {
            repos: vec!["a/b/c".to_string()],
            ..target()
        };
        assert!(RepoSelection::from_target(&target, "acme").is_err());
    }

    #[test]
    fn test_team_and_organization_selection() {
        let team = TargetArgs {
            team: Some("platform".to_string()),
            ..target()
        };
        assert_eq!(
            RepoSelection::from_target(&team, "acme").unwrap(),
            RepoSelection::Team {
                org: "acme".to_string(),
                team: "platform".to_string()
            }
        );
        assert_eq!(
            RepoSelection::from_target(&target(), "acme").unwrap(),
            RepoSelection::Organization("acme".to_string())
        );
    }

    #[test]
    fn test_local_dir_selection_enumerates_subdirectories() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join("widgets")).unwrap();
        std::fs::create_dir(tmp.path().join("gadgets")).unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "x").unwrap();

        let target = TargetArgs {
            local_dir: Some(tmp.path().to_path_buf()),
            ..target()
        };
        let selection = RepoSelection::from_target(&target, "acme").unwrap();
        assert!(!selection.needs_api());

        let repos = selection.resolve(None).unwrap();
        assert_eq!(
            repos,
            vec![RepoId::new("acme", "gadgets"), RepoId::new("acme", "widgets")]
        );
    }

    #[test]
    fn test_organization_selection_requires_client() {
        let selection = RepoSelection::Organization("acme".to_string());
        assert!(selection.resolve(None).is_err());
    }
}
