use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::checks::workflow_activity::DEFAULT_ACTIVITY_WINDOW_DAYS;
use crate::checks::CheckKind;
use crate::config::DEFAULT_WORKBOOK;
use crate::github::client::DEFAULT_API_URL;
use crate::local::DEFAULT_CLONE_BASE;

/// Upper bound for `--activity-days` (about a century)
pub const MAX_ACTIVITY_WINDOW_DAYS: i64 = 36_500;

/// Audit GitHub repositories for engineering-hygiene signals and record
/// them in a spreadsheet inventory
#[derive(Debug, Parser)]
#[command(name = "repo-audit", version)]
pub struct Cli {
    /// Inventory workbook (.xlsx); created when missing
    #[arg(long, global = true, default_value = DEFAULT_WORKBOOK)]
    pub workbook: PathBuf,

    /// GitHub access token (falls back to GITHUB_TOKEN, then a prompt)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Workflows changed within this many days count as active
    #[arg(
        long,
        global = true,
        default_value_t = DEFAULT_ACTIVITY_WINDOW_DAYS,
        value_parser = clap::value_parser!(i64).range(0..=MAX_ACTIVITY_WINDOW_DAYS)
    )]
    pub activity_days: i64,

    /// GitHub API root
    #[arg(long, global = true, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Base URL used for cloning
    #[arg(long, global = true, default_value = DEFAULT_CLONE_BASE)]
    pub clone_base: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run checks and update the inventory
    Audit(AuditArgs),
    /// Interactive menu offering single checks or a full update
    Menu(TargetArgs),
    /// Clone every repository of a team into a directory
    Clone(CloneArgs),
}

/// Which repositories to audit and where their data comes from
#[derive(Debug, Clone, Args)]
pub struct TargetArgs {
    /// Organization (prompted when missing)
    #[arg(long)]
    pub org: Option<String>,

    /// Limit to the repositories of this team
    #[arg(long)]
    pub team: Option<String>,

    /// Explicit repositories, `name` or `org/name` (repeatable)
    #[arg(long = "repo")]
    pub repos: Vec<String>,

    /// Scan already-cloned repositories in this directory
    #[arg(long, conflicts_with_all = ["clone", "team"])]
    pub local_dir: Option<PathBuf>,

    /// Clone each repository into a fresh temporary directory and scan it
    #[arg(long)]
    pub clone: bool,

    /// Join workflow fields across all workflows instead of keeping the last
    #[arg(long)]
    pub aggregate_workflows: bool,
}

#[derive(Debug, Args)]
pub struct AuditArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Run only these checks (repeatable); default is every check
    #[arg(long = "only", value_parser = parse_check_kind)]
    pub only: Vec<CheckKind>,
}

#[derive(Debug, Args)]
pub struct CloneArgs {
    #[arg(long)]
    pub org: String,

    #[arg(long)]
    pub team: String,

    /// Directory receiving one sub-directory per repository
    #[arg(long)]
    pub dest: PathBuf,
}

fn parse_check_kind(value: &str) -> Result<CheckKind, String> {
    value.parse()
}

/// Selected checks, every check when none is given
pub fn check_selection(only: &[CheckKind]) -> BTreeSet<CheckKind> {
    if only.is_empty() {
        CheckKind::ALL.into_iter().collect()
    } else {
        only.iter().copied().collect()
    }
}

// =============================================================================
// Prompts
// =============================================================================

/// Print `label` and read one trimmed line
pub fn prompt(label: &str) -> io::Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    read_trimmed_line(&mut io::stdin().lock())
}

fn read_trimmed_line(input: &mut impl BufRead) -> io::Result<String> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
    }
    Ok(line.trim().to_string())
}

// =============================================================================
// Menu
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuChoice {
    Run(BTreeSet<CheckKind>),
    Quit,
}

pub const MENU: &str = "\
1) Update package manager
2) Update dependency management
3) Update semantic release
4) Update workflow activity
5) Update workflow metadata
6) Full update
0) Quit";

pub fn parse_menu_choice(input: &str) -> Result<MenuChoice, String> {
    let single = |kind: CheckKind| MenuChoice::Run([kind].into_iter().collect());

    match input.trim() {
        "1" => Ok(single(CheckKind::PackageManager)),
        "2" => Ok(single(CheckKind::DependencyAutomation)),
        "3" => Ok(single(CheckKind::SemanticRelease)),
        "4" => Ok(single(CheckKind::WorkflowActivity)),
        "5" => Ok(single(CheckKind::WorkflowMetadata)),
        "6" => Ok(MenuChoice::Run(CheckKind::ALL.into_iter().collect())),
        "0" | "q" | "quit" => Ok(MenuChoice::Quit),
        other => Err(format!("Unknown option '{}'", other)),
    }
}

/// Show the menu until a valid choice is read; end of input means quit
pub fn read_menu_choice(input: &mut impl BufRead, output: &mut impl Write) -> io::Result<MenuChoice> {
    loop {
        writeln!(output, "\n{}", MENU)?;
        write!(output, "Select an option: ")?;
        output.flush()?;

        let line = match read_trimmed_line(input) {
            Ok(line) => line,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(MenuChoice::Quit),
            Err(e) => return Err(e),
        };

        match parse_menu_choice(&line) {
            Ok(choice) => return Ok(choice),
            Err(message) => writeln!(output, "{}", message)?,
        }
    }
}
