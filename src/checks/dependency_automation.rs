use super::{CheckOutcome, SignalLabel};
use crate::application::ports::RepoHandle;

pub const DEPENDABOT_LOGIN: &str = "dependabot[bot]";
pub const RENOVATE_LOGIN: &str = "renovate[bot]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyAutomation {
    None,
    Dependabot,
    Renovate,
    Both,
}

impl DependencyAutomation {
    fn from_presence(dependabot: bool, renovate: bool) -> Self {
        match (dependabot, renovate) {
            (true, true) => DependencyAutomation::Both,
            (true, false) => DependencyAutomation::Dependabot,
            (false, true) => DependencyAutomation::Renovate,
            (false, false) => DependencyAutomation::None,
        }
    }
}

impl SignalLabel for DependencyAutomation {
    fn label(&self) -> &'static str {
        match self {
            DependencyAutomation::None => "No",
            DependencyAutomation::Dependabot => "Dependabot",
            DependencyAutomation::Renovate => "Renovate",
            DependencyAutomation::Both => "Dependabot + Renovate",
        }
    }

    fn absent() -> Self {
        DependencyAutomation::None
    }
}

/// Detect dependency-update bots from the pull requests they opened
pub fn check_dependency_automation(repo: RepoHandle<'_>) -> CheckOutcome<DependencyAutomation> {
    let counts = repo
        .count_pull_requests(DEPENDABOT_LOGIN)
        .and_then(|dependabot| Ok((dependabot, repo.count_pull_requests(RENOVATE_LOGIN)?)));

    match counts {
        Ok((dependabot, renovate)) => {
            CheckOutcome::Confirmed(DependencyAutomation::from_presence(dependabot > 0, renovate > 0))
        }
        Err(e) => CheckOutcome::degraded("dependency-automation", repo.id, e),
    }
}
