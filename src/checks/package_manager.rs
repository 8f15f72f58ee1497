use super::{CheckOutcome, SignalLabel};
use crate::application::ports::RepoHandle;

pub const NPM_LOCKFILE: &str = "package-lock.json";
pub const YARN_LOCKFILE: &str = "yarn.lock";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Npm,
    Yarn,
    No,
}

impl SignalLabel for PackageManager {
    fn label(&self) -> &'static str {
        match self {
            PackageManager::Npm => "NPM",
            PackageManager::Yarn => "Yarn",
            PackageManager::No => "No",
        }
    }

    fn absent() -> Self {
        PackageManager::No
    }
}

/// Look for a lockfile in the repository root.
///
/// `package-lock.json` wins when both lockfiles are committed.
pub fn check_package_manager(repo: RepoHandle<'_>) -> CheckOutcome<PackageManager> {
    let files = match repo.list_root_files() {
        Ok(files) => files,
        Err(e) => return CheckOutcome::degraded("package-manager", repo.id, e),
    };

    let manager = if files.contains(NPM_LOCKFILE) {
        PackageManager::Npm
    } else if files.contains(YARN_LOCKFILE) {
        PackageManager::Yarn
    } else {
        PackageManager::No
    };

    CheckOutcome::Confirmed(manager)
}
