use serde::Deserialize;
use std::collections::BTreeMap;

use super::{CheckOutcome, SignalLabel};
use crate::application::ports::RepoHandle;

pub const MANIFEST_PATH: &str = "package.json";

/// devDependencies that mean the repository releases with semantic-release
pub const SEMANTIC_RELEASE_PACKAGES: [&str; 3] = [
    "semantic-release",
    "@semantic-release/commit-analyzer",
    "@semantic-release/release-notes-generator",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticRelease {
    Yes,
    No,
}

impl SignalLabel for SemanticRelease {
    fn label(&self) -> &'static str {
        match self {
            SemanticRelease::Yes => "Yes",
            SemanticRelease::No => "No",
        }
    }

    fn absent() -> Self {
        SemanticRelease::No
    }
}

#[derive(Debug, Deserialize)]
struct PackageManifest {
    #[serde(default, rename = "devDependencies")]
    dev_dependencies: BTreeMap<String, serde_json::Value>,
}

/// Returns true when the manifest lists a semantic-release package under
/// `devDependencies`
pub fn manifest_uses_semantic_release(content: &[u8]) -> Result<bool, serde_json::Error> {
    let manifest: PackageManifest = serde_json::from_slice(content)?;

    Ok(SEMANTIC_RELEASE_PACKAGES
        .iter()
        .any(|name| manifest.dev_dependencies.contains_key(*name)))
}

pub fn check_semantic_release(repo: RepoHandle<'_>) -> CheckOutcome<SemanticRelease> {
    let content = match repo.get_file_content(MANIFEST_PATH) {
        Ok(Some(content)) => content,
        Ok(None) => return CheckOutcome::Confirmed(SemanticRelease::No),
        Err(e) => return CheckOutcome::degraded("semantic-release", repo.id, e),
    };

    match manifest_uses_semantic_release(&content) {
        Ok(true) => CheckOutcome::Confirmed(SemanticRelease::Yes),
        Ok(false) => CheckOutcome::Confirmed(SemanticRelease::No),
        Err(e) => CheckOutcome::degraded("semantic-release", repo.id, format!("Invalid {}: {}", MANIFEST_PATH, e)),
    }
}
