use std::path::Path;
use std::process::Command;

use tracing::warn;

use crate::application::ports::SourceError;

/// Run `git -C <dir> <args>` and return trimmed stdout
pub fn run_git(dir: &Path, args: &[&str]) -> Result<String, SourceError> {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .output()
        .map_err(|e| SourceError::Git(format!("failed to start git: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SourceError::Git(format!("git {}: {}", args.join(" "), stderr.trim())));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// `git clone <url> <dest>`; `display_url` is what gets logged
pub fn clone(url: &str, display_url: &str, dest: &Path) -> Result<(), SourceError> {
    let output = Command::new("git")
        .args(["clone", "--quiet", "--no-tags", url])
        .arg(dest)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .map_err(|e| SourceError::Git(format!("failed to start git: {}", e)))?;

    if !output.status.success() {
        // stderr may echo the credential-bearing URL
        let stderr = String::from_utf8_lossy(&output.stderr).replace(url, display_url);
        warn!("Git clone failed: {}", stderr.trim());
        return Err(SourceError::Git(format!("clone of {} failed: {}", display_url, stderr.trim())));
    }

    Ok(())
}

/// HTTPS clone URL, with the token embedded when one is given
pub fn clone_url(base: &str, owner: &str, name: &str, token: Option<&str>) -> String {
    let base = base.trim_end_matches('/');
    match token {
        Some(token) if !token.is_empty() => {
            let (scheme, host) = base.split_once("://").unwrap_or(("https", base));
            format!("{}://x-access-token:{}@{}/{}/{}.git", scheme, token, host, owner, name)
        }
        _ => format!("{}/{}/{}.git", base, owner, name),
    }
}
