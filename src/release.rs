//! Release tag discovery from git history.

use std::path::Path;

use crate::models::ReleaseTag;
use crate::toolchain::ToolCommand;

/// Most recent tag reachable from `HEAD` in `project_root`.
///
/// Returns `None` when there is no tag, the directory is not a repository, or
/// git is not installed. All of these simply mean "no stable release".
pub async fn latest_release_tag(project_root: &Path) -> Option<ReleaseTag> {
    let output = ToolCommand::new("git", project_root)
        .args(["describe", "--tags", "--abbrev=0"])
        .output()
        .await;

    match output {
        Ok(out) if out.success() => ReleaseTag::new(out.stdout),
        Ok(out) => {
            tracing::debug!("git describe found no tag: {}", out.stderr.trim());
            None
        }
        Err(e) => {
            tracing::debug!("git describe unavailable: {}", e);
            None
        }
    }
}
