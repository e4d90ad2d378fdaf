use std::fmt;
use std::path::{Path, PathBuf};

use super::Board;

/// Where a firmware image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactVariant {
    /// Merged image produced from the local build by the manifest generator.
    BuildOutput,
    /// Copy of the build output exposed to the flasher as the dev version.
    DevCopy,
    /// Image fetched from the latest tagged release.
    DownloadedStable,
}

/// A firmware image for one board.
///
/// The path is a pure function of board and variant. `BuildOutput` and
/// `DownloadedStable` share the release file name, so a download that runs
/// after a build replaces the build output for that board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Artifact {
    pub board: Board,
    pub variant: ArtifactVariant,
}

impl Artifact {
    pub fn new(board: Board, variant: ArtifactVariant) -> Self {
        Self { board, variant }
    }

    pub fn file_name(&self) -> String {
        match self.variant {
            ArtifactVariant::BuildOutput | ArtifactVariant::DownloadedStable => {
                self.board.artifact_name()
            }
            ArtifactVariant::DevCopy => self.board.dev_artifact_name(),
        }
    }

    /// Absolute location of this artifact under the serving root.
    pub fn path(&self, serve_root: &Path) -> PathBuf {
        serve_root.join(self.board.subdir()).join(self.file_name())
    }
}

/// The most recent release tag found in the project's git history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTag(String);

impl ReleaseTag {
    /// Wrap a tag name. Returns `None` for blank input.
    pub fn new(tag: impl Into<String>) -> Option<Self> {
        let tag = tag.into();
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReleaseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
