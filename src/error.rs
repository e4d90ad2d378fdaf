//! Error taxonomy for the demo launcher.
//!
//! Most of these never terminate a run. Stages report them inside a
//! [`StageOutcome`](crate::models::StageOutcome) and the pipeline's failure
//! policy decides what happens next.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::Board;

pub type Result<T> = std::result::Result<T, LaunchError>;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Unknown board: {0}")]
    UnknownBoard(String),

    #[error("Firmware build failed for {board}")]
    BuildFailed { board: Board, diagnostics: Vec<String> },

    #[error("Could not stage dev firmware for {board}: {reason}")]
    DevCopyFailed { board: Board, reason: String },

    #[error("Could not download stable firmware for {board}: {reason}")]
    DownloadFailed { board: Board, reason: String },

    #[error("No git tags found, no stable release to download")]
    NoReleaseFound,

    #[error("Manifest generator not found: {}", .0.display())]
    ManifestGeneratorMissing(PathBuf),

    #[error("Manifest generation failed for {board}")]
    ManifestGenerationFailed { board: Board, diagnostics: Vec<String> },

    #[error("Demo webapp build failed: {reason}")]
    WebappBuildFailed { reason: String, diagnostics: Vec<String> },

    #[error("Could not find an available port starting from {start} ({attempts} tried)")]
    NoPortAvailable { start: u16, attempts: u16 },

    #[error("{} exists but is not a symlink", .0.display())]
    AliasConflict(PathBuf),

    #[error("Failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LaunchError {
    /// Tool output attached to the error, if any.
    pub fn diagnostics(&self) -> &[String] {
        match self {
            LaunchError::BuildFailed { diagnostics, .. }
            | LaunchError::ManifestGenerationFailed { diagnostics, .. }
            | LaunchError::WebappBuildFailed { diagnostics, .. } => diagnostics,
            _ => &[],
        }
    }
}
