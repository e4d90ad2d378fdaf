//! Manifest generation and default-board linking.
//!
//! The manifest generator is an external script. It is run once per board in
//! development mode (so locally built images are listed) with auto-copy
//! disabled, because placement inside the demo tree is handled here.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::LauncherConfig;
use crate::error::{LaunchError, Result};
use crate::models::{Board, StageOutcome};
use crate::toolchain::{log_diagnostics, ToolCommand};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const DEV_MANIFEST_FILE: &str = "manifest-dev.json";

/// The handful of manifest fields worth logging.
#[derive(Debug, Deserialize)]
struct ManifestSummary {
    name: Option<String>,
    version: Option<String>,
}

pub struct ManifestCoordinator {
    config: LauncherConfig,
}

impl ManifestCoordinator {
    pub fn new(config: LauncherConfig) -> Self {
        Self { config }
    }

    /// Generate manifests for `boards`, then link the first board's manifests at the root.
    pub async fn generate(&self, boards: &[Board]) -> StageOutcome {
        tracing::info!("Generating manifests...");

        let script = self.config.manifest_script();
        if !script.exists() {
            tracing::error!("✗ {} not found", script.display());
            return StageOutcome::Failed(LaunchError::ManifestGeneratorMissing(script));
        }

        let mut failures = Vec::new();
        for &board in boards {
            if let Err(err) = self.generate_board(board, &script).await {
                tracing::warn!("✗ Error generating manifests for {}: {}", board, err);
                log_diagnostics(err.diagnostics());
                failures.push(err);
            }
        }

        match self.link_default(boards).await {
            Ok(Some(board)) => tracing::info!("Default manifest: {}", board),
            Ok(None) => {}
            Err(err) => failures.push(err),
        }

        StageOutcome::from_failures(failures, boards.len())
    }

    async fn generate_board(&self, board: Board, script: &Path) -> Result<()> {
        let board_dir = self.board_dir(board);
        tokio::fs::create_dir_all(&board_dir).await?;

        let output = ToolCommand::from_prefix(&self.config.python_command, &self.config.project_root)
            .arg(script.display().to_string())
            .args(["--dev", "--no-copy", "--demo-dir"])
            .arg(self.config.relative_board_dir(board.subdir()))
            .args(["--board", board.id()])
            .output()
            .await
            .map_err(|e| LaunchError::ManifestGenerationFailed {
                board,
                diagnostics: vec![e.to_string()],
            })?;

        for line in output.stdout_lines() {
            tracing::info!("[{}] {}", board, line);
        }

        if output.success() {
            Ok(())
        } else {
            Err(LaunchError::ManifestGenerationFailed {
                board,
                diagnostics: output.diagnostics(),
            })
        }
    }

    /// Copy the first board's manifests to the serving root.
    ///
    /// Returns the linked board, or `None` when its manifest was never
    /// generated. The root copy always mirrors a single board.
    pub async fn link_default(&self, boards: &[Board]) -> Result<Option<Board>> {
        let Some(&default_board) = boards.first() else {
            return Ok(None);
        };

        let board_dir = self.board_dir(default_board);
        let manifest = board_dir.join(MANIFEST_FILE);
        if !tokio::fs::try_exists(&manifest).await.unwrap_or(false) {
            tracing::debug!("No manifest for default board {}, skipping root link", default_board);
            return Ok(None);
        }

        let root = self.config.serve_root();
        tokio::fs::copy(&manifest, root.join(MANIFEST_FILE)).await?;

        let dev_manifest = board_dir.join(DEV_MANIFEST_FILE);
        let root_dev_manifest = root.join(DEV_MANIFEST_FILE);
        if tokio::fs::try_exists(&dev_manifest).await.unwrap_or(false) {
            tokio::fs::copy(&dev_manifest, &root_dev_manifest).await?;
        } else {
            // Both root files mirror the same board.
            match tokio::fs::remove_file(&root_dev_manifest).await {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
                _ => {}
            }
        }

        log_summary(&root.join(MANIFEST_FILE)).await;
        Ok(Some(default_board))
    }

    pub fn board_dir(&self, board: Board) -> PathBuf {
        self.config.serve_root().join(board.subdir())
    }
}

async fn log_summary(path: &Path) {
    let Ok(raw) = tokio::fs::read(path).await else {
        return;
    };
    if let Ok(summary) = serde_json::from_slice::<ManifestSummary>(&raw) {
        tracing::debug!(
            "Root manifest: {} {}",
            summary.name.as_deref().unwrap_or("(unnamed)"),
            summary.version.as_deref().unwrap_or("(no version)")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_generator_fails_without_touching_boards() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = ManifestCoordinator::new(LauncherConfig::new(dir.path()));

        let outcome = coordinator.generate(&Board::ALL).await;

        assert!(matches!(outcome, StageOutcome::Failed(LaunchError::ManifestGeneratorMissing(_))));
        assert!(!dir.path().join("demo").exists());
    }

    #[tokio::test]
    async fn link_default_without_manifest_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = ManifestCoordinator::new(LauncherConfig::new(dir.path()));

        let linked = coordinator.link_default(&Board::ALL).await.unwrap();

        assert!(linked.is_none());
        assert!(!dir.path().join("demo").join(MANIFEST_FILE).exists());
    }

    #[tokio::test]
    async fn stale_root_dev_manifest_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = ManifestCoordinator::new(LauncherConfig::new(dir.path()));
        let board_dir = coordinator.board_dir(Board::PRIMARY);
        std::fs::create_dir_all(&board_dir).unwrap();
        std::fs::write(board_dir.join(MANIFEST_FILE), r#"{"name":"fresh"}"#).unwrap();
        let root = dir.path().join("demo");
        std::fs::write(root.join(DEV_MANIFEST_FILE), r#"{"name":"stale"}"#).unwrap();

        let linked = coordinator.link_default(&[Board::PRIMARY]).await.unwrap();

        assert_eq!(linked, Some(Board::PRIMARY));
        assert_eq!(
            std::fs::read_to_string(root.join(MANIFEST_FILE)).unwrap(),
            r#"{"name":"fresh"}"#
        );
        assert!(!root.join(DEV_MANIFEST_FILE).exists());
    }
}
