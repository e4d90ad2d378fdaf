use std::path::PathBuf;

use super::FirmwareAcquirer;
use crate::error::{LaunchError, Result};
use crate::models::{Artifact, ArtifactVariant, Board};
use crate::toolchain::{log_diagnostics, ToolCommand};

impl FirmwareAcquirer {
    /// Build firmware for `board` with the board's sdkconfig overlay.
    ///
    /// Fails with [`LaunchError::BuildFailed`] carrying the tail of the
    /// toolchain output. Whether the run continues is the caller's call.
    pub async fn build_local(&self, board: Board) -> Result<()> {
        tracing::info!("Building firmware for {} (this may take a few minutes)", board);

        let output = ToolCommand::from_prefix(&self.config.idf_command, &self.config.project_root)
            .arg(format!(
                "-DSDKCONFIG_DEFAULTS=sdkconfig.defaults;sdkconfig.defaults.{}",
                board.id()
            ))
            .arg("build")
            .output()
            .await?;

        if output.success() {
            tracing::info!("✓ {} firmware built successfully", board);
            return Ok(());
        }

        let diagnostics = output.diagnostics();
        tracing::warn!("✗ Error building firmware for {}: {}", board, output.status);
        log_diagnostics(&diagnostics);
        Err(LaunchError::BuildFailed { board, diagnostics })
    }

    /// Merge the build output into the board's directory and publish it as the dev image.
    ///
    /// The manifest generator does the merge (without `--dev`, it copies the
    /// build output into the demo tree). The merged image is then copied to the
    /// dev artifact path.
    pub async fn stage_dev_firmware(&self, board: Board) -> Result<PathBuf> {
        let serve_root = self.config.serve_root();
        let board_dir = serve_root.join(board.subdir());
        tokio::fs::create_dir_all(&board_dir).await?;

        let dev_copy_failed = |reason: String| LaunchError::DevCopyFailed { board, reason };

        let output = ToolCommand::from_prefix(&self.config.python_command, &self.config.project_root)
            .arg(self.config.manifest_script().display().to_string())
            .args(["--board", board.id()])
            .arg("--demo-dir")
            .arg(self.config.relative_board_dir(board.subdir()))
            .output()
            .await
            .map_err(|e| dev_copy_failed(e.to_string()))?;

        if !output.success() {
            let detail = output.diagnostics().join("; ");
            return Err(dev_copy_failed(format!(
                "manifest generator exited with {}: {}",
                output.status, detail
            )));
        }

        let merged = Artifact::new(board, ArtifactVariant::BuildOutput).path(&serve_root);
        let dev = Artifact::new(board, ArtifactVariant::DevCopy).path(&serve_root);

        if !tokio::fs::try_exists(&merged).await.unwrap_or(false) {
            return Err(dev_copy_failed(format!("{} was not produced", merged.display())));
        }

        tokio::fs::copy(&merged, &dev)
            .await
            .map_err(|e| dev_copy_failed(e.to_string()))?;

        tracing::info!("✓ Copied dev firmware for {}", board);
        Ok(dev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LauncherConfig;
    use std::path::Path;

    fn write_script(dir: &Path, name: &str, body: &str) -> String {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path.display().to_string()
    }

    #[tokio::test]
    async fn successful_toolchain_run_builds() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "idf.sh", "echo \"$@\" > args.txt\nexit 0\n");
        let config = LauncherConfig::new(dir.path()).with_idf_command(["sh", script.as_str()]);

        FirmwareAcquirer::new(config)
            .build_local(Board::SeeedstudioXiaoEe02)
            .await
            .unwrap();

        let args = std::fs::read_to_string(dir.path().join("args.txt")).unwrap();
        assert_eq!(
            args.trim(),
            "-DSDKCONFIG_DEFAULTS=sdkconfig.defaults;sdkconfig.defaults.seeedstudio_xiao_ee02 build"
        );
    }

    #[tokio::test]
    async fn failed_build_reports_last_ten_stderr_lines() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(
            dir.path(),
            "idf.sh",
            "i=1\nwhile [ $i -le 12 ]; do echo \"error $i\" >&2; i=$((i+1)); done\nexit 2\n",
        );
        let config = LauncherConfig::new(dir.path()).with_idf_command(["sh", script.as_str()]);

        let err = FirmwareAcquirer::new(config)
            .build_local(Board::WavesharePhotopainter73)
            .await
            .unwrap_err();

        match err {
            LaunchError::BuildFailed { board, diagnostics } => {
                assert_eq!(board, Board::WavesharePhotopainter73);
                assert_eq!(diagnostics.len(), 10);
                assert_eq!(diagnostics[0], "error 3");
                assert_eq!(diagnostics[9], "error 12");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn dev_firmware_is_a_copy_of_the_merged_image() {
        let dir = tempfile::tempdir().unwrap();
        // Stand-in generator: writes a merged image into --demo-dir.
        let script = write_script(
            dir.path(),
            "generate.sh",
            "shift\nwhile [ $# -gt 0 ]; do\n  case \"$1\" in\n    --board) board=\"$2\"; shift;;\n    --demo-dir) out=\"$2\"; shift;;\n  esac\n  shift\ndone\nprintf 'merged-%s' \"$board\" > \"$out/photoframe-firmware-$board-merged.bin\"\n",
        );
        let config = LauncherConfig::new(dir.path()).with_python_command(["sh", script.as_str()]);

        let dev = FirmwareAcquirer::new(config)
            .stage_dev_firmware(Board::SeeedstudioXiaoEe02)
            .await
            .unwrap();

        assert!(dev.ends_with("seeedstudio_xiao_ee02/photoframe-firmware-seeedstudio_xiao_ee02-dev.bin"));
        assert_eq!(std::fs::read_to_string(dev).unwrap(), "merged-seeedstudio_xiao_ee02");
    }

    #[tokio::test]
    async fn dev_staging_fails_softly_without_merged_image() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "generate.sh", "exit 0\n");
        let config = LauncherConfig::new(dir.path()).with_python_command(["sh", script.as_str()]);

        let err = FirmwareAcquirer::new(config)
            .stage_dev_firmware(Board::WavesharePhotopainter73)
            .await
            .unwrap_err();
        assert!(matches!(err, LaunchError::DevCopyFailed { .. }));
    }
}
