//! Stage sequencing.
//!
//! Stages run strictly one after another, each working on the tree the
//! previous one left behind:
//!
//! 1. build firmware for the selected boards
//! 2. stage the builds as dev firmware
//! 3. download stable firmware for every board
//! 4. copy auxiliary assets
//! 5. generate manifests for every board
//! 6. either hand off to the webapp dev server, or build the webapp and serve
//!
//! Firmware and webapp build failures go through a [`FailurePolicy`]; every
//! other failure is logged and the run moves on.

use std::io::{BufRead, Write};

use tokio::runtime::{Handle, RuntimeFlavor};

use crate::assets::AssetStager;
use crate::config::LauncherConfig;
use crate::error::{LaunchError, Result};
use crate::firmware::FirmwareAcquirer;
use crate::manifests::ManifestCoordinator;
use crate::models::{Board, BoardCatalog, BoardSelection, Stage, StageOutcome};
use crate::release::latest_release_tag;
use crate::server::DemoServer;
use crate::webapp::WebApp;

/// Decides whether the run goes on after a recoverable failure.
pub trait FailurePolicy {
    fn should_continue(&self, stage: Stage, error: &LaunchError) -> bool;
}

impl<F> FailurePolicy for F
where
    F: Fn(Stage, &LaunchError) -> bool,
{
    fn should_continue(&self, stage: Stage, error: &LaunchError) -> bool {
        self(stage, error)
    }
}

/// Always keep going.
pub struct ContinuePolicy;

impl FailurePolicy for ContinuePolicy {
    fn should_continue(&self, _stage: Stage, _error: &LaunchError) -> bool {
        true
    }
}

/// Stop at the first recoverable failure.
pub struct AbortPolicy;

impl FailurePolicy for AbortPolicy {
    fn should_continue(&self, _stage: Stage, _error: &LaunchError) -> bool {
        false
    }
}

/// Ask on the terminal.
pub struct PromptPolicy;

impl FailurePolicy for PromptPolicy {
    fn should_continue(&self, _stage: Stage, _error: &LaunchError) -> bool {
        let ask = || confirm(&mut std::io::stdin().lock(), &mut std::io::stdout());
        // Waiting on the terminal must not stall a runtime worker.
        match Handle::try_current().map(|handle| handle.runtime_flavor()) {
            Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(ask),
            _ => ask(),
        }
    }
}

/// Ask "Continue anyway?" and accept only `y`.
pub fn confirm(input: &mut impl BufRead, output: &mut impl Write) -> bool {
    let _ = write!(output, "Continue anyway? (y/n): ");
    let _ = output.flush();

    let mut answer = String::new();
    if input.read_line(&mut answer).is_err() {
        return false;
    }
    answer.trim().eq_ignore_ascii_case("y")
}

/// Switches controlling one run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub boards: BoardSelection,
    pub skip_build: bool,
    pub skip_download: bool,
    pub skip_copy: bool,
    pub skip_manifests: bool,
    pub skip_webapp: bool,
    /// Hand off to the webapp dev server instead of building and serving.
    pub dev: bool,
    /// Start the static server at the end.
    pub serve: bool,
    pub port: u16,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            boards: BoardSelection::default(),
            skip_build: false,
            skip_download: false,
            skip_copy: false,
            skip_manifests: false,
            skip_webapp: false,
            dev: false,
            serve: true,
            port: 8000,
        }
    }
}

/// What each executed stage reported.
#[derive(Debug, Default)]
pub struct PipelineReport {
    pub stages: Vec<(Stage, StageOutcome)>,
    /// Stage at which the failure policy stopped the run.
    pub aborted_at: Option<Stage>,
}

impl PipelineReport {
    fn record(&mut self, stage: Stage, outcome: StageOutcome) {
        self.stages.push((stage, outcome));
    }

    pub fn outcome(&self, stage: Stage) -> Option<&StageOutcome> {
        self.stages.iter().find(|(s, _)| *s == stage).map(|(_, o)| o)
    }

    pub fn ran(&self, stage: Stage) -> bool {
        self.outcome(stage).is_some()
    }

    pub fn aborted(&self) -> bool {
        self.aborted_at.is_some()
    }

    /// Process exit code: non-zero only when the run was aborted.
    pub fn exit_code(&self) -> u8 {
        if self.aborted() {
            1
        } else {
            0
        }
    }

    pub fn log_summary(&self) {
        for (stage, outcome) in &self.stages {
            if outcome.is_success() {
                tracing::info!("{}: {}", stage, outcome);
            } else {
                tracing::warn!("{}: {}", stage, outcome);
            }
        }
        if let Some(stage) = self.aborted_at {
            tracing::error!("Aborted after {} failure", stage);
        }
    }
}

pub struct Pipeline {
    config: LauncherConfig,
    policy: Box<dyn FailurePolicy>,
}

impl Pipeline {
    pub fn new(config: LauncherConfig, policy: impl FailurePolicy + 'static) -> Self {
        Self {
            config,
            policy: Box::new(policy),
        }
    }

    /// Run every enabled stage in order.
    ///
    /// Returns an error only when the server cannot start. Aborts requested by
    /// the failure policy are reported through [`PipelineReport::aborted_at`].
    pub async fn run(&self, options: &PipelineOptions) -> Result<PipelineReport> {
        let mut report = PipelineReport::default();
        let firmware = FirmwareAcquirer::new(self.config.clone());
        let selected = options.boards.boards();

        if !options.skip_build {
            if !self.build_firmware(&firmware, &selected, &mut report).await {
                return Ok(report);
            }
            self.stage_dev_firmware(&firmware, &selected, &mut report).await;
        }

        // Stable images and manifests cover every board so the demo can flash any of them.
        if !options.skip_download {
            let tag = latest_release_tag(&self.config.project_root).await;
            let outcome = firmware.download_stable(BoardCatalog::all(), tag.as_ref()).await;
            report.record(Stage::DownloadStable, outcome);
        }

        if !options.skip_copy {
            AssetStager::new(self.config.clone()).stage().await;
            report.record(Stage::CopyAssets, StageOutcome::Succeeded);
        }

        if !options.skip_manifests {
            let outcome = ManifestCoordinator::new(self.config.clone())
                .generate(BoardCatalog::all())
                .await;
            if !outcome.is_success() {
                tracing::warn!("⚠ Manifest generation failed, but continuing...");
            }
            report.record(Stage::GenerateManifests, outcome);
        }

        let webapp = WebApp::new(self.config.clone());

        if options.dev {
            let outcome = match webapp.run_dev_server().await {
                Ok(()) => StageOutcome::Succeeded,
                Err(err) => {
                    tracing::warn!("⚠ {}", err);
                    StageOutcome::Failed(err)
                }
            };
            report.record(Stage::DevServer, outcome);
            return Ok(report);
        }

        if !options.skip_webapp {
            match webapp.build_demo().await {
                Ok(()) => report.record(Stage::BuildWebapp, StageOutcome::Succeeded),
                Err(err) => {
                    tracing::warn!("⚠ Demo webapp build failed");
                    let proceed = self.policy.should_continue(Stage::BuildWebapp, &err);
                    report.record(Stage::BuildWebapp, StageOutcome::Failed(err));
                    if !proceed {
                        report.aborted_at = Some(Stage::BuildWebapp);
                        return Ok(report);
                    }
                }
            }
        }

        if options.serve {
            DemoServer::new(&self.config).run(options.port).await?;
            report.record(Stage::Serve, StageOutcome::Succeeded);
        }

        Ok(report)
    }

    /// Returns `false` when the policy asked to stop.
    async fn build_firmware(
        &self,
        firmware: &FirmwareAcquirer,
        boards: &[Board],
        report: &mut PipelineReport,
    ) -> bool {
        let mut failures = Vec::new();

        for &board in boards {
            let Err(err) = firmware.build_local(board).await else {
                continue;
            };
            tracing::warn!("⚠ Firmware build for {} failed", board);
            let proceed = self.policy.should_continue(Stage::BuildFirmware, &err);
            failures.push(err);
            if !proceed {
                report.record(
                    Stage::BuildFirmware,
                    StageOutcome::from_failures(failures, boards.len()),
                );
                report.aborted_at = Some(Stage::BuildFirmware);
                return false;
            }
        }

        report.record(
            Stage::BuildFirmware,
            StageOutcome::from_failures(failures, boards.len()),
        );
        true
    }

    async fn stage_dev_firmware(
        &self,
        firmware: &FirmwareAcquirer,
        boards: &[Board],
        report: &mut PipelineReport,
    ) {
        tracing::info!("Copying dev firmware...");
        let mut failures = Vec::new();

        for &board in boards {
            if let Err(err) = firmware.stage_dev_firmware(board).await {
                tracing::warn!("⚠ {}", err);
                failures.push(err);
            }
        }

        report.record(
            Stage::StageDevFirmware,
            StageOutcome::from_failures(failures, boards.len()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn confirm_accepts_only_y() {
        let mut out = Vec::new();
        assert!(confirm(&mut Cursor::new("y\n"), &mut out));
        assert!(confirm(&mut Cursor::new("Y\n"), &mut out));
        assert!(!confirm(&mut Cursor::new("yes\n"), &mut out));
        assert!(!confirm(&mut Cursor::new("n\n"), &mut out));
        assert!(!confirm(&mut Cursor::new("\n"), &mut out));
        assert!(!confirm(&mut Cursor::new(""), &mut out));
        assert!(String::from_utf8(out).unwrap().starts_with("Continue anyway? (y/n): "));
    }

    #[test]
    fn exit_code_reflects_abort_only() {
        let mut report = PipelineReport::default();
        report.record(
            Stage::DownloadStable,
            StageOutcome::Failed(LaunchError::NoReleaseFound),
        );
        assert_eq!(report.exit_code(), 0);

        report.aborted_at = Some(Stage::BuildFirmware);
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn closures_act_as_policies() {
        let policy = |stage: Stage, _: &LaunchError| stage == Stage::BuildWebapp;
        assert!(policy.should_continue(Stage::BuildWebapp, &LaunchError::NoReleaseFound));
        assert!(!policy.should_continue(Stage::BuildFirmware, &LaunchError::NoReleaseFound));
    }
}
