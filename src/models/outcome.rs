use std::fmt;

use crate::error::LaunchError;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    BuildFirmware,
    StageDevFirmware,
    DownloadStable,
    CopyAssets,
    GenerateManifests,
    DevServer,
    BuildWebapp,
    Serve,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::BuildFirmware => "build firmware",
            Stage::StageDevFirmware => "stage dev firmware",
            Stage::DownloadStable => "download stable firmware",
            Stage::CopyAssets => "copy assets",
            Stage::GenerateManifests => "generate manifests",
            Stage::DevServer => "dev server",
            Stage::BuildWebapp => "build webapp",
            Stage::Serve => "serve",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of running one stage.
#[derive(Debug)]
pub enum StageOutcome {
    Succeeded,
    Failed(LaunchError),
    /// Some units (usually boards) failed while others went through.
    PartialFailure(Vec<LaunchError>),
}

impl StageOutcome {
    /// Collapse per-unit failures into an outcome.
    ///
    /// No failures is success; failing every one of `attempted` units is a
    /// plain failure when there was exactly one unit, otherwise partial.
    pub fn from_failures(mut failures: Vec<LaunchError>, attempted: usize) -> Self {
        match failures.len() {
            0 => StageOutcome::Succeeded,
            1 if attempted == 1 => StageOutcome::Failed(failures.remove(0)),
            _ => StageOutcome::PartialFailure(failures),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StageOutcome::Succeeded)
    }

    /// All errors carried by this outcome.
    pub fn errors(&self) -> Vec<&LaunchError> {
        match self {
            StageOutcome::Succeeded => Vec::new(),
            StageOutcome::Failed(err) => vec![err],
            StageOutcome::PartialFailure(errs) => errs.iter().collect(),
        }
    }
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageOutcome::Succeeded => f.write_str("ok"),
            StageOutcome::Failed(err) => write!(f, "failed: {err}"),
            StageOutcome::PartialFailure(errs) => write!(f, "{} failure(s)", errs.len()),
        }
    }
}
