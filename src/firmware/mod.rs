//! Firmware acquisition.
//!
//! Firmware for a board comes from one of two places:
//! - a local build through the ESP-IDF toolchain ([`FirmwareAcquirer::build_local`]),
//!   merged into the demo tree and exposed as a dev image
//!   ([`FirmwareAcquirer::stage_dev_firmware`]);
//! - the latest tagged GitHub release ([`FirmwareAcquirer::download_stable`]).
//!
//! Failures are per board. Nothing in here aborts the pipeline.

mod build;
mod download;

pub use download::{DownloadError, ReleaseClient};

use crate::config::LauncherConfig;

pub struct FirmwareAcquirer {
    config: LauncherConfig,
    releases: ReleaseClient,
}

impl FirmwareAcquirer {
    pub fn new(config: LauncherConfig) -> Self {
        let releases = ReleaseClient::new(config.release_url.clone(), config.repo.clone());
        Self { config, releases }
    }

    /// Use a specific release client instead of one derived from the config.
    pub fn with_releases(config: LauncherConfig, releases: ReleaseClient) -> Self {
        Self { config, releases }
    }
}
