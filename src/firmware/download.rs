//! Stable firmware downloads from tagged releases.

use std::path::Path;

use reqwest::{Client, StatusCode};
use thiserror::Error;

use super::FirmwareAcquirer;
use crate::error::LaunchError;
use crate::models::{Artifact, ArtifactVariant, Board, ReleaseTag, StageOutcome};

/// Release asset published before multi-board support, without a board name.
const LEGACY_ASSET_NAME: &str = "photoframe-firmware-merged.bin";

/// Errors from a single download attempt.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned {status}")]
    Status { url: String, status: StatusCode },

    #[error("Could not write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// HTTP client for release assets.
#[derive(Debug, Clone)]
pub struct ReleaseClient {
    base_url: String,
    repo: String,
    client: Client,
}

impl ReleaseClient {
    pub fn new(base_url: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            repo: repo.into(),
            client: Client::new(),
        }
    }

    /// Use a preconfigured HTTP client (proxy settings, timeouts).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// `{base}/{repo}/releases/download/{tag}/{asset}`
    pub fn asset_url(&self, tag: &ReleaseTag, asset: &str) -> String {
        format!(
            "{}/{}/releases/download/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.repo,
            tag,
            asset
        )
    }

    /// URL of the board-specific merged image.
    pub fn board_url(&self, tag: &ReleaseTag, board: Board) -> String {
        self.asset_url(tag, &board.artifact_name())
    }

    /// URL of the pre-multi-board image name.
    pub fn legacy_url(&self, tag: &ReleaseTag) -> String {
        self.asset_url(tag, LEGACY_ASSET_NAME)
    }

    /// Fetch `url` once and write the body to `dest`. Returns the byte count.
    pub async fn fetch_to(&self, url: &str, dest: &Path) -> Result<u64, DownloadError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.bytes().await?;
        tokio::fs::write(dest, &body)
            .await
            .map_err(|source| DownloadError::Write {
                path: dest.display().to_string(),
                source,
            })?;
        Ok(body.len() as u64)
    }
}

impl FirmwareAcquirer {
    /// Download stable firmware for every board in `boards`.
    ///
    /// Without a release tag nothing is requested and the stage reports
    /// [`LaunchError::NoReleaseFound`]. Each board is attempted once; only the
    /// primary board gets one more try under the legacy asset name. A board
    /// whose attempts all fail is recorded and the loop moves on.
    pub async fn download_stable(&self, boards: &[Board], tag: Option<&ReleaseTag>) -> StageOutcome {
        tracing::info!("Downloading stable release firmware...");

        let Some(tag) = tag else {
            tracing::warn!("⚠ No git tags found, skipping stable firmware download");
            return StageOutcome::Failed(LaunchError::NoReleaseFound);
        };
        tracing::info!("Latest release: {}", tag);

        let serve_root = self.config.serve_root();
        let mut failures = Vec::new();

        for &board in boards {
            if let Err(err) = self.download_board(board, tag, &serve_root).await {
                tracing::warn!("⚠ {}", err);
                failures.push(err);
            }
        }

        StageOutcome::from_failures(failures, boards.len())
    }

    async fn download_board(
        &self,
        board: Board,
        tag: &ReleaseTag,
        serve_root: &Path,
    ) -> Result<(), LaunchError> {
        let dest = Artifact::new(board, ArtifactVariant::DownloadedStable).path(serve_root);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let url = self.releases.board_url(tag, board);
        tracing::info!("Downloading {} from: {}", board, url);

        let primary_err = match self.releases.fetch_to(&url, &dest).await {
            Ok(bytes) => {
                tracing::info!("✓ Downloaded stable firmware for {} ({}, {} bytes)", board, tag, bytes);
                return Ok(());
            }
            Err(e) => e,
        };

        if !board.is_primary() {
            return Err(LaunchError::DownloadFailed {
                board,
                reason: primary_err.to_string(),
            });
        }

        tracing::warn!("⚠ Could not download board-specific firmware, trying legacy filename...");
        let legacy = self.releases.legacy_url(tag);
        match self.releases.fetch_to(&legacy, &dest).await {
            Ok(bytes) => {
                tracing::info!(
                    "✓ Downloaded legacy stable firmware for {} ({}, {} bytes)",
                    board,
                    tag,
                    bytes
                );
                Ok(())
            }
            Err(legacy_err) => Err(LaunchError::DownloadFailed {
                board,
                reason: format!("{primary_err} (legacy fallback: {legacy_err})"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_follow_release_layout() {
        let client = ReleaseClient::new("https://github.com/", "aitjcize/esp32-photoframe");
        let tag = ReleaseTag::new("v1.4.0").unwrap();
        assert_eq!(
            client.board_url(&tag, Board::SeeedstudioXiaoEe02),
            "https://github.com/aitjcize/esp32-photoframe/releases/download/v1.4.0/photoframe-firmware-seeedstudio_xiao_ee02-merged.bin"
        );
        assert_eq!(
            client.legacy_url(&tag),
            "https://github.com/aitjcize/esp32-photoframe/releases/download/v1.4.0/photoframe-firmware-merged.bin"
        );
    }

    #[test]
    fn each_board_url_names_only_that_board() {
        let client = ReleaseClient::new("https://github.com", "aitjcize/esp32-photoframe");
        let tag = ReleaseTag::new("v1.4.0").unwrap();
        for board in Board::ALL {
            let url = client.board_url(&tag, board);
            assert!(url.contains(board.id()));
            for other in Board::ALL.into_iter().filter(|b| *b != board) {
                assert!(!url.contains(other.id()));
            }
        }
    }
}
