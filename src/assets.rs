//! Auxiliary files copied into the demo tree.

use std::path::PathBuf;

use crate::config::LauncherConfig;

/// `(source relative to project root, destination relative to serving root)`
pub const ASSETS: &[(&str, &str)] = &[(".img/sample.jpg", "sample.jpg")];

pub struct AssetStager {
    config: LauncherConfig,
}

impl AssetStager {
    pub fn new(config: LauncherConfig) -> Self {
        Self { config }
    }

    /// Copy every known asset that exists. Missing or unreadable sources only warn.
    pub async fn stage(&self) -> Vec<PathBuf> {
        tracing::info!("Copying required files...");

        let serve_root = self.config.serve_root();
        let mut staged = Vec::new();

        for (src, dst) in ASSETS {
            let src = self.config.project_root.join(src);
            let dst = serve_root.join(dst);

            if !tokio::fs::try_exists(&src).await.unwrap_or(false) {
                tracing::warn!("⚠ {} not found", src.display());
                continue;
            }

            if let Some(parent) = dst.parent() {
                if let Err(e) = tokio::fs::create_dir_all(parent).await {
                    tracing::warn!("⚠ Could not create {}: {}", parent.display(), e);
                    continue;
                }
            }

            match tokio::fs::copy(&src, &dst).await {
                Ok(_) => {
                    tracing::info!("✓ Copied {}", src.file_name().unwrap_or_default().to_string_lossy());
                    staged.push(dst);
                }
                Err(e) => tracing::warn!("⚠ Could not copy {}: {}", src.display(), e),
            }
        }

        staged
    }
}
