//! Site alias mount.
//!
//! The demo webapp is built with an absolute base path matching the hosted
//! site name (`/esp32-photoframe/`). Locally the tree lives in `demo/`, so the
//! server is rooted one level up and the site name is mounted onto the tree:
//! a symlink where the platform has them, a router mount otherwise.

use std::path::{Path, PathBuf};

use crate::error::LaunchError;

/// What happened when the mount was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountOutcome {
    /// A new symlink was created.
    Created,
    /// A symlink to the tree was already there.
    AlreadyPresent,
    /// Something else occupies the name. The alias path will 404.
    Conflict,
    /// No symlink on disk (unsupported or could not be created); the
    /// router serves the alias itself.
    Routed,
}

/// Maps `/{name}/` under the serving base onto the demo tree.
#[derive(Debug, Clone)]
pub struct SiteMount {
    name: String,
    base: PathBuf,
    target: PathBuf,
}

impl SiteMount {
    pub fn new(base: impl Into<PathBuf>, name: impl Into<String>, target: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            base: base.into(),
            target: target.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Filesystem location of the alias.
    pub fn link_path(&self) -> PathBuf {
        self.base.join(&self.name)
    }

    /// Link target as written into the symlink: relative when the tree sits
    /// directly under the base, so the pair can be moved together.
    fn link_target(&self) -> PathBuf {
        match (self.target.parent(), self.target.file_name()) {
            (Some(parent), Some(name)) if parent == self.base => PathBuf::from(name),
            _ => self.target.clone(),
        }
    }

    /// Create the alias if needed. Safe to call repeatedly.
    ///
    /// Never fails: when the name cannot be inspected or the link cannot be
    /// created, the alias falls back to [`MountOutcome::Routed`].
    pub fn ensure(&self) -> MountOutcome {
        let link = self.link_path();

        match std::fs::symlink_metadata(&link) {
            Ok(meta) if meta.file_type().is_symlink() => {
                if self.points_at_target(&link) {
                    tracing::debug!("Symlink {} already in place", link.display());
                    MountOutcome::AlreadyPresent
                } else {
                    tracing::warn!(
                        "⚠ {} is a symlink to somewhere other than {}",
                        link.display(),
                        self.target.display()
                    );
                    MountOutcome::Conflict
                }
            }
            Ok(_) => {
                tracing::warn!("⚠ {}", LaunchError::AliasConflict(link));
                MountOutcome::Conflict
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => self.create(&link),
            Err(e) => self.route(&link, e),
        }
    }

    fn route(&self, link: &Path, err: std::io::Error) -> MountOutcome {
        tracing::warn!(
            "⚠ Cannot use {} ({}), serving /{}/ through the router",
            link.display(),
            err,
            self.name
        );
        MountOutcome::Routed
    }

    fn points_at_target(&self, link: &Path) -> bool {
        match (std::fs::canonicalize(link), std::fs::canonicalize(&self.target)) {
            (Ok(resolved), Ok(target)) => resolved == target,
            _ => std::fs::read_link(link).is_ok_and(|dest| dest == self.link_target()),
        }
    }

    #[cfg(unix)]
    fn create(&self, link: &Path) -> MountOutcome {
        let target = self.link_target();
        match std::os::unix::fs::symlink(&target, link) {
            Ok(()) => {
                tracing::info!("Created symlink: {} -> {}", self.name, target.display());
                MountOutcome::Created
            }
            Err(e) => self.route(link, e),
        }
    }

    #[cfg(not(unix))]
    fn create(&self, _link: &Path) -> MountOutcome {
        tracing::info!("Serving /{}/ through the router", self.name);
        MountOutcome::Routed
    }
}
