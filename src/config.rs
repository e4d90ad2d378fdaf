//! Launcher configuration.
//!
//! Paths are derived from the project root passed on the command line. External
//! tool locations and the release source can be overridden from the environment:
//! - `PHOTOFRAME_RELEASE_URL` - Release host (default: `https://github.com`)
//! - `PHOTOFRAME_REPO` - Repository publishing releases (default: `aitjcize/esp32-photoframe`)
//! - `PHOTOFRAME_IDF` - Firmware toolchain command (default: `idf.py`)
//! - `PHOTOFRAME_PYTHON` - Interpreter for the manifest generator (default: `python3`)
//! - `PHOTOFRAME_NPM` - Package manager for the webapp (default: `npm`)
//!
//! Command overrides are split on whitespace, so `PHOTOFRAME_PYTHON="uv run python"` works.

use std::path::{Path, PathBuf};

/// Default release host.
pub const DEFAULT_RELEASE_URL: &str = "https://github.com";
/// Repository that publishes firmware releases.
pub const DEFAULT_REPO: &str = "aitjcize/esp32-photoframe";
/// Name under which the hosted site is deployed; the local alias uses the same name.
pub const SITE_ALIAS: &str = "esp32-photoframe";
/// Directory, relative to the project root, that becomes the serving root.
pub const DEMO_DIR: &str = "demo";
/// How many consecutive ports are tried before giving up.
pub const PORT_SCAN_ATTEMPTS: u16 = 10;

#[derive(Clone, Debug)]
pub struct LauncherConfig {
    pub project_root: PathBuf,
    pub release_url: String,
    pub repo: String,
    pub idf_command: Vec<String>,
    pub python_command: Vec<String>,
    pub npm_command: Vec<String>,
    pub site_alias: String,
}

impl LauncherConfig {
    /// Configuration with built-in defaults, ignoring the environment.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            release_url: DEFAULT_RELEASE_URL.to_string(),
            repo: DEFAULT_REPO.to_string(),
            idf_command: vec!["idf.py".to_string()],
            python_command: vec!["python3".to_string()],
            npm_command: vec!["npm".to_string()],
            site_alias: SITE_ALIAS.to_string(),
        }
    }

    /// Defaults overridden by `PHOTOFRAME_*` environment variables.
    pub fn from_env(project_root: impl Into<PathBuf>) -> Self {
        let mut config = Self::new(project_root);

        if let Ok(url) = std::env::var("PHOTOFRAME_RELEASE_URL") {
            config.release_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(repo) = std::env::var("PHOTOFRAME_REPO") {
            config.repo = repo.trim_matches('/').to_string();
        }
        if let Some(cmd) = command_from_env("PHOTOFRAME_IDF") {
            config.idf_command = cmd;
        }
        if let Some(cmd) = command_from_env("PHOTOFRAME_PYTHON") {
            config.python_command = cmd;
        }
        if let Some(cmd) = command_from_env("PHOTOFRAME_NPM") {
            config.npm_command = cmd;
        }

        config
    }

    pub fn with_release_url(mut self, url: impl Into<String>) -> Self {
        self.release_url = url.into();
        self
    }

    pub fn with_idf_command<I, S>(mut self, cmd: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.idf_command = cmd.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_python_command<I, S>(mut self, cmd: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.python_command = cmd.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_npm_command<I, S>(mut self, cmd: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.npm_command = cmd.into_iter().map(Into::into).collect();
        self
    }

    /// Root of the tree that gets served (`<project>/demo`).
    pub fn serve_root(&self) -> PathBuf {
        self.project_root.join(DEMO_DIR)
    }

    /// Serving root relative to the project root, as passed to the manifest generator.
    pub fn relative_board_dir(&self, subdir: &str) -> String {
        format!("{DEMO_DIR}/{subdir}")
    }

    pub fn manifest_script(&self) -> PathBuf {
        self.project_root.join("scripts").join("generate_manifests.py")
    }

    pub fn webapp_dir(&self) -> PathBuf {
        self.project_root.join("webapp")
    }

    /// Directory the HTTP server is rooted at, so both `/demo/` and the alias resolve.
    pub fn serve_base(&self) -> &Path {
        &self.project_root
    }
}

fn command_from_env(key: &str) -> Option<Vec<String>> {
    let value = std::env::var(key).ok()?;
    let parts: Vec<String> = value.split_whitespace().map(str::to_string).collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts)
    }
}
