//! Demo webapp: static build for serving, or the bundler's dev server.

use std::future::Future;
use std::time::Duration;

use crate::config::LauncherConfig;
use crate::error::{LaunchError, Result};
use crate::server::shutdown_signal;
use crate::toolchain::{log_diagnostics, ToolCommand};

/// How long the dev server gets to exit by itself after Ctrl+C.
pub const DEV_SERVER_GRACE: Duration = Duration::from_secs(5);

pub struct WebApp {
    config: LauncherConfig,
}

impl WebApp {
    pub fn new(config: LauncherConfig) -> Self {
        Self { config }
    }

    fn npm(&self) -> ToolCommand {
        ToolCommand::from_prefix(&self.config.npm_command, self.config.webapp_dir())
    }

    /// Install dependencies and run the demo build, which writes into the demo tree.
    pub async fn build_demo(&self) -> Result<()> {
        tracing::info!("Building demo webapp...");

        let webapp_dir = self.config.webapp_dir();
        if !webapp_dir.is_dir() {
            tracing::error!("✗ {} not found", webapp_dir.display());
            return Err(LaunchError::WebappBuildFailed {
                reason: format!("{} not found", webapp_dir.display()),
                diagnostics: Vec::new(),
            });
        }

        let steps: [(&str, &[&str]); 2] = [
            ("Installing dependencies", &["i"]),
            ("Building demo", &["run", "build:demo"]),
        ];

        for (label, args) in steps {
            tracing::info!("{}...", label);
            let command = self.npm().args(args.iter().copied());
            let output = command.output().await?;
            if !output.success() {
                let diagnostics = output.diagnostics();
                tracing::warn!("✗ `{}` exited with {}", command.display(), output.status);
                log_diagnostics(&diagnostics);
                return Err(LaunchError::WebappBuildFailed {
                    reason: format!("`{}` exited with {}", command.display(), output.status),
                    diagnostics,
                });
            }
        }

        tracing::info!("✓ Demo webapp built successfully");
        Ok(())
    }

    /// Run the bundler's dev server in the foreground until it exits or
    /// Ctrl+C is pressed.
    pub async fn run_dev_server(&self) -> Result<()> {
        self.run_dev_server_until(shutdown_signal(), DEV_SERVER_GRACE).await
    }

    /// Like [`WebApp::run_dev_server`], stopping when `interrupt` resolves.
    pub async fn run_dev_server_until<F>(&self, interrupt: F, grace: Duration) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tracing::info!("Starting Vite dev server...");
        match self
            .npm()
            .args(["run", "dev:demo"])
            .run_attached_until(interrupt, grace)
            .await?
        {
            Some(status) if !status.success() => {
                tracing::warn!("Dev server exited with {}", status);
            }
            Some(_) => {}
            None => tracing::info!("Shutting down dev server..."),
        }
        Ok(())
    }
}
