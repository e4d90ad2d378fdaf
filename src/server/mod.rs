//! Local demo server.
//!
//! Serves the project directory so that both `/demo/` and the deployment path
//! `/esp32-photoframe/` resolve to the demo tree. The base directory is passed
//! in explicitly; the process working directory is never changed.

mod listing;
mod middleware;
mod mount;
mod port;

use std::future::Future;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    routing::{get, MethodRouter},
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::config::{LauncherConfig, PORT_SCAN_ATTEMPTS};
use crate::error::Result;

pub use listing::{directory_listing, resolve};
pub use middleware::{
    cors_no_cache_middleware, ALLOW_HEADERS, ALLOW_METHODS, ALLOW_ORIGIN, CACHE_CONTROL,
};
pub use mount::{MountOutcome, SiteMount};
pub use port::{select_port, PortSelection};

/// Address the demo server listens on.
pub const LISTEN_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Lifecycle of a [`DemoServer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Idle,
    PortSelecting,
    Aliasing,
    Serving,
    ShuttingDown,
}

/// Build the router serving `base`, with `mount` making the site alias resolve.
///
/// Static files and `index.html` come from [`ServeDir`]; directories without an
/// index get a generated listing. When the mount could not be made on disk
/// (`routed`), the alias is served by the router instead.
pub fn create_router(base: &Path, mount: &SiteMount, routed: bool) -> Router {
    let files = ServeDir::new(base).fallback(listing_for(base));

    let mut router = Router::new();
    if routed {
        router = router.nest_service(
            &format!("/{}", mount.name()),
            ServeDir::new(mount.target()).fallback(listing_for(mount.target())),
        );
    }

    router
        .fallback_service(files)
        .layer(axum::middleware::from_fn(cors_no_cache_middleware))
        .layer(TraceLayer::new_for_http())
}

fn listing_for(dir: &Path) -> MethodRouter {
    get(directory_listing).with_state(Arc::new(dir.to_path_buf()))
}

/// Port and mount, ready to serve.
#[derive(Debug)]
pub struct PreparedServer {
    pub selection: PortSelection,
    pub mount: MountOutcome,
}

impl PreparedServer {
    pub fn port(&self) -> u16 {
        self.selection.port
    }
}

pub struct DemoServer {
    base: PathBuf,
    mount: SiteMount,
    state: ServerState,
}

impl DemoServer {
    pub fn new(config: &LauncherConfig) -> Self {
        let base = config.serve_base().to_path_buf();
        let mount = SiteMount::new(&base, config.site_alias.clone(), config.serve_root());
        Self {
            base,
            mount,
            state: ServerState::Idle,
        }
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    pub fn mount(&self) -> &SiteMount {
        &self.mount
    }

    fn transition(&mut self, next: ServerState) {
        tracing::debug!("Demo server: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Select a port starting at `port`, then establish the site alias.
    ///
    /// Fails only when no port in range can be bound.
    pub fn prepare(&mut self, port: u16) -> Result<PreparedServer> {
        self.transition(ServerState::PortSelecting);
        let selection = match select_port(LISTEN_HOST, port, PORT_SCAN_ATTEMPTS) {
            Ok(selection) => selection,
            Err(err) => {
                tracing::error!("✗ {}", err);
                self.transition(ServerState::Idle);
                return Err(err);
            }
        };

        self.transition(ServerState::Aliasing);
        if let Err(e) = std::fs::create_dir_all(self.mount.target()) {
            tracing::warn!("⚠ Could not create {}: {}", self.mount.target().display(), e);
        }
        let mount = self.mount.ensure();

        Ok(PreparedServer { selection, mount })
    }

    /// Router for a prepared server, routing the alias when it is not on disk.
    pub fn router(&self, prepared: &PreparedServer) -> Router {
        let routed = prepared.mount == MountOutcome::Routed;
        create_router(&self.base, &self.mount, routed)
    }

    /// Serve until `shutdown` resolves, then release the port.
    pub async fn serve<F>(&mut self, prepared: PreparedServer, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let port = prepared.port();
        let app = self.router(&prepared);

        prepared.selection.listener.set_nonblocking(true)?;
        let listener = tokio::net::TcpListener::from_std(prepared.selection.listener)?;

        self.transition(ServerState::Serving);
        print_banner(port, self.mount.name());
        tracing::info!("Demo server listening on http://localhost:{}", port);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("Shutting down server...");
            })
            .await?;

        self.transition(ServerState::ShuttingDown);
        Ok(())
    }

    /// Prepare and serve until Ctrl+C.
    pub async fn run(&mut self, port: u16) -> Result<()> {
        let prepared = self.prepare(port)?;
        self.serve(prepared, shutdown_signal()).await
    }
}

/// Resolves on Ctrl+C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Could not listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

fn print_banner(port: u16, alias: &str) {
    let rule = "=".repeat(60);
    println!("\n{rule}");
    println!("ESP32 PhotoFrame Demo Page");
    println!("{rule}");
    println!("\nDemo page available at:");
    println!("  http://localhost:{port}/{alias}/#demo");
    println!("\nWeb flasher available at:");
    println!("  http://localhost:{port}/{alias}/#flash");
    println!("\nPress Ctrl+C to stop the server");
    println!("{rule}\n");
}
