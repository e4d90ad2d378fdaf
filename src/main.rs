use std::path::PathBuf;
use std::process::ExitCode;

use clap::builder::{PossibleValuesParser, TypedValueParser};
use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use photoframe_demo::config::LauncherConfig;
use photoframe_demo::models::BoardSelection;
use photoframe_demo::pipeline::{
    AbortPolicy, ContinuePolicy, Pipeline, PipelineOptions, PromptPolicy,
};

#[derive(Parser)]
#[command(name = "launch-demo")]
#[command(about = "Launch the ESP32 PhotoFrame demo page locally")]
struct Cli {
    /// Port for local web server
    #[arg(short, long, default_value = "8000")]
    port: u16,

    /// Skip building firmware
    #[arg(long)]
    skip_build: bool,

    /// Skip downloading stable firmware
    #[arg(long)]
    skip_download: bool,

    /// Skip copying required files
    #[arg(long)]
    skip_copy: bool,

    /// Skip generating manifests
    #[arg(long)]
    skip_manifests: bool,

    /// Skip building demo webapp
    #[arg(long)]
    skip_webapp: bool,

    /// Use Vite dev server instead of building and serving static files
    #[arg(long)]
    dev: bool,

    /// Board type to build
    #[arg(long, default_value_t = BoardSelection::default(), value_parser = board_parser())]
    board: BoardSelection,

    /// Project checkout to work in
    #[arg(long, default_value = ".")]
    project_root: PathBuf,

    /// What to do when a firmware or webapp build fails
    #[arg(long, value_enum, default_value_t = OnFailure::Prompt)]
    on_failure: OnFailure,

    /// Assemble the demo tree but do not start the server
    #[arg(long)]
    no_serve: bool,
}

/// Accepts the catalog's board ids plus `all`.
fn board_parser() -> impl TypedValueParser<Value = BoardSelection> {
    PossibleValuesParser::new(BoardSelection::choices())
        .try_map(|choice| choice.parse::<BoardSelection>())
}

#[derive(Clone, Copy, ValueEnum)]
enum OnFailure {
    Prompt,
    Continue,
    Abort,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG")
            .unwrap_or_else(|_| "photoframe_demo=info,launch_demo=info,tower_http=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing();

    let project_root = std::fs::canonicalize(&cli.project_root)?;
    let config = LauncherConfig::from_env(project_root);

    let options = PipelineOptions {
        boards: cli.board,
        skip_build: cli.skip_build,
        skip_download: cli.skip_download,
        skip_copy: cli.skip_copy,
        skip_manifests: cli.skip_manifests,
        skip_webapp: cli.skip_webapp,
        dev: cli.dev,
        serve: !cli.no_serve,
        port: cli.port,
    };

    tracing::info!("ESP32 PhotoFrame Demo Launcher");
    tracing::info!("Project root: {}", config.project_root.display());

    let pipeline = match cli.on_failure {
        OnFailure::Prompt => Pipeline::new(config, PromptPolicy),
        OnFailure::Continue => Pipeline::new(config, ContinuePolicy),
        OnFailure::Abort => Pipeline::new(config, AbortPolicy),
    };

    let report = pipeline.run(&options).await?;
    report.log_summary();

    Ok(ExitCode::from(report.exit_code()))
}
