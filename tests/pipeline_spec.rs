//! End-to-end runs of the stage pipeline with shell stand-ins for external tools.

use std::net::TcpListener;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum_test::TestServer;
use photoframe_demo::config::LauncherConfig;
use photoframe_demo::models::*;
use photoframe_demo::pipeline::*;
use photoframe_demo::server::{DemoServer, ALLOW_ORIGIN, CACHE_CONTROL};
use photoframe_demo::LaunchError;

const ALIAS: &str = "esp32-photoframe";

fn write_script(root: &Path, name: &str, body: &str) -> String {
    let path = root.join(name);
    std::fs::write(&path, body).unwrap();
    path.display().to_string()
}

/// Project with a sample image and no generator, webapp, or git history.
fn bare_project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join(".img")).unwrap();
    std::fs::write(dir.path().join(".img/sample.jpg"), b"jpeg").unwrap();
    dir
}

fn failing_idf(root: &Path) -> LauncherConfig {
    let idf = write_script(root, "idf.sh", "echo 'region `iram0_0_seg` overflowed' >&2\nexit 1\n");
    LauncherConfig::new(root)
        // Unreachable release host, so any download attempt fails fast.
        .with_release_url("http://127.0.0.1:9")
        .with_idf_command(["sh".to_string(), idf])
}

fn assemble_only() -> PipelineOptions {
    PipelineOptions {
        serve: false,
        skip_webapp: true,
        ..PipelineOptions::default()
    }
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port()
}

#[tokio::test]
async fn assembled_tree_serves_alias_without_manifest() {
    let dir = bare_project();
    let config = LauncherConfig::new(dir.path()).with_release_url("http://127.0.0.1:9");
    let options = PipelineOptions {
        skip_build: true,
        ..assemble_only()
    };

    let report = Pipeline::new(config.clone(), AbortPolicy)
        .run(&options)
        .await
        .unwrap();

    assert!(!report.aborted());
    assert_eq!(report.exit_code(), 0);
    assert!(!report.ran(Stage::BuildFirmware));
    assert!(matches!(
        report.outcome(Stage::DownloadStable),
        Some(StageOutcome::Failed(LaunchError::NoReleaseFound))
    ));
    assert!(report.outcome(Stage::CopyAssets).unwrap().is_success());
    assert!(matches!(
        report.outcome(Stage::GenerateManifests),
        Some(StageOutcome::Failed(LaunchError::ManifestGeneratorMissing(_)))
    ));
    assert!(dir.path().join("demo/sample.jpg").exists());

    let mut server = DemoServer::new(&config);
    let prepared = server.prepare(free_port()).unwrap();
    let app = TestServer::new(server.router(&prepared)).unwrap();

    let manifest = app.get(&format!("/{ALIAS}/manifest.json")).await;
    manifest.assert_status_not_found();

    let index = app.get(&format!("/{ALIAS}/")).await;
    index.assert_status_ok();
    index.assert_header("access-control-allow-origin", ALLOW_ORIGIN);
    index.assert_header("cache-control", CACHE_CONTROL);
    assert!(index.text().contains("sample.jpg"));
}

#[tokio::test]
async fn abort_policy_stops_after_first_build_failure() {
    let dir = bare_project();
    let options = PipelineOptions {
        boards: BoardSelection::All,
        ..assemble_only()
    };

    let report = Pipeline::new(failing_idf(dir.path()), AbortPolicy)
        .run(&options)
        .await
        .unwrap();

    assert_eq!(report.aborted_at, Some(Stage::BuildFirmware));
    assert_eq!(report.exit_code(), 1);
    assert_eq!(report.stages.len(), 1);
    match report.outcome(Stage::BuildFirmware) {
        Some(StageOutcome::PartialFailure(errors)) => {
            assert_eq!(errors.len(), 1);
            assert!(matches!(
                errors[0],
                LaunchError::BuildFailed { board: Board::WavesharePhotopainter73, .. }
            ));
            assert_eq!(errors[0].diagnostics(), ["region `iram0_0_seg` overflowed".to_string()]);
        }
        other => panic!("unexpected build outcome: {other:?}"),
    }
    assert!(!dir.path().join("demo/sample.jpg").exists());
}

#[tokio::test]
async fn continuing_past_build_failures_runs_remaining_stages() {
    let dir = bare_project();
    let asked = Arc::new(AtomicUsize::new(0));
    let counter = asked.clone();
    let policy = move |stage: Stage, _: &LaunchError| {
        assert_eq!(stage, Stage::BuildFirmware);
        counter.fetch_add(1, Ordering::SeqCst);
        true
    };
    let options = PipelineOptions {
        boards: BoardSelection::All,
        skip_download: true,
        ..assemble_only()
    };

    let report = Pipeline::new(failing_idf(dir.path()), policy)
        .run(&options)
        .await
        .unwrap();

    assert_eq!(asked.load(Ordering::SeqCst), 2);
    assert!(!report.aborted());
    assert!(matches!(
        report.outcome(Stage::BuildFirmware),
        Some(StageOutcome::PartialFailure(errors)) if errors.len() == 2
    ));
    assert!(report.ran(Stage::StageDevFirmware));
    assert!(report.ran(Stage::CopyAssets));
    assert!(report.ran(Stage::GenerateManifests));
    assert!(dir.path().join("demo/sample.jpg").exists());
}

#[tokio::test]
async fn webapp_failure_goes_through_the_policy() {
    let dir = bare_project();
    let config = LauncherConfig::new(dir.path());
    let options = PipelineOptions {
        skip_build: true,
        skip_download: true,
        skip_webapp: false,
        serve: false,
        ..PipelineOptions::default()
    };

    let report = Pipeline::new(config, AbortPolicy).run(&options).await.unwrap();

    assert_eq!(report.aborted_at, Some(Stage::BuildWebapp));
    assert!(matches!(
        report.outcome(Stage::BuildWebapp),
        Some(StageOutcome::Failed(LaunchError::WebappBuildFailed { .. }))
    ));
}

#[tokio::test]
async fn dev_mode_hands_off_and_skips_static_build() {
    let dir = bare_project();
    std::fs::create_dir_all(dir.path().join("webapp")).unwrap();
    let npm = write_script(dir.path(), "npm.sh", "echo \"$@\" >> calls.txt\n");
    let config = LauncherConfig::new(dir.path()).with_npm_command(["sh".to_string(), npm]);
    let options = PipelineOptions {
        skip_build: true,
        skip_download: true,
        skip_copy: true,
        skip_manifests: true,
        dev: true,
        ..PipelineOptions::default()
    };

    let report = Pipeline::new(config, AbortPolicy).run(&options).await.unwrap();

    assert!(report.outcome(Stage::DevServer).unwrap().is_success());
    assert!(!report.ran(Stage::BuildWebapp));
    assert!(!report.ran(Stage::Serve));
    let calls = std::fs::read_to_string(dir.path().join("webapp/calls.txt")).unwrap();
    assert_eq!(calls, "run dev:demo\n");
}

#[tokio::test]
async fn built_firmware_is_staged_as_dev_image() {
    let dir = bare_project();
    let idf = write_script(dir.path(), "idf.sh", "exit 0\n");
    std::fs::create_dir_all(dir.path().join("scripts")).unwrap();
    write_script(
        dir.path(),
        "scripts/generate_manifests.py",
        r#"while [ $# -gt 0 ]; do
  case "$1" in
    --board) board="$2"; shift;;
    --demo-dir) out="$2"; shift;;
    --dev) dev=1;;
  esac
  shift
done
if [ -z "$dev" ]; then
  printf 'built %s' "$board" > "$out/photoframe-firmware-$board-merged.bin"
fi
printf '{"board":"%s"}' "$board" > "$out/manifest.json"
printf '{"board":"%s","dev":true}' "$board" > "$out/manifest-dev.json"
"#,
    );
    let config = LauncherConfig::new(dir.path())
        .with_idf_command(["sh".to_string(), idf])
        .with_python_command(["sh"]);
    let options = PipelineOptions {
        boards: BoardSelection::One(Board::SeeedstudioXiaoEe02),
        skip_download: true,
        ..assemble_only()
    };

    let report = Pipeline::new(config, AbortPolicy).run(&options).await.unwrap();

    assert!(report.outcome(Stage::BuildFirmware).unwrap().is_success());
    assert!(report.outcome(Stage::StageDevFirmware).unwrap().is_success());
    assert!(report.outcome(Stage::GenerateManifests).unwrap().is_success());

    let demo = dir.path().join("demo");
    let dev = Artifact::new(Board::SeeedstudioXiaoEe02, ArtifactVariant::DevCopy).path(&demo);
    assert_eq!(std::fs::read_to_string(dev).unwrap(), "built seeedstudio_xiao_ee02");
    // Manifests cover the whole catalog; the root mirrors the first board.
    assert_eq!(
        std::fs::read(demo.join("manifest.json")).unwrap(),
        std::fs::read(demo.join("waveshare_photopainter_73/manifest.json")).unwrap()
    );
}
