use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use signclip::adapters::MockMediaAdapter;
use tempfile::TempDir;

/// `signclip` running inside `dir` against the mock media backend
fn signclip(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("signclip").unwrap();
    cmd.current_dir(dir)
        .env("SIGNCLIP_MEDIA_BACKEND", "mock")
        .env_remove("SIGNCLIP_USER")
        .env_remove("RUST_LOG")
        .arg("--database")
        .arg(dir.join("signclip.db"))
        .arg("--media-root")
        .arg(dir.join("media"));
    cmd
}

fn write_clip(dir: &Path, name: &str, duration: f64) -> std::path::PathBuf {
    let path = dir.join(format!("{}.mp4", name));
    MockMediaAdapter::write_clip(&path, name, duration).unwrap();
    path
}

#[test]
fn test_resolve_reports_neighbours() {
    let dir = TempDir::new().unwrap();
    signclip(dir.path())
        .args(["resolve", "TVRI_SB_061119_0052.mp4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("collection TVRI_SB_061119, ordinal 52"))
        .stdout(predicate::str::contains("TVRI_SB_061119_0053"))
        .stdout(predicate::str::contains("TVRI_SB_061119_0051"));
}

#[test]
fn test_malformed_identifier_fails() {
    let dir = TempDir::new().unwrap();
    signclip(dir.path())
        .args(["resolve", "abcxyz"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed identifier"));

    signclip(dir.path())
        .args(["--json", "resolve", "abcxyz"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"error\":\"malformed_identifier\""));
}

#[test]
fn test_config_init_and_show() {
    let dir = TempDir::new().unwrap();
    signclip(dir.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("signclip.toml"));
    assert!(dir.path().join("signclip.toml").exists());

    signclip(dir.path())
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    signclip(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[media]"))
        .stdout(predicate::str::contains("backend = \"mock\""));
}

#[test]
fn test_invalid_backend_is_rejected() {
    let dir = TempDir::new().unwrap();
    signclip(dir.path())
        .env("SIGNCLIP_MEDIA_BACKEND", "gstreamer")
        .args(["collections"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("media.backend"));
}

#[test]
fn test_upload_stitch_cut_annotate_flow() {
    let dir = TempDir::new().unwrap();
    let first = write_clip(dir.path(), "K_0001", 10.0);
    let second = write_clip(dir.path(), "K_0002", 8.0);

    for clip in [&first, &second] {
        signclip(dir.path())
            .arg("upload")
            .arg(clip)
            .assert()
            .success()
            .stdout(predicate::str::starts_with("Uploaded K_000"));
    }

    signclip(dir.path())
        .args(["upload"])
        .arg(&first)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Duplicate segment"));

    signclip(dir.path())
        .args(["stitch", "K_0001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Boundary at 00:10.000"));

    signclip(dir.path())
        .args(["cut", "K_0001", "--start", "3", "--end", "00:12"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Remainder pushed into videos/K_0002.mp4"));

    signclip(dir.path())
        .args(["cut", "K_0001", "--start", "5", "--end", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid range"));

    signclip(dir.path())
        .args(["annotate", "K_0001", "--transcript", "selamat pagi", "--user", "ana"])
        .assert()
        .success();

    signclip(dir.path())
        .args(["--json", "show", "K_0001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"transcript\": \"selamat pagi\""))
        .stdout(predicate::str::contains("\"stitched_preview\": null"));

    signclip(dir.path())
        .args(["next", "K_0001", "--unannotated"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Segment:        K_0002"));

    signclip(dir.path())
        .args(["stats", "--user", "ana"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Segments:         2"))
        .stdout(predicate::str::contains("Annotated by ana: 1"));
}

#[test]
fn test_collections_and_export_as_json() {
    let dir = TempDir::new().unwrap();
    let clip = write_clip(dir.path(), "L_0004", 3.0);
    signclip(dir.path()).arg("upload").arg(&clip).assert().success();

    signclip(dir.path())
        .args(["--json", "collections"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"collection_key\": \"L\""))
        .stdout(predicate::str::contains("\"segment_count\": 1"));

    let export = dir.path().join("export.json");
    signclip(dir.path())
        .arg("export")
        .arg("--output")
        .arg(&export)
        .assert()
        .success();

    let rows: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(export).unwrap()).unwrap();
    assert_eq!(rows[0]["identifier"], "L_0004");
    assert_eq!(rows[0]["is_annotated"], false);
}
