use assert_cmd::Command;
use assert_fs::prelude::*;
use predicates::prelude::*;

fn archivist() -> Command {
    let mut cmd = Command::cargo_bin("archivist").expect("archivist binary");
    cmd.env("RUST_LOG", "warn");
    cmd
}

const REMOVE_ARCHIVER: &str = "\
trigger_threshold: 1
archiver:
  kind: remove
dataset:
  title: btcf-ob
  owner: capture
";

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

#[test]
fn init_writes_default_config_once() {
    let root = assert_fs::TempDir::new().unwrap();

    archivist()
        .args(["init", "--root"])
        .arg(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("archivist.yaml"));
    root.child("archivist.yaml")
        .assert(predicate::str::contains("trigger_threshold: 10"));

    archivist()
        .args(["init", "--root"])
        .arg(root.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    archivist()
        .args(["init", "--force", "--root"])
        .arg(root.path())
        .assert()
        .success();
}

// ---------------------------------------------------------------------------
// merge
// ---------------------------------------------------------------------------

#[test]
fn merge_dedups_and_drops_sentinels() {
    let dir = assert_fs::TempDir::new().unwrap();
    let archive = dir.child("archive.json");
    archive.write_str("{\"id\":1,\"v\":\"kept\"}\n{\"id\":2}\n").unwrap();
    let input = dir.child("new.json");
    input
        .write_str("{\"id\":1}\n{\"id\":2}\n{\"b\":2,\"a\":1}\n{\"a\":1,\"b\":2}\n")
        .unwrap();
    let out = dir.child("out/merged.json");

    archivist()
        .arg("merge")
        .arg("--output")
        .arg(out.path())
        .arg("--archive")
        .arg(archive.path())
        .arg(input.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("wrote 3 record(s)"));

    out.assert("{\"id\":1,\"v\":\"kept\"}\n{\"id\":2}\n{\"b\":2,\"a\":1}\n");
}

#[test]
fn merge_json_reports_per_source_stats() {
    let dir = assert_fs::TempDir::new().unwrap();
    let a = dir.child("a.json");
    a.write_str("{\"id\":2}\n{\"id\":2}\n").unwrap();
    let out = dir.child("merged.json");

    let output = archivist()
        .args(["merge", "--json", "--output"])
        .arg(out.path())
        .arg(a.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["sources"][0]["kind"], "input");
    assert_eq!(stats["sources"][0]["written"], 1);
    assert_eq!(stats["sources"][0]["duplicates"], 1);
}

#[test]
fn merge_fails_on_malformed_line() {
    let dir = assert_fs::TempDir::new().unwrap();
    let bad = dir.child("bad.json");
    bad.write_str("{\"id\":2}\nnot json\n").unwrap();

    archivist()
        .args(["merge", "--output"])
        .arg(dir.child("merged.json").path())
        .arg(bad.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("bad.json:2"));
}

#[test]
fn merge_refuses_to_overwrite_its_archive() {
    let dir = assert_fs::TempDir::new().unwrap();
    let archive = dir.child("archive.json");
    archive.write_str("{\"id\":2}\n{\"id\":3}\n").unwrap();
    let input = dir.child("new.json");
    input.write_str("{\"id\":4}\n").unwrap();

    archivist()
        .arg("merge")
        .arg("--output")
        .arg(archive.path())
        .arg("--archive")
        .arg(archive.path())
        .arg(input.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("also a merge source"));
    archive.assert("{\"id\":2}\n{\"id\":3}\n");
}

#[test]
fn merge_requires_inputs() {
    archivist()
        .args(["merge", "--output", "out.json"])
        .assert()
        .failure();
}

// ---------------------------------------------------------------------------
// run / status
// ---------------------------------------------------------------------------

#[test]
fn run_below_threshold_does_nothing() {
    let root = assert_fs::TempDir::new().unwrap();
    root.child("archivist.yaml").write_str(REMOVE_ARCHIVER).unwrap();
    root.child("data/a.json").write_str("{\"id\":2}\n").unwrap();

    archivist()
        .args(["run", "--root"])
        .arg(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to do"));

    root.child("data/a.json").assert(predicate::path::exists());
    root.child("published").assert(predicate::path::missing());
}

#[test]
fn run_publishes_and_prunes() {
    let root = assert_fs::TempDir::new().unwrap();
    root.child("archivist.yaml").write_str(REMOVE_ARCHIVER).unwrap();
    root.child("data/a.json")
        .write_str("{\"id\":2}\n{\"id\":1}\n")
        .unwrap();
    root.child("data/b.json")
        .write_str("{\"id\":2}\n{\"id\":3}\n")
        .unwrap();

    archivist()
        .args(["run", "--root"])
        .arg(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("published to").and(predicate::str::contains("pruned 2")));

    let version = root.child("published/capture/btcf-ob/v0001");
    version
        .child("processed_data.json")
        .assert("{\"id\":2}\n{\"id\":3}\n");
    version
        .child("dataset-metadata.json")
        .assert(predicate::str::contains("capture/btcf-ob"));
    root.child("data/a.json").assert(predicate::path::missing());
    root.child("data/b.json").assert(predicate::path::missing());
    root.child("data/kaggle_data").assert(predicate::path::missing());
}

#[test]
fn run_dry_run_json_touches_nothing() {
    let root = assert_fs::TempDir::new().unwrap();
    root.child("archivist.yaml").write_str(REMOVE_ARCHIVER).unwrap();
    root.child("data/a.json").write_str("{\"id\":2}\n").unwrap();
    root.child("data/b.json").write_str("{\"id\":3}\n").unwrap();

    let output = archivist()
        .args(["run", "--dry-run", "--json", "--root"])
        .arg(root.path())
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["outcome"], "dry_run");
    assert_eq!(report["pending"].as_array().map(Vec::len), Some(2));
    assert_eq!(report["decision"]["decision"], "no_archive");

    root.child("data/a.json").assert(predicate::path::exists());
    root.child("data/kaggle_data").assert(predicate::path::missing());
}

#[test]
fn run_threshold_flag_overrides_config() {
    let root = assert_fs::TempDir::new().unwrap();
    root.child("archivist.yaml").write_str(REMOVE_ARCHIVER).unwrap();
    root.child("data/a.json").write_str("{\"id\":2}\n").unwrap();

    archivist()
        .args(["run", "--dry-run", "--threshold", "0", "--root"])
        .arg(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("[dry-run] 1 pending"));
}

#[test]
fn status_json_lists_pending() {
    let root = assert_fs::TempDir::new().unwrap();
    root.child("data/a.json").write_str("{\"id\":2}\n").unwrap();
    root.child("data/notes.txt").write_str("ignored").unwrap();

    let output = archivist()
        .args(["status", "--json", "--root"])
        .arg(root.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["pending"].as_array().map(Vec::len), Some(1));
    assert_eq!(report["pending"][0]["bytes"], 9);
    assert_eq!(report["trigger_threshold"], 10);
    assert_eq!(report["would_run"], false);
    assert_eq!(report["source"], "none");
}
