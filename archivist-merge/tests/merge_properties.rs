//! End-to-end merge properties: SizePolicy + Merger over real files.

use std::fs;
use std::path::PathBuf;

use archivist_core::DEFAULT_SIZE_THRESHOLD_BYTES;
use archivist_merge::{ArchivePlan, Merger, SizePolicy};
use assert_fs::prelude::*;
use predicates::prelude::*;
use rstest::rstest;

fn jsonl(lines: &[&str]) -> String {
    lines.iter().map(|l| format!("{l}\n")).collect()
}

fn run_merge(
    dir: &assert_fs::TempDir,
    archive: Option<&[&str]>,
    inputs: &[&[&str]],
    threshold: u64,
) -> (String, ArchivePlan) {
    let existing = dir.child("existing/processed_data.json");
    if let Some(lines) = archive {
        existing.write_str(&jsonl(lines)).unwrap();
    }
    let mut paths = Vec::new();
    for (i, lines) in inputs.iter().enumerate() {
        let input = dir.child(format!("data/{i:02}.json"));
        input.write_str(&jsonl(lines)).unwrap();
        paths.push(input.path().to_path_buf());
    }

    let out_dir = dir.child("kaggle_data");
    let plan = SizePolicy::new(threshold)
        .decide(
            Some(existing.path()),
            &out_dir.path().join("chunked_data.json"),
        )
        .unwrap();
    let output = out_dir.path().join("processed_data.json");
    Merger::new(1).merge(&plan, &paths, &output).unwrap();
    (fs::read_to_string(output).unwrap(), plan)
}

#[test]
fn archive_example_drops_duplicate_and_sentinel() {
    let dir = assert_fs::TempDir::new().unwrap();
    let (out, plan) = run_merge(
        &dir,
        Some(&[r#"{"id":2,"v":"a"}"#][..]),
        &[&[r#"{"id":2,"v":"a"}"#, r#"{"id":1}"#, r#"{"id":3,"v":"b"}"#][..]],
        DEFAULT_SIZE_THRESHOLD_BYTES,
    );
    assert_eq!(plan.label(), "stream-and-dedup");
    assert_eq!(out, jsonl(&[r#"{"id":2,"v":"a"}"#, r#"{"id":3,"v":"b"}"#]));
}

#[test]
fn same_record_in_two_files_is_written_once() {
    let dir = assert_fs::TempDir::new().unwrap();
    let (out, plan) = run_merge(
        &dir,
        None,
        &[&[r#"{"id":5}"#][..], &[r#"{"id":5}"#][..]],
        DEFAULT_SIZE_THRESHOLD_BYTES,
    );
    assert_eq!(plan, ArchivePlan::Empty);
    assert_eq!(out, jsonl(&[r#"{"id":5}"#]));
}

#[test]
fn merge_is_idempotent_without_archive() {
    let first_dir = assert_fs::TempDir::new().unwrap();
    let second_dir = assert_fs::TempDir::new().unwrap();
    let inputs: &[&[&str]] = &[
        &[r#"{"id":5,"p":1}"#, r#"{"id":6}"#][..],
        &[r#"{"id":6}"#, r#"{"p":1,"id":5}"#, r#"{"id":7}"#][..],
    ];

    let (first, _) = run_merge(&first_dir, None, inputs, DEFAULT_SIZE_THRESHOLD_BYTES);
    let (second, _) = run_merge(&second_dir, None, inputs, DEFAULT_SIZE_THRESHOLD_BYTES);
    assert_eq!(first, second);
}

#[rstest]
#[case::archive_first(
    Some(&[r#"{"id":10}"#, r#"{"id":11}"#][..]),
    &[&[r#"{"id":12}"#, r#"{"id":10}"#][..], &[r#"{"id":13}"#, r#"{"id":11}"#][..]][..],
    &[r#"{"id":10}"#, r#"{"id":11}"#, r#"{"id":12}"#, r#"{"id":13}"#][..]
)]
#[case::file_order_wins(
    None,
    &[&[r#"{"id":22}"#][..], &[r#"{"id":21}"#, r#"{"id":22}"#][..], &[r#"{"id":20}"#][..]][..],
    &[r#"{"id":22}"#, r#"{"id":21}"#, r#"{"id":20}"#][..]
)]
#[case::sentinel_only_input(
    None,
    &[&[r#"{"id":1}"#, r#"{"id":1,"result":null}"#][..]][..],
    &[] as &[&str]
)]
#[case::archive_sentinel_survives(
    Some(&[r#"{"id":1}"#][..]),
    &[&[r#"{"id":1}"#, r#"{"id":2}"#][..]][..],
    &[r#"{"id":1}"#, r#"{"id":2}"#][..]
)]
fn first_seen_order_is_preserved(
    #[case] archive: Option<&[&str]>,
    #[case] inputs: &[&[&str]],
    #[case] expected: &[&str],
) {
    let dir = assert_fs::TempDir::new().unwrap();
    let (out, _) = run_merge(&dir, archive, inputs, DEFAULT_SIZE_THRESHOLD_BYTES);
    assert_eq!(out, jsonl(expected));
}

#[test]
fn oversized_archive_is_chunked_and_not_deduplicated_against() {
    let dir = assert_fs::TempDir::new().unwrap();
    let archive_lines = [r#"{"id":2,"v":"a"}"#, r#"{"id":3}"#];
    let (out, plan) = run_merge(
        &dir,
        Some(&archive_lines[..]),
        &[&[r#"{"id":2,"v":"a"}"#, r#"{"id":4}"#][..]],
        8,
    );

    assert_eq!(plan.label(), "preserve-as-chunk");
    dir.child("existing/processed_data.json")
        .assert(predicate::path::missing());
    dir.child("kaggle_data/chunked_data.json")
        .assert(jsonl(&archive_lines));
    // New records are only deduplicated among themselves.
    assert_eq!(out, jsonl(&[r#"{"id":2,"v":"a"}"#, r#"{"id":4}"#]));
}

#[test]
#[cfg(unix)]
fn two_gib_archive_is_moved_without_being_read() {
    let dir = assert_fs::TempDir::new().unwrap();
    let existing = dir.child("existing/processed_data.json");
    existing.touch().unwrap();
    // Sparse file: NUL bytes would fail to parse if the merger ever read them.
    let two_gib = 2 * 1024 * 1024 * 1024u64;
    fs::OpenOptions::new()
        .write(true)
        .open(existing.path())
        .unwrap()
        .set_len(two_gib)
        .unwrap();

    let chunk: PathBuf = dir.path().join("kaggle_data/chunked_data.json");
    let plan = SizePolicy::new(DEFAULT_SIZE_THRESHOLD_BYTES)
        .decide(Some(existing.path()), &chunk)
        .unwrap();
    assert_eq!(
        plan,
        ArchivePlan::Chunked {
            chunk: chunk.clone(),
            size: two_gib
        }
    );

    let input = dir.child("data/00.json");
    input.write_str("{\"id\":3}\n").unwrap();
    let output = dir.path().join("kaggle_data/processed_data.json");
    Merger::new(1)
        .merge(&plan, &[input.path().to_path_buf()], &output)
        .unwrap();

    assert_eq!(fs::metadata(&chunk).unwrap().len(), two_gib);
    existing.assert(predicate::path::missing());
    assert_eq!(fs::read_to_string(output).unwrap(), "{\"id\":3}\n");
}
