use std::path::Path;

use assert_cmd::Command;
use image::{ImageBuffer, Rgb};
use predicates::prelude::*;
use tempfile::TempDir;

fn write_png(path: &Path, width: u32, height: u32) {
    ImageBuffer::from_fn(width, height, |x, y| Rgb([(x * 7) as u8, (y * 3) as u8, 128]))
        .save(path)
        .unwrap();
}

/// Scratch workspace with `in/` holding `count` 120x80 PNGs; logs land in the root
fn workspace(count: usize) -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join("in")).unwrap();
    for i in 0..count {
        write_png(&dir.path().join("in").join(format!("img_{i}.png")), 120, 80);
    }
    dir
}

fn thumbnailer(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("thumbnailer").unwrap();
    cmd.current_dir(dir.path()).arg("--no-progress");
    cmd
}

#[test]
fn test_resizes_directory_and_writes_report() {
    let dir = workspace(3);

    thumbnailer(&dir)
        .args(["-i", "in", "-o", "out/thumbs", "-w", "60", "-p", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Processing Summary"));

    for i in 0..3 {
        let thumb = image::open(dir.path().join(format!("out/thumbs/img_{i}.jpeg"))).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (60, 40));
    }

    let report = std::fs::read_to_string(dir.path().join("out/thumbs/summary_report.txt")).unwrap();
    assert!(report.starts_with("Summary Report:\nTotal images processed: 3\n"));
    assert!(dir.path().join("processing.log").exists());
}

#[test]
fn test_bad_files_do_not_fail_the_run() {
    let dir = workspace(2);
    std::fs::write(dir.path().join("in/notes.txt"), "not an image").unwrap();

    thumbnailer(&dir)
        .args(["-i", "in", "-o", "out", "-H", "40", "-f", "png", "--retries", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("notes.txt"));

    let report = std::fs::read_to_string(dir.path().join("out/summary_report.txt")).unwrap();
    assert!(report.contains("Successfully processed: 2\n"));
    assert!(report.contains("Errors encountered: 1\n"));
    assert!(dir.path().join("out/img_0.png").exists());
}

#[test]
fn test_json_summary_on_stdout() {
    let dir = workspace(2);

    let output = thumbnailer(&dir)
        .args(["-i", "in", "-o", "out", "-w", "30", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["total"], 2);
    assert_eq!(summary["successful"], 2);
    assert_eq!(summary["errors"], 0);
    assert_eq!(summary["durations_secs"].as_array().unwrap().len(), 2);
}

#[test]
fn test_config_file_with_cli_override() {
    let dir = workspace(1);
    std::fs::write(
        dir.path().join("thumbs.toml"),
        "input = \"in\"\noutput = \"out\"\nwidth = 100\nformat = \"bmp\"\n",
    )
    .unwrap();

    thumbnailer(&dir)
        .args(["-C", "thumbs.toml", "-w", "24"])
        .assert()
        .success();

    let thumb = image::open(dir.path().join("out/img_0.bmp")).unwrap();
    assert_eq!(thumb.width(), 24);
}

#[test]
fn test_setup_errors_exit_non_zero() {
    let dir = workspace(1);

    thumbnailer(&dir)
        .args(["-i", "missing", "-o", "out", "-w", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));

    thumbnailer(&dir)
        .args(["-i", "in", "-o", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("width").or(predicate::str::contains("height")));

    thumbnailer(&dir)
        .args(["-i", "in", "-o", "out", "-w", "10", "-p", "0"])
        .assert()
        .failure();

    thumbnailer(&dir)
        .args(["-i", "in", "-o", "out", "-w", "10", "-p", "18446744073709551615"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Parallelism must be at most"));

    assert!(!dir.path().join("out/summary_report.txt").exists());
}

#[test]
fn test_unknown_format_fails_every_image_but_not_the_run() {
    let dir = workspace(2);

    thumbnailer(&dir)
        .args(["-i", "in", "-o", "out", "-w", "10", "-f", "tiff"])
        .assert()
        .success();

    let report = std::fs::read_to_string(dir.path().join("out/summary_report.txt")).unwrap();
    assert!(report.contains("Errors encountered: 2\n"));
}
