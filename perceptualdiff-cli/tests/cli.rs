//! Integration tests for the perceptualdiff CLI.

use std::path::{Path, PathBuf};
use std::process::Command;

/// Get path to the perceptualdiff binary.
fn perceptualdiff_bin() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.pop(); // up from perceptualdiff-cli to the workspace root
    path.push("target");
    path.push(if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    });
    path.push(if cfg!(windows) {
        "perceptualdiff.exe"
    } else {
        "perceptualdiff"
    });
    path
}

/// Uniquely-named scratch directory for one test's image files, removed
/// again when the test finishes (including on assertion failure).
struct ScratchDir(PathBuf);

impl ScratchDir {
    fn new(name: &str) -> Self {
        static COUNTER: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);
        let serial = COUNTER.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system clock before epoch")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!(
            "perceptualdiff-cli-{}-{}-{}-{}",
            name,
            std::process::id(),
            nanos,
            serial
        ));
        std::fs::create_dir_all(&dir).expect("create scratch dir");
        Self(dir)
    }

    fn join(&self, file: &str) -> PathBuf {
        self.0.join(file)
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

fn scratch_dir(name: &str) -> ScratchDir {
    ScratchDir::new(name)
}

fn write_png(path: &Path, width: u32, height: u32, pixel: impl Fn(u32, u32) -> [u8; 3]) {
    let mut img = image::RgbImage::new(width, height);
    for (x, y, p) in img.enumerate_pixels_mut() {
        *p = image::Rgb(pixel(x, y));
    }
    img.save(path).expect("write png");
}

fn run(args: &[&str]) -> std::process::Output {
    Command::new(perceptualdiff_bin())
        .args(args)
        .output()
        .expect("run perceptualdiff binary")
}

#[test]
fn scratch_dirs_are_unique_and_removed() {
    let first = scratch_dir("unique");
    let second = scratch_dir("unique");
    assert_ne!(first.0, second.0);
    assert!(first.0.is_dir());

    let path = second.0.clone();
    drop(second);
    assert!(!path.exists());
}

#[test]
fn identical_images_pass_binary_identical() {
    let dir = scratch_dir("identical");
    let a = dir.join("a.png");
    let b = dir.join("b.png");
    write_png(&a, 16, 16, |x, y| [(x * 16) as u8, (y * 16) as u8, 128]);
    write_png(&b, 16, 16, |x, y| [(x * 16) as u8, (y * 16) as u8, 128]);

    let out = run(&[a.to_str().unwrap(), b.to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(out.status.success(), "stdout: {stdout}");
    assert!(stdout.contains("PASS: Images are binary identical"));
}

#[test]
fn one_pixel_difference_passes_under_threshold() {
    let dir = scratch_dir("one-pixel");
    let a = dir.join("a.png");
    let b = dir.join("b.png");
    write_png(&a, 16, 16, |_, _| [0, 0, 0]);
    write_png(&b, 16, 16, |x, y| {
        if x == 7 && y == 7 {
            [255, 255, 255]
        } else {
            [0, 0, 0]
        }
    });

    let out = run(&[a.to_str().unwrap(), b.to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(out.status.success(), "stdout: {stdout}");
    assert!(stdout.contains("PASS: Images are perceptually indistinguishable"));
}

#[test]
fn opposite_images_fail_with_pixel_count() {
    let dir = scratch_dir("opposite");
    let a = dir.join("a.png");
    let b = dir.join("b.png");
    write_png(&a, 32, 32, |_, _| [0, 0, 0]);
    write_png(&b, 32, 32, |_, _| [255, 255, 255]);

    let out = run(&[a.to_str().unwrap(), b.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("FAIL: Images are visibly different"));
    assert!(stdout.contains("1024 pixels are different"));
}

#[test]
fn dimension_mismatch_fails() {
    let dir = scratch_dir("dims");
    let a = dir.join("a.png");
    let b = dir.join("b.png");
    write_png(&a, 16, 16, |_, _| [10, 20, 30]);
    write_png(&b, 16, 8, |_, _| [10, 20, 30]);

    let out = run(&[a.to_str().unwrap(), b.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("FAIL: Image dimensions do not match"));
}

#[test]
fn missing_file_reports_error() {
    let dir = scratch_dir("missing");
    let a = dir.join("a.png");
    write_png(&a, 8, 8, |_, _| [0, 0, 0]);
    let missing = dir.join("does-not-exist.png");

    let out = run(&[a.to_str().unwrap(), missing.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(2));
    assert!(!String::from_utf8_lossy(&out.stderr).is_empty());
}

#[test]
fn raised_threshold_turns_fail_into_pass() {
    let dir = scratch_dir("threshold");
    let a = dir.join("a.png");
    let b = dir.join("b.png");
    write_png(&a, 32, 32, |_, _| [0, 0, 0]);
    write_png(&b, 32, 32, |_, _| [255, 255, 255]);

    let out = run(&["-t", "2000", a.to_str().unwrap(), b.to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(out.status.success(), "stdout: {stdout}");
    assert!(stdout.contains("PASS: Images are perceptually indistinguishable"));
}

#[test]
fn json_output_carries_verdict_and_count() {
    let dir = scratch_dir("json");
    let a = dir.join("a.png");
    let b = dir.join("b.png");
    write_png(&a, 32, 32, |_, _| [0, 0, 0]);
    write_png(&b, 32, 32, |_, _| [255, 255, 255]);

    let out = run(&["--json", a.to_str().unwrap(), b.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&out.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("valid json");
    assert_eq!(parsed["verdict"], "fail");
    assert_eq!(parsed["failed_pixels"], 1024);
    assert_eq!(parsed["width"], 32);
    assert_eq!(parsed["params"]["threshold_pixels"], 100);
}

#[test]
fn verbose_prints_configuration() {
    let dir = scratch_dir("verbose");
    let a = dir.join("a.png");
    write_png(&a, 8, 8, |_, _| [50, 50, 50]);

    let out = run(&["-v", a.to_str().unwrap(), a.to_str().unwrap()]);
    assert!(out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Field of view is 45 degrees"));
    assert!(stderr.contains("Threshold pixels is 100 pixels"));
}
