use assert_cmd::Command;
use image::{Rgba, RgbaImage};
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Transparent square canvas with an opaque block at (x, y).
fn sprite(canvas: u32, x: u32, y: u32, size: u32) -> RgbaImage {
    RgbaImage::from_fn(canvas, canvas, |px, py| {
        if px >= x && px < x + size && py >= y && py < y + size {
            Rgba([30, 200, 90, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

fn write_png(path: &Path, image: &RgbaImage) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    image.save(path).unwrap();
}

/// `in/menu/idle_hover.png` + `in/menu/idle_idle.png`, offset from each other.
fn hover_idle_tree() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_png(&tmp.path().join("in/menu/idle_hover.png"), &sprite(20, 2, 3, 10));
    write_png(&tmp.path().join("in/menu/idle_idle.png"), &sprite(20, 7, 8, 10));
    tmp
}

fn autocrop(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("autocrop").unwrap();
    cmd.current_dir(cwd);
    cmd
}

fn dimensions(path: &Path) -> (u32, u32) {
    image::open(path).unwrap().to_rgba8().dimensions()
}

#[test]
fn outputs_tool_name() {
    let tmp = TempDir::new().unwrap();
    autocrop(tmp.path())
        .arg("-V")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("autocrop "));
}

// ============================================================================
// Cropping
// ============================================================================

#[test]
fn group_mode_writes_hover_idle_manifest() {
    let tmp = hover_idle_tree();
    autocrop(tmp.path())
        .args(["-i", "in", "-o", "out", "-g"])
        .assert()
        .success();

    let out = tmp.path().join("out/menu");
    assert_eq!(dimensions(&out.join("idle_hover.png")), (15, 15));
    assert_eq!(dimensions(&out.join("idle_idle.png")), (15, 15));

    let hover = std::path::absolute(out.join("idle_hover.png")).unwrap();
    let idle = std::path::absolute(out.join("idle_idle.png")).unwrap();
    let manifest = fs::read_to_string(out.join("coords.txt")).unwrap();
    assert_eq!(
        manifest,
        format!(
            "    imagebutton:\n        hover \"{}\"\n        idle \"{}\"\n        xpos 7 ypos 8 focus_mask True\n",
            hover.display(),
            idle.display()
        )
    );
}

#[test]
fn single_mode_crops_tightly() {
    let tmp = hover_idle_tree();
    autocrop(tmp.path())
        .args(["-i", "in", "-o", "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cropped 2 images"));

    assert_eq!(dimensions(&tmp.path().join("out/menu/idle_hover.png")), (10, 10));
    assert_eq!(dimensions(&tmp.path().join("out/menu/idle_idle.png")), (10, 10));
}

#[test]
fn border_pads_output() {
    let tmp = hover_idle_tree();
    autocrop(tmp.path())
        .args(["-i", "in", "-o", "out", "--border-width", "2", "--border-height", "1"])
        .assert()
        .success();

    assert_eq!(dimensions(&tmp.path().join("out/menu/idle_hover.png")), (14, 12));
}

#[test]
fn custom_formatting_table_and_manifest_name() {
    let tmp = hover_idle_tree();
    fs::write(
        tmp.path().join("rules.toml"),
        "\"hover\" = \"H {name} {x} {y}\\n\"\n\"png\" = \"P {name} {bx} {by}\\n\"\n",
    )
    .unwrap();

    autocrop(tmp.path())
        .args(["-i", "in", "-o", "out", "-f", "rules.toml", "--output-file-name", "sprites.txt"])
        .assert()
        .success();

    let manifest = fs::read_to_string(tmp.path().join("out/menu/sprites.txt")).unwrap();
    assert_eq!(manifest, "H idle_hover.png 2 3\nP idle_idle.png 17 18\n");
}

#[test]
fn transparent_image_is_skipped_with_success() {
    let tmp = hover_idle_tree();
    write_png(&tmp.path().join("in/menu/ghost.png"), &RgbaImage::new(8, 8));

    autocrop(tmp.path())
        .args(["-i", "in", "-o", "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("skipped 1"))
        .stderr(predicate::str::contains("ghost.png"));

    assert!(!tmp.path().join("out/menu/ghost.png").exists());
    let manifest = fs::read_to_string(tmp.path().join("out/menu/coords.txt")).unwrap();
    assert!(!manifest.contains("ghost.png"));
}

#[test]
fn rerun_overwrites_manifest() {
    let tmp = hover_idle_tree();
    for _ in 0..2 {
        autocrop(tmp.path())
            .args(["-i", "in", "-o", "out", "-g"])
            .assert()
            .success();
    }

    let manifest = fs::read_to_string(tmp.path().join("out/menu/coords.txt")).unwrap();
    assert_eq!(manifest.matches("imagebutton").count(), 1);
}

#[test]
fn input_file_means_its_directory() {
    let tmp = hover_idle_tree();
    autocrop(tmp.path())
        .args(["-i", "in/menu/idle_idle.png", "-o", "out"])
        .assert()
        .success();

    assert!(tmp.path().join("out/idle_hover.png").exists());
    assert!(tmp.path().join("out/coords.txt").exists());
}

// ============================================================================
// Difference mode
// ============================================================================

#[test]
fn difference_lists_enlarged_images_and_writes_nothing() {
    let tmp = hover_idle_tree();
    autocrop(tmp.path())
        .args(["-i", "in", "-o", "out", "-d"])
        .assert()
        .success()
        .stdout(predicate::str::contains("idle_hover.png: 100 px alone, 225 px in group"));

    assert!(!tmp.path().join("out").exists());
}

// ============================================================================
// Output removal
// ============================================================================

#[test]
fn remove_output_clears_stale_files() {
    let tmp = hover_idle_tree();
    write_png(&tmp.path().join("out/stale.png"), &RgbaImage::new(1, 1));

    autocrop(tmp.path())
        .args(["-i", "in", "-o", "out", "--remove-output"])
        .assert()
        .success();

    assert!(!tmp.path().join("out/stale.png").exists());
    assert!(tmp.path().join("out/menu/idle_hover.png").exists());
}

#[test]
fn remove_output_tolerates_missing_directory() {
    let tmp = hover_idle_tree();
    autocrop(tmp.path())
        .args(["-i", "in", "-o", "never-created", "--remove-output", "-d"])
        .assert()
        .success();
}

// ============================================================================
// Configuration errors
// ============================================================================

#[test]
fn invalid_group_regex_fails() {
    let tmp = hover_idle_tree();
    autocrop(tmp.path())
        .args(["-i", "in", "-o", "out", "--regex-group-by", "(unclosed"])
        .assert()
        .failure();

    assert!(!tmp.path().join("out").exists());
}

#[test]
fn group_regex_without_capture_fails() {
    let tmp = hover_idle_tree();
    autocrop(tmp.path())
        .args(["-i", "in", "-o", "out", "--regex-group-by", ".*_hover"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Error: Grouping regex '.*_hover' has no capture group",
        ));
}

#[test]
fn malformed_formatting_table_fails() {
    let tmp = hover_idle_tree();
    fs::write(tmp.path().join("formatting.json"), "{ not json").unwrap();

    autocrop(tmp.path())
        .args(["-i", "in", "-o", "out"])
        .assert()
        .failure();

    assert!(!tmp.path().join("out").exists());
}

#[test]
fn config_error_keeps_previous_output() {
    let tmp = hover_idle_tree();
    write_png(&tmp.path().join("out/menu/idle_hover.png"), &RgbaImage::new(1, 1));
    fs::write(tmp.path().join("formatting.json"), "{ not json").unwrap();

    autocrop(tmp.path())
        .args(["-i", "in", "-o", "out", "--remove-output"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: JSON parse error"));

    assert_eq!(dimensions(&tmp.path().join("out/menu/idle_hover.png")), (1, 1));
}

#[test]
fn rerun_with_transparent_images_clears_manifest() {
    let tmp = hover_idle_tree();
    autocrop(tmp.path())
        .args(["-i", "in", "-o", "out"])
        .assert()
        .success();
    assert!(tmp.path().join("out/menu/coords.txt").exists());

    write_png(&tmp.path().join("in/menu/idle_hover.png"), &RgbaImage::new(20, 20));
    write_png(&tmp.path().join("in/menu/idle_idle.png"), &RgbaImage::new(20, 20));
    autocrop(tmp.path())
        .args(["-i", "in", "-o", "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("skipped 2"));

    assert!(!tmp.path().join("out/menu/coords.txt").exists());
}

#[test]
fn unknown_placeholder_in_table_fails() {
    let tmp = hover_idle_tree();
    fs::write(tmp.path().join("formatting.json"), r#"{"png": "{width}"}"#).unwrap();

    autocrop(tmp.path())
        .args(["-i", "in", "-o", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("width"));
}

#[test]
fn missing_input_directory_fails() {
    let tmp = TempDir::new().unwrap();
    autocrop(tmp.path())
        .args(["-i", "nope", "-o", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: Input directory not found: nope"));
}
