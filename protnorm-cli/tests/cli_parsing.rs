//! End-to-end CLI tests against temporary plates.

#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const PLATE: &str = "Well_ID,Conc_uM_Final\nA01,1.5\nB2,4\nB3,12\n";

fn protnorm() -> Command {
    Command::cargo_bin("protnorm").expect("protnorm binary")
}

fn create_plate(contents: &str) -> TempDir {
    let td = tempfile::tempdir().expect("tempdir");
    fs::write(td.path().join("plate.csv"), contents).unwrap();
    td
}

fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn test_plan_writes_instruction_table() {
    let temp = create_plate(PLATE);

    protnorm()
        .current_dir(temp.path())
        .args(["plan", "--input", "plate.csv", "--run", "R1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Protein_Norm_R1_2uM.csv"));

    assert_eq!(
        read(temp.path().join("Protein_Norm_R1_2uM.csv")),
        "SourceWell,DestWell,PPVol,DilVol,DivideCounter\n\
         A1,A1,0.0,0.0,1\n\
         B2,B2,50.0,50.0,3\n\
         B2,B2,50.0,50.0,3\n\
         B2,B2,50.0,50.0,3\n\
         B3,B3,50.0,250.0,1\n"
    );
}

#[test]
fn test_plan_creates_out_dir() {
    let temp = create_plate(PLATE);

    protnorm()
        .current_dir(temp.path())
        .args(["plan", "-i", "plate.csv", "-r", "R2", "--out-dir", "out/nested"])
        .assert()
        .success();

    assert!(temp.path().join("out/nested/Protein_Norm_R2_2uM.csv").exists());
}

#[test]
fn test_plan_collision_exits_2_and_force_overwrites() {
    let temp = create_plate(PLATE);
    let target = temp.path().join("Protein_Norm_R1_2uM.csv");
    fs::write(&target, "keep me").unwrap();

    protnorm()
        .current_dir(temp.path())
        .args(["plan", "--input", "plate.csv", "--run", "R1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("already exists"));
    assert_eq!(read(&target), "keep me");

    protnorm()
        .current_dir(temp.path())
        .args(["plan", "--input", "plate.csv", "--run", "R1", "--force"])
        .assert()
        .success();
    assert!(read(&target).starts_with("SourceWell,DestWell"));
}

#[test]
fn test_plan_compact_layout() {
    let temp = create_plate(PLATE);

    protnorm()
        .current_dir(temp.path())
        .args(["plan", "--input", "plate.csv", "--run", "R1", "--layout", "compact"])
        .assert()
        .success();

    let contents = read(temp.path().join("Protein_Norm_R1_2uM.csv"));
    assert_eq!(contents.lines().count(), 4);
}

#[test]
fn test_plan_target_concentration_in_file_name() {
    let temp = create_plate(PLATE);

    protnorm()
        .current_dir(temp.path())
        .args(["plan", "--input", "plate.csv", "--run", "R1", "--target-conc", "2.5"])
        .assert()
        .success();

    assert!(temp.path().join("Protein_Norm_R1_2.5uM.csv").exists());
}

#[test]
fn test_negative_buffer_is_reported_on_stderr() {
    let temp = create_plate("Well_ID,Conc_uM_Final\nD1,1\n");

    protnorm()
        .current_dir(temp.path())
        .env_remove("RUST_LOG")
        .args(["plan", "--input", "plate.csv", "--run", "R1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("D1"))
        .stderr(predicate::str::contains("buffer volume is negative"));

    let contents = read(temp.path().join("Protein_Norm_R1_2uM.csv"));
    assert!(contents.contains("D1,D1,50.0,-25.0,12\n"));
}

#[test]
fn test_missing_column_fails_with_1() {
    let temp = create_plate("Well_ID,Concentration\nA1,3\n");

    protnorm()
        .current_dir(temp.path())
        .args(["plan", "--input", "plate.csv", "--run", "R1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Conc_uM_Final"));
}

#[test]
fn test_missing_input_file_fails() {
    let temp = tempfile::tempdir().unwrap();

    protnorm()
        .current_dir(temp.path())
        .args(["plan", "--input", "nope.csv", "--run", "R1"])
        .assert()
        .code(1);
}

#[test]
fn test_empty_run_id_rejected_before_reading_input() {
    let temp = tempfile::tempdir().unwrap();

    protnorm()
        .current_dir(temp.path())
        .args(["plan", "--input", "nope.csv", "--run", " "])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("must not be empty"));
}

#[test]
fn test_plan_requires_run() {
    protnorm()
        .args(["plan", "--input", "plate.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--run"));
}

#[test]
fn test_blank_on_all_zero_plate_fails() {
    let temp = create_plate("Well_ID,Conc_uM_Final\nF5,0\nB2,0\n");

    protnorm()
        .current_dir(temp.path())
        .args(["plan", "--input", "plate.csv", "--run", "R1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot compute blank dilution"));

    assert!(!temp.path().join("Protein_Norm_R1_2uM.csv").exists());
}

#[test]
fn test_preview_prints_markdown() {
    let temp = create_plate(PLATE);

    protnorm()
        .current_dir(temp.path())
        .args(["preview", "--input", "plate.csv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# protnorm plan"))
        .stdout(predicate::str::contains("| B2 | general | 4.000 | 50.00 | 50.00 | 3 |"));

    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
}

#[test]
fn test_preview_json() {
    let temp = create_plate(PLATE);

    let output = protnorm()
        .current_dir(temp.path())
        .args(["preview", "--input", "plate.csv", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["schema"], "protnorm.plan.v1");
    assert_eq!(plan["summary"]["rows_total"], 5);
    assert_eq!(plan["dispenses"][1]["split_count"], 3);
}

#[test]
fn test_show_config_defaults_json() {
    let temp = tempfile::tempdir().unwrap();

    let output = protnorm()
        .current_dir(temp.path())
        .args(["show-config", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let cfg: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(cfg["planner"]["target_concentration_um"], 2.0);
    assert_eq!(cfg["planner"]["target_volume_ul"], 300.0);
    assert_eq!(cfg["planner"]["max_tip_volume_ul"], 50.0);
    assert_eq!(cfg["max_splits"], 10_000);
    assert_eq!(cfg["input"]["concentration_column"], "Conc_uM_Final");
    assert_eq!(cfg["output"]["overwrite"], "fail");
    assert_eq!(cfg["output"]["layout"], "expanded");
}

#[test]
fn test_config_file_is_discovered() {
    let temp = create_plate("Well,Conc\nB2,4\n");
    fs::write(
        temp.path().join("protnorm.toml"),
        r#"
[run]
target_concentration_um = 1.0

[input]
well_column = "Well"
concentration_column = "Conc"

[output]
dir = "tables"
layout = "compact"
"#,
    )
    .unwrap();

    protnorm()
        .current_dir(temp.path())
        .args(["show-config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("target_concentration_um = 1"))
        .stdout(predicate::str::contains("layout                  = compact"))
        .stdout(predicate::str::contains("overwrite               = fail"));

    protnorm()
        .current_dir(temp.path())
        .args(["plan", "--input", "plate.csv", "--run", "R9"])
        .assert()
        .success();

    assert_eq!(
        read(temp.path().join("tables/Protein_Norm_R9_1uM.csv")),
        "SourceWell,DestWell,PPVol,DilVol,DivideCounter\nB2,B2,37.5,112.5,2\n"
    );
}

#[test]
fn test_explicit_config_must_exist() {
    let temp = tempfile::tempdir().unwrap();

    protnorm()
        .current_dir(temp.path())
        .args(["show-config", "--config", "missing.toml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("missing.toml"));
}

#[test]
fn test_cli_blank_extends_config() {
    let temp = create_plate("Well_ID,Conc_uM_Final\nB2,4\nC3,6\n");

    protnorm()
        .current_dir(temp.path())
        .args(["preview", "--input", "plate.csv", "--blank", "c3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("| C3 | blank |"))
        .stdout(predicate::str::contains("- Blank reference mean: 5.000 uM"));
}
