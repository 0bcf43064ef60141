use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

fn quotation_fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../dealerscan-core/tests/fixtures/quotation.json")
}

fn dealerscan(config_home: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("dealerscan").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home.path());
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    let home = tempfile::tempdir().unwrap();
    dealerscan(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("extract"))
        .stdout(predicate::str::contains("batch"))
        .stdout(predicate::str::contains("vlm"));
}

#[test]
fn test_extract_json() {
    let home = tempfile::tempdir().unwrap();
    dealerscan(&home)
        .arg("extract")
        .arg(quotation_fixture())
        .assert()
        .success()
        .stdout(predicate::str::contains("SHREE RAM TRACTORS"))
        .stdout(predicate::str::contains("575 DI"))
        .stdout(predicate::str::contains("column_aligned_match"));
}

#[test]
fn test_extract_csv_with_registry() {
    let home = tempfile::tempdir().unwrap();
    let registry = home.path().join("dealers.json");
    fs::write(&registry, r#"["Shree Ram Tractors"]"#).unwrap();

    dealerscan(&home)
        .arg("extract")
        .arg(quotation_fixture())
        .args(["--format", "csv", "--strategy", "registry"])
        .arg("--registry")
        .arg(&registry)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("dealer_name,dealer_confidence"))
        .stdout(predicate::str::contains("Shree Ram Tractors,1.00,heuristic_match"));
}

#[test]
fn test_extract_missing_file() {
    let home = tempfile::tempdir().unwrap();
    dealerscan(&home)
        .args(["extract", "does-not-exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_extract_malformed_box_fails() {
    let home = tempfile::tempdir().unwrap();
    let page = home.path().join("bad.json");
    fs::write(
        &page,
        r#"{"width": 100, "height": 100, "tokens": [{"text": "X", "bbox": [[0,0],[1,1]]}]}"#,
    )
    .unwrap();

    dealerscan(&home)
        .arg("extract")
        .arg(&page)
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed bounding box"));
}

#[test]
fn test_batch_continue_on_error_with_summary() {
    let home = tempfile::tempdir().unwrap();
    let input = home.path().join("in");
    let output = home.path().join("out");
    fs::create_dir_all(&input).unwrap();

    fs::copy(quotation_fixture(), input.join("good.json")).unwrap();
    fs::write(input.join("broken.json"), "{ not json").unwrap();

    dealerscan(&home)
        .arg("batch")
        .arg(format!("{}/*.json", input.display()))
        .arg("--output-dir")
        .arg(&output)
        .args(["--summary", "--continue-on-error", "-j", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 successful"));

    assert!(output.join("good.json").exists());
    assert!(!output.join("broken.json").exists());

    let summary = fs::read_to_string(output.join("summary.csv")).unwrap();
    assert!(summary.contains("good.json,success,SHREE RAM TRACTORS,575 DI,47"));
    assert!(summary.contains("broken.json,error"));
}

#[test]
fn test_batch_stops_on_error_by_default() {
    let home = tempfile::tempdir().unwrap();
    fs::write(home.path().join("broken.json"), "[]").unwrap();

    dealerscan(&home)
        .arg("batch")
        .arg(format!("{}/*.json", home.path().display()))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Processing failed"));
}

#[test]
fn test_vlm_parse() {
    let home = tempfile::tempdir().unwrap();
    let raw = home.path().join("raw.txt");
    fs::write(
        &raw,
        "user\nread the quotation\nassistant\n```json\n{\"dealer_name\": \"Kisan Agro\", \"horse_power\": \"47.5 HP\"}\n```",
    )
    .unwrap();

    dealerscan(&home)
        .arg("vlm")
        .arg(&raw)
        .assert()
        .success()
        .stdout(predicate::str::contains("Kisan Agro"))
        .stdout(predicate::str::contains("47.5"));
}

#[test]
fn test_config_init_get_set() {
    let home = tempfile::tempdir().unwrap();

    dealerscan(&home).args(["config", "init"]).assert().success();
    assert!(home.path().join("dealerscan/config.json").exists());

    dealerscan(&home)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    dealerscan(&home)
        .args(["config", "get", "dealer.header_blocks"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3"));

    dealerscan(&home)
        .args(["config", "set", "dealer.header_blocks", "5"])
        .assert()
        .success();

    dealerscan(&home)
        .args(["config", "get", "dealer.header_blocks"])
        .assert()
        .success()
        .stdout(predicate::str::contains("5"));

    dealerscan(&home)
        .args(["config", "set", "horsepower.no_such_key", "1"])
        .assert()
        .failure();
}
