//! CLI integration tests for the `hrforms` binary.
//!
//! Uses `assert_cmd` to spawn the binary and verify exit codes, stdout
//! content, and stderr content. Tests run from the workspace root so the
//! sample files under `demos/` resolve.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Locate the workspace root by walking up from CARGO_MANIFEST_DIR.
fn workspace_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    // crates/cli -> workspace root is two levels up
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .to_path_buf()
}

/// Helper: create a Command for the `hrforms` binary, rooted at workspace.
fn hrforms() -> Command {
    let mut cmd = cargo_bin_cmd!("hrforms");
    cmd.current_dir(workspace_root());
    cmd.env_remove("RUST_LOG");
    cmd
}

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write temp file");
    path
}

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    hrforms()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Reactive field rules for HR travel forms",
        ));
}

#[test]
fn version_exits_0() {
    hrforms()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("hrforms"));
}

// ──────────────────────────────────────────────
// 2. Replay
// ──────────────────────────────────────────────

#[test]
fn replay_claim_json() {
    let output = hrforms()
        .args([
            "replay",
            "demos/claim_replay.json",
            "--fixtures",
            "demos/fixtures.json",
            "--output",
            "json",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let result: serde_json::Value = serde_json::from_slice(&output).expect("json output");
    let fields = &result["document"]["fields"];
    assert_eq!(fields["currency"], "USD");
    assert_eq!(fields["exchange_rate"], "83.5");
    assert_eq!(fields["supervisor"], "EMP-0007");
    assert_eq!(fields["total_amount"], "12");
    assert_eq!(fields["net_amount"], "10");

    let row = &result["document"]["tables"]["items"][0];
    assert_eq!(row["mileage_amount"], "6");
    assert_eq!(row["amount"], "12");

    assert_eq!(result["diagnostics"], serde_json::json!([]));
    assert!(result["effects"]
        .as_array()
        .unwrap()
        .contains(&serde_json::json!({ "effect": "row_add_disabled", "table": "items" })));
}

#[test]
fn replay_claim_text() {
    hrforms()
        .args([
            "replay",
            "demos/claim_replay.json",
            "--fixtures",
            "demos/fixtures.json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Travel Claim TC-0001 (draft)"))
        .stdout(predicate::str::contains("exchange_rate: 83.5"))
        .stdout(predicate::str::contains("1 USD = [?] BTN"))
        .stdout(predicate::str::contains("effect: disable row add on items"));
}

#[test]
fn replay_reports_clamped_dates() {
    let dir = TempDir::new().unwrap();
    let script = write(
        &dir,
        "script.json",
        r#"{
            "document": { "doctype": "Travel Authorization", "name": "TA-0009" },
            "steps": [
                { "op": "add_row", "table": "items" },
                { "op": "set", "row": 1, "field": "from_date", "value": "2024-06-10" },
                { "op": "set", "row": 1, "field": "to_date", "value": "2024-06-01" }
            ]
        }"#,
    );
    hrforms()
        .arg("replay")
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "error [items #1]: To Date cannot be earlier than From Date",
        ))
        .stdout(predicate::str::contains("to_date=2024-06-10"));
}

#[test]
fn replay_unknown_field_exits_1() {
    let dir = TempDir::new().unwrap();
    let script = write(
        &dir,
        "script.json",
        r#"{
            "document": { "doctype": "Travel Claim", "name": "TC-0009" },
            "steps": [ { "op": "set", "field": "colour", "value": "red" } ]
        }"#,
    );
    hrforms()
        .arg("replay")
        .arg(&script)
        .assert()
        .failure()
        .stderr(predicate::str::contains("step 1: unknown field 'colour'"));
}

#[test]
fn replay_locked_claim_grid_exits_1() {
    let dir = TempDir::new().unwrap();
    let script = write(
        &dir,
        "script.json",
        r#"{
            "document": { "doctype": "Travel Claim", "name": "TC-0009" },
            "steps": [ { "op": "add_row", "table": "items" } ]
        }"#,
    );
    hrforms()
        .arg("replay")
        .arg(&script)
        .assert()
        .failure()
        .stderr(predicate::str::contains("step 1"));
}

#[test]
fn replay_missing_script_exits_1() {
    hrforms()
        .args(["replay", "demos/does_not_exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("script file not found"));
}

#[test]
fn replay_quiet_json_error_is_silent() {
    hrforms()
        .args(["replay", "demos/does_not_exist.json", "--quiet"])
        .assert()
        .failure()
        .stderr(predicate::str::is_empty());
}

// ──────────────────────────────────────────────
// 3. Draft
// ──────────────────────────────────────────────

#[test]
fn draft_claim_pays_return_day_percentage() {
    let output = hrforms()
        .args([
            "draft",
            "demos/authorization.json",
            "--kind",
            "claim",
            "--dsa",
            "1000",
            "--return-day-percent",
            "50",
            "--output",
            "json",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let claim: serde_json::Value = serde_json::from_slice(&output).expect("json output");
    assert_eq!(claim["doctype"], "Travel Claim");
    assert_eq!(claim["fields"]["travel_authorization"], "TA-0001");
    let amounts: Vec<_> = claim["tables"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["amount"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(amounts, vec!["1000", "3000", "500"]);
}

#[test]
fn draft_claim_without_dsa_exits_1() {
    hrforms()
        .args(["draft", "demos/authorization.json", "--kind", "claim"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--dsa is required"));
}

#[test]
fn draft_adjustment_copies_itinerary() {
    hrforms()
        .args(["draft", "demos/authorization.json", "--kind", "adjustment"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Travel Adjustment new-travel-adjustment-TA-0001"))
        .stdout(predicate::str::contains("itinerary:"))
        .stdout(predicate::str::contains("halt_at=Bumthang"));
}

// ──────────────────────────────────────────────
// 4. Validate
// ──────────────────────────────────────────────

#[test]
fn validate_clean_authorization_exits_0() {
    hrforms()
        .args(["validate", "demos/authorization.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("TA-0001: ok"));
}

#[test]
fn validate_reports_errors_and_exits_1() {
    let dir = TempDir::new().unwrap();
    let doc = write(
        &dir,
        "ta.json",
        r#"{
            "doctype": "Travel Authorization",
            "name": "TA-0010",
            "fields": { "travel_type": "International", "estimated_amount": 100, "advance_amount": 250 },
            "tables": { "items": [
                { "from_date": "2024-03-01", "to_date": "2024-03-03", "halt": 1, "halt_at": "Paro" },
                { "from_date": "2024-03-02", "to_date": "2024-03-04", "halt": 1, "halt_at": "Haa" }
            ] }
        }"#,
    );
    hrforms()
        .args(["validate", "--output", "json"])
        .arg(&doc)
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"valid\": false"))
        .stdout(predicate::str::contains(
            "Row#1: Dates are overlapping with dates in Row#2",
        ))
        .stdout(predicate::str::contains("Exchange Rate cannot be zero."))
        .stdout(predicate::str::contains(
            "Advance amount cannot exceed the estimated amount",
        ));
}

#[test]
fn validate_with_dsa_recomputes_estimate() {
    let output = hrforms()
        .args([
            "validate",
            "demos/authorization.json",
            "--dsa",
            "1000",
            "--output",
            "json",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let result: serde_json::Value = serde_json::from_slice(&output).expect("json output");
    assert_eq!(result["valid"], true);
    // Four full days; no return-day share without a percentage.
    assert_eq!(result["estimated_amount"], "4000");
}

#[test]
fn validate_with_low_dsa_rejects_advance() {
    hrforms()
        .args(["validate", "demos/authorization.json", "--dsa", "100"])
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            "Advance amount cannot exceed the estimated amount",
        ));
}

#[test]
fn validate_return_day_percent_needs_dsa() {
    hrforms()
        .args([
            "validate",
            "demos/authorization.json",
            "--return-day-percent",
            "50",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--dsa"));
}

#[test]
fn validate_invalid_json_exits_1() {
    let dir = TempDir::new().unwrap();
    let doc = write(&dir, "broken.json", "{ not json");
    hrforms()
        .arg("validate")
        .arg(&doc)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid JSON"));
}

#[test]
fn bad_config_exits_1() {
    let dir = TempDir::new().unwrap();
    let config = write(&dir, "hrforms.toml", "[engine]\nmax_cascade_depth = \"deep\"\n");
    hrforms()
        .args(["validate", "demos/authorization.json", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("error parsing config"));
}

#[test]
fn sample_config_loads() {
    hrforms()
        .args([
            "validate",
            "demos/authorization.json",
            "--config",
            "demos/hrforms.toml",
        ])
        .assert()
        .success();
}
