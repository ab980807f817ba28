//! Integration tests for stagectl
//!
//! Exercises every subcommand through the built binary, including exit
//! codes for invalid input and failed expectations.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn stagectl() -> Result<Command, Box<dyn std::error::Error>> {
    Ok(Command::cargo_bin("stagectl")?)
}

fn scenario(name: &str) -> String {
    format!("{}/scenarios/{name}.yaml", env!("CARGO_MANIFEST_DIR"))
}

fn json_stdout(output: &std::process::Output) -> Result<Value, Box<dyn std::error::Error>> {
    Ok(serde_json::from_slice(&output.stdout)?)
}

#[test]
fn help_and_version() -> TestResult {
    stagectl()?
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("simulated high-resolution"));
    stagectl()?
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("stagectl"));
    Ok(())
}

#[test]
fn bundled_scenarios_meet_their_expectations() -> TestResult {
    for name in [
        "healthy_startup",
        "key_toggle",
        "short_circuit",
        "brown_out",
        "output_overvoltage",
    ] {
        stagectl()?
            .args(["run", "--scenario", &scenario(name)])
            .assert()
            .success()
            .stdout(predicate::str::contains("Final state:"));
    }
    Ok(())
}

#[test]
fn run_json_reports_transitions() -> TestResult {
    let output = stagectl()?
        .args(["--json", "run", "--scenario", &scenario("healthy_startup")])
        .output()?;
    assert!(output.status.success());

    let value = json_stdout(&output)?;
    assert_eq!(value["success"], true);
    let summary = &value["summary"];
    assert_eq!(summary["final_state"], "Run");
    assert_eq!(summary["ticks"], 300);
    let ticks: Vec<u64> = summary["transitions"]
        .as_array()
        .ok_or("transitions missing")?
        .iter()
        .filter_map(|t| t["tick"].as_u64())
        .collect();
    assert_eq!(ticks, [1, 202, 263]);
    Ok(())
}

#[test]
fn short_circuit_events_are_listed() -> TestResult {
    let output = stagectl()?
        .args(["--json", "run", "--scenario", &scenario("short_circuit")])
        .output()?;
    let value = json_stdout(&output)?;
    let events = &value["summary"]["fault_events"];
    assert_eq!(events.as_array().map(Vec::len), Some(2));
    assert_eq!(events[0]["fault"], "short-circuit");
    assert_eq!(events[0]["kind"], "Tripped");
    assert_eq!(events[1]["kind"]["Retried"]["attempt"], 1);
    Ok(())
}

#[test]
fn failed_expectation_exits_with_3() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("too_short.yaml");
    fs::write(
        &path,
        "name: too short\nphases:\n  - ticks: 10\n    samples: { vin: 1500, iin: 2100, vout: 1000, iout: 2300 }\n    start: true\nexpect:\n  state: Run\n",
    )?;

    stagectl()?
        .args(["run", "--scenario"])
        .arg(&path)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("expected final state run, got wait"));

    stagectl()?
        .args(["run", "--no-check", "--scenario"])
        .arg(&path)
        .assert()
        .success();
    Ok(())
}

#[test]
fn invalid_scenario_exits_with_2() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("empty.yaml");
    fs::write(&path, "name: empty\nphases: []\n")?;

    stagectl()?
        .args(["--json", "run", "--scenario"])
        .arg(&path)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("has no phases"));
    Ok(())
}

#[test]
fn missing_scenario_file_exits_with_1() -> TestResult {
    stagectl()?
        .args(["run", "--scenario", "/nonexistent/scenario.yaml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("IO error"));
    Ok(())
}

#[test]
fn default_config_round_trips_through_check() -> TestResult {
    let output = stagectl()?.arg("config").output()?;
    assert!(output.status.success());
    let yaml = String::from_utf8(output.stdout)?;
    assert!(yaml.contains("wait_hold_ticks: 200"));

    let dir = TempDir::new()?;
    let path = dir.path().join("converter.yaml");
    fs::write(&path, &yaml)?;
    stagectl()?
        .args(["config", "--check"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"));
    Ok(())
}

#[test]
fn inconsistent_config_is_rejected() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("bad.yaml");
    fs::write(&path, "duty:\n  buck:\n    min: 4000\n    max: 100\n")?;

    stagectl()?
        .args(["config", "--check"])
        .arg(&path)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid duty configuration"));

    stagectl()?
        .args(["run", "--scenario", &scenario("healthy_startup"), "--config"])
        .arg(&path)
        .assert()
        .code(2);
    Ok(())
}

#[test]
fn shorter_wait_hold_from_json_config() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("fast.json");
    fs::write(&path, r#"{ "wait_hold_ticks": 50 }"#)?;

    let output = stagectl()?
        .args(["--json", "run", "--scenario", &scenario("healthy_startup"), "--config"])
        .arg(&path)
        .output()?;
    let value = json_stdout(&output)?;
    let rise = value["summary"]["transitions"][1]["tick"].as_u64();
    assert_eq!(rise, Some(52));
    Ok(())
}

#[test]
fn pwm_requests_are_applied() -> TestResult {
    let output = stagectl()?
        .args(["--json", "pwm", "--frequency", "120000", "--dead-time", "30"])
        .output()?;
    assert!(output.status.success());
    let value = json_stdout(&output)?;
    assert_eq!(value["configuration"]["frequency_hz"], 120_000);
    assert_eq!(value["configuration"]["dead_time_tenths"], 30);
    assert_eq!(value["configuration"]["prescaler"], "Mul16");
    assert_eq!(value["configuration"]["pair_b_compare"], 399);
    assert_eq!(value["configuration"]["tb2_compare"], 12_934);
    Ok(())
}

#[test]
fn pwm_out_of_range_request_exits_with_2() -> TestResult {
    stagectl()?
        .args(["pwm", "--frequency", "200000"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("200000 Hz is out of range"));
    Ok(())
}
