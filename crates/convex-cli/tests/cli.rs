//! Integration tests for the convex-vae binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("convex-vae").unwrap();
    cmd.env_remove("CONVEX_VAE_CONFIG").env_remove("RUST_LOG");
    cmd
}

fn stdout_json(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

#[test]
fn test_help_lists_commands() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("simulate"))
        .stdout(predicate::str::contains("train"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_simulate_stats_json() {
    let stats = stdout_json(cli().args(["simulate", "--format", "json", "-n", "4096"]));
    let rows = stats.as_array().unwrap();
    assert_eq!(rows.len(), 10);

    for row in rows {
        let mean = row["mean"].as_f64().unwrap();
        let variance = row["variance"].as_f64().unwrap();
        let expected_variance = row["expected_variance"].as_f64().unwrap();
        assert!(mean.abs() < 1e-3);
        assert!((variance / expected_variance - 1.0).abs() < 0.15);
    }
}

#[test]
fn test_simulate_curves_csv() {
    let output = cli()
        .args(["simulate", "--curves", "3", "--offsets", "1,2,5", "--format", "csv"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "1Y,2Y,5Y");
    assert!(lines[1..].iter().all(|line| line.split(',').count() == 3));
}

#[test]
fn test_simulate_rejects_bad_offsets() {
    cli()
        .args(["simulate", "--offsets", "1,zero"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a number"));

    cli()
        .args(["simulate", "--offsets", "1,-2"])
        .assert()
        .failure();
}

#[test]
fn test_simulate_rejects_invalid_model() {
    cli().args(["simulate", "-a", "0"]).assert().failure();
}

#[test]
fn test_config_show() {
    cli()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mean_reversion"))
        .stdout(predicate::str::contains("[training]"));
}

#[test]
fn test_config_init_then_validate() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("experiment.toml");

    cli().args(["config", "init"]).arg(&path).assert().success();
    assert!(path.exists());

    cli()
        .args(["config", "validate"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"));

    // Refuses to clobber without --force.
    cli().args(["config", "init"]).arg(&path).assert().failure();
    cli()
        .args(["config", "init", "--force"])
        .arg(&path)
        .assert()
        .success();
}

#[test]
fn test_config_validate_rejects_invalid_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[simulator]\nmean_reversion = -1.0\nvolatility = 0.01\n").unwrap();

    cli()
        .args(["config", "validate"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("mean_reversion"));
}

#[test]
fn test_config_file_drives_simulation() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("small.json");
    cli().args(["config", "init"]).arg(&path).assert().success();

    let text = std::fs::read_to_string(&path).unwrap();
    let mut config: serde_json::Value = serde_json::from_str(&text).unwrap();
    config["simulator"]["offsets"] = serde_json::json!([1.0, 2.0, 3.0]);
    config["vae"]["input_dim"] = serde_json::json!(3);
    std::fs::write(&path, config.to_string()).unwrap();

    let stats = stdout_json(
        cli()
            .arg("--config")
            .arg(&path)
            .args(["simulate", "--format", "json"]),
    );
    assert_eq!(stats.as_array().unwrap().len(), 3);
}

#[test]
fn test_train_plain_json() {
    let outcome = stdout_json(cli().args([
        "train",
        "--format",
        "json",
        "-n",
        "256",
        "-i",
        "100",
        "--learning-rate",
        "0.005",
        "-g",
        "3",
    ]));

    assert_eq!(outcome["model"], "vae");
    assert_eq!(outcome["report"]["iterations"], 100);
    assert_eq!(outcome["report"]["loss_history"].as_array().unwrap().len(), 100);

    let generated = outcome["generated"].as_array().unwrap();
    assert_eq!(generated.len(), 3);
    for row in generated {
        let row = row.as_array().unwrap();
        assert_eq!(row.len(), 10);
        assert!(row.iter().all(|v| v.as_f64().unwrap().is_finite()));
    }
}

#[test]
fn test_train_conditional_csv() {
    let output = cli()
        .args([
            "train",
            "--conditional",
            "--format",
            "csv",
            "-n",
            "64",
            "-i",
            "20",
            "-g",
            "4",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("0.0027Y,"));
    assert_eq!(lines[0].split(',').count(), 10);
    assert!(lines[1..].iter().all(|line| line.split(',').count() == 10));
}

#[test]
fn test_train_rejects_zero_draws() {
    cli()
        .args(["train", "-i", "1", "-g", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--generate"));
}

#[test]
fn test_train_rejects_zero_batch_size() {
    cli()
        .args(["train", "-i", "1", "--batch-size", "0"])
        .assert()
        .failure();
}
