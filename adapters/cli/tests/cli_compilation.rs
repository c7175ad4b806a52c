use std::process::Command;

#[test]
fn cli_compiles_without_warnings() {
    let status = Command::new(env!("CARGO"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args(["check", "--quiet", "--bin", "tikmings"])
        .status()
        .expect("failed to invoke cargo check for tikmings CLI binary");

    assert!(status.success(), "cargo check --bin tikmings should succeed");
}

#[test]
fn bundled_campaign_runs_to_a_summary() {
    let output = Command::new(env!("CARGO"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args([
            "run",
            "--quiet",
            "--bin",
            "tikmings",
            "--",
            "--frames",
            "600",
            "--json",
        ])
        .output()
        .expect("failed to invoke the tikmings CLI binary");

    assert!(output.status.success(), "tikmings should exit cleanly");
    let summary: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("summary is valid json");
    assert_eq!(summary["frames"], 600);
    assert_eq!(summary["level_index"], 0);
    assert_eq!(summary["outcome"], "playing");
}
