use std::path::PathBuf;
use std::process::{Command, Output};

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_storage-sizer"))
        .args(args)
        .output()
        .expect("storage-sizer process should run")
}

fn run_json(args: &[&str]) -> serde_json::Value {
    let mut all = args.to_vec();
    all.push("--json");
    let output = run_cli(&all);
    assert!(
        output.status.success(),
        "run failed for {args:?}: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be a JSON decision pack")
}

fn scratch(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("storage-sizer-{}-{name}", std::process::id()))
}

#[test]
fn every_bundled_scenario_produces_a_pack() {
    for path in [
        "scenarios/baseline.toml",
        "scenarios/cca_incentives.toml",
        "scenarios/demand_only.toml",
    ] {
        let pack = run_json(&["--scenario", path]);
        assert_eq!(pack["method"], "btm_storage_sizing.greedy_tou_v1", "{path}");
        assert!(
            pack["candidates_evaluated"].as_u64().unwrap_or(0) > 0,
            "{path}: no candidates evaluated"
        );
        let top = pack["top_candidates"].as_array().expect("top_candidates array");
        assert!(!top.is_empty() && top.len() <= 3, "{path}");
        assert_eq!(pack["sensitivity"].as_array().map(Vec::len), Some(5));
    }
}

#[test]
fn demand_only_scenario_flags_missing_price_signals() {
    let pack = run_json(&["--scenario", "scenarios/demand_only.toml"]);
    let missing: Vec<&str> = pack["missing_info"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert!(missing.contains(&"missing_tariff_price_signals"));
}

#[test]
fn same_seed_prints_identical_json() {
    let a = run_cli(&["--preset", "baseline", "--seed", "7", "--json"]);
    let b = run_cli(&["--preset", "baseline", "--seed", "7", "--json"]);
    assert!(a.status.success());
    assert_eq!(a.stdout, b.stdout);
}

#[test]
fn summary_output_names_the_selection() {
    let output = run_cli(&["--preset", "baseline"]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout should be valid UTF-8");
    assert!(stdout.contains("--- Storage Sizing Decision ---"));
    assert!(stdout.contains("Selected:"));
    assert!(stdout.contains("Recommendation:"));
}

#[test]
fn writes_requested_exports() {
    let pack_path = scratch("pack.json");
    let trace_path = scratch("trace.csv");
    let table_path = scratch("candidates.csv");
    let output = run_cli(&[
        "--preset",
        "baseline",
        "--pack-out",
        pack_path.to_str().unwrap(),
        "--dispatch-out",
        trace_path.to_str().unwrap(),
        "--candidates-out",
        table_path.to_str().unwrap(),
    ]);
    assert!(
        output.status.success(),
        "stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let pack: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&pack_path).unwrap()).unwrap();
    assert!(pack["selected"].is_object());

    let trace = std::fs::read_to_string(&trace_path).unwrap();
    assert!(trace.starts_with("timestamp,period_id,price_per_kwh"));
    assert!(trace.lines().count() > 1);

    let table = std::fs::read_to_string(&table_path).unwrap();
    assert!(table.starts_with("rank,candidate_id"));

    for p in [pack_path, trace_path, table_path] {
        let _ = std::fs::remove_file(p);
    }
}

#[test]
fn unknown_preset_fails() {
    let output = run_cli(&["--preset", "nope"]);
    assert!(!output.status.success());
}

#[test]
fn scenario_and_preset_conflict() {
    let output = run_cli(&["--scenario", "scenarios/baseline.toml", "--preset", "baseline"]);
    assert!(!output.status.success());
}
