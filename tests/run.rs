//! Integration tests for the `run` command.
use capplan::cli::{RunOpts, handle_run_command};
use capplan::settings::Settings;
use float_cmp::assert_approx_eq;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

#[derive(Debug, Deserialize)]
struct CapacityRow {
    period: u32,
    kind: String,
    site: String,
    technology: String,
    commodity: String,
    inst_cap: f64,
    new_cap: f64,
    total_cap: f64,
}

/// Get the path to the example model.
fn get_model_dir() -> PathBuf {
    PathBuf::from("demos/simple")
}

fn read_capacities(path: &Path) -> HashMap<(String, String, String, String), CapacityRow> {
    csv::Reader::from_path(path)
        .unwrap()
        .into_deserialize::<CapacityRow>()
        .map(|row| {
            let row = row.unwrap();
            let key = (
                row.kind.clone(),
                row.site.clone(),
                row.technology.clone(),
                row.commodity.clone(),
            );
            (key, row)
        })
        .collect()
}

/// An integration test for the `run` command.
#[test]
fn test_handle_run_command() {
    unsafe { std::env::set_var("CAPPLAN_LOG_LEVEL", "off") };

    let tmp = tempdir().unwrap();
    let output_dir = tmp.path().join("results");
    let opts = RunOpts {
        output_dir: Some(output_dir.clone()),
        overwrite: false,
        debug_model: true,
        scenarios: Vec::new(),
    };
    let solutions =
        handle_run_command(&get_model_dir(), &opts, Some(Settings::default())).unwrap();
    assert_eq!(
        solutions.keys().collect::<Vec<_>>(),
        ["base", "stock_prices", "north_process_caps"]
    );
    assert!(solutions.values().all(|solution| solution.period == 2030));

    assert!(output_dir.join("metadata.toml").is_file());
    for scenario in solutions.keys() {
        for suffix in [
            "summary.csv",
            "2020_capacities.csv",
            "2030_capacities.csv",
            "2020_flows.csv",
            "2030_flows.csv",
            "2020.log",
        ] {
            let file_name = format!("{scenario}_{suffix}");
            assert!(output_dir.join(&file_name).is_file(), "Missing {file_name}");
        }
    }

    // Everything built in 2020 is installed in 2030
    let first = read_capacities(&output_dir.join("base_2020_capacities.csv"));
    let last = read_capacities(&output_dir.join("base_2030_capacities.csv"));
    assert_eq!(first.len(), last.len());
    for (key, row) in &last {
        assert_eq!(row.period, 2030);
        assert_approx_eq!(f64, row.inst_cap, first[key].total_cap, epsilon = 1e-9);
        assert!(row.total_cap >= row.inst_cap - 1e-6);
        assert_approx_eq!(f64, row.new_cap, row.total_cap - row.inst_cap, epsilon = 1e-9);
    }

    // The existing CCGT capacity is kept
    let ccgt = &first[&(
        "process".to_string(),
        "North".to_string(),
        "CCGT".to_string(),
        String::new(),
    )];
    assert_approx_eq!(f64, ccgt.inst_cap, 20.0);
    assert!(ccgt.total_cap >= 20.0 - 1e-6);

    // Running again into the same folder needs permission to overwrite
    assert!(handle_run_command(&get_model_dir(), &opts, Some(Settings::default())).is_err());
    let opts = RunOpts {
        overwrite: true,
        ..opts
    };
    handle_run_command(&get_model_dir(), &opts, Some(Settings::default())).unwrap();
}

/// Only the requested scenarios are run, with their changes applied.
#[test]
fn test_handle_run_command_scenario() {
    unsafe { std::env::set_var("CAPPLAN_LOG_LEVEL", "off") };

    let tmp = tempdir().unwrap();
    let output_dir = tmp.path().join("results");
    let opts = RunOpts {
        output_dir: Some(output_dir.clone()),
        scenarios: vec!["north_process_caps".into()],
        ..Default::default()
    };
    let solutions =
        handle_run_command(&get_model_dir(), &opts, Some(Settings::default())).unwrap();
    assert_eq!(solutions.len(), 1);
    assert!(!output_dir.join("base_summary.csv").exists());

    let wind = (
        "process".to_string(),
        "North".to_string(),
        "WindPark".to_string(),
        String::new(),
    );
    for period in [2020, 2030] {
        let rows = read_capacities(
            &output_dir.join(format!("north_process_caps_{period}_capacities.csv")),
        );
        assert!(rows[&wind].total_cap <= 200.0 + 1e-6);
    }

    // Unknown scenarios are rejected
    let opts = RunOpts {
        output_dir: Some(tmp.path().join("unknown")),
        scenarios: vec!["missing".into()],
        ..Default::default()
    };
    assert!(handle_run_command(&get_model_dir(), &opts, Some(Settings::default())).is_err());
}
