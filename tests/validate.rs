//! Integration tests for the `validate` command.
use capplan::cli::handle_validate_command;
use capplan::input::load_model;
use capplan::settings::Settings;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

/// Get the path to the example model.
fn get_model_dir() -> PathBuf {
    PathBuf::from("demos/simple")
}

/// An integration test for the `validate` command.
#[test]
fn test_handle_validate_command() {
    unsafe { std::env::set_var("CAPPLAN_LOG_LEVEL", "off") };
    handle_validate_command(&get_model_dir(), Some(Settings::default())).unwrap();
}

#[test]
fn test_load_model() {
    let model = load_model(get_model_dir()).unwrap();
    assert_eq!(model.parameters.periods, [2020, 2030]);
    assert_eq!(model.sites.len(), 2);
    assert_eq!(
        model.periods.keys().copied().collect::<Vec<_>>(),
        [2020, 2030]
    );
    let input = &model.periods[&2020];
    assert_eq!(input.processes.len(), 3);
    assert_eq!(input.storages.len(), 1);
    assert_eq!(input.transmissions.len(), 2);
}

/// A model whose only supply of southern electricity has been removed fails validation
#[test]
fn test_load_model_unsupplied_demand() {
    let dir = tempdir().unwrap();
    let model_dir = dir.path().join("simple");
    capplan::cli::example::extract_example("simple", &model_dir).unwrap();

    let period_dir = model_dir.join("2030");
    fs::remove_file(period_dir.join("transmissions.csv")).unwrap();
    let processes = fs::read_to_string(period_dir.join("processes.csv")).unwrap();
    let processes: String = processes
        .lines()
        .filter(|line| !line.contains("Photovoltaics"))
        .map(|line| format!("{line}\n"))
        .collect();
    fs::write(period_dir.join("processes.csv"), processes).unwrap();
    let flows = fs::read_to_string(period_dir.join("process_commodities.csv")).unwrap();
    let flows: String = flows
        .lines()
        .filter(|line| !line.contains("Photovoltaics"))
        .map(|line| format!("{line}\n"))
        .collect();
    fs::write(period_dir.join("process_commodities.csv"), flows).unwrap();

    let err = load_model(&model_dir).unwrap_err();
    assert_eq!(
        err.chain().next().unwrap().to_string(),
        "Failed to read input data for period 2030"
    );
    assert_eq!(
        err.chain().nth(1).unwrap().to_string(),
        "Demand commodity Elec@South cannot be supplied by any process or transmission link in \
         period 2030"
    );
}

/// Scenarios may only change entities which exist in the model
#[test]
fn test_load_model_unknown_scenario_process() {
    let dir = tempdir().unwrap();
    let model_dir = dir.path().join("simple");
    capplan::cli::example::extract_example("simple", &model_dir).unwrap();
    assert_eq!(load_model(&model_dir).unwrap().parameters.scenarios.len(), 3);

    let mut parameters = fs::read_to_string(model_dir.join("model.toml")).unwrap();
    parameters.push_str(
        "\n[[scenarios]]\nname = \"nuclear_caps\"\n\
         process_cap_up = [{ site = \"North\", process = \"Nuclear\", cap_up = 10.0 }]\n",
    );
    fs::write(model_dir.join("model.toml"), parameters).unwrap();

    let err = load_model(&model_dir).unwrap_err();
    assert_eq!(err.to_string(), "Invalid scenario: nuclear_caps");
}
