//! The module responsible for writing output data to disk.
use crate::model::PeriodInput;
use crate::simulation::optimisation::PeriodSolution;
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

pub mod metadata;

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "capplan_results";

/// Get the model name from the specified directory path
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Get the model name from the dir path, checking for all the ways this can fail
    let model_dir = model_dir
        .canonicalize() // canonicalise in case the user has specified "."
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory for the model, if it does not already exist.
///
/// # Returns
///
/// Whether an existing folder was reused.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    if output_dir.is_dir() {
        ensure!(
            allow_overwrite,
            "Output folder {} already exists (use --overwrite to replace its contents)",
            output_dir.display()
        );
        return Ok(true);
    }

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(false)
}

/// A row of a per-period capacities file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
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

impl CapacityRow {
    /// A row for one capacity. New capacity is never negative, even if the solved total is a
    /// fraction below the installed capacity.
    fn new(
        period: u32,
        kind: &str,
        (site, technology, commodity): (String, String, String),
        inst_cap: f64,
        total_cap: f64,
    ) -> Self {
        Self {
            period,
            kind: kind.into(),
            site,
            technology,
            commodity,
            inst_cap,
            new_cap: (total_cap - inst_cap).max(0.0),
            total_cap,
        }
    }
}

/// A row of a per-period flows file, giving the value of one variable
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct FlowRow {
    period: u32,
    variable: String,
    timestep: Option<u32>,
    site: String,
    technology: String,
    commodity: String,
    value: f64,
}

/// A row of the summary file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct SummaryRow {
    period: u32,
    objective: f64,
}

/// Writes the results of a run to CSV files.
///
/// Files are prefixed with the scenario name. Capacities are written for every period, along with
/// the variable values if debug output is enabled.
pub struct DataWriter {
    output_path: PathBuf,
    scenario: String,
    save_debug_info: bool,
    summary_writer: csv::Writer<File>,
}

impl DataWriter {
    /// Open CSV files to write output data to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    /// * `scenario` - The scenario name, used as a prefix for file names
    /// * `save_debug_info` - Whether to write the value of every variable to file
    pub fn create(output_path: &Path, scenario: &str, save_debug_info: bool) -> Result<Self> {
        let summary_path = output_path.join(format!("{scenario}_summary.csv"));
        let summary_writer = csv::Writer::from_path(&summary_path)
            .with_context(|| format!("Could not create {}", summary_path.display()))?;

        Ok(Self {
            output_path: output_path.to_path_buf(),
            scenario: scenario.to_string(),
            save_debug_info,
            summary_writer,
        })
    }

    fn period_file_path(&self, period: u32, suffix: &str) -> PathBuf {
        self.output_path
            .join(format!("{}_{period}_{suffix}", self.scenario))
    }

    /// Where the solver should write its log for the given period
    pub fn solver_log_path(&self, period: u32) -> PathBuf {
        self.output_path
            .join(format!("{}_{period}.log", self.scenario))
    }

    /// Write the results for one period.
    ///
    /// # Arguments
    ///
    /// * `input` - The input data the period was solved with, including carried-over capacities
    /// * `solution` - The period's solution
    pub fn write_period(&mut self, input: &PeriodInput, solution: &PeriodSolution) -> Result<()> {
        self.write_capacities(input, solution)?;
        if self.save_debug_info {
            self.write_flows(solution)?;
        }

        self.summary_writer.serialize(SummaryRow {
            period: solution.period,
            objective: solution.objective_value,
        })?;

        Ok(())
    }

    fn write_capacities(&self, input: &PeriodInput, solution: &PeriodSolution) -> Result<()> {
        let period = solution.period;
        let mut writer = csv::Writer::from_path(self.period_file_path(period, "capacities.csv"))?;
        let capacities = &solution.capacities;

        for (key, process) in &input.processes {
            if let Some(total) = capacities.processes.get(key) {
                let labels = (key.site_id.to_string(), key.process_id.to_string(), String::new());
                writer.serialize(CapacityRow::new(
                    period,
                    "process",
                    labels,
                    process.inst_cap.value(),
                    total.value(),
                ))?;
            }
        }

        for (key, storage) in &input.storages {
            let labels = || {
                (
                    key.site_id.to_string(),
                    key.storage_id.to_string(),
                    key.commodity_id.to_string(),
                )
            };
            if let Some(total) = capacities.storages_c.get(key) {
                writer.serialize(CapacityRow::new(
                    period,
                    "storage_content",
                    labels(),
                    storage.inst_cap_c.value(),
                    total.value(),
                ))?;
            }
            if let Some(total) = capacities.storages_p.get(key) {
                writer.serialize(CapacityRow::new(
                    period,
                    "storage_power",
                    labels(),
                    storage.inst_cap_p.value(),
                    total.value(),
                ))?;
            }
        }

        for (key, transmission) in &input.transmissions {
            if let Some(total) = capacities.transmissions.get(key) {
                let labels = (
                    format!("{}>{}", key.site_in, key.site_out),
                    key.transmission_id.to_string(),
                    key.commodity_id.to_string(),
                );
                writer.serialize(CapacityRow::new(
                    period,
                    "transmission",
                    labels,
                    transmission.inst_cap.value(),
                    total.value(),
                ))?;
            }
        }

        writer.flush()?;
        Ok(())
    }

    fn write_flows(&self, solution: &PeriodSolution) -> Result<()> {
        let period = solution.period;
        let mut writer = csv::Writer::from_path(self.period_file_path(period, "flows.csv"))?;
        for (key, value) in &solution.values {
            let (site, technology, commodity) = key.labels();
            writer.serialize(FlowRow {
                period,
                variable: key.name().into(),
                timestep: key.timestep(),
                site,
                technology,
                commodity,
                value: *value,
            })?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.summary_writer.flush()?;

        Ok(())
    }
}
