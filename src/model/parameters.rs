//! Defines the `ModelParameters` struct, which represents the contents of `model.toml`.
use crate::input::{input_err_msg, read_toml};
use crate::period::check_periods;
use crate::scenario::Scenario;
use crate::units::{HOURS_PER_YEAR, Hours};
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use serde_string_enum::DeserializeLabeledStringEnum;
use std::collections::HashSet;
use std::path::Path;

const MODEL_PARAMETERS_FILE_NAME: &str = "model.toml";

fn default_dt() -> Hours {
    Hours(1.0)
}

fn default_scenarios() -> Vec<Scenario> {
    vec![Scenario::base()]
}

/// Represents the contents of the entire model file.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct ModelParameters {
    /// Planning periods, solved in this order
    pub periods: Vec<u32>,
    /// The number of timesteps modelled in each period
    pub num_timesteps: u32,
    /// The length of each timestep
    #[serde(default = "default_dt")]
    pub dt: Hours,
    /// The quantity to minimise
    #[serde(default)]
    pub objective: Objective,
    /// The scenarios to run, in order
    #[serde(default = "default_scenarios")]
    pub scenarios: Vec<Scenario>,
}

/// The quantity to minimise
#[derive(DeserializeLabeledStringEnum, Debug, PartialEq, Eq, Clone, Copy, Default, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Objective {
    /// Total annualised system cost
    #[default]
    #[string = "cost"]
    Cost,
    /// Total annual emissions of environmental commodities
    #[string = "co2"]
    Co2,
}

/// Check that the `num_timesteps` parameter is valid
fn check_num_timesteps(value: u32) -> Result<()> {
    ensure!(value > 0, "num_timesteps cannot be zero");

    Ok(())
}

/// Check that the `dt` parameter is valid
fn check_dt(value: Hours) -> Result<()> {
    ensure!(
        value.is_finite() && value > Hours(0.0),
        "dt must be a finite number greater than zero"
    );

    Ok(())
}

/// Check that the scenarios are valid and have unique names
fn check_scenarios(scenarios: &[Scenario]) -> Result<()> {
    ensure!(!scenarios.is_empty(), "At least one scenario must be defined");

    let mut names = HashSet::new();
    for scenario in scenarios {
        scenario.validate()?;
        ensure!(
            names.insert(scenario.name.as_str()),
            "Duplicate scenario name: {}",
            scenario.name
        );
    }

    Ok(())
}

impl ModelParameters {
    /// Read a model file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    ///
    /// # Returns
    ///
    /// The model file contents as a [`ModelParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ModelParameters> {
        let file_path = model_dir.as_ref().join(MODEL_PARAMETERS_FILE_NAME);
        let model_params: ModelParameters = read_toml(&file_path)?;

        model_params
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(model_params)
    }

    /// Validate parameters after reading in file
    fn validate(&self) -> Result<()> {
        check_periods(&self.periods)?;
        check_num_timesteps(self.num_timesteps)?;
        check_dt(self.dt)?;
        check_scenarios(&self.scenarios)?;

        Ok(())
    }

    /// Iterate over the modelled timesteps (timestep 0 is reserved for initial storage states)
    pub fn timesteps(&self) -> impl Iterator<Item = u32> + Clone + use<> {
        1..=self.num_timesteps
    }

    /// The factor which scales quantities summed over the modelled timesteps up to a full year
    pub fn weight(&self) -> f64 {
        HOURS_PER_YEAR / (f64::from(self.num_timesteps) * self.dt.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_model_params_from_path() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(MODEL_PARAMETERS_FILE_NAME)).unwrap();
            writeln!(file, "periods = [2020, 2030]\nnum_timesteps = 24").unwrap();
        }

        let model_params = ModelParameters::from_path(dir.path()).unwrap();
        assert_eq!(model_params.periods, [2020, 2030]);
        assert_eq!(model_params.dt, Hours(1.0));
        assert_eq!(model_params.objective, Objective::Cost);
        assert_eq!(model_params.scenarios, [Scenario::base()]);
    }

    #[test]
    fn test_model_params_from_path_bad_periods() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(MODEL_PARAMETERS_FILE_NAME)).unwrap();
            writeln!(file, "periods = [2030, 2020]\nnum_timesteps = 24").unwrap();
        }

        assert!(ModelParameters::from_path(dir.path()).is_err());
    }

    #[rstest]
    #[case(1.0, true)]
    #[case(0.25, true)]
    #[case(0.0, false)]
    #[case(-1.0, false)]
    #[case(f64::INFINITY, false)]
    #[case(f64::NAN, false)]
    fn test_check_dt(#[case] value: f64, #[case] expected_valid: bool) {
        assert_eq!(check_dt(Hours(value)).is_ok(), expected_valid);
    }

    #[test]
    fn test_model_params_from_path_scenarios() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(MODEL_PARAMETERS_FILE_NAME)).unwrap();
            writeln!(
                file,
                "periods = [2020]\nnum_timesteps = 24\n\n\
                 [[scenarios]]\nname = \"base\"\n\n\
                 [[scenarios]]\nname = \"stock_prices\"\nstock_price_factor = 1.5"
            )
            .unwrap();
        }

        let model_params = ModelParameters::from_path(dir.path()).unwrap();
        let names: Vec<_> = model_params
            .scenarios
            .iter()
            .map(|scenario| scenario.name.as_str())
            .collect();
        assert_eq!(names, ["base", "stock_prices"]);
    }

    #[test]
    fn test_check_scenarios() {
        let other = Scenario {
            name: "other".into(),
            ..Scenario::base()
        };
        assert!(check_scenarios(&[Scenario::base(), other]).is_ok());
        assert_error!(check_scenarios(&[]), "At least one scenario must be defined");
        assert_error!(
            check_scenarios(&[Scenario::base(), Scenario::base()]),
            "Duplicate scenario name: base"
        );
    }

    #[test]
    fn test_check_num_timesteps() {
        assert!(check_num_timesteps(1).is_ok());
        assert_error!(check_num_timesteps(0), "num_timesteps cannot be zero");
    }

    #[test]
    fn test_weight() {
        let params = ModelParameters {
            periods: vec![2020],
            num_timesteps: 24,
            dt: Hours(1.0),
            objective: Objective::Cost,
            scenarios: vec![Scenario::base()],
        };
        assert_approx_eq!(f64, params.weight(), 365.0);
        assert_eq!(params.timesteps().collect::<Vec<_>>().len(), 24);
    }
}
