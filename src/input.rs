//! Common routines for handling input data.
use crate::graph::validate_commodity_graph;
use crate::id::IDLike;
use crate::model::{Model, ModelParameters, PeriodInput};
use crate::site::SiteID;
use anyhow::{Context, Result, bail, ensure};
use indexmap::{IndexMap, IndexSet};
use serde::de::{Deserialize, DeserializeOwned, Deserializer};
use std::fmt::Debug;
use std::fs;
use std::hash::Hash;
use std::path::Path;

mod commodity;
use commodity::read_commodities;
mod process;
use process::{read_process_commodities, read_processes};
mod site;
use site::read_sites;
mod storage;
use storage::read_storages;
mod timeseries;
use timeseries::{read_demand, read_supim};
mod transmission;
use transmission::read_transmissions;

/// Read a series of type `T`s from a CSV file.
///
/// Will raise an error if the file is empty.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv<T: DeserializeOwned>(file_path: &Path) -> Result<impl Iterator<Item = T> + use<T>> {
    let vec = read_csv_internal(file_path)?;
    ensure!(!vec.is_empty(), "CSV file {} cannot be empty", file_path.display());

    Ok(vec.into_iter())
}

/// Read a series of type `T`s from a CSV file, returning nothing if the file is absent.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv_optional<T: DeserializeOwned>(
    file_path: &Path,
) -> Result<impl Iterator<Item = T> + use<T>> {
    if !file_path.is_file() {
        return Ok(Vec::new().into_iter());
    }

    Ok(read_csv_internal(file_path)?.into_iter())
}

fn read_csv_internal<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)
        .with_context(|| input_err_msg(file_path))?;

    reader
        .deserialize()
        .map(|record| record.with_context(|| input_err_msg(file_path)))
        .collect()
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Format an error message to include the file path. To be used with `anyhow::Context`.
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Read an f64, checking that it is between 0 and 1
pub fn deserialise_proportion<'de, D, T>(deserialiser: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: From<f64>,
{
    let value: f64 = Deserialize::deserialize(deserialiser)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(serde::de::Error::custom("Value must be between 0 and 1"));
    }

    Ok(T::from(value))
}

/// Read an f64, checking that it is greater than 0 and at most 1
pub fn deserialise_proportion_nonzero<'de, D, T>(deserialiser: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: From<f64>,
{
    let value: f64 = Deserialize::deserialize(deserialiser)?;
    if !(value > 0.0 && value <= 1.0) {
        return Err(serde::de::Error::custom("Value must be > 0 and <= 1"));
    }

    Ok(T::from(value))
}

/// Read an optional f64 where an empty field means "no limit" (infinity)
pub fn deserialise_limit<'de, D, T>(deserialiser: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: From<f64>,
{
    let value: Option<f64> = Deserialize::deserialize(deserialiser)?;
    let value = value.unwrap_or(f64::INFINITY);
    if value.is_nan() || value < 0.0 {
        return Err(serde::de::Error::custom("Limit must be a non-negative number"));
    }

    Ok(T::from(value))
}

/// Inserts a key-value pair into an [`IndexMap`] if the key does not already exist.
///
/// If the key already exists, it returns an error with a message indicating the key's existence.
pub fn try_insert<K, V>(map: &mut IndexMap<K, V>, key: K, value: V) -> Result<()>
where
    K: Eq + Hash + Debug,
{
    if map.contains_key(&key) {
        bail!("Key {key:?} already exists in the map");
    }
    map.insert(key, value);

    Ok(())
}

/// Get an interned copy of an ID, adding it to the set if it is not already present
pub fn intern_id<ID: IDLike>(ids: &mut IndexSet<ID>, id: &str) -> ID {
    if let Some(existing) = ids.get(id) {
        return existing.clone();
    }

    let id = ID::from(id.to_string());
    ids.insert(id.clone());
    id
}

/// Read a model from the specified directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// The static model data ([`Model`]) or an error. Every scenario is checked against the data of
/// each period.
pub fn load_model<P: AsRef<Path>>(model_dir: P) -> Result<Model> {
    let model_dir = model_dir.as_ref();
    let parameters = ModelParameters::from_path(model_dir)?;
    let sites = read_sites(model_dir)?;
    let site_ids: IndexSet<SiteID> = sites.keys().cloned().collect();

    let mut periods = IndexMap::new();
    for &period in &parameters.periods {
        let period_dir = model_dir.join(period.to_string());
        let input = read_period_input(&period_dir, period, &site_ids, &parameters)
            .with_context(|| format!("Failed to read input data for period {period}"))?;
        periods.insert(period, input);
    }

    for scenario in &parameters.scenarios {
        scenario
            .check_periods(&periods)
            .with_context(|| format!("Invalid scenario: {}", scenario.name))?;
    }

    Ok(Model {
        model_path: model_dir.to_path_buf(),
        parameters,
        sites,
        periods,
    })
}

/// Read the input data for one planning period from its folder
fn read_period_input(
    period_dir: &Path,
    period: u32,
    site_ids: &IndexSet<SiteID>,
    parameters: &ModelParameters,
) -> Result<PeriodInput> {
    ensure!(
        period_dir.is_dir(),
        "Missing folder for period: {}",
        period_dir.display()
    );

    let commodities = read_commodities(period_dir, site_ids)?;
    let processes = read_processes(period_dir, period, site_ids)?;
    let process_commodities = read_process_commodities(period_dir, &processes, &commodities)?;
    let storages = read_storages(period_dir, period, &commodities)?;
    let transmissions = read_transmissions(period_dir, period, &commodities)?;
    let demand = read_demand(period_dir, &commodities, parameters.num_timesteps)?;
    let supim = read_supim(period_dir, &commodities, parameters.num_timesteps)?;

    let input = PeriodInput {
        period,
        commodities,
        processes,
        process_commodities,
        storages,
        transmissions,
        demand,
        supim,
    };
    validate_commodity_graph(&input)?;

    Ok(input)
}
