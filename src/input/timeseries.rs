//! Code for reading demand and intermittent-supply time series from CSV files.
use super::*;
use crate::commodity::{CommodityID, CommodityMap, CommodityType};
use crate::model::TimeSeriesMap;
use serde::Deserialize;
use std::path::Path;

const DEMAND_FILE_NAME: &str = "demand.csv";
const SUPIM_FILE_NAME: &str = "supim.csv";

#[derive(PartialEq, Debug, Deserialize)]
struct TimeSeriesRaw {
    site_id: String,
    commodity_id: String,
    timestep: u32,
    value: f64,
}

/// Read the demand time series for one period.
///
/// Every demand commodity must have a value for each timestep. Values must be non-negative.
pub fn read_demand(
    period_dir: &Path,
    commodities: &CommodityMap,
    num_timesteps: u32,
) -> Result<TimeSeriesMap> {
    let file_path = period_dir.join(DEMAND_FILE_NAME);
    let demand_csv = read_csv_optional(&file_path)?;
    read_time_series_from_iter(
        demand_csv,
        commodities,
        CommodityType::Demand,
        num_timesteps,
        |value| value >= 0.0,
    )
    .with_context(|| input_err_msg(&file_path))
}

/// Read the normalised availability of intermittent supply commodities for one period.
///
/// Every supim commodity must have a value in [0, 1] for each timestep.
pub fn read_supim(
    period_dir: &Path,
    commodities: &CommodityMap,
    num_timesteps: u32,
) -> Result<TimeSeriesMap> {
    let file_path = period_dir.join(SUPIM_FILE_NAME);
    let supim_csv = read_csv_optional(&file_path)?;
    read_time_series_from_iter(
        supim_csv,
        commodities,
        CommodityType::SupIm,
        num_timesteps,
        |value| (0.0..=1.0).contains(&value),
    )
    .with_context(|| input_err_msg(&file_path))
}

fn read_time_series_from_iter<I, F>(
    iter: I,
    commodities: &CommodityMap,
    kind: CommodityType,
    num_timesteps: u32,
    is_valid: F,
) -> Result<TimeSeriesMap>
where
    I: Iterator<Item = TimeSeriesRaw>,
    F: Fn(f64) -> bool,
{
    let mut partial: IndexMap<_, Vec<Option<f64>>> = IndexMap::new();
    for raw in iter {
        let (key, commodity) = commodities
            .get_key_value(&(
                SiteID::from(raw.site_id.as_str()),
                CommodityID::from(raw.commodity_id.as_str()),
            ))
            .with_context(|| {
                format!(
                    "Commodity {} is not defined at site {}",
                    raw.commodity_id, raw.site_id
                )
            })?;
        ensure!(
            commodity.kind == kind,
            "Commodity {} at site {} must be of type {kind}",
            raw.commodity_id,
            raw.site_id
        );
        ensure!(
            (1..=num_timesteps).contains(&raw.timestep),
            "Timestep {} for {} at site {} is outside of 1..={num_timesteps}",
            raw.timestep,
            raw.commodity_id,
            raw.site_id
        );
        ensure!(
            raw.value.is_finite() && is_valid(raw.value),
            "Invalid value {} for {} at site {} in timestep {}",
            raw.value,
            raw.commodity_id,
            raw.site_id,
            raw.timestep
        );

        let values = partial
            .entry(key.clone())
            .or_insert_with(|| vec![None; num_timesteps as usize]);
        let slot = &mut values[(raw.timestep - 1) as usize];
        ensure!(
            slot.is_none(),
            "Timestep {} for {} at site {} given more than once",
            raw.timestep,
            raw.commodity_id,
            raw.site_id
        );
        *slot = Some(raw.value);
    }

    let mut series = TimeSeriesMap::new();
    for (key, commodity) in commodities {
        if commodity.kind != kind {
            continue;
        }

        let (site_id, commodity_id) = key;
        let values = partial
            .swap_remove(key)
            .with_context(|| {
                format!("No {kind} time series given for {commodity_id} at site {site_id}")
            })?;
        let values = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                value.with_context(|| {
                    format!(
                        "Missing value for {commodity_id} at site {site_id} in timestep {}",
                        i + 1
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;
        series.insert(key.clone(), values);
    }

    Ok(series)
}
