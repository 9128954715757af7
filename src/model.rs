//! The model represents the static input data provided by the user.
use crate::commodity::{CommodityID, CommodityMap};
use crate::process::{ProcessCommodityMap, ProcessMap};
use crate::site::{SiteID, SiteMap};
use crate::storage::StorageMap;
use crate::transmission::TransmissionMap;
use indexmap::IndexMap;
use std::path::PathBuf;

pub mod parameters;
pub use parameters::{ModelParameters, Objective};

/// Time series values for a site and commodity, one entry per modelled timestep.
///
/// The value for timestep `t` is stored at index `t - 1`.
pub type TimeSeriesMap = IndexMap<(SiteID, CommodityID), Vec<f64>>;

/// Model definition
#[derive(Debug)]
pub struct Model {
    /// Path to model folder
    pub model_path: PathBuf,
    /// Parameters from the model TOML file
    pub parameters: ModelParameters,
    /// Sites for the model
    pub sites: SiteMap,
    /// The input data for each planning period, in the order in which they are solved
    pub periods: IndexMap<u32, PeriodInput>,
}

impl Model {
    /// Iterate over the planning periods and their input data, in solving order
    pub fn iter_periods(&self) -> impl Iterator<Item = &PeriodInput> {
        self.periods.values()
    }
}

/// The input data for a single planning period.
///
/// This is an immutable snapshot: when installed capacities are carried over from a previous
/// period, a new [`PeriodInput`] is created rather than the existing one being modified.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodInput {
    /// The planning period
    pub period: u32,
    /// Commodities at each site
    pub commodities: CommodityMap,
    /// Processes at each site
    pub processes: ProcessMap,
    /// Commodity inputs and outputs for each process
    pub process_commodities: ProcessCommodityMap,
    /// Storages at each site
    pub storages: StorageMap,
    /// Transmission links between sites
    pub transmissions: TransmissionMap,
    /// Demand for demand-type commodities
    pub demand: TimeSeriesMap,
    /// Normalised availability of intermittent supply commodities
    pub supim: TimeSeriesMap,
}
