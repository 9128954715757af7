//! Processes convert between commodities. The data structures in this module describe a process
//! installed at a site in a given period along with its capacity, costs and availability.
use crate::commodity::CommodityID;
use crate::id::define_id_type;
use crate::site::SiteID;
use crate::units::{Capacity, Dimensionless, Hours, MoneyPerCapacity, MoneyPerEnergy};
use indexmap::IndexMap;
use serde_string_enum::DeserializeLabeledStringEnum;
use std::fmt;

define_id_type! {ProcessID}

/// Identifies a process at a site in a period
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessKey {
    /// The planning period
    pub period: u32,
    /// The site where the process is located
    pub site_id: SiteID,
    /// The process's ID
    pub process_id: ProcessID,
}

impl ProcessKey {
    /// The same site and process in a different period
    pub fn in_period(&self, period: u32) -> Self {
        Self {
            period,
            ..self.clone()
        }
    }
}

impl fmt::Display for ProcessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "process {} at site {} ({})",
            self.process_id, self.site_id, self.period
        )
    }
}

/// Identifies one commodity output by a process.
///
/// The set of these keys is the "output relation" over which per-output constraints (such as
/// availability) are built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProcessOutputKey {
    /// The process producing the commodity
    pub process: ProcessKey,
    /// The commodity produced
    pub commodity_id: CommodityID,
}

/// A map of [`Process`]es, keyed by [`ProcessKey`]
pub type ProcessMap = IndexMap<ProcessKey, Process>;

/// The commodity ratios of each process, keyed by process ID
pub type ProcessCommodityMap = IndexMap<ProcessID, Vec<ProcessCommodity>>;

/// Represents a process at a site in one period
#[derive(Debug, Clone, PartialEq)]
pub struct Process {
    /// Capacity installed before this period
    pub inst_cap: Capacity,
    /// Minimum total capacity
    pub cap_lo: Capacity,
    /// Maximum total capacity
    pub cap_up: Capacity,
    /// Investment cost per unit of new capacity
    pub inv_cost: MoneyPerCapacity,
    /// Annual fixed cost per unit of total capacity
    pub fix_cost: MoneyPerCapacity,
    /// Cost per unit of throughput
    pub var_cost: MoneyPerEnergy,
    /// Weighted average cost of capital, used for annualising investment costs
    pub wacc: Dimensionless,
    /// Depreciation period in years
    pub depreciation: u32,
    /// Maximum full-load hours per year
    pub availability: Hours,
}

/// Whether a commodity flows into or out of a process
#[derive(Debug, Clone, Copy, PartialEq, Eq, DeserializeLabeledStringEnum, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Direction {
    /// The commodity is consumed
    #[string = "in"]
    In,
    /// The commodity is produced
    #[string = "out"]
    Out,
}

/// Flow of a commodity relative to the throughput of a process
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessCommodity {
    /// The commodity flowing in or out
    pub commodity_id: CommodityID,
    /// Which way the commodity flows
    pub direction: Direction,
    /// Amount of commodity per unit of throughput
    pub ratio: Dimensionless,
}
