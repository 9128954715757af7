//! Storages hold a commodity at a site, with separate energy (content) and power capacities.
use crate::commodity::CommodityID;
use crate::id::define_id_type;
use crate::site::SiteID;
use crate::units::{Capacity, Dimensionless, Energy, MoneyPerCapacity, MoneyPerEnergy};
use indexmap::IndexMap;
use std::fmt;

define_id_type! {StorageID}

/// Identifies a storage at a site in a period
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageKey {
    /// The planning period
    pub period: u32,
    /// The site where the storage is located
    pub site_id: SiteID,
    /// The storage technology
    pub storage_id: StorageID,
    /// The stored commodity
    pub commodity_id: CommodityID,
}

impl StorageKey {
    /// The same storage in a different period
    pub fn in_period(&self, period: u32) -> Self {
        Self {
            period,
            ..self.clone()
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "storage {} of {} at site {} ({})",
            self.storage_id, self.commodity_id, self.site_id, self.period
        )
    }
}

/// A map of [`Storage`]s, keyed by [`StorageKey`]
pub type StorageMap = IndexMap<StorageKey, Storage>;

/// Represents a storage in one period
#[derive(Debug, Clone, PartialEq)]
pub struct Storage {
    /// Content capacity installed before this period
    pub inst_cap_c: Energy,
    /// Maximum content capacity
    pub cap_up_c: Energy,
    /// Power capacity installed before this period
    pub inst_cap_p: Capacity,
    /// Maximum power capacity
    pub cap_up_p: Capacity,
    /// Investment cost per unit of new content capacity
    pub inv_cost_c: MoneyPerEnergy,
    /// Investment cost per unit of new power capacity
    pub inv_cost_p: MoneyPerCapacity,
    /// Annual fixed cost per unit of content capacity
    pub fix_cost_c: MoneyPerEnergy,
    /// Annual fixed cost per unit of power capacity
    pub fix_cost_p: MoneyPerCapacity,
    /// Cost per unit discharged
    pub var_cost: MoneyPerEnergy,
    /// Charging efficiency
    pub eff_in: Dimensionless,
    /// Discharging efficiency
    pub eff_out: Dimensionless,
    /// Fraction of content lost per hour
    pub discharge: Dimensionless,
    /// Initial (and minimum final) state of charge as a fraction of content capacity
    pub init: Dimensionless,
    /// Weighted average cost of capital
    pub wacc: Dimensionless,
    /// Depreciation period in years
    pub depreciation: u32,
}
