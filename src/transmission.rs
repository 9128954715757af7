//! Transmission links move a commodity from one site to another.
use crate::commodity::CommodityID;
use crate::id::define_id_type;
use crate::site::SiteID;
use crate::units::{Capacity, Dimensionless, MoneyPerCapacity, MoneyPerEnergy};
use indexmap::IndexMap;
use std::fmt;

define_id_type! {TransmissionID}

/// Identifies a directed transmission link in a period
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransmissionKey {
    /// The planning period
    pub period: u32,
    /// The site the commodity leaves
    pub site_in: SiteID,
    /// The site the commodity arrives at
    pub site_out: SiteID,
    /// The transmission technology
    pub transmission_id: TransmissionID,
    /// The transported commodity
    pub commodity_id: CommodityID,
}

impl TransmissionKey {
    /// The same link in a different period
    pub fn in_period(&self, period: u32) -> Self {
        Self {
            period,
            ..self.clone()
        }
    }
}

impl fmt::Display for TransmissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "transmission {} of {} from {} to {} ({})",
            self.transmission_id, self.commodity_id, self.site_in, self.site_out, self.period
        )
    }
}

/// A map of [`Transmission`]s, keyed by [`TransmissionKey`]
pub type TransmissionMap = IndexMap<TransmissionKey, Transmission>;

/// Represents a transmission link in one period
#[derive(Debug, Clone, PartialEq)]
pub struct Transmission {
    /// Transmission efficiency
    pub eff: Dimensionless,
    /// Investment cost per unit of new capacity
    pub inv_cost: MoneyPerCapacity,
    /// Annual fixed cost per unit of capacity
    pub fix_cost: MoneyPerCapacity,
    /// Cost per unit transported
    pub var_cost: MoneyPerEnergy,
    /// Capacity installed before this period
    pub inst_cap: Capacity,
    /// Maximum capacity
    pub cap_up: Capacity,
    /// Weighted average cost of capital
    pub wacc: Dimensionless,
    /// Depreciation period in years
    pub depreciation: u32,
}
