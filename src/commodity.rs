//! Commodities are the energy and material carriers produced and consumed by processes.
use crate::id::define_id_type;
use crate::site::SiteID;
use crate::units::{Energy, MoneyPerEnergy};
use indexmap::IndexMap;
use serde_string_enum::DeserializeLabeledStringEnum;

define_id_type! {CommodityID}

/// A map of [`Commodity`] records, keyed by site and commodity ID
pub type CommodityMap = IndexMap<(SiteID, CommodityID), Commodity>;

/// A commodity available at a particular site in one period
#[derive(Debug, Clone, PartialEq)]
pub struct Commodity {
    /// The commodity's type
    pub kind: CommodityType,
    /// Price per unit bought (stock) or emitted (env)
    pub price: MoneyPerEnergy,
    /// Maximum annual amount bought (stock) or emitted (env)
    pub max: Energy,
    /// Maximum amount bought (stock) or emitted (env) per hour
    pub max_per_hour: Energy,
}

/// The type of a commodity
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, DeserializeLabeledStringEnum, strum::Display,
)]
#[strum(serialize_all = "snake_case")]
pub enum CommodityType {
    /// Can be bought at a given price
    #[string = "stock"]
    Stock,
    /// Has a time-dependent demand which must be met
    #[string = "demand"]
    Demand,
    /// Intermittent supply, available according to a normalised time series
    #[string = "supim"]
    #[strum(serialize = "supim")]
    SupIm,
    /// Environmental commodity (e.g. emissions), which may be priced and limited
    #[string = "env"]
    Env,
}
