//! Scenarios are named variations of a model's input data.
//!
//! Each scenario is defined in `model.toml` and its changes are applied to the input data of every
//! period before that period is solved. Every scenario is a separate run of the whole model, with
//! its own set of output files.
use crate::commodity::{CommodityID, CommodityType};
use crate::model::PeriodInput;
use crate::process::ProcessID;
use crate::site::SiteID;
use crate::units::{Capacity, Dimensionless, Energy, MoneyPerEnergy};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use serde::Deserialize;

/// The name of the scenario run when a model does not define any
pub const BASE_SCENARIO: &str = "base";

/// A replacement for the annual limit on a commodity at a site
#[derive(Debug, Deserialize, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct CommodityMax {
    /// The site
    pub site: SiteID,
    /// The commodity
    pub commodity: CommodityID,
    /// The new maximum annual amount
    pub max: Energy,
}

/// A replacement for the capacity limit of a process at a site
#[derive(Debug, Deserialize, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct ProcessCapUp {
    /// The site
    pub site: SiteID,
    /// The process
    pub process: ProcessID,
    /// The new upper limit on total capacity
    pub cap_up: Capacity,
}

/// A named set of changes to the input data
#[derive(Debug, Deserialize, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Name of the scenario, used for naming output files
    pub name: String,
    /// Multiplies the price of every stock commodity
    #[serde(default)]
    pub stock_price_factor: Option<Dimensionless>,
    /// Multiplies every value of every demand time series
    #[serde(default)]
    pub demand_factor: Option<Dimensionless>,
    /// Commodity limits to replace
    #[serde(default)]
    pub commodity_max: Vec<CommodityMax>,
    /// Process capacity limits to replace
    #[serde(default)]
    pub process_cap_up: Vec<ProcessCapUp>,
}

/// Check that a scenario name can be used in file names
fn check_scenario_name(name: &str) -> Result<()> {
    ensure!(
        !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'),
        "Scenario name must be a non-empty name made of letters, digits, '_' and '-' (got '{name}')"
    );

    Ok(())
}

impl Scenario {
    /// A scenario which leaves the input data unchanged
    pub fn base() -> Self {
        Self {
            name: BASE_SCENARIO.into(),
            stock_price_factor: None,
            demand_factor: None,
            commodity_max: Vec::new(),
            process_cap_up: Vec::new(),
        }
    }

    /// Check the scenario's own values
    pub fn validate(&self) -> Result<()> {
        check_scenario_name(&self.name)?;

        for (field, factor) in [
            ("stock_price_factor", self.stock_price_factor),
            ("demand_factor", self.demand_factor),
        ] {
            if let Some(factor) = factor {
                ensure!(
                    factor.is_finite() && factor >= Dimensionless(0.0),
                    "{field} for scenario {} must be a finite non-negative number",
                    self.name
                );
            }
        }
        for limit in &self.commodity_max {
            ensure!(
                limit.max >= Energy(0.0),
                "max for {} at {} in scenario {} cannot be negative",
                limit.commodity,
                limit.site,
                self.name
            );
        }
        for limit in &self.process_cap_up {
            ensure!(
                limit.cap_up >= Capacity(0.0),
                "cap_up for {} at {} in scenario {} cannot be negative",
                limit.process,
                limit.site,
                self.name
            );
        }

        Ok(())
    }

    /// Check that the scenario can be applied to every period of a model.
    ///
    /// Every commodity and process named by the scenario must exist in at least one period.
    pub fn check_periods(&self, periods: &IndexMap<u32, PeriodInput>) -> Result<()> {
        for limit in &self.commodity_max {
            let key = (limit.site.clone(), limit.commodity.clone());
            ensure!(
                periods
                    .values()
                    .any(|input| input.commodities.contains_key(&key)),
                "Scenario {} refers to unknown commodity {} at site {}",
                self.name,
                limit.commodity,
                limit.site
            );
        }
        for limit in &self.process_cap_up {
            ensure!(
                periods.values().any(|input| {
                    input
                        .processes
                        .keys()
                        .any(|key| key.site_id == limit.site && key.process_id == limit.process)
                }),
                "Scenario {} refers to unknown process {} at site {}",
                self.name,
                limit.process,
                limit.site
            );
        }

        for input in periods.values() {
            self.apply(input)
                .with_context(|| format!("Invalid data for period {}", input.period))?;
        }

        Ok(())
    }

    /// Create a copy of a period's input data with the scenario's changes applied.
    ///
    /// Entities named by the scenario which are absent from the period are skipped.
    pub fn apply(&self, input: &PeriodInput) -> Result<PeriodInput> {
        let mut updated = input.clone();

        if let Some(factor) = self.stock_price_factor {
            for commodity in updated
                .commodities
                .values_mut()
                .filter(|commodity| commodity.kind == CommodityType::Stock)
            {
                commodity.price = MoneyPerEnergy(commodity.price.value() * factor.value());
            }
        }

        if let Some(factor) = self.demand_factor {
            for value in updated.demand.values_mut().flatten() {
                *value *= factor.value();
            }
        }

        for limit in &self.commodity_max {
            let key = (limit.site.clone(), limit.commodity.clone());
            if let Some(commodity) = updated.commodities.get_mut(&key) {
                commodity.max = limit.max;
            }
        }

        for limit in &self.process_cap_up {
            for (key, process) in updated
                .processes
                .iter_mut()
                .filter(|(key, _)| key.site_id == limit.site && key.process_id == limit.process)
            {
                ensure!(
                    process.inst_cap <= limit.cap_up && process.cap_lo <= limit.cap_up,
                    "cap_up {} for {key} in scenario {} is below its installed capacity or \
                     lower limit",
                    limit.cap_up.value(),
                    self.name
                );
                process.cap_up = limit.cap_up;
            }
        }

        Ok(updated)
    }
}

/// Pick out the named scenarios, in the order given, or all of them if no names are given
pub fn select_scenarios<'a>(
    scenarios: &'a [Scenario],
    names: &[String],
) -> Result<Vec<&'a Scenario>> {
    if names.is_empty() {
        return Ok(scenarios.iter().collect());
    }

    names
        .iter()
        .map(|name| {
            scenarios
                .iter()
                .find(|scenario| scenario.name == *name)
                .with_context(|| format!("Unknown scenario: {name}"))
        })
        .collect()
}
