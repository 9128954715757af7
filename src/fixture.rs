//! Fixtures for tests

use crate::commodity::{Commodity, CommodityID, CommodityMap, CommodityType};
use crate::model::{ModelParameters, Objective, PeriodInput, TimeSeriesMap};
use crate::process::{
    Direction, Process, ProcessCommodity, ProcessCommodityMap, ProcessKey, ProcessMap,
};
use crate::scenario::Scenario;
use crate::site::SiteID;
use crate::storage::{Storage, StorageKey, StorageMap};
use crate::transmission::{Transmission, TransmissionKey, TransmissionMap};
use crate::units::{
    Capacity, Dimensionless, Energy, Hours, MoneyPerCapacity, MoneyPerEnergy,
};
use indexmap::indexmap;
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// The number of timesteps in the fixture data
pub const NUM_TIMESTEPS: u32 = 4;

#[fixture]
pub fn model_parameters() -> ModelParameters {
    ModelParameters {
        periods: vec![2020, 2030],
        num_timesteps: NUM_TIMESTEPS,
        dt: Hours(1.0),
        objective: Objective::Cost,
        scenarios: vec![Scenario::base()],
    }
}

fn commodity(kind: CommodityType, price: f64) -> Commodity {
    Commodity {
        kind,
        price: MoneyPerEnergy(price),
        max: Energy(f64::INFINITY),
        max_per_hour: Energy(f64::INFINITY),
    }
}

#[fixture]
pub fn commodities() -> CommodityMap {
    let north = SiteID::from("North");
    indexmap! {
        (north.clone(), "Gas".into()) => commodity(CommodityType::Stock, 20.0),
        (north.clone(), "Wind".into()) => commodity(CommodityType::SupIm, 0.0),
        (north.clone(), "Elec".into()) => commodity(CommodityType::Demand, 0.0),
        (north, "CO2".into()) => commodity(CommodityType::Env, 0.0),
    }
}

/// A process with a large capacity limit and no existing capacity
pub fn process(availability: f64) -> Process {
    Process {
        inst_cap: Capacity(0.0),
        cap_lo: Capacity(0.0),
        cap_up: Capacity(1000.0),
        inv_cost: MoneyPerCapacity(500.0),
        fix_cost: MoneyPerCapacity(10.0),
        var_cost: MoneyPerEnergy(1.0),
        wacc: Dimensionless(0.07),
        depreciation: 20,
        availability: Hours(availability),
    }
}

/// The key for a process at the site "North"
pub fn process_key(period: u32, process_id: &str) -> ProcessKey {
    ProcessKey {
        period,
        site_id: "North".into(),
        process_id: process_id.into(),
    }
}

#[fixture]
pub fn processes() -> ProcessMap {
    indexmap! {
        process_key(2020, "CCGT") => process(8760.0),
        process_key(2020, "WindPark") => Process {
            inv_cost: MoneyPerCapacity(1500.0),
            var_cost: MoneyPerEnergy(0.0),
            ..process(8760.0)
        },
    }
}

fn flow(commodity_id: &str, direction: Direction, ratio: f64) -> ProcessCommodity {
    ProcessCommodity {
        commodity_id: commodity_id.into(),
        direction,
        ratio: Dimensionless(ratio),
    }
}

#[fixture]
pub fn process_commodities() -> ProcessCommodityMap {
    indexmap! {
        "CCGT".into() => vec![
            flow("Gas", Direction::In, 1.0),
            flow("Elec", Direction::Out, 0.6),
            flow("CO2", Direction::Out, 0.2),
        ],
        "WindPark".into() => vec![
            flow("Wind", Direction::In, 1.0),
            flow("Elec", Direction::Out, 1.0),
        ],
    }
}

/// The key for a battery storing electricity at the site "North"
pub fn storage_key(period: u32) -> StorageKey {
    StorageKey {
        period,
        site_id: "North".into(),
        storage_id: "Battery".into(),
        commodity_id: "Elec".into(),
    }
}

#[fixture]
pub fn storage() -> Storage {
    Storage {
        inst_cap_c: Energy(0.0),
        cap_up_c: Energy(f64::INFINITY),
        inst_cap_p: Capacity(0.0),
        cap_up_p: Capacity(f64::INFINITY),
        inv_cost_c: MoneyPerEnergy(100.0),
        inv_cost_p: MoneyPerCapacity(50.0),
        fix_cost_c: MoneyPerEnergy(1.0),
        fix_cost_p: MoneyPerCapacity(1.0),
        var_cost: MoneyPerEnergy(0.01),
        eff_in: Dimensionless(0.9),
        eff_out: Dimensionless(0.9),
        discharge: Dimensionless(0.0),
        init: Dimensionless(0.5),
        wacc: Dimensionless(0.07),
        depreciation: 10,
    }
}

/// The key for a link carrying electricity from "North" to "South"
pub fn transmission_key(period: u32) -> TransmissionKey {
    TransmissionKey {
        period,
        site_in: "North".into(),
        site_out: "South".into(),
        transmission_id: "hvac".into(),
        commodity_id: "Elec".into(),
    }
}

#[fixture]
pub fn transmission() -> Transmission {
    Transmission {
        eff: Dimensionless(0.9),
        inv_cost: MoneyPerCapacity(800.0),
        fix_cost: MoneyPerCapacity(5.0),
        var_cost: MoneyPerEnergy(0.0),
        inst_cap: Capacity(0.0),
        cap_up: Capacity(f64::INFINITY),
        wacc: Dimensionless(0.07),
        depreciation: 40,
    }
}

#[fixture]
pub fn period_input(
    commodities: CommodityMap,
    processes: ProcessMap,
    process_commodities: ProcessCommodityMap,
) -> PeriodInput {
    let key = |id: &str| (SiteID::from("North"), CommodityID::from(id));
    let demand: TimeSeriesMap = indexmap! { key("Elec") => vec![10.0, 20.0, 30.0, 20.0] };
    let supim: TimeSeriesMap = indexmap! { key("Wind") => vec![0.5, 0.0, 1.0, 0.25] };

    PeriodInput {
        period: 2020,
        commodities,
        processes,
        process_commodities,
        storages: StorageMap::new(),
        transmissions: TransmissionMap::new(),
        demand,
        supim,
    }
}
