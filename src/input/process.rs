//! Code for reading process-related information from CSV files.
use super::*;
use crate::commodity::{CommodityID, CommodityMap};
use crate::error::ModelError;
use crate::id::IDCollection;
use crate::process::{
    Direction, Process, ProcessCommodity, ProcessCommodityMap, ProcessID, ProcessKey, ProcessMap,
};
use crate::units::{Capacity, Dimensionless, HOURS_PER_YEAR, Hours, MoneyPerCapacity, MoneyPerEnergy};
use serde::Deserialize;
use std::path::Path;

const PROCESSES_FILE_NAME: &str = "processes.csv";
const PROCESS_COMMODITIES_FILE_NAME: &str = "process_commodities.csv";

#[derive(PartialEq, Debug, Deserialize)]
struct ProcessRaw {
    site_id: String,
    process_id: String,
    inst_cap: Capacity,
    cap_lo: Capacity,
    #[serde(deserialize_with = "deserialise_limit")]
    cap_up: Capacity,
    inv_cost: MoneyPerCapacity,
    fix_cost: MoneyPerCapacity,
    var_cost: MoneyPerEnergy,
    #[serde(deserialize_with = "deserialise_proportion")]
    wacc: Dimensionless,
    depreciation: u32,
    availability: Hours,
}

#[derive(PartialEq, Debug, Deserialize)]
struct ProcessCommodityRaw {
    process_id: String,
    commodity_id: String,
    direction: Direction,
    ratio: Dimensionless,
}

/// Read processes for one period from the period's folder.
///
/// # Arguments
///
/// * `period_dir` - Folder containing the period's input files
/// * `period` - The planning period
/// * `site_ids` - All known site IDs
///
/// # Returns
///
/// A map of processes keyed by [`ProcessKey`]
pub fn read_processes(
    period_dir: &Path,
    period: u32,
    site_ids: &IndexSet<SiteID>,
) -> Result<ProcessMap> {
    let file_path = period_dir.join(PROCESSES_FILE_NAME);
    let processes_csv = read_csv(&file_path)?;
    read_processes_from_iter(processes_csv, period, site_ids)
        .with_context(|| input_err_msg(&file_path))
}

/// Check that a process's availability lies within (0, 8760] hours
fn check_availability(key: &ProcessKey, availability: Hours) -> Result<()> {
    let value = availability.value();
    if !(value > 0.0 && value <= HOURS_PER_YEAR) {
        return Err(ModelError::InvalidAvailability {
            entity: key.to_string(),
            value,
        }
        .into());
    }

    Ok(())
}

fn read_processes_from_iter<I>(
    iter: I,
    period: u32,
    site_ids: &IndexSet<SiteID>,
) -> Result<ProcessMap>
where
    I: Iterator<Item = ProcessRaw>,
{
    let mut process_ids: IndexSet<ProcessID> = IndexSet::new();
    let mut processes = ProcessMap::new();
    for raw in iter {
        ensure!(!raw.process_id.is_empty(), "Process ID cannot be empty");
        let key = ProcessKey {
            period,
            site_id: site_ids.get_id(&raw.site_id)?,
            process_id: intern_id(&mut process_ids, &raw.process_id),
        };

        check_availability(&key, raw.availability)?;
        ensure!(
            raw.inst_cap >= Capacity(0.0) && raw.inst_cap.is_finite(),
            "inst_cap for {key} must be a finite non-negative number"
        );
        ensure!(
            raw.inst_cap <= raw.cap_up,
            "inst_cap for {key} cannot be greater than cap_up"
        );
        ensure!(
            raw.cap_lo >= Capacity(0.0) && raw.cap_lo <= raw.cap_up,
            "cap_lo for {key} must be between 0 and cap_up"
        );
        ensure!(
            raw.depreciation > 0,
            "depreciation for {key} must be greater than zero"
        );
        for (name, value) in [
            ("inv_cost", raw.inv_cost.value()),
            ("fix_cost", raw.fix_cost.value()),
            ("var_cost", raw.var_cost.value()),
        ] {
            ensure!(value.is_finite(), "{name} for {key} must be finite");
        }

        let process = Process {
            inst_cap: raw.inst_cap,
            cap_lo: raw.cap_lo,
            cap_up: raw.cap_up,
            inv_cost: raw.inv_cost,
            fix_cost: raw.fix_cost,
            var_cost: raw.var_cost,
            wacc: raw.wacc,
            depreciation: raw.depreciation,
            availability: raw.availability,
        };
        try_insert(&mut processes, key, process)?;
    }

    Ok(processes)
}

/// Read the commodity inputs and outputs of processes for one period.
///
/// # Arguments
///
/// * `period_dir` - Folder containing the period's input files
/// * `processes` - The period's processes
/// * `commodities` - The period's commodities
///
/// # Returns
///
/// The commodity flows of each process, keyed by process ID
pub fn read_process_commodities(
    period_dir: &Path,
    processes: &ProcessMap,
    commodities: &CommodityMap,
) -> Result<ProcessCommodityMap> {
    let file_path = period_dir.join(PROCESS_COMMODITIES_FILE_NAME);
    let process_commodities_csv = read_csv(&file_path)?;
    read_process_commodities_from_iter(process_commodities_csv, processes, commodities)
        .with_context(|| input_err_msg(&file_path))
}

fn read_process_commodities_from_iter<I>(
    iter: I,
    processes: &ProcessMap,
    commodities: &CommodityMap,
) -> Result<ProcessCommodityMap>
where
    I: Iterator<Item = ProcessCommodityRaw>,
{
    let process_ids: IndexSet<ProcessID> =
        processes.keys().map(|key| key.process_id.clone()).collect();
    let commodity_ids: IndexSet<CommodityID> =
        commodities.keys().map(|(_, id)| id.clone()).collect();

    let mut map = ProcessCommodityMap::new();
    for raw in iter {
        let process_id = process_ids.get_id(&raw.process_id)?;
        let commodity_id = commodity_ids.get_id(&raw.commodity_id)?;
        ensure!(
            raw.ratio > Dimensionless(0.0) && raw.ratio.is_finite(),
            "Ratio of {commodity_id} for process {process_id} must be a finite number greater \
             than zero"
        );

        let flows = map.entry(process_id.clone()).or_insert_with(Vec::new);
        ensure!(
            flows.iter().all(|flow: &ProcessCommodity| flow.commodity_id != commodity_id
                || flow.direction != raw.direction),
            "Commodity {commodity_id} listed twice in the same direction for process {process_id}"
        );
        flows.push(ProcessCommodity {
            commodity_id,
            direction: raw.direction,
            ratio: raw.ratio,
        });
    }

    validate_process_commodities(&map, processes, commodities)?;

    Ok(map)
}

/// Check that every process has an output and that its commodities exist at its sites
fn validate_process_commodities(
    map: &ProcessCommodityMap,
    processes: &ProcessMap,
    commodities: &CommodityMap,
) -> Result<()> {
    for key in processes.keys() {
        let flows = map
            .get(&key.process_id)
            .with_context(|| format!("No commodities defined for {key}"))?;
        ensure!(
            flows.iter().any(|flow| flow.direction == Direction::Out),
            "{key} must have at least one output commodity"
        );

        for flow in flows {
            ensure!(
                commodities.contains_key(&(key.site_id.clone(), flow.commodity_id.clone())),
                "Commodity {} used by {key} is not defined at site {}",
                flow.commodity_id,
                key.site_id
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commodity::{Commodity, CommodityType};
    use crate::units::Energy;
    use rstest::{fixture, rstest};

    #[fixture]
    fn site_ids() -> IndexSet<SiteID> {
        ["North".into()].into_iter().collect()
    }

    fn process_raw(process_id: &str, availability: f64) -> ProcessRaw {
        ProcessRaw {
            site_id: "North".into(),
            process_id: process_id.into(),
            inst_cap: Capacity(10.0),
            cap_lo: Capacity(0.0),
            cap_up: Capacity(100.0),
            inv_cost: MoneyPerCapacity(1000.0),
            fix_cost: MoneyPerCapacity(10.0),
            var_cost: MoneyPerEnergy(1.0),
            wacc: Dimensionless(0.07),
            depreciation: 20,
            availability: Hours(availability),
        }
    }

    fn commodities() -> CommodityMap {
        [("Gas", CommodityType::Stock), ("Elec", CommodityType::Demand)]
            .into_iter()
            .map(|(id, kind)| {
                (
                    ("North".into(), id.into()),
                    Commodity {
                        kind,
                        price: MoneyPerEnergy(0.0),
                        max: Energy(f64::INFINITY),
                        max_per_hour: Energy(f64::INFINITY),
                    },
                )
            })
            .collect()
    }

    fn flow_raw(process_id: &str, commodity_id: &str, direction: Direction) -> ProcessCommodityRaw {
        ProcessCommodityRaw {
            process_id: process_id.into(),
            commodity_id: commodity_id.into(),
            direction,
            ratio: Dimensionless(1.0),
        }
    }

    #[rstest]
    fn test_read_processes_from_iter(site_ids: IndexSet<SiteID>) {
        let processes = read_processes_from_iter(
            [process_raw("CCGT", 8760.0), process_raw("Wind", 3000.0)].into_iter(),
            2020,
            &site_ids,
        )
        .unwrap();
        assert_eq!(processes.len(), 2);
        let key = processes.keys().next().unwrap();
        assert_eq!(key.period, 2020);
        assert_eq!(key.process_id, "CCGT".into());
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.0)]
    #[case(8760.5)]
    #[case(f64::NAN)]
    fn test_read_processes_invalid_availability(
        site_ids: IndexSet<SiteID>,
        #[case] availability: f64,
    ) {
        let err = read_processes_from_iter(
            [process_raw("CCGT", availability)].into_iter(),
            2020,
            &site_ids,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ModelError>(),
            Some(ModelError::InvalidAvailability { .. })
        ));
    }

    #[rstest]
    fn test_read_processes_inst_cap_above_cap_up(site_ids: IndexSet<SiteID>) {
        let mut raw = process_raw("CCGT", 8760.0);
        raw.inst_cap = Capacity(200.0);
        assert!(read_processes_from_iter([raw].into_iter(), 2020, &site_ids).is_err());
    }

    #[rstest]
    fn test_read_processes_bad_site(site_ids: IndexSet<SiteID>) {
        let mut raw = process_raw("CCGT", 8760.0);
        raw.site_id = "South".into();
        assert!(read_processes_from_iter([raw].into_iter(), 2020, &site_ids).is_err());
    }

    #[rstest]
    fn test_read_process_commodities(site_ids: IndexSet<SiteID>) {
        let processes =
            read_processes_from_iter([process_raw("CCGT", 8760.0)].into_iter(), 2020, &site_ids)
                .unwrap();
        let map = read_process_commodities_from_iter(
            [
                flow_raw("CCGT", "Gas", Direction::In),
                flow_raw("CCGT", "Elec", Direction::Out),
            ]
            .into_iter(),
            &processes,
            &commodities(),
        )
        .unwrap();
        assert_eq!(map["CCGT"].len(), 2);
        assert_eq!(map["CCGT"][1].direction, Direction::Out);
    }

    #[rstest]
    fn test_read_process_commodities_no_output(site_ids: IndexSet<SiteID>) {
        let processes =
            read_processes_from_iter([process_raw("CCGT", 8760.0)].into_iter(), 2020, &site_ids)
                .unwrap();
        assert!(
            read_process_commodities_from_iter(
                [flow_raw("CCGT", "Gas", Direction::In)].into_iter(),
                &processes,
                &commodities(),
            )
            .is_err()
        );
    }

    #[rstest]
    fn test_read_process_commodities_unknown_commodity(site_ids: IndexSet<SiteID>) {
        let processes =
            read_processes_from_iter([process_raw("CCGT", 8760.0)].into_iter(), 2020, &site_ids)
                .unwrap();
        assert!(
            read_process_commodities_from_iter(
                [flow_raw("CCGT", "Coal", Direction::Out)].into_iter(),
                &processes,
                &commodities(),
            )
            .is_err()
        );
    }

    #[rstest]
    fn test_read_process_commodities_bad_ratio(site_ids: IndexSet<SiteID>) {
        let processes =
            read_processes_from_iter([process_raw("CCGT", 8760.0)].into_iter(), 2020, &site_ids)
                .unwrap();
        let mut raw = flow_raw("CCGT", "Elec", Direction::Out);
        raw.ratio = Dimensionless(0.0);
        assert!(
            read_process_commodities_from_iter([raw].into_iter(), &processes, &commodities())
                .is_err()
        );
    }
}
