//! Code for reading storage-related information from CSV files.
use super::*;
use crate::commodity::{CommodityID, CommodityMap};
use crate::id::IDCollection;
use crate::storage::{Storage, StorageID, StorageKey, StorageMap};
use crate::units::{Capacity, Dimensionless, Energy, MoneyPerCapacity, MoneyPerEnergy};
use serde::Deserialize;
use std::path::Path;

const STORAGES_FILE_NAME: &str = "storages.csv";

#[derive(PartialEq, Debug, Deserialize)]
struct StorageRaw {
    site_id: String,
    storage_id: String,
    commodity_id: String,
    inst_cap_c: Energy,
    #[serde(deserialize_with = "deserialise_limit")]
    cap_up_c: Energy,
    inst_cap_p: Capacity,
    #[serde(deserialize_with = "deserialise_limit")]
    cap_up_p: Capacity,
    inv_cost_c: MoneyPerEnergy,
    inv_cost_p: MoneyPerCapacity,
    fix_cost_c: MoneyPerEnergy,
    fix_cost_p: MoneyPerCapacity,
    var_cost: MoneyPerEnergy,
    #[serde(deserialize_with = "deserialise_proportion_nonzero")]
    eff_in: Dimensionless,
    #[serde(deserialize_with = "deserialise_proportion_nonzero")]
    eff_out: Dimensionless,
    #[serde(deserialize_with = "deserialise_proportion")]
    discharge: Dimensionless,
    #[serde(deserialize_with = "deserialise_proportion")]
    init: Dimensionless,
    #[serde(deserialize_with = "deserialise_proportion")]
    wacc: Dimensionless,
    depreciation: u32,
}

/// Read storages for one period. The file is optional.
///
/// # Arguments
///
/// * `period_dir` - Folder containing the period's input files
/// * `period` - The planning period
/// * `commodities` - The period's commodities
pub fn read_storages(
    period_dir: &Path,
    period: u32,
    commodities: &CommodityMap,
) -> Result<StorageMap> {
    let file_path = period_dir.join(STORAGES_FILE_NAME);
    let storages_csv = read_csv_optional(&file_path)?;
    read_storages_from_iter(storages_csv, period, commodities)
        .with_context(|| input_err_msg(&file_path))
}

fn read_storages_from_iter<I>(iter: I, period: u32, commodities: &CommodityMap) -> Result<StorageMap>
where
    I: Iterator<Item = StorageRaw>,
{
    let site_ids: IndexSet<SiteID> = commodities.keys().map(|(site, _)| site.clone()).collect();
    let commodity_ids: IndexSet<CommodityID> =
        commodities.keys().map(|(_, id)| id.clone()).collect();
    let mut storage_ids: IndexSet<StorageID> = IndexSet::new();

    let mut storages = StorageMap::new();
    for raw in iter {
        ensure!(!raw.storage_id.is_empty(), "Storage ID cannot be empty");
        let key = StorageKey {
            period,
            site_id: site_ids.get_id(&raw.site_id)?,
            storage_id: intern_id(&mut storage_ids, &raw.storage_id),
            commodity_id: commodity_ids.get_id(&raw.commodity_id)?,
        };
        ensure!(
            commodities.contains_key(&(key.site_id.clone(), key.commodity_id.clone())),
            "Commodity {} stored by {key} is not defined at site {}",
            key.commodity_id,
            key.site_id
        );

        ensure!(
            raw.inst_cap_c >= Energy(0.0)
                && raw.inst_cap_c.is_finite()
                && raw.inst_cap_c <= raw.cap_up_c,
            "inst_cap_c for {key} must be between 0 and cap_up_c"
        );
        ensure!(
            raw.inst_cap_p >= Capacity(0.0)
                && raw.inst_cap_p.is_finite()
                && raw.inst_cap_p <= raw.cap_up_p,
            "inst_cap_p for {key} must be between 0 and cap_up_p"
        );
        ensure!(
            raw.depreciation > 0,
            "depreciation for {key} must be greater than zero"
        );

        let storage = Storage {
            inst_cap_c: raw.inst_cap_c,
            cap_up_c: raw.cap_up_c,
            inst_cap_p: raw.inst_cap_p,
            cap_up_p: raw.cap_up_p,
            inv_cost_c: raw.inv_cost_c,
            inv_cost_p: raw.inv_cost_p,
            fix_cost_c: raw.fix_cost_c,
            fix_cost_p: raw.fix_cost_p,
            var_cost: raw.var_cost,
            eff_in: raw.eff_in,
            eff_out: raw.eff_out,
            discharge: raw.discharge,
            init: raw.init,
            wacc: raw.wacc,
            depreciation: raw.depreciation,
        };
        try_insert(&mut storages, key, storage)?;
    }

    Ok(storages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commodity::{Commodity, CommodityType};
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn commodities() -> CommodityMap {
        [(
            ("North".into(), "Elec".into()),
            Commodity {
                kind: CommodityType::Demand,
                price: MoneyPerEnergy(0.0),
                max: Energy(f64::INFINITY),
                max_per_hour: Energy(f64::INFINITY),
            },
        )]
        .into_iter()
        .collect()
    }

    const HEADER: &str = "site_id,storage_id,commodity_id,inst_cap_c,cap_up_c,inst_cap_p,cap_up_p,\
                          inv_cost_c,inv_cost_p,fix_cost_c,fix_cost_p,var_cost,eff_in,eff_out,\
                          discharge,init,wacc,depreciation";

    #[test]
    fn test_read_storages() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(STORAGES_FILE_NAME)).unwrap();
            writeln!(
                file,
                "{HEADER}\nNorth,Battery,Elec,0,,0,,100,50,1,1,0.01,0.95,0.95,0.0001,0.5,0.07,10"
            )
            .unwrap();
        }

        let storages = read_storages(dir.path(), 2020, &commodities()).unwrap();
        let (key, storage) = storages.first().unwrap();
        assert_eq!(key.period, 2020);
        assert_eq!(key.storage_id, "Battery".into());
        assert_eq!(storage.cap_up_c, Energy(f64::INFINITY));
        assert_eq!(storage.eff_in, Dimensionless(0.95));
    }

    #[test]
    fn test_read_storages_missing_file() {
        let dir = tempdir().unwrap();
        assert!(read_storages(dir.path(), 2020, &commodities()).unwrap().is_empty());
    }

    #[test]
    fn test_read_storages_bad_efficiency() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(STORAGES_FILE_NAME)).unwrap();
            writeln!(
                file,
                "{HEADER}\nNorth,Battery,Elec,0,,0,,100,50,1,1,0.01,0,0.95,0.0001,0.5,0.07,10"
            )
            .unwrap();
        }

        assert!(read_storages(dir.path(), 2020, &commodities()).is_err());
    }

    #[test]
    fn test_read_storages_unknown_commodity() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(STORAGES_FILE_NAME)).unwrap();
            writeln!(
                file,
                "{HEADER}\nNorth,Tank,Heat,0,,0,,100,50,1,1,0.01,0.9,0.9,0,0.5,0.07,10"
            )
            .unwrap();
        }

        assert!(read_storages(dir.path(), 2020, &commodities()).is_err());
    }
}
