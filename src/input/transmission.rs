//! Code for reading transmission links from CSV files.
use super::*;
use crate::commodity::{CommodityID, CommodityMap};
use crate::id::IDCollection;
use crate::transmission::{Transmission, TransmissionID, TransmissionKey, TransmissionMap};
use crate::units::{Capacity, Dimensionless, MoneyPerCapacity, MoneyPerEnergy};
use serde::Deserialize;
use std::path::Path;

const TRANSMISSIONS_FILE_NAME: &str = "transmissions.csv";

#[derive(PartialEq, Debug, Deserialize)]
struct TransmissionRaw {
    site_in: String,
    site_out: String,
    transmission_id: String,
    commodity_id: String,
    #[serde(deserialize_with = "deserialise_proportion_nonzero")]
    eff: Dimensionless,
    inv_cost: MoneyPerCapacity,
    fix_cost: MoneyPerCapacity,
    var_cost: MoneyPerEnergy,
    inst_cap: Capacity,
    #[serde(deserialize_with = "deserialise_limit")]
    cap_up: Capacity,
    #[serde(deserialize_with = "deserialise_proportion")]
    wacc: Dimensionless,
    depreciation: u32,
}

/// Read transmission links for one period. The file is optional.
///
/// Each row describes a directed link; a bidirectional connection needs one row per direction.
pub fn read_transmissions(
    period_dir: &Path,
    period: u32,
    commodities: &CommodityMap,
) -> Result<TransmissionMap> {
    let file_path = period_dir.join(TRANSMISSIONS_FILE_NAME);
    let transmissions_csv = read_csv_optional(&file_path)?;
    read_transmissions_from_iter(transmissions_csv, period, commodities)
        .with_context(|| input_err_msg(&file_path))
}

fn read_transmissions_from_iter<I>(
    iter: I,
    period: u32,
    commodities: &CommodityMap,
) -> Result<TransmissionMap>
where
    I: Iterator<Item = TransmissionRaw>,
{
    let site_ids: IndexSet<SiteID> = commodities.keys().map(|(site, _)| site.clone()).collect();
    let commodity_ids: IndexSet<CommodityID> =
        commodities.keys().map(|(_, id)| id.clone()).collect();
    let mut transmission_ids: IndexSet<TransmissionID> = IndexSet::new();

    let mut transmissions = TransmissionMap::new();
    for raw in iter {
        ensure!(
            !raw.transmission_id.is_empty(),
            "Transmission ID cannot be empty"
        );
        let key = TransmissionKey {
            period,
            site_in: site_ids.get_id(&raw.site_in)?,
            site_out: site_ids.get_id(&raw.site_out)?,
            transmission_id: intern_id(&mut transmission_ids, &raw.transmission_id),
            commodity_id: commodity_ids.get_id(&raw.commodity_id)?,
        };
        ensure!(
            key.site_in != key.site_out,
            "{key} must connect two different sites"
        );
        for site_id in [&key.site_in, &key.site_out] {
            ensure!(
                commodities.contains_key(&(site_id.clone(), key.commodity_id.clone())),
                "Commodity {} carried by {key} is not defined at site {site_id}",
                key.commodity_id
            );
        }
        ensure!(
            raw.inst_cap >= Capacity(0.0) && raw.inst_cap.is_finite() && raw.inst_cap <= raw.cap_up,
            "inst_cap for {key} must be between 0 and cap_up"
        );
        ensure!(
            raw.depreciation > 0,
            "depreciation for {key} must be greater than zero"
        );

        let transmission = Transmission {
            eff: raw.eff,
            inv_cost: raw.inv_cost,
            fix_cost: raw.fix_cost,
            var_cost: raw.var_cost,
            inst_cap: raw.inst_cap,
            cap_up: raw.cap_up,
            wacc: raw.wacc,
            depreciation: raw.depreciation,
        };
        try_insert(&mut transmissions, key, transmission)?;
    }

    Ok(transmissions)
}
