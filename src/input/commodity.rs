//! Code for reading commodity-related information from CSV files.
use super::*;
use crate::commodity::{Commodity, CommodityID, CommodityMap, CommodityType};
use crate::id::IDCollection;
use crate::units::{Energy, MoneyPerEnergy};
use serde::Deserialize;
use std::path::Path;

const COMMODITIES_FILE_NAME: &str = "commodities.csv";

#[derive(PartialEq, Debug, Deserialize)]
struct CommodityRaw {
    site_id: String,
    commodity_id: String,
    #[serde(rename = "type")]
    kind: CommodityType,
    #[serde(default)]
    price: MoneyPerEnergy,
    #[serde(deserialize_with = "deserialise_limit")]
    max: Energy,
    #[serde(deserialize_with = "deserialise_limit")]
    max_per_hour: Energy,
}

/// Read commodities for one period from the period's folder.
///
/// # Arguments
///
/// * `period_dir` - Folder containing the period's input files
/// * `site_ids` - All known site IDs
///
/// # Returns
///
/// A map of commodities keyed by site and commodity ID
pub fn read_commodities(period_dir: &Path, site_ids: &IndexSet<SiteID>) -> Result<CommodityMap> {
    let file_path = period_dir.join(COMMODITIES_FILE_NAME);
    let commodities_csv = read_csv(&file_path)?;
    read_commodities_from_iter(commodities_csv, site_ids).with_context(|| input_err_msg(&file_path))
}

fn read_commodities_from_iter<I>(iter: I, site_ids: &IndexSet<SiteID>) -> Result<CommodityMap>
where
    I: Iterator<Item = CommodityRaw>,
{
    let mut commodity_ids: IndexSet<CommodityID> = IndexSet::new();
    let mut commodities = CommodityMap::new();
    for raw in iter {
        let site_id = site_ids.get_id(&raw.site_id)?;
        ensure!(
            !raw.commodity_id.is_empty(),
            "Commodity ID cannot be empty (site {site_id})"
        );
        let commodity_id = intern_id(&mut commodity_ids, &raw.commodity_id);
        ensure!(
            raw.price.is_finite(),
            "Price for commodity {commodity_id} at site {site_id} must be finite"
        );

        let commodity = Commodity {
            kind: raw.kind,
            price: raw.price,
            max: raw.max,
            max_per_hour: raw.max_per_hour,
        };
        try_insert(&mut commodities, (site_id, commodity_id), commodity)?;
    }

    Ok(commodities)
}
