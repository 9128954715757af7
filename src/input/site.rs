//! Code for reading site-related information from CSV files.
use super::*;
use crate::site::{Site, SiteMap};
use std::path::Path;

const SITES_FILE_NAME: &str = "sites.csv";

/// Reads sites from a CSV file.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// A [`SiteMap`] with the parsed sites data or an error
pub fn read_sites(model_dir: &Path) -> Result<SiteMap> {
    let file_path = model_dir.join(SITES_FILE_NAME);
    let mut sites = SiteMap::new();
    for site in read_csv::<Site>(&file_path)? {
        ensure!(
            !site.id.0.is_empty(),
            "Site ID cannot be empty (in {})",
            file_path.display()
        );
        try_insert(&mut sites, site.id.clone(), site)
            .with_context(|| input_err_msg(&file_path))?;
    }

    Ok(sites)
}
