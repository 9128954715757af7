//! Sites represent the locations at which processes, storages and transmission endpoints sit.
use crate::id::define_id_type;
use indexmap::IndexMap;
use serde::Deserialize;

define_id_type! {SiteID}

/// A map of [`Site`]s, keyed by site ID
pub type SiteMap = IndexMap<SiteID, Site>;

/// Represents a site with an ID and a longer description.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Site {
    /// A unique identifier for a site (e.g. "North").
    pub id: SiteID,
    /// A text description of the site (e.g. "Northern region").
    pub description: String,
}
