//! Common functionality for capplan, a myopic capacity-expansion planner for energy systems.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod cli;
pub mod commodity;
pub mod error;
pub mod finance;
pub mod graph;
pub mod id;
pub mod input;
pub mod log;
pub mod model;
pub mod output;
pub mod period;
pub mod process;
pub mod scenario;
pub mod settings;
pub mod simulation;
pub mod site;
pub mod solver;
pub mod storage;
pub mod transmission;
pub mod units;

#[cfg(test)]
mod fixture;

/// The URL of the repository's issue tracker
pub const ISSUES_URL: &str = concat!(env!("CARGO_PKG_REPOSITORY"), "/issues");

/// Get the directory where the program's configuration files are stored
pub fn get_capplan_config_dir() -> PathBuf {
    let Some(mut config_dir) = dirs::config_dir() else {
        // Fall back to the working directory if the platform has no config dir
        return PathBuf::from(".");
    };
    config_dir.push("capplan");

    config_dir
}
