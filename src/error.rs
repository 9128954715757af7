//! The errors which abort a model run.
//!
//! None of these are recovered from locally. They are wrapped in [`anyhow::Error`] as they
//! propagate, so callers which need to distinguish between them can use
//! [`anyhow::Error::downcast_ref`].
use crate::solver::TerminationStatus;
use std::error::Error;
use std::fmt;

/// Defines the possible errors that can occur when building or running a model
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// A process availability lies outside of (0, 8760]
    InvalidAvailability {
        /// Description of the offending process
        entity: String,
        /// The value supplied
        value: f64,
    },
    /// The solver did not return an optimal solution for a period
    SolveNotOptimal {
        /// The period being solved
        period: u32,
        /// The solver's termination status
        status: TerminationStatus,
    },
    /// An entity in a period has no solved capacity in the previous period to carry over
    MissingCarryoverKey {
        /// The period whose input is being updated
        period: u32,
        /// Description of the entity without a matching result
        entity: String,
    },
    /// The input data for a period could not be assembled into a model
    BuildError {
        /// The period being built
        period: u32,
        /// What went wrong
        message: String,
    },
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::InvalidAvailability { entity, value } => write!(
                f,
                "Invalid availability for {entity}: {value} (must be in the range (0, 8760])"
            ),
            ModelError::SolveNotOptimal { period, status } => {
                write!(f, "Could not find optimal result for period {period}: {status}")
            }
            ModelError::MissingCarryoverKey { period, entity } => write!(
                f,
                "No solved capacity from the period before {period} found for {entity}"
            ),
            ModelError::BuildError { period, message } => {
                write!(f, "Could not build model for period {period}: {message}")
            }
        }
    }
}

impl Error for ModelError {}
