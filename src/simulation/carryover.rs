//! Carrying installed capacities over from one planning period to the next.
use super::optimisation::PeriodSolution;
use crate::error::ModelError;
use crate::model::PeriodInput;
use anyhow::Result;
use indexmap::IndexMap;
use std::fmt::Display;
use std::hash::Hash;

/// Look up the solved value for an entity in the previous period
fn previous_value<K, V>(
    results: &IndexMap<K, V>,
    previous_key: &K,
    period: u32,
    entity: &impl Display,
) -> Result<V>
where
    K: Hash + Eq,
    V: Copy,
{
    let value = results
        .get(previous_key)
        .ok_or_else(|| ModelError::MissingCarryoverKey {
            period,
            entity: entity.to_string(),
        })?;

    Ok(*value)
}

/// Create the input for a period with installed capacities taken from the previous period's
/// solution.
///
/// The installed capacity of every process, storage and transmission link is replaced with the
/// total capacity found for the same site and technology in the previous period. Every entity must
/// have a match in the previous solution.
///
/// # Arguments
///
/// * `input` - The input data for the period, as read from file
/// * `previous` - The solution of the previous period
///
/// # Returns
///
/// A new [`PeriodInput`] with updated installed capacities. `input` is left untouched.
pub fn carry_over(input: &PeriodInput, previous: &PeriodSolution) -> Result<PeriodInput> {
    let period = input.period;
    let capacities = &previous.capacities;
    let mut updated = input.clone();

    for (key, process) in &mut updated.processes {
        let previous_key = key.in_period(previous.period);
        process.inst_cap = previous_value(&capacities.processes, &previous_key, period, key)?;
    }

    for (key, storage) in &mut updated.storages {
        let previous_key = key.in_period(previous.period);
        storage.inst_cap_c = previous_value(&capacities.storages_c, &previous_key, period, key)?;
        storage.inst_cap_p = previous_value(&capacities.storages_p, &previous_key, period, key)?;
    }

    for (key, transmission) in &mut updated.transmissions {
        let previous_key = key.in_period(previous.period);
        transmission.inst_cap =
            previous_value(&capacities.transmissions, &previous_key, period, key)?;
    }

    Ok(updated)
}
