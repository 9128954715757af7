//! Functionality for running the capacity-expansion model over all planning periods.
use crate::error::ModelError;
use crate::model::Model;
use crate::output::DataWriter;
use crate::scenario::Scenario;
use crate::solver::{SolverAdapter, TerminationStatus};
use anyhow::{Context, Result};
use log::info;

pub mod carryover;
use carryover::carry_over;
pub mod optimisation;
use optimisation::{PeriodSolution, build_problem};

/// Run the model for one scenario.
///
/// Periods are solved one at a time, in order. The scenario's changes are applied to each period's
/// input data, then the capacities found for the previous period become the installed capacities.
/// The run stops at the first period which cannot be solved to optimality.
///
/// # Arguments:
///
/// * `model` - The model to run
/// * `scenario` - The scenario to apply to the input data
/// * `solver` - The solver used for each period's problem
/// * `writer` - Where results are written
///
/// # Returns
///
/// The solution of the final period.
pub fn run(
    model: &Model,
    scenario: &Scenario,
    solver: &impl SolverAdapter,
    writer: &mut DataWriter,
) -> Result<PeriodSolution> {
    let mut previous: Option<PeriodSolution> = None;
    for input in model.iter_periods() {
        let period = input.period;
        info!("Scenario {}, planning period: {period}", scenario.name);

        let input = scenario.apply(input)?;
        let input = match &previous {
            Some(previous) => carry_over(&input, previous)?,
            None => input,
        };

        let built = build_problem(&model.parameters, &input)?;
        info!(
            "Built problem with {} variables and {} constraints",
            built.problem.num_cols(),
            built.problem.num_rows()
        );

        let log_path = writer.solver_log_path(period);
        let output = solver
            .solve(&built.problem, Some(&log_path))
            .with_context(|| format!("Solver failed for period {period}"))?;
        if output.status != TerminationStatus::Optimal {
            return Err(ModelError::SolveNotOptimal {
                period,
                status: output.status,
            }
            .into());
        }

        let solution = PeriodSolution::from_solver_output(built, &output)?;
        info!("Objective value for {period}: {}", solution.objective_value);
        writer.write_period(&input, &solution)?;
        previous = Some(solution);
    }
    writer.flush()?;

    previous.context("Model has no planning periods")
}
