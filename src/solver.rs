//! The boundary between the model builder and an external LP solver.
//!
//! The model builder produces a solver-agnostic [`Problem`]. A [`SolverAdapter`] turns this into
//! whatever representation the underlying solver needs, solves it (blocking) and reports back a
//! [`TerminationStatus`] along with the value of every column.
use anyhow::{Result, bail};
use highs::{HighsModelStatus, RowProblem};
use log::debug;
use std::fmt;
use std::ops::{Bound, RangeBounds};
use std::path::Path;

/// A decision variable in the optimisation.
///
/// Note that this type does **not** include the value of the variable; it just refers to a
/// particular column of the problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Variable(usize);

impl Variable {
    /// The index of the column in the problem
    pub fn index(self) -> usize {
        self.0
    }
}

/// Whether the objective is to be minimised or maximised
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    /// Minimise the objective
    Minimise,
    /// Maximise the objective
    Maximise,
}

/// A column (decision variable) of a [`Problem`]
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// The coefficient of the variable in the objective
    pub cost: f64,
    /// The variable's minimum value
    pub lower: f64,
    /// The variable's maximum value
    pub upper: f64,
}

/// A row (constraint) of a [`Problem`] of the form:
///
/// lower <= a1*x1 + a2*x2 + ... <= upper
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// The minimum value for the constraint
    pub lower: f64,
    /// The maximum value for the constraint
    pub upper: f64,
    /// The variables in the constraint with their coefficients
    pub terms: Vec<(Variable, f64)>,
}

/// A linear program ready to be handed to a solver
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    sense: Sense,
    columns: Vec<Column>,
    rows: Vec<Row>,
    objective_offset: f64,
}

/// Convert a range into a pair of inclusive bounds, with infinities for unbounded ends
fn to_bounds<B: RangeBounds<f64>>(bounds: &B) -> (f64, f64) {
    let lower = match bounds.start_bound() {
        Bound::Included(x) | Bound::Excluded(x) => *x,
        Bound::Unbounded => f64::NEG_INFINITY,
    };
    let upper = match bounds.end_bound() {
        Bound::Included(x) | Bound::Excluded(x) => *x,
        Bound::Unbounded => f64::INFINITY,
    };

    (lower, upper)
}

impl Problem {
    /// Create a new, empty problem
    pub fn new(sense: Sense) -> Self {
        Self {
            sense,
            columns: Vec::new(),
            rows: Vec::new(),
            objective_offset: 0.0,
        }
    }

    /// Add a column to the problem, returning the new [`Variable`]
    pub fn add_column<B: RangeBounds<f64>>(&mut self, cost: f64, bounds: B) -> Variable {
        let (lower, upper) = to_bounds(&bounds);
        self.columns.push(Column { cost, lower, upper });

        Variable(self.columns.len() - 1)
    }

    /// Add a row to the problem
    pub fn add_row<B, I>(&mut self, bounds: B, terms: I)
    where
        B: RangeBounds<f64>,
        I: IntoIterator<Item = (Variable, f64)>,
    {
        let (lower, upper) = to_bounds(&bounds);
        let terms = terms.into_iter().collect();
        self.rows.push(Row {
            lower,
            upper,
            terms,
        });
    }

    /// Add a constant term to the objective
    pub fn add_objective_offset(&mut self, offset: f64) {
        self.objective_offset += offset;
    }

    /// The constant term of the objective
    pub fn objective_offset(&self) -> f64 {
        self.objective_offset
    }

    /// The optimisation sense
    pub fn sense(&self) -> Sense {
        self.sense
    }

    /// The problem's columns, in the order they were added
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Get a column
    pub fn column(&self, var: Variable) -> &Column {
        &self.columns[var.0]
    }

    /// The problem's rows, in the order they were added
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// The number of columns in the problem
    pub fn num_cols(&self) -> usize {
        self.columns.len()
    }

    /// The number of rows in the problem
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }
}

/// The solver's verdict on a solve attempt
#[derive(Debug, Clone, PartialEq)]
pub enum TerminationStatus {
    /// An optimal solution was found
    Optimal,
    /// The problem has no feasible solution
    Infeasible,
    /// The objective is unbounded
    Unbounded,
    /// Any other outcome, with the solver's own description
    Other(String),
}

impl fmt::Display for TerminationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationStatus::Optimal => write!(f, "optimal"),
            TerminationStatus::Infeasible => write!(f, "infeasible"),
            TerminationStatus::Unbounded => write!(f, "unbounded"),
            TerminationStatus::Other(status) => write!(f, "other ({status})"),
        }
    }
}

impl From<HighsModelStatus> for TerminationStatus {
    fn from(status: HighsModelStatus) -> Self {
        match status {
            HighsModelStatus::Optimal => TerminationStatus::Optimal,
            HighsModelStatus::Infeasible => TerminationStatus::Infeasible,
            HighsModelStatus::Unbounded => TerminationStatus::Unbounded,
            status => TerminationStatus::Other(format!("{status:?}")),
        }
    }
}

/// What a solver returns
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOutput {
    /// The termination status
    pub status: TerminationStatus,
    /// The value of each column, in column order (empty unless the status is optimal)
    pub column_values: Vec<f64>,
    /// The objective value, excluding the problem's constant offset
    pub objective_value: f64,
}

/// An external LP solver
pub trait SolverAdapter {
    /// Solve the problem, blocking until the solver returns.
    ///
    /// # Arguments
    ///
    /// * `problem` - The problem to solve
    /// * `log_file` - Where the solver should write its progress log, if anywhere
    fn solve(&self, problem: &Problem, log_file: Option<&Path>) -> Result<SolverOutput>;
}

/// Solves problems with the HiGHS solver.
///
/// The solver's own output only goes to the log file, if one is given.
#[derive(Debug, Default, Clone, Copy)]
pub struct HighsSolver;

impl SolverAdapter for HighsSolver {
    fn solve(&self, problem: &Problem, log_file: Option<&Path>) -> Result<SolverOutput> {
        let mut pb = RowProblem::default();

        // NB: HiGHS requires all columns to be added before rows
        let cols: Vec<_> = problem
            .columns()
            .iter()
            .map(|col| pb.add_column(col.cost, col.lower..=col.upper))
            .collect();
        for row in problem.rows() {
            pb.add_row(
                row.lower..=row.upper,
                row.terms.iter().map(|(var, coeff)| (cols[var.index()], *coeff)),
            );
        }

        let sense = match problem.sense() {
            Sense::Minimise => highs::Sense::Minimise,
            Sense::Maximise => highs::Sense::Maximise,
        };
        let mut model = pb.optimise(sense);
        configure_logging(&mut model, log_file);

        debug!(
            "Solving problem with {} columns and {} rows",
            problem.num_cols(),
            problem.num_rows()
        );
        let solved = match model.try_solve() {
            Ok(solved) => solved,
            Err(status) => bail!("Incoherent model: {status:?}"),
        };

        let status = TerminationStatus::from(solved.status());
        if status != TerminationStatus::Optimal {
            return Ok(SolverOutput {
                status,
                column_values: Vec::new(),
                objective_value: f64::NAN,
            });
        }

        Ok(SolverOutput {
            status,
            column_values: solved.get_solution().columns().to_vec(),
            objective_value: solved.objective_value(),
        })
    }
}

/// Set the HiGHS options controlling where its log goes
fn configure_logging(model: &mut highs::Model, log_file: Option<&Path>) {
    let Some(log_path) = log_file.and_then(Path::to_str) else {
        model.set_option("output_flag", false);
        return;
    };

    model.set_option("output_flag", true);
    model.set_option("log_to_console", false);
    model.set_option("log_file", log_path);
}
