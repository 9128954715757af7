//! Code for building the capacity-expansion problem for one planning period and reading back its
//! solution.
//!
//! Building produces a solver-agnostic [`Problem`] together with a [`VariableMap`] recording which
//! column represents which quantity. Every row of the problem is produced by one of the constraint
//! rules in [`constraints`].
use crate::commodity::{CommodityID, CommodityType};
use crate::error::ModelError;
use crate::finance::annuity_factor;
use crate::model::{ModelParameters, Objective, PeriodInput};
use crate::process::{Direction, ProcessKey};
use crate::site::SiteID;
use crate::solver::{Problem, Sense, SolverOutput, Variable};
use crate::storage::StorageKey;
use crate::transmission::TransmissionKey;
use crate::units::{Capacity, Energy};
use anyhow::{Result, ensure};
use float_cmp::approx_eq;
use indexmap::IndexMap;
use log::debug;

pub mod constraints;
use constraints::{ConstraintKey, add_constraints};

/// A strongly typed identifier for a decision variable.
///
/// Timesteps run from 1 to N, except for storage content which also has an initial state at
/// timestep 0.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VariableKey {
    /// Total process capacity
    CapPro(ProcessKey),
    /// Total storage content capacity
    CapStoC(StorageKey),
    /// Total storage power capacity
    CapStoP(StorageKey),
    /// Total transmission capacity
    CapTra(TransmissionKey),
    /// Process throughput
    TauPro(u32, ProcessKey),
    /// Commodity consumed by a process
    EProIn(u32, ProcessKey, CommodityID),
    /// Commodity produced by a process
    EProOut(u32, ProcessKey, CommodityID),
    /// Stock commodity bought at a site
    ECoStock(u32, SiteID, CommodityID),
    /// Energy put into storage
    EStoIn(u32, StorageKey),
    /// Energy taken out of storage
    EStoOut(u32, StorageKey),
    /// Storage content at the end of the timestep
    EStoCon(u32, StorageKey),
    /// Commodity entering a transmission link
    ETraIn(u32, TransmissionKey),
    /// Commodity leaving a transmission link
    ETraOut(u32, TransmissionKey),
}

impl VariableKey {
    /// The name of the variable family
    pub fn name(&self) -> &'static str {
        match self {
            VariableKey::CapPro(_) => "cap_pro",
            VariableKey::CapStoC(_) => "cap_sto_c",
            VariableKey::CapStoP(_) => "cap_sto_p",
            VariableKey::CapTra(_) => "cap_tra",
            VariableKey::TauPro(..) => "tau_pro",
            VariableKey::EProIn(..) => "e_pro_in",
            VariableKey::EProOut(..) => "e_pro_out",
            VariableKey::ECoStock(..) => "e_co_stock",
            VariableKey::EStoIn(..) => "e_sto_in",
            VariableKey::EStoOut(..) => "e_sto_out",
            VariableKey::EStoCon(..) => "e_sto_con",
            VariableKey::ETraIn(..) => "e_tra_in",
            VariableKey::ETraOut(..) => "e_tra_out",
        }
    }

    /// The timestep this variable refers to, if any
    pub fn timestep(&self) -> Option<u32> {
        match self {
            VariableKey::CapPro(_)
            | VariableKey::CapStoC(_)
            | VariableKey::CapStoP(_)
            | VariableKey::CapTra(_) => None,
            VariableKey::TauPro(t, _)
            | VariableKey::EProIn(t, ..)
            | VariableKey::EProOut(t, ..)
            | VariableKey::ECoStock(t, ..)
            | VariableKey::EStoIn(t, _)
            | VariableKey::EStoOut(t, _)
            | VariableKey::EStoCon(t, _)
            | VariableKey::ETraIn(t, _)
            | VariableKey::ETraOut(t, _) => Some(*t),
        }
    }

    /// The site, technology and commodity this variable refers to, as strings for output.
    ///
    /// For transmission links, the site is given as `site_in>site_out`.
    pub fn labels(&self) -> (String, String, String) {
        match self {
            VariableKey::CapPro(key) | VariableKey::TauPro(_, key) => {
                (key.site_id.to_string(), key.process_id.to_string(), String::new())
            }
            VariableKey::EProIn(_, key, commodity_id)
            | VariableKey::EProOut(_, key, commodity_id) => (
                key.site_id.to_string(),
                key.process_id.to_string(),
                commodity_id.to_string(),
            ),
            VariableKey::ECoStock(_, site_id, commodity_id) => {
                (site_id.to_string(), String::new(), commodity_id.to_string())
            }
            VariableKey::CapStoC(key)
            | VariableKey::CapStoP(key)
            | VariableKey::EStoIn(_, key)
            | VariableKey::EStoOut(_, key)
            | VariableKey::EStoCon(_, key) => (
                key.site_id.to_string(),
                key.storage_id.to_string(),
                key.commodity_id.to_string(),
            ),
            VariableKey::CapTra(key) | VariableKey::ETraIn(_, key) | VariableKey::ETraOut(_, key) => (
                format!("{}>{}", key.site_in, key.site_out),
                key.transmission_id.to_string(),
                key.commodity_id.to_string(),
            ),
        }
    }
}

/// A map for easy lookup of variables in the problem.
///
/// The entries are ordered (see [`IndexMap`]) in the order the columns were added, so the `i`th
/// entry corresponds to the `i`th column of the problem.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct VariableMap(IndexMap<VariableKey, Variable>);

impl VariableMap {
    /// Add a column to the problem and record it under the given key
    fn add(&mut self, problem: &mut Problem, key: VariableKey, cost: f64, lower: f64, upper: f64) {
        let var = problem.add_column(cost, lower..=upper);
        let existing = self.0.insert(key, var).is_some();
        assert!(!existing, "Duplicate entry for var");
    }

    /// Get the [`Variable`] for the given key
    pub fn get(&self, key: &VariableKey) -> Variable {
        *self.0.get(key).expect("No variable found for given params")
    }

    /// Total capacity of a process
    pub fn cap_pro(&self, key: &ProcessKey) -> Variable {
        self.get(&VariableKey::CapPro(key.clone()))
    }

    /// Commodity output of a process in a timestep
    pub fn e_pro_out(&self, t: u32, key: &ProcessKey, commodity_id: &CommodityID) -> Variable {
        self.get(&VariableKey::EProOut(t, key.clone(), commodity_id.clone()))
    }

    /// Commodity input of a process in a timestep
    pub fn e_pro_in(&self, t: u32, key: &ProcessKey, commodity_id: &CommodityID) -> Variable {
        self.get(&VariableKey::EProIn(t, key.clone(), commodity_id.clone()))
    }

    /// Iterate over the variables in column order
    pub fn iter(&self) -> impl Iterator<Item = (&VariableKey, Variable)> {
        self.0.iter().map(|(key, var)| (key, *var))
    }

    /// The number of variables
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no variables
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A problem built for one planning period
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltModel {
    /// The planning period
    pub period: u32,
    /// The linear program
    pub problem: Problem,
    /// The decision variables
    pub variables: VariableMap,
    /// What each row of the problem represents, in row order
    pub constraint_keys: Vec<ConstraintKey>,
}

/// The costs which apply to each variable, as coefficients of the objective
struct CostCoefficients {
    objective: Objective,
    weight: f64,
}

impl CostCoefficients {
    /// Coefficient for the given cost, which is zero unless minimising cost
    fn cost(&self, value: f64) -> f64 {
        match self.objective {
            Objective::Cost => value,
            Objective::Co2 => 0.0,
        }
    }

    /// Coefficient for a flow-based cost, annualised with the timestep weight
    fn flow_cost(&self, value: f64) -> f64 {
        self.cost(value) * self.weight
    }

    /// Coefficient for a flow of an environmental commodity
    fn emission(&self, price: f64, direction: Direction) -> f64 {
        let sign = match direction {
            Direction::Out => 1.0,
            Direction::In => -1.0,
        };
        let value = match self.objective {
            Objective::Cost => price,
            Objective::Co2 => 1.0,
        };

        sign * value * self.weight
    }
}

/// Build the linear program for a single planning period.
///
/// The input is only borrowed; the returned model does not refer to it.
///
/// # Arguments
///
/// * `parameters` - The model parameters
/// * `input` - The period's input data, with installed capacities already carried over
///
/// # Returns
///
/// The built problem with its variable map, or [`ModelError::BuildError`] if the input data cannot
/// be turned into a model.
pub fn build_problem(parameters: &ModelParameters, input: &PeriodInput) -> Result<BuiltModel> {
    let period = input.period;
    let build_error = |message: String| ModelError::BuildError { period, message };

    let mut problem = Problem::new(Sense::Minimise);
    let variables = add_variables(&mut problem, parameters, input).map_err(build_error)?;
    let constraint_keys = add_constraints(&mut problem, &variables, parameters, input);

    debug!(
        "Built model for period {period}: {} variables, {} constraints",
        problem.num_cols(),
        problem.num_rows()
    );

    Ok(BuiltModel {
        period,
        problem,
        variables,
        constraint_keys,
    })
}

/// How far, relative to the upper limit, an installed capacity may exceed it and still be accepted
const CAPACITY_TOLERANCE: f64 = 1e-6;

/// The bounds of a capacity variable
struct CapacityBounds {
    /// Installed capacity, clamped to the upper limit
    installed: f64,
    lower: f64,
    upper: f64,
}

/// Check that the installed capacity lies within the upper limit and get the resulting bounds.
///
/// Installed capacities carried over from a solution may overshoot the limit by up to the solver's
/// feasibility tolerance. These are clamped to the limit.
fn capacity_bounds(
    entity: &dyn std::fmt::Display,
    inst_cap: f64,
    cap_lo: f64,
    cap_up: f64,
) -> std::result::Result<CapacityBounds, String> {
    let installed = if inst_cap > cap_up
        && approx_eq!(
            f64,
            inst_cap,
            cap_up,
            epsilon = CAPACITY_TOLERANCE * cap_up.abs().max(1.0)
        ) {
        cap_up
    } else {
        inst_cap
    };

    if installed > cap_up {
        return Err(format!(
            "installed capacity {inst_cap} of {entity} exceeds its upper limit {cap_up}"
        ));
    }

    Ok(CapacityBounds {
        installed,
        lower: installed.max(cap_lo),
        upper: cap_up,
    })
}

/// Add all variables to the problem, with their objective coefficients and bounds.
///
/// Capacity limits are applied as column bounds. Investment costs are charged on new capacity only,
/// i.e. on `cap - inst_cap`; the constant part of this is added as an objective offset.
fn add_variables(
    problem: &mut Problem,
    parameters: &ModelParameters,
    input: &PeriodInput,
) -> std::result::Result<VariableMap, String> {
    check_time_series(parameters, input)?;

    let mut variables = VariableMap::default();
    let coeffs = CostCoefficients {
        objective: parameters.objective,
        weight: parameters.weight(),
    };

    for (key, process) in &input.processes {
        let annuity = annuity_factor(process.depreciation, process.wacc).value();
        let inv_cost = coeffs.cost(process.inv_cost.value() * annuity);
        let bounds = capacity_bounds(
            key,
            process.inst_cap.value(),
            process.cap_lo.value(),
            process.cap_up.value(),
        )?;
        variables.add(
            problem,
            VariableKey::CapPro(key.clone()),
            inv_cost + coeffs.cost(process.fix_cost.value()),
            bounds.lower,
            bounds.upper,
        );
        problem.add_objective_offset(-inv_cost * bounds.installed);
    }

    for (key, storage) in &input.storages {
        let annuity = annuity_factor(storage.depreciation, storage.wacc).value();
        let inv_cost_c = coeffs.cost(storage.inv_cost_c.value() * annuity);
        let bounds = capacity_bounds(
            key,
            storage.inst_cap_c.value(),
            0.0,
            storage.cap_up_c.value(),
        )?;
        variables.add(
            problem,
            VariableKey::CapStoC(key.clone()),
            inv_cost_c + coeffs.cost(storage.fix_cost_c.value()),
            bounds.lower,
            bounds.upper,
        );
        problem.add_objective_offset(-inv_cost_c * bounds.installed);

        let inv_cost_p = coeffs.cost(storage.inv_cost_p.value() * annuity);
        let bounds = capacity_bounds(
            key,
            storage.inst_cap_p.value(),
            0.0,
            storage.cap_up_p.value(),
        )?;
        variables.add(
            problem,
            VariableKey::CapStoP(key.clone()),
            inv_cost_p + coeffs.cost(storage.fix_cost_p.value()),
            bounds.lower,
            bounds.upper,
        );
        problem.add_objective_offset(-inv_cost_p * bounds.installed);
    }

    for (key, transmission) in &input.transmissions {
        let annuity = annuity_factor(transmission.depreciation, transmission.wacc).value();
        let inv_cost = coeffs.cost(transmission.inv_cost.value() * annuity);
        let bounds = capacity_bounds(
            key,
            transmission.inst_cap.value(),
            0.0,
            transmission.cap_up.value(),
        )?;
        variables.add(
            problem,
            VariableKey::CapTra(key.clone()),
            inv_cost + coeffs.cost(transmission.fix_cost.value()),
            bounds.lower,
            bounds.upper,
        );
        problem.add_objective_offset(-inv_cost * bounds.installed);
    }

    for t in parameters.timesteps() {
        add_timestep_variables(problem, &mut variables, &coeffs, input, t)?;
    }

    // Storage content also has an initial state
    for key in input.storages.keys() {
        variables.add(
            problem,
            VariableKey::EStoCon(0, key.clone()),
            0.0,
            0.0,
            f64::INFINITY,
        );
    }

    Ok(variables)
}

/// Check that every demand and intermittent supply commodity has a value for each timestep
fn check_time_series(
    parameters: &ModelParameters,
    input: &PeriodInput,
) -> std::result::Result<(), String> {
    for ((site_id, commodity_id), commodity) in &input.commodities {
        let series = match commodity.kind {
            CommodityType::Demand => &input.demand,
            CommodityType::SupIm => &input.supim,
            CommodityType::Stock | CommodityType::Env => continue,
        };
        let len = series
            .get(&(site_id.clone(), commodity_id.clone()))
            .map(Vec::len);
        if len != Some(parameters.num_timesteps as usize) {
            return Err(format!(
                "time series for {commodity_id} at site {site_id} must have {} values",
                parameters.num_timesteps
            ));
        }
    }

    Ok(())
}

/// Add the flow variables for a single timestep
fn add_timestep_variables(
    problem: &mut Problem,
    variables: &mut VariableMap,
    coeffs: &CostCoefficients,
    input: &PeriodInput,
    t: u32,
) -> std::result::Result<(), String> {
    for (key, process) in &input.processes {
        variables.add(
            problem,
            VariableKey::TauPro(t, key.clone()),
            coeffs.flow_cost(process.var_cost.value()),
            0.0,
            f64::INFINITY,
        );

        let flows = input
            .process_commodities
            .get(&key.process_id)
            .ok_or_else(|| format!("no commodities defined for {key}"))?;
        for flow in flows {
            let commodity = input
                .commodities
                .get(&(key.site_id.clone(), flow.commodity_id.clone()))
                .ok_or_else(|| {
                    format!(
                        "commodity {} used by {key} is not defined at its site",
                        flow.commodity_id
                    )
                })?;
            let cost = if commodity.kind == CommodityType::Env {
                coeffs.emission(commodity.price.value(), flow.direction)
            } else {
                0.0
            };
            let var_key = match flow.direction {
                Direction::In => VariableKey::EProIn(t, key.clone(), flow.commodity_id.clone()),
                Direction::Out => VariableKey::EProOut(t, key.clone(), flow.commodity_id.clone()),
            };
            variables.add(problem, var_key, cost, 0.0, f64::INFINITY);
        }
    }

    for ((site_id, commodity_id), commodity) in &input.commodities {
        if commodity.kind == CommodityType::Stock {
            variables.add(
                problem,
                VariableKey::ECoStock(t, site_id.clone(), commodity_id.clone()),
                coeffs.flow_cost(commodity.price.value()),
                0.0,
                f64::INFINITY,
            );
        }
    }

    for (key, storage) in &input.storages {
        variables.add(
            problem,
            VariableKey::EStoIn(t, key.clone()),
            0.0,
            0.0,
            f64::INFINITY,
        );
        variables.add(
            problem,
            VariableKey::EStoOut(t, key.clone()),
            coeffs.flow_cost(storage.var_cost.value()),
            0.0,
            f64::INFINITY,
        );
        variables.add(
            problem,
            VariableKey::EStoCon(t, key.clone()),
            0.0,
            0.0,
            f64::INFINITY,
        );
    }

    for (key, transmission) in &input.transmissions {
        variables.add(
            problem,
            VariableKey::ETraIn(t, key.clone()),
            coeffs.flow_cost(transmission.var_cost.value()),
            0.0,
            f64::INFINITY,
        );
        variables.add(
            problem,
            VariableKey::ETraOut(t, key.clone()),
            0.0,
            0.0,
            f64::INFINITY,
        );
    }

    Ok(())
}

/// The optimal capacities found for one period
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CapacityResults {
    /// Total capacity of each process
    pub processes: IndexMap<ProcessKey, Capacity>,
    /// Total content capacity of each storage
    pub storages_c: IndexMap<StorageKey, Energy>,
    /// Total power capacity of each storage
    pub storages_p: IndexMap<StorageKey, Capacity>,
    /// Total capacity of each transmission link
    pub transmissions: IndexMap<TransmissionKey, Capacity>,
}

/// The solution of one period's problem
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodSolution {
    /// The planning period
    pub period: u32,
    /// The value of the objective, including the constant offset
    pub objective_value: f64,
    /// The optimal capacities
    pub capacities: CapacityResults,
    /// The value of every variable, in column order
    pub values: Vec<(VariableKey, f64)>,
}

impl PeriodSolution {
    /// Read back the solution of a built model from the solver's output.
    ///
    /// The solver output must be optimal.
    pub fn from_solver_output(model: BuiltModel, output: &SolverOutput) -> Result<Self> {
        ensure!(
            output.column_values.len() == model.problem.num_cols(),
            "Solver returned {} column values for a problem with {} columns",
            output.column_values.len(),
            model.problem.num_cols()
        );

        let mut capacities = CapacityResults::default();
        let mut values = Vec::with_capacity(model.variables.len());
        for (key, var) in model.variables.iter() {
            let value = output.column_values[var.index()];
            match key {
                VariableKey::CapPro(key) => {
                    capacities.processes.insert(key.clone(), Capacity(value));
                }
                VariableKey::CapStoC(key) => {
                    capacities.storages_c.insert(key.clone(), Energy(value));
                }
                VariableKey::CapStoP(key) => {
                    capacities.storages_p.insert(key.clone(), Capacity(value));
                }
                VariableKey::CapTra(key) => {
                    capacities.transmissions.insert(key.clone(), Capacity(value));
                }
                _ => {}
            }
            values.push((key.clone(), value));
        }

        Ok(Self {
            period: model.period,
            objective_value: output.objective_value + model.problem.objective_offset(),
            capacities,
            values,
        })
    }
}
