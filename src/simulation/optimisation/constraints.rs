//! Code for adding constraints to the capacity-expansion problem.
//!
//! Each constraint family is defined by a rule: a pure function of an index tuple, the period's
//! input data and the [`VariableMap`], which either returns a linear expression with its bounds or
//! reports that no constraint applies to that tuple ([`RuleOutcome::Omitted`]). Omitted
//! constraints are simply not added to the problem.
use super::{VariableKey, VariableMap};
use crate::commodity::{Commodity, CommodityID, CommodityType};
use crate::model::{ModelParameters, PeriodInput};
use crate::process::{Direction, Process, ProcessCommodity, ProcessKey, ProcessOutputKey};
use crate::site::SiteID;
use crate::solver::{Problem, Variable};
use crate::storage::{Storage, StorageKey};
use crate::transmission::{Transmission, TransmissionKey};
use crate::units::HOURS_PER_YEAR;

/// A linear expression with bounds: `lower <= sum(coeff * var) <= upper`
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    /// The variables and their coefficients
    pub terms: Vec<(Variable, f64)>,
    /// Lower bound on the expression
    pub lower: f64,
    /// Upper bound on the expression
    pub upper: f64,
}

impl LinearConstraint {
    /// `terms <= rhs`
    pub fn le(terms: Vec<(Variable, f64)>, rhs: f64) -> Self {
        Self {
            terms,
            lower: f64::NEG_INFINITY,
            upper: rhs,
        }
    }

    /// `terms >= rhs`
    pub fn ge(terms: Vec<(Variable, f64)>, rhs: f64) -> Self {
        Self {
            terms,
            lower: rhs,
            upper: f64::INFINITY,
        }
    }

    /// `terms == rhs`
    pub fn eq(terms: Vec<(Variable, f64)>, rhs: f64) -> Self {
        Self {
            terms,
            lower: rhs,
            upper: rhs,
        }
    }

    /// Evaluate the expression for the given column values
    pub fn evaluate(&self, column_values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coeff)| coeff * column_values[var.index()])
            .sum()
    }

    /// Whether the column values satisfy the constraint, within a tolerance
    pub fn is_satisfied(&self, column_values: &[f64], tolerance: f64) -> bool {
        let value = self.evaluate(column_values);
        value >= self.lower - tolerance && value <= self.upper + tolerance
    }
}

/// The result of applying a constraint rule to one index tuple
#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutcome {
    /// A constraint to add to the problem
    Expression(LinearConstraint),
    /// No constraint applies
    Omitted,
}

/// Identifies a row of the problem
#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintKey {
    /// Process throughput limited by capacity
    Throughput(u32, ProcessKey),
    /// Commodity flow of a process fixed by its ratio to throughput
    ProcessRatio(u32, ProcessKey, CommodityID, Direction),
    /// Intermittent input limited by the supply time series
    IntermittentSupply(u32, ProcessKey, CommodityID),
    /// Supply must meet demand for a commodity at a site
    CommodityBalance(u32, SiteID, CommodityID),
    /// Hourly purchase limit for a stock commodity
    StockHourly(u32, SiteID, CommodityID),
    /// Annual purchase limit for a stock commodity
    StockAnnual(SiteID, CommodityID),
    /// Hourly emission limit for an environmental commodity
    EnvHourly(u32, SiteID, CommodityID),
    /// Annual emission limit for an environmental commodity
    EnvAnnual(SiteID, CommodityID),
    /// Storage content carried from one timestep to the next
    StorageState(u32, StorageKey),
    /// Storage charging limited by power capacity
    StorageChargePower(u32, StorageKey),
    /// Storage discharging limited by power capacity
    StorageDischargePower(u32, StorageKey),
    /// Storage content limited by content capacity
    StorageContent(u32, StorageKey),
    /// Initial storage content
    StorageInitial(StorageKey),
    /// Final storage content at least the initial content
    StorageFinal(StorageKey),
    /// Transmission limited by capacity
    TransmissionCapacity(u32, TransmissionKey),
    /// Transmission losses
    TransmissionEfficiency(u32, TransmissionKey),
    /// Annual output of a process commodity limited by availability
    Availability(ProcessOutputKey),
}

/// Collects the rows added to a problem along with their keys
struct ConstraintAdder<'a> {
    problem: &'a mut Problem,
    keys: Vec<ConstraintKey>,
}

impl ConstraintAdder<'_> {
    fn add(&mut self, key: ConstraintKey, outcome: RuleOutcome) {
        if let RuleOutcome::Expression(constraint) = outcome {
            self.problem
                .add_row(constraint.lower..=constraint.upper, constraint.terms);
            self.keys.push(key);
        }
    }
}

/// Add all constraints to the problem.
///
/// # Returns
///
/// The key of each row added, in row order
pub fn add_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    parameters: &ModelParameters,
    input: &PeriodInput,
) -> Vec<ConstraintKey> {
    let mut adder = ConstraintAdder {
        problem,
        keys: Vec::new(),
    };
    let dt = parameters.dt.value();
    let weight = parameters.weight();

    for key in input.processes.keys() {
        let flows = &input.process_commodities[&key.process_id];
        for t in parameters.timesteps() {
            adder.add(
                ConstraintKey::Throughput(t, key.clone()),
                throughput_rule(t, key, variables, dt),
            );
            for flow in flows {
                adder.add(
                    ConstraintKey::ProcessRatio(
                        t,
                        key.clone(),
                        flow.commodity_id.clone(),
                        flow.direction,
                    ),
                    process_ratio_rule(t, key, flow, variables),
                );
                adder.add(
                    ConstraintKey::IntermittentSupply(t, key.clone(), flow.commodity_id.clone()),
                    intermittent_supply_rule(t, key, flow, input, variables, dt),
                );
            }
        }
    }

    for ((site_id, commodity_id), commodity) in &input.commodities {
        let related = RelatedFlows::new(input, site_id, commodity_id);
        for t in parameters.timesteps() {
            adder.add(
                ConstraintKey::CommodityBalance(t, site_id.clone(), commodity_id.clone()),
                commodity_balance_rule(t, commodity, &related, input, variables),
            );
            adder.add(
                ConstraintKey::StockHourly(t, site_id.clone(), commodity_id.clone()),
                stock_hourly_rule(t, site_id, commodity_id, commodity, variables, dt),
            );
            adder.add(
                ConstraintKey::EnvHourly(t, site_id.clone(), commodity_id.clone()),
                env_hourly_rule(t, commodity, &related, variables, dt),
            );
        }
        adder.add(
            ConstraintKey::StockAnnual(site_id.clone(), commodity_id.clone()),
            stock_annual_rule(site_id, commodity_id, commodity, variables, parameters, weight),
        );
        adder.add(
            ConstraintKey::EnvAnnual(site_id.clone(), commodity_id.clone()),
            env_annual_rule(commodity, &related, variables, parameters, weight),
        );
    }

    for (key, storage) in &input.storages {
        for t in parameters.timesteps() {
            adder.add(
                ConstraintKey::StorageState(t, key.clone()),
                storage_state_rule(t, key, storage, variables, dt),
            );
            adder.add(
                ConstraintKey::StorageChargePower(t, key.clone()),
                storage_power_rule(&VariableKey::EStoIn(t, key.clone()), key, variables, dt),
            );
            adder.add(
                ConstraintKey::StorageDischargePower(t, key.clone()),
                storage_power_rule(&VariableKey::EStoOut(t, key.clone()), key, variables, dt),
            );
        }
        for t in 0..=parameters.num_timesteps {
            adder.add(
                ConstraintKey::StorageContent(t, key.clone()),
                storage_content_rule(t, key, variables),
            );
        }
        adder.add(
            ConstraintKey::StorageInitial(key.clone()),
            storage_initial_rule(key, storage, variables),
        );
        adder.add(
            ConstraintKey::StorageFinal(key.clone()),
            storage_final_rule(key, storage, variables, parameters.num_timesteps),
        );
    }

    for (key, transmission) in &input.transmissions {
        for t in parameters.timesteps() {
            adder.add(
                ConstraintKey::TransmissionCapacity(t, key.clone()),
                transmission_capacity_rule(t, key, variables, dt),
            );
            adder.add(
                ConstraintKey::TransmissionEfficiency(t, key.clone()),
                transmission_efficiency_rule(t, key, transmission, variables),
            );
        }
    }

    for (output_key, process) in iter_process_outputs(input) {
        adder.add(
            ConstraintKey::Availability(output_key.clone()),
            availability_rule(&output_key, process, variables, parameters.timesteps()),
        );
    }

    adder.keys
}

/// Iterate over the process output relation: every commodity produced by every process
pub fn iter_process_outputs(
    input: &PeriodInput,
) -> impl Iterator<Item = (ProcessOutputKey, &Process)> {
    input.processes.iter().flat_map(|(key, process)| {
        input.process_commodities[&key.process_id]
            .iter()
            .filter(|flow| flow.direction == Direction::Out)
            .map(move |flow| {
                let output_key = ProcessOutputKey {
                    process: key.clone(),
                    commodity_id: flow.commodity_id.clone(),
                };
                (output_key, process)
            })
    })
}

/// Limit the annual output of a process commodity by the process's availability.
///
/// For processes with an availability below the number of hours in a year:
///
/// ```text
/// sum over t of e_pro_out[t, key] <= availability * cap_pro[key.process]
/// ```
///
/// Processes which are available all year round are unconstrained. Timestep values are summed
/// without annualisation.
pub fn availability_rule<I>(
    key: &ProcessOutputKey,
    process: &Process,
    variables: &VariableMap,
    timesteps: I,
) -> RuleOutcome
where
    I: IntoIterator<Item = u32>,
{
    let availability = process.availability.value();
    if availability >= HOURS_PER_YEAR {
        return RuleOutcome::Omitted;
    }

    let mut terms: Vec<_> = timesteps
        .into_iter()
        .map(|t| (variables.e_pro_out(t, &key.process, &key.commodity_id), 1.0))
        .collect();
    terms.push((variables.cap_pro(&key.process), -availability));

    RuleOutcome::Expression(LinearConstraint::le(terms, 0.0))
}

/// `tau_pro[t] <= cap_pro * dt`
fn throughput_rule(t: u32, key: &ProcessKey, variables: &VariableMap, dt: f64) -> RuleOutcome {
    RuleOutcome::Expression(LinearConstraint::le(
        vec![
            (variables.get(&VariableKey::TauPro(t, key.clone())), 1.0),
            (variables.cap_pro(key), -dt),
        ],
        0.0,
    ))
}

/// `e_pro_in[t, c] = ratio * tau_pro[t]` (and the same for outputs)
fn process_ratio_rule(
    t: u32,
    key: &ProcessKey,
    flow: &ProcessCommodity,
    variables: &VariableMap,
) -> RuleOutcome {
    let flow_var = match flow.direction {
        Direction::In => variables.e_pro_in(t, key, &flow.commodity_id),
        Direction::Out => variables.e_pro_out(t, key, &flow.commodity_id),
    };
    let tau = variables.get(&VariableKey::TauPro(t, key.clone()));

    RuleOutcome::Expression(LinearConstraint::eq(
        vec![(flow_var, 1.0), (tau, -flow.ratio.value())],
        0.0,
    ))
}

/// `e_pro_in[t, c] <= supim[t] * cap_pro * dt` for intermittent supply inputs
fn intermittent_supply_rule(
    t: u32,
    key: &ProcessKey,
    flow: &ProcessCommodity,
    input: &PeriodInput,
    variables: &VariableMap,
    dt: f64,
) -> RuleOutcome {
    if flow.direction != Direction::In {
        return RuleOutcome::Omitted;
    }
    let Some(series) = input
        .supim
        .get(&(key.site_id.clone(), flow.commodity_id.clone()))
    else {
        return RuleOutcome::Omitted;
    };

    let supim = series[(t - 1) as usize];
    RuleOutcome::Expression(LinearConstraint::le(
        vec![
            (variables.e_pro_in(t, key, &flow.commodity_id), 1.0),
            (variables.cap_pro(key), -supim * dt),
        ],
        0.0,
    ))
}

/// The processes, storages and transmission links which exchange a commodity at a site
struct RelatedFlows<'a> {
    /// The site
    site_id: &'a SiteID,
    /// The commodity
    commodity_id: &'a CommodityID,
    /// Processes at the site which consume the commodity
    process_inputs: Vec<&'a ProcessKey>,
    /// Processes at the site which produce the commodity
    process_outputs: Vec<&'a ProcessKey>,
    /// Storages at the site holding the commodity
    storages: Vec<&'a StorageKey>,
    /// Links bringing the commodity to the site
    imports: Vec<&'a TransmissionKey>,
    /// Links taking the commodity away from the site
    exports: Vec<&'a TransmissionKey>,
}

impl<'a> RelatedFlows<'a> {
    fn new(input: &'a PeriodInput, site_id: &'a SiteID, commodity_id: &'a CommodityID) -> Self {
        let mut process_inputs = Vec::new();
        let mut process_outputs = Vec::new();
        for key in input.processes.keys().filter(|key| key.site_id == *site_id) {
            for flow in &input.process_commodities[&key.process_id] {
                if flow.commodity_id != *commodity_id {
                    continue;
                }
                match flow.direction {
                    Direction::In => process_inputs.push(key),
                    Direction::Out => process_outputs.push(key),
                }
            }
        }

        let storages = input
            .storages
            .keys()
            .filter(|key| key.site_id == *site_id && key.commodity_id == *commodity_id)
            .collect();
        let links_for = |is_import: bool| {
            input
                .transmissions
                .keys()
                .filter(|key| key.commodity_id == *commodity_id)
                .filter(move |key| {
                    let site = if is_import { &key.site_out } else { &key.site_in };
                    site == site_id
                })
                .collect::<Vec<_>>()
        };

        Self {
            site_id,
            commodity_id,
            process_inputs,
            process_outputs,
            storages,
            imports: links_for(true),
            exports: links_for(false),
        }
    }

    /// Net process output of the commodity in a timestep, as terms
    fn net_process_output(&self, t: u32, variables: &VariableMap) -> Vec<(Variable, f64)> {
        let commodity_id = self.commodity_id;
        let outputs = self
            .process_outputs
            .iter()
            .map(|key| (variables.e_pro_out(t, key, commodity_id), 1.0));
        let inputs = self
            .process_inputs
            .iter()
            .map(|key| (variables.e_pro_in(t, key, commodity_id), -1.0));

        outputs.chain(inputs).collect()
    }
}

/// Supply of a stock or demand commodity at a site must at least cover demand.
///
/// ```text
/// e_co_stock + e_pro_out - e_pro_in + e_sto_out - e_sto_in + imports - exports >= demand[t]
/// ```
fn commodity_balance_rule(
    t: u32,
    commodity: &Commodity,
    related: &RelatedFlows,
    input: &PeriodInput,
    variables: &VariableMap,
) -> RuleOutcome {
    let (site_id, commodity_id) = (related.site_id, related.commodity_id);
    let demand = match commodity.kind {
        CommodityType::Stock => 0.0,
        CommodityType::Demand => {
            input.demand[&(site_id.clone(), commodity_id.clone())][(t - 1) as usize]
        }
        CommodityType::SupIm | CommodityType::Env => return RuleOutcome::Omitted,
    };

    let mut terms = related.net_process_output(t, variables);
    if commodity.kind == CommodityType::Stock {
        terms.push((
            variables.get(&VariableKey::ECoStock(t, site_id.clone(), commodity_id.clone())),
            1.0,
        ));
    }
    for key in &related.storages {
        terms.push((variables.get(&VariableKey::EStoOut(t, (*key).clone())), 1.0));
        terms.push((variables.get(&VariableKey::EStoIn(t, (*key).clone())), -1.0));
    }
    for key in &related.imports {
        terms.push((variables.get(&VariableKey::ETraOut(t, (*key).clone())), 1.0));
    }
    for key in &related.exports {
        terms.push((variables.get(&VariableKey::ETraIn(t, (*key).clone())), -1.0));
    }

    RuleOutcome::Expression(LinearConstraint::ge(terms, demand))
}

/// `e_co_stock[t] <= max_per_hour * dt`
fn stock_hourly_rule(
    t: u32,
    site_id: &SiteID,
    commodity_id: &CommodityID,
    commodity: &Commodity,
    variables: &VariableMap,
    dt: f64,
) -> RuleOutcome {
    if commodity.kind != CommodityType::Stock || !commodity.max_per_hour.is_finite() {
        return RuleOutcome::Omitted;
    }

    let var = variables.get(&VariableKey::ECoStock(t, site_id.clone(), commodity_id.clone()));
    RuleOutcome::Expression(LinearConstraint::le(
        vec![(var, 1.0)],
        commodity.max_per_hour.value() * dt,
    ))
}

/// `sum over t of e_co_stock[t] * weight <= max`
fn stock_annual_rule(
    site_id: &SiteID,
    commodity_id: &CommodityID,
    commodity: &Commodity,
    variables: &VariableMap,
    parameters: &ModelParameters,
    weight: f64,
) -> RuleOutcome {
    if commodity.kind != CommodityType::Stock || !commodity.max.is_finite() {
        return RuleOutcome::Omitted;
    }

    let terms = parameters
        .timesteps()
        .map(|t| {
            let var =
                variables.get(&VariableKey::ECoStock(t, site_id.clone(), commodity_id.clone()));
            (var, weight)
        })
        .collect();
    RuleOutcome::Expression(LinearConstraint::le(terms, commodity.max.value()))
}

/// Net emission of an environmental commodity in a timestep must not exceed `max_per_hour * dt`
fn env_hourly_rule(
    t: u32,
    commodity: &Commodity,
    related: &RelatedFlows,
    variables: &VariableMap,
    dt: f64,
) -> RuleOutcome {
    if commodity.kind != CommodityType::Env || !commodity.max_per_hour.is_finite() {
        return RuleOutcome::Omitted;
    }

    RuleOutcome::Expression(LinearConstraint::le(
        related.net_process_output(t, variables),
        commodity.max_per_hour.value() * dt,
    ))
}

/// Annual net emission of an environmental commodity must not exceed `max`
fn env_annual_rule(
    commodity: &Commodity,
    related: &RelatedFlows,
    variables: &VariableMap,
    parameters: &ModelParameters,
    weight: f64,
) -> RuleOutcome {
    if commodity.kind != CommodityType::Env || !commodity.max.is_finite() {
        return RuleOutcome::Omitted;
    }

    let terms = parameters
        .timesteps()
        .flat_map(|t| related.net_process_output(t, variables))
        .map(|(var, coeff)| (var, coeff * weight))
        .collect();
    RuleOutcome::Expression(LinearConstraint::le(terms, commodity.max.value()))
}

/// Storage content balance:
///
/// ```text
/// e_sto_con[t] = (1 - discharge)^dt * e_sto_con[t-1] + eff_in * e_sto_in[t] - e_sto_out[t] / eff_out
/// ```
fn storage_state_rule(
    t: u32,
    key: &StorageKey,
    storage: &Storage,
    variables: &VariableMap,
    dt: f64,
) -> RuleOutcome {
    let retention = (1.0 - storage.discharge.value()).powf(dt);
    RuleOutcome::Expression(LinearConstraint::eq(
        vec![
            (variables.get(&VariableKey::EStoCon(t, key.clone())), 1.0),
            (variables.get(&VariableKey::EStoCon(t - 1, key.clone())), -retention),
            (
                variables.get(&VariableKey::EStoIn(t, key.clone())),
                -storage.eff_in.value(),
            ),
            (
                variables.get(&VariableKey::EStoOut(t, key.clone())),
                1.0 / storage.eff_out.value(),
            ),
        ],
        0.0,
    ))
}

/// Charging or discharging in a timestep must not exceed `cap_sto_p * dt`
fn storage_power_rule(
    flow: &VariableKey,
    key: &StorageKey,
    variables: &VariableMap,
    dt: f64,
) -> RuleOutcome {
    RuleOutcome::Expression(LinearConstraint::le(
        vec![
            (variables.get(flow), 1.0),
            (variables.get(&VariableKey::CapStoP(key.clone())), -dt),
        ],
        0.0,
    ))
}

/// `e_sto_con[t] <= cap_sto_c`
fn storage_content_rule(t: u32, key: &StorageKey, variables: &VariableMap) -> RuleOutcome {
    RuleOutcome::Expression(LinearConstraint::le(
        vec![
            (variables.get(&VariableKey::EStoCon(t, key.clone())), 1.0),
            (variables.get(&VariableKey::CapStoC(key.clone())), -1.0),
        ],
        0.0,
    ))
}

/// `e_sto_con[0] = init * cap_sto_c`
fn storage_initial_rule(key: &StorageKey, storage: &Storage, variables: &VariableMap) -> RuleOutcome {
    RuleOutcome::Expression(LinearConstraint::eq(
        vec![
            (variables.get(&VariableKey::EStoCon(0, key.clone())), 1.0),
            (
                variables.get(&VariableKey::CapStoC(key.clone())),
                -storage.init.value(),
            ),
        ],
        0.0,
    ))
}

/// `e_sto_con[N] >= init * cap_sto_c`
fn storage_final_rule(
    key: &StorageKey,
    storage: &Storage,
    variables: &VariableMap,
    num_timesteps: u32,
) -> RuleOutcome {
    RuleOutcome::Expression(LinearConstraint::ge(
        vec![
            (
                variables.get(&VariableKey::EStoCon(num_timesteps, key.clone())),
                1.0,
            ),
            (
                variables.get(&VariableKey::CapStoC(key.clone())),
                -storage.init.value(),
            ),
        ],
        0.0,
    ))
}

/// `e_tra_in[t] <= cap_tra * dt`
fn transmission_capacity_rule(
    t: u32,
    key: &TransmissionKey,
    variables: &VariableMap,
    dt: f64,
) -> RuleOutcome {
    RuleOutcome::Expression(LinearConstraint::le(
        vec![
            (variables.get(&VariableKey::ETraIn(t, key.clone())), 1.0),
            (variables.get(&VariableKey::CapTra(key.clone())), -dt),
        ],
        0.0,
    ))
}

/// `e_tra_out[t] = eff * e_tra_in[t]`
fn transmission_efficiency_rule(
    t: u32,
    key: &TransmissionKey,
    transmission: &Transmission,
    variables: &VariableMap,
) -> RuleOutcome {
    RuleOutcome::Expression(LinearConstraint::eq(
        vec![
            (variables.get(&VariableKey::ETraOut(t, key.clone())), 1.0),
            (
                variables.get(&VariableKey::ETraIn(t, key.clone())),
                -transmission.eff.value(),
            ),
        ],
        0.0,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{model_parameters, period_input, process_key};
    use crate::simulation::optimisation::build_problem;
    use crate::solver::{HighsSolver, SolverAdapter, TerminationStatus};
    use crate::units::Hours;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn availability_keys(constraint_keys: &[ConstraintKey]) -> Vec<&ProcessOutputKey> {
        constraint_keys
            .iter()
            .filter_map(|key| match key {
                ConstraintKey::Availability(output_key) => Some(output_key),
                _ => None,
            })
            .collect()
    }

    fn output_key(process_id: &str, commodity_id: &str) -> ProcessOutputKey {
        ProcessOutputKey {
            process: process_key(2020, process_id),
            commodity_id: commodity_id.into(),
        }
    }

    #[rstest]
    #[case(8760.0)]
    #[case(8760.0 + 1e-9)]
    fn test_availability_rule_omitted(
        model_parameters: ModelParameters,
        mut period_input: PeriodInput,
        #[case] availability: f64,
    ) {
        let key = process_key(2020, "CCGT");
        period_input.processes[&key].availability = Hours(availability);
        let model = build_problem(&model_parameters, &period_input).unwrap();

        let process = &period_input.processes[&key];
        let outcome = availability_rule(
            &output_key("CCGT", "Elec"),
            process,
            &model.variables,
            model_parameters.timesteps(),
        );
        assert_eq!(outcome, RuleOutcome::Omitted);
        assert!(
            availability_keys(&model.constraint_keys)
                .iter()
                .all(|output_key| output_key.process != key)
        );
    }

    #[rstest]
    fn test_availability_rule_expression(
        model_parameters: ModelParameters,
        mut period_input: PeriodInput,
    ) {
        let key = process_key(2020, "CCGT");
        period_input.processes[&key].availability = Hours(4000.0);
        let model = build_problem(&model_parameters, &period_input).unwrap();

        let RuleOutcome::Expression(constraint) = availability_rule(
            &output_key("CCGT", "Elec"),
            &period_input.processes[&key],
            &model.variables,
            model_parameters.timesteps(),
        ) else {
            panic!("Expected an availability constraint");
        };

        // One term per timestep plus the capacity
        assert_eq!(constraint.terms.len(), 5);
        let elec: CommodityID = "Elec".into();
        for (t, (var, coeff)) in (1..=4).zip(&constraint.terms) {
            assert_eq!(*var, model.variables.e_pro_out(t, &key, &elec));
            assert_eq!(*coeff, 1.0);
        }
        assert_eq!(constraint.terms[4], (model.variables.cap_pro(&key), -4000.0));
        assert_eq!(constraint.upper, 0.0);
        assert_eq!(constraint.lower, f64::NEG_INFINITY);
    }

    #[rstest]
    fn test_availability_once_per_output(
        model_parameters: ModelParameters,
        mut period_input: PeriodInput,
    ) {
        let key = process_key(2020, "CCGT");
        period_input.processes[&key].availability = Hours(4000.0);
        let model = build_problem(&model_parameters, &period_input).unwrap();

        // CCGT produces Elec and CO2; WindPark is available all year
        assert_eq!(
            availability_keys(&model.constraint_keys),
            [&output_key("CCGT", "Elec"), &output_key("CCGT", "CO2")]
        );
    }

    #[rstest]
    fn test_availability_zero_output(
        model_parameters: ModelParameters,
        mut period_input: PeriodInput,
    ) {
        let key = process_key(2020, "CCGT");
        period_input.processes[&key].availability = Hours(4000.0);
        let model = build_problem(&model_parameters, &period_input).unwrap();

        let RuleOutcome::Expression(constraint) = availability_rule(
            &output_key("CCGT", "Elec"),
            &period_input.processes[&key],
            &model.variables,
            model_parameters.timesteps(),
        ) else {
            panic!("Expected an availability constraint");
        };

        // No output at all, whatever the capacity
        let mut values = vec![0.0; model.problem.num_cols()];
        assert!(constraint.is_satisfied(&values, 0.0));
        values[model.variables.cap_pro(&key).index()] = 50.0;
        assert!(constraint.is_satisfied(&values, 0.0));
    }

    #[rstest]
    fn test_availability_respected_by_solution(
        model_parameters: ModelParameters,
        mut period_input: PeriodInput,
    ) {
        let key = process_key(2020, "CCGT");
        period_input.processes[&key].availability = Hours(2.0);
        let model = build_problem(&model_parameters, &period_input).unwrap();
        let output = HighsSolver.solve(&model.problem, None).unwrap();
        assert_eq!(output.status, TerminationStatus::Optimal);

        let elec: CommodityID = "Elec".into();
        let total_output: f64 = model_parameters
            .timesteps()
            .map(|t| output.column_values[model.variables.e_pro_out(t, &key, &elec).index()])
            .sum();
        let capacity = output.column_values[model.variables.cap_pro(&key).index()];
        assert!(total_output <= 2.0 * capacity + 1e-6);
    }

    #[rstest]
    fn test_commodity_balance_demand(model_parameters: ModelParameters, period_input: PeriodInput) {
        let model = build_problem(&model_parameters, &period_input).unwrap();
        let row = model
            .constraint_keys
            .iter()
            .position(|key| {
                matches!(key, ConstraintKey::CommodityBalance(3, _, commodity_id)
                    if *commodity_id == CommodityID::from("Elec"))
            })
            .unwrap();
        let row = &model.problem.rows()[row];
        assert_approx_eq!(f64, row.lower, 30.0);
        assert_eq!(row.upper, f64::INFINITY);

        // Supim and env commodities have no balance
        assert!(!model.constraint_keys.iter().any(|key| {
            matches!(key, ConstraintKey::CommodityBalance(_, _, commodity_id)
                if *commodity_id == CommodityID::from("Wind")
                    || *commodity_id == CommodityID::from("CO2"))
        }));
    }

    #[rstest]
    fn test_unlimited_commodities_omitted(
        model_parameters: ModelParameters,
        period_input: PeriodInput,
    ) {
        let model = build_problem(&model_parameters, &period_input).unwrap();
        assert!(!model.constraint_keys.iter().any(|key| matches!(
            key,
            ConstraintKey::StockHourly(..)
                | ConstraintKey::StockAnnual(..)
                | ConstraintKey::EnvHourly(..)
                | ConstraintKey::EnvAnnual(..)
        )));
    }

    #[rstest]
    fn test_env_annual_limit(model_parameters: ModelParameters, mut period_input: PeriodInput) {
        let co2: (SiteID, CommodityID) = ("North".into(), "CO2".into());
        period_input.commodities[&co2].max = crate::units::Energy(0.0);
        let model = build_problem(&model_parameters, &period_input).unwrap();
        let output = HighsSolver.solve(&model.problem, None).unwrap();

        // Without emissions, CCGT cannot run, and wind is unavailable in timestep 2
        assert_ne!(output.status, TerminationStatus::Optimal);
    }
}
