//! Implements the nonlinear backend
//!
//! Serves the NLP and MINLP classes with a quadratic-penalty outer loop
//! around a deterministic Nelder-Mead simplex search. Integer declarations
//! are relaxed to continuous for the search, matching how the original
//! system routed MINLP through a continuous nonlinear solver. Every run is
//! deterministic: the initial simplex is the configured start point plus a
//! fixed per-axis offset, and no randomness is used anywhere.
use indexmap::IndexMap;
use log::{debug, warn};

use crate::configuration::CONFIGURATION;
use crate::optimize::constraint::{ComparisonOp, Constraint, ConstraintExpr};
use crate::optimize::expression::ExpressionError;
use crate::optimize::objective::{ObjectiveSense, ObjectiveTerms};
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{Solver, SolverError};
use crate::optimize::{OptimizationStatus, SolverOutcome};

/// Backend for the nonlinear classes
#[derive(Debug, Default)]
pub struct NonlinearSolver {}

/// Snapshot of the configuration taken once per solve call, so the search
/// closures never touch the global lock
struct SearchSettings {
    tolerance: f64,
    feasibility_tolerance: f64,
    initial_point: f64,
    simplex_step: f64,
    max_iterations: usize,
    penalty_rounds: u32,
    initial_penalty: f64,
    penalty_growth: f64,
    divergence_threshold: f64,
}

impl SearchSettings {
    fn snapshot() -> Self {
        let configuration = CONFIGURATION.read().unwrap();
        SearchSettings {
            tolerance: configuration.tolerance,
            feasibility_tolerance: configuration.feasibility_tolerance,
            initial_point: configuration.initial_point,
            simplex_step: configuration.simplex_step,
            max_iterations: configuration.max_iterations,
            penalty_rounds: configuration.penalty_rounds,
            initial_penalty: configuration.initial_penalty,
            penalty_growth: configuration.penalty_growth,
            divergence_threshold: configuration.divergence_threshold,
        }
    }
}

impl Solver for NonlinearSolver {
    fn solve(&self, problem: &Problem) -> Result<SolverOutcome, SolverError> {
        for constraint in problem.constraints().values() {
            if constraint.op == ComparisonOp::Ne {
                warn!(
                    "nonlinear backend rejected constraint `{}`: the relation != has no program form",
                    constraint.id
                );
                return Ok(SolverOutcome::failed(OptimizationStatus::Rejected));
            }
        }

        let settings = SearchSettings::snapshot();
        let names: Vec<String> = problem.variables().keys().cloned().collect();

        if names.is_empty() {
            return Ok(constant_program_outcome(problem, &settings));
        }

        let sense = problem.objective().sense;
        let mut best = vec![settings.initial_point; names.len()];
        let mut penalty = settings.initial_penalty;
        let rounds = if problem.num_constraints() > 0 {
            settings.penalty_rounds.max(1)
        } else {
            1
        };
        let mut converged = false;
        for round in 0..rounds {
            let merit = |x: &[f64]| penalized_value(problem, &names, x, sense, penalty);
            let (point, round_converged) = nelder_mead(merit, best, &settings);
            best = point;
            converged = round_converged;
            debug!(
                "penalty round {} finished (weight {:e}, converged: {})",
                round + 1,
                penalty,
                converged
            );
            penalty *= settings.penalty_growth;
        }

        let bindings = to_bindings(&names, &best);
        let objective_value = match evaluate_objective(problem, &bindings) {
            Ok(value) => value,
            Err(error) => {
                warn!("objective could not be evaluated at the optimum: {}", error);
                return Ok(SolverOutcome::failed(OptimizationStatus::Error));
            }
        };
        if !objective_value.is_finite()
            || objective_value.abs() > settings.divergence_threshold
            || best.iter().any(|value| !value.is_finite())
        {
            return Ok(SolverOutcome::failed(OptimizationStatus::Unbounded));
        }
        let violation = match total_violation(problem, &bindings) {
            Ok(value) => value,
            Err(error) => {
                warn!("a constraint could not be evaluated at the optimum: {}", error);
                return Ok(SolverOutcome::failed(OptimizationStatus::Error));
            }
        };
        if violation > settings.feasibility_tolerance {
            debug!("search settled at violation {:e}, reporting infeasible", violation);
            return Ok(SolverOutcome::failed(OptimizationStatus::Infeasible));
        }
        if !converged {
            return Ok(SolverOutcome::failed(OptimizationStatus::Halted));
        }

        Ok(SolverOutcome {
            status: OptimizationStatus::Optimal,
            objective_value: Some(objective_value),
            variable_values: Some(bindings),
        })
    }
}

/// A program with no variables: the objective is a constant, so the only
/// question is whether the constant constraints hold
fn constant_program_outcome(problem: &Problem, settings: &SearchSettings) -> SolverOutcome {
    let bindings = IndexMap::new();
    let objective_value = match evaluate_objective(problem, &bindings) {
        Ok(value) => value,
        Err(_) => return SolverOutcome::failed(OptimizationStatus::Error),
    };
    match total_violation(problem, &bindings) {
        Ok(violation) if violation <= settings.feasibility_tolerance => SolverOutcome {
            status: OptimizationStatus::Optimal,
            objective_value: Some(objective_value),
            variable_values: Some(bindings),
        },
        Ok(_) => SolverOutcome::failed(OptimizationStatus::Infeasible),
        Err(_) => SolverOutcome::failed(OptimizationStatus::Error),
    }
}

fn to_bindings(names: &[String], point: &[f64]) -> IndexMap<String, f64> {
    names
        .iter()
        .cloned()
        .zip(point.iter().copied())
        .collect()
}

/// Raw objective value at a point, before sense handling
fn evaluate_objective(
    problem: &Problem,
    bindings: &IndexMap<String, f64>,
) -> Result<f64, ExpressionError> {
    match &problem.objective().terms {
        ObjectiveTerms::Expression(expr) => expr.evaluate(bindings),
        ObjectiveTerms::Linear(terms) => {
            let mut total = 0.0;
            for term in terms {
                let value = bindings.get(&term.variable).copied().ok_or_else(|| {
                    ExpressionError::UnboundVariable {
                        name: term.variable.clone(),
                    }
                })?;
                total += term.coefficient * value;
            }
            Ok(total)
        }
    }
}

fn constraint_lhs(
    constraint: &Constraint,
    bindings: &IndexMap<String, f64>,
) -> Result<f64, ExpressionError> {
    match &constraint.lhs {
        ConstraintExpr::Expression(expr) => expr.evaluate(bindings),
        ConstraintExpr::Linear(terms) => {
            let mut total = 0.0;
            for term in terms {
                let value = bindings.get(&term.variable).copied().ok_or_else(|| {
                    ExpressionError::UnboundVariable {
                        name: term.variable.clone(),
                    }
                })?;
                total += term.coefficient * value;
            }
            Ok(total)
        }
    }
}

/// How far a point is from satisfying one constraint; zero when satisfied.
/// Strict relations are measured like their non-strict counterparts.
fn constraint_violation(
    constraint: &Constraint,
    bindings: &IndexMap<String, f64>,
) -> Result<f64, ExpressionError> {
    let lhs = constraint_lhs(constraint, bindings)?;
    let gap = match constraint.op {
        ComparisonOp::Le | ComparisonOp::Lt => (lhs - constraint.rhs).max(0.0),
        ComparisonOp::Ge | ComparisonOp::Gt => (constraint.rhs - lhs).max(0.0),
        ComparisonOp::Eq => (lhs - constraint.rhs).abs(),
        // Rejected before the search starts
        ComparisonOp::Ne => 0.0,
    };
    Ok(gap)
}

fn total_violation(
    problem: &Problem,
    bindings: &IndexMap<String, f64>,
) -> Result<f64, ExpressionError> {
    let mut total: f64 = 0.0;
    for constraint in problem.constraints().values() {
        total = total.max(constraint_violation(constraint, bindings)?);
    }
    Ok(total)
}

/// The merit function the simplex minimizes: the (sense-adjusted) objective
/// plus the quadratic penalty. Evaluation failures and non-finite values
/// are penalized instead of aborting the search.
fn penalized_value(
    problem: &Problem,
    names: &[String],
    point: &[f64],
    sense: ObjectiveSense,
    penalty: f64,
) -> f64 {
    let bindings = to_bindings(names, point);
    let objective = match evaluate_objective(problem, &bindings) {
        Ok(value) if value.is_finite() => value,
        _ => return f64::INFINITY,
    };
    let directed = match sense {
        ObjectiveSense::Minimize => objective,
        ObjectiveSense::Maximize => -objective,
    };
    let mut penalized = directed;
    for constraint in problem.constraints().values() {
        match constraint_violation(constraint, &bindings) {
            Ok(gap) if gap.is_finite() => penalized += penalty * gap * gap,
            _ => return f64::INFINITY,
        }
    }
    penalized
}

/// Deterministic Nelder-Mead simplex minimization
///
/// Standard reflection/expansion/contraction/shrink coefficients
/// (1, 2, 0.5, 0.5). Returns the best point found and whether the simplex
/// converged before the iteration cap.
fn nelder_mead<F>(merit: F, start: Vec<f64>, settings: &SearchSettings) -> (Vec<f64>, bool)
where
    F: Fn(&[f64]) -> f64,
{
    let dimensions = start.len();
    let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(dimensions + 1);
    let value = merit(&start);
    simplex.push((start.clone(), value));
    for axis in 0..dimensions {
        let mut vertex = start.clone();
        vertex[axis] += settings.simplex_step;
        let value = merit(&vertex);
        simplex.push((vertex, value));
    }

    for _ in 0..settings.max_iterations {
        simplex.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        let best_value = simplex[0].1;
        let worst_value = simplex[dimensions].1;
        if (worst_value - best_value).abs() <= settings.tolerance * (1.0 + best_value.abs()) {
            return (simplex.swap_remove(0).0, true);
        }

        // Centroid of every vertex except the worst
        let mut centroid = vec![0.0; dimensions];
        for (vertex, _) in &simplex[..dimensions] {
            for (axis, component) in vertex.iter().enumerate() {
                centroid[axis] += component / dimensions as f64;
            }
        }
        let worst = simplex[dimensions].0.clone();

        let reflected: Vec<f64> = centroid
            .iter()
            .zip(&worst)
            .map(|(c, w)| c + (c - w))
            .collect();
        let reflected_value = merit(&reflected);

        if reflected_value < best_value {
            let expanded: Vec<f64> = centroid
                .iter()
                .zip(&worst)
                .map(|(c, w)| c + 2.0 * (c - w))
                .collect();
            let expanded_value = merit(&expanded);
            simplex[dimensions] = if expanded_value < reflected_value {
                (expanded, expanded_value)
            } else {
                (reflected, reflected_value)
            };
            continue;
        }
        if reflected_value < simplex[dimensions - 1].1 {
            simplex[dimensions] = (reflected, reflected_value);
            continue;
        }

        let contracted: Vec<f64> = centroid
            .iter()
            .zip(&worst)
            .map(|(c, w)| c + 0.5 * (w - c))
            .collect();
        let contracted_value = merit(&contracted);
        if contracted_value < worst_value {
            simplex[dimensions] = (contracted, contracted_value);
            continue;
        }

        // Shrink every vertex toward the best one
        let best_vertex = simplex[0].0.clone();
        for entry in simplex.iter_mut().skip(1) {
            let shrunk: Vec<f64> = best_vertex
                .iter()
                .zip(&entry.0)
                .map(|(b, v)| b + 0.5 * (v - b))
                .collect();
            let shrunk_value = merit(&shrunk);
            *entry = (shrunk, shrunk_value);
        }
    }

    simplex.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    (simplex.swap_remove(0).0, false)
}
