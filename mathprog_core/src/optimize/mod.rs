//! Module for assembling and solving mathematical programs

pub mod constraint;
pub mod expression;
pub mod objective;
pub mod problem;
pub mod solvers;
pub mod variable;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Raw outcome reported by a solver backend for one solve call
#[derive(Clone, Debug, PartialEq)]
pub struct SolverOutcome {
    /// The status the backend terminated with
    pub status: OptimizationStatus,
    /// Optimized value of the objective
    ///
    /// Some(f64) if the backend found an optimum, None otherwise
    pub objective_value: Option<f64>,
    /// Values of the variables at the optimum, keyed by variable id
    ///
    /// Some(IndexMap) if the backend found an optimum, None otherwise
    pub variable_values: Option<IndexMap<String, f64>>,
}

impl SolverOutcome {
    /// Outcome of a solve call that produced no optimum
    pub fn failed(status: OptimizationStatus) -> Self {
        SolverOutcome {
            status,
            objective_value: None,
            variable_values: None,
        }
    }
}

/// Status of one backend solve call
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizationStatus {
    /// No solve has been attempted
    Unoptimized,
    /// An optimum was found
    Optimal,
    /// The constraints can't simultaneously be satisfied
    Infeasible,
    /// The objective value is not bounded
    Unbounded,
    /// The program contains a relation or term the backend cannot express
    Rejected,
    /// The backend hit its iteration cap without converging
    Halted,
    /// A numerical or internal error occurred during solving
    Error,
}

/// The two externally visible outcomes of a solve
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// The backend reported an optimal termination
    Optimal,
    /// Anything else: infeasible, unbounded, rejected, halted or errored
    InfeasibleOrError,
}

/// Uniform result of one solve call
///
/// Produced once per solve; there is no partial-success state. When the
/// status is [`SolveStatus::InfeasibleOrError`] no variable mapping is
/// produced and the raw backend status is retained for diagnostic
/// reporting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolveResult {
    /// Binary pass/fail outcome
    pub status: SolveStatus,
    /// Optimal objective value, present only on success
    pub objective_value: Option<f64>,
    /// Variable/element name to value mapping, empty unless optimal
    pub variable_values: IndexMap<String, f64>,
    /// The backend status this result was interpreted from
    pub raw_status: OptimizationStatus,
}

impl SolveResult {
    /// Map a raw backend outcome onto the uniform two-outcome model
    pub fn interpret(outcome: SolverOutcome) -> SolveResult {
        match outcome {
            SolverOutcome {
                status: OptimizationStatus::Optimal,
                objective_value: Some(objective_value),
                variable_values: Some(variable_values),
            } => SolveResult {
                status: SolveStatus::Optimal,
                objective_value: Some(objective_value),
                variable_values,
                raw_status: OptimizationStatus::Optimal,
            },
            // An optimal claim without values is treated as a backend error
            SolverOutcome { status, .. } => SolveResult {
                status: SolveStatus::InfeasibleOrError,
                objective_value: None,
                variable_values: IndexMap::new(),
                raw_status: if status == OptimizationStatus::Optimal {
                    OptimizationStatus::Error
                } else {
                    status
                },
            },
        }
    }

    /// Objective value formatted for display with the given number of
    /// decimals (the stored value keeps full precision)
    pub fn objective_display(&self, decimals: usize) -> Option<String> {
        self.objective_value
            .map(|value| format!("{:.*}", decimals, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optimal_outcome_keeps_values() {
        let mut values = IndexMap::new();
        values.insert("x".to_string(), 2.0);
        let result = SolveResult::interpret(SolverOutcome {
            status: OptimizationStatus::Optimal,
            objective_value: Some(280.0),
            variable_values: Some(values),
        });
        assert_eq!(result.status, SolveStatus::Optimal);
        assert_eq!(result.objective_value, Some(280.0));
        assert_eq!(result.variable_values.get("x"), Some(&2.0));
    }

    #[test]
    fn any_other_status_is_infeasible_or_error() {
        for status in [
            OptimizationStatus::Infeasible,
            OptimizationStatus::Unbounded,
            OptimizationStatus::Rejected,
            OptimizationStatus::Halted,
            OptimizationStatus::Error,
        ] {
            let result = SolveResult::interpret(SolverOutcome::failed(status));
            assert_eq!(result.status, SolveStatus::InfeasibleOrError);
            assert_eq!(result.objective_value, None);
            assert!(result.variable_values.is_empty());
            assert_eq!(result.raw_status, status);
        }
    }

    #[test]
    fn optimal_claim_without_values_is_an_error() {
        let result = SolveResult::interpret(SolverOutcome {
            status: OptimizationStatus::Optimal,
            objective_value: None,
            variable_values: None,
        });
        assert_eq!(result.status, SolveStatus::InfeasibleOrError);
        assert_eq!(result.raw_status, OptimizationStatus::Error);
    }

    #[test]
    fn objective_display_rounds() {
        let result = SolveResult {
            status: SolveStatus::Optimal,
            objective_value: Some(280.004_9),
            variable_values: IndexMap::new(),
            raw_status: OptimizationStatus::Optimal,
        };
        assert_eq!(result.objective_display(2), Some("280.00".to_string()));
        assert_eq!(result.objective_display(4), Some("280.0049".to_string()));
    }
}
