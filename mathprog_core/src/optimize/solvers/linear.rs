//! Implements the linear/integer backend over microlp
//!
//! Serves the LP, IP and MILP classes. Flat linear-combination terms map
//! directly onto per-variable coefficients; expression terms (MILP) are
//! lowered through the affine-form reduction first and any nonlinear shape
//! makes the backend reject the program.
use indexmap::IndexMap;
use log::{debug, warn};

use crate::configuration::CONFIGURATION;
use crate::optimize::constraint::{ComparisonOp, Constraint, ConstraintExpr};
use crate::optimize::objective::{ObjectiveSense, ObjectiveTerms};
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{Solver, SolverError};
use crate::optimize::variable::VariableType;
use crate::optimize::{OptimizationStatus, SolverOutcome};

/// Backend for the linear and integer-linear classes
#[derive(Debug, Default)]
pub struct LinearSolver {}

impl Solver for LinearSolver {
    fn solve(&self, problem: &Problem) -> Result<SolverOutcome, SolverError> {
        let (objective_coefficients, objective_constant) =
            match objective_coefficients(problem) {
                Ok(lowered) => lowered,
                Err(reason) => {
                    warn!("linear backend rejected the objective: {}", reason);
                    return Ok(SolverOutcome::failed(OptimizationStatus::Rejected));
                }
            };

        let direction = match problem.objective().sense {
            ObjectiveSense::Maximize => microlp::OptimizationDirection::Maximize,
            ObjectiveSense::Minimize => microlp::OptimizationDirection::Minimize,
        };
        let mut program = microlp::Problem::new(direction);

        let mut handles: IndexMap<String, microlp::Variable> = IndexMap::new();
        for (id, variable) in problem.variables() {
            let coefficient = objective_coefficients.get(id).copied().unwrap_or(0.0);
            let handle = match variable.variable_type {
                VariableType::Continuous => {
                    program.add_var(coefficient, (variable.lower_bound, variable.upper_bound))
                }
                VariableType::Integer => program.add_integer_var(
                    coefficient,
                    integer_bounds(variable.lower_bound, variable.upper_bound),
                ),
            };
            handles.insert(id.clone(), handle);
        }

        for constraint in problem.constraints().values() {
            match lower_constraint(constraint, &handles) {
                Lowered::Row { coefficients, op, rhs } => {
                    program.add_constraint(&coefficients[..], op, rhs);
                }
                Lowered::TriviallyTrue => {
                    debug!("constraint `{}` holds for every assignment, dropped", constraint.id);
                }
                Lowered::TriviallyFalse => {
                    return Ok(SolverOutcome::failed(OptimizationStatus::Infeasible));
                }
                Lowered::Rejected(reason) => {
                    warn!("linear backend rejected constraint `{}`: {}", constraint.id, reason);
                    return Ok(SolverOutcome::failed(OptimizationStatus::Rejected));
                }
            }
        }

        match program.solve() {
            Ok(solution) => {
                let variable_values = handles
                    .iter()
                    .map(|(id, handle)| (id.clone(), *solution.var_value(*handle)))
                    .collect();
                Ok(SolverOutcome {
                    status: OptimizationStatus::Optimal,
                    objective_value: Some(solution.objective() + objective_constant),
                    variable_values: Some(variable_values),
                })
            }
            Err(microlp::Error::Infeasible) => {
                Ok(SolverOutcome::failed(OptimizationStatus::Infeasible))
            }
            Err(microlp::Error::Unbounded) => {
                Ok(SolverOutcome::failed(OptimizationStatus::Unbounded))
            }
            Err(microlp::Error::InternalError(message)) => {
                warn!("microlp reported an internal error: {}", message);
                Ok(SolverOutcome::failed(OptimizationStatus::Error))
            }
        }
    }
}

/// Per-variable objective coefficients plus the constant offset the backend
/// has to add back onto the reported optimum
fn objective_coefficients(problem: &Problem) -> Result<(IndexMap<String, f64>, f64), String> {
    match &problem.objective().terms {
        ObjectiveTerms::Linear(terms) => {
            let mut coefficients: IndexMap<String, f64> = IndexMap::new();
            for term in terms {
                *coefficients.entry(term.variable.clone()).or_insert(0.0) += term.coefficient;
            }
            Ok((coefficients, 0.0))
        }
        ObjectiveTerms::Expression(expr) => match expr.affine_form() {
            Ok(affine) => Ok((affine.coefficients, affine.constant)),
            Err(error) => Err(error.to_string()),
        },
    }
}

/// Result of lowering one constraint into microlp terms
enum Lowered {
    Row {
        coefficients: Vec<(microlp::Variable, f64)>,
        op: microlp::ComparisonOp,
        rhs: f64,
    },
    /// Constant relation that holds regardless of the assignment
    TriviallyTrue,
    /// Constant relation that can never hold
    TriviallyFalse,
    /// Relation or term the backend cannot express
    Rejected(String),
}

fn lower_constraint(
    constraint: &Constraint,
    handles: &IndexMap<String, microlp::Variable>,
) -> Lowered {
    let op = match constraint.op {
        ComparisonOp::Le => microlp::ComparisonOp::Le,
        ComparisonOp::Ge => microlp::ComparisonOp::Ge,
        ComparisonOp::Eq => microlp::ComparisonOp::Eq,
        ComparisonOp::Lt => {
            debug!("constraint `{}`: strict < relaxed to <=", constraint.id);
            microlp::ComparisonOp::Le
        }
        ComparisonOp::Gt => {
            debug!("constraint `{}`: strict > relaxed to >=", constraint.id);
            microlp::ComparisonOp::Ge
        }
        ComparisonOp::Ne => {
            return Lowered::Rejected("the relation != has no linear-program form".to_string())
        }
    };

    // Accumulate by variable id first: microlp rejects a variable appearing
    // twice in one row
    let mut accumulated: IndexMap<String, f64> = IndexMap::new();
    let mut constant = 0.0;
    match &constraint.lhs {
        ConstraintExpr::Linear(terms) => {
            for term in terms {
                *accumulated.entry(term.variable.clone()).or_insert(0.0) += term.coefficient;
            }
        }
        ConstraintExpr::Expression(expr) => match expr.affine_form() {
            Ok(affine) => {
                accumulated = affine.coefficients;
                constant = affine.constant;
            }
            Err(error) => return Lowered::Rejected(error.to_string()),
        },
    }

    let rhs = constraint.rhs - constant;
    if accumulated.is_empty() {
        let tolerance = CONFIGURATION.read().unwrap().tolerance;
        let holds = match op {
            microlp::ComparisonOp::Le => 0.0 <= rhs + tolerance,
            microlp::ComparisonOp::Ge => 0.0 >= rhs - tolerance,
            microlp::ComparisonOp::Eq => rhs.abs() <= tolerance,
        };
        return if holds {
            Lowered::TriviallyTrue
        } else {
            Lowered::TriviallyFalse
        };
    }

    let coefficients = accumulated
        .into_iter()
        .map(|(id, coefficient)| (handles[&id], coefficient))
        .collect();
    Lowered::Row {
        coefficients,
        op,
        rhs,
    }
}

fn integer_bounds(lower_bound: f64, upper_bound: f64) -> (i32, i32) {
    let lower = if lower_bound <= i32::MIN as f64 {
        i32::MIN
    } else {
        lower_bound.ceil() as i32
    };
    let upper = if upper_bound >= i32::MAX as f64 {
        i32::MAX
    } else {
        upper_bound.floor() as i32
    };
    (lower, upper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::constraint::LinearTerm;
    use crate::optimize::expression::{BinaryOp, Expr};
    use crate::optimize::problem::ProblemClass;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn two_variable_lp() -> Problem {
        // Maximize x + 2*y subject to x + y <= 4 and 2*x + y >= 2,
        // with x >= 0 and 0 <= y <= 3; the optimum is 7 at (1, 3)
        let mut problem = Problem::new(ProblemClass::Lp, ObjectiveSense::Maximize);
        problem
            .add_new_variable("x", VariableType::Continuous, 0.0, f64::INFINITY)
            .unwrap();
        problem
            .add_new_variable("y", VariableType::Continuous, 0.0, 3.0)
            .unwrap();
        problem
            .set_linear_objective(vec![
                LinearTerm {
                    variable: "x".to_string(),
                    coefficient: 1.0,
                },
                LinearTerm {
                    variable: "y".to_string(),
                    coefficient: 2.0,
                },
            ])
            .unwrap();
        problem
            .add_constraint(Constraint::new_linear(
                "c1",
                vec![
                    LinearTerm {
                        variable: "x".to_string(),
                        coefficient: 1.0,
                    },
                    LinearTerm {
                        variable: "y".to_string(),
                        coefficient: 1.0,
                    },
                ],
                ComparisonOp::Le,
                4.0,
            ))
            .unwrap();
        problem
            .add_constraint(Constraint::new_linear(
                "c2",
                vec![
                    LinearTerm {
                        variable: "x".to_string(),
                        coefficient: 2.0,
                    },
                    LinearTerm {
                        variable: "y".to_string(),
                        coefficient: 1.0,
                    },
                ],
                ComparisonOp::Ge,
                2.0,
            ))
            .unwrap();
        problem
    }

    #[test]
    fn solves_a_small_lp() {
        init();
        let outcome = LinearSolver::default().solve(&two_variable_lp()).unwrap();
        assert_eq!(outcome.status, OptimizationStatus::Optimal);
        let objective = outcome.objective_value.unwrap();
        assert!((objective - 7.0).abs() < 1e-6, "objective was {}", objective);
        let values = outcome.variable_values.unwrap();
        assert!((values["x"] - 1.0).abs() < 1e-6);
        assert!((values["y"] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_disequality_constraints() {
        init();
        let mut problem = two_variable_lp();
        problem
            .add_constraint(Constraint::new_linear(
                "c3",
                vec![LinearTerm {
                    variable: "x".to_string(),
                    coefficient: 1.0,
                }],
                ComparisonOp::Ne,
                1.0,
            ))
            .unwrap();
        let outcome = LinearSolver::default().solve(&problem).unwrap();
        assert_eq!(outcome.status, OptimizationStatus::Rejected);
    }

    #[test]
    fn rejects_nonlinear_expression_terms() {
        init();
        // x * y in a MILP row has no linear form
        let mut problem = Problem::new(ProblemClass::Milp, ObjectiveSense::Minimize);
        problem
            .add_new_variable("x", VariableType::Integer, f64::NEG_INFINITY, f64::INFINITY)
            .unwrap();
        problem
            .add_new_variable("y", VariableType::Continuous, f64::NEG_INFINITY, f64::INFINITY)
            .unwrap();
        problem
            .set_objective_expression(Expr::new_binary(
                Expr::new_variable("x"),
                BinaryOp::Add,
                Expr::new_variable("y"),
            ))
            .unwrap();
        problem
            .add_constraint(Constraint::new_expression(
                "c1",
                Expr::new_binary(
                    Expr::new_variable("x"),
                    BinaryOp::Mul,
                    Expr::new_variable("y"),
                ),
                ComparisonOp::Le,
                10.0,
            ))
            .unwrap();
        let outcome = LinearSolver::default().solve(&problem).unwrap();
        assert_eq!(outcome.status, OptimizationStatus::Rejected);
    }

    #[test]
    fn constant_false_row_is_infeasible() {
        init();
        let mut problem = two_variable_lp();
        // 5 <= 3 after lowering: constant lhs, no variables
        problem
            .add_constraint(Constraint::new_expression(
                "c3",
                Expr::new_number(5.0),
                ComparisonOp::Le,
                3.0,
            ))
            .unwrap();
        let outcome = LinearSolver::default().solve(&problem).unwrap();
        assert_eq!(outcome.status, OptimizationStatus::Infeasible);
    }

    #[test]
    fn strict_inequalities_are_relaxed() {
        init();
        let mut problem = two_variable_lp();
        problem
            .add_constraint(Constraint::new_linear(
                "c3",
                vec![LinearTerm {
                    variable: "x".to_string(),
                    coefficient: 1.0,
                }],
                ComparisonOp::Lt,
                1.0,
            ))
            .unwrap();
        let outcome = LinearSolver::default().solve(&problem).unwrap();
        // x < 1 is treated as x <= 1; the optimum is unchanged
        assert_eq!(outcome.status, OptimizationStatus::Optimal);
        assert!((outcome.objective_value.unwrap() - 7.0).abs() < 1e-6);
    }
}
