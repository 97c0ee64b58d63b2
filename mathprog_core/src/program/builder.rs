//! Assembles a solver-agnostic program from a problem specification
//!
//! One builder serves all five classes; they differ only in variable
//! domain and in how objective and constraint terms are constructed.
//! Assembly order: variables, then the objective (fail fast), then the
//! constraint list. Row-syntax errors skip their row; an expression that
//! fails to parse aborts the whole solve, because the program it would
//! have contributed to is structurally incomplete.
use indexmap::IndexSet;
use log::debug;

use crate::io::expr_parse::parse_expression;
use crate::optimize::constraint::{Constraint, LinearTerm};
use crate::optimize::problem::{Problem, ProblemClass};
use crate::optimize::variable::VariableType;
use crate::program::input::{self, ExpressionConstraintRow, LinearConstraintRow};
use crate::program::{ConstraintRows, Diagnostic, ProblemSpec};

/// Build the program described by `spec`
///
/// Returns the assembled program together with the diagnostics of rows
/// that were skipped, or the diagnostics that made assembly impossible.
pub fn build(spec: &ProblemSpec) -> Result<(Problem, Vec<Diagnostic>), Vec<Diagnostic>> {
    if spec.class.is_element_indexed() {
        build_element_indexed(spec)
    } else {
        build_free_scalar(spec)
    }
}

/// LP and IP: one variable per declared element, parameter tables supply
/// every coefficient
fn build_element_indexed(
    spec: &ProblemSpec,
) -> Result<(Problem, Vec<Diagnostic>), Vec<Diagnostic>> {
    let elements = input::parse_identifier_list(&spec.elements);
    let parameter_names: IndexSet<String> = spec.parameters.keys().cloned().collect();

    // Hard precondition: every parameter covers every element exactly
    let coverage = input::validate_parameters(&spec.parameters, &elements);
    if !coverage.is_empty() {
        return Err(coverage);
    }

    let linear_rows: &[LinearConstraintRow] = match &spec.constraints {
        ConstraintRows::Linear(rows) => rows,
        ConstraintRows::Expression(rows) if rows.is_empty() => &[],
        ConstraintRows::Expression(_) => {
            return Err(vec![Diagnostic::MismatchedRows { class: spec.class }])
        }
    };
    let (normalized, skipped) = input::normalize_linear_rows(linear_rows, &parameter_names);

    let mut problem = Problem::new(spec.class, spec.objective.sense);
    let variable_type = if spec.class == ProblemClass::Ip {
        VariableType::Integer
    } else {
        VariableType::Continuous
    };
    for element in &elements {
        problem
            .add_new_variable(element, variable_type, 0.0, f64::INFINITY)
            .map_err(|error| {
                let mut diagnostics = skipped.clone();
                diagnostics.push(Diagnostic::Model {
                    message: error.to_string(),
                });
                diagnostics
            })?;
    }

    // Objective: the chosen parameter table against the element variables
    let table = spec
        .parameters
        .get(&spec.objective.source)
        .ok_or_else(|| {
            let mut diagnostics = skipped.clone();
            diagnostics.push(Diagnostic::UnknownObjectiveParameter {
                name: spec.objective.source.clone(),
            });
            diagnostics
        })?;
    let terms = elements
        .iter()
        .map(|element| LinearTerm {
            variable: element.clone(),
            coefficient: table[element],
        })
        .collect();
    problem.set_linear_objective(terms).map_err(|error| {
        let mut diagnostics = skipped.clone();
        diagnostics.push(Diagnostic::Model {
            message: error.to_string(),
        });
        diagnostics
    })?;

    // Constraints: sum over elements of parameter[e] * x[e] <op> value
    for row in &normalized {
        let table = &spec.parameters[&row.parameter];
        let terms = elements
            .iter()
            .map(|element| LinearTerm {
                variable: element.clone(),
                coefficient: table[element],
            })
            .collect();
        let constraint = Constraint::new_linear(&format!("c{}", row.row), terms, row.op, row.value);
        problem.add_constraint(constraint).map_err(|error| {
            let mut diagnostics = skipped.clone();
            diagnostics.push(Diagnostic::Model {
                message: error.to_string(),
            });
            diagnostics
        })?;
    }

    debug!(
        "assembled {} program over {} elements with {} constraints",
        spec.class,
        elements.len(),
        problem.num_constraints()
    );
    Ok((problem, skipped))
}

/// NLP, MILP and MINLP: free named scalars, terms built by the expression
/// parser over the declared variables
fn build_free_scalar(spec: &ProblemSpec) -> Result<(Problem, Vec<Diagnostic>), Vec<Diagnostic>> {
    let integer_names = if spec.class == ProblemClass::Nlp {
        // NLP declares continuous scalars only
        Vec::new()
    } else {
        input::parse_identifier_list(&spec.integer_variables)
    };
    let continuous_names = input::parse_identifier_list(&spec.continuous_variables);

    let mut problem = Problem::new(spec.class, spec.objective.sense);
    for name in &integer_names {
        problem
            .add_new_variable(name, VariableType::Integer, f64::NEG_INFINITY, f64::INFINITY)
            .map_err(|error| {
                vec![Diagnostic::Model {
                    message: error.to_string(),
                }]
            })?;
    }
    for name in &continuous_names {
        problem
            .add_new_variable(
                name,
                VariableType::Continuous,
                f64::NEG_INFINITY,
                f64::INFINITY,
            )
            .map_err(|error| {
                vec![Diagnostic::Model {
                    message: error.to_string(),
                }]
            })?;
    }
    let declared: IndexSet<String> = problem.variables().keys().cloned().collect();

    // Objective first; a bad objective aborts before any row is looked at
    let objective_expr = parse_expression(&spec.objective.source, &declared).map_err(|error| {
        vec![Diagnostic::ObjectiveExpression {
            text: spec.objective.source.clone(),
            message: error.to_string(),
        }]
    })?;
    problem
        .set_objective_expression(objective_expr)
        .map_err(|error| {
            vec![Diagnostic::Model {
                message: error.to_string(),
            }]
        })?;

    let expression_rows: &[ExpressionConstraintRow] = match &spec.constraints {
        ConstraintRows::Expression(rows) => rows,
        ConstraintRows::Linear(rows) if rows.is_empty() => &[],
        ConstraintRows::Linear(_) => {
            return Err(vec![Diagnostic::MismatchedRows { class: spec.class }])
        }
    };
    let (normalized, mut skipped) = input::normalize_expression_rows(expression_rows);

    for row in &normalized {
        let expr = match parse_expression(&row.expression, &declared) {
            Ok(expr) => expr,
            Err(error) => {
                // The program would be structurally incomplete without this
                // row, so the whole solve is aborted
                skipped.push(Diagnostic::ConstraintExpression {
                    row: row.row,
                    text: row.expression.clone(),
                    message: error.to_string(),
                });
                return Err(skipped);
            }
        };
        let constraint =
            Constraint::new_expression(&format!("c{}", row.row), expr, row.op, row.value);
        problem.add_constraint(constraint).map_err(|error| {
            let mut diagnostics = skipped.clone();
            diagnostics.push(Diagnostic::Model {
                message: error.to_string(),
            });
            diagnostics
        })?;
    }

    debug!(
        "assembled {} program over {} scalars with {} constraints",
        spec.class,
        declared.len(),
        problem.num_constraints()
    );
    Ok((problem, skipped))
}
