//! Provides struct representing an assembled, solver-agnostic program
use std::fmt::{Display, Formatter};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::optimize::constraint::{Constraint, LinearTerm};
use crate::optimize::expression::Expr;
use crate::optimize::objective::{Objective, ObjectiveSense, ObjectiveTerms};
use crate::optimize::solvers::{self, BackendKind, SolverError};
use crate::optimize::variable::{Variable, VariableBuilder, VariableType};
use crate::optimize::SolverOutcome;

/// The five supported problem classes
///
/// The class is fixed at model-build time; it determines the variable
/// domain rules and which backend the dispatcher selects.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProblemClass {
    /// Linear program: element-indexed continuous variables >= 0
    #[serde(rename = "LP")]
    Lp,
    /// Integer program: element-indexed non-negative integer variables
    #[serde(rename = "IP")]
    Ip,
    /// Nonlinear program: free continuous scalars, unrestricted sign
    #[serde(rename = "NLP")]
    Nlp,
    /// Mixed-integer linear program: free integer and continuous scalars
    #[serde(rename = "MILP")]
    Milp,
    /// Mixed-integer nonlinear program: free integer and continuous scalars
    #[serde(rename = "MINLP")]
    Minlp,
}

impl ProblemClass {
    /// Which backend kind solves this class
    pub fn backend(&self) -> BackendKind {
        match self {
            ProblemClass::Lp | ProblemClass::Ip | ProblemClass::Milp => BackendKind::Linear,
            ProblemClass::Nlp | ProblemClass::Minlp => BackendKind::Nonlinear,
        }
    }

    /// Whether the class indexes its variables by the declared elements
    pub fn is_element_indexed(&self) -> bool {
        matches!(self, ProblemClass::Lp | ProblemClass::Ip)
    }
}

impl Display for ProblemClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ProblemClass::Lp => write!(f, "LP"),
            ProblemClass::Ip => write!(f, "IP"),
            ProblemClass::Nlp => write!(f, "NLP"),
            ProblemClass::Milp => write!(f, "MILP"),
            ProblemClass::Minlp => write!(f, "MINLP"),
        }
    }
}

/// An assembled mathematical program
///
/// Holds exactly one objective, the declared decision variables and zero or
/// more constraints. Constraint order is preserved for reporting; it does
/// not affect the solution.
#[derive(Clone, Debug)]
pub struct Problem {
    /// Class the program was assembled for
    class: ProblemClass,
    /// Objective to optimize
    objective: Objective,
    /// Variables of the program, keyed by id
    variables: IndexMap<String, Variable>,
    /// Constraints of the program, keyed by id
    constraints: IndexMap<String, Constraint>,
}

impl Problem {
    /// Create a new empty program of the given class and objective sense
    pub fn new(class: ProblemClass, sense: ObjectiveSense) -> Self {
        Problem {
            class,
            objective: Objective::new_linear(sense, Vec::new()),
            variables: IndexMap::new(),
            constraints: IndexMap::new(),
        }
    }

    /// Class the program was assembled for
    pub fn class(&self) -> ProblemClass {
        self.class
    }

    /// The program's objective
    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    /// The program's variables, in declaration order
    pub fn variables(&self) -> &IndexMap<String, Variable> {
        &self.variables
    }

    /// The program's constraints, in insertion order
    pub fn constraints(&self) -> &IndexMap<String, Constraint> {
        &self.constraints
    }

    /// Current number of variables in the program
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Current number of constraints in the program
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Add a variable to the program
    pub fn add_variable(&mut self, variable: Variable) -> Result<(), ProblemError> {
        if self.variables.contains_key(&variable.id) {
            return Err(ProblemError::VariableIdAlreadyExists {
                id: variable.id.clone(),
            });
        }
        if variable.lower_bound > variable.upper_bound {
            return Err(ProblemError::InvalidVariableBounds {
                id: variable.id.clone(),
            });
        }
        self.variables.insert(variable.id.clone(), variable);
        Ok(())
    }

    /// Create a new variable and add it to the program
    pub fn add_new_variable(
        &mut self,
        id: &str,
        variable_type: VariableType,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        let variable = VariableBuilder::default()
            .id(id)
            .variable_type(variable_type)
            .lower_bound(lower_bound)
            .upper_bound(upper_bound)
            .build()
            .unwrap();
        self.add_variable(variable)
    }

    /// Add a constraint to the program
    ///
    /// Every variable the constraint references must already be declared.
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<(), ProblemError> {
        if self.constraints.contains_key(&constraint.id) {
            return Err(ProblemError::ConstraintIdAlreadyExists {
                id: constraint.id.clone(),
            });
        }
        for name in constraint.variables() {
            if !self.variables.contains_key(&name) {
                return Err(ProblemError::UnknownVariableInConstraint {
                    constraint: constraint.id.clone(),
                    variable: name,
                });
            }
        }
        self.constraints.insert(constraint.id.clone(), constraint);
        Ok(())
    }

    /// Replace the objective with a flat linear combination
    pub fn set_linear_objective(&mut self, terms: Vec<LinearTerm>) -> Result<(), ProblemError> {
        for term in &terms {
            if !self.variables.contains_key(&term.variable) {
                return Err(ProblemError::UnknownVariableInObjective {
                    variable: term.variable.clone(),
                });
            }
        }
        self.objective.terms = ObjectiveTerms::Linear(terms);
        Ok(())
    }

    /// Replace the objective with an expression tree
    pub fn set_objective_expression(&mut self, expr: Expr) -> Result<(), ProblemError> {
        for name in expr.variables() {
            if !self.variables.contains_key(&name) {
                return Err(ProblemError::UnknownVariableInObjective { variable: name });
            }
        }
        self.objective.terms = ObjectiveTerms::Expression(expr);
        Ok(())
    }

    /// Whether any declared variable is integer
    pub fn has_integer_variables(&self) -> bool {
        self.variables
            .values()
            .any(|variable| variable.variable_type == VariableType::Integer)
    }

    /// Submit the program to the backend selected by its class
    pub fn optimize(&self) -> Result<SolverOutcome, SolverError> {
        solvers::dispatch(self)
    }
}

/// Errors associated with assembling a [`Problem`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProblemError {
    /// Tried to add a variable with the same id as an existing variable
    #[error("a variable with id `{id}` already exists")]
    VariableIdAlreadyExists { id: String },
    /// Tried to add a variable with lower_bound > upper_bound
    #[error("variable `{id}` has lower_bound > upper_bound")]
    InvalidVariableBounds { id: String },
    /// Tried to add a constraint with the same id as an existing constraint
    #[error("a constraint with id `{id}` already exists")]
    ConstraintIdAlreadyExists { id: String },
    /// Tried to add a constraint referencing an undeclared variable
    #[error("constraint `{constraint}` references undeclared variable `{variable}`")]
    UnknownVariableInConstraint { constraint: String, variable: String },
    /// Tried to set an objective referencing an undeclared variable
    #[error("objective references undeclared variable `{variable}`")]
    UnknownVariableInObjective { variable: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::constraint::ComparisonOp;

    #[test]
    fn new_problem() {
        let problem = Problem::new(ProblemClass::Lp, ObjectiveSense::Maximize);
        assert_eq!(problem.class(), ProblemClass::Lp);
        assert_eq!(problem.objective().sense, ObjectiveSense::Maximize);
        assert_eq!(problem.num_variables(), 0);
        assert_eq!(problem.num_constraints(), 0);
    }

    #[test]
    fn add_variables() {
        let mut problem = Problem::new(ProblemClass::Milp, ObjectiveSense::Minimize);
        problem
            .add_new_variable("x", VariableType::Integer, f64::NEG_INFINITY, f64::INFINITY)
            .unwrap();
        problem
            .add_new_variable("y", VariableType::Continuous, 0.0, 100.0)
            .unwrap();
        assert_eq!(problem.num_variables(), 2);
        assert!(problem.has_integer_variables());

        // A duplicate id is rejected
        match problem.add_new_variable("x", VariableType::Continuous, 0.0, 1.0) {
            Err(ProblemError::VariableIdAlreadyExists { id }) => assert_eq!(id, "x"),
            other => panic!("duplicate variable not caught: {:?}", other),
        }
    }

    #[test]
    fn add_variable_with_bad_bounds() {
        let mut problem = Problem::new(ProblemClass::Lp, ObjectiveSense::Maximize);
        match problem.add_new_variable("x", VariableType::Continuous, 100.0, 64.0) {
            Err(ProblemError::InvalidVariableBounds { .. }) => {}
            other => panic!("invalid bounds not caught: {:?}", other),
        }
    }

    #[test]
    fn constraint_must_reference_declared_variables() {
        let mut problem = Problem::new(ProblemClass::Lp, ObjectiveSense::Maximize);
        problem
            .add_new_variable("x", VariableType::Continuous, 0.0, f64::INFINITY)
            .unwrap();

        let constraint = Constraint::new_linear(
            "c1",
            vec![LinearTerm {
                variable: "ghost".to_string(),
                coefficient: 1.0,
            }],
            ComparisonOp::Le,
            10.0,
        );
        match problem.add_constraint(constraint) {
            Err(ProblemError::UnknownVariableInConstraint { variable, .. }) => {
                assert_eq!(variable, "ghost")
            }
            other => panic!("undeclared variable not caught: {:?}", other),
        }
    }

    #[test]
    fn objective_must_reference_declared_variables() {
        let mut problem = Problem::new(ProblemClass::Nlp, ObjectiveSense::Minimize);
        problem
            .add_new_variable("x", VariableType::Continuous, f64::NEG_INFINITY, f64::INFINITY)
            .unwrap();
        match problem.set_objective_expression(Expr::new_variable("ghost")) {
            Err(ProblemError::UnknownVariableInObjective { variable }) => {
                assert_eq!(variable, "ghost")
            }
            other => panic!("undeclared variable not caught: {:?}", other),
        }
    }

    #[test]
    fn backend_selection_by_class() {
        assert_eq!(ProblemClass::Lp.backend(), BackendKind::Linear);
        assert_eq!(ProblemClass::Ip.backend(), BackendKind::Linear);
        assert_eq!(ProblemClass::Milp.backend(), BackendKind::Linear);
        assert_eq!(ProblemClass::Nlp.backend(), BackendKind::Nonlinear);
        assert_eq!(ProblemClass::Minlp.backend(), BackendKind::Nonlinear);
    }
}
