//! Provides structs for representing an assembled program's objective

use serde::{Deserialize, Serialize};

use crate::optimize::constraint::LinearTerm;
use crate::optimize::expression::Expr;

/// Represents the objective of an assembled program
#[derive(Clone, Debug, PartialEq)]
pub struct Objective {
    /// Sense of the objective (see [`ObjectiveSense`])
    pub sense: ObjectiveSense,
    /// The single expression to optimize (see [`ObjectiveTerms`])
    pub terms: ObjectiveTerms,
}

impl Objective {
    /// Create a new objective over a flat linear combination
    pub fn new_linear(sense: ObjectiveSense, terms: Vec<LinearTerm>) -> Self {
        Objective {
            sense,
            terms: ObjectiveTerms::Linear(terms),
        }
    }

    /// Create a new objective over an expression tree
    pub fn new_expression(sense: ObjectiveSense, expr: Expr) -> Self {
        Objective {
            sense,
            terms: ObjectiveTerms::Expression(expr),
        }
    }
}

/// Represents the sense of the objective
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectiveSense {
    /// The objective should be maximized
    Maximize,
    /// The objective should be minimized
    Minimize,
}

/// The expression a program optimizes
#[derive(Clone, Debug, PartialEq)]
pub enum ObjectiveTerms {
    /// A flat linear combination over element-indexed variables
    Linear(Vec<LinearTerm>),
    /// An arbitrary arithmetic term over free scalar variables
    Expression(Expr),
}
