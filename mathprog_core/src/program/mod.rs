//! The user-facing seam of the crate
//!
//! A caller (normally an interactive form) fills in a [`ProblemSpec`] and
//! hands it to [`solve`]; everything else in the crate sits behind that one
//! function. Row-level input problems are collected as [`Diagnostic`]s and
//! reported alongside a successful solve; whole-model precondition failures
//! abort before any backend is invoked.

pub mod builder;
pub mod input;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::optimize::objective::ObjectiveSense;
use crate::optimize::solvers::SolverError;
use crate::optimize::SolveResult;
use crate::program::input::{ExpressionConstraintRow, LinearConstraintRow};

pub use crate::optimize::problem::ProblemClass;

/// Everything one solve request carries
///
/// The linear classes (LP, IP) use `elements` and `parameters`; the scalar
/// classes (NLP, MILP, MINLP) use the variable declaration texts. Unused
/// fields may be left empty.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProblemSpec {
    /// Which of the five problem classes to build
    pub class: ProblemClass,
    /// Raw comma-separated element names (linear classes only)
    #[serde(default)]
    pub elements: String,
    /// Parameter tables, keyed by parameter name and then by element
    /// (linear classes only)
    #[serde(default)]
    pub parameters: IndexMap<String, IndexMap<String, f64>>,
    /// Raw comma-separated integer variable names (mixed classes only)
    #[serde(default)]
    pub integer_variables: String,
    /// Raw comma-separated continuous variable names (scalar classes)
    #[serde(default)]
    pub continuous_variables: String,
    /// Objective sense and source
    pub objective: ObjectiveSpec,
    /// Ordered constraint rows
    #[serde(default)]
    pub constraints: ConstraintRows,
}

/// The objective of a solve request
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ObjectiveSpec {
    /// Whether to maximize or minimize
    pub sense: ObjectiveSense,
    /// A parameter name (linear classes) or an arithmetic expression string
    /// (scalar classes)
    pub source: String,
}

/// The constraint rows of a solve request, in entry order
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ConstraintRows {
    /// (parameter, operator symbol, value text) rows of the linear classes
    Linear(Vec<LinearConstraintRow>),
    /// (expression, operator tag, value) rows of the scalar classes
    Expression(Vec<ExpressionConstraintRow>),
}

impl ConstraintRows {
    /// Whether no rows were entered at all
    pub fn is_empty(&self) -> bool {
        match self {
            ConstraintRows::Linear(rows) => rows.is_empty(),
            ConstraintRows::Expression(rows) => rows.is_empty(),
        }
    }
}

impl Default for ConstraintRows {
    fn default() -> Self {
        ConstraintRows::Linear(Vec::new())
    }
}

/// One reportable problem with a solve request
///
/// Row-level kinds carry the 1-based index of the offending row. Which
/// kinds are fatal and which merely skip their row is decided by the
/// builder, not encoded here.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Diagnostic {
    /// An operator symbol outside the six known ones; the row was skipped
    #[error("constraint {row}: unrecognized relational operator `{symbol}`")]
    Operator { row: usize, symbol: String },
    /// A right-hand side that is not numeric; the row was skipped
    #[error("constraint {row}: value `{text}` is not numeric")]
    ValueCoercion { row: usize, text: String },
    /// A parameter name outside the declared set; the row was skipped
    #[error("constraint {row}: parameter `{name}` not recognized")]
    UnknownParameter { row: usize, name: String },
    /// A parameter whose table does not cover the declared elements
    /// exactly; fatal to the whole solve
    #[error("parameter `{name}` does not have values for exactly the declared elements (missing {missing:?}, extra {extra:?})")]
    ParameterCoverage {
        name: String,
        missing: Vec<String>,
        extra: Vec<String>,
    },
    /// The objective references a parameter outside the declared set;
    /// fatal to the whole solve
    #[error("objective parameter `{name}` not recognized")]
    UnknownObjectiveParameter { name: String },
    /// The objective expression failed to parse; fatal to the whole solve
    #[error("error in objective `{text}`: {message}")]
    ObjectiveExpression { text: String, message: String },
    /// A constraint expression failed to parse; fatal to the whole solve
    #[error("error in constraint {row} `{text}`: {message}")]
    ConstraintExpression {
        row: usize,
        text: String,
        message: String,
    },
    /// The constraint rows are of the wrong mode for the problem class
    #[error("constraint rows do not match the {class} problem class")]
    MismatchedRows { class: ProblemClass },
    /// Model assembly rejected the collected inputs (e.g. a duplicate
    /// variable name); fatal to the whole solve
    #[error("model assembly failed: {message}")]
    Model { message: String },
    /// The backend the problem class requires is not available; fatal to
    /// this request
    #[error("solver backend unavailable: {backend}")]
    SolverUnavailable { backend: String },
}

/// A successful pass through the solve pipeline
///
/// `skipped` lists the row-level diagnostics collected on the way; under
/// the skip-and-continue policy a request can produce a result while some
/// of its rows were dropped, and the caller must be able to report those.
#[derive(Clone, Debug, PartialEq)]
pub struct SolveOutcome {
    /// The uniform solve result
    pub result: SolveResult,
    /// Row-level reports for rows that were skipped
    pub skipped: Vec<Diagnostic>,
}

/// Build the program described by `spec`, dispatch it to the backend its
/// class selects and interpret the outcome
///
/// One synchronous model-build-and-solve cycle per call; nothing is shared
/// between calls. The `Err` arm carries the diagnostics of validation
/// failures that prevented a backend call from being attempted.
pub fn solve(spec: &ProblemSpec) -> Result<SolveOutcome, Vec<Diagnostic>> {
    let (problem, skipped) = builder::build(spec)?;
    let outcome = problem.optimize().map_err(|error| {
        vec![match error {
            SolverError::Unavailable { backend } => Diagnostic::SolverUnavailable {
                backend: backend.to_string(),
            },
        }]
    })?;
    Ok(SolveOutcome {
        result: SolveResult::interpret(outcome),
        skipped,
    })
}
