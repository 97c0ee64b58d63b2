//! Solver backends and the dispatch seam between them and assembled programs

#[cfg(feature = "microlp")]
pub mod linear;

pub mod nonlinear;

use log::debug;
use thiserror::Error;

use crate::optimize::problem::Problem;
use crate::optimize::SolverOutcome;

/// The capability contract every backend satisfies: accept a program,
/// return a status plus values
pub trait Solver {
    /// Solve the program, returning the raw backend outcome
    fn solve(&self, problem: &Problem) -> Result<SolverOutcome, SolverError>;
}

/// The two backend kinds a problem class can dispatch to
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BackendKind {
    /// Simplex plus branch-and-bound, serves LP, IP and MILP
    Linear,
    /// Penalty-method simplex search, serves NLP and MINLP
    Nonlinear,
}

/// Submit an assembled program to the backend its class selects
///
/// One synchronous call per solve request, no retry. The call blocks until
/// the backend returns; there is no wall-clock timeout, so a backend that
/// does not terminate blocks the whole request.
pub fn dispatch(problem: &Problem) -> Result<SolverOutcome, SolverError> {
    let kind = problem.class().backend();
    debug!(
        "dispatching {} program ({} variables, {} constraints) to the {:?} backend",
        problem.class(),
        problem.num_variables(),
        problem.num_constraints(),
        kind
    );
    match kind {
        BackendKind::Linear => {
            cfg_if::cfg_if! {
                if #[cfg(feature = "microlp")] {
                    linear::LinearSolver::default().solve(problem)
                } else {
                    Err(SolverError::Unavailable { backend: "linear" })
                }
            }
        }
        BackendKind::Nonlinear => nonlinear::NonlinearSolver::default().solve(problem),
    }
}

/// Errors raised by the dispatch seam itself, fatal to the request only
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SolverError {
    /// The backend the class requires was not compiled in
    #[error("no `{backend}` solver backend is available in this build")]
    Unavailable { backend: &'static str },
}
