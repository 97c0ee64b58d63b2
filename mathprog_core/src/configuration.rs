use std::sync::{LazyLock, RwLock};

pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

/// Numeric defaults shared by the solver backends.
///
/// Note there is deliberately no wall-clock timeout here: a solve is a
/// single blocking backend call and a hung backend blocks the whole
/// request. The iteration caps below bound the work of the in-process
/// nonlinear backend, but elapsed time is not enforced anywhere.
pub struct Configuration {
    /// Tolerance used for numeric comparisons on solver results
    pub tolerance: f64,
    /// Maximum constraint violation accepted as feasible by the
    /// nonlinear backend
    pub feasibility_tolerance: f64,
    /// Starting value for every variable in the nonlinear search
    pub initial_point: f64,
    /// Per-axis offset used to build the initial simplex
    pub simplex_step: f64,
    /// Iteration cap for one Nelder-Mead run
    pub max_iterations: usize,
    /// Number of penalty rounds for constrained nonlinear problems
    pub penalty_rounds: u32,
    /// Penalty weight of the first round
    pub initial_penalty: f64,
    /// Multiplier applied to the penalty weight between rounds
    pub penalty_growth: f64,
    /// Objective magnitude beyond which the search is treated as divergent
    pub divergence_threshold: f64,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            tolerance: 1e-07,
            feasibility_tolerance: 1e-04,
            initial_point: 1.0,
            simplex_step: 0.5,
            max_iterations: 2000,
            penalty_rounds: 6,
            initial_penalty: 10.0,
            penalty_growth: 10.0,
            divergence_threshold: 1e12,
        }
    }
}
