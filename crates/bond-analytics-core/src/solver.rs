//! Newton-Raphson root finding.
//!
//! The solver never panics and never loops unboundedly: every search either
//! converges within `max_iterations` or reports a [`SolveFailure`] that the
//! caller turns into an undefined result.

use serde::{Deserialize, Serialize};
use tracing::debug;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default convergence tolerance, applied to both |f(x)| and the Newton step.
pub const DEFAULT_TOLERANCE: f64 = 1e-8;

/// Default iteration cap.
pub const DEFAULT_MAX_ITERATIONS: u32 = 50;

/// Derivatives smaller than this in magnitude stall the iteration.
const MIN_DERIVATIVE: f64 = 1e-15;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Tolerance and iteration cap for a root search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

fn default_max_iterations() -> u32 {
    DEFAULT_MAX_ITERATIONS
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// A converged root together with iteration statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverResult {
    pub root: f64,
    pub iterations: u32,
    pub residual: f64,
}

/// Why a root search produced no result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolveFailure {
    /// The iteration cap was reached.
    MaxIterations { iterations: u32, residual: f64 },
    /// f'(x) vanished at `at`.
    ZeroDerivative { at: f64 },
    /// f(x) or f'(x) was NaN / infinite at `at`.
    Undefined { at: f64 },
}

impl std::fmt::Display for SolveFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveFailure::MaxIterations {
                iterations,
                residual,
            } => write!(
                f,
                "did not converge after {iterations} iterations (residual {residual:e})"
            ),
            SolveFailure::ZeroDerivative { at } => write!(f, "derivative vanished at x = {at}"),
            SolveFailure::Undefined { at } => write!(f, "function undefined at x = {at}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Find a root of `f` starting from `initial_guess`, using the analytic
/// derivative `df`.
///
/// Converges when |f(x)| or the Newton step drops below `config.tolerance`.
pub fn newton_raphson<F, DF>(
    f: F,
    df: DF,
    initial_guess: f64,
    config: &SolverConfig,
) -> Result<SolverResult, SolveFailure>
where
    F: Fn(f64) -> f64,
    DF: Fn(f64) -> f64,
{
    let mut x = initial_guess;

    for iteration in 0..config.max_iterations {
        let fx = f(x);
        if !fx.is_finite() {
            return Err(SolveFailure::Undefined { at: x });
        }
        if fx.abs() < config.tolerance {
            debug!(root = x, iterations = iteration, "newton converged on residual");
            return Ok(SolverResult {
                root: x,
                iterations: iteration,
                residual: fx,
            });
        }

        let dfx = df(x);
        if !dfx.is_finite() {
            return Err(SolveFailure::Undefined { at: x });
        }
        if dfx.abs() < MIN_DERIVATIVE {
            return Err(SolveFailure::ZeroDerivative { at: x });
        }

        let step = fx / dfx;
        x -= step;

        if step.abs() < config.tolerance {
            let residual = f(x);
            if !residual.is_finite() {
                return Err(SolveFailure::Undefined { at: x });
            }
            debug!(root = x, iterations = iteration + 1, "newton converged on step");
            return Ok(SolverResult {
                root: x,
                iterations: iteration + 1,
                residual,
            });
        }
    }

    Err(SolveFailure::MaxIterations {
        iterations: config.max_iterations,
        residual: f(x).abs(),
    })
}
