//! Optimizer adapter and the per-model bounds / initial-guess policy.
//!
//! The bounds tables are fixed by the experimental design:
//!
//! | data                     | model              | bounds                                        |
//! |--------------------------|--------------------|-----------------------------------------------|
//! | accuracy, aggregate      | Weibull/Gumbel     | γ pinned at chance; λ ∈ [0, 0.02]; α ∈ [q25, q75]; β ∈ [1, 5] |
//! | accuracy, trial counts   | Weibull (NLL)      | γ pinned at chance; λ ∈ [0, 1]; α ∈ [q10, q90]; β ∈ [0, 5]    |
//! | d-prime, aggregate       | Naka-Rushton       | dmax ∈ [0.1, 8]; c50 ∈ [q25, q75]; n ∈ [1, 5]; b ∈ [−0.3, 0.5] |
//!
//! Quantiles are taken over the dataset's distinct, ascending stimulus levels.

use crate::domain::{CostMode, ModelKind, PARAM_LEN, ParamFit, Spacing, Units};
use crate::error::{AppError, ErrorKind};
use crate::fit::minimize::{self, Options};
use crate::fit::objective::Objective;
use crate::math::quantile;

/// A fully resolved fitting problem: model, cost mode, bounds, starting point.
#[derive(Debug, Clone)]
pub struct FitSpec {
    pub model: ModelKind,
    pub cost: CostMode,
    pub bounds: [(f64, f64); PARAM_LEN],
    pub x0: [f64; PARAM_LEN],
}

/// Policy row for aggregated responses (accuracy or d-prime).
///
/// `xvals` are the dataset's distinct stimulus levels, ascending, zero-guarded.
pub fn aggregate_spec(
    units: Units,
    spacing: Spacing,
    chance: Option<f64>,
    xvals: &[f64],
) -> Result<FitSpec, AppError> {
    if xvals.is_empty() {
        return Err(AppError::new(ErrorKind::EmptyGroup, "No stimulus levels to build a fit spec from."));
    }
    match units {
        Units::Accuracy => {
            let chance = require_chance(chance)?;
            let model = match spacing {
                Spacing::Linear => ModelKind::Weibull,
                Spacing::Logarithmic => ModelKind::Gumbel,
            };
            Ok(FitSpec {
                model,
                cost: CostMode::Sse,
                bounds: [
                    (chance, chance),
                    (0.0, 0.02),
                    (quantile(xvals, 0.25), quantile(xvals, 0.75)),
                    (1.0, 5.0),
                ],
                x0: [chance, 0.01, level_at(xvals, 1), 2.0],
            })
        }
        Units::Dprime => Ok(FitSpec {
            model: ModelKind::NakaRushton,
            cost: CostMode::Sse,
            bounds: [
                (0.1, 8.0),
                (quantile(xvals, 0.25), quantile(xvals, 0.75)),
                (1.0, 5.0),
                (-0.3, 0.5),
            ],
            x0: [3.0, level_at(xvals, 2), 2.0, 0.02],
        }),
    }
}

/// Policy row for trial-level accuracy data (negative log-likelihood).
pub fn trial_spec(chance: Option<f64>, xvals: &[f64]) -> Result<FitSpec, AppError> {
    if xvals.is_empty() {
        return Err(AppError::new(ErrorKind::EmptyGroup, "No stimulus levels to build a fit spec from."));
    }
    let chance = require_chance(chance)?;
    Ok(FitSpec {
        model: ModelKind::Weibull,
        cost: CostMode::Nll,
        bounds: [
            (chance, chance),
            (0.0, 1.0),
            (quantile(xvals, 0.10), quantile(xvals, 0.90)),
            (0.0, 5.0),
        ],
        x0: [chance, 0.02, level_at(xvals, 2), 2.0],
    })
}

/// Run the bounded minimizer for one resolved fitting problem.
///
/// Non-convergence comes back as `converged = false` on the result, never as
/// an error; callers record it per group and continue.
pub fn fit(spec: &FitSpec, objective: &Objective<'_>, opts: &Options) -> Result<ParamFit, AppError> {
    let minimum = minimize::minimize(|p| objective.eval(p), &spec.x0, &spec.bounds, opts)?;
    let params: [f64; PARAM_LEN] = minimum
        .x
        .try_into()
        .map_err(|_| AppError::new(ErrorKind::InvalidParameters, "Minimizer returned wrong arity."))?;
    Ok(ParamFit {
        params,
        cost: minimum.cost,
        iters: minimum.iters,
        converged: minimum.converged,
    })
}

fn require_chance(chance: Option<f64>) -> Result<f64, AppError> {
    let Some(chance) = chance else {
        return Err(AppError::new(
            ErrorKind::Config,
            "Chance level is required to fit accuracy data (fixes the guess-rate parameter).",
        ));
    };
    if !(chance.is_finite() && (0.0..1.0).contains(&chance)) {
        return Err(AppError::new(
            ErrorKind::Config,
            format!("Chance level {chance} must lie in [0, 1)."),
        ));
    }
    Ok(chance)
}

/// Starting thresholds index into the level array (`x[1]`, `x[2]`); fall back
/// to the middle level when the dataset has fewer levels.
fn level_at(xvals: &[f64], idx: usize) -> f64 {
    xvals.get(idx).copied().unwrap_or_else(|| xvals[xvals.len() / 2])
}
