//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to the JSON output bundle
//! - reloaded later for plotting or comparisons

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Every supported model has exactly this many parameters.
pub const PARAM_LEN: usize = 4;

/// Response units of the input data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Proportion correct, bounded by the task's chance level below and 1 above.
    Accuracy,
    /// Signal-detection sensitivity, floor at 0 and unbounded above.
    Dprime,
}

/// Which scalar cost the optimizer minimizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostMode {
    /// Sum-squared-error over aggregated responses (mean accuracy / d-prime).
    Sse,
    /// Negative log-likelihood over per-level trial counts.
    Nll,
}

/// Exact form of the SSE cost.
///
/// Earlier analyses of this data computed `(Σ(data − fit))²`, a single squared
/// scalar residual, rather than the conventional `Σ(data − fit)²`. That form
/// stays the default for output compatibility; the conventional form is
/// available explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SseForm {
    /// `(Σ residual)²`, the legacy scalar-residual form.
    Reference,
    /// `Σ residual²`, conventional least squares.
    Conventional,
}

/// Whether the independent-variable axis is linearly or geometrically spaced.
///
/// This selects Weibull vs. Gumbel for accuracy data and the dense-grid
/// sampling strategy for rendered fit curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Spacing {
    Linear,
    Logarithmic,
}

/// Closed set of supported response functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Weibull,
    Gumbel,
    NakaRushton,
}

/// One row of subject-level performance data. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Observation {
    /// Independent-variable value (e.g. contrast).
    pub x: f64,
    /// Response in the configured units (mean accuracy or d-prime).
    pub y: f64,
    pub condition: String,
    pub factor: String,
    pub subject: String,
}

/// One row of trial-level data, after placeholder rows are dropped.
#[derive(Debug, Clone)]
pub struct Trial {
    pub x: f64,
    pub condition: String,
    pub correct: bool,
}

/// Partition key identifying one independent fitting unit.
///
/// Subject-level groups carry all three labels; trial-level and mean-refit
/// groups are condition-scoped (factor set where applicable, subject absent).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GroupKey {
    pub factor: Option<String>,
    pub subject: Option<String>,
    pub condition: String,
}

impl GroupKey {
    pub fn subject_level(factor: &str, subject: &str, condition: &str) -> Self {
        Self {
            factor: Some(factor.to_string()),
            subject: Some(subject.to_string()),
            condition: condition.to_string(),
        }
    }

    pub fn condition_level(factor: Option<&str>, condition: &str) -> Self {
        Self {
            factor: factor.map(str::to_string),
            subject: None,
            condition: condition.to_string(),
        }
    }
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(fac) = &self.factor {
            write!(f, "factor={fac} ")?;
        }
        if let Some(sub) = &self.subject {
            write!(f, "subject={sub} ")?;
        }
        write!(f, "condition={}", self.condition)
    }
}

/// Raw optimizer output for one group.
#[derive(Debug, Clone)]
pub struct ParamFit {
    pub params: [f64; PARAM_LEN],
    pub cost: f64,
    pub iters: usize,
    pub converged: bool,
}

/// A dense resampled fit curve for external rendering.
#[derive(Debug, Clone, Serialize)]
pub struct FitCurve {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// One group's fit. Created once per group, never mutated afterwards.
#[derive(Debug, Clone)]
pub struct FitResult {
    pub key: GroupKey,
    pub model: ModelKind,
    pub params: [f64; PARAM_LEN],
    pub converged: bool,
    /// True when the group had too few observations to attempt a fit.
    pub empty: bool,
    pub curve: Option<FitCurve>,
}

impl FitResult {
    /// Marker result for a group with no usable observations.
    pub fn empty_group(key: GroupKey, model: ModelKind) -> Self {
        Self {
            key,
            model,
            params: [f64::NAN; PARAM_LEN],
            converged: false,
            empty: true,
            curve: None,
        }
    }
}

/// One row of the raw summary table: response aggregated at a single
/// (x, condition) cell.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRow {
    pub x: f64,
    pub factor: Option<String>,
    pub condition: String,
    /// Number of contributing rows (trials, or subject observations).
    pub total: f64,
    /// Correct-trial count, trial-level data only.
    pub correct: Option<f64>,
    /// Percent correct or mean d-prime. NaN when `total == 0`.
    pub value: f64,
}

/// Fit curve record in the output bundle.
#[derive(Debug, Clone, Serialize)]
pub struct CurveRecord {
    pub key: GroupKey,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// Fitted parameter record in the output bundle.
#[derive(Debug, Clone, Serialize)]
pub struct ParamRecord {
    pub key: GroupKey,
    pub model: ModelKind,
    pub params: [f64; PARAM_LEN],
    pub converged: bool,
}

/// Persisted run output, in fixed order: raw summaries, fit curves, parameters.
#[derive(Debug, Clone, Serialize)]
pub struct OutputBundle {
    pub summaries: Vec<SummaryRow>,
    pub curves: Vec<CurveRecord>,
    pub params: Vec<ParamRecord>,
}

/// A full run's configuration as understood by the pipeline.
///
/// Derived from CLI flags plus the optional JSON config file; threaded
/// explicitly through calls rather than kept as ambient state.
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub csv_path: PathBuf,
    pub units: Units,
    /// Baseline success probability, required when `units == Accuracy`.
    /// Fixes the guess-rate parameter by collapsing its bounds.
    pub chance: Option<f64>,
    /// Number of points in each dense resampled fit curve.
    pub sampling: usize,
    pub sse_form: SseForm,
    /// Hand the mean fit curves to a plot sink (rendering stays external).
    pub plot: bool,
    /// Explicit per-condition RGB colors; the golden-ratio palette fills in
    /// for conditions beyond this list (or all of them when absent).
    pub colors: Option<Vec<[f64; 3]>>,
    pub out_path: Option<PathBuf>,
}

impl FitConfig {
    /// The chance level, for code paths that already validated accuracy units.
    pub fn chance_or_zero(&self) -> f64 {
        self.chance.unwrap_or(0.0)
    }
}
