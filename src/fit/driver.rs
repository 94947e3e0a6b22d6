//! Grouped-fit driver and result aggregator.
//!
//! Subject-level data is partitioned by factor → subject → condition (outer to
//! inner); trial-level data by condition only. Each group is an independent
//! fitting unit: groups share no mutable state, so the per-group fits run under
//! rayon, and output order is fixed by the group list (not execution order).
//!
//! Soft failures stay local: a group with no usable observations yields a
//! marked `FitResult` (`empty = true`, `converged = false`), and optimizer
//! non-convergence is recorded on the result. Everything else aborts the run
//! with the group key in the error message.

use rayon::prelude::*;

use crate::domain::{
    FitConfig, FitCurve, FitResult, GroupKey, Observation, Spacing, SummaryRow, Trial, Units,
};
use crate::error::{AppError, ErrorKind};
use crate::fit::fitter::{self, FitSpec};
use crate::fit::minimize::Options;
use crate::fit::objective::Objective;
use crate::math::{lin_space, log_space};
use crate::models::{clamp_x, predict_one};

/// Per-subject fits across the factor × subject × condition cross-product.
#[derive(Debug, Clone)]
pub struct GroupedFits {
    pub spacing: Spacing,
    /// Distinct stimulus levels, ascending, zero-guarded.
    pub xvals: Vec<f64>,
    pub fits: Vec<FitResult>,
}

/// Condition-level mean refits plus the raw summary table.
#[derive(Debug, Clone)]
pub struct MeanFits {
    pub summaries: Vec<SummaryRow>,
    pub curves: Vec<FitResult>,
}

/// Trial-level output: per-(x, condition) counts and per-condition NLL fits.
#[derive(Debug, Clone)]
pub struct TrialFits {
    pub spacing: Spacing,
    pub xvals: Vec<f64>,
    pub summaries: Vec<SummaryRow>,
    pub fits: Vec<FitResult>,
}

/// Fit every (factor, subject, condition) group of subject-level observations.
pub fn fit_groups(observations: &[Observation], config: &FitConfig) -> Result<GroupedFits, AppError> {
    if observations.is_empty() {
        return Err(AppError::new(ErrorKind::EmptyGroup, "Input contains no observations."));
    }

    let xvals = distinct_levels(observations.iter().map(|o| o.x));
    let spacing = crate::math::classify_spacing(&xvals)?;
    let spec = fitter::aggregate_spec(config.units, spacing, config.chance, &xvals)?;

    let factors = unique_labels(observations.iter().map(|o| o.factor.as_str()));
    let subjects = unique_labels(observations.iter().map(|o| o.subject.as_str()));
    let conditions = unique_labels(observations.iter().map(|o| o.condition.as_str()));

    let mut groups: Vec<(GroupKey, Vec<&Observation>)> = Vec::new();
    for f in &factors {
        for s in &subjects {
            for c in &conditions {
                let rows: Vec<&Observation> = observations
                    .iter()
                    .filter(|o| o.factor == *f && o.subject == *s && o.condition == *c)
                    .collect();
                groups.push((GroupKey::subject_level(f, s, c), rows));
            }
        }
    }

    let fits: Vec<FitResult> = groups
        .par_iter()
        .map(|(key, rows)| fit_aggregate_group(key, rows, &spec, spacing, &xvals, config))
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(GroupedFits { spacing, xvals, fits })
}

/// Average responses across subjects per (factor, condition, x) and refit the
/// mean curve — a fresh fit of the averaged data, independent of the
/// per-subject fits.
pub fn aggregate_mean_fits(
    observations: &[Observation],
    grouped: &GroupedFits,
    config: &FitConfig,
) -> Result<MeanFits, AppError> {
    let spec = fitter::aggregate_spec(config.units, grouped.spacing, config.chance, &grouped.xvals)?;
    let factors = unique_labels(observations.iter().map(|o| o.factor.as_str()));
    let conditions = unique_labels(observations.iter().map(|o| o.condition.as_str()));

    let mut summaries = Vec::new();
    let mut curves = Vec::new();

    for f in &factors {
        for c in &conditions {
            let mut mean_xs = Vec::new();
            let mut means = Vec::new();
            for &x in &grouped.xvals {
                let ys: Vec<f64> = observations
                    .iter()
                    .filter(|o| o.factor == *f && o.condition == *c && clamp_x(o.x) == x)
                    .map(|o| o.y)
                    .collect();
                let value = if ys.is_empty() {
                    f64::NAN
                } else {
                    ys.iter().sum::<f64>() / ys.len() as f64
                };
                summaries.push(SummaryRow {
                    x,
                    factor: Some(f.clone()),
                    condition: c.clone(),
                    total: ys.len() as f64,
                    correct: None,
                    value,
                });
                if !ys.is_empty() {
                    mean_xs.push(x);
                    means.push(value);
                }
            }

            let key = GroupKey::condition_level(Some(f.as_str()), c);
            if mean_xs.len() < 2 {
                curves.push(FitResult::empty_group(key, spec.model));
                continue;
            }
            let objective = Objective::sse(spec.model, &mean_xs, &means, config.sse_form)
                .map_err(|e| with_group_context(e, &key, &spec))?;
            let fit = fitter::fit(&spec, &objective, &Options::default())
                .map_err(|e| with_group_context(e, &key, &spec))?;
            let curve = dense_curve(&spec, grouped.spacing, &grouped.xvals, &fit.params, config.sampling)?;
            curves.push(FitResult {
                key,
                model: spec.model,
                params: fit.params,
                converged: fit.converged,
                empty: false,
                curve: Some(curve),
            });
        }
    }

    Ok(MeanFits { summaries, curves })
}

/// Fit trial-level data: per-(x, condition) percent-correct counts plus one
/// negative-log-likelihood Weibull fit per condition.
pub fn fit_trials(trials: &[Trial], config: &FitConfig) -> Result<TrialFits, AppError> {
    if trials.is_empty() {
        return Err(AppError::new(ErrorKind::EmptyGroup, "Input contains no trials."));
    }

    let xvals = distinct_levels(trials.iter().map(|t| t.x));
    let spacing = crate::math::classify_spacing(&xvals)?;
    let spec = fitter::trial_spec(config.chance, &xvals)?;
    let conditions = unique_labels(trials.iter().map(|t| t.condition.as_str()));

    // Per-(x, condition) counts. A level with zero trials is reported with NaN
    // accuracy and excluded from the likelihood, never divided through.
    let mut summaries = Vec::new();
    let mut per_condition: Vec<(GroupKey, Vec<f64>, Vec<f64>, Vec<f64>)> = Vec::new();

    for c in &conditions {
        let mut level_xs = Vec::new();
        let mut totals = Vec::new();
        let mut corrects = Vec::new();
        for &x in &xvals {
            let rows: Vec<&Trial> = trials
                .iter()
                .filter(|t| t.condition == *c && clamp_x(t.x) == x)
                .collect();
            let m = rows.len() as f64;
            let n = rows.iter().filter(|t| t.correct).count() as f64;
            let acc = if m > 0.0 { n / m } else { f64::NAN };
            summaries.push(SummaryRow {
                x,
                factor: None,
                condition: c.clone(),
                total: m,
                correct: Some(n),
                value: acc,
            });
            if m > 0.0 {
                level_xs.push(x);
                totals.push(m);
                corrects.push(n);
            }
        }
        per_condition.push((GroupKey::condition_level(None, c), level_xs, totals, corrects));
    }

    let fits: Vec<FitResult> = per_condition
        .par_iter()
        .map(|(key, level_xs, totals, corrects)| {
            if level_xs.len() < 2 {
                return Ok(FitResult::empty_group(key.clone(), spec.model));
            }
            let objective = Objective::nll(spec.model, level_xs, totals, corrects)
                .map_err(|e| with_group_context(e, key, &spec))?;
            let fit = fitter::fit(&spec, &objective, &Options::default())
                .map_err(|e| with_group_context(e, key, &spec))?;
            let curve = dense_curve(&spec, spacing, &xvals, &fit.params, config.sampling)?;
            Ok(FitResult {
                key: key.clone(),
                model: spec.model,
                params: fit.params,
                converged: fit.converged,
                empty: false,
                curve: Some(curve),
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(TrialFits {
        spacing,
        xvals,
        summaries,
        fits,
    })
}

fn fit_aggregate_group(
    key: &GroupKey,
    rows: &[&Observation],
    spec: &FitSpec,
    spacing: Spacing,
    xvals: &[f64],
    config: &FitConfig,
) -> Result<FitResult, AppError> {
    if rows.is_empty() {
        return Ok(FitResult::empty_group(key.clone(), spec.model));
    }

    let mut pairs: Vec<(f64, f64)> = rows.iter().map(|o| (clamp_x(o.x), o.y)).collect();
    pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    let xs: Vec<f64> = pairs.iter().map(|p| p.0).collect();
    let ys: Vec<f64> = pairs.iter().map(|p| p.1).collect();

    let objective =
        Objective::sse(spec.model, &xs, &ys, config.sse_form).map_err(|e| with_group_context(e, key, spec))?;
    let fit = fitter::fit(spec, &objective, &Options::default()).map_err(|e| with_group_context(e, key, spec))?;
    let curve = dense_curve(spec, spacing, xvals, &fit.params, config.sampling)?;

    Ok(FitResult {
        key: key.clone(),
        model: spec.model,
        params: fit.params,
        converged: fit.converged,
        empty: false,
        curve: Some(curve),
    })
}

/// Resample a fitted curve over a dense grid spanning the stimulus range,
/// evenly or geometrically spaced per the dataset's spacing.
fn dense_curve(
    spec: &FitSpec,
    spacing: Spacing,
    xvals: &[f64],
    params: &[f64],
    sampling: usize,
) -> Result<FitCurve, AppError> {
    let (lo, hi) = (xvals[0], xvals[xvals.len() - 1]);
    let grid = match spacing {
        Spacing::Linear => lin_space(lo, hi, sampling)?,
        Spacing::Logarithmic => log_space(lo, hi, sampling)?,
    };
    let y = grid.iter().map(|&x| predict_one(spec.model, x, params)).collect();
    Ok(FitCurve { x: grid, y })
}

fn with_group_context(err: AppError, key: &GroupKey, spec: &FitSpec) -> AppError {
    AppError::new(
        err.kind(),
        format!("[{key}] {} fit: {err}", spec.model.display_name()),
    )
}

/// Distinct stimulus levels, ascending, with zeros replaced by the registry
/// epsilon before any spacing or power-law math sees them.
fn distinct_levels(xs: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut out: Vec<f64> = Vec::new();
    for x in xs.map(clamp_x) {
        if !out.iter().any(|v| *v == x) {
            out.push(x);
        }
    }
    out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    out
}

/// Unique labels in deterministic order: numeric labels sort numerically,
/// anything else lexically.
fn unique_labels<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for l in labels {
        if !out.iter().any(|s| s == l) {
            out.push(l.to_string());
        }
    }
    out.sort_by(|a, b| cmp_labels(a, b));
    out
}

fn cmp_labels(a: &str, b: &str) -> std::cmp::Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
        _ => a.cmp(b),
    }
}
