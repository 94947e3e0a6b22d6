//! End-to-end fit pipelines: ingest → grouped fits → aggregation → bundle.
//!
//! Each pipeline returns a [`RunOutput`] holding everything the front end
//! needs: the spacing decision, per-group parameter fits for the terminal
//! summary, condition-level curves for rendering, and the serializable
//! output bundle.

use crate::domain::{CurveRecord, FitConfig, FitResult, OutputBundle, ParamRecord, Spacing, SummaryRow};
use crate::error::AppError;
use crate::fit::driver;
use crate::io::ingest;

/// Everything a completed run produces.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub spacing: Spacing,
    /// Per-group parameter fits (subject-level for `fit`, per-condition for
    /// `trials`).
    pub fits: Vec<FitResult>,
    /// Condition-level curves handed to plot sinks.
    pub curves: Vec<FitResult>,
    pub summaries: Vec<SummaryRow>,
    pub bundle: OutputBundle,
}

/// Subject-level run: fit every factor × subject × condition group, then refit
/// the across-subject means per condition.
pub fn run_fit(config: &FitConfig) -> Result<RunOutput, AppError> {
    let observations = ingest::load_observations(&config.csv_path)?;
    let grouped = driver::fit_groups(&observations, config)?;
    let mean = driver::aggregate_mean_fits(&observations, &grouped, config)?;

    let bundle = build_bundle(&mean.summaries, &mean.curves, &grouped.fits);
    Ok(RunOutput {
        spacing: grouped.spacing,
        fits: grouped.fits,
        curves: mean.curves,
        summaries: mean.summaries,
        bundle,
    })
}

/// Trial-level run: per-(x, condition) counts plus one maximum-likelihood fit
/// per condition. The condition fits double as the curves to render.
pub fn run_trials(config: &FitConfig) -> Result<RunOutput, AppError> {
    let trials = ingest::load_trials(&config.csv_path)?;
    let result = driver::fit_trials(&trials, config)?;

    let bundle = build_bundle(&result.summaries, &result.fits, &result.fits);
    Ok(RunOutput {
        spacing: result.spacing,
        curves: result.fits.clone(),
        fits: result.fits,
        summaries: result.summaries,
        bundle,
    })
}

/// Assemble the persisted bundle in its fixed order: raw summaries, dense fit
/// curves, fitted parameters. Empty groups contribute no curve but keep their
/// (NaN-parameter) param record so group counts stay recognizable downstream.
fn build_bundle(summaries: &[SummaryRow], curves: &[FitResult], fits: &[FitResult]) -> OutputBundle {
    OutputBundle {
        summaries: summaries.to_vec(),
        curves: curves
            .iter()
            .filter_map(|f| {
                f.curve.as_ref().map(|c| CurveRecord {
                    key: f.key.clone(),
                    x: c.x.clone(),
                    y: c.y.clone(),
                })
            })
            .collect(),
        params: fits
            .iter()
            .map(|f| ParamRecord {
                key: f.key.clone(),
                model: f.model,
                params: f.params,
                converged: f.converged,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitCurve, GroupKey, ModelKind};

    #[test]
    fn bundle_skips_curves_for_empty_groups_but_keeps_params() {
        let fitted = FitResult {
            key: GroupKey::condition_level(Some("1"), "1"),
            model: ModelKind::Weibull,
            params: [0.5, 0.01, 0.2, 2.0],
            converged: true,
            empty: false,
            curve: Some(FitCurve {
                x: vec![0.1, 0.2, 0.3],
                y: vec![0.55, 0.7, 0.85],
            }),
        };
        let empty = FitResult::empty_group(GroupKey::condition_level(Some("1"), "2"), ModelKind::Weibull);

        let bundle = build_bundle(&[], &[fitted.clone(), empty.clone()], &[fitted, empty]);
        assert_eq!(bundle.curves.len(), 1);
        assert_eq!(bundle.params.len(), 2);
        assert!(bundle.params[1].params[0].is_nan());
    }
}
