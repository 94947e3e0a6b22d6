//! Application entry: CLI dispatch and front-end wiring.
//!
//! Keeps I/O at the edges: the pipelines below are pure functions from config
//! to [`pipeline::RunOutput`]; this module owns stdout, the plot sink, and the
//! output bundle file.

pub mod pipeline;

use clap::Parser;

use crate::cli::{self, Cli, Command, FitArgs, SampleArgs};
use crate::data::{self, SampleConfig};
use crate::domain::{FitConfig, Units};
use crate::error::AppError;
use crate::io::sink::{CurveSink, TextSink};
use crate::report;

pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    match cli.command {
        Command::Fit(args) => run_pipeline(&args, pipeline::run_fit),
        Command::Trials(args) => run_pipeline(&args, pipeline::run_trials),
        Command::Sample(args) => run_sample(&args),
    }
}

fn run_pipeline(
    args: &FitArgs,
    pipeline: fn(&FitConfig) -> Result<pipeline::RunOutput, AppError>,
) -> Result<(), AppError> {
    let config = cli::resolve_config(args)?;
    let output = pipeline(&config)?;

    print!("{}", report::format_run_summary(&config, output.spacing, &output.fits));

    if config.plot {
        let mut sink = TextSink::with_colors(
            std::io::stdout().lock(),
            config.colors.clone().unwrap_or_default(),
        );
        feed_sink(&mut sink, &output)?;
    }

    if let Some(path) = &config.out_path {
        crate::io::sink::write_bundle(path, &output.bundle)?;
        println!("Wrote output bundle to '{}'.", path.display());
    }

    Ok(())
}

/// Hand each condition-level curve to the sink, paired with the raw summary
/// points of its (factor, condition) cell.
fn feed_sink(sink: &mut impl CurveSink, output: &pipeline::RunOutput) -> Result<(), AppError> {
    for fit in &output.curves {
        let Some(curve) = &fit.curve else { continue };
        let raw: Vec<(f64, f64)> = output
            .summaries
            .iter()
            .filter(|s| s.condition == fit.key.condition && s.factor == fit.key.factor && s.total > 0.0)
            .map(|s| (s.x, s.value))
            .collect();
        sink.accept(&fit.key, &curve.x, &curve.y, &raw)?;
    }
    Ok(())
}

fn run_sample(args: &SampleArgs) -> Result<(), AppError> {
    let config = SampleConfig {
        units: args.units,
        chance: args.chance,
        conditions: args.conditions,
        subjects: args.subjects,
        levels: default_levels(args.units),
        trials_per_level: args.trials_per_level,
        noise_sd: 0.03,
        seed: args.seed,
    };

    if args.trials {
        let trials = data::generate_trials(&config)?;
        data::write_trials_csv(&args.out, &trials)?;
        println!("Wrote {} trial rows to '{}'.", trials.len(), args.out.display());
    } else {
        let observations = data::generate_observations(&config)?;
        data::write_observations_csv(&args.out, &observations)?;
        println!(
            "Wrote {} observation rows to '{}'.",
            observations.len(),
            args.out.display()
        );
    }
    Ok(())
}

/// Default stimulus levels: geometric contrasts for accuracy tasks, a wider
/// linear sweep for d-prime.
fn default_levels(units: Units) -> Vec<f64> {
    match units {
        Units::Accuracy => vec![0.02, 0.04, 0.08, 0.16, 0.32, 0.64],
        Units::Dprime => vec![5.0, 10.0, 15.0, 20.0, 25.0, 30.0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitCurve, FitResult, GroupKey, ModelKind, OutputBundle, Spacing, SummaryRow};
    use crate::io::sink::CollectSink;

    #[test]
    fn sink_receives_raw_points_for_the_matching_cell_only() {
        let key = GroupKey::condition_level(Some("1"), "1");
        let output = pipeline::RunOutput {
            spacing: Spacing::Linear,
            fits: Vec::new(),
            curves: vec![FitResult {
                key: key.clone(),
                model: ModelKind::Weibull,
                params: [0.5, 0.01, 0.2, 2.0],
                converged: true,
                empty: false,
                curve: Some(FitCurve {
                    x: vec![0.1, 0.2],
                    y: vec![0.6, 0.8],
                }),
            }],
            summaries: vec![
                SummaryRow {
                    x: 0.1,
                    factor: Some("1".to_string()),
                    condition: "1".to_string(),
                    total: 3.0,
                    correct: None,
                    value: 0.62,
                },
                SummaryRow {
                    x: 0.1,
                    factor: Some("1".to_string()),
                    condition: "2".to_string(),
                    total: 3.0,
                    correct: None,
                    value: 0.55,
                },
                SummaryRow {
                    x: 0.2,
                    factor: Some("1".to_string()),
                    condition: "1".to_string(),
                    total: 0.0,
                    correct: None,
                    value: f64::NAN,
                },
            ],
            bundle: OutputBundle {
                summaries: Vec::new(),
                curves: Vec::new(),
                params: Vec::new(),
            },
        };

        let mut sink = CollectSink::default();
        feed_sink(&mut sink, &output).unwrap();
        assert_eq!(sink.curves.len(), 1);
        // Only the condition-1 row with trials behind it.
        assert_eq!(sink.curves[0].3, vec![(0.1, 0.62)]);
    }
}
