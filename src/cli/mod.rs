//! Command-line interface and run-configuration resolution.
//!
//! A run can be configured from flags, from a JSON config file, or both; flags
//! win over the file. The resolved [`FitConfig`] is validated here so the
//! pipeline can assume a coherent configuration.

use std::fs::File;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Deserialize;

use crate::domain::{FitConfig, SseForm, Units};
use crate::error::{AppError, ErrorKind};

const DEFAULT_SAMPLING: usize = 100;

#[derive(Debug, Parser)]
#[command(name = "psyfit", version, about = "Psychometric function fitting")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit subject-level aggregate responses (accuracy or d-prime per row).
    Fit(FitArgs),
    /// Fit trial-level accuracy data by maximum likelihood.
    Trials(FitArgs),
    /// Generate a synthetic dataset CSV.
    Sample(SampleArgs),
}

#[derive(Debug, Parser)]
pub struct FitArgs {
    /// Input CSV path.
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// JSON config file; flags given on the command line override it.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Response units of the input data.
    #[arg(short, long, value_enum)]
    pub units: Option<Units>,

    /// Chance performance level (required for accuracy units).
    #[arg(long)]
    pub chance: Option<f64>,

    /// Number of points in each dense fitted curve.
    #[arg(short, long)]
    pub sampling: Option<usize>,

    /// Sum-of-squares cost form for aggregate fits.
    #[arg(long, value_enum, default_value_t = SseForm::Reference)]
    pub sse_form: SseForm,

    /// Render fitted curves to the terminal sink.
    #[arg(short, long)]
    pub plot: bool,

    /// Write the output bundle (summaries, curves, params) as JSON.
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Parser)]
pub struct SampleArgs {
    /// Output CSV path.
    #[arg(short, long)]
    pub out: PathBuf,

    /// Response units to generate.
    #[arg(short, long, value_enum, default_value_t = Units::Accuracy)]
    pub units: Units,

    /// Chance performance level of the generating curves.
    #[arg(long, default_value_t = 0.5)]
    pub chance: f64,

    #[arg(long, default_value_t = 2)]
    pub conditions: usize,

    #[arg(long, default_value_t = 3)]
    pub subjects: usize,

    /// Emit trial-level rows instead of subject-level aggregates.
    #[arg(short, long)]
    pub trials: bool,

    /// Trials per (level, condition) cell in trial-level output.
    #[arg(long, default_value_t = 40)]
    pub trials_per_level: u64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// JSON config file schema. All fields optional; flags take precedence.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfigFile {
    pub file: Option<PathBuf>,
    pub units: Option<Units>,
    pub chance: Option<f64>,
    pub plot: Option<bool>,
    pub sampling: Option<usize>,
    /// Explicit per-condition RGB colors, components in [0, 1].
    pub color: Option<Vec<[f64; 3]>>,
}

/// Merge command-line flags with the optional config file and validate.
pub fn resolve_config(args: &FitArgs) -> Result<FitConfig, AppError> {
    let file_cfg = match &args.config {
        Some(path) => load_config_file(path)?,
        None => RunConfigFile::default(),
    };

    let csv_path = args
        .file
        .clone()
        .or(file_cfg.file)
        .ok_or_else(|| AppError::new(ErrorKind::Config, "No input file given (use --file or the config file)."))?;

    let units = args
        .units
        .or(file_cfg.units)
        .ok_or_else(|| AppError::new(ErrorKind::Config, "No units given (use --units or the config file)."))?;

    let chance = args.chance.or(file_cfg.chance);
    if units == Units::Accuracy {
        match chance {
            Some(c) if (0.0..1.0).contains(&c) => {}
            Some(c) => {
                return Err(AppError::new(
                    ErrorKind::Config,
                    format!("Chance level must be in [0, 1), got {c}."),
                ));
            }
            None => {
                return Err(AppError::new(
                    ErrorKind::Config,
                    "Accuracy units need a chance level (use --chance or the config file).",
                ));
            }
        }
    }

    let sampling = args.sampling.or(file_cfg.sampling).unwrap_or(DEFAULT_SAMPLING);
    if sampling < 2 {
        return Err(AppError::new(
            ErrorKind::Config,
            format!("Curve sampling must be at least 2 points, got {sampling}."),
        ));
    }

    Ok(FitConfig {
        csv_path,
        units,
        chance,
        sampling,
        sse_form: args.sse_form,
        plot: args.plot || file_cfg.plot.unwrap_or(false),
        colors: file_cfg.color,
        out_path: args.out.clone(),
    })
}

fn load_config_file(path: &PathBuf) -> Result<RunConfigFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(ErrorKind::Config, format!("Failed to open config '{}': {e}", path.display())))?;
    serde_json::from_reader(file)
        .map_err(|e| AppError::new(ErrorKind::Config, format!("Malformed config '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_args() -> FitArgs {
        FitArgs {
            file: Some(PathBuf::from("data.csv")),
            config: None,
            units: Some(Units::Accuracy),
            chance: Some(0.5),
            sampling: None,
            sse_form: SseForm::Reference,
            plot: false,
            out: None,
        }
    }

    #[test]
    fn flags_alone_resolve_with_defaults() {
        let config = resolve_config(&bare_args()).unwrap();
        assert_eq!(config.sampling, DEFAULT_SAMPLING);
        assert_eq!(config.chance, Some(0.5));
        assert!(!config.plot);
    }

    #[test]
    fn accuracy_without_chance_is_a_config_error() {
        let args = FitArgs {
            chance: None,
            ..bare_args()
        };
        let err = resolve_config(&args).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn dprime_does_not_need_chance() {
        let args = FitArgs {
            units: Some(Units::Dprime),
            chance: None,
            ..bare_args()
        };
        assert!(resolve_config(&args).is_ok());
    }

    #[test]
    fn chance_outside_unit_interval_is_rejected() {
        let args = FitArgs {
            chance: Some(1.0),
            ..bare_args()
        };
        assert_eq!(resolve_config(&args).unwrap_err().kind(), ErrorKind::Config);
    }

    #[test]
    fn tiny_sampling_is_rejected() {
        let args = FitArgs {
            sampling: Some(1),
            ..bare_args()
        };
        assert_eq!(resolve_config(&args).unwrap_err().kind(), ErrorKind::Config);
    }

    #[test]
    fn config_file_schema_parses() {
        let json = r#"{"file": "runs/data.csv", "units": "accuracy", "chance": 0.25, "plot": true, "sampling": 50, "color": [[1.0, 0.0, 0.0]]}"#;
        let parsed: RunConfigFile = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.units, Some(Units::Accuracy));
        assert_eq!(parsed.sampling, Some(50));
        assert_eq!(parsed.plot, Some(true));
        assert_eq!(parsed.color, Some(vec![[1.0, 0.0, 0.0]]));
    }

    #[test]
    fn unknown_config_keys_are_rejected() {
        let json = r#"{"file": "data.csv", "colour": "red"}"#;
        assert!(serde_json::from_str::<RunConfigFile>(json).is_err());
    }
}
